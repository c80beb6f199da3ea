use super::Snapshot;
use crate::naming::FilenameCodec;
use std::io;
use std::path::Path;

/// Result of allocating the first ID of a front/back pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OddId {
    pub id: u32,
    /// The even ID left unused so that `id` lands on a front side.
    pub skipped: Option<u32>,
}

/// One past the highest ID in the snapshot, or 1 when there is none.
pub fn next_id(snapshot: &Snapshot) -> u32 {
    snapshot
        .highest_id()
        .map_or(1, |highest| highest.saturating_add(1))
}

/// Like [`next_id`], but always odd. An even candidate is skipped and reported.
pub fn next_odd_id(snapshot: &Snapshot) -> OddId {
    let candidate = next_id(snapshot);
    if candidate % 2 == 1 {
        OddId {
            id: candidate,
            skipped: None,
        }
    } else {
        OddId {
            id: candidate.saturating_add(1),
            skipped: Some(candidate),
        }
    }
}

/// Scan `dir` (this directory only) and return the next free ID.
pub fn next_id_in(dir: &Path, codec: &FilenameCodec) -> io::Result<u32> {
    Ok(next_id(&Snapshot::read(dir, codec, false)?))
}

/// Scan `dir` (this directory only) and return the next free front-side ID.
pub fn next_odd_id_in(dir: &Path, codec: &FilenameCodec) -> io::Result<OddId> {
    Ok(next_odd_id(&Snapshot::read(dir, codec, false)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::test_util::{codec, touch};

    #[test]
    fn test_empty_directory_starts_at_one() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(next_id_in(dir.path(), &codec()).unwrap(), 1);
        assert_eq!(
            next_odd_id_in(dir.path(), &codec()).unwrap(),
            OddId { id: 1, skipped: None }
        );
    }

    #[test]
    fn test_next_is_one_past_the_highest() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &["out00001.png", "out00003.png", "out00002.png", "readme.md"]);
        assert_eq!(next_id_in(dir.path(), &codec()).unwrap(), 4);
    }

    #[test]
    fn test_gaps_are_not_reused() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &["out00001.png", "out00009.png"]);
        assert_eq!(next_id_in(dir.path(), &codec()).unwrap(), 10);
    }

    #[test]
    fn test_merged_documents_count_with_their_last_id() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &["2024-05-01_00011-00014_Lease.pdf", "out00003.png"]);
        assert_eq!(next_id_in(dir.path(), &codec()).unwrap(), 15);
    }

    #[test]
    fn test_odd_allocation_reports_the_skip() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &["out00001.png"]);
        assert_eq!(next_id_in(dir.path(), &codec()).unwrap(), 2);
        assert_eq!(
            next_odd_id_in(dir.path(), &codec()).unwrap(),
            OddId { id: 3, skipped: Some(2) }
        );

        touch(dir.path(), &["out00002.png"]);
        assert_eq!(
            next_odd_id_in(dir.path(), &codec()).unwrap(),
            OddId { id: 3, skipped: None }
        );
    }

    #[test]
    fn test_allocation_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &["out00005.png"]);
        let first = next_id_in(dir.path(), &codec()).unwrap();
        let second = next_id_in(dir.path(), &codec()).unwrap();
        assert_eq!(first, second);
    }
}
