use super::Snapshot;
use crate::naming::FilenameCodec;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One requested ID and the file holding it, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPage {
    pub id: u32,
    pub path: Option<PathBuf>,
}

impl ResolvedPage {
    pub fn is_absent(&self) -> bool {
        self.path.is_none()
    }
}

/// Map each ID to its file. The output has exactly the input's order and
/// duplicates. A missing ID (e.g. a dropped blank back side) is `None`, not
/// an error.
pub fn resolve(ids: &[u32], snapshot: &Snapshot) -> Vec<ResolvedPage> {
    ids.iter()
        .map(|&id| {
            let path = snapshot.covering(id).next().map(|scan| scan.path.clone());
            if path.is_none() {
                debug!(id, "no file for id");
            }
            ResolvedPage { id, path }
        })
        .collect()
}

/// Resolve against a fresh listing of `dir` (this directory only).
pub fn resolve_in(ids: &[u32], dir: &Path, codec: &FilenameCodec) -> io::Result<Vec<ResolvedPage>> {
    Ok(resolve(ids, &Snapshot::read(dir, codec, false)?))
}
