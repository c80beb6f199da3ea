//! A directory listing decoded into scan files.
//!
//! Nothing is cached between runs: every command takes one snapshot at start
//! and derives all ID state from it.

pub mod alloc;
pub mod assemble;
pub mod resolve;

use crate::id_range::{sheet_front, IdSpan};
use crate::naming::{FilenameCodec, ScanName};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanFile {
    pub path: PathBuf,
    pub name: ScanName,
}

impl ScanFile {
    pub fn span(&self) -> Option<IdSpan> {
        self.name.span
    }

    /// Description from the name, or the file stem when there is none.
    pub fn title(&self) -> String {
        match &self.name.description {
            Some(desc) => desc.clone(),
            None => self
                .path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    }

    fn sort_key(&self) -> (u32, &Path) {
        (self.span().map_or(0, |s| s.first), &self.path)
    }
}

#[derive(Debug, Clone)]
pub struct Snapshot {
    scans: Vec<ScanFile>,
}

impl Snapshot {
    /// List `dir` once and decode every filename. Foreign files are skipped.
    ///
    /// With `recursive`, category subdirectories are included; hidden
    /// directories never are.
    pub fn read(dir: &Path, codec: &FilenameCodec, recursive: bool) -> io::Result<Self> {
        let mut paths = Vec::new();
        if recursive {
            let walker = WalkDir::new(dir)
                .min_depth(1)
                .into_iter()
                .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));
            for entry in walker {
                let entry = entry?;
                if entry.file_type().is_file() {
                    paths.push(entry.into_path());
                }
            }
        } else {
            for entry in std::fs::read_dir(dir)? {
                let entry = entry?;
                if entry.file_type()?.is_file() {
                    paths.push(entry.path());
                }
            }
        }

        let mut scans = Vec::new();
        for path in paths {
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            match codec.decode(file_name) {
                Some(name) => scans.push(ScanFile { path, name }),
                None if codec.has_scan_extension(file_name) => {
                    warn!(path = %path.display(), "looks like a scan but the name does not decode");
                }
                None => {}
            }
        }

        let snapshot = Self::from_scans(scans);
        debug!(
            dir = %dir.display(),
            scans = snapshot.scans.len(),
            recursive,
            "archive snapshot taken"
        );
        Ok(snapshot)
    }

    pub fn from_scans(mut scans: Vec<ScanFile>) -> Self {
        scans.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        Snapshot { scans }
    }

    /// All decoded scans, ordered by first ID and then by path.
    pub fn scans(&self) -> &[ScanFile] {
        &self.scans
    }

    /// Highest ID covered by any file. Digital documents do not count.
    pub fn highest_id(&self) -> Option<u32> {
        self.scans.iter().filter_map(|s| s.span()).map(|s| s.last).max()
    }

    /// Files whose span contains `id`, in snapshot order.
    pub fn covering(&self, id: u32) -> impl Iterator<Item = &ScanFile> {
        self.scans
            .iter()
            .filter(move |s| s.span().is_some_and(|span| span.contains(id)))
    }

    /// Distinct files touching any of `ids`, in snapshot order.
    pub fn lookup(&self, ids: &[u32]) -> Vec<&ScanFile> {
        self.scans
            .iter()
            .filter(|s| {
                s.span()
                    .is_some_and(|span| ids.iter().any(|&id| span.contains(id)))
            })
            .collect()
    }

    /// Groups of files whose spans overlap, with the span the group covers.
    ///
    /// Groups are disjoint and ordered by ID. Spans are swept in order, so
    /// the cost does not depend on how many IDs a file claims.
    pub fn overlapping(&self) -> Vec<(IdSpan, Vec<&ScanFile>)> {
        let mut groups = Vec::new();
        let mut current: Option<(IdSpan, Vec<&ScanFile>)> = None;
        for scan in &self.scans {
            let Some(span) = scan.span() else {
                continue;
            };
            match current.as_mut() {
                Some((group, files)) if span.first <= group.last => {
                    group.last = group.last.max(span.last);
                    files.push(scan);
                }
                _ => {
                    groups.extend(current.take().filter(|(_, files)| files.len() > 1));
                    current = Some((span, vec![scan]));
                }
            }
        }
        groups.extend(current.filter(|(_, files)| files.len() > 1));
        groups
    }

    /// Runs of sheets up to the highest ID whose front side has no file.
    ///
    /// Each run is aligned: `3-4` is one sheet, `3-8` three of them.
    pub fn missing_sheets(&self) -> Vec<IdSpan> {
        let mut missing = Vec::new();
        // lowest ID not yet known to be covered
        let mut next = 1u32;
        for span in self.scans.iter().filter_map(|s| s.span()) {
            if span.first > next {
                let first_front = sheet_front(next.saturating_add(1));
                let last_front = sheet_front(span.first - 1);
                if first_front <= last_front {
                    missing.push(IdSpan {
                        first: first_front,
                        last: last_front.saturating_add(1),
                    });
                }
            }
            next = next.max(span.last.saturating_add(1));
        }
        missing
    }
}

/// Category directories below `dir`, as `a/b` paths, sorted.
///
/// Hidden directories and those starting with `_` are skipped along with
/// everything below them.
pub fn categories(dir: &Path) -> io::Result<Vec<String>> {
    let walker = WalkDir::new(dir).min_depth(1).into_iter().filter_entry(|e| {
        let name = e.file_name().to_string_lossy();
        e.depth() == 0 || !(name.starts_with('.') || name.starts_with('_'))
    });
    let mut categories = Vec::new();
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let rel = entry.path().strip_prefix(dir).unwrap_or(entry.path());
        let parts: Vec<_> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        categories.push(parts.join("/"));
    }
    categories.sort();
    Ok(categories)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

#[cfg(test)]
pub(crate) mod test_util {
    use crate::naming::FilenameCodec;
    use std::path::Path;

    pub fn codec() -> FilenameCodec {
        FilenameCodec::new("out", 5, &["pdf", "png", "jpg", "jpeg"]).unwrap()
    }

    pub fn touch(dir: &Path, names: &[&str]) {
        for name in names {
            let path = dir.join(name);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(path, b"").unwrap();
        }
    }
}
