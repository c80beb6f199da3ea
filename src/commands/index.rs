use super::Workspace;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Recreate the index directory: one symlink per scan, named by padded ID
/// span and title so that a plain `ls` lists the archive in ID order.
pub fn rebuild(ws: &Workspace) -> Result<usize> {
    let index_dir = ws.dir.join(&ws.config.archive.index_dir);
    if index_dir.exists() {
        if !index_dir.is_dir() {
            anyhow::bail!(
                "Expected '{}' to be a directory or to not exist",
                index_dir.display()
            );
        }
        std::fs::remove_dir_all(&index_dir)
            .with_context(|| format!("Failed to clear {}", index_dir.display()))?;
    }

    let snapshot = ws.archive_snapshot()?;
    std::fs::create_dir_all(&index_dir)
        .with_context(|| format!("Failed to create {}", index_dir.display()))?;

    let digits = snapshot
        .highest_id()
        .map_or(1, |highest| highest.to_string().len());
    let width = digits.max(ws.config.archive.index_min_width);
    let up = up_path(&ws.config.archive.index_dir);

    let mut linked = 0;
    for scan in snapshot.scans() {
        let Some(span) = scan.span() else {
            continue;
        };
        let ext = scan.path.extension().map(|e| e.to_string_lossy().into_owned());
        let mut name = format!("{}_{}", span.label(width), scan.title());
        if let Some(ext) = ext {
            name.push('.');
            name.push_str(&ext);
        }
        let rel = scan.path.strip_prefix(&ws.dir).unwrap_or(&scan.path);
        let link = index_dir.join(&name);
        match symlink(&up.join(rel), &link) {
            Ok(()) => linked += 1,
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                warn!(link = %link.display(), "duplicate index entry, skipping");
            }
            Err(err) => {
                return Err(err).with_context(|| format!("Failed to link {}", link.display()));
            }
        }
    }

    info!(linked, index = %index_dir.display(), "index rebuilt");
    Ok(linked)
}

pub fn run(ws: &Workspace) -> Result<()> {
    let linked = rebuild(ws)?;
    println!("Linked {} scan(s)", linked);
    Ok(())
}

// "a/b" needs "../.." to get back to the archive root
fn up_path(index_dir: &str) -> PathBuf {
    Path::new(index_dir)
        .components()
        .filter(|c| matches!(c, std::path::Component::Normal(_)))
        .map(|_| Path::new(".."))
        .collect()
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(not(unix))]
fn symlink(_target: &Path, _link: &Path) -> std::io::Result<()> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "symlinked index is only supported on unix",
    ))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::archive::test_util::touch;
    use crate::commands::test_workspace;

    #[test]
    fn test_rebuild_index() {
        let dir = tempfile::tempdir().unwrap();
        touch(
            dir.path(),
            &["out00001.png", "bills/2024-01-02_00003+_Power.pdf", "d_Note.pdf"],
        );
        // filed documents are indexed without --recursive
        let ws = test_workspace(dir.path());

        assert_eq!(rebuild(&ws).unwrap(), 2);
        let index = dir.path().join(".index");
        let power = index.join("000003+_Power.pdf");
        assert_eq!(
            std::fs::read_link(&power).unwrap(),
            PathBuf::from("../bills/2024-01-02_00003+_Power.pdf")
        );
        assert!(power.exists());
        assert!(index.join("000001_out00001.png").exists());

        // rebuilding replaces stale entries
        std::fs::remove_file(dir.path().join("out00001.png")).unwrap();
        assert_eq!(rebuild(&ws).unwrap(), 1);
        assert!(!index.join("000001_out00001.png").exists());
    }

    #[test]
    fn test_up_path() {
        assert_eq!(up_path(".index"), PathBuf::from(".."));
        assert_eq!(up_path("meta/index"), PathBuf::from("../.."));
    }
}
