pub mod convert;
pub mod ids;
pub mod index;
pub mod list;
pub mod merge;
pub mod next_id;

use crate::archive::Snapshot;
use crate::config::Config;
use crate::naming::FilenameCodec;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// The archive directory a command works on, with its settings.
pub struct Workspace {
    pub dir: PathBuf,
    pub config: Config,
    pub codec: FilenameCodec,
    pub recursive: bool,
}

impl Workspace {
    pub fn open(dir: &Path, config: Config, recursive: bool) -> Result<Self> {
        let codec = config.codec()?;
        let recursive = recursive || config.archive.recursive;
        Ok(Workspace {
            dir: dir.to_path_buf(),
            config,
            codec,
            recursive,
        })
    }

    pub fn snapshot(&self) -> Result<Snapshot> {
        Snapshot::read(&self.dir, &self.codec, self.recursive)
            .with_context(|| format!("Failed to read archive directory: {}", self.dir.display()))
    }

    /// The whole archive, category folders included, whatever `recursive`
    /// says. Merged documents are filed below `dir` and must keep their IDs
    /// taken.
    pub fn archive_snapshot(&self) -> Result<Snapshot> {
        Snapshot::read(&self.dir, &self.codec, true)
            .with_context(|| format!("Failed to read archive directory: {}", self.dir.display()))
    }

    pub fn parse_ids(&self, expr: &str) -> Result<Vec<u32>> {
        Ok(self.config.range_parser().parse(expr)?)
    }
}

#[cfg(test)]
pub(crate) fn test_workspace(dir: &Path) -> Workspace {
    Workspace::open(dir, Config::default(), false).unwrap()
}
