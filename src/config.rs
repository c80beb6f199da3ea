use crate::id_range::{RangeParser, DEFAULT_CONTEXT_WINDOW, DEFAULT_MAX_IDS};
use crate::naming::FilenameCodec;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File looked up in the archive directory when `--config` is not given.
pub const CONFIG_FILE_NAME: &str = "paperid.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub naming: Naming,
    #[serde(default)]
    pub ranges: Ranges,
    #[serde(default)]
    pub archive: Archive,
    #[serde(default)]
    pub convert: Convert,
    #[serde(default)]
    pub logging: Logging,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw)
            .with_context(|| format!("parsing TOML: {}", path.display()))?;
        Ok(cfg)
    }

    /// Load `user` if given, else `<dir>/paperid.toml` if present, else defaults.
    pub fn resolve(user: Option<&Path>, dir: &Path) -> Result<Self> {
        if let Some(p) = user {
            return Self::load(p);
        }
        let default: PathBuf = dir.join(CONFIG_FILE_NAME);
        if default.is_file() {
            Self::load(&default)
        } else {
            Ok(Self::default())
        }
    }

    pub fn codec(&self) -> Result<FilenameCodec> {
        FilenameCodec::new(
            &self.naming.prefix,
            self.naming.id_width,
            self.naming.extensions.as_slice(),
        )
        .context("building filename pattern from [naming]")
    }

    pub fn range_parser(&self) -> RangeParser {
        RangeParser::new(self.ranges.context_window)
            .with_abbreviated_end(self.ranges.abbreviated_end)
            .with_max_ids(self.ranges.max_ids)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Naming {
    pub prefix: String,
    pub id_width: usize,
    pub extensions: Vec<String>,
}
impl Default for Naming {
    fn default() -> Self {
        Self {
            prefix: "out".into(),
            id_width: 5,
            extensions: vec!["pdf".into(), "png".into(), "jpg".into(), "jpeg".into()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Ranges {
    pub context_window: u32,
    pub abbreviated_end: bool,
    pub max_ids: u32,
}
impl Default for Ranges {
    fn default() -> Self {
        Self {
            context_window: DEFAULT_CONTEXT_WINDOW,
            abbreviated_end: false,
            max_ids: DEFAULT_MAX_IDS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Archive {
    pub recursive: bool,
    pub default_category: String,
    pub index_dir: String,
    pub index_min_width: usize,
}
impl Default for Archive {
    fn default() -> Self {
        Self {
            recursive: false,
            default_category: "_toSort".into(),
            index_dir: ".index".into(),
            index_min_width: 6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Convert {
    pub ocr_program: String,
    pub ocr_langs: Vec<String>,
    pub extra_args: Vec<String>,
}
impl Default for Convert {
    fn default() -> Self {
        Self {
            ocr_program: "ocrmypdf".into(),
            ocr_langs: vec!["deu".into(), "eng".into()],
            extra_args: vec![
                "--skip-text".into(),
                "--pdfa-image-compression".into(),
                "jpeg".into(),
                "--jpeg-quality".into(),
                "100".into(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Logging {
    pub level: String,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}
