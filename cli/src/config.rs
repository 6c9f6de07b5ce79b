use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context as _;
use serde::Deserialize;

/// Settings from `attest.toml` or the command line. Unset fields fall back to
/// the next layer.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    #[serde(skip)]
    pub source_config_file: Option<PathBuf>,

    pub tests_dir: Option<PathBuf>,
    pub pattern: Option<String>,
    pub jobs: Option<usize>,
    pub timeout: Option<f64>,
    pub digits: Option<usize>,
}

impl FileConfig {
    pub const FILENAME: &str = "attest.toml";

    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn from_toml_file(filepath: PathBuf) -> anyhow::Result<Self> {
        let toml = fsutil::read_to_string(&filepath).context("Cannot read a file")?;
        let mut cfg = Self::from_toml(&toml)
            .with_context(|| format!("Invalid config TOML: {:?}", filepath))?;

        // Paths in the file are relative to the file.
        if let (Some(dir), Some(base)) = (&cfg.tests_dir, filepath.parent()) {
            cfg.tests_dir = Some(base.join(dir));
        }
        cfg.source_config_file = Some(filepath);
        Ok(cfg)
    }

    /// Loads the nearest config file in `cur_dir` or its ancestors, if any.
    pub fn from_file_finding_in_ancestors(cur_dir: impl AsRef<Path>) -> anyhow::Result<Option<Self>> {
        match fsutil::find_in_ancestors(cur_dir, Self::FILENAME) {
            Some(path) => {
                log::debug!("Using config {:?}", path);
                Self::from_toml_file(path).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Fields set in `self` win over those in `lower`.
    pub fn or(self, lower: Self) -> Self {
        Self {
            source_config_file: self.source_config_file.or(lower.source_config_file),
            tests_dir: self.tests_dir.or(lower.tests_dir),
            pattern: self.pattern.or(lower.pattern),
            jobs: self.jobs.or(lower.jobs),
            timeout: self.timeout.or(lower.timeout),
            digits: self.digits.or(lower.digits),
        }
    }
}

/// Fully resolved settings of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub tests_dir: PathBuf,
    pub pattern: glob::Pattern,
    pub jobs: usize,
    pub timeout: Duration,
    pub digits: usize,
}

impl Settings {
    pub const DEFAULT_TESTS_DIR: &str = "tests";
    pub const DEFAULT_PATTERN: &str = "*.txt";

    pub fn resolve(cfg: FileConfig) -> anyhow::Result<Self> {
        let pattern = cfg.pattern.as_deref().unwrap_or(Self::DEFAULT_PATTERN);
        let pattern = glob::Pattern::new(pattern)
            .with_context(|| format!("Invalid test file pattern '{}'", pattern))?;

        let jobs = match cfg.jobs.unwrap_or(0) {
            0 => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            n => n,
        };

        let timeout = cfg.timeout.unwrap_or(0.0);
        let timeout = Duration::try_from_secs_f64(timeout)
            .with_context(|| format!("Invalid timeout: {} seconds", timeout))?;

        Ok(Self {
            tests_dir: cfg
                .tests_dir
                .unwrap_or_else(|| PathBuf::from(Self::DEFAULT_TESTS_DIR)),
            pattern,
            jobs,
            timeout,
            digits: cfg.digits.unwrap_or(0),
        })
    }
}
