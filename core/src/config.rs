use crate::types::{Seed, DEFAULT_LOAN_COUNT, DEFAULT_SEED};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "tape.json";
pub const TAPE_FILE: &str = "loan_tape.parquet";
pub const STATE_SUMMARY_FILE: &str = "state_summary.csv";
pub const BAND_DISTRIBUTION_FILE: &str = "fico_ltv_bands.csv";

/// Every path and knob one run needs. Passed explicitly to each stage.
#[derive(Debug, Clone)]
pub struct TapeConfig {
    pub root: PathBuf,
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub loan_count: usize,
    pub seed: Seed,
}

/// Optional overrides read from `<root>/tape.json`.
/// Relative paths are resolved against the root.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    data_dir: Option<PathBuf>,
    db_path: Option<PathBuf>,
    loan_count: Option<usize>,
    seed: Option<Seed>,
}

impl TapeConfig {
    /// Defaults laid out under `root`: `data/` and `db/mortgage.sqlite`.
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            data_dir: root.join("data"),
            db_path: root.join("db").join("mortgage.sqlite"),
            loan_count: DEFAULT_LOAN_COUNT,
            seed: DEFAULT_SEED,
            root,
        }
    }

    /// Defaults for `root`, then any overrides from `<root>/tape.json`.
    pub fn load(root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let mut config = Self::for_root(root);
        let path = config.root.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(config);
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {}: {e}", path.display()))?;
        let file: ConfigFile = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid {}: {e}", path.display()))?;

        if let Some(dir) = file.data_dir {
            config.data_dir = config.resolve(dir);
        }
        if let Some(db) = file.db_path {
            config.db_path = config.resolve(db);
        }
        if let Some(n) = file.loan_count {
            config.loan_count = n;
        }
        if let Some(seed) = file.seed {
            config.seed = seed;
        }
        log::debug!("config: loaded overrides from {}", path.display());
        Ok(config)
    }

    /// Small, fast configuration for tests.
    pub fn default_test(root: impl Into<PathBuf>) -> Self {
        Self {
            loan_count: 1_000,
            seed: 7,
            ..Self::for_root(root)
        }
    }

    fn resolve(&self, path: PathBuf) -> PathBuf {
        if path.is_absolute() {
            path
        } else {
            self.root.join(path)
        }
    }

    pub fn tape_path(&self) -> PathBuf {
        self.data_dir.join(TAPE_FILE)
    }

    pub fn state_summary_path(&self) -> PathBuf {
        self.data_dir.join(STATE_SUMMARY_FILE)
    }

    pub fn band_distribution_path(&self) -> PathBuf {
        self.data_dir.join(BAND_DISTRIBUTION_FILE)
    }

    pub fn db_dir(&self) -> Option<&Path> {
        self.db_path.parent().filter(|p| !p.as_os_str().is_empty())
    }
}
