use std::env;
use std::num::NonZeroUsize;
use std::path::PathBuf;

use tracing::warn;

pub const TABLE_ENV: &str = "LUNAR_ALMANAC_TABLE";
pub const CACHE_ENV: &str = "LUNAR_ALMANAC_CACHE";
pub const PREFS_ENV: &str = "LUNAR_ALMANAC_PREFS";

const DEFAULT_CACHE_CAPACITY: usize = 128;
const DEFAULT_PREFS_PATH: &str = "data/defaults.json";

// Runtime settings for the almanac
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlmanacConfig {
    /// External table file. `None` uses the bundled 2018-2024 table.
    pub table_path: Option<PathBuf>,
    pub cache_capacity: NonZeroUsize,
    pub prefs_path: PathBuf,
}

impl Default for AlmanacConfig {
    fn default() -> Self {
        Self {
            table_path: None,
            cache_capacity: NonZeroUsize::new(DEFAULT_CACHE_CAPACITY)
                .unwrap_or(NonZeroUsize::MIN),
            prefs_path: PathBuf::from(DEFAULT_PREFS_PATH),
        }
    }
}

impl AlmanacConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Defaults overlaid with whatever `lookup` returns for the
    /// `LUNAR_ALMANAC_*` keys. Unusable values are logged and skipped.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(TABLE_ENV).filter(|v| !v.is_empty()) {
            config.table_path = Some(PathBuf::from(path));
        }

        if let Some(raw) = lookup(CACHE_ENV) {
            match raw.trim().parse::<NonZeroUsize>() {
                Ok(capacity) => config.cache_capacity = capacity,
                Err(e) => warn!("Ignoring {}={:?}: {}", CACHE_ENV, raw, e),
            }
        }

        if let Some(path) = lookup(PREFS_ENV).filter(|v| !v.is_empty()) {
            config.prefs_path = PathBuf::from(path);
        }

        config
    }
}
