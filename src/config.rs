use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_DB: &str = "REFEREE_STATS_DB";
pub const ENV_LOG: &str = "REFEREE_STATS_LOG";
pub const ENV_LOG_FILE: &str = "REFEREE_STATS_LOG_FILE";

const LOCAL_CONFIG: &str = "referee_stats.toml";
const DEFAULT_DB: &str = "data/referee_stats.db";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_STATS_LIMIT: usize = 5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {0} does not exist")]
    Missing(PathBuf),
    #[error("failed to read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("stats_limit must be at least 1")]
    ZeroLimit,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    database_path: Option<PathBuf>,
    log_level: Option<String>,
    log_file: Option<PathBuf>,
    stats_limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Config {
    pub database_path: PathBuf,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
    pub stats_limit: usize,
    pub source: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DB),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_file: None,
            stats_limit: DEFAULT_STATS_LIMIT,
            source: None,
        }
    }
}

/// Values given on the command line; they win over everything else.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config_file: Option<PathBuf>,
    pub database_path: Option<PathBuf>,
    pub log_level: Option<String>,
}

impl Config {
    pub fn load(overrides: &Overrides) -> Result<Self, ConfigError> {
        Self::resolve(overrides, |key| std::env::var(key).ok())
    }

    /// CLI > environment > TOML file > defaults.
    pub fn resolve(
        overrides: &Overrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let file_path = match &overrides.config_file {
            Some(path) if path.exists() => Some(path.clone()),
            Some(path) => return Err(ConfigError::Missing(path.clone())),
            None => default_config_paths(&env).into_iter().find(|p| p.exists()),
        };
        let file = match &file_path {
            Some(path) => read_file(path)?,
            None => FileConfig::default(),
        };
        let lookup = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let mut config = Config {
            source: file_path,
            ..Config::default()
        };
        if let Some(path) = overrides
            .database_path
            .clone()
            .or_else(|| lookup(ENV_DB).map(PathBuf::from))
            .or(file.database_path)
        {
            config.database_path = path;
        }
        if let Some(level) = overrides
            .log_level
            .clone()
            .or_else(|| lookup(ENV_LOG))
            .or(file.log_level)
        {
            config.log_level = level;
        }
        config.log_file = lookup(ENV_LOG_FILE).map(PathBuf::from).or(file.log_file);
        if let Some(limit) = file.stats_limit {
            if limit == 0 {
                return Err(ConfigError::ZeroLimit);
            }
            config.stats_limit = limit;
        }
        Ok(config)
    }
}

fn default_config_paths(env: &impl Fn(&str) -> Option<String>) -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(LOCAL_CONFIG)];
    let config_home = env("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| env("HOME").map(|home| Path::new(&home).join(".config")));
    if let Some(dir) = config_home {
        paths.push(dir.join("referee_stats").join("config.toml"));
    }
    paths
}

fn read_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
