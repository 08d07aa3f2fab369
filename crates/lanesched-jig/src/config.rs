// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Jig configuration: the JSON schema, where it is stored and how it is
//! read and written.

use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use lanesched_core::FlushPolicy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File name of the jig config inside the platform config dir.
pub const CONFIG_FILE: &str = "jig.json";

/// Failures reading, parsing or writing the jig config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform has no per-user config directory.
    #[error("no platform config directory; pass --config <file>")]
    NoConfigDir,
    /// The config file exists but could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// File being read.
        path: PathBuf,
        /// Underlying I/O failure.
        source: io::Error,
    },
    /// The config file could not be written.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        /// File being written.
        path: PathBuf,
        /// Underlying I/O failure.
        source: io::Error,
    },
    /// The config file is not valid jig config JSON.
    #[error("{} is not a valid jig config: {source}", path.display())]
    Parse {
        /// File being parsed.
        path: PathBuf,
        /// JSON error.
        source: serde_json::Error,
    },
    /// Serializing the config failed.
    #[error("failed to encode jig config: {0}")]
    Encode(#[source] serde_json::Error),
    /// Refused to replace an existing config.
    #[error("{} already exists (pass --force to overwrite)", .0.display())]
    Exists(PathBuf),
}

/// Backing storage for the jig config.
pub trait ConfigStore {
    /// Location reported in logs and errors.
    fn path(&self) -> &Path;
    /// Stored bytes, or `None` if nothing is stored yet.
    fn read(&self) -> Result<Option<Vec<u8>>, ConfigError>;
    /// Replaces the stored bytes.
    fn write(&self, data: &[u8]) -> Result<(), ConfigError>;
}

/// Config kept in one JSON file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    /// Config at `path`.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `jig.json` in the platform config dir (e.g. `~/.config/lanesched`).
    pub fn platform() -> Option<Self> {
        ProjectDirs::from("dev", "flyingrobots", "lanesched")
            .map(|dirs| Self::at(dirs.config_dir().join(CONFIG_FILE)))
    }

    /// `explicit` if given, else the platform file.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Ok(Self::at(path)),
            None => Self::platform().ok_or(ConfigError::NoConfigDir),
        }
    }
}

impl ConfigStore for ConfigFile {
    fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Option<Vec<u8>>, ConfigError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(ConfigError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn write(&self, data: &[u8]) -> Result<(), ConfigError> {
        write_creating_dirs(&self.path, data).map_err(|source| ConfigError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

fn write_creating_dirs(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, data)
}

/// Parses the config held by `store`. Missing or blank storage yields `None`.
pub fn read_config(store: &impl ConfigStore) -> Result<Option<JigConfig>, ConfigError> {
    let Some(bytes) = store.read()? else {
        return Ok(None);
    };
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| ConfigError::Parse {
            path: store.path().to_path_buf(),
            source,
        })
}

/// Stores `config` as pretty JSON. An existing non-blank config is only
/// replaced when `overwrite` is set.
pub fn write_config(
    store: &impl ConfigStore,
    config: &JigConfig,
    overwrite: bool,
) -> Result<(), ConfigError> {
    let occupied = store
        .read()?
        .is_some_and(|bytes| !bytes.iter().all(u8::is_ascii_whitespace));
    if occupied && !overwrite {
        return Err(ConfigError::Exists(store.path().to_path_buf()));
    }
    let mut data = serde_json::to_vec_pretty(config).map_err(ConfigError::Encode)?;
    data.push(b'\n');
    store.write(&data)
}

/// `schedule-batch` defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Queue length.
    pub qlen: u32,
    /// Keys are reduced modulo this value.
    pub modulo: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            qlen: 1024,
            modulo: 16,
        }
    }
}

/// `accounts` defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountsConfig {
    /// Number of accounts.
    pub accounts: usize,
    /// Number of transfers.
    pub transfers: usize,
    /// Starting balance of every account.
    pub initial_balance: i64,
    /// Largest transfer amount.
    pub max_amount: i64,
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            accounts: 4096,
            transfers: 100_000,
            initial_balance: 1_000_000,
            max_amount: 1_000,
        }
    }
}

/// `conflict` defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConflictConfig {
    /// Lanes per vector.
    pub lanes: usize,
    /// Vectors tested.
    pub iterations: usize,
}

impl Default for ConflictConfig {
    fn default() -> Self {
        Self {
            lanes: 16,
            iterations: 100_000,
        }
    }
}

/// Forced-flush settings used by scheduled account updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlushConfig {
    /// Consecutive short batches tolerated before a flush.
    pub max_deferrals: usize,
    /// Batches smaller than this count as deferrals.
    pub min_batch: usize,
}

impl Default for FlushConfig {
    fn default() -> Self {
        let p = FlushPolicy::default();
        Self {
            max_deferrals: p.max_deferrals,
            min_batch: p.min_batch,
        }
    }
}

impl From<FlushConfig> for FlushPolicy {
    fn from(c: FlushConfig) -> Self {
        Self {
            max_deferrals: c.max_deferrals,
            min_batch: c.min_batch,
        }
    }
}

/// Complete jig configuration; every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JigConfig {
    /// Seed for generated inputs.
    pub seed: u64,
    /// Iterations of the lane warm-up loop.
    pub warmup_rounds: u32,
    /// Log filter used when neither `RUST_LOG` nor `--log-level` is given.
    pub log_level: String,
    /// `schedule-batch` defaults.
    pub schedule: ScheduleConfig,
    /// `accounts` defaults.
    pub accounts: AccountsConfig,
    /// `conflict` defaults.
    pub conflict: ConflictConfig,
    /// Forced-flush policy.
    pub flush: FlushConfig,
}

impl Default for JigConfig {
    fn default() -> Self {
        Self {
            seed: 0x5EED,
            warmup_rounds: 50_000,
            log_level: "info".to_owned(),
            schedule: ScheduleConfig::default(),
            accounts: AccountsConfig::default(),
            conflict: ConflictConfig::default(),
            flush: FlushConfig::default(),
        }
    }
}

/// Loads the jig config from `explicit` or the platform config dir.
///
/// A missing or blank file yields defaults, as does a platform without a
/// config dir when no file is named.
pub fn load_config(explicit: Option<&Path>) -> Result<JigConfig, ConfigError> {
    let file = match explicit {
        Some(path) => ConfigFile::at(path),
        None => match ConfigFile::platform() {
            Some(file) => file,
            None => return Ok(JigConfig::default()),
        },
    };
    Ok(read_config(&file)?.unwrap_or_default())
}
