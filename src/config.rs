//! Runtime configuration.
//!
//! Settings come from an optional `config.json` next to the executable's
//! working directory. Every field has a default, so a missing file or a
//! partial one is fine:
//!
//! ```json
//! {
//!   "osc": { "listening_host": "0.0.0.0", "listening_port": 9001 },
//!   "ignore_list_path": "ignored_params.txt",
//!   "log_dir": null,
//!   "tick_interval_ms": 100,
//!   "info_refresh_secs": 5
//! }
//! ```
//!
//! Command line flags ([`CliOverrides`]) are applied on top.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DebuggerError, Result};

pub const DEFAULT_CONFIG_FILE: &str = "config.json";
pub const DEFAULT_IGNORE_FILE: &str = "ignored_params.txt";
pub const DEFAULT_OSC_HOST: &str = "0.0.0.0";
/// VRChat sends avatar parameters to this port by default.
pub const DEFAULT_OSC_PORT: u16 = 9001;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OscConfig {
    pub listening_host: String,
    pub listening_port: u16,
}

impl Default for OscConfig {
    fn default() -> Self {
        Self {
            listening_host: DEFAULT_OSC_HOST.to_string(),
            listening_port: DEFAULT_OSC_PORT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebuggerConfig {
    pub osc: OscConfig,
    pub ignore_list_path: PathBuf,
    /// Directory holding `output_log*.txt`. `None` means the platform default.
    pub log_dir: Option<PathBuf>,
    pub tick_interval_ms: u64,
    pub info_refresh_secs: u64,
}

impl Default for DebuggerConfig {
    fn default() -> Self {
        Self {
            osc: OscConfig::default(),
            ignore_list_path: PathBuf::from(DEFAULT_IGNORE_FILE),
            log_dir: None,
            tick_interval_ms: 100,
            info_refresh_secs: 5,
        }
    }
}

impl DebuggerConfig {
    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(DebuggerError::ConfigRead {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        Self::from_json(&text).map_err(|source| DebuggerError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(text: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.osc.listening_host, self.osc.listening_port)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn info_refresh(&self) -> Duration {
        Duration::from_secs(self.info_refresh_secs.max(1))
    }

    /// Log directory from the config, or the VRChat default for this user.
    pub fn resolved_log_dir(&self) -> Option<PathBuf> {
        self.log_dir
            .clone()
            .or_else(crate::log_scanner::default_log_dir)
    }

    pub fn apply(&mut self, overrides: &CliOverrides) {
        if let Some(host) = &overrides.host {
            self.osc.listening_host = host.clone();
        }
        if let Some(port) = overrides.port {
            self.osc.listening_port = port;
        }
        if let Some(path) = &overrides.ignore_file {
            self.ignore_list_path = path.clone();
        }
        if let Some(dir) = &overrides.log_dir {
            self.log_dir = Some(dir.clone());
        }
    }
}

/// Flags shared by the terminal and window front ends.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct CliOverrides {
    /// Path to config.json
    #[arg(short = 'c', long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// UDP port to listen on for OSC
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// Address to bind the OSC listener to
    #[arg(long)]
    pub host: Option<String>,

    /// File holding ignored parameter addresses
    #[arg(long)]
    pub ignore_file: Option<PathBuf>,

    /// Directory containing VRChat output_log*.txt files
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl CliOverrides {
    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }

    /// Read the config file named by `--config` and apply the remaining flags.
    pub fn load_config(&self) -> Result<DebuggerConfig> {
        let mut config = DebuggerConfig::load(&self.config)?;
        config.apply(self);
        Ok(config)
    }
}
