//! Avatar state flags scraped from the newest VRChat `output_log*.txt`.
//!
//! Runs once at startup. Nothing in here fails: a missing directory, a
//! missing file or a missing field all turn into empty strings.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::SystemTime;

use regex::Regex;

const LOG_FILE_PREFIX: &str = "output_log";
const LOG_FILE_SUFFIX: &str = ".txt";

/// Written by VRChat once its OSC connection is up.
const OSC_CONNECTED_MARKER: &str = "of type OSC on";
const OSC_CONNECTED_VALUE: &str = "True";

static OSC_ENABLED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"OSC enabled:\s*(.+)").expect("OSC pattern"));
static INTERACTION_LEVEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Avatar interaction level:\s*(.+)").expect("interaction pattern"));
static SELF_INTERACTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Avatar self-interaction:\s*(.+)").expect("self-interaction pattern")
});

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogFlags {
    pub osc: String,
    pub interaction: String,
    pub self_interaction: String,
}

impl LogFlags {
    pub fn info_line(&self) -> String {
        format!(
            "osc=\"{}\" self-interaction=\"{}\" interaction=\"{}\"",
            self.osc, self.self_interaction, self.interaction
        )
    }
}

/// `%LOCALAPPDATA%\..\LocalLow\VRChat\VRChat` for the current user.
pub fn default_log_dir() -> Option<PathBuf> {
    log_dir_from_env(env::var_os("LOCALAPPDATA"), env::var_os("USERNAME"))
}

fn log_dir_from_env(local_app_data: Option<OsString>, username: Option<OsString>) -> Option<PathBuf> {
    let local_low = match (local_app_data, username) {
        (Some(local), _) => {
            let local = PathBuf::from(local);
            local.parent().unwrap_or(local.as_path()).join("LocalLow")
        }
        (None, Some(user)) => PathBuf::from("C:/Users")
            .join(user)
            .join("AppData")
            .join("LocalLow"),
        (None, None) => return None,
    };
    Some(local_low.join("VRChat").join("VRChat"))
}

fn is_log_file_name(name: &str) -> bool {
    name.starts_with(LOG_FILE_PREFIX) && name.ends_with(LOG_FILE_SUFFIX)
}

/// Most recently modified `output_log*.txt` in `dir`.
pub fn find_latest_log(dir: &Path) -> Option<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("No log files found in {}: {}", dir.display(), e);
            return None;
        }
    };

    let latest = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_str().is_some_and(is_log_file_name))
        .filter_map(|entry| {
            let meta = entry.metadata().ok()?;
            if !meta.is_file() {
                return None;
            }
            let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            Some((modified, entry.path()))
        })
        .max_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)))
        .map(|(_, path)| path);

    if latest.is_none() {
        log::warn!("No log files found in {}", dir.display());
    }
    latest
}

fn capture(pattern: &Regex, text: &str) -> String {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

/// Field extraction followed by the OSC override rule.
pub fn parse_log_flags(text: &str) -> LogFlags {
    let mut flags = LogFlags {
        osc: capture(&OSC_ENABLED, text),
        interaction: capture(&INTERACTION_LEVEL, text),
        self_interaction: capture(&SELF_INTERACTION, text),
    };
    apply_osc_connected_override(text, &mut flags);
    flags
}

/// An established OSC connection in the log wins over whatever the
/// `OSC enabled:` line said.
fn apply_osc_connected_override(text: &str, flags: &mut LogFlags) {
    if text.contains(OSC_CONNECTED_MARKER) {
        flags.osc = OSC_CONNECTED_VALUE.to_string();
    }
}

/// Read flags from the newest log in `dir`.
pub fn scan(dir: &Path) -> LogFlags {
    let Some(path) = find_latest_log(dir) else {
        log::warn!("Log file not found, avatar flags unavailable");
        return LogFlags::default();
    };
    log::info!("Using log {}", path.display());
    scan_file(&path)
}

pub fn scan_file(path: &Path) -> LogFlags {
    match fs::read(path) {
        Ok(bytes) => parse_log_flags(&String::from_utf8_lossy(&bytes)),
        Err(e) => {
            log::warn!("Error reading log {}: {}", path.display(), e);
            LogFlags::default()
        }
    }
}

/// [`scan`] against an optional directory, for when no default could be resolved.
pub fn scan_dir_or_default(dir: Option<&Path>) -> LogFlags {
    match dir {
        Some(dir) => scan(dir),
        None => {
            log::warn!("Could not determine the VRChat log directory");
            LogFlags::default()
        }
    }
}
