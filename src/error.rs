use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DebuggerError {
    #[error("OSC bind failed on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not save ignore list to {}: {source}", path.display())]
    IgnoreListWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not read config {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, DebuggerError>;
