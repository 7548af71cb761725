//! Addresses hidden from the table, persisted one per line.
//!
//! The file is rewritten in full, sorted, after every change. Addresses are
//! stored verbatim, surrounding spaces included; an address containing a
//! newline or made only of whitespace cannot be represented.

use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{DebuggerError, Result};

#[derive(Debug, Clone)]
pub struct IgnoreList {
    path: PathBuf,
    entries: BTreeSet<String>,
}

impl IgnoreList {
    /// Load the list stored at `path`. A missing or unreadable file gives an
    /// empty list; read errors are logged, never returned.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(text) => parse_entries(&text),
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeSet::new(),
            Err(e) => {
                log::warn!("Could not read ignore list {}: {}", path.display(), e);
                BTreeSet::new()
            }
        };
        log::debug!("Loaded {} ignored address(es) from {}", entries.len(), path.display());
        Self { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, address: &str) -> bool {
        self.entries.contains(address)
    }

    /// Sorted iteration.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add `address` and persist. Returns whether it was newly added.
    ///
    /// On a write error the in-memory set keeps the address; the error is
    /// returned so the caller can warn the user.
    pub fn add(&mut self, address: &str) -> Result<bool> {
        if !self.entries.insert(address.to_string()) {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    /// Remove `address` and persist. Returns whether it was present.
    pub fn remove(&mut self, address: &str) -> Result<bool> {
        if !self.entries.remove(address) {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    pub fn save(&self) -> Result<()> {
        fs::write(&self.path, self.render()).map_err(|source| {
            log::warn!("Could not save ignore list {}: {}", self.path.display(), source);
            DebuggerError::IgnoreListWrite {
                path: self.path.clone(),
                source,
            }
        })
    }

    /// File contents: one address per line, sorted.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(entry);
            out.push('\n');
        }
        out
    }
}

fn parse_entries(text: &str) -> BTreeSet<String> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}
