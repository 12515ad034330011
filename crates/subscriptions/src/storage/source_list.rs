//! Plain-text source list: one channel identifier per line

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use super::write_atomically;
use crate::error::{MigrationError, Result, StorageError};
use crate::models::ChannelId;

/// Writes the export artifact
pub struct SourceListWriter {
    path: PathBuf,
}

impl SourceListWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Replace the file with `channels`, one per line, in the given order
    ///
    /// Export is always a full refresh; any prior content is discarded.
    pub fn write(&self, channels: &[ChannelId]) -> Result<(), StorageError> {
        let mut content = String::with_capacity(channels.len() * 25);
        for channel in channels {
            content.push_str(channel.as_str());
            content.push('\n');
        }
        write_atomically(&self.path, &content).map_err(|e| StorageError::new(&self.path, e))
    }
}

/// Reads the import input
pub struct SourceListReader {
    path: PathBuf,
}

impl SourceListReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read identifiers in file order
    ///
    /// Blank lines are skipped and whitespace trimmed. Duplicate lines are
    /// kept; the sync engine treats them idempotently.
    pub fn read(&self) -> Result<Vec<ChannelId>> {
        let content = fs::read_to_string(&self.path).map_err(|source| {
            MigrationError::MalformedInput {
                path: self.path.clone(),
                source,
            }
        })?;
        let channels = parse_source_list(&content);
        debug!("Read {} channels from {}", channels.len(), self.path.display());
        Ok(channels)
    }
}

fn parse_source_list(content: &str) -> Vec<ChannelId> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ChannelId::from)
        .collect()
}
