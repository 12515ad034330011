//! Durable state for a migration
//!
//! Two artifacts survive between runs: the progress record (through the
//! [`ProgressStore`] trait, file-backed or in-memory) and the plain-text
//! source list written by export and read by import.

mod memory;
mod progress_file;
mod source_list;
mod traits;

pub use memory::InMemoryProgressStore;
pub use progress_file::{FileProgressStore, parse_progress, render_progress};
pub use source_list::{SourceListReader, SourceListWriter};
pub use traits::ProgressStore;

use std::path::Path;

/// Replace `path` with `contents` atomically; see [`config::write_atomic`]
pub(crate) fn write_atomically(path: &Path, contents: &str) -> std::io::Result<()> {
    config::write_atomic(path, contents.as_bytes())
}
