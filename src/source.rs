//! In-memory template sources and their materialization.
//!
//! A source supplied in memory is a recursive map: string values become
//! files, nested maps become subdirectories. Before rendering, the tree is
//! written into a fresh temp directory so the walk and the `render` template
//! function operate on a real directory either way.

use indexmap::IndexMap;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

use crate::error::{Error, Result};
use crate::fsops;

/// One entry of an in-memory source tree.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SourceEntry {
    /// Template content for a single file
    File(String),
    /// A nested subdirectory
    Dir(SourceTree),
}

/// A named tree of in-memory template entries, in insertion order.
pub type SourceTree = IndexMap<String, SourceEntry>;

/// Writes the in-memory source into a fresh temp directory mirroring the
/// tree. The directory is removed when the returned guard is dropped,
/// including on error paths.
pub fn materialize(source: &SourceTree) -> Result<TempDir> {
    let td = tempfile::Builder::new().prefix("stencil-source-").tempdir()?;
    dump_source_dir(source, td.path())?;

    Ok(td)
}

fn dump_source_dir(source: &SourceTree, target: &Path) -> Result<()> {
    for (name, entry) in source {
        if name.contains("..") || name.contains('/') || name.contains('\\') {
            return Err(Error::Input(format!("invalid file name {}", name)));
        }

        let out = target.join(name);

        match entry {
            SourceEntry::File(content) => {
                fs::write(&out, content)?;
                fsops::set_mode(&out, 0o400)?;
            }
            SourceEntry::Dir(sub) => {
                fs::create_dir(&out)?;
                fsops::set_mode(&out, 0o700)?;
                dump_source_dir(sub, &out)?;
            }
        }
    }

    Ok(())
}
