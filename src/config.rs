//! Scaffold configuration and render plan types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::fsops;
use crate::source::SourceTree;

/// Configures a scaffolding operation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where to place the resulting rendered files, must not exist unless
    /// merge_target_directory is set
    #[serde(rename = "target")]
    pub target_directory: PathBuf,

    /// Reads templates from a directory, mutually exclusive with source
    pub source_directory: Option<PathBuf>,

    /// Writes into existing target directories
    pub merge_target_directory: bool,

    /// Reads templates from in-process memory
    pub source: Option<SourceTree>,

    /// Configures post-processing of files using file name globs
    pub post: Vec<PostRule>,

    /// Skips files that are whitespace-only after rendering
    pub skip_empty: bool,

    /// Sets a custom template delimiter, useful for generating templates
    /// from templates
    pub left_delimiter: Option<String>,

    /// Sets a custom template delimiter, useful for generating templates
    /// from templates
    pub right_delimiter: Option<String>,
}

/// One post-processing step: a glob matched against rendered file basenames
/// and the command to run on matches.
#[derive(Debug, Clone, Deserialize)]
pub struct PostRule {
    pub pattern: String,
    pub command: String,
}

impl Config {
    /// Validates the configuration and resolves the target directory to an
    /// absolute path. Called by the scaffold constructors.
    pub(crate) fn validate(&mut self) -> Result<()> {
        if self.target_directory.as_os_str().is_empty() {
            return Err(Error::Config("target is required".to_string()));
        }

        self.target_directory = fsops::absolutize(&self.target_directory)?;

        let has_memory = self.source.as_ref().is_some_and(|s| !s.is_empty());
        let has_dir = self.source_directory.is_some();

        if !has_memory && !has_dir {
            return Err(Error::Config("no sources provided".to_string()));
        }

        if has_memory && has_dir {
            return Err(Error::Config(
                "source and source_directory are mutually exclusive".to_string(),
            ));
        }

        if let Some(dir) = &self.source_directory {
            if let Err(e) = fs::metadata(dir) {
                return Err(Error::Config(format!("cannot read source directory: {}", e)));
            }
            self.source_directory = Some(fsops::absolutize(dir)?);
        }

        if self.left_delimiter.is_some() != self.right_delimiter.is_some() {
            return Err(Error::Config(
                "both left_delimiter and right_delimiter must be set".to_string(),
            ));
        }

        if !self.merge_target_directory && fs::metadata(&self.target_directory).is_ok() {
            return Err(Error::Config("target directory exists".to_string()));
        }

        Ok(())
    }
}

/// The type of change a file would undergo during rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileAction {
    Add,
    Update,
    Equal,
    Remove,
}

impl fmt::Display for FileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FileAction::Add => "add",
            FileAction::Update => "update",
            FileAction::Equal => "equal",
            FileAction::Remove => "remove",
        };
        f.write_str(s)
    }
}

/// A file and the action that would be taken on it during rendering. Paths
/// are target-relative with forward-slash separators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManagedFile {
    pub path: String,
    pub action: FileAction,
}
