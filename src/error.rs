//! Error types and handling for the Stencil application.
//! Defines custom error types and results used throughout the application.

use std::io;
use thiserror::Error;

/// Custom error types for Stencil operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Represents errors that occur during file system operations
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Represents errors raised while validating a scaffold configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Represents invalid caller-supplied input such as bad in-memory source
    /// entries or unsupported form property types
    #[error("invalid input: {0}")]
    Input(String),

    /// Represents attempts to read or write outside a declared root directory
    #[error("{0}")]
    Containment(String),

    /// Represents parse and execution failures from a template engine
    #[error("template error: {0}")]
    Template(String),

    /// Represents post-processing command failures
    #[error("failed to post process {file}\nerror: {error}\noutput: {output:?}")]
    PostProcess {
        file: String,
        error: String,
        output: String,
    },

    /// Represents failures from the interactive prompter
    #[error("prompt error: {0}")]
    Prompt(String),

    /// Represents invariant violations in the form entry tree
    #[error("{0}")]
    Tree(String),

    /// Represents expression evaluation failures in conditionals and validators
    #[error("validation error: {0}")]
    Validation(String),
}

/// Convenience type alias for Results with stencil's Error as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Default error handler that prints the error and exits the program.
pub fn default_error_handler(err: Error) -> ! {
    eprintln!("{}", err);
    std::process::exit(1);
}
