//! Stencil renders directory trees from templates and collects render data
//! through interactive terminal forms.
//!
//! Templates can be supplied as an on-disk source directory or as an
//! in-memory map of names to content. Rendered output is staged and then
//! committed to a target directory with atomic per-file swaps; only files
//! whose content changed are written, so repeated renders are safe against
//! existing targets when merging is enabled. Every render returns a plan
//! describing what happened to each managed file, and a noop render
//! computes the same plan without touching the target.

/// Command-line interface module for the Stencil binary.
/// Handles argument parsing and flag definitions.
pub mod cli;

/// Scaffold configuration, validation, and the render plan types.
pub mod config;

/// The template engine façade over the primary and alternate engines,
/// including the write() and render() template functions.
pub mod engine;

/// Error types and handling for the Stencil application.
/// Defines custom error types and results used throughout the application.
pub mod error;

/// Interactive terminal forms: YAML definitions, the prompt state machine,
/// and the partial-answer entry tree.
pub mod forms;

/// File system primitives: containment checks, hashing, atomic copies.
pub mod fsops;

/// The library logging interface and env_logger setup for the binary.
pub mod logger;

/// Post-processing of rendered files with external commands.
pub mod post;

/// Core render pipeline orchestration:
/// - Source materialization
/// - Template execution
/// - Staging and atomic commit
/// - Plan reporting
pub mod scaffold;

/// In-memory source trees and their materialization to disk.
pub mod source;
