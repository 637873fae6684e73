//! Command-line interface definitions for the Stencil binary.
//! Handles argument parsing; orchestration lives in main.

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Stencil: template driven scaffolding with interactive forms", long_about = None)]
#[command(after_help = r#"Usage Examples:
    # Render a scaffold with inline data:
    $ stencil render ./template ./output Name=World

    # Collect data interactively from a form first:
    $ stencil render ./template ./output --form questions.yaml

    # Post process rendered Go files:
    $ stencil render ./template ./output --post '*.go=gofmt -w {}'

Scaffold Structure:
    template/
    ├── _partials/          # Templates loadable via render(), never emitted
    └── ... template files ..."#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Renders a scaffold using custom data
    Render(RenderArgs),
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// The directory holding the scaffold to render
    #[arg(value_name = "SOURCE_DIR")]
    pub source: PathBuf,

    /// The directory to write the result into
    #[arg(value_name = "TARGET_DIR")]
    pub target: PathBuf,

    /// Data to pass to the templates
    #[arg(value_name = "KEY=VALUE")]
    pub data: Vec<String>,

    /// The template engine to use
    #[arg(long, value_enum, default_value_t = Engine::Jinja)]
    pub engine: Engine,

    /// Loads data from a JSON file
    #[arg(long, value_name = "FILE")]
    pub json: Option<PathBuf>,

    /// Loads data from a form file
    #[arg(long, value_name = "FILE")]
    pub form: Option<PathBuf>,

    /// Left delimiter
    #[arg(long, default_value = "{{")]
    pub left: String,

    /// Right delimiter
    #[arg(long, default_value = "}}")]
    pub right: String,

    /// Skip empty files
    #[arg(long, default_value_t = true, action = ArgAction::Set, value_name = "BOOL")]
    pub skip_empty: bool,

    /// Merge result into an existing directory
    #[arg(long, default_value_t = true, action = ArgAction::Set, value_name = "BOOL")]
    pub merge: bool,

    /// Post processing steps
    #[arg(long, value_name = "PATTERN=TOOL")]
    pub post: Vec<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Engine {
    Jinja,
    Handlebars,
}
