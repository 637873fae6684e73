//! Stencil's main application entry point and orchestration logic.
//! Parses command-line arguments, assembles the data context from flags,
//! JSON files, the environment and interactive forms, then renders.

use clap::Parser;
use serde_json::{Map, Value};
use std::fs;

use stencil::cli::{Cli, Command, Engine, RenderArgs};
use stencil::config::{Config, PostRule};
use stencil::error::{default_error_handler, Error, Result};
use stencil::forms;
use stencil::logger::{init_logger, StandardLogger};
use stencil::scaffold::Scaffold;

fn main() {
    let cli = Cli::parse();

    init_logger(cli.verbose);

    let result = match cli.command {
        Command::Render(args) => render(args),
    };

    if let Err(err) = result {
        default_error_handler(err);
    }
}

fn render(args: RenderArgs) -> Result<()> {
    let mut data = Map::new();

    for pair in &args.data {
        let Some((key, value)) = pair.split_once('=') else {
            return Err(Error::Input(format!("invalid data argument {:?}", pair)));
        };
        data.insert(key.to_string(), Value::String(value.to_string()));
    }

    let mut environment = Map::new();
    for (key, value) in std::env::vars() {
        environment.insert(key, Value::String(value));
    }
    data.insert("ENVIRONMENT".to_string(), Value::Object(environment));

    if let Some(json) = &args.json {
        let raw = fs::read(json)?;
        let loaded: Map<String, Value> = serde_json::from_slice(&raw)
            .map_err(|e| Error::Input(format!("invalid JSON data file: {}", e)))?;
        data.extend(loaded);
    }

    if let Some(form) = &args.form {
        let answers = forms::process_file(form, &data, forms::ProcessOptions::new())?;
        data.extend(answers);
    }

    let cfg = Config {
        target_directory: args.target.clone(),
        source_directory: Some(args.source.clone()),
        merge_target_directory: args.merge,
        skip_empty: args.skip_empty,
        left_delimiter: Some(args.left.clone()),
        right_delimiter: Some(args.right.clone()),
        post: parse_post_rules(&args.post)?,
        ..Config::default()
    };

    let mut scaffold = match args.engine {
        Engine::Jinja => Scaffold::new(cfg, Default::default())?,
        Engine::Handlebars => Scaffold::new_alt(cfg, Vec::new())?,
    };
    scaffold.set_logger(StandardLogger);

    let plan = scaffold.render(&Value::Object(data))?;

    for file in &plan {
        println!(
            "{}: {}",
            file.action,
            scaffold.target_directory().join(&file.path).display()
        );
    }

    Ok(())
}

fn parse_post_rules(pairs: &[String]) -> Result<Vec<PostRule>> {
    let mut rules = Vec::new();

    for pair in pairs {
        let Some((pattern, command)) = pair.split_once('=') else {
            return Err(Error::Input(format!("invalid post argument {:?}", pair)));
        };
        rules.push(PostRule {
            pattern: pattern.to_string(),
            command: command.to_string(),
        });
    }

    Ok(rules)
}
