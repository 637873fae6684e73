use clap::Parser;
use std::path::PathBuf;

use stencil::cli::{Cli, Command, Engine};

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(args.iter().copied()).unwrap()
}

#[test]
fn parses_a_minimal_render_command() {
    let cli = parse(&["stencil", "render", "./tmpl", "./out"]);

    let Command::Render(args) = cli.command;
    assert_eq!(args.source, PathBuf::from("./tmpl"));
    assert_eq!(args.target, PathBuf::from("./out"));
    assert!(args.data.is_empty());
    assert_eq!(args.engine, Engine::Jinja);
    assert_eq!(args.left, "{{");
    assert_eq!(args.right, "}}");
    assert!(args.skip_empty);
    assert!(args.merge);
}

#[test]
fn parses_data_pairs_and_flags() {
    let cli = parse(&[
        "stencil",
        "render",
        "./tmpl",
        "./out",
        "Name=World",
        "Env=prod",
        "--engine",
        "handlebars",
        "--left",
        "<<",
        "--right",
        ">>",
        "--skip-empty",
        "false",
        "--merge",
        "false",
        "--post",
        "*.go=gofmt -w {}",
        "--post",
        "*.json=jq .",
    ]);

    let Command::Render(args) = cli.command;
    assert_eq!(args.data, vec!["Name=World", "Env=prod"]);
    assert_eq!(args.engine, Engine::Handlebars);
    assert_eq!(args.left, "<<");
    assert_eq!(args.right, ">>");
    assert!(!args.skip_empty);
    assert!(!args.merge);
    assert_eq!(args.post, vec!["*.go=gofmt -w {}", "*.json=jq ."]);
}

#[test]
fn requires_source_and_target() {
    assert!(Cli::try_parse_from(["stencil", "render", "./tmpl"]).is_err());
    assert!(Cli::try_parse_from(["stencil", "render"]).is_err());
}

#[test]
fn accepts_data_file_flags() {
    let cli = parse(&[
        "stencil", "render", "./tmpl", "./out", "--json", "data.json", "--form", "form.yaml",
    ]);

    let Command::Render(args) = cli.command;
    assert_eq!(args.json, Some(PathBuf::from("data.json")));
    assert_eq!(args.form, Some(PathBuf::from("form.yaml")));
}
