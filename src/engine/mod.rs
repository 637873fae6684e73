//! Template engine façade.
//!
//! The render pipeline talks to a single `render_bytes` entry point and is
//! unaware of which concrete engine runs underneath. Each execution receives
//! a [`RenderEnv`] describing the current render: the directory the `write`
//! template function saves into, the materialized source directory the
//! `render` template function reads from, post-processing rules, delimiters
//! and user-supplied functions.

use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::PostRule;
use crate::error::{Error, Result};
use crate::fsops;
use crate::logger::Logger;
use crate::post;

mod hbs;
mod jinja;

/// User-supplied template functions for the primary engine, installed as
/// globals. Build values with `minijinja::value::Value::from_function`.
pub type TemplateFuncs = std::collections::BTreeMap<String, minijinja::value::Value>;

/// User-supplied helpers for the alternate engine. Helpers receive
/// positional parameters and write to the render output stream.
pub type AltTemplateFuncs = Vec<(String, Arc<dyn handlebars::HelperDef + Send + Sync>)>;

/// Identifies the concrete template engine behind the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    Jinja,
    Handlebars,
}

/// Per-render execution environment handed to the engines. The `write` and
/// `render` template functions close over this rather than over the scaffold
/// itself, so noop renders and real renders differ only in `target_dir`.
pub(crate) struct RenderEnv {
    pub kind: EngineKind,
    pub delimiters: Option<(String, String)>,
    /// Directory the `write` template function saves into; the staging
    /// directory while a render is in flight
    pub target_dir: PathBuf,
    /// Materialized source directory for `render` lookups; absent for
    /// string rendering, where the callbacks are not installed
    pub source_dir: Option<PathBuf>,
    pub post: Vec<PostRule>,
    pub funcs: TemplateFuncs,
    pub alt_funcs: AltTemplateFuncs,
    /// Whether the `write` and `render` template functions are available
    pub callbacks: bool,
    pub logger: Option<Arc<dyn Logger>>,
}

/// Parses and executes a named template with the engine selected by the
/// environment. Returns `None` when `skip_empty` is set and the rendered
/// output is whitespace-only; this is the skip sentinel, not an error.
pub(crate) fn render_bytes(
    env: &Arc<RenderEnv>,
    name: &str,
    template: &[u8],
    data: &Value,
    skip_empty: bool,
) -> Result<Option<Vec<u8>>> {
    let rendered = match env.kind {
        EngineKind::Jinja => jinja::render(env, name, template, data)?,
        EngineKind::Handlebars => hbs::render(env, name, template, data)?,
    };

    if skip_empty && rendered.trim().is_empty() {
        return Ok(None);
    }

    Ok(Some(rendered.into_bytes()))
}

/// Implements the `write` template function: saves content under the
/// current target directory after a containment check, then post-processes
/// the new file.
pub(crate) fn save_and_post(env: &Arc<RenderEnv>, rel: &str, content: &str) -> Result<()> {
    let out = fsops::lexical_clean(&env.target_dir.join(rel));

    if !fsops::contained_in_dir(&out, &env.target_dir) {
        return Err(Error::Containment(format!(
            "{} is not in target directory {}",
            rel,
            env.target_dir.display()
        )));
    }

    if let Some(parent) = out.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&out, content)?;
    fsops::set_mode(&out, 0o644)?;

    post::post_file(env, &out)?;

    if let Some(log) = &env.logger {
        log.debug(&format!("Rendered {}", out.display()));
    }

    Ok(())
}

/// Resolves a template name for the `render` template function, rejecting
/// paths that escape the materialized source directory.
pub(crate) fn validate_source_path(env: &RenderEnv, name: &str) -> Result<PathBuf> {
    let Some(source) = &env.source_dir else {
        return Err(Error::Template(
            "render is not available in this context".to_string(),
        ));
    };

    let path = fsops::lexical_clean(&source.join(name));

    if !fsops::contained_in_dir(&path, source) {
        return Err(Error::Containment(format!(
            "{} is not in source directory {}",
            name,
            source.display()
        )));
    }

    Ok(path)
}

/// Implements the `render` template function: reads a template relative to
/// the materialized source and evaluates it with the current engine.
pub(crate) fn render_source_template(
    env: &Arc<RenderEnv>,
    name: &str,
    data: &Value,
) -> Result<String> {
    let path = validate_source_path(env, name)?;
    let template = fs::read(&path)?;
    let display = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());

    let rendered = render_bytes(env, &display, &template, data, false)?
        .unwrap_or_default();

    Ok(String::from_utf8_lossy(&rendered).into_owned())
}
