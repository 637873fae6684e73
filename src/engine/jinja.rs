//! The primary template engine, backed by MiniJinja.

use minijinja::syntax::SyntaxConfig;
use minijinja::{Environment, ErrorKind};
use serde_json::Value;
use std::sync::Arc;

use super::RenderEnv;
use crate::error::{Error, Result};

pub(super) fn render(
    env: &Arc<RenderEnv>,
    name: &str,
    template: &[u8],
    data: &Value,
) -> Result<String> {
    let source = std::str::from_utf8(template)
        .map_err(|_| Error::Template(format!("template {} is not valid UTF-8", name)))?;

    let mut jinja = Environment::new();

    if let Some((left, right)) = &env.delimiters {
        let syntax = SyntaxConfig::builder()
            .variable_delimiters(left.clone(), right.clone())
            .build()
            .map_err(|e| Error::Template(format!("invalid delimiters: {}", e)))?;
        jinja.set_syntax(syntax);
    }

    for (fname, fval) in &env.funcs {
        jinja.add_global(fname.clone(), fval.clone());
    }

    if env.callbacks {
        let write_env = Arc::clone(env);
        jinja.add_function(
            "write",
            move |out: String, content: String| -> std::result::Result<String, minijinja::Error> {
                super::save_and_post(&write_env, &out, &content).map_err(to_engine_error)?;
                Ok(String::new())
            },
        );

        let render_env = Arc::clone(env);
        jinja.add_function(
            "render",
            move |tmpl: String,
                  data: minijinja::value::Value|
                  -> std::result::Result<String, minijinja::Error> {
                let json = serde_json::to_value(&data).map_err(|e| {
                    minijinja::Error::new(ErrorKind::InvalidOperation, e.to_string())
                })?;

                super::render_source_template(&render_env, &tmpl, &json)
                    .map_err(to_engine_error)
            },
        );
    }

    jinja
        .add_template(name, source)
        .map_err(|e| Error::Template(format!("parsing template {} failed: {}", name, e)))?;

    let tmpl = jinja
        .get_template(name)
        .map_err(|e| Error::Template(format!("parsing template {} failed: {}", name, e)))?;

    tmpl.render(data)
        .map_err(|e| Error::Template(format!("rendering template {} failed: {}", name, chain(e))))
}

fn to_engine_error(err: Error) -> minijinja::Error {
    minijinja::Error::new(ErrorKind::InvalidOperation, err.to_string())
}

/// Joins an engine error with its causes so failures raised inside template
/// functions keep their original message.
fn chain(err: minijinja::Error) -> String {
    let mut out = err.to_string();
    let mut source = std::error::Error::source(&err);
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
