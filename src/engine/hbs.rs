//! The alternate template engine, backed by Handlebars.
//!
//! Helpers take positional parameters and write straight to the render
//! output stream; the `write` and `render` template functions are exposed
//! through that calling convention.

use handlebars::{
    Context, Handlebars, Helper, HelperDef, HelperResult, Output, RenderContext, RenderError,
};
use serde_json::Value;
use std::sync::Arc;

use super::RenderEnv;
use crate::error::{Error, Result};

/// Adapts a shared user helper to the registry's boxed registration.
struct SharedHelper(Arc<dyn HelperDef + Send + Sync>);

impl HelperDef for SharedHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'reg, 'rc>,
        r: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        self.0.call(h, r, ctx, rc, out)
    }
}

struct WriteHelper(Arc<RenderEnv>);

impl HelperDef for WriteHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'reg, 'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
        _: &mut dyn Output,
    ) -> HelperResult {
        let path = h
            .param(0)
            .and_then(|v| v.value().as_str())
            .ok_or_else(|| RenderError::new("write requires a path parameter"))?;
        let content = h
            .param(1)
            .and_then(|v| v.value().as_str())
            .ok_or_else(|| RenderError::new("write requires a content parameter"))?;

        super::save_and_post(&self.0, path, content)
            .map_err(|e| RenderError::new(e.to_string()))?;

        Ok(())
    }
}

struct RenderHelper(Arc<RenderEnv>);

impl HelperDef for RenderHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'reg, 'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let name = h
            .param(0)
            .and_then(|v| v.value().as_str())
            .ok_or_else(|| RenderError::new("render requires a template parameter"))?;
        let data = h
            .param(1)
            .map(|v| v.value().clone())
            .unwrap_or(Value::Null);

        let rendered = super::render_source_template(&self.0, name, &data)
            .map_err(|e| RenderError::new(e.to_string()))?;

        out.write(&rendered)?;

        Ok(())
    }
}

pub(super) fn render(
    env: &Arc<RenderEnv>,
    name: &str,
    template: &[u8],
    data: &Value,
) -> Result<String> {
    let source = std::str::from_utf8(template)
        .map_err(|_| Error::Template(format!("template {} is not valid UTF-8", name)))?;

    let mut registry = Handlebars::new();
    registry.register_escape_fn(handlebars::no_escape);

    for (fname, helper) in &env.alt_funcs {
        registry.register_helper(fname, Box::new(SharedHelper(Arc::clone(helper))));
    }

    if env.callbacks {
        registry.register_helper("write", Box::new(WriteHelper(Arc::clone(env))));
        registry.register_helper("render", Box::new(RenderHelper(Arc::clone(env))));
    }

    registry
        .register_template_string(name, source)
        .map_err(|e| Error::Template(format!("parsing template {} failed: {}", name, e)))?;

    registry
        .render(name, data)
        .map_err(|e| Error::Template(format!("rendering template {} failed: {}", name, e)))
}
