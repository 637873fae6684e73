//! Conditional and validation expression evaluation.
//!
//! Expressions come from the `conditional` and `validation` fields of form
//! properties and are evaluated with `evalexpr`. Nested answer maps are
//! flattened into dotted variable names, so a conditional can reference an
//! earlier answer as `input.mode`. Validators additionally receive the
//! candidate answer as `value` and the `isInt`/`isFloat` helper functions.

use evalexpr::{
    eval_boolean_with_context, ContextWithMutableFunctions, ContextWithMutableVariables,
    Function, HashMapContext, Value as ExprValue,
};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::forms::prompt::Validator;

/// Evaluates a boolean expression against an environment of answers.
pub fn evaluate(env: &Map<String, Value>, expression: &str) -> Result<bool> {
    let mut ctx = base_context()?;
    flatten_into(&mut ctx, "", env)?;

    eval_boolean_with_context(expression, &ctx)
        .map_err(|e| Error::Validation(format!("{}: {}", expression, e)))
}

/// Builds a prompt validator from a validation expression. Empty answers
/// pass when the property is not required; otherwise the expression must
/// evaluate to true with the answer bound to `value`.
pub fn validator(expression: &str, required: bool) -> Validator {
    let expression = expression.to_string();

    Box::new(move |value: &str| {
        if !required && value.is_empty() {
            return Ok(());
        }

        let mut ctx = base_context().map_err(|e| e.to_string())?;
        ctx.set_value("value".to_string(), ExprValue::String(value.to_string()))
            .map_err(|e| e.to_string())?;

        match eval_boolean_with_context(&expression, &ctx) {
            Ok(true) => Ok(()),
            Ok(false) => Err(format!("did not pass validation: {}", expression)),
            Err(e) => Err(e.to_string()),
        }
    })
}

fn base_context() -> Result<HashMapContext> {
    let mut ctx = HashMapContext::new();

    ctx.set_function(
        "isInt".to_string(),
        Function::new(|argument| {
            let s = argument.as_string()?;
            Ok(ExprValue::Boolean(s.trim().parse::<i64>().is_ok()))
        }),
    )
    .map_err(|e| Error::Validation(e.to_string()))?;

    ctx.set_function(
        "isFloat".to_string(),
        Function::new(|argument| {
            let s = argument.as_string()?;
            Ok(ExprValue::Boolean(s.trim().parse::<f64>().is_ok()))
        }),
    )
    .map_err(|e| Error::Validation(e.to_string()))?;

    Ok(ctx)
}

/// Registers every scalar reachable from `env` as a dotted variable name.
/// Arrays of scalars become tuples; nested arrays and objects inside
/// arrays are not addressable and are skipped.
fn flatten_into(ctx: &mut HashMapContext, prefix: &str, env: &Map<String, Value>) -> Result<()> {
    for (key, value) in env {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };

        match value {
            Value::Object(nested) => flatten_into(ctx, &name, nested)?,
            Value::Array(items) => {
                let tuple: Vec<ExprValue> =
                    items.iter().filter_map(scalar_to_expr).collect();
                set_var(ctx, name, ExprValue::Tuple(tuple))?;
            }
            other => {
                if let Some(v) = scalar_to_expr(other) {
                    set_var(ctx, name, v)?;
                }
            }
        }
    }

    Ok(())
}

fn set_var(ctx: &mut HashMapContext, name: String, value: ExprValue) -> Result<()> {
    ctx.set_value(name, value)
        .map_err(|e| Error::Validation(e.to_string()))
}

fn scalar_to_expr(value: &Value) -> Option<ExprValue> {
    match value {
        Value::Bool(b) => Some(ExprValue::Boolean(*b)),
        Value::String(s) => Some(ExprValue::String(s.clone())),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(ExprValue::Int(i))
            } else {
                n.as_f64().map(ExprValue::Float)
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn env(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(m) => m,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn evaluates_against_nested_input() {
        let e = env(json!({"input": {"mode": "expert", "level": 3}}));

        assert!(evaluate(&e, r#"input.mode == "expert""#).unwrap());
        assert!(!evaluate(&e, r#"input.mode == "basic""#).unwrap());
        assert!(evaluate(&e, "input.level > 2").unwrap());
    }

    #[test]
    fn invalid_expressions_error() {
        let e = env(json!({}));
        assert!(evaluate(&e, "nonsense ==").is_err());
    }

    #[test]
    fn int_validator_accepts_integers() {
        let v = validator("isInt(value)", true);
        assert!(v("42").is_ok());
        assert!(v("-7").is_ok());
        assert!(v("4.2").is_err());
        assert!(v("abc").is_err());
    }

    #[test]
    fn float_validator_accepts_floats() {
        let v = validator("isFloat(value)", true);
        assert!(v("4.2").is_ok());
        assert!(v("42").is_ok());
        assert!(v("abc").is_err());
    }

    #[test]
    fn optional_empty_values_skip_validation() {
        let v = validator("isInt(value)", false);
        assert!(v("").is_ok());
        assert!(v("abc").is_err());
    }

    #[test]
    fn combines_with_user_expressions() {
        let v = validator(r#"isInt(value) && value != "13""#, true);
        assert!(v("12").is_ok());
        assert!(v("13").is_err());
    }
}
