//! `JSON.stringify` / `JSON.parse` over `serde_json`

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::EvalError;
use crate::value::{ErrorTag, Value};

/// `JSON.stringify(value, _, indent)`. Returns `undefined` for values with
/// no JSON form (functions, `undefined`).
pub(super) fn stringify(value: &Value, indent: &Value) -> Result<Value, EvalError> {
    let Some(json) = to_json(value, &mut Vec::new())? else {
        return Ok(Value::Undefined);
    };

    let indent = match indent {
        Value::Number(n) if *n >= 1.0 => " ".repeat((*n as usize).min(10)),
        Value::String(s) => s.chars().take(10).collect(),
        _ => String::new(),
    };
    if indent.is_empty() {
        return serde_json::to_string(&json)
            .map(Value::from)
            .map_err(|e| EvalError::type_error(e.to_string()));
    }

    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    json.serialize(&mut serializer)
        .map_err(|e| EvalError::type_error(e.to_string()))?;
    Ok(Value::from(String::from_utf8_lossy(&out).into_owned()))
}

/// `JSON.parse(text)`. Malformed input throws a `SyntaxError` object.
pub(super) fn parse(text: &str) -> Result<Value, EvalError> {
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(json) => Ok(from_json(json)),
        Err(e) => Err(EvalError::Thrown(Value::error(
            ErrorTag::SyntaxError,
            format!("Unexpected token in JSON: {}", e),
        ))),
    }
}

fn to_json(value: &Value, stack: &mut Vec<usize>) -> Result<Option<serde_json::Value>, EvalError> {
    use serde_json::Value as Json;

    Ok(Some(match value {
        Value::Undefined | Value::Function(_) | Value::Class(_) | Value::Builtin(_) => {
            return Ok(None)
        }
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Number(n) => number_to_json(*n),
        Value::String(s) => Json::String(s.to_string()),
        Value::Array(items) => {
            enter(stack, items.id())?;
            let mut out = Vec::new();
            for item in items.read().iter() {
                out.push(to_json(item, stack)?.unwrap_or(Json::Null));
            }
            stack.pop();
            Json::Array(out)
        }
        Value::Object(obj) => {
            enter(stack, obj.id())?;
            let mut out = serde_json::Map::new();
            for (key, item) in obj.read().properties.iter() {
                if let Some(json) = to_json(item, stack)? {
                    out.insert(key.clone(), json);
                }
            }
            stack.pop();
            Json::Object(out)
        }
    }))
}

/// Containers `JSON.stringify` descends through before giving up.
const MAX_JSON_DEPTH: usize = 1000;

fn enter(stack: &mut Vec<usize>, id: usize) -> Result<(), EvalError> {
    if stack.len() >= MAX_JSON_DEPTH {
        return Err(EvalError::range_error("Maximum call stack size exceeded"));
    }
    if stack.contains(&id) {
        return Err(EvalError::type_error("Converting circular structure to JSON"));
    }
    stack.push(id);
    Ok(())
}

fn number_to_json(n: f64) -> serde_json::Value {
    if !n.is_finite() {
        return serde_json::Value::Null;
    }
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        return serde_json::Value::from(n as i64);
    }
    serde_json::Number::from_f64(n).map_or(serde_json::Value::Null, serde_json::Value::Number)
}

fn from_json(json: serde_json::Value) -> Value {
    use serde_json::Value as Json;

    match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(b),
        Json::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        Json::String(s) => Value::from(s),
        Json::Array(items) => Value::array(items.into_iter().map(from_json).collect()),
        Json::Object(map) => Value::object(
            map.into_iter()
                .map(|(k, v)| (k, from_json(v)))
                .collect::<IndexMap<_, _>>(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn obj(pairs: &[(&str, Value)]) -> Value {
        Value::object(pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect())
    }

    #[test]
    fn test_stringify_compact() {
        let value = obj(&[
            ("b", Value::Number(1.0)),
            ("a", Value::array(vec![Value::Bool(true), Value::Undefined])),
            ("skip", Value::Undefined),
        ]);
        let out = stringify(&value, &Value::Undefined).unwrap();
        assert_eq!(out.as_str(), Some(r#"{"b":1,"a":[true,null]}"#));
    }

    #[test]
    fn test_stringify_indent() {
        let value = obj(&[("a", Value::Number(1.5))]);
        let out = stringify(&value, &Value::Number(2.0)).unwrap();
        assert_eq!(out.as_str(), Some("{\n  \"a\": 1.5\n}"));
    }

    #[test]
    fn test_stringify_cycle_is_type_error() {
        let value = obj(&[]);
        if let Value::Object(o) = &value {
            o.write().properties.insert("me".into(), value.clone());
        }
        assert!(matches!(
            stringify(&value, &Value::Undefined),
            Err(EvalError::TypeError { .. })
        ));
    }

    #[test]
    fn test_stringify_deep_nesting_is_range_error() {
        let mut value = Value::Number(0.0);
        for _ in 0..5_000 {
            value = Value::array(vec![value]);
        }
        let err = stringify(&value, &Value::Undefined).unwrap_err();
        assert_eq!(err.kind(), crate::error::FailureKind::Range);
    }

    #[test]
    fn test_parse_keeps_key_order() {
        let value = parse(r#"{"z": 1, "a": [1, "x"]}"#).unwrap();
        assert_eq!(value.to_display_string(), "{ z: 1, a: [ 1, 'x' ] }");
    }

    #[test]
    fn test_parse_error_throws_syntax_error() {
        let Err(EvalError::Thrown(err)) = parse("{oops") else {
            panic!("expected throw");
        };
        assert!(err.to_js_string().starts_with("SyntaxError:"));
    }
}
