//! Whitelisted host built-ins
//!
//! Identifier lookup falls back here only after the local scope chain and
//! the Environment. Nothing outside [`GLOBALS`] is reachable from evaluated
//! code. Each global is built on first use and cached by the [`Prelude`], so
//! mutations made by one evaluation (`Math.x = 1`) never leak into another.

use std::collections::HashMap;

use indexmap::IndexMap;

use super::json;
use crate::error::EvalError;
use crate::value::limits::check_array_length;
use crate::value::{string_to_number, BuiltinFn, ErrorTag, Value};

/// Every name the prelude answers for.
pub const GLOBALS: &[&str] = &[
    "undefined",
    "NaN",
    "Infinity",
    "console",
    "Math",
    "JSON",
    "Object",
    "Array",
    "Number",
    "String",
    "Boolean",
    "parseInt",
    "parseFloat",
    "isNaN",
    "isFinite",
    "Error",
    "TypeError",
    "RangeError",
];

/// Whether `name` is a whitelisted global.
pub fn is_global(name: &str) -> bool {
    GLOBALS.contains(&name)
}

/// Lazily built, per-evaluation set of globals.
#[derive(Debug, Default)]
pub struct Prelude {
    cache: HashMap<&'static str, Value>,
}

impl Prelude {
    /// An empty prelude cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a global, building it on first access.
    pub fn get(&mut self, name: &str) -> Option<Value> {
        let key = *GLOBALS.iter().find(|g| **g == name)?;
        if let Some(value) = self.cache.get(key) {
            return Some(value.clone());
        }
        let value = build_global(key)?;
        self.cache.insert(key, value.clone());
        Some(value)
    }
}

fn build_global(name: &str) -> Option<Value> {
    let value = match name {
        "undefined" => Value::Undefined,
        "NaN" => Value::Number(f64::NAN),
        "Infinity" => Value::Number(f64::INFINITY),
        "console" => console_object(),
        "Math" => math_object(),
        "JSON" => json_object(),
        "Object" => object_constructor(),
        "Array" => array_constructor(),
        "Number" => number_constructor(),
        "String" => builtin("String", 1, |args| {
            Ok(Value::string(match args.first() {
                Some(v) => v.to_js_string(),
                None => String::new(),
            }))
        }),
        "Boolean" => builtin("Boolean", 1, |args| Ok(Value::Bool(arg(args, 0).truthy()))),
        "parseInt" => builtin("parseInt", 2, builtin_parse_int),
        "parseFloat" => builtin("parseFloat", 1, builtin_parse_float),
        "isNaN" => builtin("isNaN", 1, |args| Ok(Value::Bool(arg(args, 0).to_number().is_nan()))),
        "isFinite" => builtin("isFinite", 1, |args| {
            Ok(Value::Bool(arg(args, 0).to_number().is_finite()))
        }),
        "Error" => error_constructor(ErrorTag::Error),
        "TypeError" => error_constructor(ErrorTag::TypeError),
        "RangeError" => error_constructor(ErrorTag::RangeError),
        _ => return None,
    };
    Some(value)
}

// ═══════════════════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════════════════

fn builtin(
    name: &str,
    arity: i32,
    func: impl Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync + 'static,
) -> Value {
    Value::Builtin(BuiltinFn::new(name, arity, func))
}

/// Argument `i`, `undefined` when missing.
pub(crate) fn arg(args: &[Value], i: usize) -> Value {
    args.get(i).cloned().unwrap_or_default()
}

fn number_fn(name: &str, f: fn(f64) -> f64) -> Value {
    builtin(name, 1, move |args| Ok(Value::Number(f(arg(args, 0).to_number()))))
}

fn namespace(members: Vec<(&str, Value)>) -> Value {
    Value::object(
        members
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
    )
}

// ═══════════════════════════════════════════════════════════════════════
// console
// ═══════════════════════════════════════════════════════════════════════

fn console_object() -> Value {
    let members = ["log", "info", "warn", "error", "debug"]
        .into_iter()
        .map(|level| {
            let method = builtin(level, -1, move |args| {
                let line = args
                    .iter()
                    .map(Value::to_display_string)
                    .collect::<Vec<_>>()
                    .join(" ");
                tracing::debug!(target: "loglive::console", level, "{}", line);
                Ok(Value::Undefined)
            });
            (level, method)
        })
        .collect();
    namespace(members)
}

// ═══════════════════════════════════════════════════════════════════════
// Math
// ═══════════════════════════════════════════════════════════════════════

fn math_object() -> Value {
    use std::f64::consts;

    let mut members = vec![
        ("PI", Value::Number(consts::PI)),
        ("E", Value::Number(consts::E)),
        ("LN2", Value::Number(consts::LN_2)),
        ("LN10", Value::Number(consts::LN_10)),
        ("LOG2E", Value::Number(consts::LOG2_E)),
        ("LOG10E", Value::Number(consts::LOG10_E)),
        ("SQRT2", Value::Number(consts::SQRT_2)),
        ("SQRT1_2", Value::Number(consts::FRAC_1_SQRT_2)),
    ];

    let unary: [(&str, fn(f64) -> f64); 19] = [
        ("abs", f64::abs),
        ("floor", f64::floor),
        ("ceil", f64::ceil),
        ("round", js_round),
        ("trunc", f64::trunc),
        ("sign", js_sign),
        ("sqrt", f64::sqrt),
        ("cbrt", f64::cbrt),
        ("exp", f64::exp),
        ("log", f64::ln),
        ("log2", f64::log2),
        ("log10", f64::log10),
        ("sin", f64::sin),
        ("cos", f64::cos),
        ("tan", f64::tan),
        ("asin", f64::asin),
        ("acos", f64::acos),
        ("atan", f64::atan),
        ("fround", |n| n as f32 as f64),
    ];
    for (name, f) in unary {
        members.push((name, number_fn(name, f)));
    }

    members.push((
        "pow",
        builtin("pow", 2, |args| {
            Ok(Value::Number(js_pow(
                arg(args, 0).to_number(),
                arg(args, 1).to_number(),
            )))
        }),
    ));
    members.push((
        "atan2",
        builtin("atan2", 2, |args| {
            Ok(Value::Number(
                arg(args, 0).to_number().atan2(arg(args, 1).to_number()),
            ))
        }),
    ));
    members.push((
        "hypot",
        builtin("hypot", -1, |args| {
            Ok(Value::Number(
                args.iter()
                    .map(|a| a.to_number().powi(2))
                    .sum::<f64>()
                    .sqrt(),
            ))
        }),
    ));
    members.push(("max", builtin("max", -1, |args| Ok(Value::Number(extreme(args, true))))));
    members.push(("min", builtin("min", -1, |args| Ok(Value::Number(extreme(args, false))))));

    namespace(members)
}

/// `Math.round`: halves round toward positive infinity.
fn js_round(n: f64) -> f64 {
    if !n.is_finite() || n.fract() == 0.0 {
        return n;
    }
    (n + 0.5).floor()
}

fn js_sign(n: f64) -> f64 {
    if n.is_nan() || n == 0.0 {
        n
    } else {
        n.signum()
    }
}

/// `**` and `Math.pow`; `1 ** NaN` and `(±1) ** ±Infinity` are NaN in JS.
pub(crate) fn js_pow(base: f64, exp: f64) -> f64 {
    if exp.is_nan() || (base.abs() == 1.0 && exp.is_infinite()) {
        return f64::NAN;
    }
    base.powf(exp)
}

fn extreme(args: &[Value], max: bool) -> f64 {
    let mut result = if max { f64::NEG_INFINITY } else { f64::INFINITY };
    for value in args {
        let n = value.to_number();
        if n.is_nan() {
            return f64::NAN;
        }
        if (max && n > result) || (!max && n < result) {
            result = n;
        }
    }
    result
}

// ═══════════════════════════════════════════════════════════════════════
// JSON
// ═══════════════════════════════════════════════════════════════════════

fn json_object() -> Value {
    namespace(vec![
        (
            "stringify",
            builtin("stringify", 3, |args| {
                json::stringify(&arg(args, 0), &arg(args, 2))
            }),
        ),
        (
            "parse",
            builtin("parse", 1, |args| json::parse(&arg(args, 0).to_js_string())),
        ),
    ])
}

// ═══════════════════════════════════════════════════════════════════════
// Object / Array
// ═══════════════════════════════════════════════════════════════════════

fn object_constructor() -> Value {
    let mut statics = IndexMap::new();
    statics.insert(
        "keys".to_string(),
        builtin("keys", 1, |args| {
            Ok(Value::array(
                own_entries(&arg(args, 0))?
                    .into_iter()
                    .map(|(k, _)| Value::from(k))
                    .collect(),
            ))
        }),
    );
    statics.insert(
        "values".to_string(),
        builtin("values", 1, |args| {
            Ok(Value::array(
                own_entries(&arg(args, 0))?
                    .into_iter()
                    .map(|(_, v)| v)
                    .collect(),
            ))
        }),
    );
    statics.insert(
        "entries".to_string(),
        builtin("entries", 1, |args| {
            Ok(Value::array(
                own_entries(&arg(args, 0))?
                    .into_iter()
                    .map(|(k, v)| Value::array(vec![Value::from(k), v]))
                    .collect(),
            ))
        }),
    );
    statics.insert(
        "assign".to_string(),
        builtin("assign", -1, |args| {
            let target = arg(args, 0);
            let Value::Object(obj) = &target else {
                return Err(EvalError::type_error(
                    "Object.assign target must be an object",
                ));
            };
            for source in args.iter().skip(1) {
                if source.is_nullish() {
                    continue;
                }
                let entries = own_entries(source)?;
                let mut data = obj.write();
                for (k, v) in entries {
                    data.properties.insert(k, v);
                }
            }
            Ok(target)
        }),
    );
    // Values stay mutable; freezing is not modelled.
    statics.insert(
        "freeze".to_string(),
        builtin("freeze", 1, |args| Ok(arg(args, 0))),
    );
    statics.insert(
        "fromEntries".to_string(),
        builtin("fromEntries", 1, |args| {
            let Value::Array(pairs) = arg(args, 0) else {
                return Err(EvalError::type_error("Object.fromEntries expects an array"));
            };
            let mut properties = IndexMap::new();
            for pair in pairs.read().iter() {
                let Value::Array(pair) = pair else {
                    return Err(EvalError::type_error("Iterator value is not an entry object"));
                };
                let pair = pair.read();
                let key = pair.first().cloned().unwrap_or_default();
                let value = pair.get(1).cloned().unwrap_or_default();
                properties.insert(key.to_property_key(), value);
            }
            Ok(Value::object(properties))
        }),
    );

    Value::Builtin(
        BuiltinFn::new("Object", 1, |args| {
            Ok(match arg(args, 0) {
                v @ (Value::Object(_) | Value::Array(_)) => v,
                _ => Value::object(IndexMap::new()),
            })
        })
        .with_statics(statics),
    )
}

/// Own enumerable entries of an object, array, or string.
pub(crate) fn own_entries(value: &Value) -> Result<Vec<(String, Value)>, EvalError> {
    Ok(match value {
        Value::Object(obj) => obj
            .read()
            .properties
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
        Value::Array(items) => items
            .read()
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v.clone()))
            .collect(),
        Value::String(s) => s
            .chars()
            .enumerate()
            .map(|(i, c)| (i.to_string(), Value::string(c.to_string())))
            .collect(),
        Value::Undefined | Value::Null => {
            return Err(EvalError::type_error(
                "Cannot convert undefined or null to object",
            ))
        }
        _ => Vec::new(),
    })
}

fn array_constructor() -> Value {
    let mut statics = IndexMap::new();
    statics.insert(
        "isArray".to_string(),
        builtin("isArray", 1, |args| {
            Ok(Value::Bool(matches!(arg(args, 0), Value::Array(_))))
        }),
    );
    statics.insert(
        "of".to_string(),
        builtin("of", -1, |args| Ok(Value::array(args.to_vec()))),
    );
    statics.insert(
        "from".to_string(),
        builtin("from", 1, |args| {
            let source = arg(args, 0);
            if let Value::Object(obj) = &source {
                // Array-likes: `{ length: n }`
                let len = obj
                    .read()
                    .properties
                    .get("length")
                    .map(Value::to_number)
                    .unwrap_or(0.0);
                let len = if len.is_finite() && len > 0.0 { len.trunc() } else { 0.0 };
                let len = check_array_length(len)?;
                let data = obj.read();
                return Ok(Value::array(
                    (0..len)
                        .map(|i| data.properties.get(&i.to_string()).cloned().unwrap_or_default())
                        .collect(),
                ));
            }
            Ok(Value::array(match source {
                Value::Array(items) => items.read().clone(),
                Value::String(s) => s.chars().map(|c| Value::string(c.to_string())).collect(),
                _ => Vec::new(),
            }))
        }),
    );

    Value::Builtin(
        BuiltinFn::new("Array", -1, |args| match args {
            [Value::Number(n)] => {
                let len = check_array_length(*n)?;
                Ok(Value::array(vec![Value::Undefined; len]))
            }
            _ => Ok(Value::array(args.to_vec())),
        })
        .with_statics(statics),
    )
}

// ═══════════════════════════════════════════════════════════════════════
// Number
// ═══════════════════════════════════════════════════════════════════════

fn number_constructor() -> Value {
    let mut statics = IndexMap::new();
    let constants = [
        ("MAX_SAFE_INTEGER", 9_007_199_254_740_991.0),
        ("MIN_SAFE_INTEGER", -9_007_199_254_740_991.0),
        ("EPSILON", f64::EPSILON),
        ("MAX_VALUE", f64::MAX),
        ("MIN_VALUE", 5e-324),
        ("POSITIVE_INFINITY", f64::INFINITY),
        ("NEGATIVE_INFINITY", f64::NEG_INFINITY),
        ("NaN", f64::NAN),
    ];
    for (name, n) in constants {
        statics.insert(name.to_string(), Value::Number(n));
    }
    statics.insert(
        "isInteger".to_string(),
        builtin("isInteger", 1, |args| {
            Ok(Value::Bool(matches!(
                arg(args, 0),
                Value::Number(n) if n.is_finite() && n.fract() == 0.0
            )))
        }),
    );
    statics.insert(
        "isFinite".to_string(),
        builtin("isFinite", 1, |args| {
            Ok(Value::Bool(matches!(arg(args, 0), Value::Number(n) if n.is_finite())))
        }),
    );
    statics.insert(
        "isNaN".to_string(),
        builtin("isNaN", 1, |args| {
            Ok(Value::Bool(matches!(arg(args, 0), Value::Number(n) if n.is_nan())))
        }),
    );
    statics.insert("parseFloat".to_string(), builtin("parseFloat", 1, builtin_parse_float));
    statics.insert("parseInt".to_string(), builtin("parseInt", 2, builtin_parse_int));

    Value::Builtin(
        BuiltinFn::new("Number", 1, |args| {
            Ok(Value::Number(match args.first() {
                Some(v) => v.to_number(),
                None => 0.0,
            }))
        })
        .with_statics(statics),
    )
}

// ═══════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════

fn error_constructor(tag: ErrorTag) -> Value {
    builtin(tag.name(), 1, move |args| {
        let message = match arg(args, 0) {
            Value::Undefined => String::new(),
            other => other.to_js_string(),
        };
        Ok(Value::error(tag, message))
    })
}

// ═══════════════════════════════════════════════════════════════════════
// Built-in Function Implementations
// ═══════════════════════════════════════════════════════════════════════

fn builtin_parse_int(args: &[Value]) -> Result<Value, EvalError> {
    let text = arg(args, 0).to_js_string();
    let mut rest = text.trim_start();
    let mut sign = 1.0;
    if let Some(stripped) = rest.strip_prefix('-') {
        sign = -1.0;
        rest = stripped;
    } else if let Some(stripped) = rest.strip_prefix('+') {
        rest = stripped;
    }

    let mut radix = match arg(args, 1) {
        Value::Undefined => 0,
        other => other.to_int32(),
    };
    if radix != 0 && !(2..=36).contains(&radix) {
        return Ok(Value::Number(f64::NAN));
    }
    if radix == 0 || radix == 16 {
        if let Some(hex) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
            rest = hex;
            radix = 16;
        }
    }
    if radix == 0 {
        radix = 10;
    }

    let mut result: Option<f64> = None;
    for c in rest.chars() {
        let Some(digit) = c.to_digit(radix as u32) else {
            break;
        };
        result = Some(result.unwrap_or(0.0) * radix as f64 + digit as f64);
    }
    Ok(Value::Number(result.map_or(f64::NAN, |n| sign * n)))
}

fn builtin_parse_float(args: &[Value]) -> Result<Value, EvalError> {
    let text = arg(args, 0).to_js_string();
    let trimmed = text.trim_start();
    for prefix in ["Infinity", "+Infinity", "-Infinity"] {
        if trimmed.starts_with(prefix) {
            return Ok(Value::Number(string_to_number(prefix)));
        }
    }

    // Longest prefix shaped like a decimal literal
    let bytes = trimmed.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let digits_start = end;
    let mut seen_dot = false;
    while end < bytes.len() && (bytes[end].is_ascii_digit() || (bytes[end] == b'.' && !seen_dot)) {
        seen_dot |= bytes[end] == b'.';
        end += 1;
    }
    if !trimmed[digits_start..end].bytes().any(|b| b.is_ascii_digit()) {
        return Ok(Value::Number(f64::NAN));
    }
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }
    Ok(Value::Number(trimmed[..end].parse().unwrap_or(f64::NAN)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn call(value: &Value, args: &[Value]) -> Value {
        match value {
            Value::Builtin(b) => b.call(args).unwrap(),
            other => panic!("not callable: {:?}", other),
        }
    }

    fn member(value: &Value, key: &str) -> Value {
        match value {
            Value::Object(obj) => obj.read().properties.get(key).cloned().unwrap(),
            Value::Builtin(b) => b.statics.get(key).cloned().unwrap(),
            other => panic!("no members: {:?}", other),
        }
    }

    #[test]
    fn test_only_whitelisted_names_resolve() {
        let mut prelude = Prelude::new();
        assert!(prelude.get("Math").is_some());
        assert!(prelude.get("process").is_none());
        assert!(prelude.get("require").is_none());
        assert!(prelude.get("globalThis").is_none());
        assert!(is_global("parseInt"));
    }

    #[test]
    fn test_globals_are_cached_per_prelude() {
        let mut prelude = Prelude::new();
        let a = prelude.get("Math").unwrap();
        let b = prelude.get("Math").unwrap();
        assert!(a.strict_equals(&b));
        let c = Prelude::new().get("Math").unwrap();
        assert!(!a.strict_equals(&c));
    }

    #[test]
    fn test_math_functions() {
        let math = Prelude::new().get("Math").unwrap();
        assert_eq!(call(&member(&math, "max"), &[1.0.into(), 5.0.into(), 3.0.into()]), Value::Number(5.0));
        assert_eq!(call(&member(&math, "max"), &[]), Value::Number(f64::NEG_INFINITY));
        assert_eq!(call(&member(&math, "round"), &[(-2.5).into()]), Value::Number(-2.0));
        assert_eq!(call(&member(&math, "round"), &[2.5.into()]), Value::Number(3.0));
    }

    #[test]
    fn test_math_has_no_random() {
        let math = Prelude::new().get("Math").unwrap();
        let Value::Object(obj) = math else { panic!() };
        assert!(!obj.read().properties.contains_key("random"));
    }

    #[test]
    fn test_parse_int() {
        let f = |args: &[Value]| builtin_parse_int(args).unwrap().to_number();
        assert_eq!(f(&["42px".into()]), 42.0);
        assert_eq!(f(&["  -17".into()]), -17.0);
        assert_eq!(f(&["0x1F".into()]), 31.0);
        assert_eq!(f(&["101".into(), 2.0.into()]), 5.0);
        assert!(f(&["abc".into()]).is_nan());
    }

    #[test]
    fn test_parse_float() {
        let f = |s: &str| builtin_parse_float(&[s.into()]).unwrap().to_number();
        assert_eq!(f("3.14abc"), 3.14);
        assert_eq!(f("1e3"), 1000.0);
        assert_eq!(f("1e"), 1.0);
        assert_eq!(f("-Infinity"), f64::NEG_INFINITY);
        assert!(f(".").is_nan());
    }

    #[test]
    fn test_object_statics() {
        let object = Prelude::new().get("Object").unwrap();
        let mut props = IndexMap::new();
        props.insert("a".to_string(), Value::Number(1.0));
        props.insert("b".to_string(), Value::Number(2.0));
        let obj = Value::object(props);
        assert_eq!(
            call(&member(&object, "keys"), &[obj.clone()]).to_display_string(),
            "[ 'a', 'b' ]"
        );
        assert_eq!(
            call(&member(&object, "entries"), &[obj]).to_display_string(),
            "[ [ 'a', 1 ], [ 'b', 2 ] ]"
        );
    }

    #[test]
    fn test_error_constructor_sets_tag() {
        let ctor = Prelude::new().get("TypeError").unwrap();
        let err = call(&ctor, &["bad".into()]);
        assert_eq!(err.to_js_string(), "TypeError: bad");
    }

    #[test]
    fn test_console_returns_undefined() {
        let console = Prelude::new().get("console").unwrap();
        assert!(call(&member(&console, "log"), &[1.0.into()]).is_undefined());
    }
}
