//! Built-in methods of primitive and container values
//!
//! A call like `xs.map(f)` first looks for a property the receiver itself
//! carries; when there is none it lands here. Each receiver type has a
//! fixed method table, and [`has_method`] answers from the same tables so
//! `typeof xs.map` agrees with what [`call_method`] accepts.

mod array;
mod string;

use super::Interpreter;
use crate::environment::prelude::arg;
use crate::error::EvalError;
use crate::value::{number_to_string, Value};

const NUMBER_METHODS: &[&str] = &["toFixed", "toString"];
const FUNCTION_METHODS: &[&str] = &["call", "apply", "toString"];
const OBJECT_METHODS: &[&str] = &["hasOwnProperty", "toString"];

/// Whether `target` has a built-in method called `key`.
pub(super) fn has_method(target: &Value, key: &str) -> bool {
    match target {
        Value::Undefined | Value::Null => false,
        Value::Array(_) => array::METHODS.contains(&key) || OBJECT_METHODS.contains(&key),
        Value::String(_) => string::METHODS.contains(&key) || key == "toString",
        Value::Number(_) => NUMBER_METHODS.contains(&key),
        Value::Bool(_) => key == "toString",
        Value::Object(_) => OBJECT_METHODS.contains(&key),
        Value::Function(_) | Value::Builtin(_) => FUNCTION_METHODS.contains(&key),
        Value::Class(_) => key == "toString",
    }
}

/// Call built-in method `key` on `receiver`. `Ok(None)` when the receiver
/// has no such method.
pub(super) fn call_method(
    cx: &mut Interpreter<'_>,
    receiver: &Value,
    key: &str,
    args: Vec<Value>,
) -> Result<Option<Value>, EvalError> {
    if !has_method(receiver, key) {
        return Ok(None);
    }
    let value = match (receiver, key) {
        (Value::Array(items), _) if array::METHODS.contains(&key) => {
            array::call(cx, receiver, items, key, &args)?
        }
        (Value::String(s), _) if string::METHODS.contains(&key) => {
            string::call(cx, s, key, &args)?
        }
        (Value::Number(n), "toFixed") => Value::string(to_fixed(*n, &arg(&args, 0))?),
        (Value::Number(n), "toString") => Value::string(to_radix_string(*n, &arg(&args, 0))?),
        (Value::Function(_) | Value::Builtin(_), "call") => {
            let mut args = args.into_iter();
            let this = args.next().unwrap_or_default();
            cx.call(receiver, this, args.collect())?
        }
        (Value::Function(_) | Value::Builtin(_), "apply") => {
            let this = arg(&args, 0);
            let list = match arg(&args, 1) {
                Value::Undefined | Value::Null => Vec::new(),
                list => cx.collect_iterable(&list)?,
            };
            cx.call(receiver, this, list)?
        }
        (_, "hasOwnProperty") => Value::Bool(has_own_property(receiver, &arg(&args, 0))),
        (_, "toString") => Value::string(receiver.to_js_string()),
        _ => return Ok(None),
    };
    Ok(Some(value))
}

/// `s[index]`, indexing by UTF-16 code unit.
pub(super) fn string_char_at(s: &str, index: usize) -> Value {
    match s.encode_utf16().nth(index) {
        Some(unit) => Value::string(String::from_utf16_lossy(&[unit])),
        None => Value::Undefined,
    }
}

fn has_own_property(receiver: &Value, key: &Value) -> bool {
    let key = key.to_property_key();
    match receiver {
        Value::Object(obj) => obj.read().properties.contains_key(&key),
        Value::Array(items) => {
            key == "length"
                || Value::from(key.as_str())
                    .as_index()
                    .is_some_and(|i| i < items.read().len())
        }
        _ => false,
    }
}

/// Resolve a relative index argument (`-1` is the last element) against
/// `len`, clamped to `0..=len`.
pub(super) fn relative_index(value: &Value, len: usize, default: usize) -> usize {
    if value.is_undefined() {
        return default;
    }
    let n = value.to_number();
    let n = if n.is_nan() { 0.0 } else { n.trunc() };
    if n < 0.0 {
        (len as f64 + n).max(0.0) as usize
    } else {
        n.min(len as f64) as usize
    }
}

/// `Number.prototype.toFixed`. Ties round away from zero.
fn to_fixed(n: f64, digits: &Value) -> Result<String, EvalError> {
    let digits = if digits.is_undefined() {
        0.0
    } else {
        digits.to_number().trunc()
    };
    if !(0.0..=100.0).contains(&digits) {
        return Err(EvalError::range_error(
            "toFixed() digits argument must be between 0 and 100",
        ));
    }
    let digits = digits as usize;
    if !n.is_finite() || n.abs() >= 1e21 {
        return Ok(number_to_string(n));
    }
    let scale = 10f64.powi(digits as i32);
    let scaled = n.abs() * scale;
    let magnitude = if scaled.fract() == 0.5 {
        (scaled.floor() + 1.0) / scale
    } else {
        n.abs()
    };
    let body = format!("{:.*}", digits, magnitude);
    Ok(if n < 0.0 { format!("-{}", body) } else { body })
}

/// `Number.prototype.toString(radix)`.
fn to_radix_string(n: f64, radix: &Value) -> Result<String, EvalError> {
    let radix = if radix.is_undefined() {
        10.0
    } else {
        radix.to_number().trunc()
    };
    if !(2.0..=36.0).contains(&radix) {
        return Err(EvalError::range_error(
            "toString() radix must be between 2 and 36",
        ));
    }
    let radix = radix as u32;
    if radix == 10 || !n.is_finite() {
        return Ok(number_to_string(n));
    }

    let mut int = n.abs().trunc();
    let mut frac = n.abs().fract();
    let mut digits = Vec::new();
    loop {
        let d = (int % f64::from(radix)) as u32;
        digits.push(std::char::from_digit(d, radix).unwrap_or('0'));
        int = (int / f64::from(radix)).trunc();
        if int == 0.0 {
            break;
        }
    }
    let mut out: String = digits.into_iter().rev().collect();
    if frac > 0.0 {
        out.push('.');
        for _ in 0..52 {
            frac *= f64::from(radix);
            let d = frac.trunc() as u32;
            out.push(std::char::from_digit(d, radix).unwrap_or('0'));
            frac = frac.fract();
            if frac == 0.0 {
                break;
            }
        }
    }
    if n < 0.0 {
        out.insert(0, '-');
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use crate::eval::evaluate;
    use crate::{EvalContext, Environment, EvaluationOutcome};
    use pretty_assertions::assert_eq;

    fn show(src: &str) -> String {
        match evaluate(src, &Environment::new(), &EvalContext::new()) {
            EvaluationOutcome::Value(v) => v.to_display_string(),
            EvaluationOutcome::Failure(f) => format!("!{}", f.message),
        }
    }

    #[test]
    fn test_to_fixed() {
        assert_eq!(show("(3.14159).toFixed(2)"), "3.14");
        assert_eq!(show("(2.5).toFixed(0)"), "3");
        assert_eq!(show("(-1.5).toFixed(0)"), "-2");
        assert_eq!(show("(1).toFixed(3)"), "1.000");
        assert_eq!(show("(-0.0001).toFixed(2)"), "-0.00");
        assert!(show("(1).toFixed(101)").starts_with("!RangeError"));
    }

    #[test]
    fn test_number_to_string_radix() {
        assert_eq!(show("(255).toString(16)"), "ff");
        assert_eq!(show("(5).toString(2)"), "101");
        assert_eq!(show("(-8).toString(8)"), "-10");
        assert_eq!(show("(0.5).toString(2)"), "0.1");
        assert_eq!(show("(12).toString()"), "12");
    }

    #[test]
    fn test_call_and_apply() {
        assert_eq!(show("(function (a) { return this.v + a }).call({ v: 1 }, 2)"), "3");
        assert_eq!(show("Math.max.apply(null, [1, 5, 2])"), "5");
    }

    #[test]
    fn test_to_string_on_every_value() {
        assert_eq!(show("[1, [2, 3]].toString()"), "1,2,3");
        assert_eq!(show("({}).toString()"), "[object Object]");
        assert_eq!(show("true.toString()"), "true");
        assert_eq!(show("new Error('bad').toString()"), "Error: bad");
    }

    #[test]
    fn test_has_own_property() {
        assert_eq!(show("({ a: 1 }).hasOwnProperty('a')"), "true");
        assert_eq!(show("({ a: 1 }).hasOwnProperty('b')"), "false");
        assert_eq!(show("[1].hasOwnProperty(0)"), "true");
    }
}
