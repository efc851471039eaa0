//! JS conversions: truthiness, ToNumber, ToString, equality

use std::collections::HashSet;

use super::{ObjectData, Value};
use crate::stack::ensure_sufficient_stack;

/// Format a number the way JS `String(n)` does.
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    let abs = n.abs();
    if (1e-6..1e21).contains(&abs) {
        return format!("{}", n);
    }
    // `{:e}` renders `1e21`; JS wants `1e+21`
    let formatted = format!("{:e}", n);
    match formatted.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
        _ => formatted,
    }
}

/// JS `Number(string)`.
pub fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    let (sign, unsigned) = match trimmed.as_bytes()[0] {
        b'-' => (-1.0, &trimmed[1..]),
        b'+' => (1.0, &trimmed[1..]),
        _ => (1.0, trimmed),
    };
    if unsigned == "Infinity" {
        return sign * f64::INFINITY;
    }
    let radix = match unsigned.get(..2) {
        Some("0x") | Some("0X") => Some(16),
        Some("0o") | Some("0O") => Some(8),
        Some("0b") | Some("0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        // Prefixed literals take no sign
        if sign < 0.0 || trimmed.starts_with('+') {
            return f64::NAN;
        }
        return u64::from_str_radix(&unsigned[2..], radix)
            .map(|v| v as f64)
            .unwrap_or(f64::NAN);
    }
    let valid = unsigned
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'));
    if !valid || !unsigned.bytes().any(|b| b.is_ascii_digit()) {
        return f64::NAN;
    }
    unsigned.parse::<f64>().map(|v| sign * v).unwrap_or(f64::NAN)
}

impl Value {
    /// JS truthiness.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// JS ToNumber.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::String(s) => string_to_number(s),
            Value::Array(_) | Value::Object(_) => string_to_number(&self.to_js_string()),
            Value::Function(_) | Value::Class(_) | Value::Builtin(_) => f64::NAN,
        }
    }

    /// JS ToString, as used by `+` concatenation and `String(x)`.
    pub fn to_js_string(&self) -> String {
        self.to_js_string_guarded(&mut HashSet::new())
    }

    fn to_js_string_guarded(&self, seen: &mut HashSet<usize>) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => number_to_string(*n),
            Value::String(s) => s.to_string(),
            Value::Array(items) => {
                // Cyclic arrays join as empty, like JS
                if !seen.insert(items.id()) {
                    return String::new();
                }
                let parts: Vec<String> = items
                    .read()
                    .iter()
                    .map(|item| match item {
                        Value::Undefined | Value::Null => String::new(),
                        other => ensure_sufficient_stack(|| other.to_js_string_guarded(seen)),
                    })
                    .collect();
                seen.remove(&items.id());
                parts.join(",")
            }
            Value::Object(obj) => object_to_string(&obj.read()),
            Value::Function(f) => format!("function {}() {{ [code] }}", f.name.as_deref().unwrap_or("")),
            Value::Class(c) => format!("class {} {{ }}", c.name.as_deref().unwrap_or("")),
            Value::Builtin(b) => format!("function {}() {{ [native code] }}", b.name),
        }
    }

    /// Property key for computed member access.
    pub fn to_property_key(&self) -> String {
        self.to_js_string()
    }

    /// Array index, if this value is a non-negative integer.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Value::Number(n) if *n >= 0.0 && n.fract() == 0.0 && *n < 4_294_967_295.0 => {
                Some(*n as usize)
            }
            Value::String(s) => {
                let index: usize = s.parse().ok()?;
                (index.to_string() == **s).then_some(index)
            }
            _ => None,
        }
    }

    /// `===`
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a.ptr_eq(b),
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Function(a), Value::Function(b)) => std::sync::Arc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => std::sync::Arc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => std::sync::Arc::ptr_eq(&a.func, &b.func),
            _ => false,
        }
    }

    /// `==`
    pub fn loose_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (a, b) if a.is_nullish() || b.is_nullish() => a.is_nullish() && b.is_nullish(),
            (Value::Number(_), Value::String(_)) | (Value::String(_), Value::Number(_)) => {
                self.to_number() == other.to_number()
            }
            (Value::Bool(_), _) => Value::Number(self.to_number()).loose_equals(other),
            (_, Value::Bool(_)) => self.loose_equals(&Value::Number(other.to_number())),
            (Value::Array(_) | Value::Object(_), Value::Number(_) | Value::String(_)) => {
                Value::string(self.to_js_string()).loose_equals(other)
            }
            (Value::Number(_) | Value::String(_), Value::Array(_) | Value::Object(_)) => {
                self.loose_equals(&Value::string(other.to_js_string()))
            }
            _ => self.strict_equals(other),
        }
    }

    /// ToInt32 for bitwise operators.
    pub fn to_int32(&self) -> i32 {
        self.to_uint32() as i32
    }

    /// ToUint32 for `>>>`.
    pub fn to_uint32(&self) -> u32 {
        let n = self.to_number();
        if !n.is_finite() {
            return 0;
        }
        (n.trunc().rem_euclid(4_294_967_296.0)) as u32
    }
}

pub(super) fn object_to_string(obj: &ObjectData) -> String {
    if obj.error.is_some() {
        let name = obj
            .properties
            .get("name")
            .map(|v| v.to_js_string())
            .unwrap_or_else(|| "Error".to_string());
        let message = obj
            .properties
            .get("message")
            .map(|v| v.to_js_string())
            .unwrap_or_default();
        return if message.is_empty() {
            name
        } else {
            format!("{}: {}", name, message)
        };
    }
    "[object Object]".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_number_formatting() {
        assert_eq!(number_to_string(4.0), "4");
        assert_eq!(number_to_string(-0.0), "0");
        assert_eq!(number_to_string(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(number_to_string(1e21), "1e+21");
        assert_eq!(number_to_string(1.5e-7), "1.5e-7");
        assert_eq!(number_to_string(123456789012.0), "123456789012");
        assert_eq!(number_to_string(f64::NAN), "NaN");
        assert_eq!(number_to_string(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn test_string_to_number() {
        assert_eq!(string_to_number("  42 "), 42.0);
        assert_eq!(string_to_number(""), 0.0);
        assert_eq!(string_to_number("0x1F"), 31.0);
        assert_eq!(string_to_number("-Infinity"), f64::NEG_INFINITY);
        assert_eq!(string_to_number("1e3"), 1000.0);
        assert!(string_to_number("inf").is_nan());
        assert!(string_to_number("12px").is_nan());
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::string("").truthy());
        assert!(Value::string("0").truthy());
        assert!(!Value::Number(f64::NAN).truthy());
        assert!(Value::array(vec![]).truthy());
    }

    #[test]
    fn test_to_js_string() {
        let arr = Value::array(vec![Value::Number(1.0), Value::Null, Value::string("x")]);
        assert_eq!(arr.to_js_string(), "1,,x");
        assert_eq!(Value::object(Default::default()).to_js_string(), "[object Object]");
    }

    #[test]
    fn test_equality() {
        assert!(Value::Null.loose_equals(&Value::Undefined));
        assert!(!Value::Null.strict_equals(&Value::Undefined));
        assert!(Value::string("1").loose_equals(&Value::Number(1.0)));
        assert!(Value::Bool(true).loose_equals(&Value::Number(1.0)));
        assert!(!Value::Number(f64::NAN).strict_equals(&Value::Number(f64::NAN)));
        let a = Value::array(vec![]);
        assert!(a.strict_equals(&a.clone()));
        assert!(!a.strict_equals(&Value::array(vec![])));
    }

    #[test]
    fn test_int32() {
        assert_eq!(Value::Number(4294967295.0).to_int32(), -1);
        assert_eq!(Value::Number(-1.0).to_uint32(), 4294967295);
        assert_eq!(Value::Number(3.7).to_int32(), 3);
    }
}
