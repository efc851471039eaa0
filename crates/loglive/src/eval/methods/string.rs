//! `String.prototype` methods
//!
//! Positions are UTF-16 code unit offsets, as in JS.

use super::relative_index;
use crate::environment::prelude::arg;
use crate::error::EvalError;
use crate::eval::Interpreter;
use crate::value::limits::{check_string_length, concat_strings};
use crate::value::Value;

pub(super) const METHODS: &[&str] = &[
    "toUpperCase", "toLowerCase", "trim", "trimStart", "trimEnd", "split", "slice",
    "substring", "includes", "startsWith", "endsWith", "indexOf", "replace", "replaceAll",
    "repeat", "padStart", "padEnd", "charAt", "at", "concat",
];

pub(super) fn call(
    cx: &mut Interpreter<'_>,
    s: &str,
    key: &str,
    args: &[Value],
) -> Result<Value, EvalError> {
    let units: Vec<u16> = s.encode_utf16().collect();
    let len = units.len();

    Ok(match key {
        "toUpperCase" => Value::string(s.to_uppercase()),
        "toLowerCase" => Value::string(s.to_lowercase()),
        "trim" => Value::string(s.trim()),
        "trimStart" => Value::string(s.trim_start()),
        "trimEnd" => Value::string(s.trim_end()),
        "concat" => {
            let mut out = s.to_string();
            for value in args {
                out = concat_strings(&out, &value.to_js_string())?;
            }
            Value::string(out)
        }
        "repeat" => {
            let count = arg(args, 0).to_number();
            let count = if count.is_nan() { 0.0 } else { count.trunc() };
            if count < 0.0 || count.is_infinite() {
                return Err(EvalError::range_error(format!(
                    "Invalid count value: {}",
                    arg(args, 0).to_js_string()
                )));
            }
            if s.is_empty() {
                return Ok(Value::string(""));
            }
            check_string_length(count * s.len() as f64)?;
            Value::string(s.repeat(count as usize))
        }

        // ─── Positional ───────────────────────────────────────────────
        "slice" => {
            let start = relative_index(&arg(args, 0), len, 0);
            let end = relative_index(&arg(args, 1), len, len);
            Value::string(from_units(&units[start..end.max(start)]))
        }
        "substring" => {
            let clamp = |v: Value, default: usize| -> usize {
                if v.is_undefined() {
                    return default;
                }
                let n = v.to_number();
                if n.is_nan() {
                    0
                } else {
                    n.clamp(0.0, len as f64) as usize
                }
            };
            let a = clamp(arg(args, 0), 0);
            let b = clamp(arg(args, 1), len);
            Value::string(from_units(&units[a.min(b)..a.max(b)]))
        }
        "charAt" => {
            let n = arg(args, 0).to_number();
            let n = if n.is_nan() { 0.0 } else { n.trunc() };
            if n < 0.0 || n >= len as f64 {
                Value::string("")
            } else {
                Value::string(from_units(&units[n as usize..n as usize + 1]))
            }
        }
        "at" => {
            let n = arg(args, 0).to_number();
            let n = if n.is_nan() { 0.0 } else { n.trunc() };
            let index = if n < 0.0 { len as f64 + n } else { n };
            if index < 0.0 || index >= len as f64 {
                Value::Undefined
            } else {
                Value::string(from_units(&units[index as usize..index as usize + 1]))
            }
        }
        "padStart" | "padEnd" => {
            let target = arg(args, 0).to_number();
            let target = if target.is_nan() { 0 } else { target.max(0.0) as usize };
            let filler: Vec<u16> = match arg(args, 1) {
                Value::Undefined => vec![u16::from(b' ')],
                v => v.to_js_string().encode_utf16().collect(),
            };
            if target <= len || filler.is_empty() {
                Value::string(s)
            } else {
                check_string_length(s.len() as f64 + (target - len) as f64)?;
                let pad: Vec<u16> = filler.iter().copied().cycle().take(target - len).collect();
                let pad = from_units(&pad);
                if key == "padStart" {
                    Value::string(format!("{}{}", pad, s))
                } else {
                    Value::string(format!("{}{}", s, pad))
                }
            }
        }

        // ─── Search ───────────────────────────────────────────────────
        "indexOf" => {
            let needle: Vec<u16> = arg(args, 0).to_js_string().encode_utf16().collect();
            let from = relative_index(&arg(args, 1), len, 0).min(len);
            Value::Number(find_units(&units, &needle, from).map_or(-1.0, |i| i as f64))
        }
        "includes" => {
            let needle: Vec<u16> = arg(args, 0).to_js_string().encode_utf16().collect();
            let from = relative_index(&arg(args, 1), len, 0).min(len);
            Value::Bool(find_units(&units, &needle, from).is_some())
        }
        "startsWith" => {
            let needle: Vec<u16> = arg(args, 0).to_js_string().encode_utf16().collect();
            let from = relative_index(&arg(args, 1), len, 0).min(len);
            Value::Bool(units[from..].starts_with(&needle))
        }
        "endsWith" => {
            let needle: Vec<u16> = arg(args, 0).to_js_string().encode_utf16().collect();
            let end = relative_index(&arg(args, 1), len, len).min(len);
            Value::Bool(units[..end].ends_with(&needle))
        }
        "split" => split(s, &arg(args, 0), &arg(args, 1)),
        "replace" => replace(cx, s, args, false)?,
        "replaceAll" => replace(cx, s, args, true)?,
        _ => Value::Undefined,
    })
}

fn from_units(units: &[u16]) -> String {
    String::from_utf16_lossy(units)
}

fn find_units(haystack: &[u16], needle: &[u16], from: usize) -> Option<usize> {
    if needle.is_empty() {
        return Some(from);
    }
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| i + from)
}

fn split(s: &str, separator: &Value, limit: &Value) -> Value {
    let limit = match limit {
        Value::Undefined => usize::MAX,
        v => v.to_uint32() as usize,
    };
    let parts: Vec<Value> = match separator {
        Value::Undefined => vec![Value::string(s)],
        sep => {
            let sep = sep.to_js_string();
            if sep.is_empty() {
                s.chars().map(|c| Value::string(c.to_string())).collect()
            } else {
                s.split(sep.as_str()).map(Value::string).collect()
            }
        }
    };
    Value::array(parts.into_iter().take(limit).collect())
}

/// `replace`/`replaceAll` with a string pattern. The replacement may be a
/// string (with `$&` for the match) or a function of the match.
fn replace(
    cx: &mut Interpreter<'_>,
    s: &str,
    args: &[Value],
    all: bool,
) -> Result<Value, EvalError> {
    let pattern = arg(args, 0).to_js_string();
    let replacement = arg(args, 1);

    let mut out = String::new();
    let mut rest = s;
    let mut consumed = 0;
    loop {
        let Some(at) = rest.find(pattern.as_str()) else {
            break;
        };
        out.push_str(&rest[..at]);
        let offset = s[..consumed + at].encode_utf16().count();
        let with = if replacement.is_callable() {
            cx.call(
                &replacement,
                Value::Undefined,
                vec![
                    Value::string(&pattern),
                    Value::Number(offset as f64),
                    Value::string(s),
                ],
            )?
            .to_js_string()
        } else {
            replacement.to_js_string().replace("$&", &pattern)
        };
        check_string_length(out.len() as f64 + with.len() as f64 + rest.len() as f64)?;
        out.push_str(&with);

        // An empty pattern matches between every character
        let step = if pattern.is_empty() {
            match rest[at..].chars().next() {
                Some(c) => {
                    out.push(c);
                    c.len_utf8()
                }
                None => {
                    rest = "";
                    break;
                }
            }
        } else {
            pattern.len()
        };
        consumed += at + step;
        rest = &rest[at + step..];
        if !all {
            break;
        }
    }
    out.push_str(rest);
    Ok(Value::string(out))
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
    fn test_case_and_trim() {
        assert_eq!(show("'Hello'.toUpperCase()"), "HELLO");
        assert_eq!(show("'  x '.trim() + '|'"), "x|");
        assert_eq!(show("'  x '.trimStart() + '|'"), "x |");
        assert_eq!(show("'  x '.trimEnd() + '|'"), "  x|");
    }

    #[test]
    fn test_slicing() {
        assert_eq!(show("'hello'.slice(1, -1)"), "ell");
        assert_eq!(show("'hello'.substring(3, 1)"), "el");
        assert_eq!(show("'hello'.charAt(9)"), "");
        assert_eq!(show("'hello'.at(-1)"), "o");
    }

    #[test]
    fn test_search() {
        assert_eq!(show("'banana'.indexOf('na')"), "2");
        assert_eq!(show("'banana'.indexOf('na', 3)"), "4");
        assert_eq!(show("'banana'.includes('nan')"), "true");
        assert_eq!(show("'banana'.startsWith('ban')"), "true");
        assert_eq!(show("'banana'.endsWith('an', 5)"), "true");
    }

    #[test]
    fn test_split() {
        assert_eq!(show("'a,b,c'.split(',')"), "[ 'a', 'b', 'c' ]");
        assert_eq!(show("'abc'.split('')"), "[ 'a', 'b', 'c' ]");
        assert_eq!(show("'a,b,c'.split(',', 2)"), "[ 'a', 'b' ]");
        assert_eq!(show("'abc'.split()"), "[ 'abc' ]");
    }

    #[test]
    fn test_replace() {
        assert_eq!(show("'a-b-c'.replace('-', '+')"), "a+b-c");
        assert_eq!(show("'a-b-c'.replaceAll('-', '+')"), "a+b+c");
        assert_eq!(show("'cat'.replace('a', '[$&]')"), "c[a]t");
        assert_eq!(show("'x1x'.replaceAll('x', m => m.toUpperCase())"), "X1X");
        assert_eq!(show("'ab'.replaceAll('', '.')"), ".a.b.");
    }

    #[test]
    fn test_padding_and_repeat() {
        assert_eq!(show("'5'.padStart(3, '0')"), "005");
        assert_eq!(show("'ab'.padEnd(5, 'xy')"), "abxyx");
        assert_eq!(show("'ab'.repeat(3)"), "ababab");
        assert!(show("'ab'.repeat(-1)").starts_with("!RangeError"));
    }
}
