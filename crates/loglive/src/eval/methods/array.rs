//! `Array.prototype` methods

use std::cmp::Ordering;

use super::relative_index;
use crate::environment::prelude::arg;
use crate::error::EvalError;
use crate::eval::Interpreter;
use crate::value::limits::{check_array_length, check_string_length};
use crate::value::{Shared, Value};

pub(super) const METHODS: &[&str] = &[
    "push", "pop", "shift", "unshift", "slice", "splice", "concat", "join", "indexOf",
    "includes", "map", "filter", "reduce", "forEach", "find", "findIndex", "some", "every",
    "reverse", "sort", "at", "flat", "fill",
];

pub(super) fn call(
    cx: &mut Interpreter<'_>,
    receiver: &Value,
    items: &Shared<Vec<Value>>,
    key: &str,
    args: &[Value],
) -> Result<Value, EvalError> {
    // Callbacks may mutate the array, so they iterate a snapshot and no
    // lock is held while user code runs.
    let snapshot = || items.read().clone();

    Ok(match key {
        // ─── Mutators ─────────────────────────────────────────────────
        "push" => {
            let mut items = items.write();
            check_array_length(items.len() as f64 + args.len() as f64)?;
            items.extend(args.iter().cloned());
            Value::Number(items.len() as f64)
        }
        "pop" => items.write().pop().unwrap_or_default(),
        "shift" => {
            let mut items = items.write();
            if items.is_empty() {
                Value::Undefined
            } else {
                items.remove(0)
            }
        }
        "unshift" => {
            let mut items = items.write();
            check_array_length(items.len() as f64 + args.len() as f64)?;
            items.splice(0..0, args.iter().cloned());
            Value::Number(items.len() as f64)
        }
        "splice" => {
            let mut items = items.write();
            let len = items.len();
            let start = relative_index(&arg(args, 0), len, 0);
            let delete = match args.len() {
                0 => 0,
                1 => len - start,
                _ => {
                    let n = arg(args, 1).to_number();
                    let n = if n.is_nan() { 0.0 } else { n.trunc() };
                    n.clamp(0.0, (len - start) as f64) as usize
                }
            };
            let inserted = args.iter().skip(2).cloned();
            Value::array(items.splice(start..start + delete, inserted).collect())
        }
        "reverse" => {
            items.write().reverse();
            receiver.clone()
        }
        "fill" => {
            let mut items = items.write();
            let len = items.len();
            let start = relative_index(&arg(args, 1), len, 0);
            let end = relative_index(&arg(args, 2), len, len);
            let value = arg(args, 0);
            for slot in items.iter_mut().take(end).skip(start) {
                *slot = value.clone();
            }
            receiver.clone()
        }
        "sort" => {
            let comparator = arg(args, 0);
            if !comparator.is_undefined() && !comparator.is_callable() {
                return Err(EvalError::type_error(
                    "The comparison function must be either a function or undefined",
                ));
            }
            let sorted = sort(cx, snapshot(), &comparator)?;
            *items.write() = sorted;
            receiver.clone()
        }

        // ─── Accessors ────────────────────────────────────────────────
        "slice" => {
            let items = items.read();
            let len = items.len();
            let start = relative_index(&arg(args, 0), len, 0);
            let end = relative_index(&arg(args, 1), len, len);
            Value::array(items.get(start..end.max(start)).unwrap_or_default().to_vec())
        }
        "concat" => {
            let mut out = snapshot();
            for value in args {
                match value {
                    Value::Array(other) => out.extend(other.read().iter().cloned()),
                    other => out.push(other.clone()),
                }
                check_array_length(out.len() as f64)?;
            }
            Value::array(out)
        }
        "join" => {
            let separator = match arg(args, 0) {
                Value::Undefined => ",".to_string(),
                sep => sep.to_js_string(),
            };
            let parts: Vec<String> = snapshot()
                .iter()
                .map(|v| match v {
                    Value::Undefined | Value::Null => String::new(),
                    other => other.to_js_string(),
                })
                .collect();
            let total = parts.iter().map(|p| p.len() as f64).sum::<f64>()
                + separator.len() as f64 * parts.len().saturating_sub(1) as f64;
            check_string_length(total)?;
            Value::string(parts.join(&separator))
        }
        "indexOf" => {
            let items = items.read();
            let target = arg(args, 0);
            let from = relative_index(&arg(args, 1), items.len(), 0);
            let found = items
                .iter()
                .enumerate()
                .skip(from)
                .find(|(_, v)| v.strict_equals(&target));
            Value::Number(found.map_or(-1.0, |(i, _)| i as f64))
        }
        "includes" => {
            let target = arg(args, 0);
            Value::Bool(items.read().iter().any(|v| same_value_zero(v, &target)))
        }
        "at" => {
            let items = items.read();
            let n = arg(args, 0).to_number();
            let n = if n.is_nan() { 0.0 } else { n.trunc() };
            let index = if n < 0.0 { items.len() as f64 + n } else { n };
            if index < 0.0 {
                Value::Undefined
            } else {
                items.get(index as usize).cloned().unwrap_or_default()
            }
        }
        "flat" => {
            let depth = match arg(args, 0) {
                Value::Undefined => 1.0,
                d => d.to_number(),
            };
            let mut out = Vec::new();
            flatten(&snapshot(), depth, &mut out)?;
            Value::array(out)
        }

        // ─── Iteration ────────────────────────────────────────────────
        "forEach" => {
            let f = callback(args)?;
            for (i, item) in snapshot().into_iter().enumerate() {
                invoke(cx, &f, args, receiver, item, i)?;
            }
            Value::Undefined
        }
        "map" => {
            let f = callback(args)?;
            let mut out = Vec::new();
            for (i, item) in snapshot().into_iter().enumerate() {
                out.push(invoke(cx, &f, args, receiver, item, i)?);
            }
            Value::array(out)
        }
        "filter" => {
            let f = callback(args)?;
            let mut out = Vec::new();
            for (i, item) in snapshot().into_iter().enumerate() {
                if invoke(cx, &f, args, receiver, item.clone(), i)?.truthy() {
                    out.push(item);
                }
            }
            Value::array(out)
        }
        "find" | "findIndex" => {
            let f = callback(args)?;
            let mut found = None;
            for (i, item) in snapshot().into_iter().enumerate() {
                if invoke(cx, &f, args, receiver, item.clone(), i)?.truthy() {
                    found = Some((i, item));
                    break;
                }
            }
            match (key, found) {
                ("find", found) => found.map(|(_, v)| v).unwrap_or_default(),
                (_, Some((i, _))) => Value::Number(i as f64),
                (_, None) => Value::Number(-1.0),
            }
        }
        "some" => {
            let f = callback(args)?;
            let mut any = false;
            for (i, item) in snapshot().into_iter().enumerate() {
                if invoke(cx, &f, args, receiver, item, i)?.truthy() {
                    any = true;
                    break;
                }
            }
            Value::Bool(any)
        }
        "every" => {
            let f = callback(args)?;
            let mut all = true;
            for (i, item) in snapshot().into_iter().enumerate() {
                if !invoke(cx, &f, args, receiver, item, i)?.truthy() {
                    all = false;
                    break;
                }
            }
            Value::Bool(all)
        }
        "reduce" => {
            let f = callback(args)?;
            let mut items = snapshot().into_iter().enumerate();
            let mut acc = match args.get(1) {
                Some(init) => init.clone(),
                None => match items.next() {
                    Some((_, first)) => first,
                    None => {
                        return Err(EvalError::type_error(
                            "Reduce of empty array with no initial value",
                        ))
                    }
                },
            };
            for (i, item) in items {
                acc = cx.call(
                    &f,
                    Value::Undefined,
                    vec![acc, item, Value::Number(i as f64), receiver.clone()],
                )?;
            }
            acc
        }
        _ => Value::Undefined,
    })
}

/// The callback argument, which must be callable.
fn callback(args: &[Value]) -> Result<Value, EvalError> {
    let f = arg(args, 0);
    if f.is_callable() {
        Ok(f)
    } else {
        Err(EvalError::type_error(format!(
            "{} is not a function",
            f.to_display_string()
        )))
    }
}

/// `f.call(thisArg, item, index, array)`
fn invoke(
    cx: &mut Interpreter<'_>,
    f: &Value,
    args: &[Value],
    receiver: &Value,
    item: Value,
    index: usize,
) -> Result<Value, EvalError> {
    cx.call(
        f,
        arg(args, 1),
        vec![item, Value::Number(index as f64), receiver.clone()],
    )
}

fn same_value_zero(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) if x.is_nan() && y.is_nan() => true,
        _ => a.strict_equals(b),
    }
}

/// Flatten without recursion. Every visited element counts toward the
/// array length cap, so cyclic arrays flattened to `Infinity` stop too.
fn flatten(items: &[Value], depth: f64, out: &mut Vec<Value>) -> Result<(), EvalError> {
    let mut work: Vec<(Value, f64)> = items.iter().rev().map(|v| (v.clone(), depth)).collect();
    let mut visited = 0usize;
    while let Some((item, depth)) = work.pop() {
        visited += 1;
        check_array_length(visited as f64)?;
        match item {
            Value::Array(inner) if depth >= 1.0 => {
                work.extend(inner.read().iter().rev().map(|v| (v.clone(), depth - 1.0)));
            }
            other => out.push(other),
        }
    }
    Ok(())
}

/// Stable merge sort with a fallible comparator. `undefined` sorts last
/// without consulting the comparator.
fn sort(
    cx: &mut Interpreter<'_>,
    items: Vec<Value>,
    comparator: &Value,
) -> Result<Vec<Value>, EvalError> {
    let (mut defined, undefined): (Vec<Value>, Vec<Value>) =
        items.into_iter().partition(|v| !v.is_undefined());
    defined = merge_sort(cx, defined, comparator)?;
    defined.extend(undefined);
    Ok(defined)
}

fn merge_sort(
    cx: &mut Interpreter<'_>,
    mut items: Vec<Value>,
    comparator: &Value,
) -> Result<Vec<Value>, EvalError> {
    if items.len() <= 1 {
        return Ok(items);
    }
    let right = items.split_off(items.len() / 2);
    let left = merge_sort(cx, items, comparator)?;
    let right = merge_sort(cx, right, comparator)?;

    let mut out = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    while let (Some(l), Some(r)) = (left.peek(), right.peek()) {
        if compare(cx, l, r, comparator)? == Ordering::Greater {
            out.extend(right.next());
        } else {
            out.extend(left.next());
        }
    }
    out.extend(left);
    out.extend(right);
    Ok(out)
}

fn compare(
    cx: &mut Interpreter<'_>,
    a: &Value,
    b: &Value,
    comparator: &Value,
) -> Result<Ordering, EvalError> {
    if comparator.is_undefined() {
        // Default order compares string forms by UTF-16 code units
        let (a, b) = (a.to_js_string(), b.to_js_string());
        return Ok(a.encode_utf16().cmp(b.encode_utf16()));
    }
    let n = cx
        .call(comparator, Value::Undefined, vec![a.clone(), b.clone()])?
        .to_number();
    Ok(if n > 0.0 {
        Ordering::Greater
    } else if n < 0.0 {
        Ordering::Less
    } else {
        Ordering::Equal
    })
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

    fn run(body: &str) -> String {
        show(&format!("(() => {{ {} }})()", body))
    }

    // ═══════════════════════════════════════════════════════════════════
    // Mutators
    // ═══════════════════════════════════════════════════════════════════

    #[test]
    fn test_push_pop_shift_unshift() {
        assert_eq!(
            run("const a = [2]; const n = a.push(3, 4); a.unshift(1); const p = a.pop(); const s = a.shift(); return [n, p, s, a];"),
            "[ 3, 4, 1, [ 2, 3 ] ]"
        );
        assert_eq!(show("[].pop()"), "undefined");
    }

    #[test]
    fn test_splice() {
        assert_eq!(
            run("const a = [1, 2, 3, 4, 5]; const removed = a.splice(1, 2, 'x'); return [removed, a];"),
            "[ [ 2, 3 ], [ 1, 'x', 4, 5 ] ]"
        );
        assert_eq!(run("const a = [1, 2, 3]; a.splice(-1); return a;"), "[ 1, 2 ]");
    }

    #[test]
    fn test_sort() {
        assert_eq!(show("[10, 9, 1, 2].sort()"), "[ 1, 10, 2, 9 ]");
        assert_eq!(show("[10, 9, 1, 2].sort((a, b) => a - b)"), "[ 1, 2, 9, 10 ]");
        assert_eq!(show("[3, undefined, 1].sort()"), "[ 1, 3, undefined ]");
        assert_eq!(
            show("[{ k: 1, v: 'a' }, { k: 0, v: 'b' }, { k: 1, v: 'c' }].sort((x, y) => x.k - y.k).map(o => o.v)"),
            "[ 'b', 'a', 'c' ]"
        );
    }

    #[test]
    fn test_reverse_and_fill() {
        assert_eq!(show("[1, 2, 3].reverse()"), "[ 3, 2, 1 ]");
        assert_eq!(show("[1, 2, 3, 4].fill(0, 1, -1)"), "[ 1, 0, 0, 4 ]");
    }

    // ═══════════════════════════════════════════════════════════════════
    // Accessors
    // ═══════════════════════════════════════════════════════════════════

    #[test]
    fn test_slice_concat_join() {
        assert_eq!(show("[1, 2, 3, 4].slice(1, -1)"), "[ 2, 3 ]");
        assert_eq!(show("[1, 2].slice(5)"), "[]");
        assert_eq!(show("[1].concat([2, 3], 4)"), "[ 1, 2, 3, 4 ]");
        assert_eq!(show("[1, null, 'a'].join('-')"), "1--a");
        assert_eq!(show("[1, 2].join()"), "1,2");
    }

    #[test]
    fn test_search() {
        assert_eq!(show("[1, 2, 3].indexOf(2)"), "1");
        assert_eq!(show("[1, 2, 3].indexOf('2')"), "-1");
        assert_eq!(show("[NaN].includes(NaN)"), "true");
        assert_eq!(show("[1, 2, 3].at(-1)"), "3");
        assert_eq!(show("[1, [2, [3, [4]]]].flat()"), "[ 1, 2, [ 3, [ 4 ] ] ]");
        assert_eq!(show("[1, [2, [3, [4]]]].flat(Infinity)"), "[ 1, 2, 3, 4 ]");
    }

    // ═══════════════════════════════════════════════════════════════════
    // Iteration
    // ═══════════════════════════════════════════════════════════════════

    #[test]
    fn test_callbacks() {
        assert_eq!(show("[1, 2, 3].map((x, i) => x * i)"), "[ 0, 2, 6 ]");
        assert_eq!(show("[1, 2, 3, 4].filter(x => x % 2)"), "[ 1, 3 ]");
        assert_eq!(show("[1, 2, 3].reduce((a, b) => a + b)"), "6");
        assert_eq!(show("[1, 2, 3].reduce((a, b) => a + b, 10)"), "16");
        assert_eq!(show("[5, 12, 8].find(x => x > 6)"), "12");
        assert_eq!(show("[5, 12, 8].findIndex(x => x > 20)"), "-1");
        assert_eq!(show("[1, 2].some(x => x > 1)"), "true");
        assert_eq!(show("[1, 2].every(x => x > 1)"), "false");
        assert_eq!(run("let s = 0; [1, 2, 3].forEach(x => { s += x }); return s;"), "6");
    }

    #[test]
    fn test_reduce_empty_without_initial_fails() {
        assert_eq!(
            show("[].reduce((a, b) => a + b)"),
            "!TypeError: Reduce of empty array with no initial value"
        );
    }

    #[test]
    fn test_callback_must_be_function() {
        assert_eq!(show("[1].map(3)"), "!TypeError: 3 is not a function");
    }
}
