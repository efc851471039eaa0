//! Binary and logical operators

use std::cmp::Ordering;

use super::{Evaluate, Interpreter};
use crate::environment::prelude::js_pow;
use crate::environment::Scope;
use crate::error::EvalError;
use crate::syntax::ast::{BinaryOp, Expr, LogicalOp};
use crate::value::limits::concat_strings;
use crate::value::{ErrorTag, Value};

impl Interpreter<'_> {
    /// Apply a binary operator to two evaluated operands.
    pub(super) fn binary(&mut self, op: BinaryOp, l: &Value, r: &Value) -> Result<Value, EvalError> {
        use BinaryOp::*;

        Ok(match op {
            Add => add(l, r)?,
            Sub => Value::Number(l.to_number() - r.to_number()),
            Mul => Value::Number(l.to_number() * r.to_number()),
            Div => Value::Number(l.to_number() / r.to_number()),
            // f64 `%` truncates like JS: the sign follows the dividend
            Rem => Value::Number(l.to_number() % r.to_number()),
            Exp => Value::Number(js_pow(l.to_number(), r.to_number())),

            StrictEq => Value::Bool(l.strict_equals(r)),
            StrictNe => Value::Bool(!l.strict_equals(r)),
            LooseEq => Value::Bool(l.loose_equals(r)),
            LooseNe => Value::Bool(!l.loose_equals(r)),

            Lt => Value::Bool(compare(l, r) == Some(Ordering::Less)),
            Gt => Value::Bool(compare(l, r) == Some(Ordering::Greater)),
            Le => Value::Bool(matches!(compare(l, r), Some(Ordering::Less | Ordering::Equal))),
            Ge => Value::Bool(matches!(
                compare(l, r),
                Some(Ordering::Greater | Ordering::Equal)
            )),

            BitAnd => Value::Number(f64::from(l.to_int32() & r.to_int32())),
            BitOr => Value::Number(f64::from(l.to_int32() | r.to_int32())),
            BitXor => Value::Number(f64::from(l.to_int32() ^ r.to_int32())),
            Shl => Value::Number(f64::from(l.to_int32().wrapping_shl(r.to_uint32() & 31))),
            Shr => Value::Number(f64::from(l.to_int32() >> (r.to_uint32() & 31))),
            UShr => Value::Number(f64::from(l.to_uint32() >> (r.to_uint32() & 31))),

            In => Value::Bool(has_property(l, r)?),
            InstanceOf => Value::Bool(instance_of(l, r)?),
        })
    }

    /// `&&`, `||`, `??` with short-circuiting.
    pub(super) fn eval_logical(
        &mut self,
        op: LogicalOp,
        left: &Expr,
        right: &Expr,
        scope: &Scope,
    ) -> Result<Value, EvalError> {
        let left = left.eval(self, scope)?;
        if short_circuits(op, &left) {
            return Ok(left);
        }
        right.eval(self, scope)
    }
}

/// Whether `left` alone decides the result of `left op right`.
pub(super) fn short_circuits(op: LogicalOp, left: &Value) -> bool {
    match op {
        LogicalOp::And => !left.truthy(),
        LogicalOp::Or => left.truthy(),
        LogicalOp::Nullish => !left.is_nullish(),
    }
}

/// Objects and arrays collapse to their string form; primitives pass through.
fn to_primitive(value: &Value) -> Value {
    match value {
        Value::Array(_)
        | Value::Object(_)
        | Value::Function(_)
        | Value::Class(_)
        | Value::Builtin(_) => Value::string(value.to_js_string()),
        other => other.clone(),
    }
}

fn add(l: &Value, r: &Value) -> Result<Value, EvalError> {
    let l = to_primitive(l);
    let r = to_primitive(r);
    Ok(match (&l, &r) {
        (Value::String(a), b) => Value::from(concat_strings(a, &b.to_js_string())?),
        (a, Value::String(b)) => Value::from(concat_strings(&a.to_js_string(), b)?),
        _ => Value::Number(l.to_number() + r.to_number()),
    })
}

/// Abstract relational comparison. `None` when either side is NaN.
fn compare(l: &Value, r: &Value) -> Option<Ordering> {
    let l = to_primitive(l);
    let r = to_primitive(r);
    if let (Value::String(a), Value::String(b)) = (&l, &r) {
        // Strings order by UTF-16 code units
        return Some(a.encode_utf16().cmp(b.encode_utf16()));
    }
    l.to_number().partial_cmp(&r.to_number())
}

/// `key in target`
fn has_property(key: &Value, target: &Value) -> Result<bool, EvalError> {
    let name = key.to_property_key();
    match target {
        Value::Object(obj) => Ok(obj.read().lookup(&name).is_some()),
        Value::Array(items) => Ok(name == "length"
            || Value::from(name.as_str())
                .as_index()
                .is_some_and(|i| i < items.read().len())),
        Value::Class(class) => Ok(name == "name" || class.static_member(&name).is_some()),
        Value::Function(_) => Ok(name == "name" || name == "length"),
        Value::Builtin(b) => Ok(name == "name" || name == "length" || b.statics.contains_key(&name)),
        _ => Err(EvalError::type_error(format!(
            "Cannot use 'in' operator to search for '{}' in {}",
            name,
            target.to_js_string()
        ))),
    }
}

/// `value instanceof target`
fn instance_of(value: &Value, target: &Value) -> Result<bool, EvalError> {
    match target {
        Value::Class(class) => Ok(match value {
            Value::Object(obj) => obj
                .read()
                .class
                .as_ref()
                .is_some_and(|c| c.is_subclass_of(class)),
            _ => false,
        }),
        Value::Builtin(b) => Ok(match (&*b.name, value) {
            ("Array", Value::Array(_)) => true,
            ("Object", Value::Array(_) | Value::Object(_)) => true,
            ("Object", v) => v.is_callable(),
            (name, Value::Object(obj)) => match (ErrorTag::from_name(name), obj.read().error) {
                (Some(ErrorTag::Error), Some(_)) => true,
                (Some(wanted), Some(tag)) => wanted == tag,
                _ => false,
            },
            _ => false,
        }),
        Value::Function(_) => Ok(false),
        _ => Err(EvalError::type_error(
            "Right-hand side of 'instanceof' is not callable",
        )),
    }
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

    // ═══════════════════════════════════════════════════════════════════
    // Arithmetic
    // ═══════════════════════════════════════════════════════════════════

    #[test]
    fn test_addition_coerces() {
        assert_eq!(show("1 + '2'"), "12");
        assert_eq!(show("[1, 2] + ''"), "1,2");
        assert_eq!(show("true + 1"), "2");
        assert_eq!(show("null + 1"), "1");
        assert_eq!(show("undefined + 1"), "NaN");
        assert_eq!(show("({}) + 1"), "[object Object]1");
    }

    #[test]
    fn test_division_edge_cases() {
        assert_eq!(show("1 / 0"), "Infinity");
        assert_eq!(show("-1 / 0"), "-Infinity");
        assert_eq!(show("0 / 0"), "NaN");
        assert_eq!(show("-7 % 3"), "-1");
    }

    #[test]
    fn test_bitwise() {
        assert_eq!(show("5 & 3"), "1");
        assert_eq!(show("5 | 3"), "7");
        assert_eq!(show("5 ^ 3"), "6");
        assert_eq!(show("1 << 33"), "2");
        assert_eq!(show("-8 >> 1"), "-4");
        assert_eq!(show("-1 >>> 28"), "15");
    }

    // ═══════════════════════════════════════════════════════════════════
    // Comparison
    // ═══════════════════════════════════════════════════════════════════

    #[test]
    fn test_equality() {
        assert_eq!(show("1 == '1'"), "true");
        assert_eq!(show("1 === '1'"), "false");
        assert_eq!(show("null == undefined"), "true");
        assert_eq!(show("null === undefined"), "false");
        assert_eq!(show("NaN === NaN"), "false");
        assert_eq!(show("[] === []"), "false");
    }

    #[test]
    fn test_relational() {
        assert_eq!(show("'b' > 'a'"), "true");
        assert_eq!(show("'10' < '9'"), "true");
        assert_eq!(show("'10' < 9"), "false");
        assert_eq!(show("NaN <= 1"), "false");
        assert_eq!(show("2 >= 2"), "true");
    }

    #[test]
    fn test_in_and_instanceof() {
        assert_eq!(show("'a' in { a: 1 }"), "true");
        assert_eq!(show("1 in [5, 6]"), "true");
        assert_eq!(show("[] instanceof Array"), "true");
        assert_eq!(show("new TypeError('x') instanceof Error"), "true");
        assert_eq!(show("new Error('x') instanceof TypeError"), "false");
        assert!(show("'a' in 'abc'").starts_with("!TypeError"));
        assert!(show("1 instanceof 2").starts_with("!TypeError"));
    }

    // ═══════════════════════════════════════════════════════════════════
    // Logical
    // ═══════════════════════════════════════════════════════════════════

    #[test]
    fn test_logical_short_circuit() {
        assert_eq!(show("0 || 'x'"), "x");
        assert_eq!(show("'' && nope"), "");
        assert_eq!(show("0 ?? nope"), "0");
        assert_eq!(show("null ?? 'd'"), "d");
        assert_eq!(show("1 && 2"), "2");
    }
}
