//! Size caps on strings and arrays built from user-supplied numbers

use crate::error::EvalError;

/// Longest string a value may hold, in bytes.
pub const MAX_STRING_LENGTH: usize = (1 << 29) - 24;

/// Longest array a value may hold. Arrays are dense, so every index below
/// the length is allocated.
pub const MAX_ARRAY_LENGTH: usize = 1 << 24;

/// RangeError unless a string of `len` bytes fits.
pub fn check_string_length(len: f64) -> Result<usize, EvalError> {
    if len.is_nan() || len < 0.0 || len > MAX_STRING_LENGTH as f64 {
        return Err(EvalError::range_error("Invalid string length"));
    }
    Ok(len as usize)
}

/// RangeError unless an array of `len` items fits.
pub fn check_array_length(len: f64) -> Result<usize, EvalError> {
    if len.is_nan() || len < 0.0 || len.fract() != 0.0 || len > MAX_ARRAY_LENGTH as f64 {
        return Err(EvalError::range_error("Invalid array length"));
    }
    Ok(len as usize)
}

/// `a` followed by `b`, within [`MAX_STRING_LENGTH`].
pub fn concat_strings(a: &str, b: &str) -> Result<String, EvalError> {
    check_string_length(a.len() as f64 + b.len() as f64)?;
    let mut out = String::with_capacity(a.len() + b.len());
    out.push_str(a);
    out.push_str(b);
    Ok(out)
}
