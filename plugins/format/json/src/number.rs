//! Narrowest exact decoding of a validated JSON number literal.

use std::str::FromStr;

use aon_api::{BigDecimal, BigInt, Value};

/// Largest mantissa an f64 holds exactly.
const MAX_EXACT_MANTISSA: u64 = 1 << 53;

/// Largest power of ten an f64 holds exactly.
const MAX_EXACT_POW10: usize = 22;

/// Shape of a scanned literal.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Shape {
    /// Byte index of the `.`, if any.
    pub point: Option<usize>,
    /// Byte index of the `e`/`E`, if any.
    pub exponent: Option<usize>,
}

/// `None` only if `text` is not a well-formed literal.
pub(crate) fn decode(text: &str, shape: Shape) -> Option<Value> {
    match (shape.point, shape.exponent) {
        (None, None) => decode_integer(text),
        (Some(point), None) => decode_fraction(text, point),
        (_, Some(e)) => decode_scientific(text, shape.point.is_some(), e),
    }
}

fn decode_integer(text: &str) -> Option<Value> {
    let (negative, digits) = split_sign(text);
    // Accumulate toward the sign so i64::MIN does not overflow.
    let mut acc: i64 = 0;
    for b in digits.bytes() {
        let d = i64::from(b - b'0');
        let next = acc.checked_mul(10).and_then(|v| {
            if negative { v.checked_sub(d) } else { v.checked_add(d) }
        });
        match next {
            Some(v) => acc = v,
            None => return big_integer(text),
        }
    }
    Some(Value::integer(acc))
}

fn big_integer(text: &str) -> Option<Value> {
    BigInt::from_str(text).ok().map(Value::integer_big)
}

fn decode_fraction(text: &str, point: usize) -> Option<Value> {
    let (negative, body) = split_sign(text);
    let point = point - (text.len() - body.len());
    let (int_part, frac_part) = (&body[..point], &body[point + 1..]);

    if frac_part.len() <= MAX_EXACT_POW10 {
        let mantissa = int_part
            .bytes()
            .chain(frac_part.bytes())
            .try_fold(0u64, |acc, b| acc.checked_mul(10)?.checked_add(u64::from(b - b'0')));
        if let Some(m) = mantissa.filter(|m| *m <= MAX_EXACT_MANTISSA) {
            let scale = 10f64.powi(frac_part.len() as i32);
            let d = m as f64 / scale;
            return Some(Value::Double(if negative { -d } else { d }));
        }
    }
    decimal(text)
}

fn decode_scientific(text: &str, has_point: bool, e: usize) -> Option<Value> {
    if !has_point {
        if let Some(v) = exact_integral(text, e) {
            return Some(v);
        }
    }
    match text.parse::<f64>() {
        Ok(d) if d.is_finite() => Some(Value::Double(d)),
        _ => decimal(text),
    }
}

/// `123e4` style literals that land on an i64 exactly.
fn exact_integral(text: &str, e: usize) -> Option<Value> {
    let exp: u32 = text[e + 1..].trim_start_matches('+').parse().ok()?;
    if exp > 18 {
        return None;
    }
    let mantissa: i64 = text[..e].parse().ok()?;
    mantissa.checked_mul(10i64.checked_pow(exp)?).map(Value::integer)
}

fn decimal(text: &str) -> Option<Value> {
    BigDecimal::from_str(text).ok().map(Value::big_decimal)
}

fn split_sign(text: &str) -> (bool, &str) {
    match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    }
}
