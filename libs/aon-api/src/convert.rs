//! Scalar coercion matrix.
//!
//! Every conversion is a pure function of (source tag, target
//! representation). Containers and Null convert to nothing.

use std::str::FromStr;

use base64::Engine;
use bigdecimal::BigDecimal;
use num_bigint::{BigInt, Sign};
use num_traits::{FromPrimitive, ToPrimitive, Zero};

use crate::error::{CodecError, Result};
use crate::value::Value;

/// Private-use prefix of the non-finite number sentinels in text formats.
pub const SENTINEL_PREFIX: char = '\u{1B}';
pub const SENTINEL_NAN: &str = "\u{1B}NaN";
pub const SENTINEL_INFINITY: &str = "\u{1B}Infinity";
pub const SENTINEL_NEG_INFINITY: &str = "\u{1B}-Infinity";

/// Scale magnitude above which decimals are rendered with an exponent
/// instead of padding zeros.
const PLAIN_SCALE_LIMIT: i64 = 1024;

/// Widest integer part a decimal may be truncated to when coercing to BigInt.
pub const MAX_INTEGER_DIGITS: u64 = 1 << 16;

/// Integer digits past which no f64 is finite, and fraction-only digits
/// below which every f64 rounds to zero.
const F64_MAX_INTEGER_DIGITS: i128 = 310;
const F64_MIN_INTEGER_DIGITS: i128 = -330;

impl Value {
    pub fn to_boolean(&self) -> Result<bool> {
        match self {
            Value::Boolean(b) => Ok(*b),
            Value::Int(i) => Ok(*i != 0),
            Value::Long(l) => Ok(*l != 0),
            Value::Float(f) => Ok(*f != 0.0),
            Value::Double(d) => Ok(*d != 0.0),
            Value::BigInt(n) => Ok(!n.is_zero()),
            Value::BigDecimal(d) => Ok(!d.is_zero()),
            Value::String(s) => {
                if s.eq_ignore_ascii_case("true") {
                    Ok(true)
                } else if s.eq_ignore_ascii_case("false") {
                    Ok(false)
                } else {
                    Err(self.unconvertible("boolean", format!("{s:?} is not a boolean")))
                }
            }
            _ => Err(self.unconvertible("boolean", "no boolean representation")),
        }
    }

    pub fn to_int(&self) -> Result<i32> {
        let wide = self.to_long().map_err(|e| retarget(e, "int"))?;
        i32::try_from(wide).map_err(|_| self.unconvertible("int", format!("{wide} out of range")))
    }

    pub fn to_long(&self) -> Result<i64> {
        match self {
            Value::Boolean(b) => Ok(i64::from(*b)),
            Value::Int(i) => Ok(i64::from(*i)),
            Value::Long(l) => Ok(*l),
            Value::Float(f) => self.truncate_float(f64::from(*f)),
            Value::Double(d) => self.truncate_float(*d),
            Value::BigInt(n) => n
                .to_i64()
                .ok_or_else(|| self.unconvertible("long", "out of range")),
            Value::BigDecimal(d) => truncate_decimal(d, 19)
                .and_then(|n| n.to_i64())
                .ok_or_else(|| self.unconvertible("long", "out of range")),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|e| self.unconvertible("long", format!("{s:?}: {e}"))),
            _ => Err(self.unconvertible("long", "no integer representation")),
        }
    }

    pub fn to_float(&self) -> Result<f32> {
        match self {
            Value::Float(f) => Ok(*f),
            Value::String(s) => parse_double(s)
                .map(|d| d as f32)
                .ok_or_else(|| self.unconvertible("float", format!("{s:?} is not a number"))),
            _ => self.to_double().map(|d| d as f32).map_err(|e| retarget(e, "float")),
        }
    }

    pub fn to_double(&self) -> Result<f64> {
        match self {
            Value::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Value::Int(i) => Ok(f64::from(*i)),
            Value::Long(l) => Ok(*l as f64),
            Value::Float(f) => Ok(f64::from(*f)),
            Value::Double(d) => Ok(*d),
            Value::BigInt(n) => n
                .to_f64()
                .ok_or_else(|| self.unconvertible("double", "out of range")),
            Value::BigDecimal(d) => {
                decimal_to_f64(d).ok_or_else(|| self.unconvertible("double", "out of range"))
            }
            Value::String(s) => parse_double(s)
                .ok_or_else(|| self.unconvertible("double", format!("{s:?} is not a number"))),
            _ => Err(self.unconvertible("double", "no floating representation")),
        }
    }

    pub fn to_big_int(&self) -> Result<BigInt> {
        match self {
            Value::Boolean(b) => Ok(BigInt::from(u8::from(*b))),
            Value::Int(i) => Ok(BigInt::from(*i)),
            Value::Long(l) => Ok(BigInt::from(*l)),
            Value::Float(f) => self.float_to_big_int(f64::from(*f)),
            Value::Double(d) => self.float_to_big_int(*d),
            Value::BigInt(n) => Ok(BigInt::clone(n)),
            Value::BigDecimal(d) => truncate_decimal(d, MAX_INTEGER_DIGITS).ok_or_else(|| {
                let detail = format!("integer part exceeds {MAX_INTEGER_DIGITS} digits");
                self.unconvertible("bigint", detail)
            }),
            Value::String(s) => BigInt::from_str(s.trim())
                .map_err(|e| self.unconvertible("bigint", format!("{s:?}: {e}"))),
            _ => Err(self.unconvertible("bigint", "no integer representation")),
        }
    }

    pub fn to_big_decimal(&self) -> Result<BigDecimal> {
        match self {
            Value::Boolean(b) => Ok(BigDecimal::from(u8::from(*b))),
            Value::Int(i) => Ok(BigDecimal::from(*i)),
            Value::Long(l) => Ok(BigDecimal::from(*l)),
            Value::Float(f) if f.is_finite() => BigDecimal::from_str(&format!("{f:?}"))
                .map_err(|e| self.unconvertible("bigdecimal", e.to_string())),
            Value::Double(d) if d.is_finite() => BigDecimal::from_str(&format!("{d:?}"))
                .map_err(|e| self.unconvertible("bigdecimal", e.to_string())),
            Value::Float(_) | Value::Double(_) => {
                Err(self.unconvertible("bigdecimal", "not a finite number"))
            }
            Value::BigInt(n) => Ok(BigDecimal::from(BigInt::clone(n))),
            Value::BigDecimal(d) => Ok(BigDecimal::clone(d)),
            Value::String(s) => BigDecimal::from_str(s.trim())
                .map_err(|e| self.unconvertible("bigdecimal", format!("{s:?}: {e}"))),
            _ => Err(self.unconvertible("bigdecimal", "no decimal representation")),
        }
    }

    /// Text form of a scalar. Binary renders as standard Base64.
    pub fn to_string(&self) -> Result<String> {
        match self {
            Value::Boolean(b) => Ok(b.to_string()),
            Value::Int(i) => Ok(i.to_string()),
            Value::Long(l) => Ok(l.to_string()),
            Value::Float(f) => Ok(format_float(*f)),
            Value::Double(d) => Ok(format_double(*d)),
            Value::BigInt(n) => Ok(n.to_string()),
            Value::BigDecimal(d) => Ok(plain_decimal(d)),
            Value::String(s) => Ok(s.to_string()),
            Value::Binary(b) => Ok(base64::engine::general_purpose::STANDARD.encode(b)),
            _ => Err(self.unconvertible("string", "no text representation")),
        }
    }

    /// Raw bytes of a scalar. Strings are decoded as standard Base64, the
    /// fallback representation of binary data in text formats.
    pub fn to_binary(&self) -> Result<Vec<u8>> {
        match self {
            Value::Binary(b) => Ok(b.to_vec()),
            Value::String(s) => base64::engine::general_purpose::STANDARD
                .decode(s.as_bytes())
                .map_err(|e| self.unconvertible("binary", e.to_string())),
            _ => Err(self.unconvertible("binary", "no binary representation")),
        }
    }

    fn unconvertible(&self, to: &'static str, detail: impl Into<String>) -> CodecError {
        CodecError::coercion(self.tag(), to, detail)
    }

    fn truncate_float(&self, d: f64) -> Result<i64> {
        // i64::MAX as f64 rounds up to 2^63, which is already out of range.
        if d.is_finite() && d >= i64::MIN as f64 && d < i64::MAX as f64 {
            Ok(d.trunc() as i64)
        } else {
            Err(self.unconvertible("long", format!("{d} out of range")))
        }
    }

    fn float_to_big_int(&self, d: f64) -> Result<BigInt> {
        BigInt::from_f64(d.trunc())
            .ok_or_else(|| self.unconvertible("bigint", format!("{d} is not finite")))
    }
}

fn retarget(err: CodecError, to: &'static str) -> CodecError {
    match err {
        CodecError::Coercion { from, detail, .. } => CodecError::Coercion { from, to, detail },
        other => other,
    }
}

/// Digits of `d` left of the decimal point; zero or negative when `|d| < 1`.
fn integer_digits(d: &BigDecimal) -> i128 {
    let (_, scale) = d.as_bigint_and_exponent();
    i128::from(d.digits()) - i128::from(scale)
}

/// Integer part of `d` rounded toward zero, or `None` when it is wider than
/// `max_digits`. Only powers of ten no wider than the result are built, so a
/// short literal with a huge exponent stays cheap.
pub fn truncate_decimal(d: &BigDecimal, max_digits: u64) -> Option<BigInt> {
    let (digits, scale) = d.as_bigint_and_exponent();
    let width = integer_digits(d);
    if digits.is_zero() || width <= 0 {
        return Some(BigInt::zero());
    }
    if width > i128::from(max_digits) {
        return None;
    }
    let shift = u32::try_from(scale.unsigned_abs()).ok()?;
    let pow = BigInt::from(10u8).pow(shift);
    Some(if scale <= 0 { digits * pow } else { digits / pow })
}

/// `d` as the nearest f64, `None` past the finite range.
pub fn decimal_to_f64(d: &BigDecimal) -> Option<f64> {
    let width = integer_digits(d);
    if d.is_zero() {
        Some(0.0)
    } else if width > F64_MAX_INTEGER_DIGITS {
        None
    } else if width < F64_MIN_INTEGER_DIGITS {
        Some(if d.sign() == Sign::Minus { -0.0 } else { 0.0 })
    } else {
        d.to_f64().filter(|x| x.is_finite())
    }
}

/// Parse a decimal or special-value string as f64.
///
/// Accepts `NaN`, `Infinity`, `-Infinity` and their sentinel forms besides
/// everything `f64::from_str` accepts.
pub fn parse_double(s: &str) -> Option<f64> {
    let s = s.strip_prefix(SENTINEL_PREFIX).unwrap_or(s).trim();
    match s {
        "NaN" => Some(f64::NAN),
        "Infinity" | "+Infinity" => Some(f64::INFINITY),
        "-Infinity" => Some(f64::NEG_INFINITY),
        _ => s.parse::<f64>().ok(),
    }
}

/// Shortest round-trip rendering; whole values keep a trailing `.0`.
pub fn format_double(d: f64) -> String {
    if d.is_nan() {
        "NaN".to_string()
    } else if d.is_infinite() {
        if d > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else {
        keep_point(format!("{d:?}"))
    }
}

pub fn format_float(f: f32) -> String {
    if f.is_finite() {
        keep_point(format!("{f:?}"))
    } else {
        format_double(f64::from(f))
    }
}

/// `1e16` becomes `1.0e16`, so exponent renderings still read back as
/// floating point.
fn keep_point(mut text: String) -> String {
    if !text.contains('.') {
        if let Some(e) = text.find('e') {
            text.insert_str(e, ".0");
        }
    }
    text
}

/// The sentinel string standing in for a non-finite number, if `d` is one.
pub fn non_finite_sentinel(d: f64) -> Option<&'static str> {
    if d.is_nan() {
        Some(SENTINEL_NAN)
    } else if d == f64::INFINITY {
        Some(SENTINEL_INFINITY)
    } else if d == f64::NEG_INFINITY {
        Some(SENTINEL_NEG_INFINITY)
    } else {
        None
    }
}

/// The number a sentinel string stands for.
pub fn parse_sentinel(s: &str) -> Option<f64> {
    match s {
        SENTINEL_NAN => Some(f64::NAN),
        SENTINEL_INFINITY => Some(f64::INFINITY),
        SENTINEL_NEG_INFINITY => Some(f64::NEG_INFINITY),
        _ => None,
    }
}

/// Decimal-string payload shared by every codec: plain digits with an
/// optional point, no exponent. Extreme scales fall back to `<digits>E<exp>`
/// so a tiny literal cannot expand into megabytes of zeros.
pub fn plain_decimal(d: &BigDecimal) -> String {
    let (digits, scale) = d.as_bigint_and_exponent();
    let negative = digits.sign() == Sign::Minus;
    let mut out = digits.magnitude().to_string();

    if scale.abs() > PLAIN_SCALE_LIMIT {
        out.push('E');
        out.push_str(&(-scale).to_string());
    } else if scale <= 0 {
        out.extend(std::iter::repeat_n('0', scale.unsigned_abs() as usize));
    } else {
        let scale = scale.unsigned_abs() as usize;
        if out.len() <= scale {
            let pad = scale - out.len();
            out = format!("0.{}{out}", "0".repeat(pad));
        } else {
            out.insert(out.len() - scale, '.');
        }
    }

    if negative {
        out.insert(0, '-');
    }
    out
}
