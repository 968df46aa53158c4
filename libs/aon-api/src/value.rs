use std::sync::Arc;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::{FromPrimitive, ToPrimitive, Zero};

use crate::convert::decimal_to_f64;
use crate::intern;
use crate::list::List;
use crate::object::Object;
use crate::tag::Tag;

/// A node of the data model: a scalar or a container.
///
/// Strategy by type:
/// - Null, Boolean, Int, Long, Float, Double: inline, `Copy`-cheap
/// - BigInt, BigDecimal, Binary, String: immutable and `Arc`-shared, so
///   cloning a scalar never copies its payload
/// - List, Object: own their children by value; cloning is a deep copy
///
/// Equality is value-based across numeric tags: `Int(5) == Double(5.0)`,
/// because some wire formats cannot preserve the numeric subtype.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    BigInt(Arc<BigInt>),
    BigDecimal(Arc<BigDecimal>),
    Binary(Arc<[u8]>),
    String(Arc<str>),
    List(List),
    Object(Object),
}

impl Value {
    pub fn string(s: &str) -> Self {
        if s.is_empty() {
            return Value::String(intern::empty_string());
        }
        Value::String(Arc::from(s))
    }

    pub fn binary(bytes: &[u8]) -> Self {
        if bytes.is_empty() {
            return Value::Binary(intern::empty_binary());
        }
        Value::Binary(Arc::from(bytes))
    }

    pub fn big_int(n: BigInt) -> Self {
        match intern::small_big_int(&n) {
            Some(cached) => Value::BigInt(cached),
            None => Value::BigInt(Arc::new(n)),
        }
    }

    pub fn big_decimal(d: BigDecimal) -> Self {
        match intern::small_big_decimal(&d) {
            Some(cached) => Value::BigDecimal(cached),
            None => Value::BigDecimal(Arc::new(d)),
        }
    }

    /// Smallest integral representation of `n`: Int, then Long.
    pub fn integer(n: i64) -> Self {
        match i32::try_from(n) {
            Ok(i) => Value::Int(i),
            Err(_) => Value::Long(n),
        }
    }

    /// Smallest integral representation of `n`: Int, Long, then BigInt.
    pub fn integer_big(n: BigInt) -> Self {
        match n.to_i64() {
            Some(l) => Value::integer(l),
            None => Value::big_int(n),
        }
    }

    pub fn tag(&self) -> Tag {
        match self {
            Value::Null => Tag::Null,
            Value::Boolean(_) => Tag::Boolean,
            Value::Int(_) => Tag::Int,
            Value::Long(_) => Tag::Long,
            Value::Float(_) => Tag::Float,
            Value::Double(_) => Tag::Double,
            Value::BigInt(_) => Tag::BigInt,
            Value::BigDecimal(_) => Tag::BigDecimal,
            Value::Binary(_) => Tag::Binary,
            Value::String(_) => Tag::String,
            Value::List(_) => Tag::List,
            Value::Object(_) => Tag::Object,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_container(&self) -> bool {
        self.tag().is_container()
    }

    pub fn is_numeric(&self) -> bool {
        self.tag().is_numeric()
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Binary(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&List> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut List> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Scalars return themselves (shared payload); containers return a
    /// full recursive duplicate.
    pub fn copy(&self) -> Value {
        self.clone()
    }

    /// Number of children for containers, 0 for scalars.
    pub fn size(&self) -> usize {
        match self {
            Value::List(l) => l.len(),
            Value::Object(o) => o.len(),
            _ => 0,
        }
    }
}

// ---- Equality ----

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Binary(a), Value::Binary(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (a, b) if a.is_numeric() && b.is_numeric() => numeric_eq(a, b),
            _ => false,
        }
    }
}

fn same_float<T: PartialEq + Copy>(a: T, b: T, a_nan: bool, b_nan: bool) -> bool {
    a == b || (a_nan && b_nan)
}

fn numeric_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Float(_), _) | (_, Value::Float(_)) => match (lossy_f32(a), lossy_f32(b)) {
            (Some(x), Some(y)) => same_float(x, y, x.is_nan(), y.is_nan()),
            _ => false,
        },
        (Value::Double(x), Value::Double(y)) => same_float(*x, *y, x.is_nan(), y.is_nan()),
        (Value::Double(d), other) | (other, Value::Double(d)) => double_eq(*d, other),
        (Value::Int(_) | Value::Long(_), Value::Int(_) | Value::Long(_)) => {
            lossless_i64(a) == lossless_i64(b)
        }
        (Value::BigDecimal(_), _) | (_, Value::BigDecimal(_)) => {
            match (exact_decimal(a), exact_decimal(b)) {
                (Some(x), Some(y)) => decimal_key(&x) == decimal_key(&y),
                _ => false,
            }
        }
        _ => match (exact_big_int(a), exact_big_int(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
    }
}

fn double_eq(d: f64, other: &Value) -> bool {
    match other {
        Value::BigDecimal(bd) => decimal_to_f64(bd) == Some(d),
        v => {
            if !d.is_finite() || d.fract() != 0.0 {
                return false;
            }
            match (BigInt::from_f64(d), exact_big_int(v)) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            }
        }
    }
}

fn lossless_i64(v: &Value) -> Option<i64> {
    match v {
        Value::Int(i) => Some(i64::from(*i)),
        Value::Long(l) => Some(*l),
        _ => None,
    }
}

fn lossy_f32(v: &Value) -> Option<f32> {
    match v {
        Value::Int(i) => Some(*i as f32),
        Value::Long(l) => Some(*l as f32),
        Value::Float(f) => Some(*f),
        Value::Double(d) => Some(*d as f32),
        Value::BigInt(n) => n.to_f32(),
        Value::BigDecimal(d) => decimal_to_f64(d).map(|x| x as f32),
        _ => None,
    }
}

fn exact_big_int(v: &Value) -> Option<BigInt> {
    match v {
        Value::Int(i) => Some(BigInt::from(*i)),
        Value::Long(l) => Some(BigInt::from(*l)),
        Value::BigInt(n) => Some(BigInt::clone(n)),
        _ => None,
    }
}

fn exact_decimal(v: &Value) -> Option<BigDecimal> {
    match v {
        Value::BigDecimal(d) => Some(BigDecimal::clone(d)),
        other => exact_big_int(other).map(BigDecimal::from),
    }
}

/// `(digits, scale)` with trailing zeros stripped: equal decimals have equal
/// keys whatever their scale, and nothing is ever rescaled.
fn decimal_key(d: &BigDecimal) -> (BigInt, i64) {
    let (mut digits, mut scale) = d.as_bigint_and_exponent();
    if digits.is_zero() {
        return (digits, 0);
    }
    let ten = BigInt::from(10u8);
    while (&digits % &ten).is_zero() {
        digits /= &ten;
        scale -= 1;
    }
    (digits, scale)
}

// ---- Conversions from Rust types ----

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i)
    }
}

impl From<i64> for Value {
    fn from(l: i64) -> Self {
        Value::Long(l)
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Value::Float(f)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}

impl From<BigInt> for Value {
    fn from(n: BigInt) -> Self {
        Value::big_int(n)
    }
}

impl From<BigDecimal> for Value {
    fn from(d: BigDecimal) -> Self {
        Value::big_decimal(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        if s.is_empty() {
            return Value::String(intern::empty_string());
        }
        Value::String(Arc::from(s))
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Value::binary(b)
    }
}

impl From<List> for Value {
    fn from(l: List) -> Self {
        Value::List(l)
    }
}

impl From<Object> for Value {
    fn from(o: Object) -> Self {
        Value::Object(o)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
