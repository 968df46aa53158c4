//! Process-wide cache of frozen scalar payloads.
//!
//! Inline scalars (Null, Boolean, Int, Long, Float, Double) never allocate
//! and need no interning. The cache covers the heap-backed scalars that show
//! up constantly in decoded documents: empty String/Binary and small
//! BigInt/BigDecimal values. Entries are built once, never mutated, and
//! shared through `Arc`, so readers on any thread may use them freely.
//!
//! Identity is only guaranteed for values inside the cached range.

use std::sync::{Arc, LazyLock};

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::ToPrimitive;

/// Inclusive range of BigInt values held by the cache.
pub const SMALL_BIG_INT_MIN: i64 = -16;
pub const SMALL_BIG_INT_MAX: i64 = 255;

struct ScalarCache {
    empty_string: Arc<str>,
    empty_binary: Arc<[u8]>,
    big_ints: Vec<Arc<BigInt>>,
    decimal_zero: Arc<BigDecimal>,
    decimal_one: Arc<BigDecimal>,
}

impl ScalarCache {
    fn build() -> Self {
        Self {
            empty_string: Arc::from(""),
            empty_binary: Arc::from(&[][..]),
            big_ints: (SMALL_BIG_INT_MIN..=SMALL_BIG_INT_MAX)
                .map(|n| Arc::new(BigInt::from(n)))
                .collect(),
            decimal_zero: Arc::new(BigDecimal::from(0)),
            decimal_one: Arc::new(BigDecimal::from(1)),
        }
    }
}

static CACHE: LazyLock<ScalarCache> = LazyLock::new(ScalarCache::build);

pub fn empty_string() -> Arc<str> {
    Arc::clone(&CACHE.empty_string)
}

pub fn empty_binary() -> Arc<[u8]> {
    Arc::clone(&CACHE.empty_binary)
}

/// Cached instance equal to `n`, if `n` is in the small range.
pub fn small_big_int(n: &BigInt) -> Option<Arc<BigInt>> {
    let v = n.to_i64()?;
    if !(SMALL_BIG_INT_MIN..=SMALL_BIG_INT_MAX).contains(&v) {
        return None;
    }
    let index = usize::try_from(v - SMALL_BIG_INT_MIN).ok()?;
    CACHE.big_ints.get(index).cloned()
}

/// Cached zero or one. Only values written with scale 0 qualify, so a
/// decimal such as `1.00` keeps its scale on the wire.
pub fn small_big_decimal(d: &BigDecimal) -> Option<Arc<BigDecimal>> {
    let (_, scale) = d.as_bigint_and_exponent();
    if scale != 0 {
        return None;
    }
    if *d == *CACHE.decimal_zero {
        Some(Arc::clone(&CACHE.decimal_zero))
    } else if *d == *CACHE.decimal_one {
        Some(Arc::clone(&CACHE.decimal_one))
    } else {
        None
    }
}
