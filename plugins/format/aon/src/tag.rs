//! Aon tag bytes. Every value starts with one ASCII tag; multi-byte
//! payload fields are big-endian.

pub const NULL: u8 = b'N';
pub const TRUE: u8 = b'T';
pub const FALSE: u8 = b'F';

pub const I8: u8 = b'b';
pub const U8: u8 = b'B';
pub const I16: u8 = b'h';
pub const U16: u8 = b'H';
pub const I32: u8 = b'i';
pub const U32: u8 = b'I';
pub const I64: u8 = b'l';

pub const FLOAT: u8 = b'f';
pub const DOUBLE: u8 = b'd';

pub const LIST_START: u8 = b'[';
pub const LIST_END: u8 = b']';
pub const OBJ_START: u8 = b'{';
pub const OBJ_END: u8 = b'}';

/// Length-prefixed payload kinds and their tags for 8, 16 and 32-bit
/// length fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload {
    Str,
    Bin,
    BigInt,
    BigDec,
}

impl Payload {
    pub fn tags(self) -> [u8; 3] {
        match self {
            Payload::Str => *b"stu",
            Payload::Bin => *b"xyz",
            Payload::BigInt => *b"mno",
            Payload::BigDec => *b"pqr",
        }
    }

    /// Kind and length-field width in bytes for a sized tag.
    pub fn classify(tag: u8) -> Option<(Payload, usize)> {
        let kind = match tag {
            b's' | b't' | b'u' => Payload::Str,
            b'x' | b'y' | b'z' => Payload::Bin,
            b'm' | b'n' | b'o' => Payload::BigInt,
            b'p' | b'q' | b'r' => Payload::BigDec,
            _ => return None,
        };
        let width = match kind.tags().iter().position(|t| *t == tag)? {
            0 => 1,
            1 => 2,
            _ => 4,
        };
        Some((kind, width))
    }
}

/// Smallest integer class holding `n`, with its payload width.
pub fn integer_class(n: i64) -> (u8, usize) {
    if i8::try_from(n).is_ok() {
        (I8, 1)
    } else if u8::try_from(n).is_ok() {
        (U8, 1)
    } else if i16::try_from(n).is_ok() {
        (I16, 2)
    } else if u16::try_from(n).is_ok() {
        (U16, 2)
    } else if i32::try_from(n).is_ok() {
        (I32, 4)
    } else if u32::try_from(n).is_ok() {
        (U32, 4)
    } else {
        (I64, 8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sized_tags_classify_back() {
        for kind in [Payload::Str, Payload::Bin, Payload::BigInt, Payload::BigDec] {
            let [t8, t16, t32] = kind.tags();
            assert_eq!(Payload::classify(t8), Some((kind, 1)));
            assert_eq!(Payload::classify(t16), Some((kind, 2)));
            assert_eq!(Payload::classify(t32), Some((kind, 4)));
        }
        assert_eq!(Payload::classify(b'N'), None);
    }

    #[test]
    fn integer_classes_by_magnitude() {
        assert_eq!(integer_class(-128), (I8, 1));
        assert_eq!(integer_class(200), (U8, 1));
        assert_eq!(integer_class(-129), (I16, 2));
        assert_eq!(integer_class(40_000), (U16, 2));
        assert_eq!(integer_class(-40_000), (I32, 4));
        assert_eq!(integer_class(3_000_000_000), (U32, 4));
        assert_eq!(integer_class(i64::MIN), (I64, 8));
    }
}
