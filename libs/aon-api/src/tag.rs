use std::fmt;

/// Closed set of value types. Every dispatch in the codecs, in equality and
/// in the coercion matrix keys off this discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    BigInt,
    BigDecimal,
    Binary,
    String,
    List,
    Object,
}

impl Tag {
    pub const ALL: [Tag; 12] = [
        Tag::Null,
        Tag::Boolean,
        Tag::Int,
        Tag::Long,
        Tag::Float,
        Tag::Double,
        Tag::BigInt,
        Tag::BigDecimal,
        Tag::Binary,
        Tag::String,
        Tag::List,
        Tag::Object,
    ];

    pub fn is_container(self) -> bool {
        matches!(self, Tag::List | Tag::Object)
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Tag::Int | Tag::Long | Tag::Float | Tag::Double | Tag::BigInt | Tag::BigDecimal
        )
    }

    /// Int, Long and BigInt.
    pub fn is_integral(self) -> bool {
        matches!(self, Tag::Int | Tag::Long | Tag::BigInt)
    }

    pub fn name(self) -> &'static str {
        match self {
            Tag::Null => "null",
            Tag::Boolean => "boolean",
            Tag::Int => "int",
            Tag::Long => "long",
            Tag::Float => "float",
            Tag::Double => "double",
            Tag::BigInt => "bigint",
            Tag::BigDecimal => "bigdecimal",
            Tag::Binary => "binary",
            Tag::String => "string",
            Tag::List => "list",
            Tag::Object => "object",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
