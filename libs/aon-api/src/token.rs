use std::fmt;

use crate::tag::Tag;

/// What a reader's cursor currently sits on.
///
/// There is no key token: inside an object, a `String` in key position is
/// the key and the token after it is the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// Before the first `next()`.
    Root,
    BeginList,
    EndList,
    BeginObj,
    EndObj,
    /// Clean end of stream outside all containers.
    EndInput,
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
}

impl Token {
    /// Token announcing a scalar of `tag`, or the opening token of a
    /// container.
    pub fn of(tag: Tag) -> Token {
        match tag {
            Tag::Null => Token::Null,
            Tag::Boolean => Token::Boolean,
            Tag::Int => Token::Int,
            Tag::Long => Token::Long,
            Tag::Float => Token::Float,
            Tag::Double => Token::Double,
            Tag::BigInt => Token::BigInt,
            Tag::BigDecimal => Token::BigDecimal,
            Tag::Binary => Token::Binary,
            Tag::String => Token::String,
            Tag::List => Token::BeginList,
            Tag::Object => Token::BeginObj,
        }
    }

    /// Scalar tag carried by this token, `None` for structural tokens.
    pub fn scalar_tag(&self) -> Option<Tag> {
        match self {
            Token::Null => Some(Tag::Null),
            Token::Boolean => Some(Tag::Boolean),
            Token::Int => Some(Tag::Int),
            Token::Long => Some(Tag::Long),
            Token::Float => Some(Tag::Float),
            Token::Double => Some(Tag::Double),
            Token::BigInt => Some(Tag::BigInt),
            Token::BigDecimal => Some(Tag::BigDecimal),
            Token::Binary => Some(Tag::Binary),
            Token::String => Some(Tag::String),
            _ => None,
        }
    }

    pub fn is_scalar(&self) -> bool {
        self.scalar_tag().is_some()
    }

    pub fn is_begin(&self) -> bool {
        matches!(self, Token::BeginList | Token::BeginObj)
    }

    pub fn is_end(&self) -> bool {
        matches!(self, Token::EndList | Token::EndObj)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Token::Root => "ROOT",
            Token::BeginList => "BEGIN_LIST",
            Token::EndList => "END_LIST",
            Token::BeginObj => "BEGIN_OBJ",
            Token::EndObj => "END_OBJ",
            Token::EndInput => "END_INPUT",
            Token::Null => "NULL",
            Token::Boolean => "BOOLEAN",
            Token::Int => "INT",
            Token::Long => "LONG",
            Token::Float => "FLOAT",
            Token::Double => "DOUBLE",
            Token::BigInt => "BIG_INT",
            Token::BigDecimal => "BIG_DECIMAL",
            Token::Binary => "BINARY",
            Token::String => "STRING",
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_tag_has_a_token() {
        for tag in Tag::ALL {
            let token = Token::of(tag);
            if tag.is_container() {
                assert!(token.is_begin());
                assert_eq!(token.scalar_tag(), None);
            } else {
                assert_eq!(token.scalar_tag(), Some(tag));
            }
        }
    }

    #[test]
    fn structural_tokens_are_not_scalars() {
        for t in [Token::Root, Token::EndList, Token::EndObj, Token::EndInput] {
            assert!(!t.is_scalar());
        }
        assert!(Token::EndObj.is_end());
        assert_eq!(Token::BigDecimal.to_string(), "BIG_DECIMAL");
    }
}
