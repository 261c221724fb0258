use core::fmt::{self, Display};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Classification of a witness token, as assigned by the external
/// transcription tokenizer.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "u8", into = "u8")
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    Empty,
    Word,
    Whitespace,
    Punctuation,
}

impl From<TokenType> for u8 {
    fn from(token_type: TokenType) -> Self {
        match token_type {
            TokenType::Empty => 0,
            TokenType::Word => 1,
            TokenType::Whitespace => 2,
            TokenType::Punctuation => 3,
        }
    }
}

impl TryFrom<u8> for TokenType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(TokenType::Empty),
            1 => Ok(TokenType::Word),
            2 => Ok(TokenType::Whitespace),
            3 => Ok(TokenType::Punctuation),
            other => Err(format!("invalid token type: {other}")),
        }
    }
}

/// An immutable token produced by the external transcription pipeline.
///
/// The core only ever compares tokens; it never creates or mutates them
/// beyond cloning them into change records.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WitnessToken {
    pub token_type: TokenType,
    pub text: String,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub normalized_text: Option<String>,
}

impl WitnessToken {
    pub fn word(text: impl Into<String>) -> Self {
        Self {
            token_type: TokenType::Word,
            text: text.into(),
            normalized_text: None,
        }
    }

    pub fn word_normalized(text: impl Into<String>, normalized: impl Into<String>) -> Self {
        Self {
            token_type: TokenType::Word,
            text: text.into(),
            normalized_text: Some(normalized.into()),
        }
    }

    pub fn punctuation(text: impl Into<String>) -> Self {
        Self {
            token_type: TokenType::Punctuation,
            text: text.into(),
            normalized_text: None,
        }
    }

    pub fn whitespace(text: impl Into<String>) -> Self {
        Self {
            token_type: TokenType::Whitespace,
            text: text.into(),
            normalized_text: None,
        }
    }

    pub fn empty() -> Self {
        Self {
            token_type: TokenType::Empty,
            text: String::new(),
            normalized_text: None,
        }
    }

    /// The collation equality predicate.
    ///
    /// Tokens of different types never match. Whitespace and empty tokens
    /// always match others of the same type, collapsing all whitespace
    /// variation. Punctuation matches on `text`; words match on both `text`
    /// and `normalized_text`.
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        if self.token_type != other.token_type {
            return false;
        }

        match self.token_type {
            TokenType::Whitespace | TokenType::Empty => true,
            TokenType::Punctuation => self.text == other.text,
            TokenType::Word => {
                self.text == other.text && self.normalized_text == other.normalized_text
            }
        }
    }
}

impl Display for WitnessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.token_type {
            TokenType::Empty => write!(f, "<empty>"),
            TokenType::Whitespace => write!(f, "<ws>"),
            TokenType::Word | TokenType::Punctuation => write!(f, "'{}'", self.text),
        }
    }
}

/// An ordered token sequence belonging to one source document version.
///
/// A witness is replaced wholesale when its transcription changes; the old
/// and new witness objects coexist during reconciliation.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Witness {
    tokens: Vec<WitnessToken>,
}

impl Witness {
    #[must_use]
    pub fn new(tokens: Vec<WitnessToken>) -> Self { Self { tokens } }

    #[must_use]
    pub fn tokens(&self) -> &[WitnessToken] { &self.tokens }

    #[must_use]
    pub fn token(&self, index: usize) -> Option<&WitnessToken> { self.tokens.get(index) }

    #[must_use]
    pub fn len(&self) -> usize { self.tokens.len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.tokens.is_empty() }
}
