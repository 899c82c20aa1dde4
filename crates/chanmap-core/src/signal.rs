//! Signal and channel type vocabulary.
//!
//! The same codes name both a point's signal type and a channel's type. The
//! five well-known codes have dedicated variants; anything else a document
//! parser produces is carried verbatim in [`SignalType::Other`].

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::str::FromStr;

/// Signal type of a point, and type of a channel.
///
/// Variant order is the canonical processing order (`AI, DI, AO, DO, COMM`),
/// with unknown codes sorted after them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SignalType {
    /// Analog input
    Ai,
    /// Digital input
    Di,
    /// Analog output
    Ao,
    /// Digital output
    Do,
    /// Communication point
    Comm,
    /// Any other type code
    Other(String),
}

/// Canonical processing order for the well-known signal types.
pub const CANONICAL_ORDER: [SignalType; 5] = [
    SignalType::Ai,
    SignalType::Di,
    SignalType::Ao,
    SignalType::Do,
    SignalType::Comm,
];

/// Kind of value held at a point's primary address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// 4-byte real value in the `%MD` space
    Real,
    /// Single bit in the `%MX` space
    Bool,
}

impl SignalType {
    /// Type code as written in channel ids and documents.
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            SignalType::Ai => "AI",
            SignalType::Di => "DI",
            SignalType::Ao => "AO",
            SignalType::Do => "DO",
            SignalType::Comm => "COMM",
            SignalType::Other(code) => code,
        }
    }

    /// Value kind stored for points of this type, if it has one.
    #[must_use]
    pub fn value_kind(&self) -> Option<ValueKind> {
        match self {
            SignalType::Ai | SignalType::Ao => Some(ValueKind::Real),
            SignalType::Di | SignalType::Do => Some(ValueKind::Bool),
            SignalType::Comm | SignalType::Other(_) => None,
        }
    }

    /// Position in [`CANONICAL_ORDER`], or `None` for unknown codes.
    #[must_use]
    pub fn canonical_rank(&self) -> Option<usize> {
        CANONICAL_ORDER.iter().position(|t| t == self)
    }
}

impl From<&str> for SignalType {
    fn from(code: &str) -> Self {
        let code = code.trim();
        match code.to_ascii_uppercase().as_str() {
            "AI" => SignalType::Ai,
            "DI" => SignalType::Di,
            "AO" => SignalType::Ao,
            "DO" => SignalType::Do,
            "COMM" => SignalType::Comm,
            _ => SignalType::Other(code.to_string()),
        }
    }
}

impl From<String> for SignalType {
    fn from(code: String) -> Self {
        SignalType::from(code.as_str())
    }
}

impl From<SignalType> for String {
    fn from(signal_type: SignalType) -> Self {
        match signal_type {
            SignalType::Other(code) => code,
            known => known.code().to_string(),
        }
    }
}

impl FromStr for SignalType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(SignalType::from(s))
    }
}

impl std::fmt::Display for SignalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}
