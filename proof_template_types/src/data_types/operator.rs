use std::fmt;

use strum_macros::{AsRefStr, EnumString};

use crate::error::ValidationError;

/// Comparison applied to a single template attribute.
///
/// `Equals` keeps the attribute revealed; the four order comparisons turn it
/// into a zero-knowledge predicate, so the raw value never leaves the holder.
#[derive(Copy, Clone, Debug, PartialEq, Eq, AsRefStr, EnumString, Deserialize, Serialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueOperator {
    Equals,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

impl ValueOperator {
    /// Whether attributes under this operator are proven as predicates
    /// instead of being revealed.
    #[must_use]
    pub const fn handled_as_predicate(&self) -> bool {
        !matches!(self, Self::Equals)
    }

    /// The wire tag of the predicate this operator compiles to, if any.
    #[must_use]
    pub const fn predicate_type(&self) -> Option<PredicateType> {
        match self {
            Self::Equals => None,
            Self::LessThan => Some(PredicateType::LT),
            Self::LessThanOrEqual => Some(PredicateType::LE),
            Self::GreaterThan => Some(PredicateType::GT),
            Self::GreaterThanOrEqual => Some(PredicateType::GE),
        }
    }

    /// Predicate proofs are only defined over 32-bit signed integers;
    /// equality accepts any string.
    pub fn check_value(&self, value: &str) -> Result<(), ValidationError> {
        match self {
            Self::Equals => Ok(()),
            _ => match value.parse::<i32>() {
                Ok(_) => Ok(()),
                Err(_) => Err(ValidationError::InvalidConditionValue {
                    operator: self.as_ref().to_owned(),
                    value: value.to_owned(),
                    reason: "predicate values must be 32-bit signed integers".to_owned(),
                }),
            },
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum PredicateType {
    #[serde(rename = ">=")]
    GE,
    #[serde(rename = "<=")]
    LE,
    #[serde(rename = ">")]
    GT,
    #[serde(rename = "<")]
    LT,
}

impl fmt::Display for PredicateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::GE => write!(f, "GE"),
            Self::GT => write!(f, "GT"),
            Self::LE => write!(f, "LE"),
            Self::LT => write!(f, "LT"),
        }
    }
}
