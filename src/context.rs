use std::collections::HashMap;

use derive_more::From;
use serde::{Deserialize, Serialize};

/// Type alias for a map of visitor attributes used to evaluate targeting conditions.
///
/// Keys are strings representing attribute names.
///
/// # Examples
/// ```
/// # use varia_core::{Context, ContextValue};
/// let context = [
///     ("age".to_owned(), 30.0.into()),
///     ("is_premium_member".to_owned(), true.into()),
///     ("username".to_owned(), "john_doe".into()),
/// ].into_iter().collect::<Context>();
/// ```
pub type Context = HashMap<String, ContextValue>;

/// A dynamically-typed value, as found in visitor contexts and targeting operands.
///
/// The set of variants is closed on purpose: targeting evaluation checks context and operand
/// types against each other exhaustively, and a type disagreement is an evaluation error rather
/// than a silent non-match.
///
/// Conveniently implements `From` conversions for `String`, `&str`, `f64`, `i64`, `bool` and
/// `Vec<ContextValue>`:
/// ```
/// # use varia_core::ContextValue;
/// let string_value: ContextValue = "example".into();
/// let number_value: ContextValue = 42.0.into();
/// let bool_value: ContextValue = true.into();
/// ```
#[derive(Debug, Serialize, Deserialize, PartialEq, From, Clone)]
#[serde(untagged)]
pub enum ContextValue {
    /// A boolean value.
    Bool(bool),
    /// A numerical value. Integers are normalized to floating point at this boundary.
    Number(f64),
    /// A string value.
    String(String),
    /// A list of values. Only valid on the targeting operand side; the operator distributes over
    /// the elements.
    List(Vec<ContextValue>),
}

impl ContextValue {
    pub fn as_str(&self) -> Option<&str> {
        if let ContextValue::String(s) = self {
            Some(s.as_str())
        } else {
            None
        }
    }
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<i64> for ContextValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<i32> for ContextValue {
    fn from(value: i32) -> Self {
        Self::Number(value as f64)
    }
}
