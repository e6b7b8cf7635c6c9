//! Attribute value normalization
//!
//! Raw values handed in by callers are reduced to one canonical
//! [`AttributeValue`] before they enter an attribute set, so that equality
//! is decided on normalized values only. The strategy is picked from the
//! declared [`ValueType`] of the attribute.

use crate::error::{ResolveError, ResolveResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Canonical attribute value
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Long(i64),
    String(String),
}

impl AttributeValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Long(n) => write!(f, "{}", n),
            Self::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Long(value)
    }
}

/// A value as supplied by a caller, before normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    Bool(bool),
    Long(i64),
    Text(String),
    Int(i32),
    /// A constant of an enum type, by name
    Constant(&'static str),
}

/// Deserializable subset of [`RawValue`]; avoids serde borrowing `'static` from the input
#[derive(Deserialize)]
#[serde(untagged, rename = "RawValue")]
enum RawValueRepr {
    Bool(bool),
    Long(i64),
    Text(String),
}

impl From<RawValueRepr> for RawValue {
    fn from(value: RawValueRepr) -> Self {
        match value {
            RawValueRepr::Bool(b) => Self::Bool(b),
            RawValueRepr::Long(n) => Self::Long(n),
            RawValueRepr::Text(s) => Self::Text(s),
        }
    }
}

impl<'de> Deserialize<'de> for RawValue {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawValueRepr::deserialize(deserializer).map(Self::from)
    }
}

impl RawValue {
    fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Long(_) => "long",
            Self::Int(_) => "int",
            Self::Text(_) => "string",
            Self::Constant(_) => "enum constant",
        }
    }

    fn into_natural(self) -> AttributeValue {
        match self {
            Self::Bool(b) => AttributeValue::Bool(b),
            Self::Long(n) => AttributeValue::Long(n),
            Self::Int(n) => AttributeValue::Long(i64::from(n)),
            Self::Text(s) => AttributeValue::String(s),
            Self::Constant(c) => AttributeValue::String(c.to_string()),
        }
    }
}

/// A closed enumeration type for attribute values
#[derive(Debug, PartialEq, Eq)]
pub struct EnumType {
    pub name: &'static str,
    pub constants: &'static [&'static str],
}

impl EnumType {
    /// Case-insensitive lookup of a constant by name
    pub fn constant(&self, name: &str) -> Option<&'static str> {
        self.constants
            .iter()
            .copied()
            .find(|c| c.eq_ignore_ascii_case(name))
    }
}

/// Declared type of an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    String,
    Long,
    Bool,
    Enum(&'static EnumType),
    Any,
}

/// Normalization strategy for one value type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSanitizer {
    String,
    Long,
    Enum(&'static EnumType),
    Identity,
}

impl ValueSanitizer {
    /// Pick the strategy for a declared type
    pub fn for_type(value_type: ValueType) -> Self {
        match value_type {
            ValueType::String => Self::String,
            ValueType::Long => Self::Long,
            ValueType::Enum(enum_type) => Self::Enum(enum_type),
            ValueType::Bool | ValueType::Any => Self::Identity,
        }
    }

    /// Normalize a single value for `attribute`
    pub fn sanitize(self, attribute: &str, value: RawValue) -> ResolveResult<AttributeValue> {
        match (self, value) {
            (Self::Identity, value) => Ok(value.into_natural()),
            (Self::String, RawValue::Text(s)) => Ok(AttributeValue::String(s)),
            (Self::Long, RawValue::Int(n)) => Ok(AttributeValue::Long(i64::from(n))),
            (Self::Long, RawValue::Long(n)) => Ok(AttributeValue::Long(n)),
            (Self::Enum(enum_type), RawValue::Text(s)) => {
                warn!(
                    "Assigning a string to enum attribute '{}' is deprecated, use a {} constant",
                    attribute, enum_type.name
                );
                to_enum(attribute, enum_type, &s)
            }
            (Self::Enum(enum_type), RawValue::Constant(c)) => to_enum(attribute, enum_type, c),
            (sanitizer, other) => Err(ResolveError::InvalidAttributeValue {
                attribute: attribute.to_string(),
                reason: format!(
                    "cannot assign {} value to {:?} attribute",
                    other.kind(),
                    sanitizer
                ),
            }),
        }
    }

    /// Normalize every element of a collection value
    pub fn sanitize_all(
        self,
        attribute: &str,
        values: impl IntoIterator<Item = RawValue>,
    ) -> ResolveResult<Vec<AttributeValue>> {
        values
            .into_iter()
            .map(|value| self.sanitize(attribute, value))
            .collect()
    }
}

fn to_enum(attribute: &str, enum_type: &EnumType, name: &str) -> ResolveResult<AttributeValue> {
    enum_type
        .constant(name)
        .map(|c| AttributeValue::String(c.to_string()))
        .ok_or_else(|| ResolveError::InvalidAttributeValue {
            attribute: attribute.to_string(),
            reason: format!(
                "cannot convert '{}' to a value of type {} (valid case insensitive values: {})",
                name,
                enum_type.name,
                enum_type.constants.join(", ")
            ),
        })
}
