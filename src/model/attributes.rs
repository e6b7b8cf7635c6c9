//! Attribute sets and the attributes schema
//!
//! An [`AttributeSet`] is an immutable mapping from attribute name to a
//! normalized value. Equality is set equality over `(name, value)` pairs.

use crate::error::ResolveResult;
use crate::model::sanitize::{AttributeValue, EnumType, RawValue, ValueSanitizer, ValueType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Well-known attribute names
pub mod well_known {
    pub const USAGE: &str = "org.gradle.usage";
    pub const CATEGORY: &str = "org.gradle.category";
    pub const DOCS_TYPE: &str = "org.gradle.docstype";
    pub const LIBRARY_ELEMENTS: &str = "org.gradle.libraryelements";
    pub const JVM_VERSION: &str = "org.gradle.jvm.version";
    pub const ARTIFACT_TYPE: &str = "artifactType";
}

/// Values accepted by the category attribute
pub static CATEGORY_TYPE: EnumType = EnumType {
    name: "Category",
    constants: &[
        "library",
        "platform",
        "enforced-platform",
        "documentation",
        "verification",
    ],
};

/// An immutable, order-independent set of attributes
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeSet(BTreeMap<String, AttributeValue>);

impl AttributeSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn of<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<AttributeValue>,
    {
        Self(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Return a copy of this set with `name` set to `value`
    pub fn with(&self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        let mut entries = self.0.clone();
        entries.insert(name.into(), value.into());
        Self(entries)
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Entries of `overrides` replace entries of `self`
    pub fn overlay(&self, overrides: &AttributeSet) -> Self {
        if overrides.is_empty() {
            return self.clone();
        }
        let mut entries = self.0.clone();
        entries.extend(overrides.0.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self(entries)
    }

    /// Entries of `defaults` are added only where `self` has no value
    pub fn fill_missing(&self, defaults: &AttributeSet) -> Self {
        let mut entries = self.0.clone();
        for (k, v) in &defaults.0 {
            entries.entry(k.clone()).or_insert_with(|| v.clone());
        }
        Self(entries)
    }
}

impl fmt::Display for AttributeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs: Vec<String> = self.0.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        write!(f, "{{{}}}", pairs.join(", "))
    }
}

/// Declared attribute types for a component
///
/// Only the type declarations live here; compatibility and disambiguation
/// rules belong to the wider resolution engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributesSchema {
    declared: BTreeMap<String, ValueType>,
}

impl AttributesSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schema with the well-known attributes declared
    pub fn standard() -> Self {
        Self::new()
            .declare(well_known::USAGE, ValueType::String)
            .declare(well_known::CATEGORY, ValueType::Enum(&CATEGORY_TYPE))
            .declare(well_known::DOCS_TYPE, ValueType::String)
            .declare(well_known::LIBRARY_ELEMENTS, ValueType::String)
            .declare(well_known::JVM_VERSION, ValueType::Long)
            .declare(well_known::ARTIFACT_TYPE, ValueType::String)
    }

    pub fn declare(mut self, name: impl Into<String>, value_type: ValueType) -> Self {
        self.declared.insert(name.into(), value_type);
        self
    }

    /// Declared type of `name`, `Any` when undeclared
    pub fn value_type(&self, name: &str) -> ValueType {
        self.declared.get(name).copied().unwrap_or(ValueType::Any)
    }

    /// Normalize a single raw value according to its declared type
    pub fn sanitize(&self, name: &str, value: RawValue) -> ResolveResult<AttributeValue> {
        ValueSanitizer::for_type(self.value_type(name)).sanitize(name, value)
    }

    /// Build an attribute set from raw values, normalizing each one
    pub fn attributes<K: Into<String>>(
        &self,
        entries: impl IntoIterator<Item = (K, RawValue)>,
    ) -> ResolveResult<AttributeSet> {
        let mut normalized = BTreeMap::new();
        for (name, raw) in entries {
            let name = name.into();
            let value = self.sanitize(&name, raw)?;
            normalized.insert(name, value);
        }
        Ok(AttributeSet(normalized))
    }
}
