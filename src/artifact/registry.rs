//! Artifact type registry
//!
//! Maps artifact file extensions to default attributes. Artifacts that do
//! not carry an attribute themselves inherit it from their type.

use crate::model::{well_known, AttributeSet};
use std::collections::{BTreeMap, HashMap};

/// Lookup table from file extension to default attributes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactTypeRegistry {
    types: BTreeMap<String, AttributeSet>,
}

impl ArtifactTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the common JVM artifact types
    pub fn standard() -> Self {
        Self::new()
            .register(
                "jar",
                AttributeSet::of([(well_known::LIBRARY_ELEMENTS, "jar")]),
            )
            .register(
                "aar",
                AttributeSet::of([(well_known::LIBRARY_ELEMENTS, "aar")]),
            )
            .register("zip", AttributeSet::empty())
    }

    /// Add or replace the defaults for an extension
    pub fn register(mut self, extension: impl Into<String>, attributes: AttributeSet) -> Self {
        self.types.insert(extension.into(), attributes);
        self
    }

    /// Add entries from configuration (`[artifact_types.<ext>]` tables)
    pub fn with_configured(
        mut self,
        configured: &HashMap<String, HashMap<String, String>>,
    ) -> Self {
        for (extension, attributes) in configured {
            let extra = AttributeSet::of(attributes.iter().map(|(k, v)| (k.as_str(), v.as_str())));
            let merged = match self.types.get(extension) {
                Some(existing) => existing.overlay(&extra),
                None => extra,
            };
            self.types.insert(extension.clone(), merged);
        }
        self
    }

    pub fn is_registered(&self, extension: &str) -> bool {
        self.types.contains_key(extension)
    }

    /// Default attributes for an extension; always includes `artifactType`
    pub fn attributes_for(&self, extension: &str) -> AttributeSet {
        let registered = self.types.get(extension).cloned().unwrap_or_default();
        registered.fill_missing(&AttributeSet::of([(well_known::ARTIFACT_TYPE, extension)]))
    }
}
