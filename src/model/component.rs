//! Read-only view of a resolved component
//!
//! Components, their configurations and variants are created once by a
//! metadata source and shared across resolution workers behind `Arc`.

use crate::error::{ResolveError, ResolveResult};
use crate::model::attributes::{AttributeSet, AttributesSchema};
use crate::model::capability::CapabilitySet;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A `group:module` coordinate
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleId {
    pub group: String,
    pub name: String,
}

impl ModuleId {
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.name)
    }
}

/// A `group:module:version` coordinate
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleVersionId {
    pub group: String,
    pub name: String,
    pub version: String,
}

impl ModuleVersionId {
    pub fn new(
        group: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            version: version.into(),
        }
    }

    pub fn module(&self) -> ModuleId {
        ModuleId::new(self.group.clone(), self.name.clone())
    }
}

impl fmt::Display for ModuleVersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.name, self.version)
    }
}

/// Identity of a resolved component
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ComponentId {
    /// A component published to a repository
    Module(ModuleVersionId),
    /// A component produced by a project in the current build
    Project { path: String },
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Module(id) => write!(f, "{}", id),
            Self::Project { path } => write!(f, "project {}", path),
        }
    }
}

/// Where a component's metadata was obtained from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSource {
    pub repository: String,
    #[serde(default)]
    pub location: Option<String>,
}

/// Name of one artifact file owned by a variant
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArtifactName {
    pub name: String,
    pub extension: String,
    #[serde(default)]
    pub classifier: Option<String>,
}

impl ArtifactName {
    pub fn new(name: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extension: extension.into(),
            classifier: None,
        }
    }

    pub fn with_classifier(mut self, classifier: impl Into<String>) -> Self {
        self.classifier = Some(classifier.into());
        self
    }

    /// File name for this artifact at `version`
    pub fn file_name(&self, version: &str) -> String {
        match &self.classifier {
            Some(classifier) => format!(
                "{}-{}-{}.{}",
                self.name, version, classifier, self.extension
            ),
            None => format!("{}-{}.{}", self.name, version, self.extension),
        }
    }
}

impl fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.classifier {
            Some(classifier) => write!(f, "{}-{}.{}", self.name, classifier, self.extension),
            None => write!(f, "{}.{}", self.name, self.extension),
        }
    }
}

/// Identity of a variant, used for deduplication
///
/// Two variants with equal attributes are still distinct when their
/// identities differ.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VariantIdentity {
    pub component: ComponentId,
    /// Configuration (or component-level variant) that owns the variant
    pub owner: String,
    pub name: String,
}

impl fmt::Display for VariantIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.owner == self.name {
            write!(f, "{} variant {}", self.component, self.name)
        } else {
            write!(f, "{} variant {}/{}", self.component, self.owner, self.name)
        }
    }
}

/// The unit that owns artifact descriptors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantMetadata {
    pub identity: VariantIdentity,
    pub attributes: AttributeSet,
    pub artifacts: Vec<ArtifactName>,
}

impl VariantMetadata {
    pub fn new(
        identity: VariantIdentity,
        attributes: AttributeSet,
        artifacts: Vec<ArtifactName>,
    ) -> Self {
        Self {
            identity,
            attributes,
            artifacts,
        }
    }

    pub fn name(&self) -> &str {
        &self.identity.name
    }
}

/// A capability- and attribute-bearing grouping of variants
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationMetadata {
    pub name: String,
    pub capabilities: CapabilitySet,
    pub attributes: AttributeSet,
    pub variants: Vec<Arc<VariantMetadata>>,
}

impl ConfigurationMetadata {
    pub fn new(
        name: impl Into<String>,
        capabilities: CapabilitySet,
        attributes: AttributeSet,
        variants: Vec<Arc<VariantMetadata>>,
    ) -> Self {
        Self {
            name: name.into(),
            capabilities,
            attributes,
            variants,
        }
    }
}

/// Read-only description of a resolved component
#[derive(Debug, Clone)]
pub struct ComponentMetadata {
    pub id: ComponentId,
    pub module_version_id: ModuleVersionId,
    pub sources: Arc<[ModuleSource]>,
    pub schema: Arc<AttributesSchema>,
    configurations: IndexMap<String, Arc<ConfigurationMetadata>>,
    variants_for_graph_traversal: Option<Vec<Arc<ConfigurationMetadata>>>,
}

impl ComponentMetadata {
    pub fn new(id: ComponentId, module_version_id: ModuleVersionId) -> Self {
        Self {
            id,
            module_version_id,
            sources: Arc::from(Vec::new()),
            schema: Arc::new(AttributesSchema::standard()),
            configurations: IndexMap::new(),
            variants_for_graph_traversal: None,
        }
    }

    pub fn with_sources(mut self, sources: Vec<ModuleSource>) -> Self {
        self.sources = Arc::from(sources);
        self
    }

    pub fn with_schema(mut self, schema: AttributesSchema) -> Self {
        self.schema = Arc::new(schema);
        self
    }

    pub fn with_configuration(mut self, configuration: ConfigurationMetadata) -> Self {
        self.configurations
            .insert(configuration.name.clone(), Arc::new(configuration));
        self
    }

    /// Expose component-level variants used instead of legacy configurations
    pub fn with_variants_for_graph_traversal(
        mut self,
        variants: Vec<ConfigurationMetadata>,
    ) -> Self {
        self.variants_for_graph_traversal = Some(variants.into_iter().map(Arc::new).collect());
        self
    }

    pub fn configuration(&self, name: &str) -> Option<&Arc<ConfigurationMetadata>> {
        self.configurations.get(name)
    }

    /// Look up a configuration, failing when it is not declared
    pub fn require_configuration(&self, name: &str) -> ResolveResult<&Arc<ConfigurationMetadata>> {
        self.configuration(name)
            .ok_or_else(|| ResolveError::UnknownConfiguration {
                component: self.id.to_string(),
                name: name.to_string(),
            })
    }

    /// Configurations in declaration order
    pub fn configurations(&self) -> impl Iterator<Item = &Arc<ConfigurationMetadata>> {
        self.configurations.values()
    }

    pub fn variants_for_graph_traversal(&self) -> Option<&[Arc<ConfigurationMetadata>]> {
        self.variants_for_graph_traversal.as_deref()
    }

    /// Find a configuration or graph-traversal variant by name
    pub fn find(&self, name: &str) -> Option<&Arc<ConfigurationMetadata>> {
        self.configuration(name).or_else(|| {
            self.variants_for_graph_traversal()
                .and_then(|variants| variants.iter().find(|v| v.name == name))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component() -> ComponentId {
        ComponentId::Module(ModuleVersionId::new("com.example", "lib", "1.0"))
    }

    #[test]
    fn artifact_file_name() {
        let jar = ArtifactName::new("lib", "jar");
        assert_eq!(jar.file_name("1.0"), "lib-1.0.jar");
        assert_eq!(
            jar.with_classifier("sources").file_name("1.0"),
            "lib-1.0-sources.jar"
        );
    }

    #[test]
    fn variant_identity_display() {
        let identity = VariantIdentity {
            component: component(),
            owner: "runtime".to_string(),
            name: "runtime".to_string(),
        };
        assert_eq!(identity.to_string(), "com.example:lib:1.0 variant runtime");
    }

    #[test]
    fn require_unknown_configuration_errors() {
        let meta = ComponentMetadata::new(
            component(),
            ModuleVersionId::new("com.example", "lib", "1.0"),
        );
        let err = meta.require_configuration("compile").unwrap_err();
        assert!(err.to_string().contains("'compile' not found"));
    }

    #[test]
    fn find_falls_back_to_graph_variants() {
        let meta = ComponentMetadata::new(
            component(),
            ModuleVersionId::new("com.example", "lib", "1.0"),
        )
        .with_variants_for_graph_traversal(vec![ConfigurationMetadata::new(
            "apiElements",
            CapabilitySet::empty(),
            AttributeSet::empty(),
            vec![],
        )]);
        assert!(meta.configuration("apiElements").is_none());
        assert!(meta.find("apiElements").is_some());
    }
}
