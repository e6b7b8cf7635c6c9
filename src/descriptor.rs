//! TOML component descriptors
//!
//! A small, self-contained description format for one component, used by
//! the `vres` CLI and by tests to feed the resolution core. It is not a
//! parser for any published metadata format.
//!
//! ```toml
//! [component]
//! group = "com.example"
//! module = "lib"
//! version = "1.0"
//!
//! [configurations.runtime]
//! attributes = { "org.gradle.usage" = "java-runtime" }
//! artifacts = [{ name = "lib", extension = "jar" }]
//!
//! [[variants]]
//! name = "runtimeElements"
//! capabilities = ["com.example:lib:1.0"]
//! artifacts = [{ name = "lib", extension = "jar" }]
//! ```
//!
//! Configurations and graph-traversal variants without explicit
//! `capabilities` provide the component's own `group:module:version`.

use crate::error::{ResolveError, ResolveResult};
use crate::model::{
    ArtifactName, AttributeSet, AttributesSchema, Capability, CapabilitySet, ComponentId,
    ComponentMetadata, ConfigurationMetadata, ModuleSource, ModuleVersionId, RawValue,
    VariantIdentity, VariantMetadata,
};
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DescriptorFile {
    component: ComponentSection,
    #[serde(default)]
    sources: Vec<ModuleSource>,
    #[serde(default)]
    configurations: IndexMap<String, ConfigurationEntry>,
    #[serde(default)]
    variants: Option<Vec<GraphVariantEntry>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ComponentSection {
    group: String,
    module: String,
    version: String,
    /// Build path when the component is produced by a local project
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigurationEntry {
    capabilities: Vec<String>,
    attributes: BTreeMap<String, RawValue>,
    artifacts: Vec<ArtifactName>,
    variants: Vec<VariantEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GraphVariantEntry {
    name: String,
    #[serde(default)]
    capabilities: Vec<String>,
    #[serde(default)]
    attributes: BTreeMap<String, RawValue>,
    #[serde(default)]
    artifacts: Vec<ArtifactName>,
    #[serde(default)]
    variants: Vec<VariantEntry>,
}

impl GraphVariantEntry {
    fn split(self) -> (String, ConfigurationEntry) {
        let entry = ConfigurationEntry {
            capabilities: self.capabilities,
            attributes: self.attributes,
            artifacts: self.artifacts,
            variants: self.variants,
        };
        (self.name, entry)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct VariantEntry {
    name: String,
    #[serde(default)]
    attributes: BTreeMap<String, RawValue>,
    #[serde(default)]
    artifacts: Vec<ArtifactName>,
}

/// Load a component descriptor from disk
pub async fn load(path: &Path) -> ResolveResult<ComponentMetadata> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ResolveError::io(format!("reading descriptor {}", path.display()), e))?;
    parse(&content, path)
}

/// Parse a component descriptor; `path` is used for error messages
pub fn parse(content: &str, path: &Path) -> ResolveResult<ComponentMetadata> {
    let file: DescriptorFile =
        toml::from_str(content).map_err(|e| invalid(path, e.to_string()))?;
    let schema = AttributesSchema::standard();

    let mvid = ModuleVersionId::new(
        file.component.group,
        file.component.module,
        file.component.version,
    );
    let id = match file.component.project {
        Some(project) => ComponentId::Project { path: project },
        None => ComponentId::Module(mvid.clone()),
    };
    let builder = Builder {
        path,
        schema: &schema,
        id: &id,
        mvid: &mvid,
    };

    let mut component =
        ComponentMetadata::new(id.clone(), mvid.clone()).with_sources(file.sources);
    for (name, entry) in file.configurations {
        component = component.with_configuration(builder.configuration(&name, entry)?);
    }
    if let Some(variants) = file.variants {
        let mut seen = HashSet::new();
        let variants = variants
            .into_iter()
            .map(|v| {
                let (name, entry) = v.split();
                if !seen.insert(name.clone()) {
                    return Err(invalid(path, format!("variant '{}' is declared twice", name)));
                }
                builder.configuration(&name, entry)
            })
            .collect::<ResolveResult<Vec<_>>>()?;
        component = component.with_variants_for_graph_traversal(variants);
    }

    debug!(
        "Loaded descriptor for {} ({} configurations)",
        component.id,
        component.configurations().count()
    );
    Ok(component.with_schema(schema))
}

struct Builder<'a> {
    path: &'a Path,
    schema: &'a AttributesSchema,
    id: &'a ComponentId,
    mvid: &'a ModuleVersionId,
}

impl Builder<'_> {
    fn configuration(
        &self,
        name: &str,
        entry: ConfigurationEntry,
    ) -> ResolveResult<ConfigurationMetadata> {
        let capabilities = if entry.capabilities.is_empty() {
            CapabilitySet::new([Capability::new(
                self.mvid.group.clone(),
                self.mvid.name.clone(),
                self.mvid.version.clone(),
            )])
        } else {
            entry
                .capabilities
                .iter()
                .map(|c| self.capability(c))
                .collect::<ResolveResult<CapabilitySet>>()?
        };
        let attributes = self.schema.attributes(entry.attributes)?;

        let variants = if entry.variants.is_empty() {
            vec![self.variant(name, name, attributes.clone(), entry.artifacts)]
        } else {
            let mut seen = HashSet::new();
            if let Some(duplicate) = entry.variants.iter().find(|v| !seen.insert(v.name.as_str())) {
                return Err(invalid(
                    self.path,
                    format!("'{}' declares variant '{}' twice", name, duplicate.name),
                ));
            }
            if !entry.artifacts.is_empty() {
                return Err(invalid(
                    self.path,
                    format!("'{}' declares both artifacts and variants", name),
                ));
            }
            entry
                .variants
                .into_iter()
                .map(|v| -> ResolveResult<Arc<VariantMetadata>> {
                    let own = self.schema.attributes(v.attributes)?;
                    Ok(self.variant(name, &v.name, attributes.overlay(&own), v.artifacts))
                })
                .collect::<ResolveResult<Vec<_>>>()?
        };

        Ok(ConfigurationMetadata::new(name, capabilities, attributes, variants))
    }

    fn variant(
        &self,
        owner: &str,
        name: &str,
        attributes: AttributeSet,
        artifacts: Vec<ArtifactName>,
    ) -> Arc<VariantMetadata> {
        Arc::new(VariantMetadata::new(
            VariantIdentity {
                component: self.id.clone(),
                owner: owner.to_string(),
                name: name.to_string(),
            },
            attributes,
            artifacts,
        ))
    }

    fn capability(&self, notation: &str) -> ResolveResult<Capability> {
        match notation.split(':').collect::<Vec<_>>().as_slice() {
            [group, name] if !group.is_empty() && !name.is_empty() => {
                Ok(Capability::unversioned(*group, *name))
            }
            [group, name, version] if !group.is_empty() && !name.is_empty() => {
                Ok(Capability::new(*group, *name, *version))
            }
            _ => Err(invalid(
                self.path,
                format!("capability '{}' is not group:name[:version]", notation),
            )),
        }
    }
}

fn invalid(path: &Path, reason: impl Into<String>) -> ResolveError {
    ResolveError::DescriptorInvalid {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}
