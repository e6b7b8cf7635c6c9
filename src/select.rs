//! Variant selection
//!
//! Maps a requested configuration of a component onto the variants that
//! supply its artifacts. Selection is pure: it reads immutable metadata and
//! returns a fresh [`VariantSet`] owned by the caller.
//!
//! When a component exposes component-level variants for graph traversal,
//! only those whose capability set equals the requested configuration's
//! capability set contribute. Otherwise the configuration's own variants are
//! used as is.

use crate::artifact::ArtifactSet;
use crate::exclude::ExcludeSpec;
use crate::model::{
    AttributeSet, ComponentMetadata, ConfigurationMetadata, VariantIdentity, VariantMetadata,
};
use crate::session::ResolutionSession;
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::debug;

/// Insertion-ordered set of variants, deduplicated by identity
#[derive(Debug, Clone, Default)]
pub struct VariantSet {
    variants: IndexMap<VariantIdentity, Arc<VariantMetadata>>,
}

impl VariantSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variant; returns false if one with the same identity is present
    pub fn insert(&mut self, variant: Arc<VariantMetadata>) -> bool {
        if self.variants.contains_key(&variant.identity) {
            return false;
        }
        self.variants.insert(variant.identity.clone(), variant);
        true
    }

    pub fn extend<'a>(&mut self, variants: impl IntoIterator<Item = &'a Arc<VariantMetadata>>) {
        for variant in variants {
            self.insert(Arc::clone(variant));
        }
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    pub fn contains(&self, identity: &VariantIdentity) -> bool {
        self.variants.contains_key(identity)
    }

    /// Variants in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<VariantMetadata>> {
        self.variants.values()
    }

    pub fn into_vec(self) -> Vec<Arc<VariantMetadata>> {
        self.variants.into_values().collect()
    }
}

/// Select the variants supplying artifacts for `configuration`
pub fn select_variants(
    component: &ComponentMetadata,
    configuration: &ConfigurationMetadata,
) -> VariantSet {
    let mut selected = VariantSet::new();

    match component.variants_for_graph_traversal() {
        Some(graph_variants) => {
            for candidate in graph_variants {
                if candidate.capabilities == configuration.capabilities {
                    selected.extend(&candidate.variants);
                }
            }
            if selected.is_empty() {
                debug!(
                    "No variant of {} provides {}",
                    component.id, configuration.capabilities
                );
            }
        }
        None => selected.extend(&configuration.variants),
    }

    selected
}

/// Strategy producing the artifact set of one component configuration
pub trait ComponentArtifacts: Send + Sync {
    fn artifacts_for(
        &self,
        component: &ComponentMetadata,
        configuration: &ConfigurationMetadata,
        exclusions: &ExcludeSpec,
        overrides: &AttributeSet,
        session: &ResolutionSession,
    ) -> ArtifactSet;
}

/// Uses the artifacts attached to each selected variant
#[derive(Debug, Clone, Copy, Default)]
pub struct AllVariantsComponentArtifacts;

impl ComponentArtifacts for AllVariantsComponentArtifacts {
    fn artifacts_for(
        &self,
        component: &ComponentMetadata,
        configuration: &ConfigurationMetadata,
        exclusions: &ExcludeSpec,
        overrides: &AttributeSet,
        session: &ResolutionSession,
    ) -> ArtifactSet {
        let variants = select_variants(component, configuration);
        ArtifactSet::from_variants(
            component,
            variants,
            exclusions.clone(),
            overrides.clone(),
            session,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{ArtifactTypeRegistry, FileSystemResolver};
    use crate::model::{
        ArtifactName, Capability, CapabilitySet, ComponentId, ModuleVersionId,
    };

    fn id() -> ComponentId {
        ComponentId::Module(ModuleVersionId::new("com.example", "lib", "1.0"))
    }

    fn variant(owner: &str, name: &str, attributes: AttributeSet) -> Arc<VariantMetadata> {
        Arc::new(VariantMetadata::new(
            VariantIdentity {
                component: id(),
                owner: owner.to_string(),
                name: name.to_string(),
            },
            attributes,
            vec![ArtifactName::new(name, "jar")],
        ))
    }

    fn capabilities(names: &[&str]) -> CapabilitySet {
        names
            .iter()
            .map(|n| Capability::new("com.example", *n, "1.0"))
            .collect()
    }

    fn entry(
        name: &str,
        caps: &[&str],
        variants: Vec<Arc<VariantMetadata>>,
    ) -> ConfigurationMetadata {
        ConfigurationMetadata::new(name, capabilities(caps), AttributeSet::empty(), variants)
    }

    fn request(caps: &[&str]) -> ConfigurationMetadata {
        entry("requested", caps, vec![variant("requested", "own", AttributeSet::empty())])
    }

    fn names(set: &VariantSet) -> Vec<String> {
        set.iter().map(|v| v.name().to_string()).collect()
    }

    fn component() -> ComponentMetadata {
        ComponentMetadata::new(id(), ModuleVersionId::new("com.example", "lib", "1.0"))
    }

    #[test]
    fn legacy_configuration_uses_own_variants() {
        let selected = select_variants(&component(), &request(&["lib"]));
        assert_eq!(names(&selected), vec!["own"]);
    }

    #[test]
    fn graph_variants_filtered_by_exact_capabilities() {
        let component = component().with_variants_for_graph_traversal(vec![
            entry("a", &["A"], vec![variant("a", "va", AttributeSet::empty())]),
            entry("ab", &["A", "B"], vec![variant("ab", "vab", AttributeSet::empty())]),
        ]);

        let selected = select_variants(&component, &request(&["A"]));
        assert_eq!(names(&selected), vec!["va"]);
    }

    #[test]
    fn test_fixtures_scenario() {
        let v1 = variant("lib", "v1", AttributeSet::empty());
        let v2 = variant("fixtures", "v2", AttributeSet::empty());
        let component = component().with_variants_for_graph_traversal(vec![
            entry("lib", &["lib"], vec![v1]),
            entry("fixtures", &["lib-test-fixtures"], vec![v2]),
        ]);

        assert_eq!(names(&select_variants(&component, &request(&["lib"]))), vec!["v1"]);
        assert_eq!(
            names(&select_variants(&component, &request(&["lib-test-fixtures"]))),
            vec!["v2"]
        );
        assert!(select_variants(&component, &request(&["other"])).is_empty());
    }

    #[test]
    fn attribute_equal_variants_are_not_merged() {
        let attrs = AttributeSet::of([("org.gradle.usage", "java-runtime")]);
        let component = component().with_variants_for_graph_traversal(vec![entry(
            "runtime",
            &["lib"],
            vec![variant("runtime", "x", attrs.clone()), variant("runtime", "y", attrs)],
        )]);

        let selected = select_variants(&component, &request(&["lib"]));
        assert_eq!(names(&selected), vec!["x", "y"]);
    }

    #[test]
    fn shared_variants_deduplicated_in_first_seen_order() {
        let shared = variant("shared", "shared", AttributeSet::empty());
        let component = component().with_variants_for_graph_traversal(vec![
            entry(
                "one",
                &["lib"],
                vec![variant("one", "first", AttributeSet::empty()), Arc::clone(&shared)],
            ),
            entry(
                "two",
                &["lib"],
                vec![Arc::clone(&shared), variant("two", "last", AttributeSet::empty())],
            ),
        ]);

        let requested = request(&["lib"]);
        let first = names(&select_variants(&component, &requested));
        let second = names(&select_variants(&component, &requested));
        assert_eq!(first, vec!["first", "shared", "last"]);
        assert_eq!(first, second);
    }

    #[test]
    fn all_variants_strategy_builds_lazy_set() {
        let component = component().with_variants_for_graph_traversal(vec![entry(
            "runtime",
            &["lib"],
            vec![variant("runtime", "runtime", AttributeSet::empty())],
        )]);
        let session = ResolutionSession::new(
            Arc::new(FileSystemResolver::new("/nonexistent")),
            ArtifactTypeRegistry::standard(),
        );

        let set = AllVariantsComponentArtifacts.artifacts_for(
            &component,
            &request(&["lib"]),
            &ExcludeSpec::Nothing,
            &AttributeSet::empty(),
            &session,
        );
        assert_eq!(set.variants().len(), 1);
        assert!(session.artifact_cache().is_empty());
    }
}
