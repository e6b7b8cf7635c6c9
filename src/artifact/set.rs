//! Lazy artifact sets
//!
//! An [`ArtifactSet`] captures the selected variants of one component
//! together with exclusions and attribute overrides. Building one does no
//! work; the resolver is only called when the set is consumed through
//! [`ArtifactSet::resolve`], and then only for artifacts that survive
//! exclusion and are not already in the session's artifact cache.

use crate::artifact::registry::ArtifactTypeRegistry;
use crate::artifact::resolver::{sha256_file, ArtifactRequest, ArtifactResolver};
use crate::error::{ResolveError, ResolveResult};
use crate::exclude::ExcludeSpec;
use crate::model::{
    ArtifactName, AttributeSet, AttributesSchema, ComponentId, ComponentMetadata, ModuleSource,
    ModuleVersionId, VariantIdentity, VariantMetadata,
};
use crate::select::VariantSet;
use crate::session::{ArtifactCache, ResolutionSession};
use futures_util::future::join_all;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::debug;

/// Identity of one artifact of one variant; the artifact cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ArtifactIdentity {
    pub variant: VariantIdentity,
    pub artifact: ArtifactName,
}

impl fmt::Display for ArtifactIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}/{}) {}",
            self.variant.component, self.variant.owner, self.variant.name, self.artifact
        )
    }
}

/// A located artifact file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedFile {
    pub path: PathBuf,
    pub sha256: Option<String>,
}

/// An artifact chosen for resolution, with its effective attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedArtifact {
    pub identity: ArtifactIdentity,
    pub attributes: AttributeSet,
}

/// A variant after exclusion filtering and attribute overrides
#[derive(Debug, Clone)]
pub struct SelectedVariant {
    pub variant: Arc<VariantMetadata>,
    pub attributes: AttributeSet,
    pub artifacts: Vec<SelectedArtifact>,
}

/// Outcome of resolving one artifact
///
/// Failures stay attached to their artifact; other artifacts of the same
/// set resolve independently.
#[derive(Debug, Clone)]
pub struct ResolvedArtifact {
    pub identity: ArtifactIdentity,
    pub attributes: AttributeSet,
    pub file: ResolveResult<ResolvedFile>,
}

impl ResolvedArtifact {
    pub fn path(&self) -> Option<&Path> {
        self.file.as_ref().ok().map(|f| f.path.as_path())
    }
}

/// Resolved artifacts of one variant
#[derive(Debug, Clone)]
pub struct ResolvedVariant {
    pub identity: VariantIdentity,
    pub attributes: AttributeSet,
    pub artifacts: Vec<ResolvedArtifact>,
}

/// Result of consuming an [`ArtifactSet`]
#[derive(Debug, Clone, Default)]
pub struct ResolvedArtifactSet {
    pub variants: Vec<ResolvedVariant>,
}

impl ResolvedArtifactSet {
    /// All artifacts, in variant order
    pub fn artifacts(&self) -> impl Iterator<Item = &ResolvedArtifact> {
        self.variants.iter().flat_map(|v| v.artifacts.iter())
    }

    /// Paths of successfully resolved artifacts
    pub fn files(&self) -> Vec<&Path> {
        self.artifacts().filter_map(ResolvedArtifact::path).collect()
    }

    /// Artifacts that failed, with their errors
    pub fn failures(&self) -> Vec<(&ArtifactIdentity, &ResolveError)> {
        self.artifacts()
            .filter_map(|a| a.file.as_ref().err().map(|e| (&a.identity, e)))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts().next().is_none()
    }
}

/// Lazily resolved artifacts of a selected set of variants
pub struct ArtifactSet {
    component_id: ComponentId,
    module_version_id: ModuleVersionId,
    sources: Arc<[ModuleSource]>,
    exclusions: ExcludeSpec,
    variants: Vec<Arc<VariantMetadata>>,
    schema: Arc<AttributesSchema>,
    overrides: AttributeSet,
    resolver: Arc<dyn ArtifactResolver>,
    cache: Arc<ArtifactCache>,
    type_registry: Arc<ArtifactTypeRegistry>,
    limiter: Arc<Semaphore>,
    checksums: bool,
}

impl ArtifactSet {
    /// Capture the inputs for a later resolution; performs no resolution
    pub fn from_variants(
        component: &ComponentMetadata,
        variants: VariantSet,
        exclusions: ExcludeSpec,
        overrides: AttributeSet,
        session: &ResolutionSession,
    ) -> Self {
        Self {
            component_id: component.id.clone(),
            module_version_id: component.module_version_id.clone(),
            sources: Arc::clone(&component.sources),
            exclusions,
            variants: variants.into_vec(),
            schema: Arc::clone(&component.schema),
            overrides,
            resolver: Arc::clone(session.resolver()),
            cache: Arc::clone(session.artifact_cache()),
            type_registry: Arc::clone(session.type_registry()),
            limiter: Arc::clone(session.limiter()),
            checksums: session.options().checksums,
        }
    }

    pub fn component_id(&self) -> &ComponentId {
        &self.component_id
    }

    pub fn variants(&self) -> &[Arc<VariantMetadata>] {
        &self.variants
    }

    pub fn exclusions(&self) -> &ExcludeSpec {
        &self.exclusions
    }

    pub fn overrides(&self) -> &AttributeSet {
        &self.overrides
    }

    pub fn schema(&self) -> &AttributesSchema {
        &self.schema
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// Apply exclusions, type defaults and overrides without resolving
    pub fn select(&self) -> Vec<SelectedVariant> {
        let module = self.module_version_id.module();

        self.variants
            .iter()
            .map(|variant| {
                let artifacts = variant
                    .artifacts
                    .iter()
                    .filter(|artifact| {
                        let excluded = self.exclusions.excludes_artifact(&module, artifact);
                        if excluded {
                            debug!("Excluding {} from {}", artifact, variant.identity);
                        }
                        !excluded
                    })
                    .map(|artifact| SelectedArtifact {
                        identity: ArtifactIdentity {
                            variant: variant.identity.clone(),
                            artifact: artifact.clone(),
                        },
                        attributes: variant
                            .attributes
                            .fill_missing(&self.type_registry.attributes_for(&artifact.extension))
                            .overlay(&self.overrides),
                    })
                    .collect();

                SelectedVariant {
                    variant: Arc::clone(variant),
                    attributes: variant.attributes.overlay(&self.overrides),
                    artifacts,
                }
            })
            .collect()
    }

    /// Consume the set, resolving every selected artifact
    ///
    /// Artifacts already resolved in this session are reused. Concurrent
    /// consumers of the same artifact share one resolver call.
    pub async fn resolve(&self) -> ResolvedArtifactSet {
        let selected = self.select();
        debug!(
            "Resolving {} variant(s) of {}",
            selected.len(),
            self.component_id
        );

        let variants = join_all(selected.into_iter().map(|variant| async move {
            let artifacts = join_all(
                variant
                    .artifacts
                    .into_iter()
                    .map(|artifact| self.resolve_artifact(artifact)),
            )
            .await;
            ResolvedVariant {
                identity: variant.variant.identity.clone(),
                attributes: variant.attributes,
                artifacts,
            }
        }))
        .await;

        ResolvedArtifactSet { variants }
    }

    async fn resolve_artifact(&self, selected: SelectedArtifact) -> ResolvedArtifact {
        let file = self
            .cache
            .get(&selected.identity, || self.resolve_file(&selected.identity))
            .await;

        if let Err(e) = &file {
            debug!("Failed to resolve {}: {}", selected.identity, e);
        }

        ResolvedArtifact {
            identity: selected.identity,
            attributes: selected.attributes,
            file,
        }
    }

    async fn resolve_file(&self, identity: &ArtifactIdentity) -> ResolveResult<ResolvedFile> {
        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|_| ResolveError::ComputationAbandoned {
                key: identity.to_string(),
            })?;
        // The session may have been aborted while this call waited for a permit
        self.cache.check_aborted()?;

        let request = ArtifactRequest {
            component: &self.component_id,
            module_version: &self.module_version_id,
            variant: &identity.variant,
            artifact: &identity.artifact,
            sources: &self.sources,
        };
        let path = self.resolver.resolve(&request).await?;

        let sha256 = if self.checksums {
            Some(sha256_file(&path).await?)
        } else {
            None
        };
        Ok(ResolvedFile { path, sha256 })
    }
}

impl fmt::Debug for ArtifactSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactSet")
            .field("component", &self.component_id)
            .field("variants", &self.variants.len())
            .field("exclusions", &self.exclusions)
            .field("overrides", &self.overrides)
            .finish_non_exhaustive()
    }
}
