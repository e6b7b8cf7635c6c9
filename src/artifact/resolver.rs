//! Artifact resolver interface and the local repository implementation
//!
//! A resolver turns one artifact of one variant into a file on disk. It may
//! be slow and it may fail; callers route every request through the
//! session's single-flight cache so each artifact is resolved at most once.

use crate::error::{ResolveError, ResolveResult};
use crate::model::{ArtifactName, ComponentId, ModuleSource, ModuleVersionId, VariantIdentity};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Everything a resolver may need to locate one artifact
#[derive(Debug, Clone, Copy)]
pub struct ArtifactRequest<'a> {
    pub component: &'a ComponentId,
    pub module_version: &'a ModuleVersionId,
    pub variant: &'a VariantIdentity,
    pub artifact: &'a ArtifactName,
    pub sources: &'a [ModuleSource],
}

impl ArtifactRequest<'_> {
    /// `group:module:version:file` display name
    pub fn display_name(&self) -> String {
        format!(
            "{}:{}",
            self.module_version,
            self.artifact.file_name(&self.module_version.version)
        )
    }
}

/// Locates or downloads artifact files
#[async_trait]
pub trait ArtifactResolver: Send + Sync {
    /// Resolve one artifact to a local file
    async fn resolve(&self, request: &ArtifactRequest<'_>) -> ResolveResult<PathBuf>;

    /// Get the human-readable resolver name for display
    fn resolver_name(&self) -> &'static str;
}

/// Resolves artifacts from a local Maven-style repository directory
///
/// Layout: `{root}/{group with dots as dirs}/{module}/{version}/{file}`.
#[derive(Debug, Clone)]
pub struct FileSystemResolver {
    root: PathBuf,
}

impl FileSystemResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where the artifact is expected to live
    pub fn artifact_path(
        &self,
        module_version: &ModuleVersionId,
        artifact: &ArtifactName,
    ) -> PathBuf {
        let mut path = self.root.clone();
        for segment in module_version.group.split('.') {
            path.push(segment);
        }
        path.push(&module_version.name);
        path.push(&module_version.version);
        path.push(artifact.file_name(&module_version.version));
        path
    }
}

#[async_trait]
impl ArtifactResolver for FileSystemResolver {
    async fn resolve(&self, request: &ArtifactRequest<'_>) -> ResolveResult<PathBuf> {
        let path = self.artifact_path(request.module_version, request.artifact);
        debug!("Looking for {} at {}", request.display_name(), path.display());

        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(path),
            Ok(_) => Err(ResolveError::resolution(
                request.display_name(),
                format!("{} is not a file", path.display()),
            )),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ResolveError::ArtifactNotFound {
                    artifact: request.display_name(),
                    searched: path.display().to_string(),
                })
            }
            Err(e) => Err(ResolveError::io(
                format!("inspecting {}", path.display()),
                e,
            )),
        }
    }

    fn resolver_name(&self) -> &'static str {
        "filesystem"
    }
}

/// SHA-256 of a file's contents as lowercase hex
pub async fn sha256_file(path: &Path) -> ResolveResult<String> {
    let contents = tokio::fs::read(path)
        .await
        .map_err(|e| ResolveError::io(format!("reading {}", path.display()), e))?;

    let mut hasher = Sha256::new();
    hasher.update(&contents);
    Ok(hex::encode(hasher.finalize()))
}
