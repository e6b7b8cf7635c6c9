//! Resolution session
//!
//! A session owns the collaborators and caches shared by every artifact set
//! created during one resolution: the artifact resolver, the artifact type
//! registry and the single-flight artifact cache. Dropping the session
//! discards everything it memoized.

use crate::artifact::{
    ArtifactIdentity, ArtifactResolver, ArtifactTypeRegistry, FileSystemResolver, ResolvedFile,
};
use crate::config::Config;
use crate::error::ResolveError;
use crate::memo::CalculatedValueCache;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{info, warn};
use uuid::Uuid;

/// Keyed cache of resolved artifact files
pub type ArtifactCache = CalculatedValueCache<ArtifactIdentity, ResolvedFile>;

/// Tunables for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Upper bound on resolver calls running at the same time
    pub max_concurrent_artifacts: usize,

    /// Compute SHA-256 of every resolved file
    pub checksums: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            max_concurrent_artifacts: 8,
            checksums: false,
        }
    }
}

/// State shared by all artifact sets of one resolution
pub struct ResolutionSession {
    id: Uuid,
    resolver: Arc<dyn ArtifactResolver>,
    type_registry: Arc<ArtifactTypeRegistry>,
    artifacts: Arc<ArtifactCache>,
    limiter: Arc<Semaphore>,
    options: SessionOptions,
}

impl ResolutionSession {
    /// Create a session with default options
    pub fn new(resolver: Arc<dyn ArtifactResolver>, type_registry: ArtifactTypeRegistry) -> Self {
        Self::with_options(resolver, type_registry, SessionOptions::default())
    }

    pub fn with_options(
        resolver: Arc<dyn ArtifactResolver>,
        type_registry: ArtifactTypeRegistry,
        options: SessionOptions,
    ) -> Self {
        let permits = options.max_concurrent_artifacts.max(1);
        Self {
            id: Uuid::new_v4(),
            resolver,
            type_registry: Arc::new(type_registry),
            artifacts: Arc::new(CalculatedValueCache::new("artifact")),
            limiter: Arc::new(Semaphore::new(permits)),
            options,
        }
    }

    /// Session backed by the configured local repository
    pub fn from_config(config: &Config) -> Self {
        let resolver = FileSystemResolver::new(config.repository.root.clone());
        let registry =
            ArtifactTypeRegistry::standard().with_configured(&config.artifact_types);
        let options = SessionOptions {
            max_concurrent_artifacts: config.resolution.max_concurrent_artifacts,
            checksums: config.resolution.checksums,
        };
        info!(
            "Resolving from {} repository at {}",
            resolver.resolver_name(),
            config.repository.root.display()
        );
        Self::with_options(Arc::new(resolver), registry, options)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn options(&self) -> SessionOptions {
        self.options
    }

    pub fn resolver(&self) -> &Arc<dyn ArtifactResolver> {
        &self.resolver
    }

    pub fn type_registry(&self) -> &Arc<ArtifactTypeRegistry> {
        &self.type_registry
    }

    pub fn artifact_cache(&self) -> &Arc<ArtifactCache> {
        &self.artifacts
    }

    pub(crate) fn limiter(&self) -> &Arc<Semaphore> {
        &self.limiter
    }

    /// Abort the session after a fatal error elsewhere in the graph
    ///
    /// In-flight resolutions finish; artifacts not yet requested fail with
    /// `cause` instead of reaching the resolver.
    pub fn abort(&self, cause: ResolveError) {
        if self.artifacts.abort(cause.clone()) {
            warn!("Resolution session {} aborted: {}", self.id, cause);
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.artifacts.aborted().is_some()
    }
}

impl fmt::Debug for ResolutionSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolutionSession")
            .field("id", &self.id)
            .field("resolver", &self.resolver.resolver_name())
            .field("options", &self.options)
            .field("artifacts", &self.artifacts.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_config_uses_repository_root() {
        let mut config = Config::default();
        config.repository.root = "/tmp/repo".into();
        config.resolution.max_concurrent_artifacts = 0;

        let session = ResolutionSession::from_config(&config);
        assert_eq!(session.resolver().resolver_name(), "filesystem");
        assert_eq!(session.limiter().available_permits(), 1);
        assert!(!session.is_aborted());
    }

    #[test]
    fn abort_keeps_first_cause() {
        let config = Config::default();
        let session = ResolutionSession::from_config(&config);
        session.abort(ResolveError::User("first".to_string()));
        session.abort(ResolveError::User("second".to_string()));
        assert_eq!(
            session.artifact_cache().aborted().map(ToString::to_string),
            Some("first".to_string())
        );
    }
}
