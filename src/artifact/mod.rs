//! Artifact sets, resolvers and the artifact type registry
//!
//! Selected variants become an [`ArtifactSet`]: a lazy view that resolves
//! files only when consumed. Resolution goes through the session's
//! single-flight cache keyed by [`ArtifactIdentity`].

pub mod registry;
pub mod resolver;
pub mod set;

pub use registry::ArtifactTypeRegistry;
pub use resolver::{sha256_file, ArtifactRequest, ArtifactResolver, FileSystemResolver};
pub use set::{
    ArtifactIdentity, ArtifactSet, ResolvedArtifact, ResolvedArtifactSet, ResolvedFile,
    ResolvedVariant, SelectedArtifact, SelectedVariant,
};
