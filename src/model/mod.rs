//! Component, variant, capability and attribute model
//!
//! All types here are immutable values once constructed and are shared
//! between resolution workers without locking.

pub mod attributes;
pub mod capability;
pub mod component;
pub mod sanitize;

pub use attributes::{well_known, AttributeSet, AttributesSchema};
pub use capability::{Capability, CapabilitySet};
pub use component::{
    ArtifactName, ComponentId, ComponentMetadata, ConfigurationMetadata, ModuleId,
    ModuleSource, ModuleVersionId, VariantIdentity, VariantMetadata,
};
pub use sanitize::{AttributeValue, EnumType, RawValue, ValueSanitizer, ValueType};
