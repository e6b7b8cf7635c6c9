//! variant-resolve - variant selection and lazy artifact resolution
//!
//! Given a component's metadata and a requested configuration, selects the
//! variants that supply its artifacts and exposes them as a lazily resolved
//! artifact set. Resolutions are memoized per session so concurrent
//! consumers of the same artifact share one resolver call.

pub mod artifact;
pub mod cli;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod exclude;
pub mod memo;
pub mod model;
pub mod select;
pub mod session;
pub mod ui;

pub use error::{ResolveError, ResolveResult};
