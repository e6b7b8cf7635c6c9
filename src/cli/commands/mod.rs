//! CLI command implementations

pub mod config;
pub mod resolve;
pub mod select;

pub use config::execute as config;
pub use resolve::execute as resolve;
pub use select::execute as select;
