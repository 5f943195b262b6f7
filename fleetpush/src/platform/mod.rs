//! Platform definitions for multi-vendor support.
//!
//! A platform describes one managed-device family: prompt patterns,
//! privilege levels (CLI modes) and how to move between them, failure
//! strings, and questions to answer automatically.

mod definition;
mod privilege_level;
mod registry;
pub mod vendors;

pub use definition::{AutoResponse, PlatformDefinition};
pub use privilege_level::PrivilegeLevel;
pub use registry::PlatformRegistry;
