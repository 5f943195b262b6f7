//! Registry for looking up platform definitions by device type.

use std::collections::HashMap;

use super::definition::PlatformDefinition;
use super::vendors;
use crate::error::{PlatformError, Result};

/// Platform definitions keyed by name.
///
/// Built once at startup and shared read-only by the managed transport.
#[derive(Debug, Default, Clone)]
pub struct PlatformRegistry {
    platforms: HashMap<String, PlatformDefinition>,
}

impl PlatformRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            platforms: HashMap::new(),
        }
    }

    /// Registry pre-populated with the built-in platforms.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for platform in [
            vendors::generic::platform(),
            vendors::cisco_ios::platform(),
            vendors::huawei_vrp::platform(),
        ] {
            registry.platforms.insert(platform.name.clone(), platform);
        }
        registry
    }

    /// Register a platform definition.
    pub fn register(&mut self, platform: PlatformDefinition) -> Result<()> {
        if self.platforms.contains_key(&platform.name) {
            return Err(PlatformError::AlreadyRegistered {
                name: platform.name.clone(),
            }
            .into());
        }
        self.platforms.insert(platform.name.clone(), platform);
        Ok(())
    }

    /// Get a platform by name.
    pub fn get(&self, name: &str) -> Option<&PlatformDefinition> {
        self.platforms.get(name)
    }

    /// Get a platform by name or fail with `UnknownPlatform`.
    pub fn resolve(&self, name: &str) -> Result<&PlatformDefinition> {
        self.get(name).ok_or_else(|| {
            PlatformError::UnknownPlatform {
                name: name.to_string(),
            }
            .into()
        })
    }

    /// Check if a platform is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.platforms.contains_key(name)
    }

    /// Registered platform names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.platforms.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_builtins() {
        let registry = PlatformRegistry::with_builtins();
        assert_eq!(registry.names(), vec!["cisco_ios", "generic", "huawei_vrp"]);
        assert!(registry.contains("generic"));
    }

    #[test]
    fn test_register_duplicate() {
        let mut registry = PlatformRegistry::with_builtins();
        let err = registry
            .register(PlatformDefinition::new("cisco_ios"))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Platform(PlatformError::AlreadyRegistered { .. })
        ));

        registry.register(PlatformDefinition::new("lab_olt")).unwrap();
        assert!(registry.resolve("lab_olt").is_ok());
    }

    #[test]
    fn test_resolve_unknown() {
        let registry = PlatformRegistry::with_builtins();
        let err = registry.resolve("zte_zxan").unwrap_err();
        assert!(matches!(
            err,
            Error::Platform(PlatformError::UnknownPlatform { ref name }) if name == "zte_zxan"
        ));
    }
}
