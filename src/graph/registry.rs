use std::collections::HashMap;
use std::sync::Arc;

use super::ConfigError;
use crate::backend::Adapter;

/// An explicit, program-startup-time table of named adapters (§9 "optional
/// backends" design note). Replaces the source's load-time driver probing
/// and sentinel substitution: a node built against a name this registry
/// doesn't know about fails loudly with [`ConfigError`], rather than
/// silently wiring in a do-nothing adapter.
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: HashMap<String, Arc<dyn Adapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        AdapterRegistry {
            adapters: HashMap::new(),
        }
    }

    /// Registers an adapter under its own [`Adapter::name`]. Registering a
    /// second adapter under a name already taken replaces the first.
    pub fn register(&mut self, adapter: Arc<dyn Adapter>) {
        self.adapters.insert(adapter.name().to_string(), adapter);
    }

    /// Looks up a registered adapter by name.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Adapter>, ConfigError> {
        self.adapters
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::UnregisteredAdapter(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.adapters.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryAdapter;
    use crate::converter::RelationalConverter;

    #[test]
    fn unregistered_name_is_configuration_error() {
        let registry = AdapterRegistry::new();
        let err = registry.get("sqlite").unwrap_err();
        assert!(matches!(err, ConfigError::UnregisteredAdapter(name) if name == "sqlite"));
    }

    #[test]
    fn registered_adapter_is_found_by_name() {
        let mut registry = AdapterRegistry::new();
        registry.register(Arc::new(MemoryAdapter::new("sqlite", RelationalConverter)));
        assert!(registry.contains("sqlite"));
        assert_eq!(registry.get("sqlite").unwrap().name(), "sqlite");
    }
}
