//! Application context handed to plugins when the engine constructs them.
//!
//! A table carries at most one [`Owner`]. Plugin classes receive it in
//! [`PluginContext`](crate::PluginContext) and pull shared services out
//! of it (clocks, formatters, a host-provided logger) instead of reaching
//! for globals.

use crate::error::{TableError, TableResult};
use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Type-keyed service container.
#[derive(Clone, Default)]
pub struct Owner {
    services: HashMap<TypeId, (&'static str, Arc<dyn Any + Send + Sync>)>,
}

impl Owner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a service, replacing any earlier one of the same type.
    #[must_use]
    pub fn provide<T: Any + Send + Sync>(mut self, service: T) -> Self {
        self.services
            .insert(TypeId::of::<T>(), (type_name::<T>(), Arc::new(service)));
        self
    }

    pub fn lookup<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        let (_, service) = self.services.get(&TypeId::of::<T>())?;
        Arc::clone(service).downcast::<T>().ok()
    }

    /// Like [`lookup`](Self::lookup), but reports which plugin needed the service.
    pub fn require<T: Any + Send + Sync>(&self, plugin: &str) -> TableResult<Arc<T>> {
        self.lookup::<T>().ok_or_else(|| TableError::MissingService {
            plugin: plugin.to_string(),
            service: type_name::<T>().to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl fmt::Debug for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.services.values().map(|(name, _)| *name).collect();
        names.sort_unstable();
        f.debug_struct("Owner").field("services", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Clock(u64);

    #[test]
    fn lookup_returns_provided_service() {
        let owner = Owner::new().provide(Clock(42));
        assert_eq!(owner.lookup::<Clock>().map(|c| c.0), Some(42));
        assert!(owner.lookup::<String>().is_none());
    }

    #[test]
    fn provide_replaces_same_type() {
        let owner = Owner::new().provide(Clock(1)).provide(Clock(2));
        assert_eq!(owner.len(), 1);
        assert_eq!(owner.lookup::<Clock>().map(|c| c.0), Some(2));
    }

    #[test]
    fn require_names_plugin_and_service() {
        let err = Owner::new().require::<Clock>("sticky-columns").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("sticky-columns"));
        assert!(message.contains("Clock"));
    }
}
