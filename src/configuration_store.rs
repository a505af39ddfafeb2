//! A thread-safe in-memory storage for the currently active configuration.
//! [`ConfigurationStore`] provides concurrent access for readers (decision calls) and writers
//! (the periodic configuration refresh).
use std::sync::{Arc, RwLock};

use crate::Configuration;

/// `ConfigurationStore` provides a thread-safe (`Sync`) storage for the environment configuration
/// that allows concurrent access for readers and writers.
///
/// `Configuration` itself is always immutable and can only be replaced completely. Readers get a
/// snapshot (`Arc`) that is unaffected by later refreshes, so one decision call sees one
/// consistent configuration throughout.
#[derive(Default)]
pub struct ConfigurationStore {
    configuration: RwLock<Option<Arc<Configuration>>>,
}

impl ConfigurationStore {
    /// Create a new empty configuration store.
    pub fn new() -> Self {
        ConfigurationStore::default()
    }

    /// Get the currently-active configuration. Returns `None` if configuration hasn't been
    /// fetched/stored yet.
    pub fn get_configuration(&self) -> Option<Arc<Configuration>> {
        // self.configuration.read() should always return Ok(). Err() is possible only if the lock
        // is poisoned (writer panicked while holding the lock), which should never happen.
        let configuration = self
            .configuration
            .read()
            .expect("thread holding configuration lock should not panic");

        configuration.clone()
    }

    /// Set new configuration. Only the pointer swap happens under the write lock; the fetch that
    /// produced `config` must not hold it.
    pub fn set_configuration(&self, config: Arc<Configuration>) {
        let mut configuration_slot = self
            .configuration
            .write()
            .expect("thread holding configuration lock should not panic");

        *configuration_slot = Some(config);
    }
}
