//! Name-to-generator dictionaries.
//!
//! A [`Registry`] holds shared handles to components together with the
//! configuration each one is initialized from. Resolving a name hands out a
//! clone of the handle, initializing the component first if nobody has done
//! so yet. Resolution happens at initialization time only, never in the
//! per-window path.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::RegistryError;
use crate::properties::Properties;
use crate::traits::{Component, DecayGenerator, VertexGenerator};

/// Shared, lockable handle to a component.
pub type Handle<T> = Arc<Mutex<T>>;

pub type DecayGeneratorRegistry = Registry<dyn DecayGenerator>;
pub type VertexGeneratorRegistry = Registry<dyn VertexGenerator>;

struct Entry<T: ?Sized> {
    handle: Handle<T>,
    config: Properties,
}

pub struct Registry<T: ?Sized> {
    entries: BTreeMap<String, Entry<T>>,
}

impl<T: ?Sized> Default for Registry<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<T: ?Sized + Component> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handle` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, handle: Handle<T>, config: Properties) {
        self.entries.insert(name.into(), Entry { handle, config });
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Look up `name`, initializing the component from its stored
    /// configuration if needed.
    pub fn resolve(&self, name: &str) -> Result<Handle<T>, RegistryError> {
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| RegistryError::Unknown(name.to_string()))?;
        {
            let mut component = entry.handle.lock();
            if !component.is_initialized() {
                component
                    .initialize(&entry.config)
                    .map_err(|source| RegistryError::Initialization {
                        name: name.to_string(),
                        source,
                    })?;
            }
        }
        Ok(Arc::clone(&entry.handle))
    }
}
