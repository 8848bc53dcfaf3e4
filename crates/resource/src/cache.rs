//! Keyed resource cache: get-or-load-or-fail with single-copy sharing.
//!
//! Single-threaded. Handles are `Rc<RefCell<T>>`, shared between the registry and
//! every caller; a resource is dropped once its entry is removed and the last
//! outside handle goes away.

use std::{
    any::{Any, type_name},
    cell::RefCell,
    collections::HashMap,
    path::Path,
    rc::Rc,
};

use thiserror::Error;

use crate::resource::{Construct, IdGenerator, Resource, ResourceError, ResourceState};

/// Shared handle to a cached resource.
///
/// The cache never panics on a handle a caller is still borrowing mutably: such
/// an entry is returned as a hit, left to its holder on unload, and reported as
/// unknown by the introspection helpers.
pub type Handle<T> = Rc<RefCell<T>>;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("No resource registered under '{0}'")]
    NotFound(String),
    #[error("Resource '{key}' is a {found}, not a {expected}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("Failed to load '{key}': {source}")]
    Load {
        key: String,
        #[source]
        source: ResourceError,
    },
    #[error("Failed to initialize '{key}': {source}")]
    Init {
        key: String,
        #[source]
        source: ResourceError,
    },
}

/// Two views of the same allocation: one for typed downcasts, one for the
/// type-independent lifecycle calls.
struct Entry {
    any: Rc<dyn Any>,
    resource: Rc<RefCell<dyn Resource>>,
    type_name: &'static str,
}

impl Entry {
    fn new<T: Resource>(handle: &Handle<T>) -> Self {
        Self {
            any: handle.clone(),
            resource: handle.clone(),
            type_name: type_name::<T>(),
        }
    }

    fn downcast<T: Resource>(&self) -> Option<Handle<T>> {
        Rc::downcast::<RefCell<T>>(self.any.clone()).ok()
    }
}

#[derive(Default)]
pub struct ResourceCache {
    entries: HashMap<String, Entry>,
    ids: IdGenerator,
}

impl ResourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached `T` under `key` if it is loaded; otherwise construct one
    /// from `args`, load it from `filename`, initialize it and register it.
    ///
    /// Nothing is registered when `load` or `init` fails; a stale entry (wrong
    /// type, or no longer loaded) is replaced only by a successful reload.
    pub fn get_or_load<T: Construct>(
        &mut self,
        key: &str,
        filename: impl AsRef<Path>,
        args: T::Args,
    ) -> Result<Handle<T>, CacheError> {
        if let Some(entry) = self.entries.get(key) {
            match entry.downcast::<T>() {
                Some(handle) if is_loaded_or_busy(&handle) => {
                    log::debug!("Cache hit for '{}'", key);
                    return Ok(handle);
                }
                Some(_) => log::debug!("Cached '{}' is not loaded; reloading", key),
                None => log::warn!(
                    "Cached '{}' is a {}, requested {}; reloading",
                    key,
                    entry.type_name,
                    type_name::<T>()
                ),
            }
        }

        let filename = filename.as_ref();
        let id = self.ids.allocate();
        let mut resource = T::construct(key, id, args);

        if let Err(source) = resource.load(filename) {
            log::error!("Failed to load '{}' from {}: {}", key, filename.display(), source);
            return Err(CacheError::Load {
                key: key.to_string(),
                source,
            });
        }
        if let Err(source) = resource.init() {
            log::error!("Failed to initialize '{}': {}", key, source);
            return Err(CacheError::Init {
                key: key.to_string(),
                source,
            });
        }

        log::info!(
            "Cached '{}' ({} {}, {} bytes)",
            key,
            type_name::<T>(),
            id,
            resource.size_in_bytes()
        );
        let handle = Rc::new(RefCell::new(resource));
        self.entries.insert(key.to_string(), Entry::new(&handle));
        Ok(handle)
    }

    /// Lookup without loading.
    pub fn get<T: Resource>(&self, key: &str) -> Result<Handle<T>, CacheError> {
        let entry = self
            .entries
            .get(key)
            .ok_or_else(|| CacheError::NotFound(key.to_string()))?;
        entry.downcast::<T>().ok_or_else(|| CacheError::TypeMismatch {
            key: key.to_string(),
            expected: type_name::<T>(),
            found: entry.type_name,
        })
    }

    /// Unload and drop the entry. Returns `false` if `key` was not cached.
    pub fn unload(&mut self, key: &str) -> bool {
        match self.entries.remove(key) {
            Some(entry) => {
                unload_entry(key, &entry);
                true
            }
            None => false,
        }
    }

    /// Unload every entry and empty the registry.
    pub fn unload_all(&mut self) {
        let count = self.entries.len();
        for (key, entry) in self.entries.drain() {
            unload_entry(&key, &entry);
        }
        log::info!("Unloaded all {} cached resources", count);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// `None` when `key` is not cached or its handle is mutably borrowed.
    pub fn state_of(&self, key: &str) -> Option<ResourceState> {
        let entry = self.entries.get(key)?;
        let resource = entry.resource.try_borrow().ok()?;
        Some(resource.state())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum over entries; mutably borrowed handles are skipped.
    pub fn total_size_in_bytes(&self) -> usize {
        self.entries
            .values()
            .filter_map(|e| e.resource.try_borrow().ok().map(|r| r.size_in_bytes()))
            .sum()
    }
}

fn is_loaded_or_busy<T: Resource>(handle: &Handle<T>) -> bool {
    handle
        .try_borrow()
        .map_or(true, |r| r.state() == ResourceState::Loaded)
}

fn unload_entry(key: &str, entry: &Entry) {
    match entry.resource.try_borrow_mut() {
        Ok(mut resource) => {
            resource.unload();
            log::info!("Unloaded '{}'", key);
        }
        Err(_) => log::warn!(
            "'{}' is borrowed by a caller; dropped from the cache without unloading",
            key
        ),
    }
}
