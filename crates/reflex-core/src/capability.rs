use std::any::Any;
use std::collections::BTreeMap;
use std::marker::PhantomData;

use thiserror::Error;

use crate::WorldView;

/// Typed handle to one subsystem an agent may expose (movement, targeting, ...).
///
/// The `name` only feeds diagnostics; lookups go through `id`.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CapabilityKey<T: 'static> {
    id: u64,
    name: &'static str,
    _phantom: PhantomData<fn() -> T>,
}

impl<T: 'static> Copy for CapabilityKey<T> {}

impl<T: 'static> Clone for CapabilityKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: 'static> CapabilityKey<T> {
    pub const fn new(id: u64, name: &'static str) -> Self {
        Self {
            id,
            name,
            _phantom: PhantomData,
        }
    }

    pub fn id(self) -> u64 {
        self.id
    }

    pub fn name(self) -> &'static str {
        self.name
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilityError {
    #[error("missing capability `{name}` (id={id})")]
    Missing { id: u64, name: &'static str },

    #[error("capability `{name}` (id={id}) is registered with a different type")]
    TypeMismatch { id: u64, name: &'static str },
}

/// Per-agent capability registry.
///
/// A missing capability is an ordinary condition nodes report through their
/// guard hook, so lookups return `Option`/`Result` instead of panicking.
#[derive(Default)]
pub struct Capabilities {
    values: BTreeMap<u64, Box<dyn Any>>,
}

impl Capabilities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn contains<T: 'static>(&self, key: CapabilityKey<T>) -> bool {
        self.get(key).is_some()
    }

    pub fn insert<T: 'static>(&mut self, key: CapabilityKey<T>, value: T) {
        self.values.insert(key.id, Box::new(value));
    }

    pub fn with<T: 'static>(mut self, key: CapabilityKey<T>, value: T) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get<T: 'static>(&self, key: CapabilityKey<T>) -> Option<&T> {
        self.values.get(&key.id)?.downcast_ref::<T>()
    }

    pub fn get_mut<T: 'static>(&mut self, key: CapabilityKey<T>) -> Option<&mut T> {
        self.values.get_mut(&key.id)?.downcast_mut::<T>()
    }

    pub fn require<T: 'static>(&self, key: CapabilityKey<T>) -> Result<&T, CapabilityError> {
        let value = self.values.get(&key.id).ok_or(CapabilityError::Missing {
            id: key.id,
            name: key.name,
        })?;
        value
            .downcast_ref::<T>()
            .ok_or(CapabilityError::TypeMismatch {
                id: key.id,
                name: key.name,
            })
    }

    pub fn remove<T: 'static>(&mut self, key: CapabilityKey<T>) -> Option<T> {
        if !self.contains(key) {
            return None;
        }
        let value = self.values.remove(&key.id)?;
        value.downcast::<T>().map(|b| *b).ok()
    }
}

impl core::fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Capabilities")
            .field("ids", &self.values.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// World extension: resolve an agent's capability registry.
pub trait CapabilityLookup: WorldView {
    fn capabilities(&self, agent: Self::Agent) -> Option<&Capabilities>;

    fn capability<T: 'static>(&self, agent: Self::Agent, key: CapabilityKey<T>) -> Option<&T> {
        self.capabilities(agent)?.get(key)
    }

    fn require_capability<T: 'static>(
        &self,
        agent: Self::Agent,
        key: CapabilityKey<T>,
    ) -> Result<&T, CapabilityError> {
        match self.capabilities(agent) {
            Some(caps) => caps.require(key),
            None => Err(CapabilityError::Missing {
                id: key.id,
                name: key.name,
            }),
        }
    }
}
