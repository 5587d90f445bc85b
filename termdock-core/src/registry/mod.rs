//! Session registry
//!
//! Holds the logical session descriptors and hands out unique ids. The
//! registry knows nothing about processes or windows; it is only touched
//! from the workspace's own thread.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::error::{RegistryError, RegistryResult};
use crate::models::{SessionDescriptor, SessionId};

/// Namespace for sessions loaded from the sessions file
pub const TREE_NAMESPACE: &str = "tree";

/// Namespace for sessions created from the quick-connect bar
pub const CONNECT_BAR_NAMESPACE: &str = "ConnectBar";

/// Highest numeric suffix tried before giving up
const MAX_DISAMBIGUATOR: u32 = 10_000;

/// In-memory map of session descriptors
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    /// Registered descriptors
    sessions: HashMap<SessionId, Arc<SessionDescriptor>>,
    /// Registration order, for listing
    order: Vec<SessionId>,
    /// Every id ever issued; removed ids are never reused
    issued: HashSet<SessionId>,
}

impl SessionRegistry {
    /// Creates an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a descriptor under `namespace/label`
    ///
    /// A numeric suffix is appended when the id was already issued. The
    /// returned id is stored in the descriptor.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::EmptyLabel` for a blank label, or
    /// `RegistryError::Exhausted` if no free suffix exists.
    pub fn register(
        &mut self,
        namespace: &str,
        label: &str,
        mut descriptor: SessionDescriptor,
    ) -> RegistryResult<SessionId> {
        let label = label.trim();
        if label.is_empty() {
            return Err(RegistryError::EmptyLabel);
        }

        let id = self.make_unique_id(&SessionId::combine(namespace, label))?;
        descriptor.id = id.clone();

        tracing::debug!(session_id = %id, host = %descriptor.host, "Registered session");

        self.issued.insert(id.clone());
        self.order.push(id.clone());
        self.sessions.insert(id.clone(), Arc::new(descriptor));
        Ok(id)
    }

    /// Returns `base` if unused, otherwise `base-1`, `base-2`, ...
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::Exhausted` if every suffix is taken.
    pub fn make_unique_id(&self, base: &SessionId) -> RegistryResult<SessionId> {
        if !self.issued.contains(base) {
            return Ok(base.clone());
        }
        (1..MAX_DISAMBIGUATOR)
            .map(|n| base.with_suffix(n))
            .find(|candidate| !self.issued.contains(candidate))
            .ok_or_else(|| RegistryError::Exhausted(base.to_string()))
    }

    /// Looks up a descriptor
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::NotFound` if the id is not registered.
    pub fn resolve(&self, id: &SessionId) -> RegistryResult<Arc<SessionDescriptor>> {
        self.sessions
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(id.clone()))
    }

    /// All descriptors in registration order
    #[must_use]
    pub fn list_all(&self) -> Vec<Arc<SessionDescriptor>> {
        self.order
            .iter()
            .filter_map(|id| self.sessions.get(id).cloned())
            .collect()
    }

    /// Removes a descriptor; its id stays reserved
    ///
    /// Running sessions keep their own `Arc` and are unaffected.
    pub fn remove(&mut self, id: &SessionId) -> Option<Arc<SessionDescriptor>> {
        self.order.retain(|existing| existing != id);
        self.sessions.remove(id)
    }

    /// Whether an id is currently registered
    #[must_use]
    pub fn contains(&self, id: &SessionId) -> bool {
        self.sessions.contains_key(id)
    }

    /// Number of registered sessions
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
