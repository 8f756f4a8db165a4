//! In-memory revision store for tests and ephemeral peers.

use std::collections::HashMap;
use std::sync::RwLock;

use pds_types::AgentId;

use crate::error::{Result, RevisionError};
use crate::traits::RevisionStore;
use crate::types::{PointerName, RevisionPointer};

/// An in-memory implementation of [`RevisionStore`].
///
/// All pointers live in a `HashMap` behind a `RwLock`. Data is lost when the
/// store is dropped.
#[derive(Debug, Default)]
pub struct InMemoryRevisionStore {
    pointers: RwLock<HashMap<(AgentId, PointerName), RevisionPointer>>,
}

impl InMemoryRevisionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> RevisionError {
    RevisionError::Unavailable(format!("lock poisoned: {e}"))
}

impl RevisionStore for InMemoryRevisionStore {
    fn read_pointer(&self, owner: &AgentId, name: PointerName) -> Result<Option<RevisionPointer>> {
        let pointers = self.pointers.read().map_err(poisoned)?;
        Ok(pointers.get(&(owner.clone(), name)).cloned())
    }

    fn write_pointer(&self, pointer: &RevisionPointer) -> Result<()> {
        let mut pointers = self.pointers.write().map_err(poisoned)?;
        pointers.insert((pointer.owner.clone(), pointer.name), pointer.clone());
        Ok(())
    }

    fn list_pointers(&self, owner: &AgentId) -> Result<Vec<RevisionPointer>> {
        let pointers = self.pointers.read().map_err(poisoned)?;
        let mut result: Vec<RevisionPointer> = pointers
            .iter()
            .filter(|((agent, _), _)| agent == owner)
            .map(|(_, p)| p.clone())
            .collect();
        result.sort_by_key(|p| p.name);
        Ok(result)
    }
}
