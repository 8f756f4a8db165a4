//! Filesystem revision store.
//!
//! Layout: `<root>/revisions/<agent-key>/<name>.json`, where `agent-key` is
//! [`AgentId::storage_key`]. Each file holds one serialized
//! [`RevisionPointer`] and is replaced atomically through a temp file.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use pds_types::AgentId;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{Result, RevisionError};
use crate::traits::RevisionStore;
use crate::types::{PointerName, RevisionPointer};

#[derive(Debug)]
pub struct FsRevisionStore {
    root: PathBuf,
}

impl FsRevisionStore {
    /// Open (or create) a pointer store rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().join("revisions");
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn agent_dir(&self, owner: &AgentId) -> PathBuf {
        self.root.join(owner.storage_key())
    }

    fn pointer_path(&self, owner: &AgentId, name: PointerName) -> PathBuf {
        self.agent_dir(owner).join(format!("{name}.json"))
    }
}

impl RevisionStore for FsRevisionStore {
    fn read_pointer(&self, owner: &AgentId, name: PointerName) -> Result<Option<RevisionPointer>> {
        let path = self.pointer_path(owner, name);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let pointer: RevisionPointer = serde_json::from_slice(&bytes)
            .map_err(|e| RevisionError::Serialization(e.to_string()))?;
        if pointer.owner != *owner || pointer.name != name {
            return Err(RevisionError::InvalidPointer {
                name: path.display().to_string(),
                reason: format!("file holds {}/{}", pointer.owner, pointer.name),
            });
        }
        Ok(Some(pointer))
    }

    fn write_pointer(&self, pointer: &RevisionPointer) -> Result<()> {
        let dir = self.agent_dir(&pointer.owner);
        fs::create_dir_all(&dir)?;
        let json = serde_json::to_vec_pretty(pointer)
            .map_err(|e| RevisionError::Serialization(e.to_string()))?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.pointer_path(&pointer.owner, pointer.name))
            .map_err(|e| e.error)?;

        debug!(
            owner = %pointer.owner,
            name = %pointer.name,
            revision = %pointer.revision.short_hex(),
            "wrote revision pointer"
        );
        Ok(())
    }

    fn list_pointers(&self, owner: &AgentId) -> Result<Vec<RevisionPointer>> {
        let mut result = Vec::new();
        for name in PointerName::ALL {
            if let Some(pointer) = self.read_pointer(owner, name)? {
                result.push(pointer);
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pds_types::EntryHash;

    fn agent(name: &str) -> AgentId {
        AgentId::new(format!("did:key:{name}")).unwrap()
    }

    #[test]
    fn write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsRevisionStore::open(dir.path()).unwrap();
        let rev = EntryHash::from_bytes(b"head");
        store
            .write_pointer(&RevisionPointer::latest(agent("alice"), rev))
            .unwrap();
        assert_eq!(store.latest(&agent("alice")).unwrap(), Some(rev));
        assert!(store.current(&agent("alice")).unwrap().is_none());
    }

    #[test]
    fn pointers_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let rev = EntryHash::from_bytes(b"persisted");
        {
            let store = FsRevisionStore::open(dir.path()).unwrap();
            store
                .write_pointer(&RevisionPointer::current(agent("bob"), rev))
                .unwrap();
        }
        let store = FsRevisionStore::open(dir.path()).unwrap();
        assert_eq!(store.current(&agent("bob")).unwrap(), Some(rev));
        assert_eq!(store.list_pointers(&agent("bob")).unwrap().len(), 1);
    }

    #[test]
    fn overwrite_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsRevisionStore::open(dir.path()).unwrap();
        let a = agent("carol");
        for i in 0..3u8 {
            store
                .write_pointer(&RevisionPointer::latest(a.clone(), EntryHash::from_hash([i; 32])))
                .unwrap();
        }
        assert_eq!(store.latest(&a).unwrap(), Some(EntryHash::from_hash([2; 32])));
        let files = fs::read_dir(store.agent_dir(&a)).unwrap().count();
        assert_eq!(files, 1);
    }

    #[test]
    fn garbage_file_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsRevisionStore::open(dir.path()).unwrap();
        let a = agent("dave");
        fs::create_dir_all(store.agent_dir(&a)).unwrap();
        fs::write(store.pointer_path(&a, PointerName::Latest), b"not json").unwrap();
        assert!(matches!(
            store.latest(&a),
            Err(RevisionError::Serialization(_))
        ));
    }
}
