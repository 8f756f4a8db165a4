use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use pds_types::EntryHash;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::object::{ObjectKind, StoredObject};
use crate::traits::EntryStore;

/// Filesystem-backed entry store.
///
/// On-disk layout:
/// ```text
/// <root>/objects/ab/cdef...   [1 byte: kind tag][N bytes: object data]
/// <root>/snapshots/<entry>    hex hash of the snapshot taken at <entry>
/// ```
///
/// Every file is written to a temporary file in the target directory and
/// renamed into place, so readers never observe a partial object. Object
/// contents are re-hashed on read and a mismatch is reported as
/// [`StoreError::HashMismatch`].
#[derive(Debug)]
pub struct FsEntryStore {
    root: PathBuf,
}

impl FsEntryStore {
    /// Open (or create) a store rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join("objects"))?;
        fs::create_dir_all(root.join("snapshots"))?;
        debug!(root = %root.display(), "opened filesystem entry store");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, id: &EntryHash) -> PathBuf {
        let hex = id.to_hex();
        self.root.join("objects").join(&hex[..2]).join(&hex[2..])
    }

    fn link_path(&self, entry: &EntryHash) -> PathBuf {
        self.root.join("snapshots").join(entry.to_hex())
    }

    fn temp_in(dir: &Path) -> StoreResult<NamedTempFile> {
        fs::create_dir_all(dir)?;
        Ok(NamedTempFile::new_in(dir)?)
    }
}

impl EntryStore for FsEntryStore {
    fn read(&self, id: &EntryHash) -> StoreResult<Option<StoredObject>> {
        let bytes = match fs::read(self.object_path(id)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let Some((&tag, data)) = bytes.split_first() else {
            return Err(StoreError::CorruptObject {
                id: *id,
                reason: "empty object file".into(),
            });
        };
        let kind = ObjectKind::from_tag(tag).ok_or_else(|| StoreError::CorruptObject {
            id: *id,
            reason: format!("unknown kind tag {tag:#04x}"),
        })?;

        let object = StoredObject::new(kind, data.to_vec());
        let computed = object.compute_id();
        if computed != *id {
            warn!(%id, %computed, "object failed hash verification");
            return Err(StoreError::HashMismatch { id: *id, computed });
        }
        Ok(Some(object))
    }

    fn write(&self, object: &StoredObject) -> StoreResult<EntryHash> {
        let id = object.compute_id();
        if id.is_null() {
            return Err(StoreError::NullEntryHash);
        }
        let path = self.object_path(&id);
        if path.exists() {
            return Ok(id);
        }

        let dir = path
            .parent()
            .ok_or_else(|| StoreError::Unavailable(format!("bad object path {}", path.display())))?;
        let mut tmp = Self::temp_in(dir)?;
        tmp.write_all(&[object.kind.tag()])?;
        tmp.write_all(&object.data)?;
        tmp.as_file().sync_all()?;
        // Identical content under the same name, so a concurrent rename is harmless.
        tmp.persist(&path).map_err(|e| e.error)?;

        debug!(%id, kind = %object.kind, size = object.size, "wrote object");
        Ok(id)
    }

    fn exists(&self, id: &EntryHash) -> StoreResult<bool> {
        Ok(self.object_path(id).exists())
    }

    fn link_snapshot(&self, entry: &EntryHash, snapshot: &EntryHash) -> StoreResult<()> {
        let path = self.link_path(entry);
        let mut tmp = Self::temp_in(&self.root.join("snapshots"))?;
        tmp.write_all(snapshot.to_hex().as_bytes())?;
        tmp.as_file().sync_all()?;

        match tmp.persist_noclobber(&path) {
            Ok(_) => {
                debug!(%entry, %snapshot, "linked snapshot");
                Ok(())
            }
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                match self.snapshot_for(entry)? {
                    Some(existing) if existing == *snapshot => Ok(()),
                    Some(existing) => Err(StoreError::SnapshotConflict {
                        entry: *entry,
                        existing,
                        proposed: *snapshot,
                    }),
                    None => Err(StoreError::Unavailable(format!(
                        "snapshot link for {entry} vanished"
                    ))),
                }
            }
            Err(e) => Err(e.error.into()),
        }
    }

    fn snapshot_for(&self, entry: &EntryHash) -> StoreResult<Option<EntryHash>> {
        let text = match fs::read_to_string(self.link_path(entry)) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        EntryHash::from_hex(text.trim())
            .map(Some)
            .map_err(|e| StoreError::CorruptObject {
                id: *entry,
                reason: format!("bad snapshot link: {e}"),
            })
    }
}
