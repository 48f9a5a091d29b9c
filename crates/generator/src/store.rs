//! Persistence of rendered decks.

use chrono::{DateTime, Utc};
use deck_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use uuid::Uuid;

/// MIME type of a PPTX file.
pub const PPTX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";

/// A deck read back from a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDeck {
    pub id: String,
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl StoredDeck {
    /// `Content-Disposition` value that downloads the deck under its name.
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename={}", self.name)
    }
}

/// Stores rendered decks under generated identifiers.
pub trait BlobStore {
    /// Persist `bytes` as `name` and return the new identifier.
    fn store(&self, bytes: &[u8], name: &str) -> Result<String>;

    /// Load a deck by identifier; unknown identifiers are `NotFound`.
    fn retrieve(&self, id: &str) -> Result<StoredDeck>;
}

#[derive(Debug, Serialize, Deserialize)]
struct DeckMetadata {
    name: String,
    content_type: String,
    size: u64,
    created_at: DateTime<Utc>,
}

/// Directory-backed store writing `<id>.pptx` plus a `<id>.json` sidecar.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Use `root`, creating it if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn deck_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{}.pptx", id))
    }

    fn metadata_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{}.json", id))
    }

    /// Write through a temporary file in the same directory, then rename.
    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        let mut tmp = NamedTempFile::new_in(&self.root)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| Error::IoError(e.error))?;
        Ok(())
    }

    /// Write the deck, then its sidecar. A deck whose sidecar could not be
    /// written is removed again.
    fn write_entry(&self, id: &str, deck: &[u8], sidecar: &[u8]) -> Result<()> {
        let deck_path = self.deck_path(id);
        self.write_atomic(&deck_path, deck)?;

        if let Err(e) = self.write_atomic(&self.metadata_path(id), sidecar) {
            log::warn!("Metadata for deck {} could not be written: {}", id, e);
            if let Err(remove) = fs::remove_file(&deck_path) {
                log::warn!("Could not remove {}: {}", deck_path.display(), remove);
            }
            return Err(e);
        }
        Ok(())
    }
}

impl BlobStore for FsBlobStore {
    fn store(&self, bytes: &[u8], name: &str) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let metadata = DeckMetadata {
            name: name.to_string(),
            content_type: PPTX_CONTENT_TYPE.to_string(),
            size: bytes.len() as u64,
            created_at: Utc::now(),
        };
        let sidecar = serde_json::to_vec_pretty(&metadata)
            .map_err(|e| Error::CorruptedFile(format!("deck metadata: {}", e)))?;

        self.write_entry(&id, bytes, &sidecar)?;

        log::info!("Stored deck {} as {} ({} bytes)", name, id, bytes.len());
        Ok(id)
    }

    fn retrieve(&self, id: &str) -> Result<StoredDeck> {
        let not_found = || Error::NotFound(format!("no deck with id {}", id));

        let id = Uuid::parse_str(id).map_err(|_| not_found())?.to_string();
        let sidecar = match fs::read(self.metadata_path(&id)) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(not_found()),
            Err(e) => return Err(e.into()),
        };
        let metadata: DeckMetadata = serde_json::from_slice(&sidecar)
            .map_err(|e| Error::CorruptedFile(format!("deck metadata {}: {}", id, e)))?;

        let bytes = match fs::read(self.deck_path(&id)) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(not_found()),
            Err(e) => return Err(e.into()),
        };

        Ok(StoredDeck {
            id,
            name: metadata.name,
            content_type: metadata.content_type,
            bytes,
        })
    }
}
