//! Anchor publication: hand snapshots to an external store.
//!
//! The transport itself is out of scope here. Publishers get an immutable
//! snapshot and return a [`ContentAddress`] derived from its bytes, so the
//! same snapshot always publishes to the same address.
//!
//! File format written by [`DirectoryPublisher`]:
//! ```json
//! {
//!     "version": 1,
//!     "address": "anc_...",
//!     "snapshot": { "sid": "...", "root_hash": "...", "events": [ ... ] }
//! }
//! ```

use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::anchor::AnchorSnapshot;
use crate::error::{Result, VaultError};
use crate::time::{micros_to_rfc3339, Clock};

const PUBLISHED_FILE_VERSION: u32 = 1;

/// Digest-derived identifier of a published snapshot.
///
/// Format: `anc_` + base58 of the first 16 bytes of SHA-256(snapshot JSON).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentAddress(pub String);

impl ContentAddress {
    pub fn for_snapshot(snapshot: &AnchorSnapshot) -> Result<Self> {
        let bytes = serde_json::to_vec(snapshot)
            .map_err(|e| VaultError::SerializationError(e.to_string()))?;
        let hash = Sha256::digest(&bytes);
        let encoded = bs58::encode(&hash[..16]).into_string();
        Ok(Self(format!("anc_{encoded}")))
    }
}

impl std::fmt::Display for ContentAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Compact record pointing at a published snapshot, suitable for
/// embedding in a QR code or a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorMetadata {
    #[serde(rename = "cid")]
    pub address: ContentAddress,
    #[serde(rename = "sid")]
    pub subject_id: String,
    #[serde(rename = "root_hash")]
    pub root: String,
    pub event_count: usize,
    /// RFC 3339 UTC.
    #[serde(rename = "timestamp")]
    pub issued_at: String,
}

impl AnchorMetadata {
    pub fn new(address: ContentAddress, snapshot: &AnchorSnapshot, clock: &dyn Clock) -> Self {
        Self {
            address,
            subject_id: snapshot.subject_id.clone(),
            root: snapshot.root.clone(),
            event_count: snapshot.events.len(),
            issued_at: micros_to_rfc3339(clock.now_micros()),
        }
    }
}

/// Sink for snapshots.
pub trait AnchorPublisher: Send + Sync {
    fn publish(&self, snapshot: &AnchorSnapshot) -> Result<ContentAddress>;
}

impl<T: AnchorPublisher + ?Sized> AnchorPublisher for &T {
    fn publish(&self, snapshot: &AnchorSnapshot) -> Result<ContentAddress> {
        (**self).publish(snapshot)
    }
}

impl<T: AnchorPublisher + ?Sized> AnchorPublisher for std::sync::Arc<T> {
    fn publish(&self, snapshot: &AnchorSnapshot) -> Result<ContentAddress> {
        (**self).publish(snapshot)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PublishedFile {
    version: u32,
    address: ContentAddress,
    snapshot: AnchorSnapshot,
}

/// Publishes each snapshot as `{base_dir}/{address}.json`.
///
/// Republishing an identical snapshot rewrites the same file.
pub struct DirectoryPublisher {
    base_dir: PathBuf,
}

impl DirectoryPublisher {
    /// The directory and any missing parents are created if needed.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    /// Load a previously published snapshot.
    ///
    /// # Errors
    ///
    /// `VaultError::NotFound` if nothing was published at `address`,
    /// `VaultError::InvalidFileFormat` if the file cannot be parsed.
    pub fn fetch(&self, address: &ContentAddress) -> Result<AnchorSnapshot> {
        let path = self.path_for(address);
        if !path.exists() {
            return Err(VaultError::NotFound(format!("published anchor: {address}")));
        }
        let bytes = std::fs::read(&path)?;
        let file: PublishedFile = serde_json::from_slice(&bytes).map_err(|e| {
            VaultError::InvalidFileFormat(format!(
                "failed to parse published anchor {}: {e}",
                path.display()
            ))
        })?;
        Ok(file.snapshot)
    }

    fn path_for(&self, address: &ContentAddress) -> PathBuf {
        self.base_dir.join(format!("{}.json", address.0))
    }
}

impl AnchorPublisher for DirectoryPublisher {
    fn publish(&self, snapshot: &AnchorSnapshot) -> Result<ContentAddress> {
        let address = ContentAddress::for_snapshot(snapshot)?;
        let file = PublishedFile {
            version: PUBLISHED_FILE_VERSION,
            address: address.clone(),
            snapshot: snapshot.clone(),
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| VaultError::SerializationError(e.to_string()))?;
        std::fs::write(self.path_for(&address), json.as_bytes())?;
        log::debug!("published anchor {} for {}", address, snapshot.subject_id);
        Ok(address)
    }
}

/// Keeps published snapshots in memory.
#[derive(Debug, Default)]
pub struct MemoryPublisher {
    published: Mutex<Vec<(ContentAddress, AnchorSnapshot)>>,
}

impl MemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything published so far, oldest first.
    pub fn published(&self) -> Vec<(ContentAddress, AnchorSnapshot)> {
        self.published
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

impl AnchorPublisher for MemoryPublisher {
    fn publish(&self, snapshot: &AnchorSnapshot) -> Result<ContentAddress> {
        let address = ContentAddress::for_snapshot(snapshot)?;
        self.published
            .lock()
            .map_err(|_| VaultError::StorageError("publisher lock poisoned".into()))?
            .push((address.clone(), snapshot.clone()));
        Ok(address)
    }
}
