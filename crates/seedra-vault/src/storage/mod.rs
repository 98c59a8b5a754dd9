//! Snapshot persistence: keep each subject's latest chain state on disk.
//!
//! Each subject is stored as a single JSON file named by the base58
//! encoding of its subject id, so arbitrary ids are filesystem-safe.
//!
//! File format:
//! ```json
//! {
//!     "version": 1,
//!     "snapshot": { ... AnchorSnapshot ... }
//! }
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::anchor::{verify_snapshot, AnchorSnapshot};
use crate::error::{Result, VaultError};

const SNAPSHOT_FILE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotFile {
    version: u32,
    snapshot: AnchorSnapshot,
}

/// Filesystem-backed store of the latest snapshot per subject.
///
/// Safe for single-process use; concurrent writers from multiple
/// processes are not coordinated.
pub struct SnapshotStore {
    base_dir: PathBuf,
}

impl SnapshotStore {
    /// Create a store rooted at `base_dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::Io` if the directory cannot be created.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    /// Persist a snapshot, replacing any earlier one for the same subject.
    pub fn save(&self, snapshot: &AnchorSnapshot) -> Result<()> {
        let file = SnapshotFile {
            version: SNAPSHOT_FILE_VERSION,
            snapshot: snapshot.clone(),
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| VaultError::SerializationError(e.to_string()))?;
        std::fs::write(self.path_for(&snapshot.subject_id), json.as_bytes())?;
        log::debug!(
            "saved snapshot for {} ({} events)",
            snapshot.subject_id,
            snapshot.events.len()
        );
        Ok(())
    }

    /// Load and verify a subject's snapshot.
    ///
    /// # Errors
    ///
    /// `VaultError::NotFound` if the subject has no file,
    /// `VaultError::InvalidFileFormat` if it cannot be parsed or was written
    /// by a newer format version, `VaultError::TamperDetected` if the stored
    /// events do not replay to the stored root.
    pub fn load(&self, subject_id: &str) -> Result<AnchorSnapshot> {
        let snapshot = self.load_unverified(subject_id)?;
        let verification = verify_snapshot(&snapshot);
        if !verification.is_valid {
            log::warn!("stored snapshot for {subject_id} failed verification");
            return Err(VaultError::TamperDetected(format!(
                "stored snapshot for '{subject_id}' replays to {} instead of {}",
                verification.computed_root, snapshot.root
            )));
        }
        Ok(snapshot)
    }

    /// Load a subject's snapshot without replaying it.
    pub fn load_unverified(&self, subject_id: &str) -> Result<AnchorSnapshot> {
        let path = self.path_for(subject_id);
        if !path.exists() {
            return Err(VaultError::NotFound(format!("subject not found: {subject_id}")));
        }

        let bytes = std::fs::read(&path)?;
        let file: SnapshotFile = serde_json::from_slice(&bytes).map_err(|e| {
            VaultError::InvalidFileFormat(format!(
                "failed to parse snapshot file {}: {e}",
                path.display()
            ))
        })?;
        if file.version > SNAPSHOT_FILE_VERSION {
            return Err(VaultError::InvalidFileFormat(format!(
                "unsupported snapshot version {}",
                file.version
            )));
        }
        Ok(file.snapshot)
    }

    pub fn exists(&self, subject_id: &str) -> bool {
        self.path_for(subject_id).exists()
    }

    /// Subject ids with a stored snapshot, sorted.
    ///
    /// A file counts only if it parses as a snapshot file and sits at the
    /// path its own subject id maps to. Anything else in the directory is
    /// skipped.
    pub fn list(&self) -> Result<Vec<String>> {
        let mut subjects = Vec::new();
        for entry in std::fs::read_dir(&self.base_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Ok(bytes) = std::fs::read(&path) else {
                continue;
            };
            let Ok(file) = serde_json::from_slice::<SnapshotFile>(&bytes) else {
                log::debug!("skipping non-snapshot file {}", path.display());
                continue;
            };
            let subject = file.snapshot.subject_id;
            if self.path_for(&subject) == path {
                subjects.push(subject);
            }
        }
        subjects.sort();
        Ok(subjects)
    }

    /// Remove a subject's snapshot.
    pub fn delete(&self, subject_id: &str) -> Result<()> {
        let path = self.path_for(subject_id);
        if !path.exists() {
            return Err(VaultError::NotFound(format!("subject not found: {subject_id}")));
        }
        std::fs::remove_file(path)?;
        Ok(())
    }

    fn path_for(&self, subject_id: &str) -> PathBuf {
        let stem = bs58::encode(subject_id.as_bytes()).into_string();
        self.base_dir.join(format!("{stem}.json"))
    }
}
