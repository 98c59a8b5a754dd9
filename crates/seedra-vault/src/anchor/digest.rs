//! Hashing primitives for the anchor chain.
//!
//! Every digest is SHA3-256 carried as a lowercase hex string. Folding
//! concatenates the hex text of the running root and the event hash:
//!
//! ```text
//! root_0     = H(subject_id)
//! event_hash = H(event_type "|" timestamp)               (timestamped)
//!            = H(event_type "|" timestamp "|" sequence)  (sequenced)
//! root_n+1   = H(root_n event_hash)
//! ```

use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};

/// Which tuple is hashed for each event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashMode {
    /// `type|timestamp`. Two events of the same type within one clock tick
    /// hash identically.
    #[default]
    Timestamped,
    /// `type|timestamp|sequence`. Distinguishes same-tick bursts.
    Sequenced,
}

impl HashMode {
    /// Return a stable string tag.
    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::Timestamped => "timestamped",
            Self::Sequenced => "sequenced",
        }
    }

    /// Parse a tag produced by [`as_tag`](Self::as_tag).
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "timestamped" => Some(Self::Timestamped),
            "sequenced" => Some(Self::Sequenced),
            _ => None,
        }
    }
}

/// SHA3-256 of `input`, hex-encoded.
pub fn sha3_hex(input: &[u8]) -> String {
    hex::encode(Sha3_256::digest(input))
}

/// Starting root for a subject.
pub fn genesis_root(subject_id: &str) -> String {
    sha3_hex(subject_id.as_bytes())
}

/// Content hash of a single event.
pub fn event_hash(event_type: &str, timestamp: &str, sequence: u64, mode: HashMode) -> String {
    match mode {
        HashMode::Timestamped => sha3_hex(format!("{event_type}|{timestamp}").as_bytes()),
        HashMode::Sequenced => {
            sha3_hex(format!("{event_type}|{timestamp}|{sequence}").as_bytes())
        }
    }
}

/// Fold one event hash into the running root.
pub fn fold_root(root: &str, event_hash: &str) -> String {
    let mut hasher = Sha3_256::new();
    hasher.update(root.as_bytes());
    hasher.update(event_hash.as_bytes());
    hex::encode(hasher.finalize())
}
