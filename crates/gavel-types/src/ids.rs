//! Identifiers used throughout Gavel.
//!
//! Lot ids are UUIDs (time-ordered when freshly minted, content-derived when
//! built from a catalog position). Bidder ids are whatever the client
//! transport authenticates the caller as, so they stay opaque strings.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// RoomCode
// ---------------------------------------------------------------------------

/// Short, human-shareable room identifier (e.g. `"3FA9C1"`).
///
/// Codes are generated by the registry and normalized to upper case so that
/// clients can type them in any case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct RoomCode(String);

impl RoomCode {
    /// Build a code from client input, trimming and upper-casing it.
    #[must_use]
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_ascii_uppercase())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomCode {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

// ---------------------------------------------------------------------------
// BidderId
// ---------------------------------------------------------------------------

/// Identifier of a participant in a room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct BidderId(String);

impl BidderId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BidderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BidderId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

// ---------------------------------------------------------------------------
// LotId
// ---------------------------------------------------------------------------

/// Unique identifier of a lot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct LotId(pub Uuid);

impl LotId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Content-derived id from a lot's catalog position and name.
    ///
    /// Reloading the same catalog yields the same ids, so bid logs and
    /// exported reports from separate runs line up.
    #[must_use]
    pub fn deterministic(position: u64, name: &str) -> Self {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(b"gavel:lot_id:v1:");
        hasher.update(position.to_le_bytes());
        hasher.update(name.as_bytes());
        let hash = hasher.finalize();
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&hash[..16]);
        Self(Uuid::from_bytes(bytes))
    }

    /// First four bytes as hex, for log lines.
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0.as_bytes()[..4])
    }
}

impl Default for LotId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lot:{}", self.short())
    }
}
