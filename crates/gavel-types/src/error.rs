//! Error types for the Gavel auction engine.
//!
//! All errors use the `GV_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Room / membership errors
//! - 2xx: Bid arbitration errors
//! - 3xx: Sequencing / lifecycle errors
//! - 9xx: Configuration / internal errors
//!
//! Every error is recoverable: a rejected command leaves the room unchanged
//! and is reported to the originating client only.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Amount, BidderId, RoomCode, RoomPhase};

/// Central error enum for all Gavel operations.
#[derive(Debug, Error)]
pub enum GavelError {
    // =================================================================
    // Room / Membership Errors (1xx)
    // =================================================================
    /// No room is registered under this code.
    #[error("GV_ERR_100: Room not found: {0}")]
    RoomNotFound(RoomCode),

    /// The bidder is not a member of the room.
    #[error("GV_ERR_101: Bidder not found: {0}")]
    BidderNotFound(BidderId),

    /// A non-owner attempted an owner-only action.
    #[error("GV_ERR_102: Only the room owner may {action}")]
    Forbidden { action: String },

    /// The room already holds `max_bidders` participants.
    #[error("GV_ERR_103: Room is full ({capacity} bidders)")]
    RoomFull { capacity: usize },

    /// The registry is at its room ceiling or could not mint a free code.
    #[error("GV_ERR_104: Room capacity exhausted: {reason}")]
    RegistryExhausted { reason: String },

    // =================================================================
    // Bid Errors (2xx)
    // =================================================================
    /// The raise over the current floor is not a configured increment.
    #[error("GV_ERR_200: Invalid bid increment {increment}; allowed: {allowed:?}")]
    InvalidIncrement { increment: i128, allowed: Vec<Amount> },

    /// The bidder already holds the floor.
    #[error("GV_ERR_201: {0} already holds the floor; another bidder must bid first")]
    ConsecutiveBidRejected(BidderId),

    /// Purse cannot cover the bid (or is below the minimum increment).
    #[error("GV_ERR_202: Insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: Amount, available: Amount },

    /// The bidder's roster is at the squad cap.
    #[error("GV_ERR_203: Squad full ({cap} lots)")]
    SquadFull { cap: usize },

    // =================================================================
    // Sequencing / Lifecycle Errors (3xx)
    // =================================================================
    /// No lot is on the block (not started, between lots, or finished).
    #[error("GV_ERR_300: No active lot")]
    NoActiveLot,

    /// The room has no lots to auction.
    #[error("GV_ERR_301: Lot queue is empty")]
    EmptyQueue,

    /// The command is not valid in the room's current phase.
    #[error("GV_ERR_302: Invalid state: cannot {action} while {phase}")]
    InvalidState { action: String, phase: RoomPhase },

    /// Settings rejected by validation.
    #[error("GV_ERR_303: Invalid settings: {reason}")]
    InvalidSettings { reason: String },

    /// A catalog lot the engine cannot auction.
    #[error("GV_ERR_304: Invalid lot: {reason}")]
    InvalidLot { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("GV_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("GV_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, missing fields, etc.).
    #[error("GV_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// I/O error.
    #[error("GV_ERR_903: I/O error: {0}")]
    Io(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, GavelError>;

impl From<std::io::Error> for GavelError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for GavelError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Transport-visible classification of a [`GavelError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    RoomFull,
    InvalidIncrement,
    ConsecutiveBidRejected,
    InsufficientFunds,
    SquadFull,
    NoActiveLot,
    EmptyQueue,
    InvalidState,
    InvalidSettings,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotFound => "NOT_FOUND",
            Self::Forbidden => "FORBIDDEN",
            Self::RoomFull => "ROOM_FULL",
            Self::InvalidIncrement => "INVALID_INCREMENT",
            Self::ConsecutiveBidRejected => "CONSECUTIVE_BID_REJECTED",
            Self::InsufficientFunds => "INSUFFICIENT_FUNDS",
            Self::SquadFull => "SQUAD_FULL",
            Self::NoActiveLot => "NO_ACTIVE_LOT",
            Self::EmptyQueue => "EMPTY_QUEUE",
            Self::InvalidState => "INVALID_STATE",
            Self::InvalidSettings => "INVALID_SETTINGS",
            Self::Internal => "INTERNAL",
        };
        f.write_str(name)
    }
}

impl GavelError {
    /// Classify this error for the client transport.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RoomNotFound(_) | Self::BidderNotFound(_) => ErrorKind::NotFound,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::RoomFull { .. } | Self::RegistryExhausted { .. } => ErrorKind::RoomFull,
            Self::InvalidIncrement { .. } => ErrorKind::InvalidIncrement,
            Self::ConsecutiveBidRejected(_) => ErrorKind::ConsecutiveBidRejected,
            Self::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            Self::SquadFull { .. } => ErrorKind::SquadFull,
            Self::NoActiveLot => ErrorKind::NoActiveLot,
            Self::EmptyQueue => ErrorKind::EmptyQueue,
            Self::InvalidState { .. } => ErrorKind::InvalidState,
            Self::InvalidSettings { .. } | Self::InvalidLot { .. } => ErrorKind::InvalidSettings,
            Self::Internal(_) | Self::Serialization(_) | Self::Configuration(_) | Self::Io(_) => {
                ErrorKind::Internal
            }
        }
    }

    #[must_use]
    pub fn invalid_state(action: &str, phase: RoomPhase) -> Self {
        Self::InvalidState {
            action: action.to_string(),
            phase,
        }
    }
}
