//! Room lifecycle phases.
//!
//! A room moves **LOBBY → BIDDING ⇄ REVEALING → COMPLETE**. Bids are only
//! accepted in BIDDING; COMPLETE is terminal.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomPhase {
    /// Accepting joins and settings changes; no lot on the block.
    Lobby,
    /// A lot is on the block and the countdown is live.
    Bidding,
    /// A lot was just resolved; the next one is revealed after a pause.
    Revealing,
    /// Auction finished (queue exhausted or ended early).
    Complete,
}

impl RoomPhase {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self == Self::Complete
    }

    /// Whether the auction has been started (including finished).
    #[must_use]
    pub fn has_started(self) -> bool {
        self != Self::Lobby
    }
}

impl fmt::Display for RoomPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lobby => write!(f, "LOBBY"),
            Self::Bidding => write!(f, "BIDDING"),
            Self::Revealing => write!(f, "REVEALING"),
            Self::Complete => write!(f, "COMPLETE"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_display() {
        assert_eq!(RoomPhase::Lobby.to_string(), "LOBBY");
        assert_eq!(RoomPhase::Complete.to_string(), "COMPLETE");
    }

    #[test]
    fn only_complete_is_terminal() {
        assert!(RoomPhase::Complete.is_terminal());
        assert!(!RoomPhase::Revealing.is_terminal());
        assert!(!RoomPhase::Lobby.has_started());
        assert!(RoomPhase::Bidding.has_started());
    }
}
