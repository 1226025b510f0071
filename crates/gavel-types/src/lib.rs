//! # gavel-types
//!
//! Shared types, errors, and configuration for the **Gavel** auction room
//! engine.
//!
//! This crate is the leaf dependency of the workspace. It defines:
//!
//! - **Identifiers**: [`RoomCode`], [`BidderId`], [`LotId`]
//! - **Money**: [`Amount`] (integer paise) and crore conversions
//! - **Lot model**: [`Lot`], [`LotCategory`], [`LotSource`]
//! - **Bidder model**: [`Bidder`], [`RosterEntry`], [`TeamSnapshot`]
//! - **Lifecycle**: [`RoomPhase`]
//! - **Outcomes**: [`ResolvedLot`], [`BidLogEntry`], [`AuctionStatistics`]
//! - **Events**: [`RoomEvent`], [`RoomNotification`]
//! - **Views**: [`RoomSnapshot`], [`LotState`], [`BidAck`], [`FinalReport`]
//! - **Configuration**: [`EngineConfig`], [`TimerConfig`], [`RoomSettings`], [`SettingsPatch`], [`AuctionOrder`]
//! - **Errors**: [`GavelError`] with `GV_ERR_` prefix codes, [`ErrorKind`]
//! - **Constants**: system-wide limits and defaults

pub mod bidder;
pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod ids;
pub mod lot;
pub mod money;
pub mod outcome;
pub mod phase;
pub mod snapshot;

// Re-export all primary types at crate root for ergonomic imports:
//   use gavel_types::{Lot, Bidder, RoomEvent, ...};

pub use bidder::*;
pub use config::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use lot::*;
pub use money::*;
pub use outcome::*;
pub use phase::*;
pub use snapshot::*;

// Constants are accessed via `gavel_types::constants::FOO`
// (not re-exported to avoid name collisions).
