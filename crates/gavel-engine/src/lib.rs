//! # gavel-engine
//!
//! The auction room engine: per-room state machines that run many live
//! auctions concurrently.
//!
//! ## Architecture
//!
//! ```text
//!  client transport
//!        │ commands
//!        ▼
//!  ┌──────────────┐  lookup   ┌──────────────┐
//!  │ AuctionHouse │──────────▶│ RoomRegistry │  RwLock<HashMap<code, Arc<RoomHandle>>>
//!  └──────────────┘           └──────┬───────┘
//!                                    ▼
//!                     ┌───────────────────────────┐
//!                     │ RoomHandle                │
//!                     │  Mutex<Room> ─────────────┼─▶ BidArbiter (arbiter)
//!                     │                           ├─▶ AuctionSequencer (sequencer)
//!                     │  TimerCoordinator ◀───────┼── countdown task (Weak)
//!                     │  EventBroadcaster ────────┼─▶ subscribers
//!                     └───────────────────────────┘
//! ```
//!
//! ## Concurrency
//!
//! Every command that reads then writes a room runs under that room's
//! mutex; different rooms never contend. Countdown tasks take the same
//! mutex for each tick and at expiry, and compare the generation they were
//! armed with against the room's current one before acting. The pause
//! between two lots is a scheduled continuation, never a held lock.

pub mod arbiter;
pub mod broadcaster;
pub mod house;
pub mod ordering;
pub mod registry;
pub mod room;
pub mod sequencer;
pub mod timer;

pub use broadcaster::EventBroadcaster;
pub use house::AuctionHouse;
pub use registry::RoomRegistry;
pub use room::{Room, RoomHandle};
pub use timer::{TimerCoordinator, TimerHandle, TimerState};
