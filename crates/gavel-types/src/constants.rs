//! System-wide constants for the Gavel auction engine.

use crate::Amount;

/// Smallest currency units (paise) in one crore.
pub const PAISE_PER_CRORE: Amount = 10_000_000;

/// Default countdown length, in ticks, armed for every lot and every bid.
pub const DEFAULT_COUNTDOWN_TICKS: u32 = 15;

/// Default duration of one countdown tick in milliseconds.
pub const DEFAULT_TICK_MS: u64 = 1000;

/// Default pause between resolving a lot and revealing the next one.
pub const DEFAULT_REVEAL_DELAY_MS: u64 = 3000;

/// Default number of characters in a generated room code.
pub const DEFAULT_ROOM_CODE_LEN: usize = 6;

/// Attempts the registry makes to find an unused room code before giving up.
pub const ROOM_CODE_ATTEMPTS: usize = 32;

/// Default broadcast buffer per room. Slow subscribers past this lag.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Default ceiling on concurrently live rooms per process.
pub const DEFAULT_MAX_ROOMS: usize = 10_000;

/// Default squad cap (lots a single bidder may win).
pub const DEFAULT_SQUAD_CAP: usize = 11;

/// Default maximum number of bidders in one room.
pub const DEFAULT_MAX_BIDDERS: usize = 8;

/// Default starting purse: 100 crore.
pub const DEFAULT_STARTING_PURSE: Amount = 100 * PAISE_PER_CRORE;

/// Default legal bid increments: +0.5 crore and +1 crore.
pub const DEFAULT_BID_INCREMENTS: [Amount; 2] = [PAISE_PER_CRORE / 2, PAISE_PER_CRORE];

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "Gavel";
