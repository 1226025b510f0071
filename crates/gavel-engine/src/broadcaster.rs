//! Per-room fan-out of state-change notifications.
//!
//! Wraps a `tokio::sync::broadcast` channel. Every event is stamped with a
//! gap-free per-room sequence number before it is sent, so subscribers that
//! fall behind the buffer can detect the gap and re-query the room.
//!
//! Delivery is best-effort: emitting with no subscribers is not an error,
//! and a lagging subscriber loses the oldest notifications, never the room.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use gavel_types::{RoomCode, RoomEvent, RoomNotification};
use tokio::sync::broadcast;

/// Room-wide event fan-out.
#[derive(Debug)]
pub struct EventBroadcaster {
    room: RoomCode,
    tx: broadcast::Sender<RoomNotification>,
    next_seq: AtomicU64,
}

impl EventBroadcaster {
    /// Create a broadcaster buffering up to `capacity` undelivered events
    /// per subscriber.
    #[must_use]
    pub fn new(room: RoomCode, capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self {
            room,
            tx,
            next_seq: AtomicU64::new(0),
        }
    }

    /// Subscribe to every event emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<RoomNotification> {
        self.tx.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Stamp and send an event. Returns the sequence number it was given.
    pub fn emit(&self, event: RoomEvent) -> u64 {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let name = event.name();
        let notification = RoomNotification {
            room: self.room.clone(),
            seq,
            emitted_at: Utc::now(),
            event,
        };
        match self.tx.send(notification) {
            Ok(receivers) => {
                tracing::trace!(room = %self.room, seq, event = name, receivers, "Event emitted");
            }
            Err(_) => {
                tracing::trace!(room = %self.room, seq, event = name, "Event dropped: no subscribers");
            }
        }
        seq
    }
}
