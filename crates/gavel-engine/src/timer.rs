//! Countdown coordination: at most one authoritative timer per room.
//!
//! Every [`arm`](TimerCoordinator::arm) and [`disarm`](TimerCoordinator::disarm)
//! bumps a per-room generation counter. A countdown task captures the
//! generation it was spawned with and, on every wake, re-checks it under the
//! room lock before emitting a tick or resolving the lot. A superseded task
//! therefore exits without side effects even if its abort raced the wake-up.
//!
//! ```text
//!   Idle ──arm──▶ Armed ──deadline──▶ Expired ──disarm──▶ Idle
//!                   │                                      ▲
//!                   └──────────disarm / rearm──────────────┘
//!   Idle ──schedule_reveal──▶ Revealing ──continuation──▶ Idle
//! ```
//!
//! The reveal pause between two lots uses the same generation counter, so
//! ending the auction during the pause makes the pending continuation inert.

use std::sync::Weak;
use std::time::Duration;

use gavel_types::{GavelError, Result, RoomCode, RoomPhase, TimerConfig};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::room::RoomHandle;

/// Observable state of a room's timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    /// A countdown is running.
    Armed,
    /// The countdown reached its deadline; resolution is in progress.
    Expired,
    /// Waiting to reveal the next lot.
    Revealing,
}

/// Identity of one armed countdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerHandle {
    pub room: RoomCode,
    pub generation: u64,
    pub deadline: Instant,
}

/// Per-room owner of the countdown task.
///
/// Lives inside the room state, so every method runs under the room lock.
#[derive(Debug)]
pub struct TimerCoordinator {
    room: RoomCode,
    target: Weak<RoomHandle>,
    config: TimerConfig,
    generation: u64,
    state: TimerState,
    deadline: Option<Instant>,
    task: Option<JoinHandle<()>>,
}

impl TimerCoordinator {
    #[must_use]
    pub fn new(room: RoomCode, target: Weak<RoomHandle>, config: TimerConfig) -> Self {
        Self {
            room,
            target,
            config,
            generation: 0,
            state: TimerState::Idle,
            deadline: None,
            task: None,
        }
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn state(&self) -> TimerState {
        self.state
    }

    #[must_use]
    pub fn reveal_delay(&self) -> Duration {
        self.config.reveal_delay
    }

    /// Start a fresh countdown, superseding any previous one.
    ///
    /// # Errors
    /// `InvalidState` if the room has no lot on the block. Nothing changes.
    pub fn arm(&mut self, phase: RoomPhase) -> Result<TimerHandle> {
        if phase != RoomPhase::Bidding {
            return Err(GavelError::invalid_state("arm the countdown", phase));
        }
        self.cancel_task();
        self.generation += 1;
        let deadline = Instant::now() + self.config.countdown();
        let handle = TimerHandle {
            room: self.room.clone(),
            generation: self.generation,
            deadline,
        };
        self.task = Some(tokio::spawn(run_countdown(
            self.target.clone(),
            handle.clone(),
            self.config.tick_interval,
            self.config.countdown_ticks,
        )));
        self.state = TimerState::Armed;
        self.deadline = Some(deadline);
        tracing::debug!(room = %self.room, generation = self.generation, "Countdown armed");
        Ok(handle)
    }

    /// Invalidate whatever is scheduled. Idempotent.
    pub fn disarm(&mut self) {
        self.generation += 1;
        if self.state != TimerState::Idle {
            tracing::debug!(room = %self.room, generation = self.generation, "Timer disarmed");
        }
        self.cancel_task();
        self.state = TimerState::Idle;
        self.deadline = None;
    }

    /// Disarm immediately followed by arm.
    ///
    /// # Errors
    /// Same as [`arm`](Self::arm); the old countdown is disarmed either way.
    pub fn rearm(&mut self, phase: RoomPhase) -> Result<TimerHandle> {
        self.disarm();
        self.arm(phase)
    }

    /// Whether `generation` is the live countdown.
    #[must_use]
    pub fn is_current(&self, generation: u64) -> bool {
        self.state == TimerState::Armed && self.generation == generation
    }

    /// Claim the expiry for `generation`. Returns `false` when superseded.
    ///
    /// On success the running task is detached rather than aborted, since it
    /// is the caller.
    pub fn expire(&mut self, generation: u64) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        drop(self.task.take());
        self.state = TimerState::Expired;
        self.deadline = None;
        true
    }

    /// Schedule the continuation that reveals the next lot after the pause.
    pub fn schedule_reveal(&mut self) -> u64 {
        self.cancel_task();
        self.generation += 1;
        self.state = TimerState::Revealing;
        self.deadline = None;
        self.task = Some(tokio::spawn(run_reveal(
            self.target.clone(),
            self.generation,
            self.config.reveal_delay,
        )));
        tracing::debug!(room = %self.room, generation = self.generation, "Reveal scheduled");
        self.generation
    }

    /// Claim the reveal continuation for `generation`. Returns `false` when
    /// superseded.
    pub fn take_reveal(&mut self, generation: u64) -> bool {
        if self.state != TimerState::Revealing || self.generation != generation {
            return false;
        }
        drop(self.task.take());
        self.state = TimerState::Idle;
        true
    }

    /// Whole ticks left on the live countdown, rounded up.
    #[must_use]
    pub fn seconds_remaining(&self) -> Option<u32> {
        let deadline = self.deadline?;
        if self.state != TimerState::Armed {
            return None;
        }
        let left = deadline.saturating_duration_since(Instant::now()).as_millis();
        let tick = self.config.tick_interval.as_millis().max(1);
        Some(u32::try_from(left.div_ceil(tick)).unwrap_or(u32::MAX))
    }

    fn cancel_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for TimerCoordinator {
    fn drop(&mut self) {
        self.cancel_task();
    }
}

/// One countdown: a tick per interval, then expiry at the deadline.
///
/// Sleeps are measured from the deadline so a slow tick never stretches
/// the countdown.
async fn run_countdown(
    target: Weak<RoomHandle>,
    handle: TimerHandle,
    interval: Duration,
    ticks: u32,
) {
    let started = handle.deadline - interval * ticks;
    for elapsed in 0..ticks {
        let Some(room) = target.upgrade() else {
            return;
        };
        if !room.on_tick(handle.generation, ticks - elapsed).await {
            return;
        }
        drop(room);
        tokio::time::sleep_until(started + interval * (elapsed + 1)).await;
    }
    if let Some(room) = target.upgrade() {
        room.on_expiry(handle.generation).await;
    }
}

async fn run_reveal(target: Weak<RoomHandle>, generation: u64, delay: Duration) {
    tokio::time::sleep(delay).await;
    if let Some(room) = target.upgrade() {
        room.on_reveal(generation).await;
    }
}
