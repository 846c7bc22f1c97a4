//! Repaint scheduling.
//!
//! Coalesces bursts of parameter and viewport changes into at most one
//! queued render pass. The host loop calls [`RepaintScheduler::poll`] at its
//! refresh cadence; when it returns true the host runs one pass bracketed by
//! [`RepaintScheduler::begin_pass`] and [`RepaintScheduler::finish_pass`].
//!
//! ```text
//! Idle --invalidate--> Scheduled --begin_pass--> Computing --finish_pass--> Idle
//!                        ^   |                      |
//!                        +---+ coalesce             +--> Scheduled (one follow-up)
//! ```

use std::time::{Duration, Instant};

/// Render pass state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderState {
    /// Nothing pending.
    #[default]
    Idle,
    /// A pass is queued for the next refresh boundary.
    Scheduled,
    /// A pass is running.
    Computing,
}

/// Scheduler counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Invalidations that queued a new pass.
    pub scheduled: u64,
    /// Invalidations absorbed by an already pending pass.
    pub coalesced: u64,
    /// Invalidations dropped because no image was loaded.
    pub ignored: u64,
    /// Passes run to completion.
    pub completed: u64,
}

/// Single-slot, last-write-wins repaint scheduler.
#[derive(Debug, Clone)]
pub struct RepaintScheduler {
    state: RenderState,
    follow_up: bool,
    interval: Duration,
    last_pass: Option<Instant>,
    stats: SchedulerStats,
}

impl RepaintScheduler {
    /// Create a scheduler that runs at most one pass per `interval`.
    pub fn new(interval: Duration) -> Self {
        Self {
            state: RenderState::Idle,
            follow_up: false,
            interval,
            last_pass: None,
            stats: SchedulerStats::default(),
        }
    }

    /// Current state.
    pub fn state(&self) -> RenderState {
        self.state
    }

    /// True when a pass is queued or a follow-up is owed.
    pub fn is_pending(&self) -> bool {
        self.state == RenderState::Scheduled || self.follow_up
    }

    /// Counters since creation.
    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    /// Note that the output is stale. Returns true if this call queued a new pass.
    pub fn invalidate(&mut self, has_image: bool) -> bool {
        if !has_image {
            self.stats.ignored += 1;
            return false;
        }
        match self.state {
            RenderState::Idle => {
                self.state = RenderState::Scheduled;
                self.stats.scheduled += 1;
                true
            }
            RenderState::Scheduled => {
                self.stats.coalesced += 1;
                log::trace!("repaint coalesced into pending pass");
                false
            }
            RenderState::Computing => {
                if self.follow_up {
                    self.stats.coalesced += 1;
                    false
                } else {
                    self.follow_up = true;
                    self.stats.scheduled += 1;
                    true
                }
            }
        }
    }

    /// Refresh-boundary check: true when a pass is queued and the interval since
    /// the last pass has elapsed.
    pub fn poll(&self, now: Instant) -> bool {
        if self.state != RenderState::Scheduled {
            return false;
        }
        match self.last_pass {
            Some(last) => now.saturating_duration_since(last) >= self.interval,
            None => true,
        }
    }

    /// Enter `Computing`. Returns false, and changes nothing, unless a pass is queued.
    pub fn begin_pass(&mut self, now: Instant) -> bool {
        if self.state != RenderState::Scheduled {
            return false;
        }
        self.state = RenderState::Computing;
        self.last_pass = Some(now);
        true
    }

    /// Leave `Computing`, queueing the follow-up pass if one was requested.
    pub fn finish_pass(&mut self) {
        if self.state != RenderState::Computing {
            return;
        }
        self.stats.completed += 1;
        if std::mem::take(&mut self.follow_up) {
            self.state = RenderState::Scheduled;
        } else {
            self.state = RenderState::Idle;
        }
    }

    /// Drop any queued work, e.g. when the image is unloaded.
    pub fn cancel(&mut self) {
        self.state = RenderState::Idle;
        self.follow_up = false;
    }
}

impl Default for RepaintScheduler {
    fn default() -> Self {
        Self::new(Duration::from_millis(16))
    }
}
