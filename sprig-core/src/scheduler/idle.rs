//! Idle-Time Sources
//!
//! The runtime does its work in slices granted by an idle-time source. Each
//! slice comes with an [`IdleDeadline`]; the runtime checks it after every
//! fiber and returns control once the slice is nearly used up. On every
//! invocation it re-arms the source through [`IdleScheduler`], so a later
//! render request is picked up without further wiring.
//!
//! Two sources ship with the crate:
//!
//! - [`IdleFlag`] only records that the runtime asked to run again. Hosts
//!   that drive the runtime themselves (and tests) use it.
//! - [`FrameIdleSource`] hands out per-frame deadlines. A frame with no
//!   spare time is skipped unless the request has waited longer than the
//!   configured timeout, in which case it runs anyway with
//!   `did_timeout` set.

use std::time::{Duration, Instant};

use crate::config::RuntimeConfig;

/// Time left in the current idle slice.
pub trait IdleDeadline {
    fn time_remaining(&self) -> Duration;

    /// Whether the slice was granted because the request timed out rather
    /// than because the host was idle.
    fn did_timeout(&self) -> bool;
}

/// Registration side of an idle-time source.
pub trait IdleScheduler {
    /// Ask to be invoked again at the next idle slice.
    fn schedule_idle_work(&mut self);
}

/// A deadline that never runs out.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbounded;

impl IdleDeadline for Unbounded {
    fn time_remaining(&self) -> Duration {
        Duration::MAX
    }

    fn did_timeout(&self) -> bool {
        false
    }
}

/// An [`IdleScheduler`] that records requests and leaves the timing to the
/// embedder.
#[derive(Debug, Clone, Default)]
pub struct IdleFlag {
    armed: bool,
    requests: u64,
}

impl IdleFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Total number of times the runtime asked to run again.
    pub fn requests(&self) -> u64 {
        self.requests
    }

    /// Consume the pending request, if any.
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.armed)
    }
}

impl IdleScheduler for IdleFlag {
    fn schedule_idle_work(&mut self) {
        self.armed = true;
        self.requests += 1;
    }
}

/// Deadline for one frame's idle slice.
#[derive(Debug, Clone, Copy)]
pub struct FrameDeadline {
    /// `None` when the frame end lies beyond what `Instant` can represent.
    deadline: Option<Instant>,
    did_timeout: bool,
}

impl FrameDeadline {
    pub fn new(deadline: Instant, did_timeout: bool) -> Self {
        Self {
            deadline: Some(deadline),
            did_timeout,
        }
    }
}

impl IdleDeadline for FrameDeadline {
    fn time_remaining(&self) -> Duration {
        self.deadline
            .map_or(Duration::MAX, |deadline| deadline.saturating_duration_since(Instant::now()))
    }

    fn did_timeout(&self) -> bool {
        self.did_timeout
    }
}

/// Frame-budget idle source.
///
/// The frame ends `frame_budget` after it starts. The host calls
/// [`FrameIdleSource::begin_frame`] once per frame; when the runtime has
/// asked to run and the frame still has more than the yield threshold
/// left (or the request timed out), a deadline is returned and the host
/// passes it to [`Runtime::work_loop`](crate::Runtime::work_loop).
#[derive(Debug, Clone)]
pub struct FrameIdleSource {
    frame_budget: Duration,
    idle_timeout: Option<Duration>,
    min_slice: Duration,
    requested_at: Option<Instant>,
}

impl FrameIdleSource {
    pub fn new(config: &RuntimeConfig) -> Self {
        Self {
            frame_budget: config.frame_budget,
            idle_timeout: config.idle_timeout,
            min_slice: config.yield_threshold,
            requested_at: None,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.requested_at.is_some()
    }

    /// Start a frame at `frame_start`, measured against the current time.
    pub fn begin_frame(&mut self, frame_start: Instant) -> Option<FrameDeadline> {
        self.poll(frame_start, Instant::now())
    }

    /// Decide whether the frame starting at `frame_start` grants a slice,
    /// as seen at `now`.
    pub fn poll(&mut self, frame_start: Instant, now: Instant) -> Option<FrameDeadline> {
        let requested_at = self.requested_at?;
        let deadline = frame_start.checked_add(self.frame_budget);
        let remaining = deadline.map_or(Duration::MAX, |deadline| {
            deadline.saturating_duration_since(now)
        });
        let did_timeout = self
            .idle_timeout
            .is_some_and(|timeout| now.saturating_duration_since(requested_at) > timeout);

        if remaining <= self.min_slice && !did_timeout {
            return None;
        }

        self.requested_at = None;
        Some(FrameDeadline {
            deadline,
            did_timeout,
        })
    }
}

impl IdleScheduler for FrameIdleSource {
    fn schedule_idle_work(&mut self) {
        self.requested_at.get_or_insert_with(Instant::now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_flag_counts_requests() {
        let mut flag = IdleFlag::new();
        assert!(!flag.take());
        flag.schedule_idle_work();
        flag.schedule_idle_work();
        assert!(flag.is_armed());
        assert_eq!(flag.requests(), 2);
        assert!(flag.take());
        assert!(!flag.is_armed());
    }

    #[test]
    fn unarmed_source_grants_nothing() {
        let mut source = FrameIdleSource::new(&RuntimeConfig::default());
        let now = Instant::now();
        assert!(source.poll(now, now).is_none());
    }

    #[test]
    fn busy_frame_is_skipped_until_timeout() {
        let config = RuntimeConfig {
            idle_timeout: Some(Duration::from_millis(50)),
            ..RuntimeConfig::default()
        };
        let mut source = FrameIdleSource::new(&config);
        source.schedule_idle_work();
        let requested = Instant::now();

        // The frame is almost over: skip it and stay armed.
        let frame_start = requested;
        let late = frame_start + Duration::from_millis(16);
        assert!(source.poll(frame_start, late).is_none());
        assert!(source.is_armed());

        // Past the timeout the slice is granted even with no time left.
        let much_later = requested + Duration::from_millis(80);
        let deadline = source.poll(much_later - Duration::from_millis(20), much_later).unwrap();
        assert!(deadline.did_timeout());
        assert!(!source.is_armed());
    }

    #[test]
    fn huge_frame_budget_never_runs_out() {
        let config = RuntimeConfig {
            frame_budget: Duration::MAX,
            ..RuntimeConfig::default()
        };
        let mut source = FrameIdleSource::new(&config);
        source.schedule_idle_work();
        let frame_start = Instant::now();
        let deadline = source.poll(frame_start, frame_start).unwrap();
        assert_eq!(deadline.time_remaining(), Duration::MAX);
    }

    #[test]
    fn idle_frame_grants_slice() {
        let mut source = FrameIdleSource::new(&RuntimeConfig::default());
        source.schedule_idle_work();
        let frame_start = Instant::now();
        let deadline = source.poll(frame_start, frame_start).unwrap();
        assert!(!deadline.did_timeout());
    }
}
