//! Frame scheduling
//!
//! The playback loop never spins on its own. It asks a [`FrameScheduler`] for
//! the next frame and the host hands the returned token back when the frame
//! fires (the `requestAnimationFrame` contract). Cancelling a token is the
//! only teardown a run needs: a cancelled token is never delivered again.

use slotmap::{new_key_type, SlotMap};
use std::time::{Duration, Instant};

new_key_type! {
    /// Handle for a requested frame callback
    pub struct FrameToken;
}

/// A frame delivered by a scheduler
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frame {
    pub token: FrameToken,
    /// Scheduler time at which the frame fired
    pub time: Duration,
}

/// Source of frame callbacks for the playback loop
pub trait FrameScheduler {
    /// Current scheduler time, measured from the scheduler's origin
    fn now(&self) -> Duration;

    /// Request a callback on the next frame
    fn request_frame(&mut self) -> FrameToken;

    /// Cancel a pending request. Returns false if it already fired or was
    /// cancelled before.
    fn cancel_frame(&mut self, token: FrameToken) -> bool;

    /// Number of requests waiting for the next frame
    fn pending_frames(&self) -> usize;
}

impl<S: FrameScheduler + ?Sized> FrameScheduler for &mut S {
    fn now(&self) -> Duration {
        (**self).now()
    }

    fn request_frame(&mut self) -> FrameToken {
        (**self).request_frame()
    }

    fn cancel_frame(&mut self, token: FrameToken) -> bool {
        (**self).cancel_frame(token)
    }

    fn pending_frames(&self) -> usize {
        (**self).pending_frames()
    }
}

/// Pending requests in request order
#[derive(Default)]
struct PendingFrames {
    requests: SlotMap<FrameToken, u64>,
    next_seq: u64,
}

impl PendingFrames {
    fn request(&mut self) -> FrameToken {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.requests.insert(seq)
    }

    fn cancel(&mut self, token: FrameToken) -> bool {
        let removed = self.requests.remove(token).is_some();
        if !removed {
            tracing::trace!(?token, "cancel of a frame that already fired");
        }
        removed
    }

    fn drain(&mut self, time: Duration) -> Vec<Frame> {
        let mut due: Vec<(u64, FrameToken)> =
            self.requests.drain().map(|(token, seq)| (seq, token)).collect();
        due.sort_unstable_by_key(|(seq, _)| *seq);
        due.into_iter()
            .map(|(_, token)| Frame { token, time })
            .collect()
    }

    fn len(&self) -> usize {
        self.requests.len()
    }
}

/// Deterministic scheduler driven by explicit frame advances.
///
/// Used by tests and the headless runner: time only moves when
/// [`ManualScheduler::advance_frame`] is called.
pub struct ManualScheduler {
    now: Duration,
    frame_interval: Duration,
    frame_count: u64,
    pending: PendingFrames,
}

impl ManualScheduler {
    /// ~60fps frame interval
    pub const DEFAULT_INTERVAL: Duration = Duration::from_micros(16_667);

    pub fn new() -> Self {
        Self::with_interval(Self::DEFAULT_INTERVAL)
    }

    pub fn with_interval(frame_interval: Duration) -> Self {
        Self {
            now: Duration::ZERO,
            frame_interval,
            frame_count: 0,
            pending: PendingFrames::default(),
        }
    }

    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Move time forward one frame and return the requests that fire.
    ///
    /// Requests made while handling these frames fire on the next advance.
    pub fn advance_frame(&mut self) -> Vec<Frame> {
        self.advance_by(self.frame_interval)
    }

    /// Move time forward by an arbitrary delta as a single frame
    pub fn advance_by(&mut self, delta: Duration) -> Vec<Frame> {
        self.now += delta;
        self.frame_count += 1;
        self.pending.drain(self.now)
    }
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameScheduler for ManualScheduler {
    fn now(&self) -> Duration {
        self.now
    }

    fn request_frame(&mut self) -> FrameToken {
        self.pending.request()
    }

    fn cancel_frame(&mut self, token: FrameToken) -> bool {
        self.pending.cancel(token)
    }

    fn pending_frames(&self) -> usize {
        self.pending.len()
    }
}

/// Wall-clock scheduler for interactive hosts.
///
/// The host calls [`SystemScheduler::take_due`] once per display refresh.
pub struct SystemScheduler {
    origin: Instant,
    pending: PendingFrames,
}

impl SystemScheduler {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            pending: PendingFrames::default(),
        }
    }

    /// Fire every pending request at the current wall-clock time
    pub fn take_due(&mut self) -> Vec<Frame> {
        let now = self.now();
        self.pending.drain(now)
    }
}

impl Default for SystemScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameScheduler for SystemScheduler {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn request_frame(&mut self) -> FrameToken {
        self.pending.request()
    }

    fn cancel_frame(&mut self, token: FrameToken) -> bool {
        self.pending.cancel(token)
    }

    fn pending_frames(&self) -> usize {
        self.pending.len()
    }
}
