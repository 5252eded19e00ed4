use std::collections::BTreeSet;

/// Handle for one requested frame callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameToken(pub u64);

/// Source of frame callbacks (display refresh, timer, test harness).
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameToken;
    fn cancel_frame(&mut self, token: FrameToken);
}

/// Scheduler driven by hand: requested tokens queue up until the host fires them.
///
/// Serves both as the test double and as the headless driver used by the CLI.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next: u64,
    pending: BTreeSet<FrameToken>,
    requested: u64,
    cancelled: u64,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tokens requested and not yet fired or cancelled, oldest first.
    pub fn pending(&self) -> Vec<FrameToken> {
        self.pending.iter().copied().collect()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Remove and return the oldest pending token for delivery.
    pub fn fire_next(&mut self) -> Option<FrameToken> {
        self.pending.pop_first()
    }

    pub fn requested_total(&self) -> u64 {
        self.requested
    }

    pub fn cancelled_total(&self) -> u64 {
        self.cancelled
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameToken {
        self.next += 1;
        self.requested += 1;
        let token = FrameToken(self.next);
        self.pending.insert(token);
        token
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        if self.pending.remove(&token) {
            self.cancelled += 1;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/runtime/scheduler.rs"]
mod tests;
