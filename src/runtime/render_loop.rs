use std::time::Duration;

use crate::runtime::scheduler::{FrameScheduler, FrameToken};

/// Minimum time between quilt regenerations.
pub const QUILT_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
}

/// Work for one accepted tick. The disc spins and the frame re-composites on every tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickPlan {
    pub regenerate_quilt: bool,
}

/// Frame-loop state machine over an injected scheduler.
#[derive(Debug)]
pub struct RenderLoop<S: FrameScheduler> {
    scheduler: S,
    state: LoopState,
    pending: Option<FrameToken>,
    last_quilt: Option<Duration>,
}

impl<S: FrameScheduler> RenderLoop<S> {
    pub fn new(scheduler: S) -> Self {
        Self {
            scheduler,
            state: LoopState::Idle,
            pending: None,
            last_quilt: None,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    pub fn pending_token(&self) -> Option<FrameToken> {
        self.pending
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// Enter `Running` and schedule the first frame. No-op while running.
    pub fn start(&mut self) {
        if self.state == LoopState::Running {
            return;
        }
        self.state = LoopState::Running;
        self.last_quilt = None;
        self.pending = Some(self.scheduler.request_frame());
        tracing::debug!("render loop started");
    }

    /// Return to `Idle` and cancel the pending frame. No-op while idle.
    pub fn stop(&mut self) {
        if self.state == LoopState::Idle {
            return;
        }
        self.state = LoopState::Idle;
        if let Some(token) = self.pending.take() {
            self.scheduler.cancel_frame(token);
        }
        tracing::debug!("render loop stopped");
    }

    /// Accept a frame callback at time `now`.
    ///
    /// Returns `None` for stale or unexpected tokens. Otherwise the next frame is requested
    /// before the plan is returned.
    pub fn on_frame(&mut self, token: FrameToken, now: Duration) -> Option<TickPlan> {
        if self.state != LoopState::Running || self.pending != Some(token) {
            tracing::trace!(?token, "dropping stale frame callback");
            return None;
        }
        self.pending = Some(self.scheduler.request_frame());

        let regenerate_quilt = match self.last_quilt {
            None => true,
            Some(last) => now.saturating_sub(last) > QUILT_INTERVAL,
        };
        if regenerate_quilt {
            self.last_quilt = Some(now);
        }
        Some(TickPlan { regenerate_quilt })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/runtime/render_loop.rs"]
mod tests;
