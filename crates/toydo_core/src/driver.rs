//! Render loop driver.
//!
//! The platform hands out frame callbacks through a [`FrameScheduler`];
//! [`FrameLoop`] owns the pending [`FrameToken`], throttles stepping to the
//! target frame rate, pauses while the app is not in the foreground and
//! never steps again once torn down.
//!
//! Lifecycle:
//!
//! ```text
//! Idle --start--> Running --Inactive/Background--> Paused --Active--> Running
//!                    |                                                  ^
//!                    +--scheduling error--> Stalled --Active------------+
//! any --teardown--> Stopped
//! ```

use crate::config::Tuning;
use crate::physics::{PhysicsWorld, StepReport};
use thiserror::Error;
use toydo_metrics::{FrameCounter, FrameCounters, FrameTimer};
use tracing::{debug, warn};

/// Frames arriving this much early still count as on time.
const FRAME_TOLERANCE_MS: f64 = 0.5;
/// Stepped frames averaged by the frame timer.
const TIMER_WINDOW: usize = 60;

/// Anything the loop can advance.
pub trait Simulation {
    fn advance(&mut self, delta_ms: f32) -> StepReport;
}

impl<P: Clone> Simulation for PhysicsWorld<P> {
    fn advance(&mut self, delta_ms: f32) -> StepReport {
        self.step(delta_ms)
    }
}

/// Opaque id of one requested frame. Dropping a request means cancelling
/// its token with the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameToken(u64);

impl FrameToken {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("frame request refused: {reason}")]
    Refused { reason: String },

    #[error("frame scheduler is closed")]
    Closed,
}

/// Platform frame source.
pub trait FrameScheduler {
    fn request_frame(&mut self) -> Result<FrameToken, ScheduleError>;
    fn cancel_frame(&mut self, token: FrameToken);
}

/// In-process scheduler: hands out sequential tokens and remembers the
/// pending one. Can be told to refuse requests.
#[derive(Debug, Clone, Default)]
pub struct HeadlessScheduler {
    next_id: u64,
    pending: Option<FrameToken>,
    refusing: bool,
    requests: u64,
    cancellations: u64,
}

impl HeadlessScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_refusing(&mut self, refusing: bool) {
        self.refusing = refusing;
    }

    /// Token the platform would fire next.
    pub fn pending(&self) -> Option<FrameToken> {
        self.pending
    }

    /// Take the pending token, as the platform does when it fires.
    pub fn fire(&mut self) -> Option<FrameToken> {
        self.pending.take()
    }

    pub fn requests(&self) -> u64 {
        self.requests
    }

    pub fn cancellations(&self) -> u64 {
        self.cancellations
    }
}

impl FrameScheduler for HeadlessScheduler {
    fn request_frame(&mut self) -> Result<FrameToken, ScheduleError> {
        if self.refusing {
            return Err(ScheduleError::Refused {
                reason: "headless scheduler is refusing requests".to_string(),
            });
        }
        self.requests += 1;
        self.next_id += 1;
        let token = FrameToken(self.next_id);
        self.pending = Some(token);
        Ok(token)
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        if self.pending == Some(token) {
            self.pending = None;
        }
        self.cancellations += 1;
    }
}

/// Foreground state reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppState {
    Active,
    Inactive,
    Background,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopState {
    Idle,
    Running,
    Paused,
    /// The scheduler refused a request; nothing advances until resumed.
    Stalled,
    Stopped,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FrameEvent {
    Ticked {
        frame: u64,
        delta_ms: f32,
        report: StepReport,
    },
    /// `true` when the loop paused, `false` when it resumed.
    Paused(bool),
}

pub type Subscriber = Box<dyn FnMut(&FrameEvent)>;

pub struct FrameLoop<S: FrameScheduler> {
    scheduler: S,
    state: LoopState,
    pending: Option<FrameToken>,
    frame_interval_ms: f64,
    last_ms: Option<f64>,
    frames: u64,
    subscribers: Vec<Subscriber>,
    timer: FrameTimer,
    counters: FrameCounters,
}

impl<S: FrameScheduler> FrameLoop<S> {
    pub fn new(scheduler: S, target_fps: u32) -> Self {
        Self {
            scheduler,
            state: LoopState::Idle,
            pending: None,
            frame_interval_ms: 1000.0 / target_fps.max(1) as f64,
            last_ms: None,
            frames: 0,
            subscribers: Vec::new(),
            timer: FrameTimer::new(TIMER_WINDOW),
            counters: FrameCounters::new(),
        }
    }

    pub fn from_tuning(scheduler: S, tuning: &Tuning) -> Self {
        Self::new(scheduler, tuning.target_fps)
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Frames that advanced the simulation.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn pending_token(&self) -> Option<FrameToken> {
        self.pending
    }

    pub fn frame_interval_ms(&self) -> f64 {
        self.frame_interval_ms
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn timer(&self) -> &FrameTimer {
        &self.timer
    }

    pub fn counters(&self) -> &FrameCounters {
        &self.counters
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&FrameEvent) + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    fn emit(&mut self, event: FrameEvent) {
        for subscriber in &mut self.subscribers {
            subscriber(&event);
        }
    }

    fn request(&mut self) {
        match self.scheduler.request_frame() {
            Ok(token) => self.pending = Some(token),
            Err(error) => {
                warn!(%error, "frame request failed, render loop stalled");
                self.pending = None;
                self.state = LoopState::Stalled;
                self.counters.increment(FrameCounter::Stalled);
            }
        }
    }

    fn cancel_pending(&mut self) {
        if let Some(token) = self.pending.take() {
            self.scheduler.cancel_frame(token);
        }
    }

    /// Begin requesting frames. Only an idle loop starts.
    pub fn start(&mut self) -> LoopState {
        if self.state == LoopState::Idle {
            self.state = LoopState::Running;
            self.last_ms = None;
            self.request();
        }
        self.state
    }

    /// Handle a fired frame. Steps `sim` when enough time has passed since
    /// the last stepped frame and returns its report.
    pub fn on_frame(
        &mut self,
        token: FrameToken,
        now_ms: f64,
        sim: &mut impl Simulation,
    ) -> Option<StepReport> {
        if self.state != LoopState::Running || self.pending != Some(token) {
            debug!(token = token.id(), state = ?self.state, "ignoring stale frame");
            return None;
        }
        self.pending = None;

        let Some(last_ms) = self.last_ms else {
            self.last_ms = Some(now_ms);
            self.timer.reset_reference();
            self.timer.record(now_ms);
            self.request();
            return None;
        };

        let elapsed = now_ms - last_ms;
        if elapsed + FRAME_TOLERANCE_MS < self.frame_interval_ms {
            self.counters.increment(FrameCounter::Skipped);
            self.request();
            return None;
        }

        self.last_ms = Some(now_ms);
        let delta_ms = elapsed as f32;
        let report = sim.advance(delta_ms);
        self.frames += 1;
        self.timer.record(now_ms);
        self.counters.increment(FrameCounter::Stepped);
        for _ in &report.frozen {
            self.counters.increment(FrameCounter::Frozen);
        }

        self.emit(FrameEvent::Ticked {
            frame: self.frames,
            delta_ms,
            report: report.clone(),
        });
        if self.state == LoopState::Running {
            self.request();
        }
        Some(report)
    }

    /// Pause in the background, resume in the foreground.
    pub fn set_app_state(&mut self, app_state: AppState) {
        match (app_state, self.state) {
            (AppState::Active, LoopState::Paused | LoopState::Stalled) => {
                self.state = LoopState::Running;
                self.last_ms = None;
                self.request();
                if self.state == LoopState::Running {
                    self.emit(FrameEvent::Paused(false));
                }
            }
            (AppState::Inactive | AppState::Background, LoopState::Running | LoopState::Stalled) => {
                self.cancel_pending();
                self.state = LoopState::Paused;
                self.emit(FrameEvent::Paused(true));
            }
            _ => {}
        }
    }

    /// Cancel the pending frame and drop subscribers. Final.
    pub fn teardown(&mut self) {
        if self.state == LoopState::Stopped {
            return;
        }
        self.cancel_pending();
        self.subscribers.clear();
        self.state = LoopState::Stopped;
    }
}

impl<S: FrameScheduler> Drop for FrameLoop<S> {
    fn drop(&mut self) {
        self.teardown();
    }
}
