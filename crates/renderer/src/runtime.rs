use std::fmt;
use std::time::{Duration, Instant};

use sceneconfig::AnimationSettings;

/// Snapshot of the time state handed to the per-frame step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSample {
    /// Time elapsed since the previous sample.
    pub delta: Duration,
    /// Monotonic frame counter for the running loop.
    pub frame_index: u64,
}

impl TimeSample {
    /// Creates a new time sample.
    pub fn new(delta: Duration, frame_index: u64) -> Self {
        Self { delta, frame_index }
    }
}

/// Abstraction over where frame deltas originate from.
pub trait FrameClock {
    /// Forgets the previous sample so the next delta starts from zero.
    fn reset(&mut self);
    /// Produces the delta for a frame rendered at `now`.
    fn sample(&mut self, now: Instant) -> TimeSample;
}

/// Clock backed by the system monotonic clock.
///
/// Deltas are clamped to `max_step` so a window that was dragged, occluded or
/// stopped in a debugger does not fast-forward the animation.
#[derive(Debug, Clone, Copy)]
pub struct WallClock {
    last: Option<Instant>,
    max_step: Duration,
    frame: u64,
}

impl WallClock {
    pub fn new(max_step: Duration) -> Self {
        Self {
            last: None,
            max_step,
            frame: 0,
        }
    }
}

impl FrameClock for WallClock {
    fn reset(&mut self) {
        self.last = None;
    }

    fn sample(&mut self, now: Instant) -> TimeSample {
        let delta = self
            .last
            .map(|last| now.saturating_duration_since(last).min(self.max_step))
            .unwrap_or(Duration::ZERO);
        self.last = Some(now);
        let sample = TimeSample::new(delta, self.frame);
        self.frame = self.frame.saturating_add(1);
        sample
    }
}

/// Clock that advances by the same step every frame regardless of wall time.
#[derive(Debug, Clone, Copy)]
pub struct FixedStep {
    step: Duration,
    frame: u64,
}

impl FixedStep {
    pub fn new(step: Duration) -> Self {
        Self { step, frame: 0 }
    }

    pub fn step(&self) -> Duration {
        self.step
    }
}

impl FrameClock for FixedStep {
    fn reset(&mut self) {}

    fn sample(&mut self, _now: Instant) -> TimeSample {
        let sample = TimeSample::new(self.step, self.frame);
        self.frame = self.frame.saturating_add(1);
        sample
    }
}

/// Convenient alias for owning clocks behind trait objects.
pub type BoxedFrameClock = Box<dyn FrameClock>;

/// Builds the clock requested by the animation settings.
pub fn clock_for(settings: &AnimationSettings) -> BoxedFrameClock {
    match settings.fixed_step {
        Some(step) => Box::new(FixedStep::new(step)),
        None => Box::new(WallClock::new(settings.max_step)),
    }
}

/// Result of a single [`FrameLoop::tick`].
#[derive(Debug)]
pub enum FrameOutcome<E> {
    /// The step ran and succeeded.
    Rendered,
    /// The step failed; the loop stays armed for the next frame.
    Failed(E),
    /// The loop is paused; nothing ran.
    Skipped,
}

/// Explicit game loop: a running flag, a clock, and a single-step update.
///
/// The host (winit's redraw callback) calls [`FrameLoop::tick`] once per
/// frame. A failing step is logged and counted but never stops the loop.
pub struct FrameLoop {
    clock: BoxedFrameClock,
    running: bool,
    frames: u64,
    failed_frames: u64,
}

impl FrameLoop {
    pub fn new(clock: BoxedFrameClock) -> Self {
        Self {
            clock,
            running: true,
            frames: 0,
            failed_frames: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Resumes stepping; the paused interval is not fed to the animation.
    pub fn resume(&mut self) {
        if !self.running {
            self.clock.reset();
            self.running = true;
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn failed_frames(&self) -> u64 {
        self.failed_frames
    }

    pub fn tick<F, E>(&mut self, now: Instant, step: F) -> FrameOutcome<E>
    where
        F: FnOnce(TimeSample) -> Result<(), E>,
        E: fmt::Display,
    {
        if !self.running {
            return FrameOutcome::Skipped;
        }

        let sample = self.clock.sample(now);
        self.frames = self.frames.saturating_add(1);
        match step(sample) {
            Ok(()) => FrameOutcome::Rendered,
            Err(err) => {
                self.failed_frames = self.failed_frames.saturating_add(1);
                tracing::warn!(
                    frame = sample.frame_index,
                    failed_frames = self.failed_frames,
                    error = %err,
                    "frame step failed; continuing with the next frame"
                );
                FrameOutcome::Failed(err)
            }
        }
    }
}

/// Decides when the next redraw should be requested under an optional FPS cap.
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    interval: Option<Duration>,
    last_frame: Option<Instant>,
}

impl FrameScheduler {
    /// `target_fps` of `None`, `<= 0`, or too small to express as a frame
    /// interval means uncapped.
    pub fn new(target_fps: Option<f32>) -> Self {
        let interval = target_fps
            .filter(|fps| fps.is_finite() && *fps > 0.0)
            .and_then(|fps| Duration::try_from_secs_f32(1.0 / fps).ok());
        Self {
            interval,
            last_frame: None,
        }
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    pub fn ready_for_frame(&self, now: Instant) -> bool {
        match self.next_deadline() {
            Some(deadline) => now >= deadline,
            None => true,
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.interval, self.last_frame) {
            (Some(interval), Some(last)) => Some(last + interval),
            _ => None,
        }
    }

    pub fn mark_rendered(&mut self, now: Instant) {
        self.last_frame = Some(now);
    }

    pub fn reset(&mut self) {
        self.last_frame = None;
    }
}
