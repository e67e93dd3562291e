use tracing::{debug, info, warn};

use crate::backend::AudioBackend;
use crate::error::AudioError;
use crate::plan::{clamp_gain, GraphPlan};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioState {
    /// No graph exists; waiting for a qualifying gesture.
    Locked,
    /// Graph built and playing.
    Unlocked,
    /// Graph built but paused while the window is hidden.
    Suspended,
}

/// User input forwarded to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    PointerPress,
    KeyPress,
    Scroll,
}

impl Gesture {
    /// Only a click may start playback.
    pub fn unlocks_audio(self) -> bool {
        matches!(self, Gesture::PointerPress)
    }
}

/// Owns the audio backend and the unlock state machine.
pub struct AudioSession<B: AudioBackend> {
    backend: B,
    state: AudioState,
    plan: GraphPlan,
    fallback: Option<GraphPlan>,
    master_gain: f32,
    last_error: Option<AudioError>,
    graphs_built: usize,
}

impl<B: AudioBackend> AudioSession<B> {
    /// `fallback` is tried when `plan` fails because its track cannot be
    /// opened or decoded.
    pub fn new(backend: B, plan: GraphPlan, fallback: Option<GraphPlan>) -> Self {
        let master_gain = plan.master_gain;
        Self {
            backend,
            state: AudioState::Locked,
            plan,
            fallback,
            master_gain,
            last_error: None,
            graphs_built: 0,
        }
    }

    pub fn state(&self) -> AudioState {
        self.state
    }

    pub fn last_error(&self) -> Option<&AudioError> {
        self.last_error.as_ref()
    }

    /// Number of graphs handed to the backend successfully.
    pub fn graphs_built(&self) -> usize {
        self.graphs_built
    }

    pub fn master_gain(&self) -> f32 {
        self.master_gain
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Unlocks on the first qualifying gesture; everything else is a no-op.
    pub fn handle_gesture(&mut self, gesture: Gesture) -> AudioState {
        if self.state != AudioState::Locked || !gesture.unlocks_audio() {
            return self.state;
        }
        match self.unlock() {
            Ok(()) => {
                self.state = AudioState::Unlocked;
                info!(graphs = self.graphs_built, "ambient audio unlocked");
            }
            Err(err) => {
                warn!(error = %err, "audio playback failed; will retry on next click");
                self.last_error = Some(err);
            }
        }
        self.state
    }

    fn unlock(&mut self) -> Result<(), AudioError> {
        self.backend.open()?;
        match self.backend.start(&self.plan) {
            Ok(()) => {
                self.last_error = None;
            }
            Err(err) if err.is_track_error() => {
                let Some(fallback) = self.fallback.as_ref() else {
                    return Err(err);
                };
                warn!(error = %err, "audio track unavailable; falling back to synthesized tones");
                self.backend.start(fallback)?;
                self.last_error = Some(err);
            }
            Err(err) => return Err(err),
        }
        self.graphs_built += 1;
        self.backend.set_master_gain(self.master_gain);
        Ok(())
    }

    /// Pauses while hidden, resumes when shown. Has no effect while locked.
    pub fn set_visible(&mut self, visible: bool) {
        match (self.state, visible) {
            (AudioState::Unlocked, false) => {
                self.backend.set_paused(true);
                self.state = AudioState::Suspended;
                debug!("ambient audio suspended");
            }
            (AudioState::Suspended, true) => {
                self.backend.set_paused(false);
                self.state = AudioState::Unlocked;
                debug!("ambient audio resumed");
            }
            _ => {}
        }
    }

    pub fn set_master_gain(&mut self, gain: f32) {
        self.master_gain = clamp_gain(gain);
        if self.state != AudioState::Locked {
            self.backend.set_master_gain(self.master_gain);
        }
    }

    /// Stops playback and returns to `Locked`.
    pub fn dispose(&mut self) {
        if self.state != AudioState::Locked {
            self.backend.stop();
            self.state = AudioState::Locked;
            debug!("ambient audio disposed");
        }
    }
}

impl<B: AudioBackend> Drop for AudioSession<B> {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::plan::SourcePlan;

    #[derive(Default)]
    struct Recorder {
        opens: usize,
        starts: Vec<GraphPlan>,
        paused: Option<bool>,
        gains: Vec<f32>,
        stops: usize,
        fail_open: bool,
        missing_tracks: bool,
    }

    impl AudioBackend for Recorder {
        fn open(&mut self) -> Result<(), AudioError> {
            self.opens += 1;
            if self.fail_open {
                return Err(AudioError::Output("no device".into()));
            }
            Ok(())
        }

        fn start(&mut self, plan: &GraphPlan) -> Result<(), AudioError> {
            if self.missing_tracks {
                if let Some(SourcePlan::Track { path, .. }) = plan.sources.first() {
                    return Err(AudioError::Track {
                        path: path.clone(),
                        source: std::io::Error::from(std::io::ErrorKind::NotFound),
                    });
                }
            }
            self.starts.push(plan.clone());
            Ok(())
        }

        fn set_paused(&mut self, paused: bool) {
            self.paused = Some(paused);
        }

        fn set_master_gain(&mut self, gain: f32) {
            self.gains.push(gain);
        }

        fn stop(&mut self) {
            self.stops += 1;
        }
    }

    fn track_plan() -> GraphPlan {
        GraphPlan::track(PathBuf::from("ambient-space.mp3"), 0.15)
    }

    fn tone_plan() -> GraphPlan {
        GraphPlan::tones(&sceneconfig::AudioSettings::default().tones, 0.15)
    }

    #[test]
    fn stays_locked_without_a_click() {
        let mut session = AudioSession::new(Recorder::default(), track_plan(), None);
        assert_eq!(session.handle_gesture(Gesture::KeyPress), AudioState::Locked);
        assert_eq!(session.handle_gesture(Gesture::Scroll), AudioState::Locked);
        session.set_visible(false);
        assert_eq!(session.state(), AudioState::Locked);
        assert_eq!(session.backend().opens, 0);
        assert!(session.backend().starts.is_empty());
    }

    #[test]
    fn repeated_clicks_build_one_graph() {
        let mut session = AudioSession::new(Recorder::default(), track_plan(), None);
        assert_eq!(session.handle_gesture(Gesture::PointerPress), AudioState::Unlocked);
        assert_eq!(session.handle_gesture(Gesture::PointerPress), AudioState::Unlocked);
        assert_eq!(session.graphs_built(), 1);
        assert_eq!(session.backend().starts.len(), 1);
        assert_eq!(session.backend().gains, vec![0.15]);
    }

    #[test]
    fn visibility_toggles_suspension() {
        let mut session = AudioSession::new(Recorder::default(), tone_plan(), None);
        session.handle_gesture(Gesture::PointerPress);
        session.set_visible(false);
        assert_eq!(session.state(), AudioState::Suspended);
        assert_eq!(session.backend().paused, Some(true));
        assert_eq!(session.handle_gesture(Gesture::PointerPress), AudioState::Suspended);
        session.set_visible(true);
        assert_eq!(session.state(), AudioState::Unlocked);
        assert_eq!(session.backend().paused, Some(false));
        assert_eq!(session.graphs_built(), 1);
    }

    #[test]
    fn failure_is_stored_and_retried_on_next_click() {
        let backend = Recorder {
            fail_open: true,
            ..Recorder::default()
        };
        let mut session = AudioSession::new(backend, tone_plan(), None);
        assert_eq!(session.handle_gesture(Gesture::PointerPress), AudioState::Locked);
        assert!(matches!(session.last_error(), Some(AudioError::Output(_))));

        session.backend.fail_open = false;
        assert_eq!(session.handle_gesture(Gesture::PointerPress), AudioState::Unlocked);
        assert_eq!(session.backend().opens, 2);
        assert!(session.last_error().is_none());
    }

    #[test]
    fn missing_track_falls_back_to_tones() {
        let backend = Recorder {
            missing_tracks: true,
            ..Recorder::default()
        };
        let mut session = AudioSession::new(backend, track_plan(), Some(tone_plan()));
        assert_eq!(session.handle_gesture(Gesture::PointerPress), AudioState::Unlocked);
        assert!(session.last_error().is_some_and(AudioError::is_track_error));
        assert_eq!(session.backend().starts, vec![tone_plan()]);
    }

    #[test]
    fn missing_track_without_fallback_stays_locked() {
        let backend = Recorder {
            missing_tracks: true,
            ..Recorder::default()
        };
        let mut session = AudioSession::new(backend, track_plan(), None);
        assert_eq!(session.handle_gesture(Gesture::PointerPress), AudioState::Locked);
        assert_eq!(session.graphs_built(), 0);
    }

    #[test]
    fn master_gain_is_clamped_and_forwarded_once_unlocked() {
        let mut session = AudioSession::new(Recorder::default(), tone_plan(), None);
        session.set_master_gain(4.0);
        assert_eq!(session.master_gain(), 1.0);
        assert!(session.backend().gains.is_empty());
        session.handle_gesture(Gesture::PointerPress);
        session.set_master_gain(-0.5);
        assert_eq!(session.backend().gains, vec![1.0, 0.0]);
    }

    #[test]
    fn dispose_returns_to_locked() {
        let mut session = AudioSession::new(Recorder::default(), tone_plan(), None);
        session.dispose();
        assert_eq!(session.backend().stops, 0);
        session.handle_gesture(Gesture::PointerPress);
        session.dispose();
        assert_eq!(session.state(), AudioState::Locked);
        assert_eq!(session.backend().stops, 1);
        session.handle_gesture(Gesture::PointerPress);
        assert_eq!(session.graphs_built(), 2);
    }
}
