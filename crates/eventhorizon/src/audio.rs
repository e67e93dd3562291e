//! Bridges window activity to the ambient audio session.

use std::path::Path;

use ambient::{AudioBackend, AudioSession, AudioState, Gesture, GraphPlan, RodioBackend};
use renderer::FrameHooks;
use sceneconfig::AudioSettings;
use tracing::{debug, info};

/// Window hooks that own the audio session. `session` is `None` when audio
/// is disabled, in which case every hook is a no-op.
pub struct AmbientHooks<B: AudioBackend = RodioBackend> {
    session: Option<AudioSession<B>>,
}

impl AmbientHooks<RodioBackend> {
    pub fn from_settings(settings: &AudioSettings, default_track: &Path) -> Self {
        Self::with_backend(settings, default_track, RodioBackend::new)
    }
}

impl<B: AudioBackend> AmbientHooks<B> {
    pub fn with_backend(
        settings: &AudioSettings,
        default_track: &Path,
        backend: impl FnOnce() -> B,
    ) -> Self {
        if !settings.enabled {
            info!("ambient audio disabled");
            return Self { session: None };
        }

        let plan = GraphPlan::from_settings(settings, Some(default_track));
        let fallback = (plan.has_track() && !settings.tones.is_empty())
            .then(|| GraphPlan::tones(&settings.tones, settings.volume));
        debug!(
            track = plan.has_track(),
            sources = plan.sources.len(),
            fallback = fallback.is_some(),
            "planned ambient audio graph"
        );
        Self {
            session: Some(AudioSession::new(backend(), plan, fallback)),
        }
    }

    pub fn session(&self) -> Option<&AudioSession<B>> {
        self.session.as_ref()
    }
}

impl<B: AudioBackend> FrameHooks for AmbientHooks<B> {
    fn on_pointer_press(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.handle_gesture(Gesture::PointerPress);
        }
    }

    fn on_visibility_changed(&mut self, visible: bool) {
        if let Some(session) = self.session.as_mut() {
            session.set_visible(visible);
        }
    }

    fn status(&self) -> Option<String> {
        let session = self.session.as_ref()?;
        match (session.state(), session.last_error()) {
            (AudioState::Locked, Some(err)) => Some(format!("audio unavailable: {err}")),
            (AudioState::Locked, None) => Some("click to enable audio".to_string()),
            (AudioState::Unlocked, Some(_)) => Some("synthesized audio".to_string()),
            (AudioState::Unlocked, None) => None,
            (AudioState::Suspended, _) => Some("audio paused".to_string()),
        }
    }

    fn on_exit(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.dispose();
        }
    }
}

#[cfg(test)]
mod tests {
    use ambient::AudioError;

    use super::*;

    #[derive(Default)]
    struct Silent {
        started: usize,
        refuse: bool,
    }

    impl AudioBackend for Silent {
        fn open(&mut self) -> Result<(), AudioError> {
            if self.refuse {
                Err(AudioError::Output("no device".into()))
            } else {
                Ok(())
            }
        }

        fn start(&mut self, _plan: &GraphPlan) -> Result<(), AudioError> {
            self.started += 1;
            Ok(())
        }

        fn set_paused(&mut self, _paused: bool) {}

        fn set_master_gain(&mut self, _gain: f32) {}

        fn stop(&mut self) {}
    }

    fn missing_track() -> &'static Path {
        Path::new("/definitely/missing/ambient-space.mp3")
    }

    #[test]
    fn disabled_audio_has_no_session() {
        let settings = AudioSettings {
            enabled: false,
            ..AudioSettings::default()
        };
        let mut hooks = AmbientHooks::with_backend(&settings, missing_track(), Silent::default);
        hooks.on_pointer_press();
        assert!(hooks.session().is_none());
        assert_eq!(hooks.status(), None);
    }

    #[test]
    fn status_follows_the_unlock_sequence() {
        let mut hooks =
            AmbientHooks::with_backend(&AudioSettings::default(), missing_track(), Silent::default);
        assert_eq!(hooks.status().as_deref(), Some("click to enable audio"));

        hooks.on_pointer_press();
        hooks.on_pointer_press();
        assert_eq!(hooks.status(), None);
        assert_eq!(hooks.session().map(|s| s.backend().started), Some(1));

        hooks.on_visibility_changed(false);
        assert_eq!(hooks.status().as_deref(), Some("audio paused"));
        hooks.on_visibility_changed(true);
        hooks.on_exit();
        assert_eq!(
            hooks.session().map(AudioSession::state),
            Some(AudioState::Locked)
        );
    }

    #[test]
    fn failed_unlock_is_reported_in_status() {
        let mut hooks = AmbientHooks::with_backend(&AudioSettings::default(), missing_track(), || {
            Silent {
                refuse: true,
                ..Silent::default()
            }
        });
        hooks.on_pointer_press();
        let status = hooks.status().unwrap_or_default();
        assert!(status.starts_with("audio unavailable"), "{status}");
    }
}
