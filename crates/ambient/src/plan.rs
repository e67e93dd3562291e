use std::path::{Path, PathBuf};

use sceneconfig::{AudioSettings, ToneSettings};

/// File name of the looping track inside the data directory.
pub const DEFAULT_TRACK_FILE: &str = "ambient-space.mp3";

/// One sound-producing node and the gain node in front of it.
#[derive(Debug, Clone, PartialEq)]
pub enum SourcePlan {
    /// Looping audio file.
    Track { path: PathBuf, gain: f32 },
    /// Sine oscillator.
    Tone { frequency: f32, gain: f32 },
}

impl SourcePlan {
    pub fn gain(&self) -> f32 {
        match self {
            SourcePlan::Track { gain, .. } | SourcePlan::Tone { gain, .. } => *gain,
        }
    }
}

/// Fixed topology: every source → its own gain → master gain → output.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphPlan {
    pub sources: Vec<SourcePlan>,
    pub master_gain: f32,
}

impl GraphPlan {
    pub fn track(path: impl Into<PathBuf>, master_gain: f32) -> Self {
        Self {
            sources: vec![SourcePlan::Track {
                path: path.into(),
                gain: 1.0,
            }],
            master_gain: clamp_gain(master_gain),
        }
    }

    pub fn tones(tones: &[ToneSettings], master_gain: f32) -> Self {
        Self {
            sources: tones
                .iter()
                .map(|tone| SourcePlan::Tone {
                    frequency: tone.frequency,
                    gain: clamp_gain(tone.gain),
                })
                .collect(),
            master_gain: clamp_gain(master_gain),
        }
    }

    /// Primary graph for the settings: the configured track, else
    /// `default_track` when it exists on disk, else the tones.
    pub fn from_settings(settings: &AudioSettings, default_track: Option<&Path>) -> Self {
        let track = settings
            .track
            .clone()
            .or_else(|| default_track.filter(|path| path.is_file()).map(Path::to_path_buf));
        match track {
            Some(path) => Self::track(path, settings.volume),
            None => Self::tones(&settings.tones, settings.volume),
        }
    }

    pub fn has_track(&self) -> bool {
        self.sources
            .iter()
            .any(|source| matches!(source, SourcePlan::Track { .. }))
    }

    /// Source nodes plus their gain nodes plus the master gain.
    pub fn node_count(&self) -> usize {
        if self.sources.is_empty() {
            0
        } else {
            self.sources.len() * 2 + 1
        }
    }
}

pub(crate) fn clamp_gain(gain: f32) -> f32 {
    if gain.is_finite() {
        gain.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn configured_track_wins_over_default() {
        let mut settings = AudioSettings::default();
        settings.track = Some(PathBuf::from("/music/custom.ogg"));
        let plan = GraphPlan::from_settings(&settings, Some(Path::new("/nope.mp3")));
        assert_eq!(
            plan.sources,
            vec![SourcePlan::Track {
                path: PathBuf::from("/music/custom.ogg"),
                gain: 1.0
            }]
        );
        assert_eq!(plan.master_gain, 0.15);
        assert!(plan.has_track());
    }

    #[test]
    fn missing_default_track_plans_tones() {
        let settings = AudioSettings::default();
        let dir = std::env::temp_dir().join("ambient-plan-missing");
        let plan = GraphPlan::from_settings(&settings, Some(&dir.join(DEFAULT_TRACK_FILE)));
        assert!(!plan.has_track());
        assert_eq!(plan.sources.len(), settings.tones.len());
        assert_eq!(plan.node_count(), settings.tones.len() * 2 + 1);
    }

    #[test]
    fn existing_default_track_is_used() {
        let dir = std::env::temp_dir().join(format!("ambient-plan-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(DEFAULT_TRACK_FILE);
        fs::write(&path, b"not really mp3").unwrap();
        let plan = GraphPlan::from_settings(&AudioSettings::default(), Some(&path));
        assert!(plan.has_track());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn gains_are_clamped() {
        let tones = [
            ToneSettings {
                frequency: 55.0,
                gain: 3.0,
            },
            ToneSettings {
                frequency: 110.0,
                gain: f32::NAN,
            },
        ];
        let plan = GraphPlan::tones(&tones, -1.0);
        assert_eq!(plan.master_gain, 0.0);
        assert_eq!(plan.sources[0].gain(), 1.0);
        assert_eq!(plan.sources[1].gain(), 0.0);
        assert_eq!(GraphPlan::tones(&[], 0.5).node_count(), 0);
    }
}
