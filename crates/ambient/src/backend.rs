use std::fs::File;
use std::io::BufReader;

use rodio::source::SineWave;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use tracing::{debug, info};

use crate::error::AudioError;
use crate::plan::{GraphPlan, SourcePlan};

/// Audio output the session drives. Calls are fire-and-forget apart from
/// `open` and `start`, which may fail.
pub trait AudioBackend {
    /// Creates the output context, or resumes it if it already exists.
    fn open(&mut self) -> Result<(), AudioError>;
    /// Builds the planned graph and starts playback, replacing any previous one.
    fn start(&mut self, plan: &GraphPlan) -> Result<(), AudioError>;
    fn set_paused(&mut self, paused: bool);
    fn set_master_gain(&mut self, gain: f32);
    /// Stops playback and releases the graph.
    fn stop(&mut self);
}

/// Plays through the default output device. Each source gets its own
/// `Sink`; the sink volume acts as the master gain.
#[derive(Default)]
pub struct RodioBackend {
    output: Option<(OutputStream, OutputStreamHandle)>,
    sinks: Vec<Sink>,
}

impl RodioBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self) -> Result<&OutputStreamHandle, AudioError> {
        self.output
            .as_ref()
            .map(|(_, handle)| handle)
            .ok_or_else(|| AudioError::Output("output stream not opened".to_string()))
    }

    fn build_sink(&self, source: &SourcePlan, master_gain: f32) -> Result<Sink, AudioError> {
        let sink =
            Sink::try_new(self.handle()?).map_err(|err| AudioError::Playback(err.to_string()))?;
        sink.pause();
        sink.set_volume(master_gain);
        match source {
            SourcePlan::Track { path, gain } => {
                let file = File::open(path).map_err(|source| AudioError::Track {
                    path: path.clone(),
                    source,
                })?;
                let decoder =
                    Decoder::new_looped(BufReader::new(file)).map_err(|err| AudioError::Decode {
                        path: path.clone(),
                        message: err.to_string(),
                    })?;
                sink.append(decoder.amplify(*gain));
            }
            SourcePlan::Tone { frequency, gain } => {
                sink.append(SineWave::new(*frequency).amplify(*gain));
            }
        }
        Ok(sink)
    }
}

impl AudioBackend for RodioBackend {
    fn open(&mut self) -> Result<(), AudioError> {
        if self.output.is_some() {
            return Ok(());
        }
        let output =
            OutputStream::try_default().map_err(|err| AudioError::Output(err.to_string()))?;
        info!("audio output opened");
        self.output = Some(output);
        Ok(())
    }

    fn start(&mut self, plan: &GraphPlan) -> Result<(), AudioError> {
        if plan.sources.is_empty() {
            return Err(AudioError::EmptyGraph);
        }
        self.stop();
        let sinks = plan
            .sources
            .iter()
            .map(|source| self.build_sink(source, plan.master_gain))
            .collect::<Result<Vec<_>, _>>()?;
        for sink in &sinks {
            sink.play();
        }
        debug!(sources = sinks.len(), "audio graph started");
        self.sinks = sinks;
        Ok(())
    }

    fn set_paused(&mut self, paused: bool) {
        for sink in &self.sinks {
            if paused {
                sink.pause();
            } else {
                sink.play();
            }
        }
    }

    fn set_master_gain(&mut self, gain: f32) {
        for sink in &self.sinks {
            sink.set_volume(gain);
        }
    }

    fn stop(&mut self) {
        for sink in self.sinks.drain(..) {
            sink.stop();
        }
    }
}
