/// Rodio playback backend
///
/// One shared output stream; every track element owns its own sink so tracks
/// can overlap during a crossfade.
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};

use crate::error::AudioError;

use super::backend::{AudioBackend, AudioElement};
use super::catalog::Preload;
use super::probe;
use super::source::TrackKey;

/// Backend bound to the default output device
pub struct RodioBackend {
    _stream: OutputStream,
    stream_handle: OutputStreamHandle,
}

impl RodioBackend {
    /// Open the default output device
    pub fn try_default() -> Result<Self, AudioError> {
        let (stream, stream_handle) =
            OutputStream::try_default().map_err(|e| AudioError::StreamInitFailed(Box::new(e)))?;
        tracing::info!("Opened default audio output stream");
        Ok(Self {
            _stream: stream,
            stream_handle,
        })
    }
}

impl AudioBackend for RodioBackend {
    fn name(&self) -> &'static str {
        "rodio"
    }

    fn create_element(&mut self, key: TrackKey) -> Result<Box<dyn AudioElement>, AudioError> {
        let sink = paused_sink(&self.stream_handle)?;
        Ok(Box::new(RodioElement {
            key,
            stream_handle: self.stream_handle.clone(),
            sink,
            path: None,
            audio_data: None,
            duration: None,
            looping: false,
            volume: 1.0,
            queued: false,
        }))
    }
}

fn paused_sink(handle: &OutputStreamHandle) -> Result<Sink, AudioError> {
    let sink = Sink::try_new(handle).map_err(|e| AudioError::StreamInitFailed(Box::new(e)))?;
    sink.pause();
    Ok(sink)
}

/// Read a file into memory and make sure it decodes
fn read_verified(path: &Path) -> Result<(Arc<Vec<u8>>, Option<Duration>), AudioError> {
    let audio_data = std::fs::read(path).map_err(|e| AudioError::LoadFailed {
        path: path.to_path_buf(),
        source: Box::new(e),
    })?;

    // Note: rodio's Decoder requires owned data with 'static lifetime
    let decoder = Decoder::new(Cursor::new(audio_data.clone())).map_err(|e| {
        AudioError::DecodeFailed {
            path: path.to_path_buf(),
            source: Box::new(e),
        }
    })?;
    let duration = decoder.total_duration();

    tracing::debug!("Loaded {} ({} bytes)", path.display(), audio_data.len());
    Ok((Arc::new(audio_data), duration))
}

/// Rodio-backed element for one track
pub struct RodioElement {
    key: TrackKey,
    stream_handle: OutputStreamHandle,
    sink: Sink,
    path: Option<PathBuf>,
    audio_data: Option<Arc<Vec<u8>>>,
    duration: Option<Duration>,
    looping: bool,
    volume: f32,
    /// A decoder has been appended to the current sink
    queued: bool,
}

impl RodioElement {
    fn ensure_data(&mut self) -> Result<Arc<Vec<u8>>, AudioError> {
        if let Some(data) = &self.audio_data {
            return Ok(Arc::clone(data));
        }

        let path = self.path.clone().ok_or(AudioError::NotLoaded)?;
        let (data, duration) = read_verified(&path)?;
        if self.duration.is_none() {
            self.duration = duration;
        }
        self.audio_data = Some(Arc::clone(&data));
        Ok(data)
    }

    fn queue_source(&mut self) -> Result<(), AudioError> {
        let data = self.ensure_data()?;
        let path = self.path.clone().unwrap_or_default();
        let decoder = Decoder::new(Cursor::new((*data).clone())).map_err(|e| {
            AudioError::DecodeFailed {
                path,
                source: Box::new(e),
            }
        })?;

        // Each branch is a different type, so box them
        let source: Box<dyn Source<Item = i16> + Send> = if self.looping {
            Box::new(decoder.repeat_infinite())
        } else {
            Box::new(decoder)
        };

        self.sink.append(source);
        self.queued = true;
        Ok(())
    }
}

impl AudioElement for RodioElement {
    fn load(&mut self, path: &Path, preload: Preload) -> Result<(), AudioError> {
        // Replace whatever was queued from a previous source
        if self.queued {
            self.rewind()?;
        }
        self.path = Some(path.to_path_buf());
        self.audio_data = None;
        self.duration = None;

        match preload {
            Preload::Auto => {
                let (data, duration) = read_verified(path)?;
                self.audio_data = Some(data);
                self.duration = duration;
            }
            Preload::Metadata => {
                self.duration = probe::probe_duration(path)?;
            }
            Preload::None => {}
        }
        Ok(())
    }

    fn play(&mut self) -> Result<(), AudioError> {
        if !self.queued || self.sink.empty() {
            self.queue_source()?;
        }
        self.sink.set_volume(self.volume);
        self.sink.play();
        tracing::debug!("Rodio sink playing for {}", self.key);
        Ok(())
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn rewind(&mut self) -> Result<(), AudioError> {
        // A stopped sink cannot be restarted, so swap in a fresh one
        self.sink.stop();
        self.sink = paused_sink(&self.stream_handle)?;
        self.sink.set_volume(self.volume);
        self.queued = false;
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        self.sink.set_volume(self.volume);
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    fn position(&self) -> Duration {
        if self.queued {
            self.sink.get_pos()
        } else {
            Duration::ZERO
        }
    }

    fn duration(&self) -> Option<Duration> {
        self.duration
    }

    fn is_paused(&self) -> bool {
        !self.queued || self.sink.is_paused() || self.sink.empty()
    }

    fn is_ended(&self) -> bool {
        self.queued && !self.looping && self.sink.empty()
    }

    fn release(&mut self) {
        self.sink.stop();
        self.queued = false;
        self.path = None;
        self.audio_data = None;
        self.duration = None;
    }
}
