use std::fs::File;
use std::path::Path;
use std::time::Duration;

use symphonia::core::codecs::CODEC_TYPE_NULL;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::AudioError;

/// Read container metadata and return the track length, without decoding audio
///
/// Returns `Ok(None)` when the container does not declare a frame count
/// (common for VBR MP3 without a Xing header).
pub fn probe_duration(path: &Path) -> Result<Option<Duration>, AudioError> {
    let probe_failed = |source: Box<dyn std::error::Error + Send + Sync>| AudioError::ProbeFailed {
        path: path.to_path_buf(),
        source,
    };

    let src = File::open(path).map_err(|e| AudioError::LoadFailed {
        path: path.to_path_buf(),
        source: Box::new(e),
    })?;
    let mss = MediaSourceStream::new(Box::new(src), Default::default());

    // Create a probe hint using the file extension
    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let meta_opts: MetadataOptions = Default::default();
    let fmt_opts: FormatOptions = Default::default();

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &fmt_opts, &meta_opts)
        .map_err(|e| probe_failed(Box::new(e)))?;

    // First audio track with a known codec
    let track = probed
        .format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| probe_failed("No supported audio tracks found".into()))?;

    let params = &track.codec_params;
    let duration = match (params.n_frames, params.sample_rate) {
        (Some(frames), Some(rate)) if rate > 0 => {
            Some(Duration::from_secs_f64(frames as f64 / f64::from(rate)))
        }
        _ => None,
    };

    tracing::debug!("Probed {}: duration={:?}", path.display(), duration);
    Ok(duration)
}

#[cfg(test)]
/// Write a minimal 16-bit mono PCM WAV of silence
pub(crate) fn write_wav(path: &Path, sample_rate: u32, frames: u32) {
    use std::io::Write;

    let data_len = frames * 2;
    let mut bytes = Vec::with_capacity(44 + data_len as usize);
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVEfmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
    bytes.extend_from_slice(&1u16.to_le_bytes()); // mono
    bytes.extend_from_slice(&sample_rate.to_le_bytes());
    bytes.extend_from_slice(&(sample_rate * 2).to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&16u16.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());
    bytes.resize(44 + data_len as usize, 0);

    let mut file = File::create(path).unwrap();
    file.write_all(&bytes).unwrap();
}
