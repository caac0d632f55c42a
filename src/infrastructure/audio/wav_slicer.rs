use std::path::Path;

use async_trait::async_trait;
use hound::{SampleFormat, WavSpec, WavWriter};

use crate::application::ports::{AudioError, AudioProbe, AudioSlicer, ChunkSpan, ExportedChunk};

use super::audio_decoder::{decode_audio_to_pcm, probe_duration, TARGET_SAMPLE_RATE};

/// Exported slices shorter than this are treated as noise and dropped.
const NOISE_FLOOR_SECS: f64 = 0.1;

/// Symphonia-decoding slicer that writes time-bounded spans out as 16kHz
/// mono wav files. The source is decoded once per `export_slices` call;
/// slicing is then pure sample arithmetic.
pub struct WavSlicer;

impl WavSlicer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WavSlicer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioSlicer for WavSlicer {
    async fn probe(&self, audio: &Path) -> Result<AudioProbe, AudioError> {
        let data = tokio::fs::read(audio).await.map_err(AudioError::Io)?;

        // Header duration when available; full decode only as a fallback
        // for containers that do not carry one.
        let duration_seconds = match probe_duration(&data)? {
            Some(seconds) => seconds,
            None => {
                let pcm = decode_audio_to_pcm(&data)?;
                pcm.len() as f64 / TARGET_SAMPLE_RATE as f64
            }
        };

        Ok(AudioProbe {
            duration_seconds,
            sample_rate: TARGET_SAMPLE_RATE,
        })
    }

    async fn export_slices(
        &self,
        audio: &Path,
        spans: &[ChunkSpan],
        dest_dir: &Path,
    ) -> Result<Vec<ExportedChunk>, AudioError> {
        let data = tokio::fs::read(audio).await.map_err(AudioError::Io)?;
        let pcm = decode_audio_to_pcm(&data)?;

        let rate = TARGET_SAMPLE_RATE as f64;
        let noise_floor = (NOISE_FLOOR_SECS * rate) as usize;
        let mut exported = Vec::with_capacity(spans.len());

        for span in spans {
            let start = ((span.start * rate) as usize).min(pcm.len());
            let end = ((span.end * rate) as usize).min(pcm.len());
            let slice = &pcm[start..end];

            if slice.len() < noise_floor {
                tracing::debug!(
                    chunk = span.index,
                    samples = slice.len(),
                    "Dropping slice below noise floor"
                );
                continue;
            }

            let path = dest_dir.join(format!("chunk_{}.wav", span.index));
            write_wav(&path, slice)?;

            exported.push(ExportedChunk {
                index: span.index,
                path,
                duration_seconds: slice.len() as f64 / rate,
            });
        }

        Ok(exported)
    }
}

fn write_wav(path: &Path, samples: &[f32]) -> Result<(), AudioError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: TARGET_SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)
        .map_err(|e| AudioError::ExportFailed(format!("{}: {}", path.display(), e)))?;

    for &sample in samples {
        let clamped = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer
            .write_sample(clamped)
            .map_err(|e| AudioError::ExportFailed(e.to_string()))?;
    }

    writer
        .finalize()
        .map_err(|e| AudioError::ExportFailed(e.to_string()))?;

    Ok(())
}
