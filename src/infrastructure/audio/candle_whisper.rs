use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::whisper::{self as m, Config};
use hf_hub::api::sync::Api;
use hf_hub::{Repo, RepoType};
use tokenizers::Tokenizer;
use tokio::sync::Mutex;

use crate::application::ports::{
    DeviceKind, ModelError, ModelKey, Precision, SpeechModel, SpeechModelLoader,
};

use super::audio_decoder::decode_audio_to_pcm;

/// Loads candle whisper instances for the model registry. GPU allocation
/// failures surface as `OutOfMemory` so the registry can fall back to the
/// CPU key.
pub struct CandleModelLoader;

impl SpeechModelLoader for CandleModelLoader {
    fn load(&self, key: &ModelKey) -> Result<Arc<dyn SpeechModel>, ModelError> {
        let model = CandleWhisperModel::new(key)?;
        Ok(Arc::new(model))
    }
}

pub struct CandleWhisperModel {
    model: Mutex<m::model::Whisper>,
    tokenizer: Tokenizer,
    config: Config,
    device: Device,
    mel_filters: Vec<f32>,
}

fn classify_load_error(context: &str, message: String) -> ModelError {
    if message.to_lowercase().contains("out of memory") {
        ModelError::OutOfMemory(format!("{}: {}", context, message))
    } else {
        ModelError::LoadFailed(format!("{}: {}", context, message))
    }
}

impl CandleWhisperModel {
    pub fn new(key: &ModelKey) -> Result<Self, ModelError> {
        let device = match key.device {
            DeviceKind::Cuda => Device::new_cuda(0)
                .map_err(|e| classify_load_error("cuda device", e.to_string()))?,
            DeviceKind::Cpu => Device::Cpu,
        };
        let dtype = match key.precision {
            Precision::F16 => DType::F16,
            Precision::F32 => DType::F32,
        };
        let model_id = format!("openai/whisper-{}", key.size.as_str());

        tracing::info!(
            device = ?device,
            model = %model_id,
            precision = ?key.precision,
            "Initializing whisper transcription model"
        );

        let api = Api::new().map_err(|e| ModelError::LoadFailed(e.to_string()))?;
        let repo = api.repo(Repo::new(model_id, RepoType::Model));

        let config_path = repo
            .get("config.json")
            .map_err(|e| ModelError::LoadFailed(format!("config.json: {}", e)))?;
        let tokenizer_path = repo
            .get("tokenizer.json")
            .map_err(|e| ModelError::LoadFailed(format!("tokenizer.json: {}", e)))?;
        let weights_path = repo
            .get("model.safetensors")
            .map_err(|e| ModelError::LoadFailed(format!("model.safetensors: {}", e)))?;

        let mel_repo = api.repo(Repo::new(
            "FL33TW00D-HF/whisper-base".to_string(),
            RepoType::Model,
        ));
        let mel_bytes_path = mel_repo
            .get("melfilters.bytes")
            .map_err(|e| ModelError::LoadFailed(format!("melfilters.bytes: {}", e)))?;

        let config_contents = std::fs::read_to_string(&config_path)
            .map_err(|e| ModelError::LoadFailed(format!("read config: {}", e)))?;
        let config: Config = serde_json::from_str(&config_contents)
            .map_err(|e| ModelError::LoadFailed(format!("parse config: {}", e)))?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| ModelError::LoadFailed(format!("tokenizer: {}", e)))?;

        let mel_bytes = std::fs::read(&mel_bytes_path)
            .map_err(|e| ModelError::LoadFailed(format!("mel filters: {}", e)))?;
        let mel_filters = read_mel_filters(&mel_bytes, &config)?;

        // SAFETY: safetensors files are memory-mapped read-only
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], dtype, &device)
                .map_err(|e| classify_load_error("weights", e.to_string()))?
        };

        let model = m::model::Whisper::load(&vb, config.clone())
            .map_err(|e| classify_load_error("model", e.to_string()))?;

        tracing::info!("Whisper model loaded successfully");

        Ok(Self {
            model: Mutex::new(model),
            tokenizer,
            config,
            device,
            mel_filters,
        })
    }
}

#[async_trait]
impl SpeechModel for CandleWhisperModel {
    async fn transcribe(&self, audio: &Path) -> Result<String, ModelError> {
        let data = tokio::fs::read(audio)
            .await
            .map_err(|e| ModelError::DecodingFailed(format!("{}: {}", audio.display(), e)))?;
        let pcm = decode_audio_to_pcm(&data)
            .map_err(|e| ModelError::DecodingFailed(e.to_string()))?;

        let chunk_samples = m::N_SAMPLES;
        let mut segments: Vec<String> = Vec::new();

        let mut mel_tensors = Vec::new();

        for (i, chunk) in pcm.chunks(chunk_samples).enumerate() {
            let samples = if chunk.len() < chunk_samples {
                let mut padded = chunk.to_vec();
                padded.resize(chunk_samples, 0.0);
                padded
            } else {
                chunk.to_vec()
            };

            let mel_data = m::audio::pcm_to_mel(&self.config, &samples, &self.mel_filters);
            let n_mel = self.config.num_mel_bins;
            let n_frames = mel_data.len() / n_mel;

            let mel_tensor = Tensor::from_vec(mel_data, (1, n_mel, n_frames), &self.device)
                .map_err(|e| ModelError::TranscriptionFailed(format!("mel tensor: {}", e)))?;

            mel_tensors.push((i, mel_tensor));
        }

        // Inference is serialized behind this mutex; the runtime makes no
        // promise about concurrent decoder calls on one instance.
        let mut model = self.model.lock().await;

        for (i, mel_tensor) in mel_tensors {
            tracing::debug!(segment = i, "Transcribing audio segment");
            let text = decode_segment(&mut model, &self.tokenizer, &self.device, &mel_tensor)?;
            if !text.is_empty() {
                segments.push(text);
            }
        }

        let transcript = segments.join(" ");

        tracing::debug!(
            segments = segments.len(),
            chars = transcript.len(),
            "Audio segment transcription completed"
        );

        Ok(transcript)
    }
}

fn decode_segment(
    model: &mut m::model::Whisper,
    tokenizer: &Tokenizer,
    device: &Device,
    mel: &Tensor,
) -> Result<String, ModelError> {
    let sot_token = token_id(tokenizer, m::SOT_TOKEN)?;
    let transcribe_token = token_id(tokenizer, m::TRANSCRIBE_TOKEN)?;
    let no_timestamps_token = token_id(tokenizer, m::NO_TIMESTAMPS_TOKEN)?;
    let eot_token = token_id(tokenizer, m::EOT_TOKEN)?;

    let audio_features = model
        .encoder
        .forward(mel, true)
        .map_err(|e| ModelError::TranscriptionFailed(format!("encoder: {}", e)))?;

    let mut tokens = vec![sot_token, transcribe_token, no_timestamps_token];
    let max_tokens = 224;
    let mut decoded_text = String::new();

    for _ in 0..max_tokens {
        let token_tensor = Tensor::new(tokens.as_slice(), device)
            .map_err(|e| ModelError::TranscriptionFailed(e.to_string()))?
            .unsqueeze(0)
            .map_err(|e| ModelError::TranscriptionFailed(e.to_string()))?;

        let decoder_output = model
            .decoder
            .forward(&token_tensor, &audio_features, tokens.len() == 3)
            .map_err(|e| ModelError::TranscriptionFailed(format!("decoder: {}", e)))?;

        let logits = model
            .decoder
            .final_linear(
                &decoder_output
                    .squeeze(0)
                    .map_err(|e| ModelError::TranscriptionFailed(e.to_string()))?,
            )
            .map_err(|e| ModelError::TranscriptionFailed(format!("linear: {}", e)))?;

        let seq_len = logits
            .dim(0)
            .map_err(|e| ModelError::TranscriptionFailed(e.to_string()))?;
        let last_logits = logits
            .get(seq_len - 1)
            .map_err(|e| ModelError::TranscriptionFailed(e.to_string()))?;

        let next_token = last_logits
            .argmax(0)
            .map_err(|e| ModelError::TranscriptionFailed(e.to_string()))?
            .to_scalar::<u32>()
            .map_err(|e| ModelError::TranscriptionFailed(e.to_string()))?;

        if next_token == eot_token {
            break;
        }

        tokens.push(next_token);

        if let Some(text) = tokenizer.id_to_token(next_token) {
            let text = text.replace("Ġ", " ").replace("▁", " ");
            decoded_text.push_str(&text);
        }
    }

    model.reset_kv_cache();

    Ok(decoded_text.trim().to_string())
}

fn token_id(tokenizer: &Tokenizer, token: &str) -> Result<u32, ModelError> {
    tokenizer
        .token_to_id(token)
        .ok_or_else(|| ModelError::TranscriptionFailed(format!("token not found: {}", token)))
}

fn read_mel_filters(bytes: &[u8], config: &Config) -> Result<Vec<f32>, ModelError> {
    let expected_len = config.num_mel_bins * (m::N_FFT / 2 + 1);
    if bytes.len() < expected_len * 4 {
        return Err(ModelError::LoadFailed(format!(
            "mel filters file too small: {} bytes, expected at least {}",
            bytes.len(),
            expected_len * 4
        )));
    }

    let filters: Vec<f32> = bytes
        .chunks_exact(4)
        .take(expected_len)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();

    Ok(filters)
}
