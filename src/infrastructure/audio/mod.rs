pub mod audio_decoder;
mod candle_whisper;
mod wav_slicer;

pub use candle_whisper::{CandleModelLoader, CandleWhisperModel};
pub use wav_slicer::WavSlicer;
