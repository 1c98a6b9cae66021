//! Audio processing stages
//!
//! - `types`: SampleBuffer data model
//! - `decoder`: encoded bytes → SampleBuffer (symphonia / hound backends)
//! - `trim`: time-window extraction
//! - `mixer`: two-input gain + clip mix
//! - `wav`: SampleBuffer → 16-bit PCM WAV bytes

pub mod decoder;
pub mod mixer;
pub mod trim;
pub mod types;
pub mod wav;

pub use decoder::{build_decoder, DecodeContext, Decoder, PcmWavDecoder, SymphoniaDecoder};
pub use mixer::mix;
pub use trim::trim;
pub use types::{SampleBuffer, MAX_CHANNELS};
pub use wav::{encode, encode_into, WavHeader};
