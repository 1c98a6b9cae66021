//! # bgmix Mixer Library (bgmix-mixer)
//!
//! Sample-accurate two-track mixing engine.
//!
//! **Purpose:** Decode a main track and a background track, optionally trim
//! the main track to a target duration, mix the background underneath at an
//! adjustable gain with hard clipping, and serialize the result as a 16-bit
//! PCM WAV file.
//!
//! **Architecture:** Decoder (symphonia or hound) → Trimmer → Mixer →
//! WavEncoder, orchestrated by `MixPipeline`.

pub mod audio;
pub mod error;
pub mod pipeline;
pub mod source;

pub use audio::types::SampleBuffer;
pub use error::{DecodeError, Error, InputRole, Result};
pub use pipeline::{MixOutput, MixPipeline, MixRequest};
pub use source::EncodedAudio;
