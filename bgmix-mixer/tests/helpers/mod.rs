//! Test helper modules for bgmix-mixer integration tests
//!
//! - audio_generator: deterministic in-memory WAV fixtures

#![allow(dead_code)]

pub mod audio_generator;

pub use audio_generator::{silent_wav, sine_samples, sine_wav, wav_from_i16, TEST_SAMPLE_RATE};
