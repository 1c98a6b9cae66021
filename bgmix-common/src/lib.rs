//! # bgmix Common Library
//!
//! Shared code for the bgmix crates including:
//! - Configuration loading (TOML file, environment, compiled defaults)
//! - Event types (MixEvent enum) and the broadcast EventBus
//! - Seconds/frame conversion helpers

pub mod config;
pub mod error;
pub mod events;
pub mod timing;

pub use error::{Error, Result};
