//! Core engine module
//!
//! Contains the Engine struct, configuration, and frame timing

mod engine;
mod stats;
mod time;

pub use engine::{Engine, EngineConfig};
pub use stats::FrameStats;
pub use time::Time;
