pub mod builders;
pub mod config;
pub mod controller;
pub mod encoding;
pub mod error;
pub mod genai;
pub mod keys;
pub mod logger;
pub mod models;

pub use config::{Config, GenAiConfig, GenerationSettings};
pub use controller::{CycleOutcome, GenerationController, SessionSnapshot};
pub use error::{Result, VideoGenError};
pub use genai::{GenAiClient, VideoApi, VideoClient};
pub use keys::{EnvKeySelector, KeyErrorListener, KeySelector, KeySession, KeyStatus};
pub use models::{
    AspectRatio, GeneratedVideo, GenerationForm, ImageFile, Resolution, VideoMode,
    VideoOperation,
};
