pub mod composer;
pub mod config;
pub mod error;
pub mod gemini;
pub mod logger;
pub mod models;
pub mod orchestrator;

pub use config::{FanoutPolicy, GeminiConfig, OrchestratorConfig};
pub use error::{FitroomError, Result};
pub use gemini::{GeminiClient, SynthesisClient, TagClient};
pub use models::{
    Batch, EncodedImage, PoseTemplate, Scenario, SynthesisRequest, SynthesisResult, POSES,
    SCENARIOS,
};
pub use orchestrator::{
    BatchOrchestrator, NoProgress, ProgressEvent, ProgressObserver, SynthesisService,
};
