pub mod ai;
pub mod config;
pub mod error;
pub mod features;
pub mod flows;
pub mod panel;
pub mod prompt;
pub mod provider;
pub mod response;
pub mod schema;

// Re-export main types for convenience
pub use ai::{build_model, list_models, ClaudeClient, LanguageModel, OllamaClient, OpenAIClient};
pub use config::Config;
pub use error::{FlowError, FlowStage, ModelError, ValidationError};
pub use features::{Feature, FeatureKey, FEATURES};
pub use flows::{Flow, FlowExecutor, FlowKind, FlowRequest, FlowResult};
pub use panel::{Notice, Panel, PanelPhase, Submission};
pub use provider::Provider;
