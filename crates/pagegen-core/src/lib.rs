pub mod category;
pub mod config;
pub mod error;
pub mod generation;
pub mod openrouter;
pub mod preview;
pub mod prompt;

// Re-export main types for convenience
pub use category::Category;
pub use config::{Config, Settings};
pub use error::GenerateError;
pub use generation::{
    spawn_generation, GenerationOutcome, GenerationState, GeneratorView, RequestTicket, SettleGuard,
};
pub use openrouter::OpenRouterClient;
pub use preview::{export_preview, render_preview, sandboxed_document, PreviewLine, PreviewSpan, SpanStyle};
pub use prompt::build_prompt;
