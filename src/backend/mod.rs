//! Backend Router
//!
//! A uniform chat contract over several text-generation services with
//! incompatible wire formats. The router holds an ordered list of adapters
//! and returns the first success.

pub mod error;
pub mod http;
pub mod ollama;
pub mod openai;
pub mod router;
pub mod traits;
pub mod types;

pub use error::BackendError;
pub use ollama::Ollama;
pub use openai::OpenAiCompatible;
pub use router::{BackendKind, BackendRouter};
pub use traits::ChatBackend;
pub use types::{ChatMessage, Generation, Role, TokenUsage};
