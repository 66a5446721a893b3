//! Backend Trait

use super::error::BackendError;
use super::types::{ChatMessage, Generation};

/// A text-generation service reachable behind one wire protocol.
///
/// Implementations apply their own timeout and report any HTTP status >= 400
/// or a missing/empty text field as an error, so the router can fall through
/// to the next adapter.
#[async_trait::async_trait]
pub trait ChatBackend: Send + Sync {
    /// Stable name recorded as `backend_used`
    fn name(&self) -> &str;

    async fn generate(
        &self,
        messages: &[ChatMessage],
        model: &str,
    ) -> Result<Generation, BackendError>;
}
