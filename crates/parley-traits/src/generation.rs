//! Text generation abstraction.

use async_trait::async_trait;

use crate::error::GenerationResult;

/// Opaque text-generation backend.
///
/// One prompt in, one reply out. Implementations own their timeout policy
/// and must not retry internally.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Model name, used for diagnostics only.
    fn model(&self) -> &str;

    /// Produce a reply for the fully assembled prompt.
    async fn generate(&self, prompt: &str) -> GenerationResult<String>;
}
