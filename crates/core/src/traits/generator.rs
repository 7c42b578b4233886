//! Reply generator interface

use crate::summary::GenerationRequest;
use crate::Result;
use async_trait::async_trait;

/// Free-form language generation backend
///
/// # Example
///
/// ```ignore
/// let reply = generator.generate(&request).await?;
/// ```
#[async_trait]
pub trait Generator: Send + Sync + 'static {
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;

    /// Model name for logging
    fn model_name(&self) -> &str;
}
