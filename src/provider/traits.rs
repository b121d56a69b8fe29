use crate::{error::Result, models::ImageSize};
use async_trait::async_trait;

/// The upstream "generate one image" operation.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Generates exactly one image and returns its URL.
    async fn generate_image(&self, credential: &str, prompt: &str, size: ImageSize)
        -> Result<String>;

    fn name(&self) -> &str;
}
