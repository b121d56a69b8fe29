pub mod openai_client;
pub mod traits;

#[cfg(test)]
pub mod scripted;

use crate::{config::ProviderConfig, error::Result};
use std::sync::Arc;

pub use openai_client::OpenAiImageClient;
pub use traits::ImageProvider;

/// Builds the provider used by the relay from configuration.
pub fn from_config(config: &ProviderConfig) -> Result<Arc<dyn ImageProvider>> {
    let client = OpenAiImageClient::new(config)?;
    log::info!("Image provider ready: {} at {}", client.name(), config.base_url());
    Ok(Arc::new(client))
}
