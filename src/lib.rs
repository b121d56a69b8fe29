pub mod client;
pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod provider;
pub mod relay;
#[cfg(feature = "server")]
pub mod server;

pub use client::{CancellationToken, FormState, ImageStudio};
pub use config::{ClientConfig, Config, ProviderConfig};
pub use error::{Result, StylegenError};
pub use models::{GenerationEvent, GenerationRequest, HistoryEntry, ImageSize, RelayRequestBody};
pub use provider::{ImageProvider, OpenAiImageClient};
pub use relay::Relay;
