use super::decoder::SseDecoder;
use crate::{
    error::{Result, StylegenError},
    models::{GenerationEvent, RelayRequestBody},
};
use async_trait::async_trait;
use futures::stream::{Stream, StreamExt};
use reqwest::Client;
use std::pin::Pin;
use tokio_stream::wrappers::ReceiverStream;

pub type EventStream = Pin<Box<dyn Stream<Item = Result<GenerationEvent>> + Send>>;

pub const STREAM_PATH: &str = "/api/generate-image";

/// How the client reaches the relay.
#[async_trait]
pub trait RelayTransport: Send + Sync {
    async fn open(&self, body: &RelayRequestBody) -> Result<EventStream>;
}

#[derive(Clone)]
pub struct HttpRelayTransport {
    client: Client,
    endpoint: String,
}

impl HttpRelayTransport {
    pub fn new(relay_url: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: format!("{}{}", relay_url.trim_end_matches('/'), STREAM_PATH),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RelayTransport for HttpRelayTransport {
    async fn open(&self, body: &RelayRequestBody) -> Result<EventStream> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(body)
            .send()
            .await
            .map_err(|e| StylegenError::Transport(format!("Relay request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&text)
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
                .unwrap_or_else(|| format!("Relay returned {}", status));
            return Err(StylegenError::Relay(message));
        }

        let (tx, rx) = tokio::sync::mpsc::channel(16);
        let mut bytes = response.bytes_stream();

        tokio::spawn(async move {
            let mut decoder = SseDecoder::new();
            while let Some(chunk) = bytes.next().await {
                let events = match chunk {
                    Ok(chunk) => decoder.push(&chunk),
                    Err(e) => vec![Err(StylegenError::Transport(format!(
                        "Stream interrupted: {}",
                        e
                    )))],
                };

                for event in events {
                    let failed = event.is_err();
                    if tx.send(event).await.is_err() || failed {
                        return;
                    }
                }
            }

            if let Some(event) = decoder.finish() {
                let _ = tx.send(event).await;
            }
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}
