pub mod generator;
pub mod validation;

use crate::{
    error::{Result, StylegenError},
    logger,
    models::{GenerationEvent, RelayRequestBody},
    provider::ImageProvider,
};
use futures::FutureExt;
use serde::Serialize;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

pub use generator::{BatchGenerator, ItemOutcome};
pub use validation::{parse_body, validate};

pub const GENERIC_FAILURE: &str = "Failed to generate image";

// One event in flight: a slow or vanished client is noticed before the next upstream call.
const EVENT_BUFFER: usize = 1;

/// Result of the non-streaming variant: successful URLs in index order plus
/// the items that failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub image_urls: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ItemFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemFailure {
    pub index: usize,
    pub error: String,
}

/// Forwards generation requests to the image provider. Holds no
/// per-request state; the default credential is fixed at construction.
#[derive(Clone)]
pub struct Relay {
    provider: Arc<dyn ImageProvider>,
    default_credential: Option<String>,
}

impl Relay {
    pub fn new(provider: Arc<dyn ImageProvider>, default_credential: Option<String>) -> Self {
        Self {
            provider,
            default_credential,
        }
    }

    /// Starts a batch on its own task and returns the event stream. The
    /// stream always ends with exactly one `Complete` or `FatalError`.
    pub fn stream(&self, body: Result<RelayRequestBody>) -> ReceiverStream<GenerationEvent> {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let relay = self.clone();
        tokio::spawn(async move { relay.drive(body, tx).await });
        ReceiverStream::new(rx)
    }

    async fn drive(&self, body: Result<RelayRequestBody>, tx: mpsc::Sender<GenerationEvent>) {
        let request_id = logger::request_id();
        let work = self.run_batch(&request_id, body, &tx);

        if AssertUnwindSafe(work).catch_unwind().await.is_err() {
            log::error!("[{}] Batch aborted by a panic", request_id);
            let _ = tx.send(GenerationEvent::fatal(GENERIC_FAILURE)).await;
        }
    }

    async fn run_batch(
        &self,
        request_id: &str,
        body: Result<RelayRequestBody>,
        tx: &mpsc::Sender<GenerationEvent>,
    ) {
        let request = match body.and_then(|b| validate(b, self.default_credential.as_deref())) {
            Ok(request) => request,
            Err(e) => {
                log::warn!("[{}] Rejected request: {}", request_id, e);
                let _ = tx.send(GenerationEvent::fatal(e.user_message())).await;
                return;
            }
        };

        log::info!(
            "[{}] Generating {} images at {} with {}",
            request_id,
            crate::models::BATCH_SIZE,
            request.size,
            self.provider.name()
        );
        let _timer = logger::timer(format!("[{}] batch", request_id));
        let mut generator = BatchGenerator::new(self.provider.clone(), request);

        while let Some(index) = generator.pending_index() {
            if tx.send(GenerationEvent::Progress { index }).await.is_err() {
                log::info!("[{}] Client went away before image {}", request_id, index + 1);
                return;
            }

            let Some(outcome) = generator.generate_next().await else {
                break;
            };

            // The upstream call has already finished; a closed channel only
            // stops the remaining calls.
            if tx.send(outcome.into_event()).await.is_err() {
                log::info!("[{}] Client went away after image {}", request_id, index + 1);
                return;
            }
        }

        let _ = tx.send(GenerationEvent::Complete).await;
    }

    /// Non-streaming variant: same four sequential calls, one response.
    /// Fails only on validation or when every item failed.
    pub async fn generate_batch(&self, body: Result<RelayRequestBody>) -> Result<BatchSummary> {
        let request_id = logger::request_id();
        let request = body.and_then(|b| validate(b, self.default_credential.as_deref()))?;

        let _timer = logger::timer(format!("[{}] batch", request_id));
        let mut generator = BatchGenerator::new(self.provider.clone(), request);
        let mut summary = BatchSummary {
            image_urls: Vec::new(),
            errors: Vec::new(),
        };

        while let Some(outcome) = generator.generate_next().await {
            match outcome.into_event() {
                GenerationEvent::Result { image_url, .. } => summary.image_urls.push(image_url),
                GenerationEvent::ItemError { index, message } => {
                    summary.errors.push(ItemFailure {
                        index,
                        error: message,
                    })
                }
                _ => {}
            }
        }

        if summary.image_urls.is_empty() {
            let message = summary
                .errors
                .first()
                .map(|f| f.error.clone())
                .unwrap_or_else(|| GENERIC_FAILURE.to_string());
            return Err(StylegenError::Upstream(message));
        }

        Ok(summary)
    }
}
