use crate::{
    error::Result,
    logger,
    models::{GenerationEvent, GenerationRequest, BATCH_SIZE},
    provider::ImageProvider,
};
use std::sync::Arc;

/// Outcome of one upstream call.
#[derive(Debug)]
pub struct ItemOutcome {
    pub index: usize,
    pub result: Result<String>,
}

impl ItemOutcome {
    pub fn into_event(self) -> GenerationEvent {
        match self.result {
            Ok(image_url) => GenerationEvent::Result {
                index: self.index,
                image_url,
            },
            Err(e) => {
                let mut message = e.user_message();
                if message.trim().is_empty() {
                    message = format!("Failed to generate image {}", self.index + 1);
                }
                GenerationEvent::ItemError {
                    index: self.index,
                    message,
                }
            }
        }
    }
}

/// Produces the batch one image at a time, in index order. Callers decide
/// how each outcome is transported.
pub struct BatchGenerator {
    provider: Arc<dyn ImageProvider>,
    request: GenerationRequest,
    prompt: String,
    next: usize,
}

impl BatchGenerator {
    pub fn new(provider: Arc<dyn ImageProvider>, request: GenerationRequest) -> Self {
        let prompt = request.upstream_prompt();
        Self {
            provider,
            request,
            prompt,
            next: 0,
        }
    }

    /// Index the next call to [`generate_next`](Self::generate_next) will
    /// produce, or `None` once the batch is exhausted.
    pub fn pending_index(&self) -> Option<usize> {
        (self.next < BATCH_SIZE).then_some(self.next)
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub async fn generate_next(&mut self) -> Option<ItemOutcome> {
        let index = self.pending_index()?;
        self.next += 1;

        let _timer = logger::timer(format!("image {}/{}", index + 1, BATCH_SIZE));
        let result = self
            .provider
            .generate_image(&self.request.credential, &self.prompt, self.request.size)
            .await;

        if let Err(e) = &result {
            log::error!("Error generating image {}: {}", index + 1, e);
        }

        Some(ItemOutcome { index, result })
    }
}
