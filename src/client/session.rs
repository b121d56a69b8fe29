use super::{
    context::ClientContext,
    slots::{BoardStatus, SlotBoard, SlotState},
    store::{FileStore, KeyValueStore, MemoryStore},
    styles::{compose_prompt, StyleSelector},
    transport::{EventStream, HttpRelayTransport, RelayTransport},
};
use crate::{
    config::ClientConfig,
    error::{Result, StylegenError},
    models::{compose_history_style, GenerationEvent, HistoryEntry, ImageSize, RelayRequestBody, BATCH_SIZE},
    relay::validation::PROMPT_REQUIRED,
};
use futures::StreamExt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const STREAM_ENDED_EARLY: &str = "Stream ended before generation finished";

/// The user-editable fields of one submission. Style comes from the
/// [`StyleSelector`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub prompt: String,
    pub size: ImageSize,
    pub reference_image_url: Option<String>,
}

impl FormState {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_size(mut self, size: ImageSize) -> Self {
        self.size = size;
        self
    }

    pub fn with_reference_image_url(mut self, url: impl Into<String>) -> Self {
        self.reference_image_url = Some(url.into());
        self
    }

    fn reference(&self) -> Option<&str> {
        self.reference_image_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }
}

/// What selecting a history entry gives back: the form to re-submit and the
/// images to show, without contacting the relay.
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySelection {
    pub form: FormState,
    pub style: String,
    pub image_urls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionOutcome {
    pub slots: [SlotState; BATCH_SIZE],
    pub history_entry: Option<HistoryEntry>,
}

/// Client orchestrator: turns form input into one relay request and folds
/// the event stream into a [`SlotBoard`].
pub struct ImageStudio {
    context: ClientContext,
    styles: StyleSelector,
    transport: Arc<dyn RelayTransport>,
    board: SlotBoard,
}

impl ImageStudio {
    pub fn new(context: ClientContext, transport: Arc<dyn RelayTransport>) -> Self {
        Self {
            context,
            styles: StyleSelector::new(),
            transport,
            board: SlotBoard::new(),
        }
    }

    /// File-backed state when a store directory is configured, in-memory
    /// otherwise.
    pub fn open(config: &ClientConfig) -> Result<Self> {
        let store: Arc<dyn KeyValueStore> = match &config.store_dir {
            Some(dir) => Arc::new(FileStore::open(dir)?),
            None => Arc::new(MemoryStore::new()),
        };
        let context = ClientContext::load(store)?;
        Ok(Self::new(
            context,
            Arc::new(HttpRelayTransport::new(&config.relay_url)),
        ))
    }

    pub fn context(&self) -> &ClientContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut ClientContext {
        &mut self.context
    }

    pub fn styles(&self) -> &StyleSelector {
        &self.styles
    }

    pub fn styles_mut(&mut self) -> &mut StyleSelector {
        &mut self.styles
    }

    pub fn board(&self) -> &SlotBoard {
        &self.board
    }

    pub fn build_request(&self, form: &FormState) -> RelayRequestBody {
        let style = self.styles.effective_style();
        RelayRequestBody {
            prompt: Some(compose_prompt(&form.prompt, &style)),
            size: form.size.as_str().to_string(),
            api_key: self.context.credential().map(str::to_string),
            reference_image_url: form.reference().map(str::to_string),
        }
    }

    /// Runs one submission to its terminal event.
    ///
    /// A relay `FatalError` comes back as [`StylegenError::Relay`], an
    /// interrupted stream as [`StylegenError::Transport`], an abort through
    /// `cancel` as [`StylegenError::Cancelled`].
    pub async fn submit(
        &mut self,
        form: &FormState,
        cancel: &CancellationToken,
    ) -> Result<SubmissionOutcome> {
        if form.prompt.trim().is_empty() {
            return Err(StylegenError::Validation(PROMPT_REQUIRED.to_string()));
        }

        let body = self.build_request(form);
        let style = self.styles.effective_style();
        self.board.start();

        let events = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                self.board.cancel();
                return Err(StylegenError::Cancelled);
            }
            opened = self.transport.open(&body) => opened,
        };
        let events = match events {
            Ok(events) => events,
            Err(e) => {
                self.board.apply(&GenerationEvent::fatal(e.user_message()));
                return Err(e);
            }
        };

        let history_entry = self.consume(events, form, &style, cancel).await?;

        match self.board.status() {
            BoardStatus::Completed => Ok(SubmissionOutcome {
                slots: self.board.slots().clone(),
                history_entry,
            }),
            BoardStatus::Fatal(message) => Err(StylegenError::Relay(message.clone())),
            _ => Err(StylegenError::Transport(STREAM_ENDED_EARLY.to_string())),
        }
    }

    async fn consume(
        &mut self,
        mut events: EventStream,
        form: &FormState,
        style: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<HistoryEntry>> {
        let mut history_entry = None;

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    log::info!("Submission cancelled");
                    self.board.cancel();
                    return Err(StylegenError::Cancelled);
                }
                next = events.next() => next,
            };

            let event = match next {
                Some(Ok(event)) => event,
                Some(Err(e)) => {
                    log::error!("Relay stream failed: {}", e);
                    self.board.apply(&GenerationEvent::fatal(e.user_message()));
                    return Err(e);
                }
                None if !self.board.is_finished() => {
                    let e = StylegenError::Transport(STREAM_ENDED_EARLY.to_string());
                    self.board.apply(&GenerationEvent::fatal(e.user_message()));
                    return Err(e);
                }
                None => break,
            };

            log::debug!("Relay event: {:?}", event);
            self.board.apply(&event);

            if history_entry.is_none() && self.board.is_full_batch() {
                let entry = HistoryEntry::new(
                    form.prompt.trim(),
                    compose_history_style(style, form.reference()),
                    form.size,
                    self.board.image_urls().to_vec(),
                );
                if let Err(e) = self.context.add_history(entry.clone()) {
                    log::warn!("Could not save history: {}", e);
                }
                history_entry = Some(entry);
            }

            if self.board.is_finished() {
                break;
            }
        }

        Ok(history_entry)
    }

    /// Repopulates the form and style selection from a stored batch.
    pub fn load_history_entry(&mut self, id: &str) -> Option<HistorySelection> {
        let entry = self.context.find_history(id)?.clone();
        let (style, reference_image_url) = entry.style_parts();

        if style.is_empty() {
            self.styles.clear();
        } else {
            self.styles.use_custom_only(style.clone());
        }

        Some(HistorySelection {
            form: FormState {
                prompt: entry.prompt,
                size: entry.size,
                reference_image_url,
            },
            style,
            image_urls: entry.image_urls,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::scripted::ScriptedProvider;
    use crate::relay::Relay;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Runs the real relay in-process instead of going over HTTP.
    struct InProcessTransport {
        relay: Relay,
        sent: Mutex<Vec<RelayRequestBody>>,
    }

    impl InProcessTransport {
        fn new(provider: Arc<ScriptedProvider>) -> Self {
            Self {
                relay: Relay::new(provider, Some("sk-server".into())),
                sent: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl RelayTransport for InProcessTransport {
        async fn open(&self, body: &RelayRequestBody) -> Result<EventStream> {
            self.sent.lock().unwrap().push(body.clone());
            Ok(Box::pin(self.relay.stream(Ok(body.clone())).map(Ok::<_, StylegenError>)))
        }
    }

    /// Replays a fixed list of events, then optionally hangs.
    struct ScriptedTransport {
        events: Vec<Result<GenerationEvent>>,
        hang: bool,
    }

    #[async_trait]
    impl RelayTransport for ScriptedTransport {
        async fn open(&self, _body: &RelayRequestBody) -> Result<EventStream> {
            let events: Vec<Result<GenerationEvent>> = self
                .events
                .iter()
                .map(|e| match e {
                    Ok(event) => Ok(event.clone()),
                    Err(err) => Err(StylegenError::Transport(err.user_message())),
                })
                .collect();
            let stream = futures::stream::iter(events);
            if self.hang {
                Ok(Box::pin(stream.chain(futures::stream::pending())))
            } else {
                Ok(Box::pin(stream))
            }
        }
    }

    fn studio(transport: Arc<dyn RelayTransport>) -> ImageStudio {
        let context = ClientContext::load(Arc::new(MemoryStore::new())).unwrap();
        ImageStudio::new(context, transport)
    }

    #[tokio::test]
    async fn test_partial_batch_slots() {
        let provider = Arc::new(ScriptedProvider::failing_on(&[2]));
        let mut studio = studio(Arc::new(InProcessTransport::new(provider)));

        let outcome = studio
            .submit(&FormState::new("a paper boat"), &CancellationToken::new())
            .await
            .unwrap();

        assert!(matches!(outcome.slots[0], SlotState::Done(_)));
        assert!(matches!(outcome.slots[1], SlotState::Done(_)));
        assert!(matches!(outcome.slots[2], SlotState::Failed(_)));
        assert!(matches!(outcome.slots[3], SlotState::Done(_)));
        assert!(outcome.history_entry.is_none());
        assert!(studio.context().history().is_empty());
    }

    #[tokio::test]
    async fn test_full_batch_creates_one_history_entry() {
        let provider = Arc::new(ScriptedProvider::new());
        let transport = Arc::new(InProcessTransport::new(provider.clone()));
        let mut studio = studio(transport.clone());
        studio.styles_mut().select("anime").unwrap();

        let form = FormState::new("a paper boat")
            .with_size(ImageSize::Portrait)
            .with_reference_image_url("https://example.com/ref.png");
        let outcome = studio.submit(&form, &CancellationToken::new()).await.unwrap();

        let history = studio.context().history();
        assert_eq!(history.len(), 1);
        let entry = &history[0];
        assert_eq!(Some(entry), outcome.history_entry.as_ref());
        assert_eq!(
            entry.image_urls,
            (0..4).map(|i| format!("https://images.test/{}.png", i)).collect::<Vec<_>>()
        );
        assert_eq!(entry.prompt, "a paper boat");
        assert_eq!(entry.size, ImageSize::Portrait);

        let sent = transport.sent.lock().unwrap()[0].clone();
        assert!(sent.prompt.unwrap().starts_with("a paper boat, anime style"));
        assert_eq!(sent.size, "1024x1792");
        assert!(sent.api_key.is_none());
        assert!(provider.prompts()[0].contains("https://example.com/ref.png"));
    }

    #[tokio::test]
    async fn test_credential_is_sent() {
        let transport = Arc::new(InProcessTransport::new(Arc::new(ScriptedProvider::new())));
        let mut studio = studio(transport.clone());
        studio.context_mut().set_credential(Some("sk-user".into())).unwrap();

        studio
            .submit(&FormState::new("fog"), &CancellationToken::new())
            .await
            .unwrap();
        let sent = transport.sent.lock().unwrap()[0].clone();
        assert_eq!(sent.api_key.as_deref(), Some("sk-user"));
    }

    #[tokio::test]
    async fn test_fatal_error_surfaces_once() {
        let transport = Arc::new(ScriptedTransport {
            events: vec![
                Ok(GenerationEvent::Progress { index: 0 }),
                Ok(GenerationEvent::fatal("Failed to generate image")),
            ],
            hang: false,
        });
        let mut studio = studio(transport);

        let err = studio
            .submit(&FormState::new("fog"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Failed to generate image");
        assert!(studio.board().slots().iter().all(|s| *s == SlotState::Waiting));
    }

    #[tokio::test]
    async fn test_stream_without_terminal_is_transport_error() {
        let transport = Arc::new(ScriptedTransport {
            events: vec![Ok(GenerationEvent::Progress { index: 0 })],
            hang: false,
        });
        let err = studio(transport)
            .submit(&FormState::new("fog"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StylegenError::Transport(_)));
    }

    #[tokio::test]
    async fn test_cancel_stops_updates() {
        let transport = Arc::new(ScriptedTransport {
            events: vec![Ok(GenerationEvent::Progress { index: 0 })],
            hang: true,
        });
        let mut studio = studio(transport);
        let cancel = CancellationToken::new();

        let canceller = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                cancel.cancel();
            })
        };

        let err = studio.submit(&FormState::new("fog"), &cancel).await.unwrap_err();
        canceller.await.unwrap();

        assert!(matches!(err, StylegenError::Cancelled));
        assert_eq!(studio.board().slots()[0], SlotState::InProgress);
        assert_eq!(studio.board().status(), &BoardStatus::Cancelled);
        assert!(studio.board().is_finished());
    }

    #[tokio::test]
    async fn test_cancel_before_open() {
        let transport = Arc::new(InProcessTransport::new(Arc::new(ScriptedProvider::new())));
        let mut studio = studio(transport);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = studio.submit(&FormState::new("fog"), &cancel).await.unwrap_err();
        assert!(matches!(err, StylegenError::Cancelled));
        assert_eq!(studio.board().status(), &BoardStatus::Cancelled);
        assert!(studio.board().slots().iter().all(|s| *s == SlotState::Waiting));
    }

    #[tokio::test]
    async fn test_blank_prompt_never_hits_relay() {
        let transport = Arc::new(InProcessTransport::new(Arc::new(ScriptedProvider::new())));
        let err = studio(transport.clone())
            .submit(&FormState::new("  "), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), PROMPT_REQUIRED);
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_history_entry() {
        let provider = Arc::new(ScriptedProvider::new());
        let mut studio = studio(Arc::new(InProcessTransport::new(provider.clone())));
        studio.styles_mut().select("vintage").unwrap();

        let form = FormState::new("old car")
            .with_size(ImageSize::Landscape)
            .with_reference_image_url("https://example.com/ref.png");
        let outcome = studio.submit(&form, &CancellationToken::new()).await.unwrap();
        let id = outcome.history_entry.unwrap().id;
        let calls = provider.call_count();

        studio.styles_mut().clear();
        let selection = studio.load_history_entry(&id).unwrap();

        assert_eq!(selection.form, form);
        assert_eq!(selection.style, studio.styles().effective_style());
        assert!(selection.style.starts_with("vintage 1970s style"));
        assert_eq!(selection.image_urls.len(), 4);
        assert_eq!(provider.call_count(), calls);
        assert!(studio.load_history_entry("missing").is_none());
    }
}
