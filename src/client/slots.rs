use crate::models::{GenerationEvent, BATCH_SIZE};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SlotState {
    #[default]
    Waiting,
    InProgress,
    Done(String),
    Failed(String),
}

impl SlotState {
    /// Progress indicator shown for the slot: 0 waiting, 50 in flight,
    /// 100 resolved either way.
    pub fn progress(&self) -> u8 {
        match self {
            SlotState::Waiting => 0,
            SlotState::InProgress => 50,
            SlotState::Done(_) | SlotState::Failed(_) => 100,
        }
    }

    pub fn image_url(&self) -> Option<&str> {
        match self {
            SlotState::Done(url) => Some(url),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BoardStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Fatal(String),
    /// Aborted by the user; slots keep whatever they showed at that point.
    Cancelled,
}

/// Four result slots of one submission, driven by relay events.
#[derive(Debug, Clone, Default)]
pub struct SlotBoard {
    slots: [SlotState; BATCH_SIZE],
    arrivals: Vec<String>,
    status: BoardStatus,
}

impl SlotBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears every slot and marks the board as running a new submission.
    pub fn start(&mut self) {
        *self = Self {
            status: BoardStatus::Running,
            ..Self::default()
        };
    }

    pub fn apply(&mut self, event: &GenerationEvent) {
        if self.is_finished() {
            log::warn!("Ignoring event after end of stream: {:?}", event);
            return;
        }

        match event {
            GenerationEvent::Progress { index } => {
                if let Some(slot) = self.slots.get_mut(*index) {
                    *slot = SlotState::InProgress;
                }
            }
            GenerationEvent::Result { index, image_url } => {
                if let Some(slot) = self.slots.get_mut(*index) {
                    *slot = SlotState::Done(image_url.clone());
                    self.arrivals.push(image_url.clone());
                }
            }
            GenerationEvent::ItemError { index, message } => {
                if let Some(slot) = self.slots.get_mut(*index) {
                    *slot = SlotState::Failed(message.clone());
                }
            }
            GenerationEvent::Complete => self.status = BoardStatus::Completed,
            GenerationEvent::FatalError { message } => {
                // Nothing from a failed stream is kept.
                self.slots = Default::default();
                self.arrivals.clear();
                self.status = BoardStatus::Fatal(message.clone());
            }
        }
    }

    /// Ends a running submission without touching the slots.
    pub fn cancel(&mut self) {
        if self.status == BoardStatus::Running {
            self.status = BoardStatus::Cancelled;
        }
    }

    pub fn slots(&self) -> &[SlotState; BATCH_SIZE] {
        &self.slots
    }

    pub fn status(&self) -> &BoardStatus {
        &self.status
    }

    pub fn is_finished(&self) -> bool {
        matches!(
            self.status,
            BoardStatus::Completed | BoardStatus::Fatal(_) | BoardStatus::Cancelled
        )
    }

    pub fn is_full_batch(&self) -> bool {
        self.slots.iter().all(|s| matches!(s, SlotState::Done(_)))
    }

    /// URLs in the order their results arrived.
    pub fn image_urls(&self) -> &[String] {
        &self.arrivals
    }

    pub fn errors(&self) -> Vec<(usize, &str)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| match s {
                SlotState::Failed(msg) => Some((i, msg.as_str())),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(index: usize) -> GenerationEvent {
        GenerationEvent::Result {
            index,
            image_url: format!("https://img/{}.png", index),
        }
    }

    #[test]
    fn test_mixed_batch() {
        let mut board = SlotBoard::new();
        board.start();

        for index in 0..4 {
            board.apply(&GenerationEvent::Progress { index });
            assert_eq!(board.slots()[index].progress(), 50);
            if index == 2 {
                board.apply(&GenerationEvent::ItemError {
                    index,
                    message: "blocked".into(),
                });
            } else {
                board.apply(&result(index));
            }
        }
        board.apply(&GenerationEvent::Complete);

        assert_eq!(
            board.slots(),
            &[
                SlotState::Done("https://img/0.png".into()),
                SlotState::Done("https://img/1.png".into()),
                SlotState::Failed("blocked".into()),
                SlotState::Done("https://img/3.png".into()),
            ]
        );
        assert_eq!(board.status(), &BoardStatus::Completed);
        assert!(!board.is_full_batch());
        assert_eq!(board.errors(), vec![(2, "blocked")]);
    }

    #[test]
    fn test_fatal_discards_partial_results() {
        let mut board = SlotBoard::new();
        board.start();
        board.apply(&GenerationEvent::Progress { index: 0 });
        board.apply(&result(0));
        board.apply(&GenerationEvent::fatal("Failed to generate image"));

        assert!(board.slots().iter().all(|s| *s == SlotState::Waiting));
        assert!(board.image_urls().is_empty());
        assert_eq!(
            board.status(),
            &BoardStatus::Fatal("Failed to generate image".into())
        );
    }

    #[test]
    fn test_events_after_terminal_ignored() {
        let mut board = SlotBoard::new();
        board.start();
        board.apply(&GenerationEvent::Complete);
        board.apply(&result(1));
        assert_eq!(board.slots()[1], SlotState::Waiting);
    }

    #[test]
    fn test_cancel_keeps_slots_and_ends_board() {
        let mut board = SlotBoard::new();
        board.start();
        board.apply(&result(0));
        board.apply(&GenerationEvent::Progress { index: 1 });
        board.cancel();

        assert!(board.is_finished());
        assert_eq!(board.status(), &BoardStatus::Cancelled);
        assert_eq!(board.slots()[1], SlotState::InProgress);

        board.apply(&result(1));
        assert_eq!(board.slots()[1], SlotState::InProgress);

        let mut idle = SlotBoard::new();
        idle.cancel();
        assert_eq!(idle.status(), &BoardStatus::Idle);
    }

    #[test]
    fn test_arrival_order() {
        let mut board = SlotBoard::new();
        board.start();
        for index in [1, 0, 3, 2] {
            board.apply(&result(index));
        }
        assert!(board.is_full_batch());
        assert_eq!(
            board.image_urls(),
            &[
                "https://img/1.png",
                "https://img/0.png",
                "https://img/3.png",
                "https://img/2.png"
            ]
        );
    }
}
