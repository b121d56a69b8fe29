pub mod context;
pub mod decoder;
pub mod session;
pub mod slots;
pub mod store;
pub mod styles;
pub mod transport;

pub use context::ClientContext;
pub use session::{FormState, HistorySelection, ImageStudio, SubmissionOutcome};
pub use slots::{BoardStatus, SlotBoard, SlotState};
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use styles::{StylePreset, StyleSelector, STYLE_PRESETS};
pub use transport::{HttpRelayTransport, RelayTransport};
pub use tokio_util::sync::CancellationToken;
