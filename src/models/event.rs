use crate::error::StylegenError;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

/// Number of images produced per batch.
pub const BATCH_SIZE: usize = 4;

const STATUS_GENERATING: &str = "generating";
const STATUS_COMPLETE: &str = "complete";
const SSE_DATA_PREFIX: &str = "data: ";

/// One message of the relay's event stream.
///
/// On the wire each variant is a flat JSON object, e.g.
/// `{"status":"generating","index":0}` or `{"error":"..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireEvent", into = "WireEvent")]
pub enum GenerationEvent {
    Progress { index: usize },
    Result { index: usize, image_url: String },
    ItemError { index: usize, message: String },
    Complete,
    FatalError { message: String },
}

impl GenerationEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, GenerationEvent::Complete | GenerationEvent::FatalError { .. })
    }

    pub fn index(&self) -> Option<usize> {
        match self {
            GenerationEvent::Progress { index }
            | GenerationEvent::Result { index, .. }
            | GenerationEvent::ItemError { index, .. } => Some(*index),
            GenerationEvent::Complete | GenerationEvent::FatalError { .. } => None,
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        GenerationEvent::FatalError {
            message: message.into(),
        }
    }

    /// Encodes the event as one `data:` frame terminated by a blank line.
    pub fn to_sse_frame(&self) -> String {
        // A flat struct of strings and integers always serializes.
        let json = serde_json::to_string(self).unwrap_or_else(|_| {
            r#"{"error":"Failed to encode event"}"#.to_string()
        });
        format!("{}{}\n\n", SSE_DATA_PREFIX, json)
    }

    /// Parses a single `data: {...}` line. Blank lines and comments give `None`.
    pub fn from_sse_line(line: &str) -> Option<Result<Self, StylegenError>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with(':') {
            return None;
        }

        let data = line.strip_prefix(SSE_DATA_PREFIX.trim_end()).map(str::trim_start)?;
        Some(serde_json::from_str(data).map_err(|e| {
            StylegenError::Transport(format!("Malformed event {:?}: {}", data, e))
        }))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    index: Option<usize>,
}

impl From<GenerationEvent> for WireEvent {
    fn from(event: GenerationEvent) -> Self {
        match event {
            GenerationEvent::Progress { index } => WireEvent {
                status: Some(STATUS_GENERATING.into()),
                index: Some(index),
                ..Default::default()
            },
            GenerationEvent::Result { index, image_url } => WireEvent {
                image_url: Some(image_url),
                index: Some(index),
                ..Default::default()
            },
            GenerationEvent::ItemError { index, message } => WireEvent {
                error: Some(message),
                index: Some(index),
                ..Default::default()
            },
            GenerationEvent::Complete => WireEvent {
                status: Some(STATUS_COMPLETE.into()),
                ..Default::default()
            },
            GenerationEvent::FatalError { message } => WireEvent {
                error: Some(message),
                ..Default::default()
            },
        }
    }
}

impl TryFrom<WireEvent> for GenerationEvent {
    type Error = String;

    fn try_from(wire: WireEvent) -> Result<Self, Self::Error> {
        if let Some(index) = wire.index {
            if index >= BATCH_SIZE {
                return Err(format!("index {} out of range", index));
            }
        }

        match wire {
            WireEvent {
                image_url: Some(image_url),
                index: Some(index),
                ..
            } => Ok(GenerationEvent::Result { index, image_url }),
            WireEvent {
                error: Some(message),
                index: Some(index),
                ..
            } => Ok(GenerationEvent::ItemError { index, message }),
            WireEvent {
                error: Some(message),
                index: None,
                ..
            } => Ok(GenerationEvent::FatalError { message }),
            WireEvent {
                status: Some(status),
                index,
                ..
            } => match (status.as_str(), index) {
                (STATUS_GENERATING, Some(index)) => Ok(GenerationEvent::Progress { index }),
                (STATUS_COMPLETE, None) => Ok(GenerationEvent::Complete),
                _ => Err(format!("unexpected status {:?}", status)),
            },
            _ => Err("event carries no recognised fields".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shapes() {
        let cases = [
            (GenerationEvent::Progress { index: 0 }, r#"{"status":"generating","index":0}"#),
            (
                GenerationEvent::Result {
                    index: 1,
                    image_url: "https://img/1.png".into(),
                },
                r#"{"imageUrl":"https://img/1.png","index":1}"#,
            ),
            (
                GenerationEvent::ItemError {
                    index: 2,
                    message: "rate limited".into(),
                },
                r#"{"error":"rate limited","index":2}"#,
            ),
            (GenerationEvent::Complete, r#"{"status":"complete"}"#),
            (GenerationEvent::fatal("Prompt is required"), r#"{"error":"Prompt is required"}"#),
        ];

        for (event, json) in cases {
            assert_eq!(serde_json::to_string(&event).unwrap(), json);
            assert_eq!(serde_json::from_str::<GenerationEvent>(json).unwrap(), event);
        }
    }

    #[test]
    fn test_sse_frame() {
        let frame = GenerationEvent::Complete.to_sse_frame();
        assert_eq!(frame, "data: {\"status\":\"complete\"}\n\n");
    }

    #[test]
    fn test_parse_sse_line() {
        assert!(GenerationEvent::from_sse_line("").is_none());
        assert!(GenerationEvent::from_sse_line(": keep-alive").is_none());
        assert!(GenerationEvent::from_sse_line("event: ping").is_none());

        let event = GenerationEvent::from_sse_line(r#"data: {"status":"generating","index":3}"#)
            .unwrap()
            .unwrap();
        assert_eq!(event, GenerationEvent::Progress { index: 3 });

        let bad = GenerationEvent::from_sse_line("data: {not json").unwrap();
        assert!(matches!(bad, Err(StylegenError::Transport(_))));
    }

    #[test]
    fn test_rejects_out_of_range_index() {
        assert!(serde_json::from_str::<GenerationEvent>(r#"{"status":"generating","index":4}"#).is_err());
        assert!(serde_json::from_str::<GenerationEvent>(r#"{"status":"complete","index":0}"#).is_err());
        assert!(serde_json::from_str::<GenerationEvent>("{}").is_err());
    }

    #[test]
    fn test_terminal_events() {
        assert!(GenerationEvent::Complete.is_terminal());
        assert!(GenerationEvent::fatal("x").is_terminal());
        assert!(!GenerationEvent::Progress { index: 0 }.is_terminal());
        assert_eq!(GenerationEvent::Progress { index: 2 }.index(), Some(2));
    }
}
