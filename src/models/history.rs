use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ImageSize;

/// Marker placed in a history entry's style text when the batch was
/// generated against a reference image.
pub const REFERENCE_MARKER: &str = "Reference image: ";
const STYLE_SEPARATOR: &str = " | ";

/// A completed batch kept on the client for re-display and re-submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub prompt: String,
    pub style: String,
    pub size: ImageSize,
    pub image_urls: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(
        prompt: impl Into<String>,
        style: impl Into<String>,
        size: ImageSize,
        image_urls: Vec<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            prompt: prompt.into(),
            style: style.into(),
            size,
            image_urls,
            created_at: Utc::now(),
        }
    }

    /// Style text and reference URL recovered from the stored style.
    pub fn style_parts(&self) -> (String, Option<String>) {
        split_history_style(&self.style)
    }
}

/// Folds the reference URL, if any, into the style text stored with an entry.
pub fn compose_history_style(style: &str, reference_image_url: Option<&str>) -> String {
    match reference_image_url {
        Some(url) if style.is_empty() => format!("{}{}", REFERENCE_MARKER, url),
        Some(url) => format!("{}{}{}{}", style, STYLE_SEPARATOR, REFERENCE_MARKER, url),
        None => style.to_string(),
    }
}

pub fn split_history_style(stored: &str) -> (String, Option<String>) {
    if let Some(url) = stored.strip_prefix(REFERENCE_MARKER) {
        return (String::new(), Some(url.to_string()));
    }

    let marker = format!("{}{}", STYLE_SEPARATOR, REFERENCE_MARKER);
    match stored.rfind(&marker) {
        Some(pos) => (
            stored[..pos].to_string(),
            Some(stored[pos + marker.len()..].to_string()),
        ),
        None => (stored.to_string(), None),
    }
}
