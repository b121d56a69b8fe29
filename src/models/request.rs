use crate::error::{Result, StylegenError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const INVALID_SIZE_MESSAGE: &str =
    "Invalid size parameter. Must be one of: 1024x1024, 1024x1792, 1792x1024";

/// The fixed allow-list of output sizes. The wire value is the dimension string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ImageSize {
    #[default]
    #[serde(rename = "1024x1024")]
    Square,
    #[serde(rename = "1024x1792")]
    Portrait,
    #[serde(rename = "1792x1024")]
    Landscape,
}

impl ImageSize {
    pub const ALL: [ImageSize; 3] = [ImageSize::Square, ImageSize::Portrait, ImageSize::Landscape];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::Square => "1024x1024",
            ImageSize::Portrait => "1024x1792",
            ImageSize::Landscape => "1792x1024",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ImageSize::Square => "square",
            ImageSize::Portrait => "portrait",
            ImageSize::Landscape => "landscape",
        }
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageSize {
    type Err = StylegenError;

    fn from_str(s: &str) -> Result<Self> {
        ImageSize::ALL
            .into_iter()
            .find(|size| size.as_str() == s)
            .ok_or_else(|| StylegenError::Validation(INVALID_SIZE_MESSAGE.to_string()))
    }
}

fn default_size() -> String {
    ImageSize::default().as_str().to_string()
}

/// JSON body accepted by the relay. Everything is optional at this level so
/// that missing fields surface as validation messages instead of parse errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayRequestBody {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default = "default_size")]
    pub size: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_image_url: Option<String>,
}

impl Default for RelayRequestBody {
    fn default() -> Self {
        Self {
            prompt: None,
            size: default_size(),
            api_key: None,
            reference_image_url: None,
        }
    }
}

impl RelayRequestBody {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: Some(prompt.into()),
            ..Default::default()
        }
    }

    pub fn with_size(mut self, size: ImageSize) -> Self {
        self.size = size.as_str().to_string();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_reference_image_url(mut self, url: impl Into<String>) -> Self {
        self.reference_image_url = Some(url.into());
        self
    }
}

/// A request that passed validation: prompt is non-blank, the credential is
/// resolved and the size is on the allow-list. The reference URL is kept
/// exactly as the caller sent it (trimmed), never normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub size: ImageSize,
    pub credential: String,
    pub reference_image_url: Option<String>,
}

impl GenerationRequest {
    /// Prompt actually sent upstream. The provider cannot condition on an
    /// image, so the reference is passed as an instruction in the text.
    pub fn upstream_prompt(&self) -> String {
        match &self.reference_image_url {
            Some(url) => format!(
                "{}. Mimic the artistic style of the reference image at {}",
                self.prompt, url
            ),
            None => self.prompt.clone(),
        }
    }
}
