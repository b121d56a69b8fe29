use crate::{
    error::{Result, StylegenError},
    models::{GenerationRequest, ImageSize, RelayRequestBody},
};
use url::Url;

pub const INVALID_BODY: &str = "Invalid request body";
pub const PROMPT_REQUIRED: &str = "Prompt is required";
pub const API_KEY_REQUIRED: &str = "API key is required";
pub const INVALID_REFERENCE_URL: &str = "Invalid reference image URL";

pub fn parse_body(bytes: &[u8]) -> Result<RelayRequestBody> {
    serde_json::from_slice(bytes).map_err(|e| {
        log::debug!("Rejecting unparseable request body: {}", e);
        StylegenError::Validation(INVALID_BODY.to_string())
    })
}

/// Checks, in order: prompt, credential, size, reference URL. The first
/// failure wins; nothing is sent upstream for a rejected request.
pub fn validate(
    body: RelayRequestBody,
    default_credential: Option<&str>,
) -> Result<GenerationRequest> {
    let prompt = body
        .prompt
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| StylegenError::Validation(PROMPT_REQUIRED.to_string()))?;

    let credential = body
        .api_key
        .filter(|k| !k.trim().is_empty())
        .or_else(|| default_credential.map(str::to_string))
        .ok_or_else(|| StylegenError::Validation(API_KEY_REQUIRED.to_string()))?;

    let size: ImageSize = body.size.parse()?;

    let reference_image_url = match body.reference_image_url.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(parse_reference_url(raw)?),
    };

    Ok(GenerationRequest {
        prompt,
        size,
        credential,
        reference_image_url,
    })
}

// Parsed only to check it; the caller's literal string is what gets forwarded.
fn parse_reference_url(raw: &str) -> Result<String> {
    let invalid = || StylegenError::Validation(INVALID_REFERENCE_URL.to_string());
    let url = Url::parse(raw).map_err(|_| invalid())?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(raw.to_string()),
        _ => Err(invalid()),
    }
}
