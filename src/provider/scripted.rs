use crate::{
    error::{Result, StylegenError},
    models::ImageSize,
    provider::traits::ImageProvider,
};
use async_trait::async_trait;
use std::sync::Mutex;

/// Provider for tests: call `n` fails when `n` is in `failing`, every call is
/// recorded.
pub struct ScriptedProvider {
    failing: Vec<usize>,
    pub calls: Mutex<Vec<(String, String, ImageSize)>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::failing_on(&[])
    }

    pub fn failing_on(indices: &[usize]) -> Self {
        Self {
            failing: indices.to_vec(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|c| c.1.clone()).collect()
    }
}

#[async_trait]
impl ImageProvider for ScriptedProvider {
    async fn generate_image(
        &self,
        credential: &str,
        prompt: &str,
        size: ImageSize,
    ) -> Result<String> {
        let n = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((credential.to_string(), prompt.to_string(), size));
            calls.len() - 1
        };

        if self.failing.contains(&n) {
            Err(StylegenError::Upstream(format!("content policy violation on call {}", n)))
        } else {
            Ok(format!("https://images.test/{}.png", n))
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
