use crate::error::{Result, StylegenError};

pub const CUSTOM_STYLE_ID: &str = "custom";
pub const MAX_SELECTED_STYLES: usize = 2;
const COMBINE_PHRASE: &str = ", combined with ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StylePreset {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub prompt: &'static str,
}

pub static STYLE_PRESETS: [StylePreset; 6] = [
    StylePreset {
        id: "watercolor",
        name: "Watercolor",
        description: "Soft, flowing watercolor painting style",
        prompt: "in the style of watercolor painting, soft colors, flowing, artistic",
    },
    StylePreset {
        id: "cyberpunk",
        name: "Cyberpunk",
        description: "Futuristic cyberpunk aesthetic with neon lights",
        prompt: "cyberpunk style, neon lights, futuristic, high contrast, digital art",
    },
    StylePreset {
        id: "vintage",
        name: "Vintage",
        description: "Retro vintage look from the 1970s",
        prompt: "vintage 1970s style, retro, film grain, faded colors, nostalgic",
    },
    StylePreset {
        id: "anime",
        name: "Anime",
        description: "Japanese anime illustration style",
        prompt: "anime style, manga illustration, vibrant, clean lines, detailed",
    },
    StylePreset {
        id: "oil-painting",
        name: "Oil Painting",
        description: "Classical oil painting with rich textures",
        prompt: "oil painting style, rich textures, classical, detailed brushstrokes, artistic",
    },
    StylePreset {
        id: CUSTOM_STYLE_ID,
        name: "Custom Style",
        description: "Define your own custom style",
        prompt: "",
    },
];

pub fn find_preset(id: &str) -> Option<&'static StylePreset> {
    STYLE_PRESETS.iter().find(|p| p.id == id)
}

/// Joins the user prompt and the style text the way they are sent upstream.
pub fn compose_prompt(prompt: &str, style: &str) -> String {
    let prompt = prompt.trim();
    let style = style.trim();
    if prompt.is_empty() || style.is_empty() {
        prompt.to_string()
    } else {
        format!("{}, {}", prompt, style)
    }
}

/// Up to two selected styles. The first pick stays put; a further pick
/// replaces the second.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleSelector {
    selected: Vec<&'static str>,
    custom_text: String,
}

impl StyleSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects `id`, or deselects it if it is already selected.
    pub fn select(&mut self, id: &str) -> Result<()> {
        let preset = find_preset(id)
            .ok_or_else(|| StylegenError::Validation(format!("Unknown style preset: {}", id)))?;

        if let Some(pos) = self.selected.iter().position(|s| *s == preset.id) {
            self.selected.remove(pos);
        } else if self.selected.len() < MAX_SELECTED_STYLES {
            self.selected.push(preset.id);
        } else {
            self.selected[MAX_SELECTED_STYLES - 1] = preset.id;
        }
        Ok(())
    }

    pub fn set_custom_text(&mut self, text: impl Into<String>) {
        self.custom_text = text.into();
    }

    pub fn custom_text(&self) -> &str {
        &self.custom_text
    }

    /// Replaces the selection with the custom slot holding `text`.
    pub fn use_custom_only(&mut self, text: impl Into<String>) {
        self.custom_text = text.into();
        self.selected = vec![CUSTOM_STYLE_ID];
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn selected(&self) -> &[&'static str] {
        &self.selected
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.iter().any(|s| *s == id)
    }

    fn fragment(&self, id: &str) -> &str {
        if id == CUSTOM_STYLE_ID {
            self.custom_text.trim()
        } else {
            find_preset(id).map(|p| p.prompt).unwrap_or_default()
        }
    }

    /// Style text applied to every request while this selection holds.
    pub fn effective_style(&self) -> String {
        self.selected
            .iter()
            .map(|id| self.fragment(id))
            .filter(|f| !f.is_empty())
            .collect::<Vec<_>>()
            .join(COMBINE_PHRASE)
    }
}
