//! Drives a running relay from the client side.
//!
//! ```text
//! cargo run --example generate -- "a lighthouse in a storm" watercolor anime
//! ```

use stylegen::{
    client::SlotState,
    logger::{self, LoggerConfig},
    CancellationToken, ClientConfig, FormState, ImageSize, ImageStudio,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    logger::init_with_config(LoggerConfig::development())?;

    let mut args = std::env::args().skip(1);
    let prompt = args
        .next()
        .unwrap_or_else(|| "A serene landscape with mountains and a lake at sunset".to_string());

    let config = ClientConfig::from_env();
    log::info!("🔄 Using relay at {}", config.relay_url);
    let mut studio = ImageStudio::open(&config)?;

    for style in args {
        studio.styles_mut().select(&style)?;
    }
    log::info!("🎨 Style: {}", studio.styles().effective_style());

    if let Ok(key) = std::env::var("OPENAI_API_KEY") {
        studio.context_mut().set_credential(Some(key))?;
    }

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let form = FormState::new(prompt).with_size(ImageSize::Square);
    let outcome = studio.submit(&form, &cancel).await?;

    for (index, slot) in outcome.slots.iter().enumerate() {
        match slot {
            SlotState::Done(url) => log::info!("🖼️  Image {}: {}", index + 1, url),
            SlotState::Failed(message) => log::error!("❌ Image {} failed: {}", index + 1, message),
            other => log::warn!("⚠️  Image {} unresolved: {:?}", index + 1, other),
        }
    }

    if let Some(entry) = outcome.history_entry {
        log::info!("📚 Saved to history as {}", entry.id);
    }

    Ok(())
}
