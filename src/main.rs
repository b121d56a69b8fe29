use stylegen::{
    logger::{self, LoggerConfig},
    Config,
};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();

    let config = Config::from_env();
    logger::init_with_config(LoggerConfig::from_config(&config))?;

    if dotenv_loaded {
        log::info!("✅ .env file loaded successfully");
    } else {
        log::warn!("⚠️  No .env file found, using system environment variables");
    }

    logger::log_startup_info("stylegen", env!("CARGO_PKG_VERSION"), &config);
    logger::log_config_info(&config);

    if config.default_api_key().is_none() {
        log::warn!("⚠️  OPENAI_API_KEY is not set; requests must carry their own apiKey");
    }

    stylegen::server::run(config).await?;
    Ok(())
}
