use crate::{
    config::Config,
    error::{Result, StylegenError},
    models::GenerationEvent,
    provider,
    relay::{parse_body, Relay},
};
use actix_web::{
    http::{header, StatusCode},
    web, App, HttpResponse, HttpServer,
};
use futures::StreamExt;
use serde_json::json;

/// `POST /api/generate-image`: streams one `data:` frame per event.
async fn generate_image_stream(relay: web::Data<Relay>, body: web::Bytes) -> HttpResponse {
    let events = relay
        .stream(parse_body(&body))
        .map(|event: GenerationEvent| {
            Ok::<_, actix_web::Error>(web::Bytes::from(event.to_sse_frame()))
        });

    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header((header::CACHE_CONTROL, "no-cache"))
        .streaming(events)
}

/// `POST /api/generate-images`: waits for the whole batch.
async fn generate_images(relay: web::Data<Relay>, body: web::Bytes) -> HttpResponse {
    match relay.generate_batch(parse_body(&body)).await {
        Ok(summary) => HttpResponse::Ok().json(summary),
        Err(e) => {
            let status = match e {
                StylegenError::Validation(_) => StatusCode::BAD_REQUEST,
                StylegenError::Upstream(_) => StatusCode::BAD_GATEWAY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            HttpResponse::build(status).json(json!({ "error": e.user_message() }))
        }
    }
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/generate-image", web::post().to(generate_image_stream))
        .route("/api/generate-images", web::post().to(generate_images))
        .route("/health", web::get().to(health));
}

/// Runs the relay until the server is shut down.
pub async fn run(config: Config) -> Result<()> {
    let provider = provider::from_config(&config.provider)?;
    let relay = web::Data::new(Relay::new(
        provider,
        config.default_api_key().map(str::to_string),
    ));

    let addr = (config.host().to_string(), config.port());
    log::info!("🌐 Listening on http://{}:{}", addr.0, addr.1);

    HttpServer::new(move || App::new().app_data(relay.clone()).configure(configure))
        .bind(addr)
        .map_err(|e| StylegenError::Config(format!("Failed to bind: {}", e)))?
        .run()
        .await
        .map_err(|e| StylegenError::Internal(format!("Server error: {}", e)))
}
