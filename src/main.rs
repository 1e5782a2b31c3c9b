mod applications;
mod cache_validator;
mod config;
mod db;
mod db_storage;
mod errors;
mod handlers;
mod models;
mod openai_client;
mod record_text;
mod scoring;
mod services;

use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db::Database;
use crate::openai_client::OpenAiClient;

/// Serves the OpenAPI specification YAML file.
///
/// Reads `openapi.yml` from the filesystem and serves it with the
/// appropriate content type, or a 404 hint when the file is absent.
async fn serve_openapi_spec() -> impl IntoResponse {
    match tokio::fs::read_to_string("openapi.yml").await {
        Ok(content) => (
            StatusCode::OK,
            [(axum::http::header::CONTENT_TYPE, "text/yaml")],
            content,
        )
            .into_response(),
        Err(_) => (
            StatusCode::NOT_FOUND,
            "OpenAPI spec not found. Add an openapi.yml next to the binary.",
        )
            .into_response(),
    }
}

/// Serves the Swagger UI HTML page.
///
/// Returns an HTML page embedding Swagger UI, configured to load the
/// specification served by `serve_openapi_spec`.
async fn serve_swagger_ui() -> impl IntoResponse {
    let html = r#"
<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Tenant Match API - Swagger UI</title>
    <link rel="stylesheet" type="text/css" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
    <style>
        body { margin: 0; padding: 0; }
    </style>
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-standalone-preset.js"></script>
    <script>
        window.onload = function() {
            window.ui = SwaggerUIBundle({
                url: "/api-docs/openapi.yml",
                dom_id: '#swagger-ui',
                deepLinking: true,
                presets: [
                    SwaggerUIBundle.presets.apis,
                    SwaggerUIStandalonePreset
                ],
                layout: "StandaloneLayout"
            });
        };
    </script>
</body>
</html>
"#;
    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "text/html; charset=utf-8")],
        html,
    )
}

/// Main entry point for the application.
///
/// Initializes logging, configuration, the database pool, the extraction
/// cache and the model client, then starts the Axum server with CORS, rate
/// limiting and request size limits in place.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tenant_match_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize database connection pool
    let db = Database::new(&config.database_url).await?;
    tracing::info!("Database connection pool established");

    // Listing extraction cache (1 hour TTL, 10k max entries)
    // Caches raw extraction responses to avoid re-running the actor per URL
    let extraction_cache = Cache::builder()
        .time_to_live(Duration::from_secs(3600))
        .max_capacity(10_000)
        .build();
    tracing::info!("Listing extraction cache initialized (1h TTL)");

    // Initialize the chat-completion client. The credential may still be
    // absent; scoring requests report that as a misconfiguration.
    let openai = match OpenAiClient::new(&config) {
        Ok(client) => {
            tracing::info!("Model client initialized: {}", config.openai_base_url);
            client
        }
        Err(e) => anyhow::bail!("Failed to initialize model client: {}", e),
    };

    // Build application state
    let app_state = Arc::new(handlers::AppState {
        db: db.pool.clone(),
        config: config.clone(),
        openai,
        extraction_cache,
    });

    // Configure rate limiter: 10 requests/second per IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .unwrap(),
    );

    // Build protected routes with security layers
    let protected_routes = Router::new()
        // API Documentation
        .route("/docs", get(serve_swagger_ui))
        .route("/api-docs/openapi.yml", get(serve_openapi_spec))
        // Applications / tenants
        .route("/api/v1/applications", post(handlers::submit_application))
        .route("/api/v1/tenants", get(handlers::list_tenants))
        .route("/api/v1/tenants/:id", get(handlers::get_tenant))
        .route(
            "/api/v1/tenants/:id/status",
            put(handlers::update_tenant_status),
        )
        .route(
            "/api/v1/tenants/:id/scheduling-link",
            post(handlers::send_scheduling_link),
        )
        // Scoring pipeline
        .route("/api/v1/tenants/:id/score", post(handlers::score_tenant))
        .route(
            "/api/v1/tenants/:id/score/reset",
            post(handlers::reset_tenant_scoring),
        )
        // Owner preferences
        .route(
            "/api/v1/owner/preferences",
            get(handlers::get_owner_preferences).put(handlers::upsert_owner_preferences),
        )
        // Listings
        .route(
            "/api/v1/properties/extract",
            post(handlers::extract_property),
        )
        .route(
            "/api/v1/properties",
            get(handlers::list_properties).delete(handlers::delete_all_properties),
        )
        .route("/api/v1/properties/:id", delete(handlers::delete_property))
        .layer(
            ServiceBuilder::new()
                // Request size limit: 5MB max payload (prevents memory exhaustion)
                .layer(RequestBodyLimitLayer::new(5 * 1024 * 1024))
                // Rate limiting: 10 req/sec per IP, burst of 20
                .layer(GovernorLayer {
                    config: governor_conf,
                }),
        );

    // Build final app with health check (bypasses rate limiting)
    let app = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected_routes)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
