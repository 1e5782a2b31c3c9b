use crate::applications;
use crate::cache_validator::ValidatedCacheEntry;
use crate::config::Config;
use crate::db_storage::TenantStorage;
use crate::errors::AppError;
use crate::models::*;
use crate::openai_client::OpenAiClient;
use crate::scoring::{ScoreStore, ScoringService};
use crate::services::{LlmExtractionService, ListingScraperService, SchedulingService};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use moka::future::Cache;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: PgPool,
    /// Application configuration.
    pub config: Config,
    /// Chat-completion client (scoring and LLM extraction fallback).
    pub openai: OpenAiClient,
    /// Listing extraction cache (1 hour TTL) to avoid re-running the actor
    /// for the same URL. Key: "listing:{url}", Value: checksummed JSON entry.
    pub extraction_cache: Cache<String, String>,
}

/// Health check endpoint.
///
/// Returns the service status, version, and health information.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "tenant-match-api",
            "version": "0.1.0"
        })),
    )
}

// ============ Applications / tenants ============

/// POST /api/v1/applications
///
/// Accepts a rental application, validates the contact details and stores a
/// new tenant profile in "pending" status.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `payload` - The application form data.
///
/// # Returns
///
/// * `Result<Json<ApplicationResponse>, AppError>` - The created tenant id or an error.
pub async fn submit_application(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ApplicationRequest>,
) -> Result<Json<ApplicationResponse>, AppError> {
    tracing::info!(
        "POST /applications - {} {}",
        payload.first_name,
        payload.last_name
    );

    let tenant_id = applications::submit_application(&state.db, &payload).await?;

    Ok(Json(ApplicationResponse {
        success: true,
        tenant_id,
    }))
}

/// GET /api/v1/tenants
///
/// Lists all tenant profiles, newest application first.
pub async fn list_tenants(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TenantProfile>>, AppError> {
    let storage = TenantStorage::new(state.db.clone());
    let tenants = storage.list_tenants().await?;

    tracing::debug!("Listed {} tenant profile(s)", tenants.len());
    Ok(Json(tenants))
}

/// GET /api/v1/tenants/:id
///
/// Retrieves one tenant profile by id.
pub async fn get_tenant(
    State(state): State<Arc<AppState>>,
    Path(tenant_id): Path<Uuid>,
) -> Result<Json<TenantProfile>, AppError> {
    let storage = TenantStorage::new(state.db.clone());
    let tenant = storage
        .fetch_tenant(tenant_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Tenant {} not found", tenant_id)))?;

    Ok(Json(tenant))
}

/// PUT /api/v1/tenants/:id/status
///
/// Updates a tenant's application status.
pub async fn update_tenant_status(
    State(state): State<Arc<AppState>>,
    Path(tenant_id): Path<Uuid>,
    Json(payload): Json<StatusUpdateRequest>,
) -> Result<Json<SimpleResponse>, AppError> {
    tracing::info!(
        "PUT /tenants/{}/status - status: {}",
        tenant_id,
        payload.status
    );

    let storage = TenantStorage::new(state.db.clone());
    storage
        .update_application_status(tenant_id, &payload.status)
        .await?;

    Ok(Json(SimpleResponse { success: true }))
}

/// POST /api/v1/tenants/:id/scheduling-link
///
/// Fires the interview scheduling webhook for a tenant (best-effort GET)
/// and marks the link as sent on the profile.
///
/// # Returns
///
/// * `Result<Json<SchedulingLinkResponse>, AppError>` - Whether the webhook
///   was delivered; the stored flags are updated either way.
pub async fn send_scheduling_link(
    State(state): State<Arc<AppState>>,
    Path(tenant_id): Path<Uuid>,
) -> Result<Json<SchedulingLinkResponse>, AppError> {
    tracing::info!("POST /tenants/{}/scheduling-link", tenant_id);

    let storage = TenantStorage::new(state.db.clone());
    let tenant = storage
        .fetch_tenant(tenant_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Tenant {} not found", tenant_id)))?;

    let scheduling = SchedulingService::new(&state.config);
    let webhook_delivered = scheduling
        .notify(&tenant.id.to_string(), &tenant.email)
        .await;

    storage.mark_scheduling_link_sent(tenant_id).await?;

    Ok(Json(SchedulingLinkResponse {
        success: true,
        webhook_delivered,
    }))
}

// ============ Scoring ============

/// POST /api/v1/tenants/:id/score
///
/// Runs the compatibility scoring pipeline for one tenant: fetch tenant +
/// owner preferences, one chat-completion call, parse and range-check the
/// response, persist the score/pros/cons triple.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `tenant_id` - The UUID of the tenant to score.
///
/// # Returns
///
/// * `Result<Json<ScoreResponse>, AppError>` - The persisted scoring outcome or an error.
pub async fn score_tenant(
    State(state): State<Arc<AppState>>,
    Path(tenant_id): Path<Uuid>,
) -> Result<Json<ScoreResponse>, AppError> {
    tracing::info!("POST /tenants/{}/score", tenant_id);

    let service = ScoringService::new(
        TenantStorage::new(state.db.clone()),
        state.openai.clone(),
    );
    let outcome = service.score_tenant(tenant_id).await?;

    Ok(Json(ScoreResponse {
        success: true,
        score: outcome.score,
        pros: outcome.pros,
        cons: outcome.cons,
    }))
}

/// POST /api/v1/tenants/:id/score/reset
///
/// Clears a previous scoring result. Score, pros and cons are reset
/// together in one update.
pub async fn reset_tenant_scoring(
    State(state): State<Arc<AppState>>,
    Path(tenant_id): Path<Uuid>,
) -> Result<Json<SimpleResponse>, AppError> {
    tracing::info!("POST /tenants/{}/score/reset", tenant_id);

    let service = ScoringService::new(
        TenantStorage::new(state.db.clone()),
        state.openai.clone(),
    );
    service.reset_scoring(tenant_id).await?;

    Ok(Json(SimpleResponse { success: true }))
}

// ============ Owner preferences ============

/// GET /api/v1/owner/preferences
///
/// Returns the single owner-preference row, 404 until the questionnaire has
/// been submitted once.
pub async fn get_owner_preferences(
    State(state): State<Arc<AppState>>,
) -> Result<Json<OwnerPreferences>, AppError> {
    let storage = TenantStorage::new(state.db.clone());
    let prefs = storage
        .fetch_owner_preferences()
        .await?
        .ok_or_else(|| AppError::NotFound("Owner preferences not found".to_string()))?;

    Ok(Json(prefs))
}

/// PUT /api/v1/owner/preferences
///
/// Upserts the owner questionnaire: updates the existing row when present,
/// inserts the first one otherwise.
pub async fn upsert_owner_preferences(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<OwnerPreferencesRequest>,
) -> Result<Json<OwnerPreferences>, AppError> {
    tracing::info!("PUT /owner/preferences");

    let storage = TenantStorage::new(state.db.clone());
    let prefs = storage.upsert_owner_preferences(&payload).await?;

    Ok(Json(prefs))
}

// ============ Listings ============

/// POST /api/v1/properties/extract
///
/// Extracts a classifieds listing and stores it. The scraping actor is used
/// when configured; otherwise (or when the actor fails) the LLM fallback
/// relays what it can find as JSON. Responses are cached per URL for an
/// hour behind a checksum-validated entry.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `payload` - JSON body containing the listing URL.
///
/// # Returns
///
/// * `Result<Json<ExtractPropertyResponse>, AppError>` - The stored listing or an error.
pub async fn extract_property(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ExtractPropertyRequest>,
) -> Result<Json<ExtractPropertyResponse>, AppError> {
    let listing_url = url::Url::parse(payload.url.trim())
        .map_err(|_| AppError::BadRequest(format!("Invalid listing URL: {}", payload.url)))?;
    let listing_url = listing_url.as_str().to_string();

    tracing::info!("POST /properties/extract - url: {}", listing_url);

    let cache_key = format!("listing:{}", listing_url);

    // Check cache first with validation
    let mut extracted: Option<(String, serde_json::Value)> = None;
    if let Some(cached) = state.extraction_cache.get(&cache_key).await {
        if let Some(valid_data) = ValidatedCacheEntry::deserialize_and_validate(&cached) {
            if let Ok(wrapper) = serde_json::from_str::<serde_json::Value>(&valid_data) {
                let source = wrapper
                    .get("source")
                    .and_then(|v| v.as_str())
                    .unwrap_or("apify")
                    .to_string();
                if let Some(item) = wrapper.get("item") {
                    tracing::debug!("Extraction cache HIT (validated) for: {}", listing_url);
                    extracted = Some((source, item.clone()));
                }
            }
        } else {
            tracing::warn!(
                "Cache validation failed for {}, refetching from source",
                listing_url
            );
        }
    }

    let (source, item) = match extracted {
        Some(hit) => hit,
        None => {
            tracing::info!("Extraction cache MISS for: {}", listing_url);

            let scraper = ListingScraperService::new(&state.config);
            let fresh = if scraper.is_configured() {
                match scraper.extract_listing(&listing_url).await {
                    Ok(item) => ("apify".to_string(), item),
                    Err(e) => {
                        tracing::warn!(
                            "Scraping actor failed ({}), falling back to LLM extraction",
                            e
                        );
                        let fallback = LlmExtractionService::new(state.openai.clone());
                        (
                            "llm_fallback".to_string(),
                            fallback.extract_listing(&listing_url).await?,
                        )
                    }
                }
            } else {
                let fallback = LlmExtractionService::new(state.openai.clone());
                (
                    "llm_fallback".to_string(),
                    fallback.extract_listing(&listing_url).await?,
                )
            };

            // Cache successful extraction with checksum validation
            let wrapper = json!({ "source": &fresh.0, "item": &fresh.1 });
            if let Ok(json_str) = serde_json::to_string(&wrapper) {
                let validated_entry = ValidatedCacheEntry::new(json_str);
                state
                    .extraction_cache
                    .insert(cache_key, validated_entry.serialize())
                    .await;
            }

            fresh
        }
    };

    let storage = TenantStorage::new(state.db.clone());
    let property = storage
        .store_extracted_listing(&listing_url, &source, &item)
        .await?;

    Ok(Json(ExtractPropertyResponse {
        success: true,
        property,
    }))
}

/// GET /api/v1/properties
///
/// Lists stored listings, newest first.
pub async fn list_properties(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<PropertyListing>>, AppError> {
    let storage = TenantStorage::new(state.db.clone());
    let listings = storage.list_properties().await?;

    Ok(Json(listings))
}

/// DELETE /api/v1/properties/:id
///
/// Deletes one stored listing.
pub async fn delete_property(
    State(state): State<Arc<AppState>>,
    Path(property_id): Path<Uuid>,
) -> Result<Json<SimpleResponse>, AppError> {
    tracing::info!("DELETE /properties/{}", property_id);

    let storage = TenantStorage::new(state.db.clone());
    storage.delete_property(property_id).await?;

    Ok(Json(SimpleResponse { success: true }))
}

/// DELETE /api/v1/properties
///
/// Purges all stored listings.
pub async fn delete_all_properties(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SimpleResponse>, AppError> {
    tracing::info!("DELETE /properties");

    let storage = TenantStorage::new(state.db.clone());
    storage.delete_all_properties().await?;

    Ok(Json(SimpleResponse { success: true }))
}
