use crate::config::Config;
use crate::errors::AppError;
use crate::openai_client::OpenAiClient;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

/// Client for the classifieds scraping actor.
///
/// The actor is a black box: it receives a listing URL and returns dataset
/// items as JSON. Only the first item is used.
pub struct ListingScraperService {
    client: Client,
    base_url: String,
    token: Option<String>,
    actor_id: String,
}

impl ListingScraperService {
    pub fn new(config: &Config) -> Self {
        Self {
            // Actor runs are synchronous on the remote side and can take a
            // while; the timeout reflects that.
            client: Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .unwrap_or_default(),
            base_url: config.apify_base_url.clone(),
            token: config.apify_token.clone(),
            actor_id: config.apify_actor_id.clone(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.token.is_some()
    }

    /// Runs the actor against one listing URL and returns the first dataset
    /// item.
    pub async fn extract_listing(&self, listing_url: &str) -> Result<Value, AppError> {
        let token = self.token.as_ref().ok_or_else(|| {
            AppError::Misconfigured("Missing APIFY_API_TOKEN for listing extraction".to_string())
        })?;

        // Build URL with proper parameter encoding
        let url = reqwest::Url::parse_with_params(
            &format!(
                "{}/v2/acts/{}/run-sync-get-dataset-items",
                self.base_url, self.actor_id
            ),
            &[("token", token.as_str()), ("format", "json")],
        )
        .map_err(|e| AppError::ExternalApiError(format!("Failed to build actor URL: {}", e)))?;

        let input = json!({
            "products_url": listing_url,
            "feature": "product_details",
            "phone_min_delay": 10,
            "list_cookies": [],
            "proxyConfiguration": {
                "useApifyProxy": true,
                "apifyProxyGroups": ["RESIDENTIAL"],
                "apifyProxyCountry": "FR",
            },
        });

        tracing::info!("Running scraping actor for listing: {}", listing_url);
        // Redact token from logs
        tracing::debug!(
            "Actor URL: {}/v2/acts/{}/run-sync-get-dataset-items?token=[REDACTED]",
            self.base_url,
            self.actor_id
        );

        let response = self
            .client
            .post(url)
            .json(&input)
            .send()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("Actor request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!("Scraping actor returned error {}: {}", status, error_text);
            return Err(AppError::ExternalApiError(format!(
                "Scraping actor returned status {}: {}",
                status, error_text
            )));
        }

        let items: Vec<Value> = response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse actor response: {}", e))
        })?;

        tracing::info!("Actor returned {} dataset item(s)", items.len());

        items
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound("No data extracted from listing".to_string()))
    }
}

/// LLM fallback for listing extraction.
///
/// When the scraping actor is unavailable, the chat model is asked to
/// describe the listing as a single JSON object, which is relayed as-is.
/// No schema is enforced beyond being JSON: if the model's text does not
/// parse, it is wrapped into a minimal object so the caller still gets a
/// record to store.
pub struct LlmExtractionService {
    llm: OpenAiClient,
}

impl LlmExtractionService {
    pub fn new(llm: OpenAiClient) -> Self {
        Self { llm }
    }

    pub async fn extract_listing(&self, listing_url: &str) -> Result<Value, AppError> {
        let prompt = format!(
            "Find the rental listing published at {} and return its details as a single JSON \
             object with these keys where known: subject, body, category_name, ad_type, price, \
             city, zipcode, region_name, nb_images, attributes. Respond with JSON only, no \
             commentary.",
            listing_url
        );

        tracing::info!("LLM extraction fallback for listing: {}", listing_url);

        let raw = self
            .llm
            .complete(
                "You extract real-estate listing data from the web and answer in strict JSON.",
                &prompt,
            )
            .await?;

        let text = strip_json_fences(&raw);
        match serde_json::from_str::<Value>(text) {
            Ok(item) => Ok(item),
            Err(e) => {
                tracing::warn!("LLM extraction returned non-JSON text: {}", e);
                Ok(json!({
                    "subject": null,
                    "body": raw,
                    "url": listing_url,
                }))
            }
        }
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from model output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

/// Client for the interview scheduling webhook.
///
/// The webhook is a bare HTTP GET side effect. Delivery is best-effort:
/// failures are logged and reported back as `false`, never as an error,
/// and an unset URL skips the call entirely.
pub struct SchedulingService {
    client: Client,
    webhook_url: Option<String>,
}

impl SchedulingService {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            webhook_url: config.scheduling_webhook_url.clone(),
        }
    }

    /// Fires the scheduling webhook for one tenant. Returns whether the GET
    /// was delivered.
    pub async fn notify(&self, tenant_id: &str, email: &str) -> bool {
        let Some(ref webhook_url) = self.webhook_url else {
            tracing::debug!("No scheduling webhook configured, skipping GET");
            return false;
        };

        let url = match reqwest::Url::parse_with_params(
            webhook_url,
            &[("tenant_id", tenant_id), ("email", email)],
        ) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Invalid scheduling webhook URL: {}", e);
                return false;
            }
        };

        tracing::info!("Sending scheduling link webhook for tenant: {}", tenant_id);

        match self.client.get(url).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::info!("Scheduling webhook delivered for tenant {}", tenant_id);
                true
            }
            Ok(response) => {
                tracing::warn!(
                    "Scheduling webhook returned status {} for tenant {}",
                    response.status(),
                    tenant_id
                );
                false
            }
            Err(e) => {
                tracing::warn!("Scheduling webhook request failed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"subject\": \"T2 Paris\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"subject\": \"T2 Paris\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"subject\": \"T2 Paris\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"subject\": \"T2 Paris\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"subject\": \"T2 Paris\"}";
        assert_eq!(strip_json_fences(input), "{\"subject\": \"T2 Paris\"}");
    }
}
