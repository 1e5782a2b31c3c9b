use crate::config::Config;
use crate::errors::AppError;
use crate::scoring::ScoringModel;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// Sampling temperature for scoring calls. Kept low so responses stay short
/// and close to the requested format.
const SCORING_TEMPERATURE: f64 = 0.2;
/// Output cap for scoring calls; the expected response fits well under this.
const SCORING_MAX_TOKENS: u32 = 200;

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// Client for the external chat-completion endpoint.
///
/// The credential is optional at construction time: its absence is reported
/// as a misconfiguration when a call is attempted, before any network I/O.
/// Failed calls are terminal for the invocation - no retries.
#[derive(Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiClient {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                AppError::ExternalApiError(format!("Failed to create model client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: config.openai_base_url.clone(),
            api_key: config.openai_api_key.clone(),
            model: config.openai_model.clone(),
        })
    }

    /// Sends one chat completion request and returns the trimmed text of the
    /// first choice.
    pub async fn complete(&self, system: &str, user: &str) -> Result<String, AppError> {
        // Credential check comes before any network activity
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            AppError::Misconfigured("Missing OPENAI_API_KEY for scoring".to_string())
        })?;

        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
            "max_tokens": SCORING_MAX_TOKENS,
            "temperature": SCORING_TEMPERATURE,
        });

        tracing::info!("Requesting chat completion from {}", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                AppError::ExternalApiError(format!("Model request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!("Model endpoint returned error {}: {}", status, error_text);
            return Err(AppError::ExternalApiError(format!(
                "Model endpoint returned status {}: {}",
                status, error_text
            )));
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse model response: {}", e))
        })?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default()
            .trim()
            .to_string();

        tracing::debug!("Model returned {} characters", content.len());
        Ok(content)
    }
}

#[async_trait]
impl ScoringModel for OpenAiClient {
    async fn chat_completion(&self, system: &str, user: &str) -> Result<String, AppError> {
        self.complete(system, user).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn test_config(api_key: Option<String>) -> Config {
        Config {
            database_url: "postgresql://test".to_string(),
            port: 3000,
            openai_api_key: api_key,
            openai_base_url: "https://api.openai.com".to_string(),
            openai_model: "gpt-3.5-turbo".to_string(),
            apify_token: None,
            apify_base_url: "https://api.apify.com".to_string(),
            apify_actor_id: "actor".to_string(),
            scheduling_webhook_url: None,
        }
    }

    #[tokio::test]
    async fn test_client_creation() {
        let client = OpenAiClient::new(&test_config(Some("sk-test".to_string())));
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_missing_credential_is_misconfiguration() {
        let client = OpenAiClient::new(&test_config(None)).unwrap();
        let result = client.complete("system", "user").await;
        assert!(matches!(result, Err(AppError::Misconfigured(_))));
    }
}
