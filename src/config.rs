use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Chat-completion credential. Optional at startup; its absence is
    /// reported as a misconfiguration when scoring is actually invoked.
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    /// Scraping actor credential. Optional; listing extraction falls back to
    /// the LLM extractor when unset.
    pub apify_token: Option<String>,
    pub apify_base_url: String,
    pub apify_actor_id: String,
    /// Interview scheduling webhook. Optional; the scheduling-link operation
    /// only flips the stored flags when unset.
    pub scheduling_webhook_url: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            database_url: std::env::var("DATABASE_URL")
                .or_else(|_| std::env::var("DB_URL"))
                .map_err(|_| {
                    anyhow::anyhow!("DATABASE_URL or DB_URL environment variable required")
                })
                .and_then(|url| {
                    if url.trim().is_empty() {
                        anyhow::bail!("DATABASE_URL cannot be empty");
                    }
                    if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
                        anyhow::bail!("DATABASE_URL must start with postgresql:// or postgres://");
                    }
                    Ok(url)
                })?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            openai_api_key: std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            openai_base_url: std::env::var("OPENAI_BASE_URL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(|url| {
                    if !url.starts_with("http://") && !url.starts_with("https://") {
                        anyhow::bail!("OPENAI_BASE_URL must start with http:// or https://");
                    }
                    Ok(url.trim_end_matches('/').to_string())
                })
                .transpose()?
                .unwrap_or_else(|| "https://api.openai.com".to_string()),
            openai_model: std::env::var("OPENAI_MODEL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "gpt-3.5-turbo".to_string()),
            apify_token: std::env::var("APIFY_API_TOKEN")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            apify_base_url: std::env::var("APIFY_BASE_URL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(|url| {
                    if !url.starts_with("http://") && !url.starts_with("https://") {
                        anyhow::bail!("APIFY_BASE_URL must start with http:// or https://");
                    }
                    Ok(url.trim_end_matches('/').to_string())
                })
                .transpose()?
                .unwrap_or_else(|| "https://api.apify.com".to_string()),
            apify_actor_id: std::env::var("APIFY_ACTOR_ID")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "fidBLTpxnz3Owo6Zm".to_string()),
            scheduling_webhook_url: std::env::var("SCHEDULING_WEBHOOK_URL")
                .ok()
                .filter(|s| !s.trim().is_empty()),
        };

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!(
            "Database URL: {}...",
            &config.database_url[..20.min(config.database_url.len())]
        );
        tracing::debug!("Model endpoint: {}", config.openai_base_url);
        tracing::debug!("Scoring model: {}", config.openai_model);
        if config.openai_api_key.is_none() {
            tracing::warn!("OPENAI_API_KEY not set - scoring requests will fail until configured");
        }
        if config.apify_token.is_none() {
            tracing::info!("APIFY_API_TOKEN not set - listing extraction will use the LLM fallback");
        }
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}
