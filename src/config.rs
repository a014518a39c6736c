use serde::Deserialize;

pub const DEFAULT_MIXRANK_API_URL: &str = "https://api.mixrank.com";
pub const DEFAULT_PERPLEXITY_API_URL: &str = "https://api.perplexity.ai";
pub const DEFAULT_PERPLEXITY_MODEL: &str = "sonar-pro";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub mixrank_api_url: String,
    pub mixrank_api_key: String,
    pub perplexity_api_url: String,
    pub perplexity_api_key: String,
    pub perplexity_model: String,
    /// TTL of the in-process enrichment cache that sits in front of Postgres.
    pub enrichment_cache_ttl_secs: u64,
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
                .and_then(validate_database_url)?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            mixrank_api_url: validate_http_url(
                "MIXRANK_API_URL",
                std::env::var("MIXRANK_API_URL")
                    .ok()
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_MIXRANK_API_URL.to_string()),
            )?,
            mixrank_api_key: required("MIXRANK_API_KEY")?,
            perplexity_api_url: validate_http_url(
                "PERPLEXITY_API_URL",
                std::env::var("PERPLEXITY_API_URL")
                    .ok()
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_PERPLEXITY_API_URL.to_string()),
            )?,
            perplexity_api_key: required("PERPLEXITY_API_KEY")?,
            perplexity_model: std::env::var("PERPLEXITY_MODEL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_PERPLEXITY_MODEL.to_string()),
            enrichment_cache_ttl_secs: std::env::var("ENRICHMENT_CACHE_TTL_SECS")
                .unwrap_or_else(|_| "3600".to_string())
                .parse()
                .map_err(|_| {
                    anyhow::anyhow!("ENRICHMENT_CACHE_TTL_SECS must be a number of seconds")
                })?,
        };

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!(
            "Database URL: {}...",
            config.database_url.chars().take(20).collect::<String>()
        );
        tracing::debug!("Mixrank API URL: {}", config.mixrank_api_url);
        tracing::debug!(
            "Perplexity API URL: {} (model {})",
            config.perplexity_api_url,
            config.perplexity_model
        );
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}

fn required(name: &str) -> anyhow::Result<String> {
    let value = std::env::var(name)
        .map_err(|_| anyhow::anyhow!("{} environment variable required", name))?;
    if value.trim().is_empty() {
        anyhow::bail!("{} cannot be empty", name);
    }
    Ok(value)
}

fn validate_database_url(url: String) -> anyhow::Result<String> {
    if url.trim().is_empty() {
        anyhow::bail!("DATABASE_URL cannot be empty");
    }
    if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
        anyhow::bail!("DATABASE_URL must start with postgresql:// or postgres://");
    }
    Ok(url)
}

fn validate_http_url(name: &str, url: String) -> anyhow::Result<String> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        anyhow::bail!("{} must start with http:// or https://", name);
    }
    Ok(url.trim_end_matches('/').to_string())
}
