use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub analytics: AnalyticsConfig,
    pub humanize: HumanizeConfig,
    pub metrics: MetricsConfig,
    /// Known callers for optional identity resolution. A request that
    /// presents none of these tokens is still served, as anonymous.
    #[serde(default)]
    pub users: Vec<UserConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelConfig {
    pub api_key: String,
    pub base_url: String,
    /// Model name, part of the URL path (e.g. "gemini-2.0-flash")
    pub model: String,
    pub timeout_seconds: u64,
    pub max_output_tokens: u32,
    /// Default delivery mode when the request does not specify one
    #[serde(default)]
    pub stream_by_default: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalyticsConfig {
    /// Kill-switch: when false, no log entries are recorded and no
    /// payloads are delivered.
    pub enabled: bool,
    /// Collector base URL; an empty string disables delivery.
    #[serde(default)]
    pub base_url: String,
    /// Product tag, appended to the ingest path.
    pub product: String,
}

/// How the "humanize" tone answers: five discrete options parsed out of
/// the model's JSON, or a single rewrite constrained to the input length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HumanizeMode {
    Options,
    Rewrite,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HumanizeConfig {
    pub response_mode: HumanizeMode,
    /// Allowed word-count drift of a rewrite relative to the input.
    pub word_tolerance: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub endpoint: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserConfig {
    pub token: String,
    pub id: String,
    pub email: String,
    pub name: String,
}

pub fn load_config(path: &std::path::Path) -> anyhow::Result<Config> {
    let config = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(config::Environment::with_prefix("PARAPHRASE_GATEWAY").separator("__"))
        .build()?;

    let cfg: Config = config.try_deserialize()?;
    validate_config(&cfg)?;

    Ok(cfg)
}

fn validate_config(cfg: &Config) -> anyhow::Result<()> {
    if cfg.model.api_key.is_empty() {
        anyhow::bail!("Model API key must be configured");
    }

    if cfg.model.base_url.is_empty() {
        anyhow::bail!("Model base URL must be configured");
    }

    if cfg.model.model.is_empty() {
        anyhow::bail!("Model name must be configured");
    }

    if cfg.analytics.enabled && cfg.analytics.product.is_empty() {
        anyhow::bail!("Analytics product tag must be configured when analytics is enabled");
    }

    for user in &cfg.users {
        if user.token.is_empty() {
            anyhow::bail!("User token cannot be empty");
        }
        if user.id.is_empty() {
            anyhow::bail!("User id cannot be empty");
        }
    }

    Ok(())
}
