use serde::Deserialize;

/// Configuration for the email-verification stage.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifierConfig {
    pub port: u16,
    pub pubsub_base_url: String,
    pub project: String,
    pub next_topic: String,
    pub error_topic: String,
    pub validation_url: String,
    pub validation_key: String,
}

/// Configuration for the CRM-trigger stage.
#[derive(Debug, Clone, Deserialize)]
pub struct CrmConfig {
    pub port: u16,
    pub contact_store_url: String,
    pub campaign_base_url: String,
    pub campaign_token: String,
    pub campaign_id: String,
}

impl VerifierConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            port: port_from_env()?,
            pubsub_base_url: required_url("PUBSUB_BASE_URL")?,
            project: required("PUBSUB_PROJECT")?,
            next_topic: required("PUBSUB_TOPIC_NEXT")?,
            error_topic: required("PUBSUB_TOPIC_ERROR")?,
            validation_url: required_url("EMAIL_VALIDATION_URL")?,
            validation_key: required("EMAIL_VALIDATION_KEY")?,
        };

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Pub/Sub base URL: {}", config.pubsub_base_url);
        tracing::debug!(
            "Topics: next={} error={}",
            config.next_topic,
            config.error_topic
        );
        tracing::debug!("Validation URL: {}", config.validation_url);
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}

impl CrmConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            port: port_from_env()?,
            contact_store_url: required_url("CONTACT_STORE_URL")?,
            campaign_base_url: required_url("CAMPAIGN_BASE_URL")?,
            campaign_token: required("CAMPAIGN_API_TOKEN")?,
            campaign_id: required("CAMPAIGN_ID")?,
        };

        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Contact store URL: {}", config.contact_store_url);
        tracing::debug!(
            "Campaign: {} (id {})",
            config.campaign_base_url,
            config.campaign_id
        );
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}

/// Read a required environment variable, rejecting empty values.
fn required(name: &str) -> anyhow::Result<String> {
    std::env::var(name)
        .map_err(|_| anyhow::anyhow!("{} environment variable required", name))
        .and_then(|value| {
            if value.trim().is_empty() {
                anyhow::bail!("{} cannot be empty", name);
            }
            Ok(value)
        })
}

/// Read a required environment variable that must be an http(s) URL.
fn required_url(name: &str) -> anyhow::Result<String> {
    required(name).and_then(|url| {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            anyhow::bail!("{} must start with http:// or https://", name);
        }
        Ok(url)
    })
}

fn port_from_env() -> anyhow::Result<u16> {
    std::env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))
}
