use serde::Deserialize;

const DEFAULT_API_ROOT: &str = "http://webservices.vebra.com/export";
const DEFAULT_API_VERSION: &str = "v10";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api_root: String,
    pub data_feed_id: String,
    pub username: String,
    pub password: String,
    pub api_version: String,
    pub timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            api_root: std::env::var("VEBRA_API_ROOT")
                .unwrap_or_else(|_| DEFAULT_API_ROOT.to_string())
                .trim_end_matches('/')
                .to_string(),
            data_feed_id: required("VEBRA_DATA_FEED_ID")?,
            username: required("VEBRA_USERNAME")?,
            password: required("VEBRA_PASSWORD")?,
            api_version: std::env::var("VEBRA_API_VERSION")
                .unwrap_or_else(|_| DEFAULT_API_VERSION.to_string()),
            timeout_secs: std::env::var("VEBRA_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("VEBRA_TIMEOUT_SECS must be a positive number"))?,
        };
        config.validate()?;

        // Never log credentials
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Vebra base URL: {}", config.base_url());
        tracing::debug!("Request timeout: {}s", config.timeout_secs);

        Ok(config)
    }

    /// Checks the invariants `from_env` enforces, for configs built by hand.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.api_root.starts_with("http://") && !self.api_root.starts_with("https://") {
            anyhow::bail!("VEBRA_API_ROOT must start with http:// or https://");
        }
        if self.api_version.trim().is_empty() {
            anyhow::bail!("VEBRA_API_VERSION cannot be empty");
        }
        if self.timeout_secs == 0 {
            anyhow::bail!("VEBRA_TIMEOUT_SECS must be a positive number");
        }
        Ok(())
    }

    /// Root every resource path is joined onto, e.g. `http://host/export/1234/v10`.
    pub fn base_url(&self) -> String {
        format!(
            "{}/{}/{}",
            self.api_root.trim_end_matches('/'),
            self.data_feed_id,
            self.api_version
        )
    }
}

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
