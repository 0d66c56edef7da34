use crate::config::Config;
use crate::errors::ApiError;
use crate::xml::ParsedDocument;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Performs one authenticated GET for a resource path and returns the parsed body.
///
/// Authentication, base URL resolution and any transport policy belong to the
/// implementation; records only ever hand it a path.
#[async_trait]
pub trait ApiClient: Send + Sync {
    async fn call(&self, resource_path: &str) -> Result<ParsedDocument, ApiError>;
}

/// HTTP client for the Vebra export feed.
#[derive(Clone)]
pub struct VebraClient {
    client: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
    token: Arc<RwLock<Option<String>>>,
}

impl VebraClient {
    /// Creates a new `VebraClient`.
    ///
    /// # Arguments
    ///
    /// * `config` - Feed location, credentials and request timeout.
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to create Vebra client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url(),
            username: config.username.clone(),
            password: config.password.clone(),
            token: Arc::new(RwLock::new(None)),
        })
    }

    /// Absolute URL for a resource path. Absolute `http(s)://` paths pass through.
    pub fn resource_url(&self, resource_path: &str) -> String {
        if resource_path.starts_with("http://") || resource_path.starts_with("https://") {
            return resource_path.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            resource_path.trim_start_matches('/')
        )
    }

    /// Session token handed out by the feed, if one has been received.
    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }
}

#[async_trait]
impl ApiClient for VebraClient {
    async fn call(&self, resource_path: &str) -> Result<ParsedDocument, ApiError> {
        let url = self.resource_url(resource_path);
        tracing::info!("Fetching {} from Vebra", url);

        let token = self.token().await;
        let request = self.client.get(&url);
        let request = match token.as_deref() {
            Some(token) => request.header(
                reqwest::header::AUTHORIZATION,
                format!("Basic {}", STANDARD.encode(token)),
            ),
            None => request.basic_auth(&self.username, Some(&self.password)),
        };

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Transport(format!("Vebra request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED && token.is_some() {
            // Expired session; the next call authenticates with credentials again
            *self.token.write().await = None;
        }

        if let Some(issued) = response
            .headers()
            .get("Token")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
        {
            tracing::debug!("Received new Vebra session token");
            *self.token.write().await = Some(issued.to_string());
        }

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!("Vebra returned {} for {}", status, url);
            return Err(ApiError::Transport(format!(
                "Vebra returned {}: {}",
                status, error_text
            )));
        }

        let body = response.text().await.map_err(|e| {
            ApiError::Transport(format!("Failed to read Vebra response: {}", e))
        })?;

        ParsedDocument::parse(body)
    }
}
