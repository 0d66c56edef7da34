use async_trait::async_trait;
use rust_vebra_api::api_client::ApiClient;
use rust_vebra_api::errors::ApiError;
use rust_vebra_api::xml::ParsedDocument;
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory feed: canned bodies per resource path, everything else is a transport failure.
#[derive(Default)]
pub struct FakeFeed {
    bodies: HashMap<String, String>,
    calls: Mutex<Vec<String>>,
}

impl FakeFeed {
    pub fn with(mut self, path: &str, body: &str) -> Self {
        self.bodies.insert(path.to_string(), body.to_string());
        self
    }

    #[allow(dead_code)]
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ApiClient for FakeFeed {
    async fn call(&self, resource_path: &str) -> Result<ParsedDocument, ApiError> {
        self.calls.lock().unwrap().push(resource_path.to_string());
        match self.bodies.get(resource_path) {
            Some(body) => ParsedDocument::parse(body.clone()),
            None => Err(ApiError::Transport(format!(
                "Vebra returned 404 Not Found: {}",
                resource_path
            ))),
        }
    }
}

/// Renders `<branch>` with one child element per pair.
#[allow(dead_code)]
pub fn branch_xml(fields: &[(String, String)]) -> String {
    let body: String = fields
        .iter()
        .map(|(k, v)| format!("<{k}>{v}</{k}>"))
        .collect();
    format!("<branch>{}</branch>", body)
}
