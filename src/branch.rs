//! Branch records built from the feed's schema-free XML.
//!
//! A branch starts from the summary fragment found in the branch list. It can
//! then be enriched with the full branch document and asked for its listings.
//! Every field the feed sends stays readable through [`BranchRecord::get`],
//! whether it arrived with the summary or with enrichment.

use crate::api_client::ApiClient;
use crate::attributes::{Address, Attributes};
use crate::errors::ApiError;
use crate::property::{BranchRef, PropertyRecord};
use crate::xml;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

pub struct BranchRecord {
    attributes: Attributes,
    client: Arc<dyn ApiClient>,
}

impl BranchRecord {
    /// Builds a branch from an already-parsed summary element. No network call.
    pub fn new(element: Map<String, Value>, client: Arc<dyn ApiClient>) -> Self {
        Self {
            attributes: Attributes::new(element),
            client,
        }
    }

    /// Builds a branch from a raw XML fragment such as
    /// `<branch><id>42</id><name>Downtown</name></branch>`.
    pub fn from_xml(fragment: &str, client: Arc<dyn ApiClient>) -> Result<Self, ApiError> {
        Ok(Self::new(xml::parse_fragment(fragment)?, client))
    }

    /// Live value for `key`; `None` when the feed never sent it.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.attributes.has(key)
    }

    pub fn text(&self, key: &str) -> Option<String> {
        self.attributes.text(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys()
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn client(&self) -> &Arc<dyn ApiClient> {
        &self.client
    }

    /// Branch identifier: `id`, falling back to the feed's `branchid`.
    pub fn id(&self) -> Option<String> {
        self.text("id").or_else(|| self.text("branchid"))
    }

    pub fn name(&self) -> Option<String> {
        self.text("name")
    }

    /// Consolidated address. Only present once the branch has been enriched.
    pub fn address(&self) -> Option<Address> {
        self.get("address").and_then(Address::from_value)
    }

    /// Path the feed serves this branch at: its own `url` when the summary
    /// carried one, otherwise `branches/{id}`.
    pub fn resource_path(&self) -> Result<String, ApiError> {
        if let Some(url) = self.text("url").filter(|u| !u.trim().is_empty()) {
            return Ok(url.trim().trim_end_matches('/').to_string());
        }
        let id = self.id().ok_or(ApiError::MissingIdentifier)?;
        Ok(format!("branches/{}", id))
    }

    /// Fetches the full branch document and merges it into this record.
    ///
    /// Incoming keys replace existing ones, everything else is kept, and the
    /// location fields are then folded into `address`.
    ///
    /// # Errors
    ///
    /// * `ApiError::MissingIdentifier` - no `url`/`id`/`branchid`, nothing was sent.
    /// * `ApiError::Transport` - the call failed; attributes are unchanged.
    /// * `ApiError::Parse` - the body held no `<branch>`; attributes are unchanged.
    pub async fn enrich(&mut self) -> Result<(), ApiError> {
        let path = self.resource_path()?;
        let doc = self.client.call(&path).await?;

        let elements = doc.select("branch")?;
        if elements.is_empty() {
            return Err(ApiError::Parse(format!(
                "Response for {} contains no <branch> element",
                path
            )));
        }

        let mut incoming = Map::new();
        for element in elements {
            incoming.extend(element);
        }
        tracing::debug!("Merging {} attribute(s) into {}", incoming.len(), path);

        self.attributes = self.attributes.enriched(incoming);
        Ok(())
    }

    /// Fetches this branch's listings, one record per `<property>` in document order.
    pub async fn fetch_properties(&self) -> Result<Vec<PropertyRecord>, ApiError> {
        let branch = self.branch_ref()?;
        let path = format!("{}/property", branch.path());
        let doc = self.client.call(&path).await?;

        let properties: Vec<PropertyRecord> = doc
            .select("properties property")?
            .into_iter()
            .map(|element| PropertyRecord::new(element, branch.clone()))
            .collect();

        tracing::debug!("Branch {} lists {} properties", branch.id(), properties.len());
        Ok(properties)
    }

    fn branch_ref(&self) -> Result<BranchRef, ApiError> {
        let path = self.resource_path()?;
        Ok(BranchRef::new(
            Arc::clone(&self.client),
            path,
            self.id().unwrap_or_default(),
        ))
    }
}

impl fmt::Debug for BranchRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BranchRecord")
            .field("attributes", &self.attributes)
            .finish_non_exhaustive()
    }
}

/// Lists every branch on the feed, one record per `<branch>` under `<branches>`.
pub async fn fetch_branches(client: Arc<dyn ApiClient>) -> Result<Vec<BranchRecord>, ApiError> {
    let doc = client.call("branch").await?;
    let branches: Vec<BranchRecord> = doc
        .select("branches branch")?
        .into_iter()
        .map(|element| BranchRecord::new(element, Arc::clone(&client)))
        .collect();

    tracing::info!("Feed lists {} branches", branches.len());
    Ok(branches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::ParsedDocument;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct StubClient {
        bodies: HashMap<String, String>,
        calls: Mutex<Vec<String>>,
    }

    impl StubClient {
        fn with(mut self, path: &str, body: &str) -> Self {
            self.bodies.insert(path.to_string(), body.to_string());
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ApiClient for StubClient {
        async fn call(&self, resource_path: &str) -> Result<ParsedDocument, ApiError> {
            self.calls.lock().unwrap().push(resource_path.to_string());
            match self.bodies.get(resource_path) {
                Some(body) => ParsedDocument::parse(body.clone()),
                None => Err(ApiError::Transport(format!("404 for {}", resource_path))),
            }
        }
    }

    const SUMMARY: &str = "<branch><id>42</id><name>Downtown</name></branch>";

    #[test]
    fn test_construct_exposes_every_key() {
        let stub = Arc::new(StubClient::default());
        let branch = BranchRecord::from_xml(SUMMARY, stub.clone()).unwrap();

        assert_eq!(branch.id().as_deref(), Some("42"));
        assert_eq!(branch.name().as_deref(), Some("Downtown"));
        assert_eq!(branch.keys().collect::<Vec<_>>(), vec!["id", "name"]);
        assert!(stub.calls().is_empty());
    }

    #[test]
    fn test_unknown_key_is_absent_not_error() {
        let branch = BranchRecord::from_xml(SUMMARY, Arc::new(StubClient::default())).unwrap();
        assert!(branch.get("fax").is_none());
        assert!(!branch.has("fax"));
        assert!(branch.address().is_none());
    }

    #[test]
    fn test_branchid_fallback() {
        let branch = BranchRecord::from_xml(
            "<branch><branchid>7</branchid></branch>",
            Arc::new(StubClient::default()),
        )
        .unwrap();
        assert_eq!(branch.resource_path().unwrap(), "branches/7");
    }

    #[tokio::test]
    async fn test_feed_url_drives_both_calls() {
        let url = "http://webservices.vebra.com/export/acme/v10/branch/12345";
        let stub = Arc::new(
            StubClient::default()
                .with(url, "<branch><town>Leeds</town></branch>")
                .with(
                    &format!("{}/property", url),
                    "<properties><property><propid>5</propid></property></properties>",
                ),
        );
        let summary = format!(
            "<branch><branchid>1</branchid><url>{}</url></branch>",
            url
        );
        let mut branch = BranchRecord::from_xml(&summary, stub.clone()).unwrap();

        branch.enrich().await.unwrap();
        let properties = branch.fetch_properties().await.unwrap();

        assert_eq!(stub.calls(), vec![url.to_string(), format!("{}/property", url)]);
        assert_eq!(branch.address().unwrap().town.as_deref(), Some("Leeds"));
        assert_eq!(properties[0].branch().path(), url);
        assert_eq!(properties[0].branch().id(), "1");
        assert_eq!(
            properties[0].resource_path().unwrap(),
            format!("{}/property/5", url)
        );
    }

    #[tokio::test]
    async fn test_enrich_merges_and_consolidates() {
        let stub = Arc::new(StubClient::default().with(
            "branches/42",
            "<branch><street>Main St</street><town>Springfield</town>\
             <postcode>00000</postcode><email>dt@example.com</email></branch>",
        ));
        let mut branch = BranchRecord::from_xml(SUMMARY, stub.clone()).unwrap();

        branch.enrich().await.unwrap();

        assert_eq!(stub.calls(), vec!["branches/42"]);
        assert_eq!(branch.name().as_deref(), Some("Downtown"));
        assert_eq!(branch.text("email").as_deref(), Some("dt@example.com"));
        assert_eq!(
            branch.get("address"),
            Some(&json!({
                "street": "Main St",
                "town": "Springfield",
                "county": null,
                "postcode": "00000"
            }))
        );
        assert!(branch.get("street").is_none());
    }

    #[tokio::test]
    async fn test_enrich_transport_error_leaves_attributes() {
        let mut branch =
            BranchRecord::from_xml(SUMMARY, Arc::new(StubClient::default())).unwrap();
        let before = branch.attributes().clone();

        let result = branch.enrich().await;

        assert!(matches!(result, Err(ApiError::Transport(_))));
        assert_eq!(branch.attributes(), &before);
    }

    #[tokio::test]
    async fn test_enrich_without_branch_element_is_parse_error() {
        let stub = Arc::new(StubClient::default().with("branches/42", "<error>gone</error>"));
        let mut branch = BranchRecord::from_xml(SUMMARY, stub).unwrap();

        assert!(matches!(branch.enrich().await, Err(ApiError::Parse(_))));
        assert!(branch.get("address").is_none());
    }

    #[tokio::test]
    async fn test_missing_identifier_makes_no_call() {
        let stub = Arc::new(StubClient::default());
        let mut branch =
            BranchRecord::from_xml("<branch><name>Nowhere</name></branch>", stub.clone()).unwrap();

        assert_eq!(branch.enrich().await, Err(ApiError::MissingIdentifier));
        assert!(matches!(
            branch.fetch_properties().await,
            Err(ApiError::MissingIdentifier)
        ));
        assert!(stub.calls().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_properties_keeps_document_order() {
        let stub = Arc::new(StubClient::default().with(
            "branches/42/property",
            "<properties><property><propid>3</propid></property>\
             <property><propid>1</propid></property>\
             <property><propid>2</propid></property></properties>",
        ));
        let branch = BranchRecord::from_xml(SUMMARY, stub).unwrap();

        let properties = branch.fetch_properties().await.unwrap();

        let ids: Vec<String> = properties.iter().filter_map(|p| p.id()).collect();
        assert_eq!(ids, vec!["3", "1", "2"]);
        assert!(properties.iter().all(|p| p.branch().path() == "branches/42"));
        assert_eq!(properties[0].resource_path().unwrap(), "branches/42/property/3");
    }

    #[tokio::test]
    async fn test_fetch_properties_empty_listing() {
        let stub = Arc::new(StubClient::default().with("branches/42/property", "<properties/>"));
        let branch = BranchRecord::from_xml(SUMMARY, stub).unwrap();

        assert!(branch.fetch_properties().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_branches() {
        let stub: Arc<dyn ApiClient> = Arc::new(StubClient::default().with(
            "branch",
            "<branches><branch><branchid>1</branchid><name>North</name></branch>\
             <branch><branchid>2</branchid><name>South</name></branch></branches>",
        ));

        let branches = fetch_branches(stub).await.unwrap();

        let names: Vec<String> = branches.iter().filter_map(|b| b.name()).collect();
        assert_eq!(names, vec!["North", "South"]);
    }
}
