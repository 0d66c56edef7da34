use crate::api_client::ApiClient;
use crate::attributes::Attributes;
use crate::errors::ApiError;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// What a property needs to know about the branch that listed it.
#[derive(Clone)]
pub struct BranchRef {
    client: Arc<dyn ApiClient>,
    path: String,
    id: String,
}

impl BranchRef {
    pub fn new(client: Arc<dyn ApiClient>, path: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            client,
            path: path.into(),
            id: id.into(),
        }
    }

    pub fn client(&self) -> &Arc<dyn ApiClient> {
        &self.client
    }

    /// Resource path of the owning branch, e.g. `branches/42`.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Debug for BranchRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BranchRef")
            .field("path", &self.path)
            .field("id", &self.id)
            .finish()
    }
}

/// One `<property>` from a branch listing.
#[derive(Debug, Clone)]
pub struct PropertyRecord {
    attributes: Attributes,
    branch: BranchRef,
}

impl PropertyRecord {
    pub fn new(element: Map<String, Value>, branch: BranchRef) -> Self {
        Self {
            attributes: Attributes::new(element),
            branch,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.attributes.has(key)
    }

    pub fn text(&self, key: &str) -> Option<String> {
        self.attributes.text(key)
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn branch(&self) -> &BranchRef {
        &self.branch
    }

    /// Listing identifier: `propid`, falling back to `id`.
    pub fn id(&self) -> Option<String> {
        self.text("propid").or_else(|| self.text("id"))
    }

    pub fn resource_path(&self) -> Result<String, ApiError> {
        let id = self.id().ok_or(ApiError::MissingIdentifier)?;
        Ok(format!("{}/property/{}", self.branch.path, id))
    }

    /// Fetches the full property document and merges it over the listing
    /// summary. Keys the detail payload omits keep their listing values.
    pub async fn enrich(&mut self) -> Result<(), ApiError> {
        let path = self.resource_path()?;
        let doc = self.branch.client.call(&path).await?;

        let elements = doc.select("property")?;
        if elements.is_empty() {
            return Err(ApiError::Parse(format!(
                "Response for {} contains no <property> element",
                path
            )));
        }
        for element in elements {
            self.attributes.merge(element);
        }
        Ok(())
    }
}
