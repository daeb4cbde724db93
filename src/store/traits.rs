use crate::error::StoreError;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// An untyped record as returned by the document store
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Map<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }
}

/// `field == value` constraint evaluated by the store
#[derive(Debug, Clone, PartialEq)]
pub struct EqualityFilter {
    pub field: String,
    pub value: Value,
}

impl EqualityFilter {
    pub fn new(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Read access to a hosted document database
/// Implementations wrap whatever client library talks to the real service
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All documents in `collection` matching every filter
    async fn query(
        &self,
        collection: &str,
        filters: &[EqualityFilter],
    ) -> Result<Vec<Document>, StoreError>;

    /// Point lookup; `Ok(None)` when the document does not exist
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;
}

/// The authentication service, reduced to what search needs
pub trait AuthService: Send + Sync {
    fn current_user_id(&self) -> Option<String>;
}

/// Fixed identity, for the CLI and tests
#[derive(Debug, Clone, Default)]
pub struct StaticAuth {
    user_id: Option<String>,
}

impl StaticAuth {
    pub fn signed_in(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
        }
    }

    pub fn signed_out() -> Self {
        Self { user_id: None }
    }
}

impl AuthService for StaticAuth {
    fn current_user_id(&self) -> Option<String> {
        self.user_id.clone()
    }
}
