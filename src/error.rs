use thiserror::Error;

/// Failures talking to the document store
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("{collection}/{id} not found")]
    NotFound { collection: String, id: String },
    #[error("malformed record {id}: field `{field}` missing or wrong type")]
    MalformedRecord { id: String, field: &'static str },
    #[error("transient store failure: {0}")]
    Transient(String),
    #[error("lookup timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// Failures that prevent a search from starting at all
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("no user is signed in")]
    NotSignedIn,
    #[error("no profile exists for user {0}")]
    ProfileMissing(String),
    #[error("profile of user {0} has no geocoded address")]
    OriginUnavailable(String),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, SearchError>;
