use reqwest::{Method, StatusCode};
use shared::{domain::ProductId, error::FieldError};
use thiserror::Error;

/// A call to the product backend failed.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid product backend url '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },
    #[error("failed to build http client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    #[error("failed to build request: {0}")]
    InvalidRequest(#[source] reqwest::Error),
    #[error("{method} {url} failed: {source}")]
    Transport {
        method: Method,
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{method} {url} returned {status}")]
    Status {
        method: Method,
        url: String,
        status: StatusCode,
    },
    #[error("failed to decode response from {method} {url}: {source}")]
    Decode {
        method: Method,
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("product {0} not found")]
    NotFound(ProductId),
    #[error("product backend unavailable: {0}")]
    Unavailable(String),
}

/// Failure of a product list controller operation.
#[derive(Debug, Error)]
pub enum ListError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("no product row is being edited")]
    NoActiveEdit,
    #[error("row index {index} is out of range for {len} products")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("product {0} is not in the list")]
    UnknownProduct(ProductId),
    #[error(transparent)]
    Field(#[from] FieldError),
}

impl ListError {
    /// Whether the failure came from the backend rather than a local precondition.
    pub fn is_store_failure(&self) -> bool {
        matches!(self, ListError::Store(_))
    }
}
