use async_trait::async_trait;
use shared::domain::{Product, ProductDraft, ProductId};

pub mod controller;
pub mod error;
mod http_store;
mod memory_store;

pub use controller::{ListEvent, ListOperation, ProductListController, ProductRow};
pub use error::{ListError, StoreError};
pub use http_store::{HttpProductStore, DEFAULT_REQUEST_TIMEOUT};
pub use memory_store::InMemoryProductStore;

/// Persistence backend for the products collection.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Product>, StoreError>;
    async fn create(&self, draft: &ProductDraft) -> Result<Product, StoreError>;
    /// Replace the stored fields of `product.id` with `product`.
    async fn update(&self, product: &Product) -> Result<Product, StoreError>;
    async fn delete(&self, id: &ProductId) -> Result<(), StoreError>;
}

/// Stand-in used when no backend is configured; every call fails.
pub struct MissingProductStore;

#[async_trait]
impl ProductStore for MissingProductStore {
    async fn list(&self) -> Result<Vec<Product>, StoreError> {
        Err(StoreError::Unavailable("no product backend configured".to_string()))
    }

    async fn create(&self, _draft: &ProductDraft) -> Result<Product, StoreError> {
        Err(StoreError::Unavailable("no product backend configured".to_string()))
    }

    async fn update(&self, product: &Product) -> Result<Product, StoreError> {
        Err(StoreError::Unavailable(format!(
            "no product backend configured to update {}",
            product.id
        )))
    }

    async fn delete(&self, id: &ProductId) -> Result<(), StoreError> {
        Err(StoreError::Unavailable(format!(
            "no product backend configured to delete {id}"
        )))
    }
}
