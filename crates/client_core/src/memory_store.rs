use async_trait::async_trait;
use shared::domain::{Product, ProductDraft, ProductId};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{error::StoreError, ProductStore};

/// Process-local [`ProductStore`] for running without a backend and for tests.
///
/// Identifiers are random UUIDs, the way a real backend would assign them.
#[derive(Default)]
pub struct InMemoryProductStore {
    inner: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    products: Vec<Product>,
    fail_with: Option<String>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(products: Vec<Product>) -> Self {
        Self {
            inner: Mutex::new(MemoryState {
                products,
                fail_with: None,
            }),
        }
    }

    /// Make every following call fail with `message` until [`Self::recover`].
    pub async fn fail_with(&self, message: impl Into<String>) {
        self.inner.lock().await.fail_with = Some(message.into());
    }

    pub async fn recover(&self) {
        self.inner.lock().await.fail_with = None;
    }

    pub async fn snapshot(&self) -> Vec<Product> {
        self.inner.lock().await.products.clone()
    }
}

impl MemoryState {
    fn check(&self) -> Result<(), StoreError> {
        match &self.fail_with {
            Some(message) => Err(StoreError::Unavailable(message.clone())),
            None => Ok(()),
        }
    }

    fn position(&self, id: &ProductId) -> Result<usize, StoreError> {
        self.products
            .iter()
            .position(|product| &product.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn list(&self) -> Result<Vec<Product>, StoreError> {
        let state = self.inner.lock().await;
        state.check()?;
        Ok(state.products.clone())
    }

    async fn create(&self, draft: &ProductDraft) -> Result<Product, StoreError> {
        let mut state = self.inner.lock().await;
        state.check()?;
        let product = Product::from_draft(ProductId::new(Uuid::new_v4().to_string()), draft.clone());
        state.products.push(product.clone());
        Ok(product)
    }

    async fn update(&self, product: &Product) -> Result<Product, StoreError> {
        let mut state = self.inner.lock().await;
        state.check()?;
        let position = state.position(&product.id)?;
        state.products[position] = product.clone();
        Ok(product.clone())
    }

    async fn delete(&self, id: &ProductId) -> Result<(), StoreError> {
        let mut state = self.inner.lock().await;
        state.check()?;
        let position = state.position(id)?;
        state.products.remove(position);
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/memory_store_tests.rs"]
mod tests;
