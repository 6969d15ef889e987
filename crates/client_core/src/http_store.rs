use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{Product, ProductDraft, ProductId},
    protocol::PRODUCTS_PATH,
};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::{error::StoreError, ProductStore};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// [`ProductStore`] backed by the `/data/products` REST endpoints.
pub struct HttpProductStore {
    http: Client,
    collection_url: Url,
}

impl HttpProductStore {
    pub fn new(base_url: &str) -> Result<Self, StoreError> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(StoreError::ClientBuild)?;
        Self::with_client(http, base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Result<Self, StoreError> {
        Ok(Self {
            http,
            collection_url: collection_url(base_url)?,
        })
    }

    pub fn collection_url(&self) -> &Url {
        &self.collection_url
    }

    fn item_url(&self, id: &ProductId) -> Url {
        let mut url = self.collection_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(id.as_str());
        }
        url
    }

    async fn dispatch(&self, request: RequestBuilder) -> Result<Dispatched, StoreError> {
        let request = request.build().map_err(StoreError::InvalidRequest)?;
        let method = request.method().clone();
        let url = request.url().to_string();
        debug!(%method, %url, "product backend request");

        let response = match self.http.execute(request).await {
            Ok(response) => response,
            Err(source) => {
                return Err(StoreError::Transport {
                    method,
                    url,
                    source,
                })
            }
        };

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status {
                method,
                url,
                status,
            });
        }
        Ok(Dispatched {
            method,
            url,
            response,
        })
    }

    async fn dispatch_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, StoreError> {
        let Dispatched {
            method,
            url,
            response,
        } = self.dispatch(request).await?;
        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(source) => {
                return Err(StoreError::Transport {
                    method,
                    url,
                    source,
                })
            }
        };
        serde_json::from_slice(&bytes).map_err(|source| StoreError::Decode {
            method,
            url,
            source,
        })
    }
}

struct Dispatched {
    method: Method,
    url: String,
    response: Response,
}

#[async_trait]
impl ProductStore for HttpProductStore {
    async fn list(&self) -> Result<Vec<Product>, StoreError> {
        let documents: Vec<Value> = self
            .dispatch_json(self.http.get(self.collection_url.clone()))
            .await?;
        Ok(decode_rows(documents))
    }

    async fn create(&self, draft: &ProductDraft) -> Result<Product, StoreError> {
        self.dispatch_json(self.http.post(self.collection_url.clone()).json(draft))
            .await
    }

    async fn update(&self, product: &Product) -> Result<Product, StoreError> {
        self.dispatch_json(self.http.put(self.item_url(&product.id)).json(product))
            .await
    }

    async fn delete(&self, id: &ProductId) -> Result<(), StoreError> {
        self.dispatch(self.http.delete(self.item_url(id))).await?;
        Ok(())
    }
}

/// Decode each listed document on its own; rows that do not decode are
/// skipped so the rest of the list still shows.
fn decode_rows(documents: Vec<Value>) -> Vec<Product> {
    let total = documents.len();
    let products: Vec<Product> = documents
        .into_iter()
        .enumerate()
        .filter_map(|(row, document)| match serde_json::from_value(document) {
            Ok(product) => Some(product),
            Err(err) => {
                warn!(row, error = %err, "skipping undecodable product");
                None
            }
        })
        .collect();
    if products.len() < total {
        warn!(
            skipped = total - products.len(),
            total, "product list contained undecodable rows"
        );
    }
    products
}

fn collection_url(base_url: &str) -> Result<Url, StoreError> {
    let invalid = |reason: String| StoreError::InvalidEndpoint {
        url: base_url.to_string(),
        reason,
    };

    let mut url = Url::parse(base_url.trim()).map_err(|err| invalid(err.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut()
        .map_err(|()| invalid("url cannot be a base".to_string()))?
        .pop_if_empty()
        .extend(PRODUCTS_PATH);
    Ok(url)
}

#[cfg(test)]
#[path = "tests/http_store_tests.rs"]
mod tests;
