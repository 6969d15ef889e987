//! Editable product list: the loaded rows, the single row in edit mode, and
//! the operations that move them between states.
//!
//! Rows are targeted by [`ProductId`] once an operation starts. Positions are
//! resolved again when the backend call completes, so a delete or create that
//! lands in between cannot redirect a save to the wrong row.

use std::{fmt, sync::Arc};

use shared::domain::{EditDraft, Product, ProductDraft, ProductField, ProductId};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, warn};

use crate::{error::ListError, ProductStore};

const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOperation {
    Load,
    BeginEdit,
    UpdateField,
    Save,
    Delete,
    CreateDummy,
}

impl ListOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            ListOperation::Load => "load",
            ListOperation::BeginEdit => "begin_edit",
            ListOperation::UpdateField => "update_field",
            ListOperation::Save => "save",
            ListOperation::Delete => "delete",
            ListOperation::CreateDummy => "create_dummy",
        }
    }
}

impl fmt::Display for ListOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListEvent {
    Loaded { count: usize },
    Created(Product),
    Saved(Product),
    Deleted(ProductId),
    Failed {
        operation: ListOperation,
        message: String,
    },
}

/// One table row as a view would draw it.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRow {
    /// 1-based ordinal for the "No" column.
    pub number: usize,
    pub product: Product,
    /// Present when this row is in edit mode.
    pub editing: Option<EditDraft>,
}

struct ActiveEdit {
    id: ProductId,
    scratch: EditDraft,
}

struct ListState {
    items: Vec<Product>,
    active_edit: Option<ActiveEdit>,
    loading: bool,
}

impl ListState {
    fn position_of(&self, id: &ProductId) -> Option<usize> {
        self.items.iter().position(|product| &product.id == id)
    }

    fn clear_edit_of(&mut self, id: &ProductId) {
        if self
            .active_edit
            .as_ref()
            .is_some_and(|edit| &edit.id == id)
        {
            self.active_edit = None;
        }
    }
}

pub struct ProductListController {
    store: Arc<dyn ProductStore>,
    inner: Mutex<ListState>,
    events: broadcast::Sender<ListEvent>,
}

impl ProductListController {
    pub fn new(store: Arc<dyn ProductStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            store,
            inner: Mutex::new(ListState {
                items: Vec::new(),
                active_edit: None,
                loading: true,
            }),
            events,
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ListEvent> {
        self.events.subscribe()
    }

    pub async fn items(&self) -> Vec<Product> {
        self.inner.lock().await.items.clone()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.items.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.items.is_empty()
    }

    /// True until the first load has finished, successfully or not.
    pub async fn is_loading(&self) -> bool {
        self.inner.lock().await.loading
    }

    pub async fn active_edit_index(&self) -> Option<usize> {
        let state = self.inner.lock().await;
        let edit = state.active_edit.as_ref()?;
        state.position_of(&edit.id)
    }

    pub async fn active_edit_id(&self) -> Option<ProductId> {
        let state = self.inner.lock().await;
        state.active_edit.as_ref().map(|edit| edit.id.clone())
    }

    pub async fn scratch(&self) -> Option<EditDraft> {
        let state = self.inner.lock().await;
        state.active_edit.as_ref().map(|edit| edit.scratch.clone())
    }

    pub async fn rows(&self) -> Vec<ProductRow> {
        let state = self.inner.lock().await;
        state
            .items
            .iter()
            .enumerate()
            .map(|(index, product)| ProductRow {
                number: index + 1,
                product: product.clone(),
                editing: state
                    .active_edit
                    .as_ref()
                    .filter(|edit| edit.id == product.id)
                    .map(|edit| edit.scratch.clone()),
            })
            .collect()
    }

    /// Replace the list with the backend's collection, in the order returned.
    pub async fn load(&self) -> Result<usize, ListError> {
        let result = self.store.list().await;

        let mut state = self.inner.lock().await;
        state.loading = false;
        let products = match result {
            Ok(products) => products,
            Err(err) => {
                drop(state);
                return Err(self.fail(ListOperation::Load, err.into()));
            }
        };

        let count = products.len();
        state.items = products;
        let stale_edit = state
            .active_edit
            .as_ref()
            .filter(|edit| !state.items.iter().any(|product| product.id == edit.id))
            .map(|edit| edit.id.clone());
        if let Some(id) = stale_edit {
            debug!(%id, "dropping edit of product missing after reload");
            state.active_edit = None;
        }
        drop(state);

        info!(count, "loaded products");
        self.emit(ListEvent::Loaded { count });
        Ok(count)
    }

    /// Put the row at `index` into edit mode, abandoning any other edit.
    pub async fn begin_edit(&self, index: usize) -> Result<(), ListError> {
        let mut state = self.inner.lock().await;
        let len = state.items.len();
        if index >= len {
            drop(state);
            return Err(self.fail(
                ListOperation::BeginEdit,
                ListError::IndexOutOfRange { index, len },
            ));
        }

        let product = &state.items[index];
        let edit = ActiveEdit {
            id: product.id.clone(),
            scratch: EditDraft::from(product),
        };
        if let Some(previous) = state.active_edit.replace(edit) {
            debug!(abandoned = %previous.id, index, "abandoned unsaved edit");
        }
        Ok(())
    }

    /// Drop the active edit without saving. Returns whether one was active.
    pub async fn cancel_edit(&self) -> bool {
        self.inner.lock().await.active_edit.take().is_some()
    }

    pub async fn update_field(
        &self,
        field: ProductField,
        value: impl Into<String>,
    ) -> Result<(), ListError> {
        let mut state = self.inner.lock().await;
        if let Some(edit) = state.active_edit.as_mut() {
            edit.scratch.set(field, value);
            return Ok(());
        }
        drop(state);
        Err(self.fail(ListOperation::UpdateField, ListError::NoActiveEdit))
    }

    /// Send the scratch values for the row in edit mode and commit the
    /// backend's response into the list. On failure the row stays in edit mode.
    pub async fn save(&self) -> Result<Product, ListError> {
        match self.try_save().await {
            Ok(product) => {
                self.emit(ListEvent::Saved(product.clone()));
                Ok(product)
            }
            Err(err) => Err(self.fail(ListOperation::Save, err)),
        }
    }

    async fn try_save(&self) -> Result<Product, ListError> {
        let (id, edited) = {
            let state = self.inner.lock().await;
            let edit = state.active_edit.as_ref().ok_or(ListError::NoActiveEdit)?;
            let draft = edit.scratch.to_draft()?;
            (edit.id.clone(), Product::from_draft(edit.id.clone(), draft))
        };

        let updated = self.store.update(&edited).await?;

        let mut state = self.inner.lock().await;
        match state.position_of(&id) {
            Some(position) => state.items[position] = updated.clone(),
            None => warn!(%id, "saved product is no longer listed; dropping response"),
        }
        state.clear_edit_of(&id);
        drop(state);

        info!(%id, "saved product");
        Ok(updated)
    }

    /// Delete product `id`, shown at `index`. The id decides which row goes.
    pub async fn delete(&self, id: &ProductId, index: usize) -> Result<(), ListError> {
        match self.try_delete(id, index).await {
            Ok(()) => {
                self.emit(ListEvent::Deleted(id.clone()));
                Ok(())
            }
            Err(err) => Err(self.fail(ListOperation::Delete, err)),
        }
    }

    async fn try_delete(&self, id: &ProductId, index: usize) -> Result<(), ListError> {
        {
            let state = self.inner.lock().await;
            let position = state
                .position_of(id)
                .ok_or_else(|| ListError::UnknownProduct(id.clone()))?;
            if position != index {
                warn!(%id, index, position, "row index does not match product; deleting by id");
            }
        }

        self.store.delete(id).await?;

        let mut state = self.inner.lock().await;
        match state.position_of(id) {
            Some(position) => {
                state.items.remove(position);
            }
            None => warn!(%id, "deleted product was already gone from the list"),
        }
        state.clear_edit_of(id);
        drop(state);

        info!(%id, "deleted product");
        Ok(())
    }

    /// Create the fixed placeholder product and append it to the list.
    pub async fn create_dummy(&self) -> Result<Product, ListError> {
        let created = match self.store.create(&ProductDraft::dummy()).await {
            Ok(product) => product,
            Err(err) => return Err(self.fail(ListOperation::CreateDummy, err.into())),
        };

        self.inner.lock().await.items.push(created.clone());
        info!(id = %created.id, "created product");
        self.emit(ListEvent::Created(created.clone()));
        Ok(created)
    }

    fn fail(&self, operation: ListOperation, err: ListError) -> ListError {
        if err.is_store_failure() {
            error!(%operation, error = %err, "product list operation failed");
        } else {
            warn!(%operation, error = %err, "product list operation rejected");
        }
        self.emit(ListEvent::Failed {
            operation,
            message: err.to_string(),
        });
        err
    }

    fn emit(&self, event: ListEvent) {
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
