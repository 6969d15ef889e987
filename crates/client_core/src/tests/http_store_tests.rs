use super::*;
use crate::{ListEvent, ProductListController};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::{net::TcpListener, sync::Mutex};

/// Document-store style backend: ids travel as `_id` and are assigned on create.
#[derive(Clone)]
struct BackendState {
    products: Arc<Mutex<Vec<Value>>>,
    next_id: Arc<Mutex<usize>>,
    received: Arc<Mutex<Vec<(String, Value)>>>,
}

impl BackendState {
    fn seeded(products: Vec<Value>) -> Self {
        let next_id = products.len();
        Self {
            products: Arc::new(Mutex::new(products)),
            next_id: Arc::new(Mutex::new(next_id)),
            received: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

async fn list_products(State(state): State<BackendState>) -> Json<Vec<Value>> {
    Json(state.products.lock().await.clone())
}

async fn create_product(
    State(state): State<BackendState>,
    Json(mut body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state
        .received
        .lock()
        .await
        .push(("POST".to_string(), body.clone()));
    let mut next_id = state.next_id.lock().await;
    *next_id += 1;
    body["_id"] = json!(next_id.to_string());
    body["__v"] = json!(0);
    state.products.lock().await.push(body.clone());
    (StatusCode::CREATED, Json(body))
}

async fn update_product(
    State(state): State<BackendState>,
    Path(id): Path<String>,
    Json(mut body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    state
        .received
        .lock()
        .await
        .push((format!("PUT {id}"), body.clone()));
    let mut products = state.products.lock().await;
    let slot = products
        .iter_mut()
        .find(|product| product["_id"] == id.as_str())
        .ok_or(StatusCode::NOT_FOUND)?;
    if let Some(fields) = body.as_object_mut() {
        fields.remove("id");
    }
    body["_id"] = json!(id);
    *slot = body.clone();
    Ok(Json(body))
}

async fn delete_product(
    State(state): State<BackendState>,
    Path(id): Path<String>,
) -> (StatusCode, Json<Value>) {
    state
        .received
        .lock()
        .await
        .push((format!("DELETE {id}"), Value::Null));
    let mut products = state.products.lock().await;
    let before = products.len();
    products.retain(|product| product["_id"] != id.as_str());
    if products.len() == before {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "Product not found" })),
        );
    }
    (StatusCode::OK, Json(json!({ "message": "Product deleted" })))
}

async fn serve(app: Router) -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

async fn spawn_backend(seed: Vec<Value>) -> (String, BackendState) {
    let state = BackendState::seeded(seed);
    let app = Router::new()
        .route("/data/products", get(list_products).post(create_product))
        .route(
            "/data/products/:id",
            axum::routing::put(update_product).delete(delete_product),
        )
        .with_state(state.clone());
    (serve(app).await, state)
}

fn widget_document() -> Value {
    json!({
        "_id": "1",
        "name": "Widget",
        "price": 100,
        "description": "A widget",
        "category": "Tools",
        "stock": "5",
        "__v": 0
    })
}

#[test]
fn collection_url_appends_products_path() {
    assert_eq!(
        collection_url("http://localhost:5000").expect("url").as_str(),
        "http://localhost:5000/data/products"
    );
    assert_eq!(
        collection_url("https://admin.example.com/api/")
            .expect("url")
            .as_str(),
        "https://admin.example.com/api/data/products"
    );
    assert_eq!(
        collection_url("http://localhost:5000/?debug=1#top")
            .expect("url")
            .as_str(),
        "http://localhost:5000/data/products"
    );
}

#[test]
fn collection_url_rejects_non_http_urls() {
    assert!(matches!(
        collection_url("ftp://localhost/files"),
        Err(StoreError::InvalidEndpoint { .. })
    ));
    assert!(matches!(
        collection_url("localhost"),
        Err(StoreError::InvalidEndpoint { .. })
    ));
}

#[test]
fn item_url_escapes_identifier() {
    let store = HttpProductStore::new("http://localhost:5000").expect("store");
    assert_eq!(
        store.item_url(&ProductId::new("a/b c")).as_str(),
        "http://localhost:5000/data/products/a%2Fb%20c"
    );
}

#[tokio::test]
async fn list_decodes_document_ids_and_numeric_text() {
    let (base_url, _state) = spawn_backend(vec![widget_document()]).await;
    let store = HttpProductStore::new(&base_url).expect("store");

    let products = store.list().await.expect("list");

    assert_eq!(products.len(), 1);
    assert_eq!(products[0].id, ProductId::new("1"));
    assert_eq!(products[0].price, 100.0);
    assert_eq!(products[0].stock, 5);
}

#[tokio::test]
async fn list_skips_rows_that_do_not_decode() {
    let (base_url, _state) = spawn_backend(vec![
        widget_document(),
        json!({ "_id": "2", "name": "Half", "price": 3, "stock": 2.5 }),
        json!({ "name": "No id" }),
        json!({ "_id": "4", "name": "Cleared", "price": null, "description": null, "stock": null }),
    ])
    .await;
    let store = HttpProductStore::new(&base_url).expect("store");

    let products = store.list().await.expect("list");

    let ids: Vec<&str> = products.iter().map(|product| product.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "4"]);
    assert_eq!(products[1].price, 0.0);
    assert_eq!(products[1].description, "");
}

#[tokio::test]
async fn list_accepts_documents_with_both_id_keys() {
    let mut document = widget_document();
    document["id"] = json!("1");
    let (base_url, _state) = spawn_backend(vec![document]).await;
    let store = HttpProductStore::new(&base_url).expect("store");

    let products = store.list().await.expect("list");

    assert_eq!(products.len(), 1);
    assert_eq!(products[0].id, ProductId::new("1"));
}

#[tokio::test]
async fn create_posts_draft_without_id() {
    let (base_url, state) = spawn_backend(Vec::new()).await;
    let store = HttpProductStore::new(&base_url).expect("store");

    let created = store.create(&ProductDraft::dummy()).await.expect("create");

    assert_eq!(created.id, ProductId::new("1"));
    assert_eq!(created.name, "New Dummy");
    let received = state.received.lock().await;
    assert_eq!(received[0].0, "POST");
    assert!(received[0].1.get("id").is_none());
    assert!(received[0].1.get("_id").is_none());
    assert_eq!(received[0].1["price"].as_f64(), Some(20000.0));
}

#[tokio::test]
async fn update_puts_full_product_to_item_url() {
    let (base_url, state) = spawn_backend(vec![widget_document()]).await;
    let store = HttpProductStore::new(&base_url).expect("store");
    let mut product = store.list().await.expect("list").remove(0);
    product.price = 150.0;

    let updated = store.update(&product).await.expect("update");

    assert_eq!(updated, product);
    let received = state.received.lock().await;
    assert_eq!(received[0].0, "PUT 1");
    assert_eq!(received[0].1["id"], "1");
    assert_eq!(received[0].1["price"].as_f64(), Some(150.0));
}

/// Echoes the request body back with `_id` added, keeping the client's `id`.
async fn echo_update(
    Path(id): Path<String>,
    Json(mut body): Json<Value>,
) -> Json<Value> {
    body["_id"] = json!(id);
    Json(body)
}

#[tokio::test]
async fn save_accepts_echoed_body_with_both_id_keys() {
    let app = Router::new()
        .route(
            "/data/products",
            get(|| async { Json(vec![widget_document()]) }),
        )
        .route("/data/products/:id", axum::routing::put(echo_update));
    let base_url = serve(app).await;
    let store = HttpProductStore::new(&base_url).expect("store");
    let controller = ProductListController::new(Arc::new(store));
    controller.load().await.expect("load");

    controller.begin_edit(0).await.expect("begin edit");
    controller
        .update_field(shared::domain::ProductField::Price, "175")
        .await
        .expect("update price");
    let saved = controller.save().await.expect("save");

    assert_eq!(saved.id, ProductId::new("1"));
    assert_eq!(saved.price, 175.0);
    assert_eq!(controller.items().await[0].price, 175.0);
    assert_eq!(controller.active_edit_id().await, None);
}

#[tokio::test]
async fn delete_succeeds_on_ok_status_and_ignores_body() {
    let (base_url, state) = spawn_backend(vec![widget_document()]).await;
    let store = HttpProductStore::new(&base_url).expect("store");

    store.delete(&ProductId::new("1")).await.expect("delete");

    assert!(state.products.lock().await.is_empty());
}

#[tokio::test]
async fn delete_of_missing_product_reports_status() {
    let (base_url, _state) = spawn_backend(Vec::new()).await;
    let store = HttpProductStore::new(&base_url).expect("store");

    let err = store
        .delete(&ProductId::new("missing"))
        .await
        .expect_err("must fail");

    match err {
        StoreError::Status { method, status, .. } => {
            assert_eq!(method, Method::DELETE);
            assert_eq!(status, StatusCode::NOT_FOUND);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn server_error_is_reported_as_status() {
    let app = Router::new().route(
        "/data/products",
        get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
    );
    let base_url = serve(app).await;
    let store = HttpProductStore::new(&base_url).expect("store");

    let err = store.list().await.expect_err("must fail");

    assert!(
        matches!(err, StoreError::Status { status, .. } if status == StatusCode::INTERNAL_SERVER_ERROR),
        "unexpected error: {err}"
    );
}

#[tokio::test]
async fn malformed_body_is_reported_as_decode_error() {
    let app = Router::new().route("/data/products", get(|| async { "<html>oops</html>" }));
    let base_url = serve(app).await;
    let store = HttpProductStore::new(&base_url).expect("store");

    let err = store.list().await.expect_err("must fail");

    assert!(matches!(err, StoreError::Decode { .. }), "unexpected error: {err}");
}

#[tokio::test]
async fn unreachable_backend_is_reported_as_transport_error() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    let store = HttpProductStore::new(&format!("http://{addr}")).expect("store");

    let err = store.list().await.expect_err("must fail");

    assert!(matches!(err, StoreError::Transport { .. }), "unexpected error: {err}");
}

#[tokio::test]
async fn controller_round_trip_against_backend() {
    let (base_url, state) = spawn_backend(vec![widget_document()]).await;
    let store = HttpProductStore::new(&base_url).expect("store");
    let controller = ProductListController::new(Arc::new(store));

    controller.load().await.expect("load");
    assert_eq!(controller.len().await, 1);
    assert_eq!(controller.items().await[0].name, "Widget");

    controller.begin_edit(0).await.expect("begin edit");
    controller
        .update_field(shared::domain::ProductField::Price, "150")
        .await
        .expect("update price");
    controller.save().await.expect("save");
    assert_eq!(controller.items().await[0].price, 150.0);
    assert_eq!(controller.active_edit_index().await, None);

    controller
        .delete(&ProductId::new("1"), 0)
        .await
        .expect("delete");
    assert!(controller.is_empty().await);

    let mut events = controller.subscribe_events();
    let created = controller.create_dummy().await.expect("create");
    assert_eq!(created.id, ProductId::new("2"));
    assert_eq!(created, Product::from_draft(ProductId::new("2"), ProductDraft::dummy()));
    assert_eq!(controller.items().await.last(), Some(&created));
    assert_eq!(events.recv().await.expect("event"), ListEvent::Created(created));

    let products = state.products.lock().await;
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["_id"], "2");
}
