//! Integration tests for the table controller.
//!
//! The transports here are in-process fakes, so these run without a
//! backend: `cargo test -p datatable-lib --test controller`

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use datatable_lib::error::ApiError;
use datatable_lib::error::ConfigError;
use datatable_lib::model::ApiDescriptor;
use datatable_lib::model::ColumnSpec;
use datatable_lib::model::FieldNames;
use datatable_lib::model::Method;
use datatable_lib::model::SortKey;
use datatable_lib::table::TableConfig;
use datatable_lib::table::TableController;
use datatable_lib::transport::HttpRequest;
use datatable_lib::transport::HttpResponse;
use datatable_lib::transport::HttpTransport;
use serde_json::Value;
use serde_json::json;
use tokio::sync::mpsc;
use tokio::sync::oneshot;
use tokio::time::Instant;

// =============================================================================
// Fake transports
// =============================================================================

/// Answers from a queue, then with a fallback, recording every request.
struct Scripted {
    replies: Mutex<VecDeque<Result<HttpResponse, ApiError>>>,
    fallback: Value,
    seen: Mutex<Vec<(HttpRequest, Instant)>>,
}

impl Scripted {
    fn new(fallback: Value) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(VecDeque::new()),
            fallback,
            seen: Mutex::new(Vec::new()),
        })
    }

    fn then(self: &Arc<Self>, reply: Result<HttpResponse, ApiError>) -> Arc<Self> {
        self.replies.lock().unwrap().push_back(reply);
        self.clone()
    }

    fn requests(&self) -> Vec<HttpRequest> {
        self.seen.lock().unwrap().iter().map(|(r, _)| r.clone()).collect()
    }

    fn times(&self) -> Vec<Instant> {
        self.seen.lock().unwrap().iter().map(|(_, t)| *t).collect()
    }
}

#[async_trait]
impl HttpTransport for Scripted {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.seen.lock().unwrap().push((request, Instant::now()));
        let queued = self.replies.lock().unwrap().pop_front();
        queued.unwrap_or_else(|| Ok(HttpResponse::json_ok(&self.fallback)))
    }
}

type Pending = (HttpRequest, oneshot::Sender<HttpResponse>);

/// Holds every request until the test answers it.
struct Gated {
    requests: mpsc::UnboundedSender<Pending>,
}

#[async_trait]
impl HttpTransport for Gated {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let (tx, rx) = oneshot::channel();
        self.requests
            .send((request, tx))
            .map_err(|_| ApiError::Transport("test harness gone".to_string()))?;
        rx.await
            .map_err(|_| ApiError::Transport("reply dropped".to_string()))
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn users_config() -> TableConfig {
    TableConfig::new(
        ApiDescriptor::new("/api/users").field_names(
            FieldNames::new()
                .limit("limit")
                .skip("skip")
                .total("total")
                .sort("sortBy", "order")
                .search_param("q"),
        ),
        vec![
            ColumnSpec::serial("#"),
            ColumnSpec::field("Name", "name").sortable(),
            ColumnSpec::field("City", "address.city"),
            ColumnSpec::collection_root("data"),
        ],
    )
}

fn page(name: &str, total: u64) -> Value {
    json!({ "data": [{ "name": name, "address": { "city": "Oslo" } }], "total": total })
}

fn names(view: &datatable_lib::model::ViewState) -> Vec<String> {
    view.rows.iter().map(|r| r.display("Name")).collect()
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_end_to_end_minimal_backend() {
    let config = TableConfig::new(
        ApiDescriptor::new("/x").field_names(FieldNames::new().limit("limit").skip("skip").total("total")),
        vec![ColumnSpec::field("Name", "name"), ColumnSpec::collection_root("data")],
    );
    let transport = Scripted::new(json!({ "data": [{ "name": "Jo" }], "total": 1 }));
    let table = TableController::with_tokio(config, transport.clone()).unwrap();

    let view = table.load().await;
    assert_eq!(names(&view), ["Jo"]);
    assert_eq!(view.total_items, 1);
    assert_eq!(view.total_pages, 1);
    assert!(!view.loading);
    assert!(view.error.is_none());

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, Method::Get);
    assert_eq!(requests[0].url, "/x?limit=10&skip=0");
}

#[tokio::test]
async fn test_stale_response_never_wins() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let config = users_config().initial_data(page("seed", 50));
    let table = TableController::with_tokio(config, Arc::new(Gated { requests: tx })).unwrap();

    let first = tokio::spawn({
        let table = table.clone();
        async move { table.refresh().await }
    });
    let (slow, slow_reply) = rx.recv().await.unwrap();
    assert!(slow.url.contains("skip=0"));

    let second = tokio::spawn({
        let table = table.clone();
        async move { table.go_to_page(2).await }
    });
    let (fast, fast_reply) = rx.recv().await.unwrap();
    assert!(fast.url.contains("skip=10"));

    fast_reply.send(HttpResponse::json_ok(&page("page 2", 50))).unwrap();
    let view = second.await.unwrap();
    assert_eq!(view.page, 2);
    assert_eq!(names(&view), ["page 2"]);
    assert!(!view.loading);

    slow_reply.send(HttpResponse::json_ok(&page("page 1", 50))).unwrap();
    let stale = first.await.unwrap();
    assert_eq!(stale.page, 2);
    assert_eq!(names(&stale), ["page 2"]);
    assert_eq!(names(&table.view()), ["page 2"]);
}

#[tokio::test(start_paused = true)]
async fn test_search_burst_commits_once() {
    let transport = Scripted::new(page("Jo", 1));
    let config = users_config().search_debounce_ms(500);
    let table = TableController::with_tokio(config, transport.clone()).unwrap();
    table.load().await;

    let start = Instant::now();
    for (offset, term) in [(0, "a"), (100, "ab"), (200, "abc")] {
        tokio::time::sleep_until(start + Duration::from_millis(offset)).await;
        let view = table.set_search_input(term).await;
        assert_eq!(view.search, "");
        assert!(table.search_pending());
    }
    assert_eq!(table.query().raw_search, "abc");

    tokio::time::sleep_until(start + Duration::from_millis(2_000)).await;

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[1].url.ends_with("q=abc"));
    assert_eq!(transport.times()[1] - start, Duration::from_millis(700));

    let view = table.view();
    assert_eq!(view.search, "abc");
    assert_eq!(view.page, 1);
}

#[tokio::test(start_paused = true)]
async fn test_unchanged_search_term_skips_fetch() {
    let transport = Scripted::new(page("Jo", 1));
    let table = TableController::with_tokio(users_config(), transport.clone()).unwrap();
    table.load().await;

    table.set_search_input("jo").await;
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(transport.requests().len(), 2);

    table.set_search_input("jon").await;
    table.set_search_input("jo").await;
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(transport.requests().len(), 2);
}

#[tokio::test]
async fn test_search_resets_page() {
    let transport = Scripted::new(page("Jo", 50));
    let table = TableController::with_tokio(users_config().no_search_debounce(), transport.clone())
        .unwrap();
    table.load().await;
    assert_eq!(table.go_to_page(3).await.page, 3);

    let view = table.set_search_input("jo").await;
    assert_eq!(view.page, 1);
    assert_eq!(view.search, "jo");
    assert!(transport.requests().last().unwrap().url.ends_with("limit=10&skip=0&q=jo"));
}

#[tokio::test]
async fn test_search_disabled() {
    let transport = Scripted::new(page("Jo", 1));
    let config = users_config().no_search_debounce().disable_search();
    let table = TableController::with_tokio(config, transport.clone()).unwrap();
    table.load().await;

    let view = table.set_search_input("jo").await;
    assert_eq!(view.search, "");
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn test_sort_cycle_requests() {
    let transport = Scripted::new(page("Jo", 50));
    let table = TableController::with_tokio(users_config(), transport.clone()).unwrap();
    table.load().await;
    table.go_to_page(2).await;

    let view = table.activate_sort("Name").await;
    assert_eq!(view.sort, Some(SortKey::asc("Name")));
    assert_eq!(view.page, 1);
    table.activate_sort("Name").await;
    let view = table.activate_sort("Name").await;
    assert_eq!(view.sort, None);

    let urls: Vec<_> = transport.requests().into_iter().map(|r| r.url).collect();
    assert_eq!(
        urls[2..],
        [
            "/api/users?limit=10&skip=0&sortBy=name&order=asc",
            "/api/users?limit=10&skip=0&sortBy=name&order=desc",
            "/api/users?limit=10&skip=0",
        ]
    );
}

#[tokio::test]
async fn test_failure_keeps_rows() {
    let transport = Scripted::new(page("Jo", 1))
        .then(Ok(HttpResponse::json_ok(&page("Jo", 1))))
        .then(Err(ApiError::Transport("connection refused".to_string())))
        .then(Ok(HttpResponse::new(404, "")));
    let table = TableController::with_tokio(users_config(), transport).unwrap();

    let loaded = table.load().await;
    assert_eq!(names(&loaded), ["Jo"]);

    let failed = table.refresh().await;
    assert_eq!(names(&failed), ["Jo"]);
    assert_eq!(failed.total_items, 1);
    assert!(!failed.loading);
    assert!(failed.error.as_deref().unwrap().contains("connection refused"));

    let not_found = table.refresh().await;
    assert_eq!(not_found.error.as_deref(), Some("HTTP 404: Not Found"));

    let recovered = table.refresh().await;
    assert!(recovered.error.is_none());
}

#[tokio::test]
async fn test_shape_error_is_reported() {
    let transport = Scripted::new(json!({ "items": [] }));
    let table = TableController::with_tokio(users_config(), transport).unwrap();

    let view = table.load().await;
    assert!(view.rows.is_empty());
    assert!(view.error.unwrap().contains("data"));
}

#[tokio::test]
async fn test_initial_data_short_circuits() {
    let transport = Scripted::new(page("fetched", 50));
    let config = users_config().initial_data(page("seed", 50));
    let table = TableController::with_tokio(config, transport.clone()).unwrap();

    let view = table.load().await;
    assert_eq!(names(&view), ["seed"]);
    assert_eq!(view.total_pages, 5);
    assert!(transport.requests().is_empty());

    let view = table.go_to_page(2).await;
    assert_eq!(names(&view), ["fetched"]);
    assert_eq!(transport.requests().len(), 1);

    table.load().await;
    assert_eq!(transport.requests().len(), 2);
}

#[tokio::test]
async fn test_invalid_configs() {
    let transport = Scripted::new(json!([]));

    let unmappable = users_config().initial_data(json!({ "items": [] }));
    assert!(matches!(
        TableController::with_tokio(unmappable, transport.clone()),
        Err(ConfigError::InitialData(_))
    ));

    let duplicate = TableConfig::new(
        ApiDescriptor::new("/x"),
        vec![ColumnSpec::field("A", "a"), ColumnSpec::field("A", "b")],
    );
    assert!(matches!(
        TableController::with_tokio(duplicate, transport.clone()),
        Err(ConfigError::DuplicateColumn { .. })
    ));

    let empty = TableConfig::new(ApiDescriptor::new(""), Vec::new());
    assert!(matches!(
        TableController::with_tokio(empty, transport),
        Err(ConfigError::EmptyEndpoint)
    ));
}

#[tokio::test]
async fn test_post_with_nested_field_names() {
    let config = TableConfig::from_json(
        r#"{
            "endpoint": "http://localhost:3000/api/datatable/v1",
            "method": "POST",
            "fieldNames": {
                "limit": "pagination.limit",
                "skip": "pagination.skip",
                "total": "pagination.totalItems",
                "sortField": "sortBy",
                "sortOrder": "sortOrder",
                "searchParam": "search"
            },
            "staticPayload": { "tenant": "acme" },
            "columns": [
                { "title": "Name", "dataIndex": "name", "sort": true },
                { "dataSrc": "data" }
            ],
            "searchDebounceMs": false
        }"#,
    )
    .unwrap();
    let transport = Scripted::new(json!({
        "success": true,
        "data": [{ "name": "Jo" }],
        "pagination": { "totalItems": "42" }
    }));
    let table = TableController::with_tokio(config, transport.clone()).unwrap();

    table.activate_sort("Name").await;
    let view = table.set_search_input("jo").await;
    assert_eq!(view.total_items, 42);
    assert_eq!(view.total_pages, 5);

    let request = transport.requests().pop().unwrap();
    assert_eq!(request.method, Method::Post);
    assert_eq!(request.url, "http://localhost:3000/api/datatable/v1");
    let body: Value = serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
    assert_eq!(
        body,
        json!({
            "tenant": "acme",
            "pagination": { "limit": 10, "skip": 0 },
            "sortBy": "name",
            "sortOrder": "asc",
            "search": "jo"
        })
    );
    assert!(
        request
            .headers
            .iter()
            .any(|(k, v)| k == "Content-Type" && v == "application/json")
    );
}

#[tokio::test]
async fn test_search_route() {
    let config = TableConfig::new(
        ApiDescriptor::new("https://dummyjson.com/products").field_names(
            FieldNames::new().total("total").search_route("/search").search_param("q"),
        ),
        vec![ColumnSpec::field("Title", "title"), ColumnSpec::collection_root("products")],
    )
    .no_search_debounce();
    let transport = Scripted::new(json!({ "products": [{ "title": "iPhone 9" }], "total": 1 }));
    let table = TableController::with_tokio(config, transport.clone()).unwrap();

    table.load().await;
    table.set_search_input("iphone").await;
    table.set_search_input("").await;

    let urls: Vec<_> = transport.requests().into_iter().map(|r| r.url).collect();
    assert_eq!(
        urls,
        [
            "https://dummyjson.com/products?limit=10&skip=0",
            "https://dummyjson.com/products/search?limit=10&skip=0&q=iphone",
            "https://dummyjson.com/products?limit=10&skip=0",
        ]
    );
}

#[tokio::test]
async fn test_local_refinement_without_backend_support() {
    let config = TableConfig::new(
        ApiDescriptor::new("/static.json"),
        vec![
            ColumnSpec::field("Name", "name").sortable(),
            ColumnSpec::field("Age", "age").sortable(),
        ],
    )
    .no_search_debounce();
    let transport = Scripted::new(json!([
        { "name": "item10", "age": 31 },
        { "name": "Item2", "age": null },
        { "name": "other", "age": 7 }
    ]));
    let table = TableController::with_tokio(config, transport.clone()).unwrap();

    let view = table.activate_sort("Name").await;
    assert_eq!(names(&view), ["Item2", "item10", "other"]);

    table.activate_sort("Age").await;
    let view = table.activate_sort("Age").await;
    assert_eq!(names(&view), ["item10", "other", "Item2"]);

    let view = table.set_search_input("ITEM").await;
    assert_eq!(names(&view), ["item10", "Item2"]);
    assert!(transport.requests().iter().all(|r| r.url == "/static.json?limit=10&skip=0"));
}

#[tokio::test]
async fn test_paging_without_total_is_unbounded() {
    let config = TableConfig::new(
        ApiDescriptor::new("/static.json"),
        vec![ColumnSpec::serial("#"), ColumnSpec::field("Name", "name")],
    );
    let transport = Scripted::new(json!([{ "name": "Jo" }]));
    let table = TableController::with_tokio(config, transport).unwrap();

    let view = table.load().await;
    assert_eq!(view.total_pages, 1);
    assert!(!view.total_known);
    assert!(view.has_next());

    let view = table.next_page().await;
    assert_eq!(view.page, 2);
    assert_eq!(view.serial(0), 11);

    let view = table.go_to_page(u64::MAX / 2).await;
    assert_eq!(view.page, u64::MAX / 2);
    assert_eq!(view.serial(0), u64::MAX);
    assert!(view.has_next());
}

#[tokio::test]
async fn test_subscribe_sees_updates() {
    let transport = Scripted::new(page("Jo", 1));
    let table = TableController::with_tokio(users_config(), transport).unwrap();
    let mut views = table.subscribe();
    assert!(views.borrow_and_update().rows.is_empty());

    table.load().await;
    assert!(views.has_changed().unwrap());
    let latest = views.borrow_and_update().clone();
    assert_eq!(names(&latest), ["Jo"]);
    assert!(!latest.loading);
}

#[tokio::test(start_paused = true)]
async fn test_teardown_cancels_everything() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let table = TableController::with_tokio(users_config(), Arc::new(Gated { requests: tx })).unwrap();

    let in_flight = tokio::spawn({
        let table = table.clone();
        async move { table.load().await }
    });
    let (_request, reply) = rx.recv().await.unwrap();

    table.set_search_input("jo").await;
    assert!(table.search_pending());

    let final_view = table.teardown();
    assert!(!final_view.loading);
    assert!(!table.search_pending());

    let _ = reply.send(HttpResponse::json_ok(&page("late", 1)));
    let view = in_flight.await.unwrap();
    assert!(view.rows.is_empty());

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(rx.try_recv().is_err());
    assert_eq!(table.go_to_page(2).await, final_view);
    assert_eq!(table.view(), final_view);
}
