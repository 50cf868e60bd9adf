//! Integration tests for the books HTTP surface

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use bookshelf_app::books::{BookStore, BooksModule};
use bookshelf_kernel::{settings::Settings, ModuleRegistry};
use serde_json::{json, Value};
use tower::ServiceExt;

/// Router over a fresh store, plus a handle on that store
fn create_test_app() -> (Router, Arc<BookStore>) {
    let store = Arc::new(BookStore::new());
    let mut registry = ModuleRegistry::new();
    registry.register(Arc::new(BooksModule::new(store.clone())));

    let app = bookshelf_http::build_router(&registry, &Settings::default());
    (app, store)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, value)
}

fn complete_book(name: &str) -> Value {
    json!({
        "name": name,
        "year": 2010,
        "author": "John Doe",
        "summary": "Lorem ipsum dolor sit amet",
        "publisher": "Dicoding Indonesia",
        "pageCount": 100,
        "readPage": 25,
        "reading": false
    })
}

async fn add_book(app: &Router, body: Value) -> String {
    let (status, body) = send(app, Method::POST, "/books", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"]["bookId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_check() {
    let (app, _store) = create_test_app();

    let (status, body) = send(&app, Method::GET, "/healthz", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");

    let (status, body) = send(&app, Method::GET, "/books/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "books module is healthy");
}

#[tokio::test]
async fn test_add_book_with_complete_data() {
    let (app, _store) = create_test_app();

    let (status, body) = send(&app, Method::POST, "/books", Some(complete_book("A"))).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "book added successfully");
    assert_eq!(body["data"]["bookId"].as_str().unwrap().len(), 16);
}

#[tokio::test]
async fn test_add_book_without_name() {
    let (app, store) = create_test_app();
    let mut payload = complete_book("A");
    payload.as_object_mut().unwrap().remove("name");

    let (status, body) = send(&app, Method::POST, "/books", Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"status": "fail", "message": "cannot add book: name is required"})
    );

    let (status, _) = send(&app, Method::POST, "/books", Some(complete_book(""))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_add_book_with_read_page_over_page_count() {
    let (app, store) = create_test_app();
    let mut payload = complete_book("A");
    payload["readPage"] = json!(101);

    let (status, body) = send(&app, Method::POST, "/books", Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "fail");
    assert_eq!(
        body["message"],
        "cannot add book: readPage must not exceed pageCount"
    );
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_malformed_body_is_a_fail_response() {
    let (app, store) = create_test_app();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/books")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "fail");
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_get_detail_matches_input() {
    let (app, _store) = create_test_app();
    let id = add_book(&app, complete_book("A")).await;

    let (status, body) = send(&app, Method::GET, &format!("/books/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert!(body.get("message").is_none());

    let book = &body["data"]["book"];
    assert_eq!(book["id"], id.as_str());
    assert_eq!(book["name"], "A");
    assert_eq!(book["year"], 2010);
    assert_eq!(book["author"], "John Doe");
    assert_eq!(book["summary"], "Lorem ipsum dolor sit amet");
    assert_eq!(book["publisher"], "Dicoding Indonesia");
    assert_eq!(book["pageCount"], 100);
    assert_eq!(book["readPage"], 25);
    assert_eq!(book["reading"], false);
    assert_eq!(book["finished"], false);
    assert_eq!(book["insertedAt"], book["updatedAt"]);
    assert!(book["insertedAt"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn test_get_detail_with_invalid_id() {
    let (app, _store) = create_test_app();

    let (status, body) = send(&app, Method::GET, "/books/xxxxxxxxxxxxxxxx", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"status": "fail", "message": "book not found"}));
}

#[tokio::test]
async fn test_list_books_projection_in_creation_order() {
    let (app, _store) = create_test_app();

    let (status, body) = send(&app, Method::GET, "/books", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "success", "data": {"books": []}}));

    let first = add_book(&app, complete_book("First")).await;
    let second = add_book(&app, complete_book("Second")).await;

    let (status, body) = send(&app, Method::GET, "/books", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"]["books"],
        json!([
            {"id": first, "name": "First", "publisher": "Dicoding Indonesia"},
            {"id": second, "name": "Second", "publisher": "Dicoding Indonesia"}
        ])
    );
}

#[tokio::test]
async fn test_list_books_with_filters() {
    let (app, _store) = create_test_app();

    let mut reading = complete_book("Belajar DICODING");
    reading["reading"] = json!(true);
    add_book(&app, reading).await;

    let mut finished = complete_book("Rust Book");
    finished["readPage"] = json!(100);
    add_book(&app, finished).await;

    add_book(&app, complete_book("dicoding for beginners")).await;

    let names = |body: &Value| -> Vec<String> {
        body["data"]["books"]
            .as_array()
            .unwrap()
            .iter()
            .map(|book| book["name"].as_str().unwrap().to_string())
            .collect()
    };

    let (_, body) = send(&app, Method::GET, "/books?name=Dicoding", None).await;
    assert_eq!(
        names(&body),
        vec!["Belajar DICODING", "dicoding for beginners"]
    );

    let (_, body) = send(&app, Method::GET, "/books?reading=1", None).await;
    assert_eq!(names(&body), vec!["Belajar DICODING"]);

    let (_, body) = send(&app, Method::GET, "/books?reading=0", None).await;
    assert_eq!(names(&body), vec!["Rust Book", "dicoding for beginners"]);

    let (_, body) = send(&app, Method::GET, "/books?finished=1", None).await;
    assert_eq!(names(&body), vec!["Rust Book"]);

    let (_, body) = send(&app, Method::GET, "/books?finished=yes", None).await;
    assert_eq!(
        names(&body),
        vec!["Belajar DICODING", "dicoding for beginners"]
    );

    let (_, body) = send(&app, Method::GET, "/books?name=dicoding&reading=0", None).await;
    assert_eq!(names(&body), vec!["dicoding for beginners"]);
}

#[tokio::test]
async fn test_list_books_with_repeated_query_keys() {
    let (app, _store) = create_test_app();

    let mut reading = complete_book("Reading");
    reading["reading"] = json!(true);
    let reading_id = add_book(&app, reading).await;
    add_book(&app, complete_book("Shelved")).await;

    let (status, body) = send(&app, Method::GET, "/books?reading=1&reading=0", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(
        body["data"]["books"],
        json!([{"id": reading_id, "name": "Reading", "publisher": "Dicoding Indonesia"}])
    );

    let (status, body) = send(&app, Method::GET, "/books?name=shel&name=zzz&page=3", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["books"][0]["name"], "Shelved");
}

#[tokio::test]
async fn test_add_book_with_fractional_year_is_rejected() {
    let (app, store) = create_test_app();
    let mut payload = complete_book("A");
    payload["year"] = json!(2010.5);

    let (status, body) = send(&app, Method::POST, "/books", Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "fail");
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_update_book_with_complete_data() {
    let (app, _store) = create_test_app();
    let id = add_book(&app, complete_book("A")).await;
    let (_, before) = send(&app, Method::GET, &format!("/books/{id}"), None).await;

    let replacement = json!({
        "name": "A, second edition",
        "year": 2012,
        "author": "Jane Roe",
        "summary": "Revised",
        "publisher": "Another House",
        "pageCount": 250,
        "readPage": 250,
        "reading": true
    });
    let (status, body) = send(&app, Method::PUT, &format!("/books/{id}"), Some(replacement)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"status": "success", "message": "book updated successfully"})
    );

    let (_, after) = send(&app, Method::GET, &format!("/books/{id}"), None).await;
    let before = &before["data"]["book"];
    let after = &after["data"]["book"];
    assert_eq!(after["id"], before["id"]);
    assert_eq!(after["insertedAt"], before["insertedAt"]);
    assert!(after["updatedAt"].as_str().unwrap() >= before["updatedAt"].as_str().unwrap());
    assert_eq!(after["name"], "A, second edition");
    assert_eq!(after["year"], 2012);
    assert_eq!(after["author"], "Jane Roe");
    assert_eq!(after["summary"], "Revised");
    assert_eq!(after["publisher"], "Another House");
    assert_eq!(after["pageCount"], 250);
    assert_eq!(after["readPage"], 250);
    assert_eq!(after["reading"], true);
    assert_eq!(after["finished"], true);
}

#[tokio::test]
async fn test_update_book_validation_failures() {
    let (app, _store) = create_test_app();
    let id = add_book(&app, complete_book("A")).await;
    let uri = format!("/books/{id}");

    let mut nameless = complete_book("A");
    nameless.as_object_mut().unwrap().remove("name");
    let (status, body) = send(&app, Method::PUT, &uri, Some(nameless)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "cannot update book: name is required");

    let mut overread = complete_book("B");
    overread["readPage"] = json!(101);
    let (status, body) = send(&app, Method::PUT, &uri, Some(overread)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "cannot update book: readPage must not exceed pageCount"
    );

    let (_, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(body["data"]["book"]["name"], "A");
}

#[tokio::test]
async fn test_update_book_with_invalid_id_precedes_validation() {
    let (app, _store) = create_test_app();

    let (status, body) = send(&app, Method::PUT, "/books/unknown", Some(json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body,
        json!({"status": "fail", "message": "cannot update book: id not found"})
    );

    let (status, body) = send(
        &app,
        Method::PUT,
        "/books/unknown",
        Some(json!({"name": "A", "pageCount": -5})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "cannot update book: id not found");
}

#[tokio::test]
async fn test_delete_book() {
    let (app, store) = create_test_app();
    let keep_first = add_book(&app, complete_book("A")).await;
    let doomed = add_book(&app, complete_book("B")).await;
    let keep_last = add_book(&app, complete_book("C")).await;

    let (status, body) = send(&app, Method::DELETE, &format!("/books/{doomed}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"status": "success", "message": "book deleted successfully"})
    );
    assert_eq!(store.len().await, 2);

    let (_, body) = send(&app, Method::GET, "/books", None).await;
    let ids: Vec<&str> = body["data"]["books"]
        .as_array()
        .unwrap()
        .iter()
        .map(|book| book["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![keep_first.as_str(), keep_last.as_str()]);

    let (status, body) = send(&app, Method::DELETE, &format!("/books/{doomed}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body,
        json!({"status": "fail", "message": "cannot delete book: id not found"})
    );
}

#[tokio::test]
async fn test_finished_book_lifecycle() {
    let (app, _store) = create_test_app();

    let id = add_book(
        &app,
        json!({"name": "A", "pageCount": 100, "readPage": 100, "reading": false}),
    )
    .await;

    let (status, body) = send(&app, Method::GET, &format!("/books/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["book"]["finished"], true);

    let (status, _) = send(&app, Method::DELETE, &format!("/books/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::GET, &format!("/books/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "fail");
}

#[tokio::test]
async fn test_unknown_route_uses_fail_envelope() {
    let (app, _store) = create_test_app();

    let (status, body) = send(&app, Method::GET, "/shelves", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"status": "fail", "message": "route not found"}));
}

#[tokio::test]
async fn test_openapi_document_lists_book_paths() {
    let (app, _store) = create_test_app();

    let (status, body) = send(&app, Method::GET, "/docs/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/books"]["post"].is_object());
    assert!(body["paths"]["/books/{id}"]["delete"].is_object());
    assert!(body["components"]["schemas"]["Book"].is_object());
}
