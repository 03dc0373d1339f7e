use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, Item, RouteEntry, ACTIONS};
use serde_json::Value;
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn body_request(method: &str, uri: &str, content_type: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, content_type)
        .body(body.to_string())
        .unwrap()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

// --- routes ---

#[tokio::test]
async fn routes_lists_every_action() {
    let resp = app()
        .oneshot(body_request("POST", "/api/routes", "application/x-www-form-urlencoded", ""))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let routes: Vec<RouteEntry> = body_json(resp).await;
    let actions: Vec<&str> = routes.iter().map(|r| r.action.as_str()).collect();
    assert_eq!(actions, ACTIONS);
}

#[tokio::test]
async fn routes_rejects_get() {
    let resp = app().oneshot(get("/api/routes")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// --- users ---

#[tokio::test]
async fn get_user_by_numeric_id() {
    let resp = app().oneshot(get("/api/users/42")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let user: Value = body_json(resp).await;
    assert_eq!(user["id"], 42);
    assert_eq!(user["name"], "user-42");
}

#[tokio::test]
async fn get_user_non_numeric_is_404() {
    let resp = app().oneshot(get("/api/users/abc")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- echo ---

#[tokio::test]
async fn echo_reports_query_and_headers() {
    let req = Request::builder()
        .uri("/api/echo/a/b?x=1&y=2")
        .header("x-trace", "t1")
        .header(http::header::AUTHORIZATION, "Basic dTpw")
        .body(String::new())
        .unwrap();
    let resp = app().oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echo: Value = body_json(resp).await;
    assert_eq!(echo["method"], "GET");
    assert_eq!(echo["path"], "/api/echo/a/b");
    assert_eq!(echo["query"], "x=1&y=2");
    assert_eq!(echo["headers"]["x-trace"], "t1");
    assert_eq!(echo["authorization"], "Basic dTpw");
    assert_eq!(echo["body"], "");
}

#[tokio::test]
async fn echo_reports_body_and_content_type() {
    let resp = app()
        .oneshot(body_request("PATCH", "/api/echo", "application/json", r#"{"a":1}"#))
        .await
        .unwrap();

    let echo: Value = body_json(resp).await;
    assert_eq!(echo["method"], "PATCH");
    assert_eq!(echo["content_type"], "application/json");
    assert_eq!(echo["body"], r#"{"a":1}"#);
    assert!(echo["query"].is_null());
}

// --- fail ---

#[tokio::test]
async fn fail_returns_500() {
    let resp = app().oneshot(get("/api/fail")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_bytes(resp).await, "mock failure");
}

// --- items ---

#[tokio::test]
async fn create_item_unknown_content_type_is_422() {
    let resp = app()
        .oneshot(body_request("POST", "/api/items", "text/plain", "name=box"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn get_item_bad_uuid_returns_400() {
    let resp = app().oneshot(get("/api/items/not-a-uuid")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn items_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    // create from a form body
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(body_request(
            "POST",
            "/api/items",
            "application/x-www-form-urlencoded",
            "name=crate&qty=4",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Item = body_json(resp).await;
    assert_eq!(created.name, "crate");
    assert_eq!(created.qty, 4);

    // create from a JSON body
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(body_request(
            "POST",
            "/api/items",
            "application/json",
            r#"{"name":"pallet"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    // list
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/api/items"))
        .await
        .unwrap();
    let items: Vec<Item> = body_json(resp).await;
    assert_eq!(items.len(), 2);

    // get
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get(&format!("/api/items/{}", created.id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched: Item = body_json(resp).await;
    assert_eq!(fetched.id, created.id);
}
