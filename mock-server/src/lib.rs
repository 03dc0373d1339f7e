use std::{collections::HashMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    routing::{any, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;
use uuid::Uuid;

/// One entry of the action-routes registry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RouteEntry {
    pub action: String,
    pub description: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Item {
    pub id: Uuid,
    pub name: String,
    pub qty: u32,
}

#[derive(Deserialize)]
pub struct CreateItem {
    pub name: String,
    #[serde(default)]
    pub qty: u32,
}

pub type Db = Arc<RwLock<HashMap<Uuid, Item>>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/api/routes", post(list_routes))
        .route("/api/users/{id}", get(get_user))
        .route("/api/items", get(list_items).post(create_item))
        .route("/api/items/{id}", get(get_item))
        .route("/api/echo", any(echo))
        .route("/api/echo/{*rest}", any(echo))
        .route("/api/fail", get(fail))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Actions the registry lists.
pub const ACTIONS: [&str; 3] = ["users", "items", "echo"];

async fn list_routes() -> Json<Vec<RouteEntry>> {
    Json(
        ACTIONS
            .iter()
            .map(|action| RouteEntry {
                action: action.to_string(),
                description: format!("{action} endpoint"),
            })
            .collect(),
    )
}

async fn get_user(Path(id): Path<String>) -> Result<Json<Value>, StatusCode> {
    let id: u64 = id.parse().map_err(|_| StatusCode::NOT_FOUND)?;
    Ok(Json(json!({ "id": id, "name": format!("user-{id}") })))
}

async fn list_items(State(db): State<Db>) -> Json<Vec<Item>> {
    let items = db.read().await;
    Json(items.values().cloned().collect())
}

/// Accepts either a JSON or a form-encoded body.
async fn create_item(
    State(db): State<Db>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<Item>), StatusCode> {
    let input = parse_create_item(content_type(&headers), &body)
        .ok_or(StatusCode::UNPROCESSABLE_ENTITY)?;
    let item = Item {
        id: Uuid::new_v4(),
        name: input.name,
        qty: input.qty,
    };
    debug!(id = %item.id, name = %item.name, "item created");
    db.write().await.insert(item.id, item.clone());
    Ok((StatusCode::CREATED, Json(item)))
}

async fn get_item(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
) -> Result<Json<Item>, StatusCode> {
    let items = db.read().await;
    items.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

/// Describe the request back to the caller.
async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: String) -> Json<Value> {
    let extra: serde_json::Map<String, Value> = headers
        .iter()
        .filter(|(name, _)| name.as_str().starts_with("x-"))
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), Value::String(v.to_string())))
        })
        .collect();
    let header_str = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    Json(json!({
        "method": method.as_str(),
        "path": uri.path(),
        "query": uri.query(),
        "content_type": header_str(header::CONTENT_TYPE),
        "authorization": header_str(header::AUTHORIZATION),
        "headers": extra,
        "body": body,
    }))
}

async fn fail() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "mock failure")
}

fn content_type(headers: &HeaderMap) -> &str {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

fn parse_create_item(content_type: &str, body: &[u8]) -> Option<CreateItem> {
    if content_type.starts_with("application/json") {
        return serde_json::from_slice(body).ok();
    }
    if content_type.starts_with("application/x-www-form-urlencoded") {
        let mut name = None;
        let mut qty = 0;
        for (key, value) in url::form_urlencoded::parse(body) {
            match key.as_ref() {
                "name" => name = Some(value.into_owned()),
                "qty" => qty = value.parse().ok()?,
                _ => {}
            }
        }
        return Some(CreateItem { name: name?, qty });
    }
    None
}
