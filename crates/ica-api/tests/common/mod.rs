//! In-process mock of the ICA handla API
//!
//! Runs an axum server on 127.0.0.1:0 on its own runtime thread, so both
//! the blocking client and the async adapter can talk to it over real HTTP.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

pub const TICKET: &str = "ticket-123";

/// How the mock answers `login`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginMode {
    Ok,
    Unauthorized,
    NoTicket,
}

/// Shared state of the mock remote
pub struct MockState {
    pub logins: AtomicUsize,
    /// Authenticated requests that arrived without the ticket
    pub ticket_misses: AtomicUsize,
    pub login_mode: Mutex<LoginMode>,
    /// Status to answer list reads with, instead of the lists
    pub lists_status: Mutex<Option<u16>>,
    pub lists: Mutex<Vec<Value>>,
    pub sync_bodies: Mutex<Vec<Value>>,
    pub created_bodies: Mutex<Vec<Value>>,
    pub request_ids: Mutex<Vec<String>>,
    pub authorizations: Mutex<Vec<String>>,
    /// Answer for `user/commonarticles`; `None` omits the key
    pub common_articles: Mutex<Option<Value>>,
    next_id: AtomicUsize,
}

impl MockState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            logins: AtomicUsize::new(0),
            ticket_misses: AtomicUsize::new(0),
            login_mode: Mutex::new(LoginMode::Ok),
            lists_status: Mutex::new(None),
            lists: Mutex::new(Vec::new()),
            sync_bodies: Mutex::new(Vec::new()),
            created_bodies: Mutex::new(Vec::new()),
            request_ids: Mutex::new(Vec::new()),
            authorizations: Mutex::new(Vec::new()),
            common_articles: Mutex::new(None),
            next_id: AtomicUsize::new(100),
        })
    }

    /// A remote holding one list
    pub fn with_list(id: i64, offline_id: &str, title: &str, rows: Value) -> Arc<Self> {
        let state = Self::new();
        state.lists.lock().unwrap().push(json!({
            "Id": id,
            "OfflineId": offline_id,
            "Title": title,
            "CommentText": "",
            "SortingStore": 0,
            "Rows": rows,
        }));
        state
    }

    pub fn logins(&self) -> usize {
        self.logins.load(Ordering::SeqCst)
    }

    pub fn ticket_misses(&self) -> usize {
        self.ticket_misses.load(Ordering::SeqCst)
    }

    pub fn set_login_mode(&self, mode: LoginMode) {
        *self.login_mode.lock().unwrap() = mode;
    }

    pub fn fail_lists_with(&self, status: u16) {
        *self.lists_status.lock().unwrap() = Some(status);
    }

    pub fn set_common_articles(&self, articles: Value) {
        *self.common_articles.lock().unwrap() = Some(articles);
    }

    pub fn sync_bodies(&self) -> Vec<Value> {
        self.sync_bodies.lock().unwrap().clone()
    }
}

type Shared = Arc<MockState>;

/// Start the mock and return its base URL
pub fn spawn(state: Shared) -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            axum::serve(listener, app(state)).await
        })
        .unwrap();
    });

    format!("http://{addr}/api/")
}

/// A base URL nothing listens on
pub fn closed_base_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/api/")
}

fn app(state: Shared) -> Router {
    Router::new()
        .route("/api/login", get(login))
        .route(
            "/api/user/offlineshoppinglists",
            get(list_lists).post(create_list),
        )
        .route(
            "/api/user/offlineshoppinglists/{offline_id}",
            get(get_list).delete(delete_list),
        )
        .route(
            "/api/user/offlineshoppinglists/{offline_id}/sync",
            post(sync_list),
        )
        .route("/api/user/stores", get(favorite_stores))
        .route("/api/stores/{id}", get(get_store))
        .route("/api/user/commonarticles", get(common_articles))
        .route("/api/offers", get(offers))
        .route("/api/articles/articlegroups", get(article_groups))
        .route("/api/recipes/random", get(random_recipes))
        .with_state(state)
}

fn authorize(state: &MockState, headers: &HeaderMap) -> Result<(), StatusCode> {
    if let Some(id) = headers.get("X-Request-Id").and_then(|v| v.to_str().ok()) {
        state.request_ids.lock().unwrap().push(id.to_string());
    }
    match headers.get("AuthenticationTicket").and_then(|v| v.to_str().ok()) {
        Some(TICKET) => Ok(()),
        _ => {
            state.ticket_misses.fetch_add(1, Ordering::SeqCst);
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

async fn login(State(state): State<Shared>, headers: HeaderMap) -> Response {
    state.logins.fetch_add(1, Ordering::SeqCst);
    if let Some(auth) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
        state.authorizations.lock().unwrap().push(auth.to_string());
    }

    match *state.login_mode.lock().unwrap() {
        LoginMode::Ok => (StatusCode::OK, [("AuthenticationTicket", TICKET)]).into_response(),
        LoginMode::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        LoginMode::NoTicket => StatusCode::OK.into_response(),
    }
}

fn lists_status(state: &MockState) -> Result<(), StatusCode> {
    match *state.lists_status.lock().unwrap() {
        Some(code) => Err(StatusCode::from_u16(code).unwrap()),
        None => Ok(()),
    }
}

async fn list_lists(
    State(state): State<Shared>,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    authorize(&state, &headers)?;
    lists_status(&state)?;

    let summaries: Vec<Value> = state
        .lists
        .lock()
        .unwrap()
        .iter()
        .map(|list| {
            let mut summary = list.clone();
            summary["Rows"] = json!([]);
            summary
        })
        .collect();
    Ok(Json(json!({ "ShoppingLists": summaries })))
}

async fn get_list(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(offline_id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    authorize(&state, &headers)?;
    lists_status(&state)?;

    state
        .lists
        .lock()
        .unwrap()
        .iter()
        .find(|list| list["OfflineId"] == offline_id.as_str())
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn create_list(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    authorize(&state, &headers)?;
    state.created_bodies.lock().unwrap().push(body.clone());

    let id = state.next_id.fetch_add(1, Ordering::SeqCst);
    body["Id"] = json!(id);
    state.lists.lock().unwrap().push(body);
    Ok(Json(json!({ "Id": id })))
}

async fn delete_list(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(offline_id): Path<String>,
) -> StatusCode {
    if let Err(status) = authorize(&state, &headers) {
        return status;
    }
    let mut lists = state.lists.lock().unwrap();
    let before = lists.len();
    lists.retain(|list| list["OfflineId"] != offline_id.as_str());
    if lists.len() < before {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn sync_list(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(offline_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    authorize(&state, &headers)?;
    state.sync_bodies.lock().unwrap().push(body.clone());

    let mut lists = state.lists.lock().unwrap();
    let list = lists
        .iter_mut()
        .find(|list| list["OfflineId"] == offline_id.as_str())
        .ok_or(StatusCode::NOT_FOUND)?;

    let mut rows = list["Rows"].as_array().cloned().unwrap_or_default();
    if let Some(created) = body.get("CreatedRows").and_then(Value::as_array) {
        rows.extend(created.iter().cloned());
    }
    if let Some(changed) = body.get("ChangedRows").and_then(Value::as_array) {
        for change in changed {
            for row in rows.iter_mut() {
                if row["OfflineId"] == change["OfflineId"] {
                    row["IsStrikedOver"] = change["IsStrikedOver"].clone();
                }
            }
        }
    }
    if let Some(deleted) = body.get("DeletedRows").and_then(Value::as_array) {
        rows.retain(|row| !deleted.contains(&row["OfflineId"]));
    }
    list["Rows"] = Value::Array(rows);

    Ok(Json(json!({ "Id": list["Id"].clone() })))
}

async fn favorite_stores(
    State(state): State<Shared>,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    authorize(&state, &headers)?;
    Ok(Json(json!({ "FavoriteStores": [11, 22] })))
}

async fn common_articles(
    State(state): State<Shared>,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    authorize(&state, &headers)?;
    match state.common_articles.lock().unwrap().clone() {
        Some(articles) => Ok(Json(json!({ "CommonArticles": articles }))),
        None => Ok(Json(json!({}))),
    }
}

async fn get_store(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Value>, StatusCode> {
    authorize(&state, &headers)?;
    Ok(Json(json!({
        "Id": id,
        "MarketingName": format!("ICA Nära {}", id),
        "WebURL": "https://www.ica.se",
    })))
}

async fn offers(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, StatusCode> {
    authorize(&state, &headers)?;
    let stores = params.get("Stores").cloned().unwrap_or_default();
    let offers: Vec<Value> = stores
        .split(',')
        .filter(|id| !id.is_empty())
        .map(|id| json!({ "OfferId": format!("offer-{}", id), "StoreId": id.parse::<i64>().unwrap() }))
        .collect();
    Ok(Json(Value::Array(offers)))
}

async fn article_groups(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, StatusCode> {
    authorize(&state, &headers)?;
    if params.get("lastsyncdate").map(String::as_str) != Some("2001-01-01") {
        return Err(StatusCode::BAD_REQUEST);
    }
    Ok(Json(json!([
        { "Id": 1, "Name": "Frukt & Grönt" },
        { "Id": 9, "Name": "Mejeri" },
    ])))
}

async fn random_recipes(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, StatusCode> {
    authorize(&state, &headers)?;
    let count: i64 = params
        .get("numberofrecipes")
        .and_then(|n| n.parse().ok())
        .ok_or(StatusCode::BAD_REQUEST)?;
    let recipes: Vec<Value> = (0..count)
        .map(|id| json!({ "Id": id, "Title": format!("Recept {}", id), "YouTubeId": null }))
        .collect();
    Ok(Json(Value::Array(recipes)))
}
