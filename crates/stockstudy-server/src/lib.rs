//! HTTP server for the stock-study tracker.
//!
//! Wraps the [`stockstudy_api`] routers with Basic authentication, request
//! tracing and a health check route. The store is chosen by the binary.

pub mod auth;
pub mod error;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, middleware, routing::get};
use serde::Deserialize;
use stockstudy_core::{StudyService, store::StudyStore};
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `STOCKSTUDY_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  /// Realm named in the `WWW-Authenticate` challenge.
  #[serde(default = "default_realm")]
  pub realm:      String,
}

fn default_realm() -> String { "stockstudy".to_owned() }

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state for the auth layer.
pub struct AppState<S> {
  pub service: Arc<StudyService<S>>,
  pub config:  Arc<ServerConfig>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      service: Arc::clone(&self.service),
      config:  Arc::clone(&self.config),
    }
  }
}

impl<S> AppState<S> {
  pub fn new(service: StudyService<S>, config: ServerConfig) -> Self {
    Self {
      service: Arc::new(service),
      config:  Arc::new(config),
    }
  }

  pub(crate) fn unauthorized(&self) -> Error {
    Error::Unauthorized { realm: self.config.realm.clone() }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router.
///
/// `/api/users` and `/api/login` are public; every other `/api` route needs
/// Basic credentials of a registered user.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: StudyStore + 'static,
{
  let protected = stockstudy_api::api_router(Arc::clone(&state.service))
    .route_layer(middleware::from_fn_with_state(
      state.clone(),
      auth::require_user::<S>,
    ));
  let api = stockstudy_api::public_router(Arc::clone(&state.service))
    .merge(protected);

  Router::new()
    .route("/health", get(|| async { "ok" }))
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use base64::Engine as _;
  use base64::engine::general_purpose::STANDARD as B64;
  use serde_json::{Value, json};
  use stockstudy_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  async fn app() -> Router {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let state = AppState::new(StudyService::new(store), ServerConfig {
      host:       "127.0.0.1".to_string(),
      port:       8080,
      store_path: PathBuf::from(":memory:"),
      realm:      "test".to_string(),
    });
    router(state)
  }

  struct Reply {
    status:  StatusCode,
    headers: axum::http::HeaderMap,
    body:    Value,
  }

  async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    auth: Option<(&str, &str)>,
    body: Option<Value>,
  ) -> Reply {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some((user, pass)) = auth {
      let encoded = B64.encode(format!("{user}:{pass}"));
      builder = builder.header(header::AUTHORIZATION, format!("Basic {encoded}"));
    }
    let req = match body {
      Some(v) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(v.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    let body = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
    };
    Reply { status, headers, body }
  }

  async fn register(app: &Router, name: &str) -> String {
    let reply = send(
      app,
      "POST",
      "/api/users",
      None,
      Some(json!({
        "username": name,
        "email": format!("{name}@example.com"),
        "password": "password123",
      })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED, "{:?}", reply.body);
    assert!(reply.body.get("password_hash").is_none());
    reply.body["user_id"].as_str().unwrap().to_owned()
  }

  #[tokio::test]
  async fn health_is_public() {
    let app = app().await;
    let reply = send(&app, "GET", "/health", None, None).await;
    assert_eq!(reply.status, StatusCode::OK);
  }

  #[tokio::test]
  async fn protected_routes_challenge_without_credentials() {
    let app = app().await;
    let reply = send(&app, "GET", "/api/studies", None, None).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    let challenge = reply.headers[header::WWW_AUTHENTICATE].to_str().unwrap();
    assert!(challenge.starts_with("Basic realm=\"test\""), "{challenge}");

    register(&app, "alice").await;
    let reply = send(
      &app,
      "GET",
      "/api/me",
      Some(("alice", "not-the-password")),
      None,
    )
    .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn login_and_duplicate_registration() {
    let app = app().await;
    let id = register(&app, "alice").await;

    let reply = send(
      &app,
      "POST",
      "/api/login",
      None,
      Some(json!({ "login": "alice@example.com", "password": "password123" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["user_id"], id);
    assert!(reply.body["last_login_at"].is_string());

    let reply = send(
      &app,
      "POST",
      "/api/users",
      None,
      Some(json!({
        "username": "alice",
        "email": "other@example.com",
        "password": "password123",
      })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CONFLICT);
    assert!(reply.body["error"].as_str().unwrap().contains("username"));
  }

  #[tokio::test]
  async fn study_flow_end_to_end() {
    let app = app().await;
    let alice_id = register(&app, "alice").await;
    let bob_id = register(&app, "bob").await;
    let alice = Some(("alice", "password123"));
    let bob = Some(("bob", "password123"));

    // Create
    let reply = send(
      &app,
      "POST",
      "/api/studies",
      alice,
      Some(json!({
        "name": "Moat hunters",
        "book_title": "Common Stocks and Uncommon Profits",
        "start_date": "2026-03-02",
        "end_date": "2026-03-16",
        "max_members": 2,
      })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED, "{:?}", reply.body);
    let study_id = reply.body["study_id"].as_str().unwrap().to_owned();
    let code = reply.body["invite_code"].as_str().unwrap().to_owned();
    assert_eq!(code.len(), 8);

    // Join, then join again
    let join = json!({ "invite_code": code.to_lowercase() });
    let reply = send(&app, "POST", "/api/studies/join", bob, Some(join.clone())).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["study_id"], study_id.as_str());
    let reply = send(&app, "POST", "/api/studies/join", bob, Some(join)).await;
    assert_eq!(reply.status, StatusCode::CONFLICT);

    let reply = send(&app, "GET", &format!("/api/studies/{study_id}"), bob, None).await;
    assert_eq!(reply.body["member_count"], 2);

    // Day 1 submission
    let reply =
      send(&app, "GET", &format!("/api/studies/{study_id}/plans"), bob, None).await;
    let plans = reply.body.as_array().unwrap();
    assert_eq!(plans.len(), 15);
    let plan_id = plans[0]["plan_id"].as_str().unwrap().to_owned();

    let reply = send(
      &app,
      "GET",
      &format!("/api/plans/{plan_id}/assignments"),
      bob,
      None,
    )
    .await;
    let answers: Vec<Value> = reply
      .body
      .as_array()
      .unwrap()
      .iter()
      .map(|a| {
        json!({
          "assignment_id": a["assignment_id"],
          "question_text": a["question_text"],
          "answer_text": if a["is_required"] == true { "my answer" } else { "" },
          "is_required": a["is_required"],
        })
      })
      .collect();
    let reply = send(
      &app,
      "POST",
      "/api/submissions",
      bob,
      Some(json!({
        "plan_id": plan_id,
        "study_id": study_id,
        "day_number": 1,
        "answers": answers,
      })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK, "{:?}", reply.body);
    assert_eq!(reply.body["progress_rate"], 7);
    let submission_id = reply.body["submission"]["submission_id"]
      .as_str()
      .unwrap()
      .to_owned();

    let reply = send(
      &app,
      "GET",
      &format!("/api/studies/{study_id}/submissions?user_id={bob_id}"),
      alice,
      None,
    )
    .await;
    assert_eq!(reply.body.as_array().unwrap().len(), 1);

    // Comments
    let reply = send(
      &app,
      "POST",
      &format!("/api/submissions/{submission_id}/comments"),
      alice,
      Some(json!({ "study_id": study_id, "content": "Solid thesis" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED);
    let comment_id = reply.body["comment_id"].as_str().unwrap().to_owned();

    let reply = send(
      &app,
      "PATCH",
      &format!("/api/comments/{comment_id}"),
      bob,
      Some(json!({ "content": "hijacked" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);

    let reply = send(
      &app,
      "GET",
      &format!("/api/submissions/{submission_id}/comments"),
      bob,
      None,
    )
    .await;
    let comments = reply.body.as_array().unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["username"], "alice");
    assert_eq!(comments[0]["user_id"], alice_id.as_str());

    // Leaving and deleting
    let reply = send(&app, "DELETE", &format!("/api/studies/{study_id}"), bob, None).await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    let reply =
      send(&app, "POST", &format!("/api/studies/{study_id}/leave"), alice, None).await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    let reply =
      send(&app, "POST", &format!("/api/studies/{study_id}/leave"), bob, None).await;
    assert_eq!(reply.status, StatusCode::NO_CONTENT);

    let reply = send(&app, "DELETE", &format!("/api/studies/{study_id}"), alice, None).await;
    assert_eq!(reply.status, StatusCode::NO_CONTENT);
    let reply = send(&app, "GET", &format!("/api/studies/{study_id}"), alice, None).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn invalid_input_is_bad_request() {
    let app = app().await;
    register(&app, "alice").await;
    let reply = send(
      &app,
      "POST",
      "/api/studies",
      Some(("alice", "password123")),
      Some(json!({
        "name": "Too big",
        "book_title": "Anything",
        "start_date": "2026-03-02",
        "end_date": "2026-03-16",
        "max_members": 500,
      })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(reply.body["error"].is_string());
  }
}
