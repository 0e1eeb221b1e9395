//! JSON REST API for the stock-study tracker.
//!
//! Exposes axum [`Router`]s backed by a [`StudyService`] over any
//! [`StudyStore`]. Authentication is the caller's responsibility: protected
//! handlers read the caller's id from a [`CurrentUser`] request extension.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let api = stockstudy_api::public_router(service.clone())
//!   .merge(stockstudy_api::api_router(service).route_layer(auth_layer));
//! Router::new().nest("/api", api)
//! ```
//!
//! # Routes
//!
//! | Method   | Path                                 | Notes |
//! |----------|--------------------------------------|-------|
//! | `POST`   | `/users`                             | public; registration |
//! | `POST`   | `/login`                             | public; stamps last login |
//! | `GET`    | `/me`                                | |
//! | `GET`    | `/studies`                           | dashboard rows |
//! | `POST`   | `/studies`                           | 201 with id and invite code |
//! | `POST`   | `/studies/join`                      | `{"invite_code": "..."}` |
//! | `GET`    | `/studies/{id}`                      | study with member count |
//! | `DELETE` | `/studies/{id}`                      | owner only |
//! | `POST`   | `/studies/{id}/leave`                | |
//! | `GET`    | `/studies/{id}/members`              | |
//! | `GET`    | `/studies/{id}/members/me`           | |
//! | `GET`    | `/studies/{id}/plans`                | |
//! | `GET`    | `/studies/{id}/submissions`          | `?user_id=`, defaults to caller |
//! | `POST`   | `/studies/{id}/progress`             | recompute caller's rate |
//! | `GET`    | `/plans/{id}/assignments`            | |
//! | `GET`    | `/plans/{id}/submissions`            | |
//! | `GET`    | `/plans/{id}/submissions/me`         | |
//! | `POST`   | `/submissions`                       | upsert |
//! | `GET`    | `/submissions/{id}/comments`         | |
//! | `POST`   | `/submissions/{id}/comments`         | |
//! | `PATCH`  | `/comments/{id}`                     | author only |
//! | `DELETE` | `/comments/{id}`                     | author only |

pub mod caller;
pub mod comments;
pub mod error;
pub mod plans;
pub mod studies;
pub mod submissions;
pub mod users;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, patch, post},
};
use stockstudy_core::{StudyService, store::StudyStore};

pub use caller::CurrentUser;
pub use error::ApiError;

/// Shared handler state.
pub type Service<S> = Arc<StudyService<S>>;

/// Routes that require an authenticated [`CurrentUser`].
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(service: Service<S>) -> Router<()>
where
  S: StudyStore + 'static,
{
  Router::new()
    .route("/me", get(users::me::<S>))
    // Studies
    .route("/studies", get(studies::list::<S>).post(studies::create::<S>))
    .route("/studies/join", post(studies::join::<S>))
    .route(
      "/studies/{id}",
      get(studies::get_one::<S>).delete(studies::delete_one::<S>),
    )
    .route("/studies/{id}/leave", post(studies::leave::<S>))
    .route("/studies/{id}/members", get(studies::members::<S>))
    .route("/studies/{id}/members/me", get(studies::my_membership::<S>))
    .route("/studies/{id}/plans", get(studies::plans::<S>))
    .route("/studies/{id}/submissions", get(studies::submissions::<S>))
    .route("/studies/{id}/progress", post(studies::refresh_progress::<S>))
    // Plans
    .route("/plans/{id}/assignments", get(plans::assignments::<S>))
    .route("/plans/{id}/submissions", get(plans::submissions::<S>))
    .route("/plans/{id}/submissions/me", get(plans::my_submission::<S>))
    // Submissions & comments
    .route("/submissions", post(submissions::create::<S>))
    .route(
      "/submissions/{id}/comments",
      get(comments::list::<S>).post(comments::create::<S>),
    )
    .route(
      "/comments/{id}",
      patch(comments::update::<S>).delete(comments::delete_one::<S>),
    )
    .with_state(service)
}

/// Routes reachable without credentials: registration and login.
pub fn public_router<S>(service: Service<S>) -> Router<()>
where
  S: StudyStore + 'static,
{
  Router::new()
    .route("/users", post(users::register::<S>))
    .route("/login", post(users::login::<S>))
    .with_state(service)
}
