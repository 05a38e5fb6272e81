//! Router assembly and shared application state.

pub mod inbox_routes;
pub mod staff_routes;
pub mod student_routes;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::middleware as axum_mw;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::{request_context, staff_auth, TokenVerifier};
use crate::mailer::{IdentityProvider, Mailer};
use crate::registry::StatusRegistry;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub registry: Arc<StatusRegistry>,
    pub verifier: Arc<dyn TokenVerifier>,
    pub mailer: Option<Arc<dyn Mailer>>,
    pub idp: Option<Arc<dyn IdentityProvider>>,
}

/// Build the full router: public health probe plus the staff-gated API,
/// wrapped in request-id, trace, and CORS layers.
pub fn build_router(state: AppState, cors_allow_origin: Option<&str>) -> Router {
    let protected = Router::new()
        .route("/inbox", get(inbox_routes::list_inbox))
        .route(
            "/inbox/:source_table/:source_id",
            get(inbox_routes::inbox_detail).patch(inbox_routes::patch_inbox),
        )
        .route(
            "/inbox/:source_table/:source_id/note",
            post(inbox_routes::add_note),
        )
        .route(
            "/inbox/:source_table/:source_id/reply",
            post(inbox_routes::reply),
        )
        .route("/students", get(student_routes::list_students))
        .route(
            "/students/:id",
            get(student_routes::student_detail).patch(student_routes::patch_student),
        )
        .route("/staff", get(staff_routes::list_staff))
        .route("/staff/invite", post(staff_routes::invite_staff))
        .route("/staff/:user_id", patch(staff_routes::patch_staff))
        .layer(axum_mw::from_fn_with_state(state.clone(), staff_auth));

    let cors = match cors_allow_origin.and_then(|o| o.parse::<HeaderValue>().ok()) {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers(Any),
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    };

    Router::new()
        .route("/health", get(health))
        .merge(protected)
        .layer(axum_mw::from_fn(request_context))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
