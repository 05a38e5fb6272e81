//! Request-context and staff-gate middleware.

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use crate::api::AppState;
use crate::database::StaffRepository;
use crate::error::ApiError;
use crate::models::{staff_role, Staff};

use super::verifier::Claims;

/// Correlation id assigned to every request.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// The staff member acting on this request, resolved by the gate.
#[derive(Debug, Clone)]
pub struct CurrentStaff(pub Staff);

impl CurrentStaff {
    pub fn user_id(&self) -> Uuid {
        self.0.user_id
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.0.role == staff_role::ADMIN {
            Ok(())
        } else {
            Err(ApiError::Forbidden("admin role required".into()))
        }
    }
}

/// Assigns a request id, echoes it as `x-request-id`, and stamps it into the
/// JSON error envelope. Error bodies are small, so buffering them here to
/// inject the id is fine.
pub async fn request_context(mut req: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    req.extensions_mut().insert(RequestId(request_id.clone()));

    let mut res = next.run(req).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        res.headers_mut().insert("x-request-id", value);
    }

    if res.status().is_client_error() || res.status().is_server_error() {
        return stamp_error_body(res, &request_id).await;
    }
    res
}

async fn stamp_error_body(res: Response, request_id: &str) -> Response {
    let (mut parts, body) = res.into_parts();
    let bytes = match axum::body::to_bytes(body, 64 * 1024).await {
        Ok(bytes) => bytes,
        Err(_) => return (parts, Body::empty()).into_response(),
    };

    if let Ok(mut value) = serde_json::from_slice::<serde_json::Value>(&bytes) {
        if let Some(error) = value.get_mut("error").and_then(|e| e.as_object_mut()) {
            error.insert("requestId".into(), request_id.into());
            let body = serde_json::to_vec(&value).unwrap_or_else(|_| bytes.to_vec());
            parts.headers.remove(axum::http::header::CONTENT_LENGTH);
            return (parts, Body::from(body)).into_response();
        }
    }
    (parts, Body::from(bytes)).into_response()
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| ApiError::Auth("missing Authorization header".into()))?
        .to_str()
        .map_err(|_| ApiError::Auth("malformed Authorization header".into()))?;
    header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Auth("Authorization header must be a bearer token".into()))
}

/// Verify the bearer token and resolve it to an active staff row; the row is
/// made available to handlers as a [`CurrentStaff`] extension.
pub async fn staff_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers())?;
    let claims = state.verifier.verify(token).await?;
    let staff = resolve_staff(&StaffRepository::new(state.pool.clone()), &claims).await?;
    req.extensions_mut().insert(CurrentStaff(staff));
    Ok(next.run(req).await)
}

/// Staff gate. Lookup order: token subject first, then normalized email with
/// auto-link-on-first-login — the subject is written back onto a matched row
/// that was never linked. A row already linked to a different subject is not
/// taken over.
pub async fn resolve_staff(repo: &StaffRepository, claims: &Claims) -> Result<Staff, ApiError> {
    let staff = match repo.find_by_subject(&claims.sub).await? {
        Some(staff) => staff,
        None => {
            let email = claims
                .email()
                .ok_or_else(|| ApiError::Forbidden("no staff record for this identity".into()))?;
            let staff = repo
                .find_by_email(email)
                .await?
                .ok_or_else(|| ApiError::Forbidden("no staff record for this identity".into()))?;
            match staff.auth_subject.as_deref() {
                None => {
                    repo.link_subject(staff.user_id, &claims.sub).await?;
                    tracing::info!(user_id = %staff.user_id, "linked staff row to auth subject on first login");
                    staff
                }
                Some(_) => {
                    return Err(ApiError::Forbidden(
                        "staff record is linked to a different identity".into(),
                    ))
                }
            }
        }
    };

    if !staff.active {
        return Err(ApiError::Forbidden("staff record is inactive".into()));
    }
    Ok(staff)
}
