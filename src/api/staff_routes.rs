//! Staff administration routes, all admin-gated.
//!
//! GET   /staff           — list staff
//! POST  /staff/invite    — create a staff row, optionally provision a login
//!                          and email a password-set link
//! PATCH /staff/:user_id  — role / active / display name changes

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::CurrentStaff;
use crate::database::staff_repository::{is_unique_violation, StaffRepository};
use crate::error::ApiError;
use crate::mailer::OutgoingEmail;
use crate::models::{staff_role, Staff};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct InviteBody {
    pub email: String,
    pub display_name: String,
    pub role: Option<String>,
}

/// Outcome of the optional password-set email. The invite itself never
/// fails because of the email leg.
#[derive(Debug, Default, Serialize)]
pub struct InviteEmailOutcome {
    pub requested: bool,
    pub ok: bool,
    pub skipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InviteResponse {
    pub staff: Staff,
    pub email: InviteEmailOutcome,
}

#[derive(Debug, Deserialize)]
pub struct PatchStaffBody {
    pub role: Option<String>,
    pub active: Option<bool>,
    pub display_name: Option<String>,
}

pub async fn list_staff(
    State(state): State<AppState>,
    Extension(staff): Extension<CurrentStaff>,
) -> Result<Json<Vec<Staff>>, ApiError> {
    staff.require_admin()?;
    Ok(Json(StaffRepository::new(state.pool.clone()).list().await?))
}

pub async fn invite_staff(
    State(state): State<AppState>,
    Extension(staff): Extension<CurrentStaff>,
    Json(body): Json<InviteBody>,
) -> Result<Json<InviteResponse>, ApiError> {
    staff.require_admin()?;

    let email = body.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::BadRequest("a valid email is required".into()));
    }
    if body.display_name.trim().is_empty() {
        return Err(ApiError::BadRequest("display_name is required".into()));
    }
    let role = body.role.as_deref().unwrap_or(staff_role::STAFF);
    if !staff_role::is_valid(role) {
        return Err(ApiError::BadRequest(format!("unknown role '{role}'")));
    }

    let repo = StaffRepository::new(state.pool.clone());
    let created = repo
        .create(&email, body.display_name.trim(), role)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::BadRequest(format!("staff with email '{email}' already exists"))
            } else {
                ApiError::Storage(e)
            }
        })?;

    let outcome = send_invite_email(&state, &created).await;
    Ok(Json(InviteResponse {
        staff: created,
        email: outcome,
    }))
}

/// Provision the login and send the password-set link. Failures land in the
/// outcome object; the created row stands regardless.
async fn send_invite_email(state: &AppState, staff: &Staff) -> InviteEmailOutcome {
    let (Some(idp), Some(mailer)) = (state.idp.as_ref(), state.mailer.as_ref()) else {
        return InviteEmailOutcome {
            requested: true,
            skipped: true,
            ..Default::default()
        };
    };

    let link = match idp.provision_user(&staff.email, &staff.display_name).await {
        Ok(_) => idp.password_set_link(&staff.email).await,
        Err(e) => Err(e),
    };
    let link = match link {
        Ok(link) => link,
        Err(e) => {
            tracing::warn!(email = %staff.email, error = %e, "identity provisioning failed for invite");
            return InviteEmailOutcome {
                requested: true,
                error: Some(e.to_string()),
                ..Default::default()
            };
        }
    };

    let mail = OutgoingEmail {
        to: staff.email.clone(),
        subject: "You have been invited to the admissions portal".into(),
        text: Some(format!(
            "Hello {},\n\nAn account has been created for you. \
             Set your password here:\n{}\n",
            staff.display_name, link
        )),
        html: None,
    };
    match mailer.send(&mail).await {
        Ok(receipt) => {
            tracing::info!(email = %staff.email, message_id = %receipt.message_id, "invite email sent");
            InviteEmailOutcome {
                requested: true,
                ok: true,
                ..Default::default()
            }
        }
        Err(e) => {
            tracing::warn!(email = %staff.email, error = %e, "invite email failed");
            InviteEmailOutcome {
                requested: true,
                error: Some(e.to_string()),
                ..Default::default()
            }
        }
    }
}

pub async fn patch_staff(
    State(state): State<AppState>,
    Extension(staff): Extension<CurrentStaff>,
    Path(user_id): Path<Uuid>,
    Json(body): Json<PatchStaffBody>,
) -> Result<Json<Staff>, ApiError> {
    staff.require_admin()?;

    if let Some(role) = body.role.as_deref() {
        if !staff_role::is_valid(role) {
            return Err(ApiError::BadRequest(format!("unknown role '{role}'")));
        }
    }
    if body.role.is_none() && body.active.is_none() && body.display_name.is_none() {
        return Err(ApiError::BadRequest(
            "at least one of role, active, display_name is required".into(),
        ));
    }

    let updated = StaffRepository::new(state.pool.clone())
        .update(
            user_id,
            body.role.as_deref(),
            body.active,
            body.display_name.as_deref(),
        )
        .await?
        .ok_or_else(|| ApiError::NotFound("staff not found".into()))?;
    Ok(Json(updated))
}
