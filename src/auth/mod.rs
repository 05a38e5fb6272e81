//! Authentication and staff gating.
//!
//! Token signature checking is delegated to a [`TokenVerifier`]; the staff
//! gate then maps the verified claims onto an active `campus.staff` row.

pub mod middleware;
pub mod verifier;

pub use middleware::{request_context, staff_auth, CurrentStaff, RequestId};
pub use verifier::{Claims, HsVerifier, JwksVerifier, TokenVerifier};
