//! campus-admin — administrative backend for the admissions inbox and the
//! diploma student-tracking portal.
//!
//! The interesting part is the lead unification layer: six heterogeneous
//! source tables (applications, course pre-registrations, inquiries, school
//! leads, university partners, workshop reservations) are normalized into a
//! single `leads` entity with an append-only `lead_events` audit trail.
//! Everything else is thin axum plumbing over sqlx.

pub mod api;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod mailer;
pub mod models;
pub mod registry;
pub mod sources;
