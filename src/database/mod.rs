//! Repositories and services over the Postgres pool.
//!
//! Repositories hold the SQL; services hold the rules (idempotent lead
//! resolution, no-op suppression, event emission, source-row mirroring).

pub mod inbox_repository;
pub mod lead_repository;
pub mod lead_service;
pub mod source_repository;
pub mod staff_repository;
pub mod student_repository;

pub use inbox_repository::InboxRepository;
pub use lead_repository::LeadRepository;
pub use lead_service::LeadService;
pub use source_repository::SourceRepository;
pub use staff_repository::StaffRepository;
pub use student_repository::StudentRepository;
