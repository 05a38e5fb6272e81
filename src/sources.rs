//! Source table allow-list and lead-kind mapping.
//!
//! The `:source_table` path segment is the only place a caller can name a
//! table, so membership in this closed set is the authorization boundary:
//! anything else is rejected with a client error before storage is touched.

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// The six tables the inbox is allowed to reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTable {
    Applications,
    CoursePreregistrations,
    Inquiries,
    SchoolLeads,
    UniversityPartners,
    WorkshopReservations,
}

/// Semantic tag stored on the lead, derived from the source table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadKind {
    Application,
    CoursePrereg,
    GeneralInquiry,
    SchoolLead,
    UniversityPartner,
    WorkshopReservation,
}

impl SourceTable {
    pub const ALL: [SourceTable; 6] = [
        SourceTable::Applications,
        SourceTable::CoursePreregistrations,
        SourceTable::Inquiries,
        SourceTable::SchoolLeads,
        SourceTable::UniversityPartners,
        SourceTable::WorkshopReservations,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SourceTable::Applications => "applications",
            SourceTable::CoursePreregistrations => "course_preregistrations",
            SourceTable::Inquiries => "inquiries",
            SourceTable::SchoolLeads => "school_leads",
            SourceTable::UniversityPartners => "university_partners",
            SourceTable::WorkshopReservations => "workshop_reservations",
        }
    }

    pub fn parse(s: &str) -> Option<SourceTable> {
        match s {
            "applications" => Some(SourceTable::Applications),
            "course_preregistrations" => Some(SourceTable::CoursePreregistrations),
            "inquiries" => Some(SourceTable::Inquiries),
            "school_leads" => Some(SourceTable::SchoolLeads),
            "university_partners" => Some(SourceTable::UniversityPartners),
            "workshop_reservations" => Some(SourceTable::WorkshopReservations),
            _ => None,
        }
    }

    /// Like [`parse`](Self::parse) but with the client error the handlers
    /// return for unknown tables.
    pub fn require(s: &str) -> Result<SourceTable, ApiError> {
        SourceTable::parse(s)
            .ok_or_else(|| ApiError::BadRequest(format!("unsupported source table '{s}'")))
    }

    pub fn kind(self) -> LeadKind {
        match self {
            SourceTable::Applications => LeadKind::Application,
            SourceTable::CoursePreregistrations => LeadKind::CoursePrereg,
            // The inquiries table kept its old name when the kind tags were
            // introduced in the admin UI; the divergence is load-bearing for
            // existing rows, do not rename either side.
            SourceTable::Inquiries => LeadKind::GeneralInquiry,
            SourceTable::SchoolLeads => LeadKind::SchoolLead,
            SourceTable::UniversityPartners => LeadKind::UniversityPartner,
            SourceTable::WorkshopReservations => LeadKind::WorkshopReservation,
        }
    }
}

impl LeadKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LeadKind::Application => "application",
            LeadKind::CoursePrereg => "course_prereg",
            LeadKind::GeneralInquiry => "general_inquiry",
            LeadKind::SchoolLead => "school_lead",
            LeadKind::UniversityPartner => "university_partner",
            LeadKind::WorkshopReservation => "workshop_reservation",
        }
    }

    pub fn parse(s: &str) -> Option<LeadKind> {
        match s {
            "application" => Some(LeadKind::Application),
            "course_prereg" => Some(LeadKind::CoursePrereg),
            "general_inquiry" => Some(LeadKind::GeneralInquiry),
            "school_lead" => Some(LeadKind::SchoolLead),
            "university_partner" => Some(LeadKind::UniversityPartner),
            "workshop_reservation" => Some(LeadKind::WorkshopReservation),
            _ => None,
        }
    }

    /// Inverse of [`SourceTable::kind`]; the mapping is one-to-one.
    pub fn source_table(self) -> SourceTable {
        match self {
            LeadKind::Application => SourceTable::Applications,
            LeadKind::CoursePrereg => SourceTable::CoursePreregistrations,
            LeadKind::GeneralInquiry => SourceTable::Inquiries,
            LeadKind::SchoolLead => SourceTable::SchoolLeads,
            LeadKind::UniversityPartner => SourceTable::UniversityPartners,
            LeadKind::WorkshopReservation => SourceTable::WorkshopReservations,
        }
    }
}

pub fn is_allowed_source(table: &str) -> bool {
    SourceTable::parse(table).is_some()
}
