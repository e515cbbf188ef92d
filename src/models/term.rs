use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An academic term (semester). At most one term is active at a time; new
/// enrollments are taken against sections of the active term. The single
/// active term is enforced by a schema constraint, not by convention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Term {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub registration_start: Option<NaiveDate>,
    pub registration_end: Option<NaiveDate>,
    pub is_active: bool,
}

/// Input for creating a term. Terms are created inactive and switched in
/// with [`crate::db::Database::set_active_term`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTermInput {
    pub code: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub registration_start: Option<NaiveDate>,
    pub registration_end: Option<NaiveDate>,
}
