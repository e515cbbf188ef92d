use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Teaching profile of an instructor account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instructor {
    pub id: Uuid,
    pub user_id: Uuid,
    /// University-issued staff number, unique across instructors.
    pub staff_no: String,
    pub dept_id: Uuid,
    pub title: String,
    pub office_location: Option<String>,
    pub office_hours: Option<String>,
}

/// An instructor joined with account and department fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstructorProfile {
    #[serde(flatten)]
    pub instructor: Instructor,
    pub username: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub dept_name: String,
}

/// Input for an administrative instructor update. All fields are optional
/// for partial updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateInstructorInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub dept_id: Option<Uuid>,
    pub title: Option<String>,
    pub office_location: Option<String>,
    pub office_hours: Option<String>,
}
