use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Academic profile of a student account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub id: Uuid,
    pub user_id: Uuid,
    /// University-issued student number, unique across students.
    pub student_no: String,
    pub college: String,
    pub major: String,
    pub year_of_study: i32,
    pub enrollment_year: i32,
}

/// A student joined with account fields and the derived GPA, returned by
/// the profile endpoint. GPA is rounded to two decimals here; anything that
/// needs the exact value computes it directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentProfile {
    #[serde(flatten)]
    pub student: Student,
    pub username: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub gpa: f64,
}

/// Input for an administrative student update. All fields are optional for
/// partial updates; account fields and profile fields are written together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStudentInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub college: Option<String>,
    pub major: Option<String>,
    pub year_of_study: Option<i32>,
}
