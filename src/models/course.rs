use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An academic department owning courses and instructors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Department {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A course in the catalog. Courses are offered to students through
/// [`crate::models::Section`]s, one per term and instructor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: Uuid,
    pub code: String,
    pub title: String,
    pub description: Option<String>,
    /// Credit hours, the denominator weight in GPA computation.
    pub credits: i32,
    pub dept_id: Uuid,
    pub kind: CourseKind,
    pub created_at: DateTime<Utc>,
}

/// How a course counts toward a degree plan.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CourseKind {
    GeneralRequired,
    MajorRequired,
    MajorElective,
    UniversityElective,
    Practical,
}

impl CourseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GeneralRequired => "general_required",
            Self::MajorRequired => "major_required",
            Self::MajorElective => "major_elective",
            Self::UniversityElective => "university_elective",
            Self::Practical => "practical",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "general_required" => Some(Self::GeneralRequired),
            "major_required" => Some(Self::MajorRequired),
            "major_elective" => Some(Self::MajorElective),
            "university_elective" => Some(Self::UniversityElective),
            "practical" => Some(Self::Practical),
            _ => None,
        }
    }
}

/// A course joined with its department, used for catalog listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseWithDepartment {
    #[serde(flatten)]
    pub course: Course,
    pub dept_name: String,
    pub dept_code: String,
}

/// A prerequisite edge between two courses.
///
/// Prerequisites are catalog data only: they are stored and surfaced to
/// clients, but enrollment does not verify satisfaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prerequisite {
    pub course_id: Uuid,
    pub code: String,
    pub title: String,
    pub minimum_grade: String,
}

/// Full course view returned by the single-course endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseDetail {
    #[serde(flatten)]
    pub course: CourseWithDepartment,
    pub prerequisites: Vec<Prerequisite>,
}

/// Input for creating a course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCourseInput {
    pub code: String,
    pub title: String,
    pub description: Option<String>,
    pub credits: i32,
    pub dept_id: Uuid,
    pub kind: CourseKind,
}

/// Input for updating a course. All fields are optional for partial updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCourseInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub credits: Option<i32>,
    pub dept_id: Option<Uuid>,
    pub kind: Option<CourseKind>,
}
