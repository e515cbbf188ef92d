use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One student's registration row for one section.
///
/// A (student, section) pair is unique for the lifetime of the pair: a
/// dropped enrollment keeps its row (soft delete) and blocks re-enrollment
/// in the same section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: Uuid,
    pub student_id: Uuid,
    pub section_id: Uuid,
    pub status: EnrollmentStatus,
    pub numeric_grade: Option<f64>,
    pub final_grade: Option<String>,
    pub grade_points: Option<f64>,
    pub enrolled_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lifecycle of an enrollment.
///
/// Active statuses hold a seat; terminal statuses never change again.
/// `retake_pending` is a graded outcome that is neither active nor
/// terminal: the seat is released but the registrar may still move the
/// row (e.g. to `failed`) after review.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    Enrolling,
    Enrolled,
    Dropped,
    Passed,
    Failed,
    RetakePending,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enrolling => "enrolling",
            Self::Enrolled => "enrolled",
            Self::Dropped => "dropped",
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::RetakePending => "retake_pending",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "enrolling" => Some(Self::Enrolling),
            "enrolled" => Some(Self::Enrolled),
            "dropped" => Some(Self::Dropped),
            "passed" => Some(Self::Passed),
            "failed" => Some(Self::Failed),
            "retake_pending" => Some(Self::RetakePending),
            _ => None,
        }
    }

    /// Holds a seat and participates in schedule conflicts.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Enrolling | Self::Enrolled)
    }

    /// No further transitions allowed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Dropped | Self::Passed | Self::Failed)
    }

    /// A status that grading is allowed to move an enrollment into.
    pub fn is_graded_outcome(&self) -> bool {
        matches!(self, Self::Passed | Self::Failed | Self::RetakePending)
    }
}

/// An enrollment joined with its section, course, and term context, used
/// for transcript and roster views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentDetail {
    #[serde(flatten)]
    pub enrollment: Enrollment,
    pub section_code: String,
    pub course_code: String,
    pub course_title: String,
    pub credits: i32,
    pub term_code: String,
    pub term_name: String,
    pub instructor_name: String,
    pub room: Option<String>,
}

/// Input for enrolling the authenticated student into a section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollInput {
    pub section_id: Uuid,
}

/// Input for recording a final grade on an enrollment.
///
/// When `final_grade` is omitted the letter is derived from
/// `numeric_grade` via the standard percentage bands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordGradeInput {
    pub numeric_grade: Option<f64>,
    pub final_grade: Option<String>,
    pub status: EnrollmentStatus,
}
