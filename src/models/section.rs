use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One scheduled offering of a course in a term, taught by one instructor.
///
/// `seats_taken` is the live seat counter and always equals the number of
/// enrollments in an active status (`enrolling`/`enrolled`) for this
/// section. The two are only ever updated together, inside the enrollment
/// transactions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub id: Uuid,
    pub section_code: String,
    pub course_id: Uuid,
    pub term_id: Uuid,
    pub instructor_id: Uuid,
    pub capacity: i32,
    pub seats_taken: i32,
    pub room: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A recurring weekly time interval a section occupies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSlot {
    pub id: Uuid,
    pub day: DayOfWeek,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monday => "Monday",
            Self::Tuesday => "Tuesday",
            Self::Wednesday => "Wednesday",
            Self::Thursday => "Thursday",
            Self::Friday => "Friday",
            Self::Saturday => "Saturday",
            Self::Sunday => "Sunday",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Monday" => Some(Self::Monday),
            "Tuesday" => Some(Self::Tuesday),
            "Wednesday" => Some(Self::Wednesday),
            "Thursday" => Some(Self::Thursday),
            "Friday" => Some(Self::Friday),
            "Saturday" => Some(Self::Saturday),
            "Sunday" => Some(Self::Sunday),
            _ => None,
        }
    }
}

/// A section joined with course, term, and instructor context plus its
/// weekly slots, used for catalog listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionDetail {
    #[serde(flatten)]
    pub section: Section,
    pub course_code: String,
    pub course_title: String,
    pub credits: i32,
    pub term_name: String,
    pub instructor_name: String,
    pub slots: Vec<TimeSlot>,
}

/// Input for creating a section. Time slots are attached separately with
/// [`crate::db::Database::add_section_slot`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSectionInput {
    pub section_code: String,
    pub course_id: Uuid,
    pub term_id: Uuid,
    pub instructor_id: Uuid,
    pub capacity: i32,
    pub room: Option<String>,
}

/// Input for creating a weekly time slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTimeSlotInput {
    pub day: DayOfWeek,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}
