use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An account in the system. Students, instructors, and administrators all
/// share this table; role-specific attributes live in the `students` and
/// `instructors` profile rows.
///
/// The password hash is intentionally not part of this struct so it can
/// never leak through a serialized response. Credential checks go through
/// [`crate::db::Database::get_user_credentials`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    /// Login identifier chosen at registration (e.g. a university ID number).
    pub username: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub phone: Option<String>,
    /// Instructor accounts start unapproved and cannot log in until an
    /// administrator approves them. Student accounts are approved on creation.
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The role attached to an account, carried in session token claims.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Instructor,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Instructor => "instructor",
            Self::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "student" => Some(Self::Student),
            "instructor" => Some(Self::Instructor),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

/// The authenticated caller of an operation, resolved from a verified
/// session token by the API middleware.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Input for registering a new account.
///
/// Role-specific fields are optional at the type level; the registration
/// operation requires `dept_id` for instructor accounts and falls back to
/// defaults (`Engineering` / `Undeclared` / year 1) for student profile
/// fields that are omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterInput {
    pub username: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub phone: Option<String>,
    // Student profile fields
    pub college: Option<String>,
    pub major: Option<String>,
    pub year_of_study: Option<i32>,
    // Instructor profile fields
    pub dept_id: Option<Uuid>,
    pub title: Option<String>,
    pub office_location: Option<String>,
    pub office_hours: Option<String>,
}

/// Input for logging in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

/// Response for login and register: a bearer token plus the account it
/// belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

/// Response for token verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub valid: bool,
    pub user: User,
}
