use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use uuid::Uuid;

use super::AppState;
use crate::auth;
use crate::db::EnrollError;
use crate::models::*;

// ============================================================
// Error Handling
// ============================================================

/// Log an internal error and return a sanitized response to the client.
/// The full error (with its source chain) is logged server-side for
/// debugging; clients only see a generic message.
fn internal_error(err: impl std::fmt::Display) -> (StatusCode, String) {
    tracing::error!("Internal error: {:#}", err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

/// Map an enrollment outcome onto its HTTP status. Business outcomes keep
/// their message; internal failures are sanitized like every other 500.
fn enroll_error(err: EnrollError) -> (StatusCode, String) {
    let status = match &err {
        EnrollError::NotFound => StatusCode::NOT_FOUND,
        EnrollError::Forbidden => StatusCode::FORBIDDEN,
        EnrollError::AlreadyEnrolled
        | EnrollError::ScheduleConflict
        | EnrollError::SectionFull
        | EnrollError::InvalidState => StatusCode::CONFLICT,
        EnrollError::Internal(source) => return internal_error(source),
    };
    (status, err.to_string())
}

/// Unique-constraint violations (duplicate username, email, course code)
/// are client conflicts, not server faults.
fn conflict_or_internal(err: anyhow::Error, conflict_msg: &str) -> (StatusCode, String) {
    let unique_violation = err
        .chain()
        .any(|cause| cause.to_string().contains("UNIQUE constraint failed"));
    if unique_violation {
        return (StatusCode::CONFLICT, conflict_msg.to_string());
    }
    internal_error(err)
}

fn require_admin(actor: &Actor) -> Result<(), (StatusCode, String)> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err((
            StatusCode::FORBIDDEN,
            "Administrator access required".to_string(),
        ))
    }
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Auth
// ============================================================

pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    let found = state
        .db
        .get_user_credentials(&input.username)
        .map_err(internal_error)?;

    // Unknown usernames and wrong passwords are indistinguishable.
    let Some((user, password_hash)) = found else {
        return Err((StatusCode::UNAUTHORIZED, "Invalid credentials".to_string()));
    };
    if !auth::verify_password(&input.password, &password_hash) {
        return Err((StatusCode::UNAUTHORIZED, "Invalid credentials".to_string()));
    }
    if !user.is_approved {
        return Err((StatusCode::FORBIDDEN, "Account pending approval".to_string()));
    }

    let token = state
        .auth
        .issue(user.id, user.role)
        .map_err(internal_error)?;
    Ok(Json(AuthResponse { token, user }))
}

pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> Result<(StatusCode, Json<AuthResponse>), (StatusCode, String)> {
    let user = state
        .db
        .register_account(input)
        .map_err(|e| conflict_or_internal(e, "Username or email already exists"))?;

    let token = state
        .auth
        .issue(user.id, user.role)
        .map_err(internal_error)?;
    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

pub async fn verify(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<VerifyResponse>, (StatusCode, String)> {
    // The token may outlive the account it was issued for.
    let user = state
        .db
        .get_user(actor.user_id)
        .map_err(internal_error)?
        .ok_or((
            StatusCode::UNAUTHORIZED,
            "Account no longer exists".to_string(),
        ))?;

    Ok(Json(VerifyResponse { valid: true, user }))
}

// ============================================================
// Students
// ============================================================

pub async fn list_students(
    State(state): State<AppState>,
) -> Result<Json<Vec<StudentProfile>>, (StatusCode, String)> {
    state.db.list_students().map(Json).map_err(internal_error)
}

pub async fn my_student_profile(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<StudentProfile>, (StatusCode, String)> {
    state
        .db
        .get_student_profile(actor.user_id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((
            StatusCode::NOT_FOUND,
            "Student profile not found".to_string(),
        ))
}

pub async fn my_enrollments(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<EnrollmentDetail>>, (StatusCode, String)> {
    let student = state
        .db
        .get_student_by_user(actor.user_id)
        .map_err(internal_error)?
        .ok_or((
            StatusCode::NOT_FOUND,
            "Student profile not found".to_string(),
        ))?;

    state
        .db
        .get_student_enrollments(student.id)
        .map(Json)
        .map_err(internal_error)
}

pub async fn student_enrollments(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<EnrollmentDetail>>, (StatusCode, String)> {
    let student = state
        .db
        .get_student(id)
        .map_err(internal_error)?
        .ok_or((StatusCode::NOT_FOUND, "Student not found".to_string()))?;

    // Students can only read their own transcript; staff can read any.
    if actor.role == Role::Student && student.user_id != actor.user_id {
        return Err((
            StatusCode::FORBIDDEN,
            "Not authorized to view these enrollments".to_string(),
        ));
    }

    state
        .db
        .get_student_enrollments(student.id)
        .map(Json)
        .map_err(internal_error)
}

pub async fn update_student(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateStudentInput>,
) -> Result<Json<StudentProfile>, (StatusCode, String)> {
    require_admin(&actor)?;

    state
        .db
        .update_student(id, input)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Student not found".to_string()))
}

// ============================================================
// Instructors
// ============================================================

pub async fn list_instructors(
    State(state): State<AppState>,
) -> Result<Json<Vec<InstructorProfile>>, (StatusCode, String)> {
    state
        .db
        .list_instructors()
        .map(Json)
        .map_err(internal_error)
}

pub async fn my_instructor_profile(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<InstructorProfile>, (StatusCode, String)> {
    state
        .db
        .get_instructor_profile(actor.user_id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((
            StatusCode::NOT_FOUND,
            "Instructor profile not found".to_string(),
        ))
}

pub async fn instructor_sections(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<SectionDetail>>, (StatusCode, String)> {
    // First verify the instructor exists
    state
        .db
        .get_instructor(id)
        .map_err(internal_error)?
        .ok_or((StatusCode::NOT_FOUND, "Instructor not found".to_string()))?;

    state
        .db
        .get_instructor_sections(id)
        .map(Json)
        .map_err(internal_error)
}

pub async fn update_instructor(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateInstructorInput>,
) -> Result<Json<InstructorProfile>, (StatusCode, String)> {
    require_admin(&actor)?;

    state
        .db
        .update_instructor(id, input)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Instructor not found".to_string()))
}

// ============================================================
// Departments
// ============================================================

pub async fn list_departments(
    State(state): State<AppState>,
) -> Result<Json<Vec<Department>>, (StatusCode, String)> {
    state
        .db
        .get_departments()
        .map(Json)
        .map_err(internal_error)
}

// ============================================================
// Courses
// ============================================================

pub async fn list_courses(
    State(state): State<AppState>,
) -> Result<Json<Vec<CourseWithDepartment>>, (StatusCode, String)> {
    state.db.get_courses().map(Json).map_err(internal_error)
}

pub async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CourseDetail>, (StatusCode, String)> {
    state
        .db
        .get_course(id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Course not found".to_string()))
}

pub async fn course_sections(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<SectionDetail>>, (StatusCode, String)> {
    // First verify the course exists
    state
        .db
        .get_course(id)
        .map_err(internal_error)?
        .ok_or((StatusCode::NOT_FOUND, "Course not found".to_string()))?;

    state
        .db
        .get_course_sections(id)
        .map(Json)
        .map_err(internal_error)
}

pub async fn create_course(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(input): Json<CreateCourseInput>,
) -> Result<(StatusCode, Json<Course>), (StatusCode, String)> {
    require_admin(&actor)?;

    state
        .db
        .create_course(input)
        .map(|c| (StatusCode::CREATED, Json(c)))
        .map_err(|e| conflict_or_internal(e, "Course code already exists"))
}

pub async fn update_course(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateCourseInput>,
) -> Result<Json<Course>, (StatusCode, String)> {
    require_admin(&actor)?;

    state
        .db
        .update_course(id, input)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Course not found".to_string()))
}

pub async fn delete_course(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    require_admin(&actor)?;

    if state.db.delete_course(id).map_err(internal_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Course not found".to_string()))
    }
}

// ============================================================
// Terms
// ============================================================

pub async fn active_term(
    State(state): State<AppState>,
) -> Result<Json<Term>, (StatusCode, String)> {
    state
        .db
        .get_active_term()
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "No active term".to_string()))
}

// ============================================================
// Enrollments
// ============================================================

pub async fn enroll(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(input): Json<EnrollInput>,
) -> Result<(StatusCode, Json<Enrollment>), (StatusCode, String)> {
    let student = state
        .db
        .get_student_by_user(actor.user_id)
        .map_err(internal_error)?
        .ok_or((
            StatusCode::FORBIDDEN,
            "Only students can enroll".to_string(),
        ))?;

    state
        .db
        .enroll(student.id, input.section_id)
        .map(|e| (StatusCode::CREATED, Json(e)))
        .map_err(enroll_error)
}

pub async fn drop_enrollment(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<Enrollment>, (StatusCode, String)> {
    let enrollment = state
        .db
        .get_enrollment(id)
        .map_err(internal_error)?
        .ok_or((StatusCode::NOT_FOUND, "Enrollment not found".to_string()))?;

    // Students drop their own enrollments; admins may drop any.
    if !actor.is_admin() {
        let student = state
            .db
            .get_student_by_user(actor.user_id)
            .map_err(internal_error)?;
        let owns = student.is_some_and(|s| s.id == enrollment.student_id);
        if !owns {
            return Err((
                StatusCode::FORBIDDEN,
                "Not authorized to drop this enrollment".to_string(),
            ));
        }
    }

    state
        .db
        .drop_enrollment(enrollment.student_id, enrollment.section_id)
        .map(Json)
        .map_err(enroll_error)
}

pub async fn record_grade(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(input): Json<RecordGradeInput>,
) -> Result<Json<Enrollment>, (StatusCode, String)> {
    state
        .db
        .record_grade(id, input, actor)
        .map(Json)
        .map_err(enroll_error)
}
