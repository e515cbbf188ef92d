mod handlers;
pub mod middleware;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::AuthService;
use crate::db::Database;

/// Shared state for handlers and the auth middleware.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub auth: AuthService,
}

pub fn create_router(db: Database, auth: AuthService) -> Router {
    let state = AppState { db, auth };

    // Login, registration, and reference data sit outside the auth wall.
    let public = Router::new()
        .route("/auth/login", post(handlers::login))
        .route("/auth/register", post(handlers::register))
        .route("/departments", get(handlers::list_departments))
        .route("/health", get(handlers::health));

    let protected = Router::new()
        // Auth
        .route("/auth/verify", get(handlers::verify))
        // Students
        .route("/students", get(handlers::list_students))
        .route("/students/me", get(handlers::my_student_profile))
        .route("/students/me/enrollments", get(handlers::my_enrollments))
        .route("/students/{id}/enrollments", get(handlers::student_enrollments))
        .route("/students/{id}", put(handlers::update_student))
        // Instructors
        .route("/instructors", get(handlers::list_instructors))
        .route("/instructors/me", get(handlers::my_instructor_profile))
        .route("/instructors/{id}/sections", get(handlers::instructor_sections))
        .route("/instructors/{id}", put(handlers::update_instructor))
        // Courses
        .route("/courses", get(handlers::list_courses))
        .route("/courses", post(handlers::create_course))
        .route("/courses/{id}", get(handlers::get_course))
        .route("/courses/{id}", put(handlers::update_course))
        .route("/courses/{id}", delete(handlers::delete_course))
        .route("/courses/{id}/sections", get(handlers::course_sections))
        // Terms
        .route("/terms/active", get(handlers::active_term))
        // Enrollments
        .route("/enrollments", post(handlers::enroll))
        .route("/enrollments/{id}", delete(handlers::drop_enrollment))
        .route("/enrollments/{id}/grade", put(handlers::record_grade))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    Router::new()
        .nest("/api/v1", public.merge(protected))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
