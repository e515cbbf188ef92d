//! Session authentication middleware.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};

use super::AppState;

/// Verify the bearer token and attach the acting identity to the request.
///
/// Handlers behind this middleware read the caller with
/// `Extension<Actor>`; requests without a valid token never reach them.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok());

    let Some(header) = auth_header else {
        tracing::warn!("Missing Authorization header");
        return Err(StatusCode::UNAUTHORIZED);
    };
    let Some(token) = header.strip_prefix("Bearer ") else {
        tracing::warn!("Invalid Authorization header format");
        return Err(StatusCode::UNAUTHORIZED);
    };

    match state.auth.verify(token) {
        Ok(actor) => {
            request.extensions_mut().insert(actor);
            Ok(next.run(request).await)
        }
        Err(err) => {
            tracing::warn!("Rejected session token: {:#}", err);
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}
