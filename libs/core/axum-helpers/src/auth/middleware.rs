use super::jwt::JwtAuth;
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::errors::AppError;

/// Extract a bearer token from the Authorization header.
fn extract_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer ").map(|s| s.to_string()))
}

/// JWT authentication middleware.
///
/// Validates the bearer token and inserts a [`super::CurrentUser`] into
/// request extensions on success.
///
/// # Example
///
/// ```ignore
/// use axum_helpers::{JwtAuth, require_auth};
///
/// let auth = JwtAuth::new(secret);
/// let protected = Router::new()
///     .route("/profile", get(profile))
///     .route_layer(axum::middleware::from_fn_with_state(auth.clone(), require_auth));
/// ```
pub async fn require_auth(
    State(auth): State<JwtAuth>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_token(&headers).ok_or_else(|| {
        tracing::debug!("No bearer token in Authorization header");
        AppError::Unauthorized("No token provided".to_string()).into_response()
    })?;

    let principal = auth.principal(&token).map_err(|e| {
        tracing::debug!("Token verification failed: {}", e);
        AppError::Unauthorized("Invalid token".to_string()).into_response()
    })?;

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

/// Admin-only middleware.
///
/// Same as [`require_auth`] but additionally rejects principals without the
/// admin flag.
pub async fn require_admin(
    State(auth): State<JwtAuth>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_token(&headers).ok_or_else(|| {
        tracing::debug!("No bearer token in Authorization header");
        AppError::Unauthorized("No token provided".to_string()).into_response()
    })?;

    let principal = auth.principal(&token).map_err(|e| {
        tracing::debug!("Token verification failed: {}", e);
        AppError::Unauthorized("Invalid token".to_string()).into_response()
    })?;

    if !principal.is_admin {
        tracing::debug!(username = %principal.username, "Admin route denied");
        return Err(AppError::Forbidden("Administrator role required".to_string()).into_response());
    }

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}
