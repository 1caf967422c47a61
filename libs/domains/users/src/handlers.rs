//! HTTP handlers for the Users API

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use axum_helpers::{
    CurrentUser, JwtAuth, UuidPath, ValidatedJson,
    errors::responses::{
        BadRequestValidationResponse, ConflictResponse, ForbiddenResponse,
        InternalServerErrorResponse, NotFoundResponse, UnauthorizedResponse,
    },
    require_admin, require_auth,
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::{UserError, UserResult};
use crate::models::{
    AdminUpdateUser, AuthResponse, LoginRequest, RegisterRequest, UpdateProfile, UserResponse,
};
use crate::repository::UserRepository;
use crate::service::UserService;

/// OpenAPI documentation for the Users API
#[derive(OpenApi)]
#[openapi(
    paths(
        register,
        login,
        get_profile,
        update_profile,
        list_users,
        get_user,
        admin_update_user,
        delete_user,
    ),
    components(
        schemas(
            UserResponse, AuthResponse, RegisterRequest, LoginRequest,
            UpdateProfile, AdminUpdateUser
        ),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            ConflictResponse,
            UnauthorizedResponse,
            ForbiddenResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Users", description = "Registration, authentication, and user administration")
    )
)]
pub struct ApiDoc;

/// Shared state for user handlers: the service plus the token signer
#[derive(Clone)]
pub struct UsersState<R: UserRepository> {
    pub service: UserService<R>,
    pub jwt: JwtAuth,
}

/// Create the users router.
///
/// Registration and login are anonymous; profile routes require a
/// principal; the remaining routes are admin-only.
pub fn router<R: UserRepository + 'static>(service: UserService<R>, jwt: JwtAuth) -> Router {
    let state = Arc::new(UsersState {
        service,
        jwt: jwt.clone(),
    });

    let profile_routes = Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route_layer(middleware::from_fn_with_state(jwt.clone(), require_auth));

    let admin_routes = Router::new()
        .route("/", get(list_users))
        .route(
            "/{id}",
            get(get_user).put(admin_update_user).delete(delete_user),
        )
        .route_layer(middleware::from_fn_with_state(jwt, require_admin));

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .merge(profile_routes)
        .merge(admin_routes)
        .with_state(state)
}

fn auth_response<R: UserRepository>(
    state: &UsersState<R>,
    user: UserResponse,
) -> UserResult<AuthResponse> {
    let token = state
        .jwt
        .issue(user.id, &user.username, user.is_admin)
        .map_err(|e| {
            tracing::error!("Failed to issue token: {:?}", e);
            UserError::Internal("Failed to issue token".to_string())
        })?;

    Ok(AuthResponse { user, token })
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/register",
    tag = "Users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = AuthResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn register<R: UserRepository>(
    State(state): State<Arc<UsersState<R>>>,
    ValidatedJson(input): ValidatedJson<RegisterRequest>,
) -> UserResult<impl IntoResponse> {
    let user = state.service.register(input).await?;
    let response = auth_response(&state, user)?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Log in with username and password
#[utoipa::path(
    post,
    path = "/login",
    tag = "Users",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn login<R: UserRepository>(
    State(state): State<Arc<UsersState<R>>>,
    ValidatedJson(input): ValidatedJson<LoginRequest>,
) -> UserResult<Json<AuthResponse>> {
    let user = state
        .service
        .verify_credentials(&input.username, &input.password)
        .await?;

    Ok(Json(auth_response(&state, user)?))
}

/// Get the caller's profile
#[utoipa::path(
    get,
    path = "/profile",
    tag = "Users",
    responses(
        (status = 200, description = "Caller's profile", body = UserResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
async fn get_profile<R: UserRepository>(
    State(state): State<Arc<UsersState<R>>>,
    user: CurrentUser,
) -> UserResult<Json<UserResponse>> {
    let profile = state.service.get_user(user.id).await?;
    Ok(Json(profile))
}

/// Update the caller's profile (all-or-nothing)
#[utoipa::path(
    put,
    path = "/profile",
    tag = "Users",
    request_body = UpdateProfile,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
async fn update_profile<R: UserRepository>(
    State(state): State<Arc<UsersState<R>>>,
    user: CurrentUser,
    ValidatedJson(input): ValidatedJson<UpdateProfile>,
) -> UserResult<Json<UserResponse>> {
    let profile = state.service.update_profile(user.id, input).await?;
    Ok(Json(profile))
}

/// List all users (admin only)
#[utoipa::path(
    get,
    path = "",
    tag = "Users",
    responses(
        (status = 200, description = "All users, newest first", body = Vec<UserResponse>),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 500, response = InternalServerErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
async fn list_users<R: UserRepository>(
    State(state): State<Arc<UsersState<R>>>,
) -> UserResult<Json<Vec<UserResponse>>> {
    let users = state.service.list_users().await?;
    Ok(Json(users))
}

/// Get a user by ID (admin only)
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Users",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
async fn get_user<R: UserRepository>(
    State(state): State<Arc<UsersState<R>>>,
    UuidPath(id): UuidPath,
) -> UserResult<Json<UserResponse>> {
    let user = state.service.get_user(id).await?;
    Ok(Json(user))
}

/// Update a user (admin only)
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Users",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    request_body = AdminUpdateUser,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
async fn admin_update_user<R: UserRepository>(
    State(state): State<Arc<UsersState<R>>>,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<AdminUpdateUser>,
) -> UserResult<Json<UserResponse>> {
    let user = state.service.admin_update_user(id, input).await?;
    Ok(Json(user))
}

/// Delete a user (admin only)
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Users",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
async fn delete_user<R: UserRepository>(
    State(state): State<Arc<UsersState<R>>>,
    UuidPath(id): UuidPath,
) -> UserResult<impl IntoResponse> {
    state.service.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
