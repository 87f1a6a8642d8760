use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, MethodRouter},
    Extension, Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};

use crate::{
    app::route_not_found,
    error::AppError,
    state::AppState,
    users::{
        base_path,
        dto::{ApiResponse, DeletedUser, HealthStatus},
        extractors::UserPayload,
        repo_types::PublicUser,
        validation::{validate_identifier, validate_record, ApiVersion},
    },
};

/// CRUD routes for one API version under `/{version}/users`.
pub fn user_routes(version: ApiVersion) -> Router<AppState> {
    let base = base_path(version);
    route_with_trailing_slash(&base, post(create_user).get(list_users))
        .merge(route_with_trailing_slash(
            &format!("{base}/:id"),
            get(get_user).delete(delete_user),
        ))
        .layer(Extension(version))
}

pub fn health_routes() -> Router<AppState> {
    route_with_trailing_slash("/health", get(health))
}

/// Registers `path` and `path/` alike. Any other method on them answers
/// with the route-not-found body instead of an empty 405.
fn route_with_trailing_slash(path: &str, methods: MethodRouter<AppState>) -> Router<AppState> {
    let methods = methods.fallback(route_not_found);
    Router::new()
        .route(path, methods.clone())
        .route(&format!("{path}/"), methods)
}

#[instrument(skip(state, body))]
pub async fn create_user(
    State(state): State<AppState>,
    Extension(version): Extension<ApiVersion>,
    UserPayload(body): UserPayload,
) -> Result<(StatusCode, Json<ApiResponse<PublicUser>>), AppError> {
    let new_user = validate_record(&body, version).map_err(|errors| {
        warn!(%errors, "create rejected");
        AppError::invalid_body(errors)
    })?;

    let user = state
        .users
        .create(&new_user.id, &new_user.password)
        .map_err(|e| {
            warn!(error = %e, "create conflict");
            AppError::from(e)
        })?;

    info!(internal_id = user.internal_id, id = %user.id, "user created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("User created successfully", user)),
    ))
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Json<ApiResponse<Vec<PublicUser>>> {
    let users = state.users.get_all();
    let count = users.len();
    Json(ApiResponse::ok("Users retrieved successfully", users).with_count(count))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Extension(version): Extension<ApiVersion>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<PublicUser>>, AppError> {
    let id = validate_identifier(&id, version).map_err(AppError::invalid_id)?;

    let user = state.users.get_by_id(&id).ok_or_else(|| {
        warn!(%id, "user not found");
        AppError::NotFound
    })?;

    Ok(Json(ApiResponse::ok("User retrieved successfully", user)))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(version): Extension<ApiVersion>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<DeletedUser>>, AppError> {
    let id = validate_identifier(&id, version).map_err(AppError::invalid_id)?;

    if !state.users.delete_by_id(&id) {
        warn!(%id, "delete of unknown user");
        return Err(AppError::NotFound);
    }

    info!(%id, "user deleted");
    Ok(Json(ApiResponse::ok(
        "User deleted successfully",
        DeletedUser { id, deleted: true },
    )))
}

pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthStatus>> {
    Json(ApiResponse::ok(
        "API is healthy",
        HealthStatus {
            status: "healthy",
            timestamp: OffsetDateTime::now_utc(),
            user_count: state.users.count(),
        },
    ))
}
