use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod validation;

use validation::ApiVersion;

/// Mounts `/v1/users`, `/v2/users` and `/health`.
pub fn router() -> Router<AppState> {
    ApiVersion::ALL
        .into_iter()
        .fold(handlers::health_routes(), |router, version| {
            router.merge(handlers::user_routes(version))
        })
}

pub fn base_path(version: ApiVersion) -> String {
    format!("/{}/users", version.as_str())
}
