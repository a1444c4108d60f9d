//! Portal route guard decisions.

use axum::{extract::Query, Json};
use domain::services::{decide, RouteAccessResponse};
use serde::Deserialize;

use crate::error::ApiError;
use crate::extractors::OptionalCurrentUser;

#[derive(Debug, Deserialize)]
pub struct RouteAccessQuery {
    pub path: String,
}

/// GET /api/v1/route-access?path=
///
/// Decided for the effective identity, so an impersonating admin is routed
/// like the target.
pub async fn route_access(
    OptionalCurrentUser(user): OptionalCurrentUser,
    Query(query): Query<RouteAccessQuery>,
) -> Result<Json<RouteAccessResponse>, ApiError> {
    if !query.path.starts_with('/') {
        return Err(ApiError::Validation("path must start with '/'".to_string()));
    }

    let role = user.as_ref().map(|u| &u.effective.role);
    let access = decide(&query.path, role);
    Ok(Json(RouteAccessResponse::new(&query.path, &access)))
}
