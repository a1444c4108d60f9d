//! Hosted-auth JWT authentication middleware.
//!
//! Verifies the bearer token against the project JWT secret and resolves the
//! caller's app role from the stored profile, falling back to the token's
//! `app_metadata` claim, then stores an [`AuthUser`] in the request extensions.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use domain::services::Identity;
use serde_json::json;
use shared::jwt::{Claims, JwtConfig};
use shared::roles::{BaseRole, UserRole};
use uuid::Uuid;

use crate::app::AppState;
use crate::config::AuthConfig;
use crate::error::ApiError;
use crate::services::role_directory::resolve_role;

/// The real, authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub identity: Identity,
}

impl AuthUser {
    /// Creates the token verifier from the auth section.
    pub fn create_jwt_config(config: &AuthConfig) -> Result<JwtConfig, String> {
        JwtConfig::with_options(&config.jwt_secret, &config.audience, config.leeway_secs)
            .map_err(|e| format!("Failed to initialize JWT config: {}", e))
    }

    /// Validates `token` and resolves the caller's identity.
    pub async fn authenticate(state: &AppState, token: &str) -> Result<Self, ApiError> {
        let jwt_config =
            Self::create_jwt_config(&state.config.auth).map_err(ApiError::Internal)?;

        let claims = jwt_config.validate_token(token).map_err(|e| {
            tracing::debug!(error = %e, "JWT validation failed");
            ApiError::Unauthorized("Invalid or expired token".to_string())
        })?;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| ApiError::Unauthorized("Invalid user ID in token".to_string()))?;

        let stored = state.roles.stored_role(user_id).await?;
        let raw_role = resolve_role(stored, claims.app_metadata.role.clone())
            .ok_or_else(|| ApiError::Unauthorized("No profile for this account".to_string()))?;

        Ok(Self {
            identity: identity_from_claims(user_id, &claims, &raw_role),
        })
    }
}

/// Builds the identity for a verified token.
///
/// A role string that does not parse locks the account out: it becomes an
/// inactive customer.
pub fn identity_from_claims(user_id: Uuid, claims: &Claims, raw_role: &str) -> Identity {
    let role = raw_role.parse::<UserRole>().unwrap_or_else(|e| {
        tracing::warn!(user_id = %user_id, role = raw_role, error = %e, "Unrecognized role string");
        UserRole::new(BaseRole::Customer).toggle_active()
    });

    Identity {
        user_id,
        email: claims.email.clone(),
        role,
    }
}

/// Extracts the token from an `Authorization: Bearer ...` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Middleware that requires a valid hosted-auth token.
pub async fn require_user_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(req.headers()) else {
        return unauthorized_response("Missing or invalid Authorization header");
    };

    match AuthUser::authenticate(&state, token).await {
        Ok(auth) => {
            req.extensions_mut().insert(auth);
            next.run(req).await
        }
        Err(ApiError::Unauthorized(msg)) => unauthorized_response(&msg),
        Err(other) => other.into_response(),
    }
}

/// Middleware that authenticates when a token is present and otherwise lets
/// the request through anonymously.
pub async fn optional_user_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(token) = bearer_token(req.headers()) {
        match AuthUser::authenticate(&state, token).await {
            Ok(auth) => {
                req.extensions_mut().insert(auth);
            }
            Err(e) => tracing::debug!(error = %e, "Ignoring invalid optional credentials"),
        }
    }

    next.run(req).await
}

fn unauthorized_response(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": "unauthorized",
            "message": message
        })),
    )
        .into_response()
}
