//! "My data" endpoints.
//!
//! These render for the effective identity, so an administrator with an
//! impersonation overlay sees the target's data.

use axum::{extract::State, Json};
use persistence::repositories::{
    AppointmentRepository, EstimateRepository, InvoiceRepository, ProfileRepository,
    VehicleRepository,
};
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;
use domain::models::profile::UpdateProfileRequest;
use domain::models::{Appointment, Estimate, Invoice, Profile, Vehicle};

/// GET /api/v1/me
pub async fn get_me(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Profile>, ApiError> {
    let entity = ProfileRepository::new(state.pool.clone())
        .find_by_id(user.effective.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

    let mut profile: Profile = entity.into();
    // Test mode previews the role without touching the stored profile
    profile.role = user.effective.role;
    Ok(Json(profile))
}

/// PATCH /api/v1/me
///
/// Always edits the real caller's profile; the overlay is view-only.
pub async fn update_me(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<Profile>, ApiError> {
    request.validate()?;

    let entity = ProfileRepository::new(state.pool.clone())
        .update_contact(
            user.real.user_id,
            request.full_name.as_deref(),
            request.phone.as_deref(),
        )
        .await?;

    info!(user_id = %user.real.user_id, "Profile updated");
    Ok(Json(entity.into()))
}

/// GET /api/v1/me/vehicles
pub async fn my_vehicles(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<Vehicle>>, ApiError> {
    let rows = VehicleRepository::new(state.pool.clone())
        .list_by_owner(user.effective.user_id)
        .await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// GET /api/v1/me/appointments
pub async fn my_appointments(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<Appointment>>, ApiError> {
    let rows = AppointmentRepository::new(state.pool.clone())
        .list(Some(user.effective.user_id), None, None, None)
        .await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// GET /api/v1/me/invoices
pub async fn my_invoices(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<Invoice>>, ApiError> {
    let rows = InvoiceRepository::new(state.pool.clone())
        .list(Some(user.effective.user_id))
        .await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// GET /api/v1/me/estimates
pub async fn my_estimates(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<Estimate>>, ApiError> {
    let rows = EstimateRepository::new(state.pool.clone())
        .list(Some(user.effective.user_id))
        .await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}
