//! Appointment scheduling handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{Duration, NaiveTime, Utc};
use domain::models::appointment::{
    AppointmentFilter, AvailabilityQuery, CreateAppointmentRequest, UpdateAppointmentStatusRequest,
};
use domain::models::{Appointment, AppointmentStatus};
use domain::services::scheduling::is_slot_aligned;
use domain::services::{Booking, Slot};
use persistence::repositories::{AppointmentRepository, NewAppointment};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::routes::vehicles::load_visible;

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub date: chrono::NaiveDate,
    pub slot_minutes: u32,
    pub slots: Vec<Slot>,
}

/// GET /api/v1/appointments/availability?date=YYYY-MM-DD
pub async fn availability(
    State(state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, ApiError> {
    let hours = state.config.scheduling.shop_hours();
    let day_start = query.date.and_time(NaiveTime::MIN).and_utc();

    let bookings = AppointmentRepository::new(state.pool.clone())
        .active_bookings(day_start, day_start + Duration::days(1))
        .await?;

    Ok(Json(AvailabilityResponse {
        date: query.date,
        slot_minutes: hours.slot_minutes,
        slots: hours.availability(query.date, &bookings),
    }))
}

/// GET /api/v1/appointments?from=&to=&status=
pub async fn list_appointments(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(filter): Query<AppointmentFilter>,
) -> Result<Json<Vec<Appointment>>, ApiError> {
    let rows = AppointmentRepository::new(state.pool.clone())
        .list(
            user.owner_scope(),
            filter.from,
            filter.to,
            filter.status.as_ref().map(|s| s.as_str()),
        )
        .await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// POST /api/v1/appointments
///
/// Customers book their own vehicles; staff book for anyone.
pub async fn create_appointment(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<Appointment>), ApiError> {
    request.validate()?;
    let hours = state.config.scheduling.shop_hours();
    if !is_slot_aligned(request.scheduled_at, hours.slot_minutes) {
        return Err(ApiError::Validation(format!(
            "Appointments start on {}-minute boundaries",
            hours.slot_minutes
        )));
    }

    let vehicle = load_visible(&state, &user, request.vehicle_id).await?;
    let duration = request
        .duration_minutes
        .unwrap_or(hours.slot_minutes as i32);
    let requested = Booking::new(request.scheduled_at, duration);
    let now = Utc::now();

    let entity = AppointmentRepository::new(state.pool.clone())
        .create_checked(
            NewAppointment {
                customer_id: vehicle.owner_id,
                vehicle_id: vehicle.id,
                service_type: request.service_type.trim(),
                scheduled_at: request.scheduled_at,
                duration_minutes: duration,
                notes: request.notes.as_deref(),
            },
            |bookings| hours.check_booking(now, requested, bookings),
        )
        .await?;

    info!(
        appointment_id = %entity.id,
        vehicle_id = %vehicle.id,
        scheduled_at = %entity.scheduled_at,
        booked_by = %user.real.user_id,
        "Appointment booked"
    );
    Ok((StatusCode::CREATED, Json(entity.into())))
}

/// POST /api/v1/appointments/:id/status
///
/// Customers may only cancel their own appointments.
pub async fn update_appointment_status(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateAppointmentStatusRequest>,
) -> Result<Json<Appointment>, ApiError> {
    let repo = AppointmentRepository::new(state.pool.clone());
    let current: Appointment = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Appointment not found".to_string()))?
        .into();
    user.ensure_owns(current.customer_id, "Appointment")?;

    let next = request.status;
    if !user.is_staff_side() && next != AppointmentStatus::Cancelled {
        return Err(ApiError::Forbidden(
            "Customers can only cancel appointments".to_string(),
        ));
    }
    if !current.status.can_transition_to(next) {
        return Err(ApiError::Conflict(format!(
            "Cannot move appointment from {} to {}",
            current.status, next
        )));
    }

    let entity = repo
        .transition(id, current.status.as_str(), next.as_str())
        .await?
        .ok_or_else(|| ApiError::Conflict("Appointment changed concurrently".to_string()))?;

    info!(
        appointment_id = %id,
        from = %current.status,
        to = %next,
        by = %user.real.user_id,
        "Appointment status changed"
    );
    Ok(Json(entity.into()))
}
