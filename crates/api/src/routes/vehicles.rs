//! Vehicle endpoint handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::vehicle::{CreateVehicleRequest, UpdateVehicleRequest};
use domain::models::Vehicle;
use domain::services::{SearchParams, SearchQuery};
use persistence::entities::VehicleEntity;
use persistence::repositories::{NewVehicle, VehicleChanges, VehicleRepository};
use shared::pagination::{Page, PageParams};
use shared::validation::normalize_identifier;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;

fn normalize_vin(vin: Option<&String>) -> Option<String> {
    vin.map(|v| normalize_identifier(v))
}

fn normalize_plate(plate: Option<&String>) -> Option<String> {
    plate.map(|p| normalize_identifier(p))
}

/// Loads a vehicle the caller may see.
pub(crate) async fn load_visible(
    state: &AppState,
    user: &CurrentUser,
    id: Uuid,
) -> Result<VehicleEntity, ApiError> {
    let vehicle = VehicleRepository::new(state.pool.clone())
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Vehicle not found".to_string()))?;
    user.ensure_owns(vehicle.owner_id, "Vehicle")?;
    Ok(vehicle)
}

/// GET /api/v1/vehicles?cursor=&limit=
///
/// Staff page through all vehicles; customers get their own.
pub async fn list_vehicles(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<Vehicle>>, ApiError> {
    let limit = params.limit();
    let rows = VehicleRepository::new(state.pool.clone())
        .list_page(user.owner_scope(), params.decoded_cursor()?, limit)
        .await?;

    let page = Page::from_probe(rows, limit, |v: &VehicleEntity| (v.created_at, v.id));
    Ok(Json(page.map(Into::into)))
}

/// GET /api/v1/vehicles/search?q=
pub async fn search_vehicles(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Vehicle>>, ApiError> {
    user.require_staff()?;

    let query = SearchQuery::from_params(
        &params,
        state.config.search.min_chars,
        state.config.search.max_limit,
    );
    if !query.is_active() {
        return Ok(Json(Vec::new()));
    }

    let rows = VehicleRepository::new(state.pool.clone())
        .search(&query.contains_pattern(), query.limit())
        .await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// GET /api/v1/vehicles/:id
pub async fn get_vehicle(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vehicle>, ApiError> {
    Ok(Json(load_visible(&state, &user, id).await?.into()))
}

/// POST /api/v1/vehicles
///
/// Customers register vehicles for themselves; staff must name the owner.
pub async fn create_vehicle(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<CreateVehicleRequest>,
) -> Result<(StatusCode, Json<Vehicle>), ApiError> {
    request.validate()?;

    let owner_id = if user.is_staff_side() {
        request
            .owner_id
            .ok_or_else(|| ApiError::Validation("owner_id is required".to_string()))?
    } else {
        user.real.user_id
    };

    let entity = VehicleRepository::new(state.pool.clone())
        .create(NewVehicle {
            owner_id,
            make: request.make.trim(),
            model: request.model.trim(),
            year: request.year,
            vin: normalize_vin(request.vin.as_ref()),
            license_plate: normalize_plate(request.license_plate.as_ref()),
            vehicle_type: request.vehicle_type.as_deref(),
            mileage: request.mileage,
        })
        .await?;

    info!(
        vehicle_id = %entity.id,
        owner_id = %owner_id,
        created_by = %user.real.user_id,
        "Vehicle created"
    );
    Ok((StatusCode::CREATED, Json(entity.into())))
}

/// PATCH /api/v1/vehicles/:id
pub async fn update_vehicle(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateVehicleRequest>,
) -> Result<Json<Vehicle>, ApiError> {
    request.validate()?;
    load_visible(&state, &user, id).await?;

    let entity = VehicleRepository::new(state.pool.clone())
        .update(
            id,
            VehicleChanges {
                make: request.make.as_deref().map(str::trim),
                model: request.model.as_deref().map(str::trim),
                year: request.year,
                vin: normalize_vin(request.vin.as_ref()),
                license_plate: normalize_plate(request.license_plate.as_ref()),
                vehicle_type: request.vehicle_type.as_deref(),
                mileage: request.mileage,
            },
        )
        .await?
        .ok_or_else(|| ApiError::NotFound("Vehicle not found".to_string()))?;

    info!(vehicle_id = %id, updated_by = %user.real.user_id, "Vehicle updated");
    Ok(Json(entity.into()))
}

/// DELETE /api/v1/vehicles/:id
pub async fn delete_vehicle(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    user.require_staff()?;

    let deleted = VehicleRepository::new(state.pool.clone()).delete(id).await?;
    if deleted == 0 {
        return Err(ApiError::NotFound("Vehicle not found".to_string()));
    }

    info!(vehicle_id = %id, deleted_by = %user.real.user_id, "Vehicle deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization() {
        let vin = "  1hgcm82633a004352 ".to_string();
        assert_eq!(normalize_vin(Some(&vin)).as_deref(), Some("1HGCM82633A004352"));
        assert_eq!(normalize_plate(None), None);
    }
}
