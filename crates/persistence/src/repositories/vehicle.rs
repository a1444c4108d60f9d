//! Vehicle repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::VehicleEntity;
use crate::metrics::QueryTimer;

const VEHICLE_COLUMNS: &str = "id, owner_id, make, model, year, vin, license_plate, vehicle_type, \
     mileage, created_at, updated_at";

/// Column values for a new vehicle.
#[derive(Debug, Clone)]
pub struct NewVehicle<'a> {
    pub owner_id: Uuid,
    pub make: &'a str,
    pub model: &'a str,
    pub year: i32,
    pub vin: Option<String>,
    pub license_plate: Option<String>,
    pub vehicle_type: Option<&'a str>,
    pub mileage: Option<i32>,
}

/// Column changes for a vehicle; `None` leaves the column as is.
#[derive(Debug, Clone, Default)]
pub struct VehicleChanges<'a> {
    pub make: Option<&'a str>,
    pub model: Option<&'a str>,
    pub year: Option<i32>,
    pub vin: Option<String>,
    pub license_plate: Option<String>,
    pub vehicle_type: Option<&'a str>,
    pub mileage: Option<i32>,
}

/// Repository for vehicle-related database operations.
#[derive(Clone)]
pub struct VehicleRepository {
    pool: PgPool,
}

impl VehicleRepository {
    /// Creates a new VehicleRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<VehicleEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_vehicle_by_id");
        let result = sqlx::query_as::<_, VehicleEntity>(&format!(
            "SELECT {} FROM vehicles WHERE id = $1",
            VEHICLE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// One page of vehicles, newest first, optionally limited to one owner.
    /// Fetches `limit + 1` rows.
    pub async fn list_page(
        &self,
        owner_id: Option<Uuid>,
        cursor: Option<(DateTime<Utc>, Uuid)>,
        limit: i64,
    ) -> Result<Vec<VehicleEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_vehicles_page");
        let (cursor_ts, cursor_id) = cursor.unzip();
        let result = sqlx::query_as::<_, VehicleEntity>(&format!(
            r#"
            SELECT {}
            FROM vehicles
            WHERE ($1::uuid IS NULL OR owner_id = $1)
              AND ($2::timestamptz IS NULL OR (created_at, id) < ($2, $3))
            ORDER BY created_at DESC, id DESC
            LIMIT $4
            "#,
            VEHICLE_COLUMNS
        ))
        .bind(owner_id)
        .bind(cursor_ts)
        .bind(cursor_id)
        .bind(limit + 1)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// All vehicles of one owner.
    pub async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<VehicleEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_vehicles_by_owner");
        let result = sqlx::query_as::<_, VehicleEntity>(&format!(
            "SELECT {} FROM vehicles WHERE owner_id = $1 ORDER BY created_at DESC",
            VEHICLE_COLUMNS
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Vehicles whose make, model, VIN or plate contains the pattern.
    pub async fn search(&self, pattern: &str, limit: i64) -> Result<Vec<VehicleEntity>, sqlx::Error> {
        let timer = QueryTimer::new("search_vehicles");
        let result = sqlx::query_as::<_, VehicleEntity>(&format!(
            r#"
            SELECT {}
            FROM vehicles
            WHERE make ILIKE $1 OR model ILIKE $1 OR vin ILIKE $1 OR license_plate ILIKE $1
            ORDER BY make, model
            LIMIT $2
            "#,
            VEHICLE_COLUMNS
        ))
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn create(&self, vehicle: NewVehicle<'_>) -> Result<VehicleEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_vehicle");
        let result = sqlx::query_as::<_, VehicleEntity>(&format!(
            r#"
            INSERT INTO vehicles (owner_id, make, model, year, vin, license_plate, vehicle_type, mileage)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            VEHICLE_COLUMNS
        ))
        .bind(vehicle.owner_id)
        .bind(vehicle.make)
        .bind(vehicle.model)
        .bind(vehicle.year)
        .bind(vehicle.vin)
        .bind(vehicle.license_plate)
        .bind(vehicle.vehicle_type)
        .bind(vehicle.mileage)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn update(
        &self,
        id: Uuid,
        changes: VehicleChanges<'_>,
    ) -> Result<Option<VehicleEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_vehicle");
        let result = sqlx::query_as::<_, VehicleEntity>(&format!(
            r#"
            UPDATE vehicles
            SET make = COALESCE($2, make),
                model = COALESCE($3, model),
                year = COALESCE($4, year),
                vin = COALESCE($5, vin),
                license_plate = COALESCE($6, license_plate),
                vehicle_type = COALESCE($7, vehicle_type),
                mileage = COALESCE($8, mileage),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            VEHICLE_COLUMNS
        ))
        .bind(id)
        .bind(changes.make)
        .bind(changes.model)
        .bind(changes.year)
        .bind(changes.vin)
        .bind(changes.license_plate)
        .bind(changes.vehicle_type)
        .bind(changes.mileage)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn delete(&self, id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_vehicle");
        let result = sqlx::query("DELETE FROM vehicles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        timer.record();
        Ok(result.rows_affected())
    }
}
