//! Appointment repository for database operations.

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};
use domain::services::scheduling::{Booking, SchedulingError};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::entities::AppointmentEntity;
use crate::metrics::QueryTimer;

const APPOINTMENT_COLUMNS: &str = "id, customer_id, vehicle_id, service_type, scheduled_at, \
     duration_minutes, status, notes, created_at, updated_at";

/// Column values for a new appointment.
#[derive(Debug, Clone)]
pub struct NewAppointment<'a> {
    pub customer_id: Uuid,
    pub vehicle_id: Uuid,
    pub service_type: &'a str,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub notes: Option<&'a str>,
}

/// Errors from booking an appointment.
#[derive(Debug, Error)]
pub enum BookingError {
    #[error(transparent)]
    Rejected(#[from] SchedulingError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Repository for appointment-related database operations.
#[derive(Clone)]
pub struct AppointmentRepository {
    pool: PgPool,
}

impl AppointmentRepository {
    /// Creates a new AppointmentRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<AppointmentEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_appointment_by_id");
        let result = sqlx::query_as::<_, AppointmentEntity>(&format!(
            "SELECT {} FROM appointments WHERE id = $1",
            APPOINTMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List appointments in time order with optional filters.
    pub async fn list(
        &self,
        customer_id: Option<Uuid>,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        status: Option<&str>,
    ) -> Result<Vec<AppointmentEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_appointments");
        let result = sqlx::query_as::<_, AppointmentEntity>(&format!(
            r#"
            SELECT {}
            FROM appointments
            WHERE ($1::uuid IS NULL OR customer_id = $1)
              AND ($2::timestamptz IS NULL OR scheduled_at >= $2)
              AND ($3::timestamptz IS NULL OR scheduled_at < $3)
              AND ($4::text IS NULL OR status = $4)
            ORDER BY scheduled_at
            LIMIT 500
            "#,
            APPOINTMENT_COLUMNS
        ))
        .bind(customer_id)
        .bind(from)
        .bind(to)
        .bind(status)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Active appointments overlapping `[start, end)`.
    pub async fn active_bookings(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Booking>, sqlx::Error> {
        let timer = QueryTimer::new("list_active_bookings");
        let result = sqlx::query_as::<_, AppointmentEntity>(&active_bookings_sql())
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        Ok(result?.iter().map(AppointmentEntity::booking).collect())
    }

    /// Book an appointment if `check` accepts it against the day's bookings.
    ///
    /// Bookings for the same day are serialized with a transaction-scoped
    /// advisory lock so two requests cannot take the last bay together.
    pub async fn create_checked<F>(
        &self,
        appointment: NewAppointment<'_>,
        check: F,
    ) -> Result<AppointmentEntity, BookingError>
    where
        F: FnOnce(&[Booking]) -> Result<(), SchedulingError>,
    {
        let timer = QueryTimer::new("create_appointment");
        let mut tx = self.pool.begin().await?;

        let day = appointment.scheduled_at.date_naive();
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(day.num_days_from_ce() as i64)
            .execute(&mut *tx)
            .await?;

        let day_start = day.and_time(NaiveTime::MIN).and_utc();
        let bookings: Vec<Booking> = sqlx::query_as::<_, AppointmentEntity>(&active_bookings_sql())
            .bind(day_start)
            .bind(day_start + Duration::days(1))
            .fetch_all(&mut *tx)
            .await?
            .iter()
            .map(AppointmentEntity::booking)
            .collect();

        check(&bookings)?;

        let created = sqlx::query_as::<_, AppointmentEntity>(&format!(
            r#"
            INSERT INTO appointments
                (customer_id, vehicle_id, service_type, scheduled_at, duration_minutes, status, notes)
            VALUES ($1, $2, $3, $4, $5, 'scheduled', $6)
            RETURNING {}
            "#,
            APPOINTMENT_COLUMNS
        ))
        .bind(appointment.customer_id)
        .bind(appointment.vehicle_id)
        .bind(appointment.service_type)
        .bind(appointment.scheduled_at)
        .bind(appointment.duration_minutes)
        .bind(appointment.notes)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok(created)
    }

    /// Move an appointment from `from` to `to`. Returns `None` if it is no longer in `from`.
    pub async fn transition(
        &self,
        id: Uuid,
        from: &str,
        to: &str,
    ) -> Result<Option<AppointmentEntity>, sqlx::Error> {
        let timer = QueryTimer::new("transition_appointment");
        let result = sqlx::query_as::<_, AppointmentEntity>(&format!(
            r#"
            UPDATE appointments
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {}
            "#,
            APPOINTMENT_COLUMNS
        ))
        .bind(id)
        .bind(from)
        .bind(to)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }
}

fn active_bookings_sql() -> String {
    format!(
        r#"
        SELECT {}
        FROM appointments
        WHERE status IN ('scheduled', 'confirmed')
          AND scheduled_at < $2
          AND scheduled_at + make_interval(mins => duration_minutes) > $1
        "#,
        APPOINTMENT_COLUMNS
    )
}
