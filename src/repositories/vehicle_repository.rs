//! Repositorio de vehículos

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::vehicle::Vehicle;
use crate::utils::errors::AppError;

/// Contrato del store de vehículos
#[async_trait]
pub trait VehicleStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Vehicle>, AppError>;

    /// Persistir el set completo de fechas bloqueadas (read-modify-write)
    async fn set_blocked_dates(
        &self,
        id: Uuid,
        blocked_dates: Vec<NaiveDate>,
    ) -> Result<Vehicle, AppError>;

    async fn increment_total_bookings(&self, id: Uuid) -> Result<(), AppError>;

    /// Escribir los agregados de reseñas recalculados
    async fn update_rating(
        &self,
        id: Uuid,
        average_rating: Decimal,
        total_reviews: i32,
    ) -> Result<(), AppError>;
}

pub struct PgVehicleRepository {
    pool: PgPool,
}

impl PgVehicleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VehicleStore for PgVehicleRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Vehicle>, AppError> {
        let vehicle = sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(vehicle)
    }

    async fn set_blocked_dates(
        &self,
        id: Uuid,
        blocked_dates: Vec<NaiveDate>,
    ) -> Result<Vehicle, AppError> {
        let vehicle = sqlx::query_as::<_, Vehicle>(
            "UPDATE vehicles SET blocked_dates = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(blocked_dates)
        .fetch_one(&self.pool)
        .await?;

        Ok(vehicle)
    }

    async fn increment_total_bookings(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE vehicles SET total_bookings = total_bookings + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn update_rating(
        &self,
        id: Uuid,
        average_rating: Decimal,
        total_reviews: i32,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE vehicles SET average_rating = $2, total_reviews = $3 WHERE id = $1")
            .bind(id)
            .bind(average_rating)
            .bind(total_reviews)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
