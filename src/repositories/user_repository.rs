//! Repositorio del acumulado de ganancias por propietario

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::models::user::OwnerEarnings;
use crate::utils::errors::AppError;

/// Contrato del store de ganancias de propietarios
#[async_trait]
pub trait OwnerEarningsStore: Send + Sync {
    /// Acreditar `owner_payout` al completar un booking (upsert acumulativo)
    async fn credit_earnings(&self, owner_email: &str, amount: Decimal) -> Result<(), AppError>;

    async fn find_by_email(&self, owner_email: &str) -> Result<Option<OwnerEarnings>, AppError>;
}

pub struct PgOwnerEarningsRepository {
    pool: PgPool,
}

impl PgOwnerEarningsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OwnerEarningsStore for PgOwnerEarningsRepository {
    async fn credit_earnings(&self, owner_email: &str, amount: Decimal) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO owner_earnings (owner_email, total_earnings, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (owner_email)
            DO UPDATE SET total_earnings = owner_earnings.total_earnings + $2, updated_at = NOW()
            "#,
        )
        .bind(owner_email)
        .bind(amount)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_email(&self, owner_email: &str) -> Result<Option<OwnerEarnings>, AppError> {
        let earnings = sqlx::query_as::<_, OwnerEarnings>(
            "SELECT * FROM owner_earnings WHERE owner_email = $1",
        )
        .bind(owner_email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(earnings)
    }
}
