//! Repositorio de cupones y canjes

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::coupon::{Coupon, NewCouponUsage};
use crate::utils::errors::AppError;

/// Contrato del store de cupones
#[async_trait]
pub trait CouponStore: Send + Sync {
    async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>, AppError>;

    /// Canjes previos de este usuario para el cupón (cap por usuario)
    async fn count_user_redemptions(
        &self,
        coupon_id: Uuid,
        user_email: &str,
    ) -> Result<i64, AppError>;

    /// Canje: incremento de `used_count` + alta del CouponUsage, como una
    /// sola unidad lógica. La implementación Postgres lo envuelve en una
    /// transacción SQL para que el contador y el audit trail no diverjan.
    async fn redeem(&self, coupon_id: Uuid, usage: NewCouponUsage) -> Result<(), AppError>;
}

pub struct PgCouponRepository {
    pool: PgPool,
}

impl PgCouponRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CouponStore for PgCouponRepository {
    async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>, AppError> {
        let coupon = sqlx::query_as::<_, Coupon>("SELECT * FROM coupons WHERE code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        Ok(coupon)
    }

    async fn count_user_redemptions(
        &self,
        coupon_id: Uuid,
        user_email: &str,
    ) -> Result<i64, AppError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM coupon_usages WHERE coupon_id = $1 AND user_email = $2",
        )
        .bind(coupon_id)
        .bind(user_email)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }

    async fn redeem(&self, coupon_id: Uuid, usage: NewCouponUsage) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE coupons SET used_count = used_count + 1 WHERE id = $1")
            .bind(coupon_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO coupon_usages
                (id, coupon_id, coupon_code, booking_id, user_email, discount_amount, final_amount, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(usage.coupon_id)
        .bind(&usage.coupon_code)
        .bind(usage.booking_id)
        .bind(&usage.user_email)
        .bind(usage.discount_amount)
        .bind(usage.final_amount)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }
}
