//! Repositorio de bookings

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::booking::{Booking, BookingStatus, PaymentStatus};
use crate::utils::errors::AppError;

/// Contrato del store de bookings
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn create(&self, booking: Booking) -> Result<Booking, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>, AppError>;

    /// Bookings no terminales de un vehículo, para el scan de conflictos
    async fn find_open_for_vehicle(&self, vehicle_id: Uuid) -> Result<Vec<Booking>, AppError>;

    /// Bookings en los que el usuario participa como renter o como owner
    async fn list_for_user(&self, email: &str) -> Result<Vec<Booking>, AppError>;

    async fn set_status(&self, id: Uuid, status: BookingStatus) -> Result<Booking, AppError>;

    /// Transición approved→paid disparada por el settlement
    async fn mark_paid(&self, id: Uuid, payment_intent_id: &str) -> Result<Booking, AppError>;

    async fn mark_cancelled(
        &self,
        id: Uuid,
        cancelled_by: &str,
        reason: &str,
    ) -> Result<Booking, AppError>;
}

pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingStore for PgBookingRepository {
    async fn create(&self, booking: Booking) -> Result<Booking, AppError> {
        let created = sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings (
                id, vehicle_id, vehicle_title, renter_id, renter_email, renter_name,
                owner_id, owner_email, owner_name, start_date, end_date, total_days,
                price_per_day, subtotal, platform_fee, extras_total, insurance_cost,
                discount_amount, coupon_code, security_deposit, total_amount, owner_payout,
                status, payment_status, payment_intent_id, cancelled_by, cancellation_reason,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                    $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28, $29)
            RETURNING *
            "#,
        )
        .bind(booking.id)
        .bind(booking.vehicle_id)
        .bind(&booking.vehicle_title)
        .bind(booking.renter_id)
        .bind(&booking.renter_email)
        .bind(&booking.renter_name)
        .bind(booking.owner_id)
        .bind(&booking.owner_email)
        .bind(&booking.owner_name)
        .bind(booking.start_date)
        .bind(booking.end_date)
        .bind(booking.total_days)
        .bind(booking.price_per_day)
        .bind(booking.subtotal)
        .bind(booking.platform_fee)
        .bind(booking.extras_total)
        .bind(booking.insurance_cost)
        .bind(booking.discount_amount)
        .bind(&booking.coupon_code)
        .bind(booking.security_deposit)
        .bind(booking.total_amount)
        .bind(booking.owner_payout)
        .bind(booking.status)
        .bind(booking.payment_status)
        .bind(&booking.payment_intent_id)
        .bind(&booking.cancelled_by)
        .bind(&booking.cancellation_reason)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>, AppError> {
        let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(booking)
    }

    async fn find_open_for_vehicle(&self, vehicle_id: Uuid) -> Result<Vec<Booking>, AppError> {
        let bookings = sqlx::query_as::<_, Booking>(
            r#"
            SELECT * FROM bookings
            WHERE vehicle_id = $1
              AND status IN ('pending', 'approved', 'paid', 'active')
            ORDER BY created_at DESC
            "#,
        )
        .bind(vehicle_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    async fn list_for_user(&self, email: &str) -> Result<Vec<Booking>, AppError> {
        let bookings = sqlx::query_as::<_, Booking>(
            r#"
            SELECT * FROM bookings
            WHERE renter_email = $1 OR owner_email = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(email)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    async fn set_status(&self, id: Uuid, status: BookingStatus) -> Result<Booking, AppError> {
        let booking = sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        Ok(booking)
    }

    async fn mark_paid(&self, id: Uuid, payment_intent_id: &str) -> Result<Booking, AppError> {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET status = $2, payment_status = $3, payment_intent_id = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(BookingStatus::Paid)
        .bind(PaymentStatus::Paid)
        .bind(payment_intent_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(booking)
    }

    async fn mark_cancelled(
        &self,
        id: Uuid,
        cancelled_by: &str,
        reason: &str,
    ) -> Result<Booking, AppError> {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET status = $2, cancelled_by = $3, cancellation_reason = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(BookingStatus::Cancelled)
        .bind(cancelled_by)
        .bind(reason)
        .fetch_one(&self.pool)
        .await?;

        Ok(booking)
    }
}
