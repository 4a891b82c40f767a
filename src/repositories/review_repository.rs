//! Repositorio de reseñas

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::review::Review;
use crate::utils::errors::AppError;

/// Campos para crear una reseña nueva
#[derive(Debug, Clone)]
pub struct NewReview {
    pub booking_id: Uuid,
    pub vehicle_id: Uuid,
    pub reviewer_email: String,
    pub rating: i32,
    pub comment: Option<String>,
}

/// Contrato del store de reseñas
#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn create(&self, review: NewReview) -> Result<Review, AppError>;

    async fn find_by_booking_and_reviewer(
        &self,
        booking_id: Uuid,
        reviewer_email: &str,
    ) -> Result<Option<Review>, AppError>;

    /// Todas las reseñas del vehículo, para recalcular los agregados
    async fn find_by_vehicle(&self, vehicle_id: Uuid) -> Result<Vec<Review>, AppError>;
}

pub struct PgReviewRepository {
    pool: PgPool,
}

impl PgReviewRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReviewStore for PgReviewRepository {
    async fn create(&self, review: NewReview) -> Result<Review, AppError> {
        let created = sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO reviews
                (id, booking_id, vehicle_id, reviewer_email, rating, comment, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(review.booking_id)
        .bind(review.vehicle_id)
        .bind(&review.reviewer_email)
        .bind(review.rating)
        .bind(&review.comment)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn find_by_booking_and_reviewer(
        &self,
        booking_id: Uuid,
        reviewer_email: &str,
    ) -> Result<Option<Review>, AppError> {
        let review = sqlx::query_as::<_, Review>(
            "SELECT * FROM reviews WHERE booking_id = $1 AND reviewer_email = $2",
        )
        .bind(booking_id)
        .bind(reviewer_email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(review)
    }

    async fn find_by_vehicle(&self, vehicle_id: Uuid) -> Result<Vec<Review>, AppError> {
        let reviews = sqlx::query_as::<_, Review>(
            "SELECT * FROM reviews WHERE vehicle_id = $1 ORDER BY created_at ASC",
        )
        .bind(vehicle_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(reviews)
    }
}
