//! Modelo de Review
//!
//! Una reseña por (booking, renter), solo sobre bookings completados.
//! Los agregados del vehículo se recalculan sobre todas sus reseñas.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Review principal - mapea a la tabla reviews
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Review {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub vehicle_id: Uuid,
    pub reviewer_email: String,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}
