//! Modelo de Vehicle
//!
//! Vehículo publicado por un propietario. `blocked_dates` funciona como un
//! set de fechas: la máquina de estados hace unión idempotente al aprobar
//! y diferencia de conjuntos al cancelar.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Vehicle principal - mapea a la tabla vehicles
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Vehicle {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub owner_email: String,
    pub owner_name: String,
    pub title: String,
    pub vehicle_type: String,
    pub price_per_day: Decimal,
    pub security_deposit: Decimal,
    pub blocked_dates: Vec<NaiveDate>,
    pub is_active: bool,
    pub is_available: bool,
    pub average_rating: Decimal,
    pub total_reviews: i32,
    pub total_bookings: i32,
    pub created_at: DateTime<Utc>,
}

impl Vehicle {
    /// Unión idempotente de fechas bloqueadas (sin duplicados)
    pub fn block_dates(&mut self, dates: &[NaiveDate]) {
        for date in dates {
            if !self.blocked_dates.contains(date) {
                self.blocked_dates.push(*date);
            }
        }
    }

    /// Diferencia de conjuntos: libera las fechas del rango cancelado
    pub fn unblock_dates(&mut self, dates: &[NaiveDate]) {
        self.blocked_dates.retain(|d| !dates.contains(d));
    }
}
