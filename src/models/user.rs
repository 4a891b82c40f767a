//! Ledger de ganancias del propietario
//!
//! La identidad vive en el proveedor de auth externo; aquí solo se lleva
//! el acumulado de `total_earnings` que se acredita al completar bookings.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Acumulado de ganancias por propietario - mapea a la tabla owner_earnings
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OwnerEarnings {
    pub owner_email: String,
    pub total_earnings: Decimal,
    pub updated_at: DateTime<Utc>,
}
