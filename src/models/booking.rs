//! Modelo de Booking
//!
//! La entidad central del marketplace. El status es una máquina de estados
//! cerrada; las transiciones legales viven en `BookingStatus::can_transition_to`.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;
use validator::Validate;

/// Estado del booking - mapea al ENUM booking_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "booking_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Approved,
    Rejected,
    Paid,
    Active,
    Completed,
    Cancelled,
}

impl BookingStatus {
    /// Estados terminales: ninguna transición sale de ellos
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Rejected | BookingStatus::Completed | BookingStatus::Cancelled
        )
    }

    /// Tabla de transiciones legales de la máquina de estados
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Pending, Approved)
                | (Pending, Rejected)
                | (Pending, Cancelled)
                | (Approved, Paid)
                | (Approved, Cancelled)
                | (Paid, Active)
                | (Paid, Cancelled)
                | (Active, Completed)
                | (Active, Cancelled)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Approved => "approved",
            BookingStatus::Rejected => "rejected",
            BookingStatus::Paid => "paid",
            BookingStatus::Active => "active",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

/// Estado del pago - mapea al ENUM payment_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
    Refunded,
}

/// Booking principal - mapea a la tabla bookings
///
/// `price_per_day` y `security_deposit` son snapshots al momento de crear
/// el booking: cambios posteriores del vehículo no alteran bookings
/// existentes. `owner_payout` se calcula una sola vez y se persiste porque
/// los pagos al propietario se programan contra el valor almacenado.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub vehicle_title: String,
    pub renter_id: Uuid,
    pub renter_email: String,
    pub renter_name: String,
    pub owner_id: Uuid,
    pub owner_email: String,
    pub owner_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_days: i32,
    pub price_per_day: Decimal,
    pub subtotal: Decimal,
    pub platform_fee: Decimal,
    pub extras_total: Decimal,
    pub insurance_cost: Decimal,
    pub discount_amount: Decimal,
    pub coupon_code: Option<String>,
    pub security_deposit: Decimal,
    pub total_amount: Decimal,
    pub owner_payout: Decimal,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub payment_intent_id: Option<String>,
    pub cancelled_by: Option<String>,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Fechas del rango reservado, ambos extremos incluidos
    pub fn date_range(&self) -> Vec<NaiveDate> {
        let mut dates = Vec::new();
        let mut current = self.start_date;
        while current <= self.end_date {
            dates.push(current);
            current = current.succ_opt().expect("date overflow");
        }
        dates
    }

    /// Overlap de rangos inclusivos con otro booking
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date <= end && start <= self.end_date
    }
}

/// Extra seleccionado al crear el booking (el total viene precalculado)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BookingExtra {
    pub name: String,
    pub total: Decimal,
}

/// Seguro seleccionado al crear el booking
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InsuranceSelection {
    pub insurance_type: String,
    pub cost: Decimal,
}

/// Request para crear una solicitud de booking
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBookingRequest {
    pub vehicle_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub extras: Vec<BookingExtra>,
    pub insurance: Option<InsuranceSelection>,
    #[validate(length(min = 3, max = 40))]
    pub coupon_code: Option<String>,
}

/// Request para cancelar un booking
#[derive(Debug, Deserialize, Validate)]
pub struct CancelBookingRequest {
    #[validate(length(min = 3, max = 500))]
    pub reason: String,
}

/// Request para dejar una reseña sobre un booking completado
#[derive(Debug, Deserialize, Validate)]
pub struct CreateReviewRequest {
    #[validate(range(min = 1, max = 5))]
    pub rating: i32,
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
}
