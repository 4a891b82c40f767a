//! Modelos de Coupon y CouponUsage
//!
//! Un Coupon define la regla de descuento; cada canje exitoso deja
//! exactamente un CouponUsage y suma 1 a `used_count`. Ambas escrituras
//! van juntas como una sola unidad lógica.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;
use validator::Validate;

/// Tipo de descuento - mapea al ENUM coupon_discount_type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "coupon_discount_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CouponDiscountType {
    Percentage,
    Fixed,
}

/// Coupon principal - mapea a la tabla coupons
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Coupon {
    pub id: Uuid,
    pub code: String,
    pub discount_type: CouponDiscountType,
    pub discount_value: Decimal,
    pub max_discount_amount: Option<Decimal>,
    pub min_booking_amount: Option<Decimal>,
    pub valid_from: NaiveDate,
    pub valid_until: NaiveDate,
    pub usage_limit: Option<i32>,
    pub usage_per_user: Option<i32>,
    pub used_count: i32,
    pub applicable_vehicle_types: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Registro de canje - mapea a la tabla coupon_usages
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CouponUsage {
    pub id: Uuid,
    pub coupon_id: Uuid,
    pub coupon_code: String,
    pub booking_id: Uuid,
    pub user_email: String,
    pub discount_amount: Decimal,
    pub final_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Campos para registrar un canje nuevo
#[derive(Debug, Clone)]
pub struct NewCouponUsage {
    pub coupon_id: Uuid,
    pub coupon_code: String,
    pub booking_id: Uuid,
    pub user_email: String,
    pub discount_amount: Decimal,
    pub final_amount: Decimal,
}

/// Request para validar un cupón contra un importe candidato
#[derive(Debug, Deserialize, Validate)]
pub struct ValidateCouponRequest {
    #[validate(length(min = 3, max = 40))]
    pub code: String,
    pub booking_amount: Decimal,
    #[validate(length(min = 2, max = 40))]
    pub vehicle_type: String,
}

/// Resultado de la validación de un cupón
#[derive(Debug, Serialize)]
pub struct CouponDiscount {
    pub coupon_id: Uuid,
    pub code: String,
    pub discount_amount: Decimal,
}
