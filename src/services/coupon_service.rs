//! Resolver de descuentos por cupón
//!
//! Valida un código contra ventana de fechas, caps de uso, tipos de
//! vehículo aplicables y mínimo de importe, y calcula el descuento. El
//! canje (used_count + CouponUsage) ocurre al confirmar el booking, no
//! durante la validación.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::coupon::{Coupon, CouponDiscount, CouponDiscountType, NewCouponUsage};
use crate::repositories::CouponStore;
use crate::utils::errors::{bad_request_error, AppError};

/// Descuento que produce un cupón ya validado sobre un importe
///
/// Percentage → `amount × value / 100`, recortado a `max_discount_amount`
/// si existe; Fixed → `value`, recortado para no superar el importe.
pub fn compute_discount(coupon: &Coupon, amount: Decimal) -> Decimal {
    match coupon.discount_type {
        CouponDiscountType::Percentage => {
            let discount = amount * coupon.discount_value / Decimal::ONE_HUNDRED;
            match coupon.max_discount_amount {
                Some(max) => discount.min(max),
                None => discount,
            }
        }
        CouponDiscountType::Fixed => coupon.discount_value.min(amount),
    }
}

pub struct CouponService {
    coupons: Arc<dyn CouponStore>,
}

impl CouponService {
    pub fn new(coupons: Arc<dyn CouponStore>) -> Self {
        Self { coupons }
    }

    /// Validar un código contra el importe candidato pre-descuento y el
    /// tipo de vehículo. No tiene side effects.
    pub async fn validate(
        &self,
        code: &str,
        booking_amount: Decimal,
        vehicle_type: &str,
        user_email: &str,
        now: DateTime<Utc>,
    ) -> Result<CouponDiscount, AppError> {
        let coupon = self
            .coupons
            .find_by_code(code)
            .await?
            .ok_or_else(|| bad_request_error("Coupon code not found"))?;

        if !coupon.is_active {
            return Err(bad_request_error("Coupon is not active"));
        }

        let today = now.date_naive();
        if today < coupon.valid_from || today > coupon.valid_until {
            return Err(bad_request_error("Coupon is outside its validity window"));
        }

        if let Some(limit) = coupon.usage_limit {
            if coupon.used_count >= limit {
                return Err(bad_request_error("Coupon usage limit reached"));
            }
        }

        if let Some(per_user) = coupon.usage_per_user {
            let redemptions = self
                .coupons
                .count_user_redemptions(coupon.id, user_email)
                .await?;
            if redemptions >= per_user as i64 {
                return Err(bad_request_error("Coupon already used the maximum times by this user"));
            }
        }

        if !coupon.applicable_vehicle_types.is_empty()
            && !coupon
                .applicable_vehicle_types
                .iter()
                .any(|t| t == vehicle_type)
        {
            return Err(bad_request_error("Coupon does not apply to this vehicle type"));
        }

        if let Some(min_amount) = coupon.min_booking_amount {
            if booking_amount < min_amount {
                return Err(bad_request_error("Booking amount below coupon minimum"));
            }
        }

        let discount_amount = compute_discount(&coupon, booking_amount);
        Ok(CouponDiscount {
            coupon_id: coupon.id,
            code: coupon.code,
            discount_amount,
        })
    }

    /// Registrar el canje sobre un booking confirmado: incrementa
    /// `used_count` y deja exactamente un CouponUsage, como una sola
    /// unidad lógica del store.
    pub async fn redeem(
        &self,
        discount: &CouponDiscount,
        booking_id: Uuid,
        user_email: &str,
        final_amount: Decimal,
    ) -> Result<(), AppError> {
        self.coupons
            .redeem(
                discount.coupon_id,
                NewCouponUsage {
                    coupon_id: discount.coupon_id,
                    coupon_code: discount.code.clone(),
                    booking_id,
                    user_email: user_email.to_string(),
                    discount_amount: discount.discount_amount,
                    final_amount,
                },
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn percentage_coupon(value: i64, max: Option<Decimal>) -> Coupon {
        Coupon {
            id: Uuid::new_v4(),
            code: "PROMO".to_string(),
            discount_type: CouponDiscountType::Percentage,
            discount_value: Decimal::new(value, 0),
            max_discount_amount: max,
            min_booking_amount: None,
            valid_from: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            valid_until: NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
            usage_limit: None,
            usage_per_user: None,
            used_count: 0,
            applicable_vehicle_types: Vec::new(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn porcentaje_sin_tope() {
        // 20% de $172.50 → $34.50 (escenario B)
        let coupon = percentage_coupon(20, None);
        assert_eq!(compute_discount(&coupon, Decimal::new(17250, 2)), Decimal::new(3450, 2));
    }

    #[test]
    fn porcentaje_con_tope() {
        let coupon = percentage_coupon(50, Some(Decimal::new(25, 0)));
        assert_eq!(compute_discount(&coupon, Decimal::new(200, 0)), Decimal::new(25, 0));
    }

    #[test]
    fn fijo_no_supera_el_importe() {
        let coupon = Coupon {
            discount_type: CouponDiscountType::Fixed,
            discount_value: Decimal::new(80, 0),
            ..percentage_coupon(0, None)
        };
        assert_eq!(compute_discount(&coupon, Decimal::new(50, 0)), Decimal::new(50, 0));
        assert_eq!(compute_discount(&coupon, Decimal::new(200, 0)), Decimal::new(80, 0));
    }

    use async_trait::async_trait;
    use chrono::TimeZone;

    use crate::utils::errors::AppError;

    /// Store de un solo cupón con canjes previos configurables
    struct StubCouponStore {
        coupon: Option<Coupon>,
        redemptions: i64,
    }

    #[async_trait]
    impl CouponStore for StubCouponStore {
        async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>, AppError> {
            Ok(self.coupon.clone().filter(|c| c.code == code))
        }

        async fn count_user_redemptions(
            &self,
            _coupon_id: Uuid,
            _user_email: &str,
        ) -> Result<i64, AppError> {
            Ok(self.redemptions)
        }

        async fn redeem(&self, _coupon_id: Uuid, _usage: NewCouponUsage) -> Result<(), AppError> {
            Ok(())
        }
    }

    fn service_with(coupon: Coupon, redemptions: i64) -> CouponService {
        CouponService::new(Arc::new(StubCouponStore {
            coupon: Some(coupon),
            redemptions,
        }))
    }

    /// "Ahora" fijo dentro de la ventana del helper: 2026-06-15 12:00 UTC
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn codigo_inexistente_rechazado() {
        let service = service_with(percentage_coupon(20, None), 0);
        let err = service
            .validate("NOEXISTE", Decimal::new(200, 0), "van", "renter@test.com", now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn cupon_inactivo_rechazado() {
        let coupon = Coupon {
            is_active: false,
            ..percentage_coupon(20, None)
        };
        let service = service_with(coupon, 0);
        let err = service
            .validate("PROMO", Decimal::new(200, 0), "van", "renter@test.com", now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn fuera_de_la_ventana_de_validez_rechazado() {
        // Todavía no empezó
        let futuro = Coupon {
            valid_from: NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(),
            valid_until: NaiveDate::from_ymd_opt(2026, 7, 31).unwrap(),
            ..percentage_coupon(20, None)
        };
        let err = service_with(futuro, 0)
            .validate("PROMO", Decimal::new(200, 0), "van", "renter@test.com", now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        // Ya venció
        let vencido = Coupon {
            valid_from: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            valid_until: NaiveDate::from_ymd_opt(2026, 2, 28).unwrap(),
            ..percentage_coupon(20, None)
        };
        let err = service_with(vencido, 0)
            .validate("PROMO", Decimal::new(200, 0), "van", "renter@test.com", now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn cap_por_usuario_agotado_rechazado() {
        let coupon = Coupon {
            usage_per_user: Some(1),
            ..percentage_coupon(20, None)
        };

        // Sin canjes previos pasa
        service_with(coupon.clone(), 0)
            .validate("PROMO", Decimal::new(200, 0), "van", "renter@test.com", now())
            .await
            .unwrap();

        // Con un canje previo del mismo usuario ya no
        let err = service_with(coupon, 1)
            .validate("PROMO", Decimal::new(200, 0), "van", "renter@test.com", now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn allowlist_de_tipos_de_vehiculo() {
        let coupon = Coupon {
            applicable_vehicle_types: vec!["car".to_string()],
            ..percentage_coupon(20, None)
        };

        let err = service_with(coupon.clone(), 0)
            .validate("PROMO", Decimal::new(200, 0), "van", "renter@test.com", now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        // El tipo permitido sí pasa y calcula el descuento
        let discount = service_with(coupon, 0)
            .validate("PROMO", Decimal::new(200, 0), "car", "renter@test.com", now())
            .await
            .unwrap();
        assert_eq!(discount.discount_amount, Decimal::new(40, 0));
    }

    #[tokio::test]
    async fn minimo_de_importe_rechazado() {
        let coupon = Coupon {
            min_booking_amount: Some(Decimal::new(200, 0)),
            ..percentage_coupon(20, None)
        };

        let err = service_with(coupon.clone(), 0)
            .validate("PROMO", Decimal::new(150, 0), "van", "renter@test.com", now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        service_with(coupon, 0)
            .validate("PROMO", Decimal::new(250, 0), "van", "renter@test.com", now())
            .await
            .unwrap();
    }
}
