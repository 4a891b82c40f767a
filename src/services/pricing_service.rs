//! Calculadora de precios
//!
//! Transformación aritmética pura de (tarifa diaria, rango de fechas,
//! extras, seguro, cupón, fianza) al desglose de costes del booking.
//! Todo el cálculo va en `Decimal` para evitar drift de floats en sumas
//! repetidas; el redondeo a 2 decimales es cosa de la presentación.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::utils::errors::{bad_request_error, AppError};

/// Comisión fija de la plataforma: 15% del subtotal, no configurable
/// por booking.
pub fn platform_commission_rate() -> Decimal {
    Decimal::new(15, 2)
}

/// Desglose de costes de un booking
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PricingBreakdown {
    pub days: i32,
    pub subtotal: Decimal,
    pub platform_fee: Decimal,
    pub extras_total: Decimal,
    pub insurance_cost: Decimal,
    pub discount_amount: Decimal,
    pub total: Decimal,
    pub owner_payout: Decimal,
}

/// Días del rango inclusivo: ambos extremos cuentan
///
/// `start == end` es un booking válido de 1 día; un rango invertido se
/// rechaza como error de validación.
pub fn day_count(start_date: NaiveDate, end_date: NaiveDate) -> Result<i32, AppError> {
    let days = (end_date - start_date).num_days() + 1;
    if days < 1 {
        return Err(bad_request_error("Booking date range must span at least 1 day"));
    }
    Ok(days as i32)
}

/// Calcular el desglose completo
///
/// `total = subtotal + platform_fee + extras + seguro − descuento + fianza`
/// (el tramo pre-fianza se recorta a 0 si el descuento lo supera).
///
/// `owner_payout = subtotal − platform_fee + extras − descuento/2`: el
/// propietario absorbe la mitad del descuento del cupón y la comisión de
/// la plataforma nunca se reduce. El payout no se recorta a ≥ 0.
pub fn compute_breakdown(
    price_per_day: Decimal,
    days: i32,
    extras_total: Decimal,
    insurance_cost: Decimal,
    discount_amount: Decimal,
    security_deposit: Decimal,
) -> PricingBreakdown {
    let subtotal = price_per_day * Decimal::from(days);
    let platform_fee = subtotal * platform_commission_rate();

    let pre_deposit = subtotal + platform_fee + extras_total + insurance_cost;
    let discounted = (pre_deposit - discount_amount).max(Decimal::ZERO);
    let total = discounted + security_deposit;

    let owner_payout = subtotal - platform_fee + extras_total - discount_amount / Decimal::TWO;

    PricingBreakdown {
        days,
        subtotal,
        platform_fee,
        extras_total,
        insurance_cost,
        discount_amount,
        total,
        owner_payout,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(value: i64, scale: u32) -> Decimal {
        Decimal::new(value, scale)
    }

    #[test]
    fn escenario_a_sin_extras_ni_cupon() {
        // $50/día, 3 días, fianza $100
        let breakdown = compute_breakdown(d(50, 0), 3, Decimal::ZERO, Decimal::ZERO, Decimal::ZERO, d(100, 0));

        assert_eq!(breakdown.subtotal, d(150, 0));
        assert_eq!(breakdown.platform_fee, d(2250, 2));
        assert_eq!(breakdown.total, d(27250, 2));
        assert_eq!(breakdown.owner_payout, d(12750, 2));
    }

    #[test]
    fn escenario_b_cupon_20_por_ciento() {
        // Mismo booking con descuento del 20% sobre el tramo pre-fianza
        // ($172.50): descuento $34.50
        let discount = d(3450, 2);
        let breakdown = compute_breakdown(d(50, 0), 3, Decimal::ZERO, Decimal::ZERO, discount, d(100, 0));

        assert_eq!(breakdown.discount_amount, d(3450, 2));
        assert_eq!(breakdown.total, d(23800, 2));
        // $127.50 − $17.25: el owner absorbe la mitad del descuento
        assert_eq!(breakdown.owner_payout, d(11025, 2));
    }

    #[test]
    fn invariante_de_pricing_sin_cupon() {
        let rate = d(7999, 2);
        let days = 11;
        let extras = d(45, 0);
        let insurance = d(1250, 2);
        let deposit = d(300, 0);

        let breakdown = compute_breakdown(rate, days, extras, insurance, Decimal::ZERO, deposit);

        let subtotal = rate * Decimal::from(days);
        let expected = subtotal + subtotal * d(15, 2) + extras + insurance + deposit;
        assert_eq!(breakdown.total, expected);
    }

    #[test]
    fn descuento_se_resta_una_sola_vez() {
        let discount = d(30, 0);
        let with_discount = compute_breakdown(d(50, 0), 4, d(20, 0), Decimal::ZERO, discount, d(100, 0));
        let without = compute_breakdown(d(50, 0), 4, d(20, 0), Decimal::ZERO, Decimal::ZERO, d(100, 0));

        assert_eq!(without.total - with_discount.total, discount);
        assert_eq!(without.owner_payout - with_discount.owner_payout, discount / Decimal::TWO);
    }

    #[test]
    fn descuento_mayor_que_el_importe_recorta_a_cero() {
        // El tramo pre-fianza queda en 0; la fianza se cobra igual
        let breakdown = compute_breakdown(d(10, 0), 1, Decimal::ZERO, Decimal::ZERO, d(500, 0), d(100, 0));
        assert_eq!(breakdown.total, d(100, 0));
        // El payout NO se recorta: replica el comportamiento de origen
        assert!(breakdown.owner_payout < Decimal::ZERO);
    }

    #[test]
    fn rango_de_un_dia_es_valido() {
        let date = NaiveDate::from_ymd_opt(2026, 9, 10).unwrap();
        assert_eq!(day_count(date, date).unwrap(), 1);
    }

    #[test]
    fn rango_invertido_se_rechaza() {
        let start = NaiveDate::from_ymd_opt(2026, 9, 10).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 9, 9).unwrap();
        assert!(day_count(start, end).is_err());
    }

    #[test]
    fn ambos_extremos_cuentan() {
        let start = NaiveDate::from_ymd_opt(2026, 9, 10).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 9, 12).unwrap();
        assert_eq!(day_count(start, end).unwrap(), 3);
    }
}
