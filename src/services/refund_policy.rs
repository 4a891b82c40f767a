//! Política de cancelación y reembolso
//!
//! Función pura de (status actual, fecha de inicio, ahora) al importe a
//! reembolsar. La comisión de la plataforma no se devuelve nunca; la
//! fianza se devuelve siempre que quede al menos 1 día de antelación.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::models::booking::BookingStatus;

/// Días hasta el inicio del booking: `ceil((start − now) / 1 día)`,
/// con el inicio anclado a medianoche UTC.
pub fn days_until_start(start_date: NaiveDate, now: DateTime<Utc>) -> i64 {
    let start = start_date
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always valid")
        .and_utc();
    let seconds = (start - now).num_seconds();
    (seconds + 86_399).div_euclid(86_400)
}

/// Importe a reembolsar al cancelar
///
/// Sin pago efectuado (`pending`/`approved`) no hay nada que devolver.
/// Con dinero movido, el tramo del alquiler se devuelve por niveles de
/// antelación y la fianza se devuelve salvo cancelación el mismo día:
/// - ≥ 7 días: subtotal + fianza
/// - 3–6 días: 50% del subtotal + fianza
/// - 1–2 días: solo la fianza
/// - < 1 día: nada
pub fn refund_amount(
    status: BookingStatus,
    start_date: NaiveDate,
    now: DateTime<Utc>,
    subtotal: Decimal,
    security_deposit: Decimal,
) -> Decimal {
    if matches!(status, BookingStatus::Pending | BookingStatus::Approved) {
        return Decimal::ZERO;
    }

    let days = days_until_start(start_date, now);
    if days >= 7 {
        subtotal + security_deposit
    } else if days >= 3 {
        subtotal / Decimal::TWO + security_deposit
    } else if days >= 1 {
        security_deposit
    } else {
        Decimal::ZERO
    }
}
