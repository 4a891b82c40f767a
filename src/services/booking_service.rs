//! Máquina de estados del booking
//!
//! Gobierna las transiciones legales del status y sus side effects:
//! bloqueo/liberación de fechas, movimientos del ledger, acreditación de
//! ganancias y notificaciones. Los sub-pasos de cada transición se
//! ejecutan en orden, best-effort secuencial: el primer sub-paso que
//! falla se reporta al caller y lo ya aplicado queda committed (el store
//! no ofrece transacciones multi-documento entre entidades).

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::middleware::auth::AuthenticatedUser;
use crate::models::booking::{
    Booking, BookingStatus, CancelBookingRequest, CreateBookingRequest, CreateReviewRequest,
    PaymentStatus,
};
use crate::models::notification::{NewNotification, NotificationKind};
use crate::models::review::Review;
use crate::models::transaction::{NewTransaction, TransactionKind, TransactionRole, TransactionStatus};
use crate::repositories::{
    BookingStore, CouponStore, NewReview, OwnerEarningsStore, ReviewStore, TransactionStore,
    VehicleStore,
};
use crate::services::coupon_service::CouponService;
use crate::services::pricing_service::{compute_breakdown, day_count, platform_commission_rate};
use crate::services::refund_policy::refund_amount;
use crate::services::NotificationDispatcher;
use crate::utils::errors::{bad_request_error, illegal_transition_error, AppError};

pub struct BookingService {
    bookings: Arc<dyn BookingStore>,
    vehicles: Arc<dyn VehicleStore>,
    transactions: Arc<dyn TransactionStore>,
    earnings: Arc<dyn OwnerEarningsStore>,
    reviews: Arc<dyn ReviewStore>,
    coupons: CouponService,
    dispatcher: Arc<NotificationDispatcher>,
}

impl BookingService {
    pub fn new(
        bookings: Arc<dyn BookingStore>,
        vehicles: Arc<dyn VehicleStore>,
        transactions: Arc<dyn TransactionStore>,
        earnings: Arc<dyn OwnerEarningsStore>,
        reviews: Arc<dyn ReviewStore>,
        coupon_store: Arc<dyn CouponStore>,
        dispatcher: Arc<NotificationDispatcher>,
    ) -> Self {
        Self {
            bookings,
            vehicles,
            transactions,
            earnings,
            reviews,
            coupons: CouponService::new(coupon_store),
            dispatcher,
        }
    }

    /// Crear una solicitud de booking en `pending`
    ///
    /// El scan de conflictos es fetch-then-scan, no atómico con el
    /// insert: dos solicitudes concurrentes sobre las mismas fechas
    /// pueden pasar ambas. Hazard conocido y documentado, sin locking.
    pub async fn create_booking(
        &self,
        actor: &AuthenticatedUser,
        request: CreateBookingRequest,
    ) -> Result<Booking, AppError> {
        let vehicle = self
            .vehicles
            .find_by_id(request.vehicle_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Vehicle '{}' not found", request.vehicle_id)))?;

        if !vehicle.is_active || !vehicle.is_available {
            return Err(bad_request_error("Vehicle is not available for booking"));
        }

        let days = day_count(request.start_date, request.end_date)?;

        // Fechas bloqueadas manualmente o por bookings aprobados
        if vehicle
            .blocked_dates
            .iter()
            .any(|d| *d >= request.start_date && *d <= request.end_date)
        {
            return Err(AppError::Conflict(
                "Requested dates are blocked for this vehicle".to_string(),
            ));
        }

        // Scan lineal de bookings abiertos en busca de overlap
        let open_bookings = self.bookings.find_open_for_vehicle(vehicle.id).await?;
        if open_bookings
            .iter()
            .any(|b| b.overlaps(request.start_date, request.end_date))
        {
            return Err(AppError::Conflict(
                "Requested dates conflict with an existing booking".to_string(),
            ));
        }

        let extras_total: Decimal = request.extras.iter().map(|e| e.total).sum();
        let insurance_cost = request
            .insurance
            .as_ref()
            .map(|i| i.cost)
            .unwrap_or(Decimal::ZERO);

        // El cupón se valida contra el importe pre-descuento (sin fianza)
        let subtotal = vehicle.price_per_day * Decimal::from(days);
        let pre_discount = subtotal + subtotal * platform_commission_rate() + extras_total + insurance_cost;

        let coupon_discount = match &request.coupon_code {
            Some(code) => Some(
                self.coupons
                    .validate(code, pre_discount, &vehicle.vehicle_type, &actor.email, Utc::now())
                    .await?,
            ),
            None => None,
        };
        let discount_amount = coupon_discount
            .as_ref()
            .map(|d| d.discount_amount)
            .unwrap_or(Decimal::ZERO);

        let breakdown = compute_breakdown(
            vehicle.price_per_day,
            days,
            extras_total,
            insurance_cost,
            discount_amount,
            vehicle.security_deposit,
        );

        let now = Utc::now();
        let booking = Booking {
            id: Uuid::new_v4(),
            vehicle_id: vehicle.id,
            vehicle_title: vehicle.title.clone(),
            renter_id: actor.user_id,
            renter_email: actor.email.clone(),
            renter_name: actor.name.clone(),
            owner_id: vehicle.owner_id,
            owner_email: vehicle.owner_email.clone(),
            owner_name: vehicle.owner_name.clone(),
            start_date: request.start_date,
            end_date: request.end_date,
            total_days: days,
            price_per_day: vehicle.price_per_day,
            subtotal: breakdown.subtotal,
            platform_fee: breakdown.platform_fee,
            extras_total: breakdown.extras_total,
            insurance_cost: breakdown.insurance_cost,
            discount_amount: breakdown.discount_amount,
            coupon_code: coupon_discount.as_ref().map(|d| d.code.clone()),
            security_deposit: vehicle.security_deposit,
            total_amount: breakdown.total,
            owner_payout: breakdown.owner_payout,
            status: BookingStatus::Pending,
            payment_status: PaymentStatus::Unpaid,
            payment_intent_id: None,
            cancelled_by: None,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
        };

        let booking = self.bookings.create(booking).await?;

        // Canje del cupón ligado al booking recién confirmado
        if let Some(discount) = &coupon_discount {
            self.coupons
                .redeem(discount, booking.id, &actor.email, breakdown.total)
                .await?;
        }

        self.dispatcher
            .notify(NewNotification {
                user_email: booking.owner_email.clone(),
                title: "Nueva solicitud de reserva".to_string(),
                message: format!(
                    "{} quiere reservar '{}' del {} al {}",
                    booking.renter_name, booking.vehicle_title, booking.start_date, booking.end_date
                ),
                kind: NotificationKind::BookingRequest,
                booking_id: Some(booking.id),
            })
            .await;

        tracing::info!(booking_id = %booking.id, vehicle_id = %vehicle.id, "booking creado en pending");

        Ok(booking)
    }

    /// pending → approved: bloquea las fechas del rango y avisa al renter
    pub async fn approve(&self, actor: &AuthenticatedUser, booking_id: Uuid) -> Result<Booking, AppError> {
        let booking = self.get_owned(actor, booking_id).await?;
        self.check_transition(&booking, BookingStatus::Approved)?;

        let booking = self.bookings.set_status(booking.id, BookingStatus::Approved).await?;

        // Unión idempotente: fechas ya presentes no se duplican
        let mut vehicle = self
            .vehicles
            .find_by_id(booking.vehicle_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Vehicle '{}' not found", booking.vehicle_id)))?;
        vehicle.block_dates(&booking.date_range());
        self.vehicles
            .set_blocked_dates(vehicle.id, vehicle.blocked_dates)
            .await?;

        self.dispatcher
            .notify(NewNotification {
                user_email: booking.renter_email.clone(),
                title: "Reserva aprobada".to_string(),
                message: format!(
                    "Tu reserva de '{}' fue aprobada. Ya puedes proceder al pago.",
                    booking.vehicle_title
                ),
                kind: NotificationKind::BookingApproved,
                booking_id: Some(booking.id),
            })
            .await;

        tracing::info!(booking_id = %booking.id, "booking aprobado, fechas bloqueadas");

        Ok(booking)
    }

    /// pending → rejected: solo notifica, no había fechas bloqueadas
    pub async fn reject(&self, actor: &AuthenticatedUser, booking_id: Uuid) -> Result<Booking, AppError> {
        let booking = self.get_owned(actor, booking_id).await?;
        self.check_transition(&booking, BookingStatus::Rejected)?;

        let booking = self.bookings.set_status(booking.id, BookingStatus::Rejected).await?;

        self.dispatcher
            .notify(NewNotification {
                user_email: booking.renter_email.clone(),
                title: "Reserva rechazada".to_string(),
                message: format!("Tu reserva de '{}' fue rechazada.", booking.vehicle_title),
                kind: NotificationKind::BookingRejected,
                booking_id: Some(booking.id),
            })
            .await;

        Ok(booking)
    }

    /// paid → active: entrega física del vehículo, solo cambia el flag
    pub async fn start(&self, actor: &AuthenticatedUser, booking_id: Uuid) -> Result<Booking, AppError> {
        let booking = self.get_owned(actor, booking_id).await?;
        self.check_transition(&booking, BookingStatus::Active)?;

        let booking = self.bookings.set_status(booking.id, BookingStatus::Active).await?;

        tracing::info!(booking_id = %booking.id, "vehículo entregado, booking activo");

        Ok(booking)
    }

    /// active → completed: acredita al owner, libera la fianza y cierra
    /// los movimientos pendientes del ledger
    pub async fn complete(&self, actor: &AuthenticatedUser, booking_id: Uuid) -> Result<Booking, AppError> {
        let booking = self.get_owned(actor, booking_id).await?;
        self.check_transition(&booking, BookingStatus::Completed)?;

        let booking = self.bookings.set_status(booking.id, BookingStatus::Completed).await?;

        // (a) acreditar owner_payout al acumulado del propietario
        self.earnings
            .credit_earnings(&booking.owner_email, booking.owner_payout)
            .await?;

        // (b) contador de bookings del vehículo
        self.vehicles.increment_total_bookings(booking.vehicle_id).await?;

        // (c) payout pendiente → completed; (d) fianza: hold → completed
        // más un deposit_release nuevo para el renter
        let ledger = self.transactions.find_by_booking(booking.id).await?;
        for tx in &ledger {
            match tx.kind {
                TransactionKind::Payout if tx.status == TransactionStatus::Pending => {
                    self.transactions
                        .update_status(tx.id, TransactionStatus::Completed)
                        .await?;
                }
                TransactionKind::DepositHold if tx.status == TransactionStatus::Pending => {
                    self.transactions
                        .update_status(tx.id, TransactionStatus::Completed)
                        .await?;
                    self.transactions
                        .create(NewTransaction {
                            booking_id: booking.id,
                            user_email: booking.renter_email.clone(),
                            user_role: TransactionRole::Renter,
                            kind: TransactionKind::DepositRelease,
                            amount: booking.security_deposit,
                            status: TransactionStatus::Completed,
                            description: Some("Devolución de fianza".to_string()),
                        })
                        .await?;
                }
                _ => {}
            }
        }

        // (e) notificaciones de cierre para ambas partes
        self.dispatcher
            .notify(NewNotification {
                user_email: booking.renter_email.clone(),
                title: "Reserva completada".to_string(),
                message: format!(
                    "Tu reserva de '{}' se completó. La fianza será devuelta.",
                    booking.vehicle_title
                ),
                kind: NotificationKind::BookingCompleted,
                booking_id: Some(booking.id),
            })
            .await;
        self.dispatcher
            .notify(NewNotification {
                user_email: booking.owner_email.clone(),
                title: "Reserva completada".to_string(),
                message: format!(
                    "La reserva de '{}' se completó. Tu payout de {} está en camino.",
                    booking.vehicle_title, booking.owner_payout
                ),
                kind: NotificationKind::BookingCompleted,
                booking_id: Some(booking.id),
            })
            .await;

        tracing::info!(booking_id = %booking.id, payout = %booking.owner_payout, "booking completado");

        Ok(booking)
    }

    /// Cancelación por renter u owner, con reembolso por niveles
    pub async fn cancel(
        &self,
        actor: &AuthenticatedUser,
        booking_id: Uuid,
        request: CancelBookingRequest,
    ) -> Result<Booking, AppError> {
        let booking = self
            .bookings
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Booking '{}' not found", booking_id)))?;

        let cancelled_by = if actor.is_admin() {
            "admin"
        } else if actor.email == booking.renter_email {
            "renter"
        } else if actor.email == booking.owner_email {
            "owner"
        } else {
            return Err(AppError::Forbidden(
                "Only the renter or the owner can cancel this booking".to_string(),
            ));
        };

        self.check_transition(&booking, BookingStatus::Cancelled)?;

        let previous_status = booking.status;
        let money_moved = matches!(previous_status, BookingStatus::Paid | BookingStatus::Active);
        let refund = refund_amount(
            previous_status,
            booking.start_date,
            Utc::now(),
            booking.subtotal,
            booking.security_deposit,
        );

        let booking = self
            .bookings
            .mark_cancelled(booking.id, cancelled_by, &request.reason)
            .await?;

        if money_moved {
            self.transactions
                .create(NewTransaction {
                    booking_id: booking.id,
                    user_email: booking.renter_email.clone(),
                    user_role: TransactionRole::Renter,
                    kind: TransactionKind::Refund,
                    amount: refund,
                    status: TransactionStatus::Completed,
                    description: Some(format!("Reembolso por cancelación ({})", cancelled_by)),
                })
                .await?;

            let ledger = self.transactions.find_by_booking(booking.id).await?;
            for tx in &ledger {
                match tx.kind {
                    TransactionKind::Payment if tx.status == TransactionStatus::Completed => {
                        self.transactions
                            .update_status(tx.id, TransactionStatus::Refunded)
                            .await?;
                    }
                    TransactionKind::Payout if tx.status == TransactionStatus::Pending => {
                        self.transactions
                            .update_status(tx.id, TransactionStatus::Cancelled)
                            .await?;
                    }
                    TransactionKind::DepositHold if tx.status == TransactionStatus::Pending => {
                        self.transactions
                            .update_status(tx.id, TransactionStatus::Cancelled)
                            .await?;
                    }
                    _ => {}
                }
            }
        }

        // Liberar fechas si la aprobación llegó a bloquearlas
        if previous_status != BookingStatus::Pending {
            let mut vehicle = self
                .vehicles
                .find_by_id(booking.vehicle_id)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(format!("Vehicle '{}' not found", booking.vehicle_id))
                })?;
            vehicle.unblock_dates(&booking.date_range());
            self.vehicles
                .set_blocked_dates(vehicle.id, vehicle.blocked_dates)
                .await?;
        }

        // Avisar a la contraparte; si cancela un admin, a ambas partes
        let recipients = match cancelled_by {
            "renter" => vec![booking.owner_email.clone()],
            "owner" => vec![booking.renter_email.clone()],
            _ => vec![booking.renter_email.clone(), booking.owner_email.clone()],
        };
        for user_email in recipients {
            self.dispatcher
                .notify(NewNotification {
                    user_email,
                    title: "Reserva cancelada".to_string(),
                    message: format!(
                        "La reserva de '{}' fue cancelada por {}. Motivo: {}",
                        booking.vehicle_title, cancelled_by, request.reason
                    ),
                    kind: NotificationKind::BookingCancelled,
                    booking_id: Some(booking.id),
                })
                .await;
        }

        tracing::info!(
            booking_id = %booking.id,
            cancelled_by,
            refund = %refund,
            "booking cancelado"
        );

        Ok(booking)
    }

    /// Reseña sobre un booking completado, una por (booking, renter).
    /// Los agregados del vehículo se recalculan sobre el set completo de
    /// reseñas, no como media incremental.
    pub async fn create_review(
        &self,
        actor: &AuthenticatedUser,
        booking_id: Uuid,
        request: CreateReviewRequest,
    ) -> Result<Review, AppError> {
        let booking = self
            .bookings
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Booking '{}' not found", booking_id)))?;

        if actor.email != booking.renter_email {
            return Err(AppError::Forbidden(
                "Only the renter can review this booking".to_string(),
            ));
        }
        if booking.status != BookingStatus::Completed {
            return Err(AppError::Conflict(
                "Reviews are only allowed on completed bookings".to_string(),
            ));
        }
        if self
            .reviews
            .find_by_booking_and_reviewer(booking.id, &actor.email)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "This booking has already been reviewed".to_string(),
            ));
        }

        let review = self
            .reviews
            .create(NewReview {
                booking_id: booking.id,
                vehicle_id: booking.vehicle_id,
                reviewer_email: actor.email.clone(),
                rating: request.rating,
                comment: request.comment,
            })
            .await?;

        // Recalcular agregados sobre todas las reseñas del vehículo
        let all_reviews = self.reviews.find_by_vehicle(booking.vehicle_id).await?;
        let total = all_reviews.len() as i32;
        let sum: i64 = all_reviews.iter().map(|r| r.rating as i64).sum();
        let average = (Decimal::from(sum) / Decimal::from(total)).round_dp(2);
        self.vehicles
            .update_rating(booking.vehicle_id, average, total)
            .await?;

        self.dispatcher
            .notify(NewNotification {
                user_email: booking.owner_email.clone(),
                title: "Nueva reseña".to_string(),
                message: format!(
                    "'{}' recibió una reseña de {} estrellas",
                    booking.vehicle_title, review.rating
                ),
                kind: NotificationKind::ReviewReceived,
                booking_id: Some(booking.id),
            })
            .await;

        Ok(review)
    }

    /// Booking visible solo para sus partes (o admin)
    pub async fn get_booking(&self, actor: &AuthenticatedUser, booking_id: Uuid) -> Result<Booking, AppError> {
        let booking = self
            .bookings
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Booking '{}' not found", booking_id)))?;

        if !actor.is_admin()
            && actor.email != booking.renter_email
            && actor.email != booking.owner_email
        {
            return Err(AppError::Forbidden(
                "You are not a party to this booking".to_string(),
            ));
        }

        Ok(booking)
    }

    pub async fn list_bookings(&self, actor: &AuthenticatedUser) -> Result<Vec<Booking>, AppError> {
        self.bookings.list_for_user(&actor.email).await
    }

    /// Fetch + autorización owner/admin para las acciones del propietario
    async fn get_owned(&self, actor: &AuthenticatedUser, booking_id: Uuid) -> Result<Booking, AppError> {
        let booking = self
            .bookings
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Booking '{}' not found", booking_id)))?;

        if !actor.is_admin() && actor.email != booking.owner_email {
            return Err(AppError::Forbidden(
                "Only the owner or an admin can perform this action".to_string(),
            ));
        }

        Ok(booking)
    }

    fn check_transition(&self, booking: &Booking, next: BookingStatus) -> Result<(), AppError> {
        if !booking.status.can_transition_to(next) {
            return Err(illegal_transition_error(booking.status.as_str(), next.as_str()));
        }
        Ok(())
    }
}
