//! Settlement de pagos disparado por webhook
//!
//! Reacciona al checkout completado del proveedor de pagos: transiciona
//! el booking `approved → paid`, abre los movimientos del ledger y lanza
//! los side effects best-effort (factura, emails, notificaciones). La
//! firma del webhook ya viene verificada por la ruta; aquí solo llega el
//! evento parseado.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::models::booking::{Booking, BookingStatus, PaymentStatus};
use crate::models::notification::{NewNotification, NotificationKind};
use crate::models::transaction::{NewTransaction, TransactionKind, TransactionRole, TransactionStatus};
use crate::repositories::{BookingStore, TransactionStore};
use crate::services::NotificationDispatcher;
use crate::utils::errors::{illegal_transition_error, AppError};

/// Evento crudo de Stripe
#[derive(Debug, Clone, Deserialize)]
pub struct StripeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: StripeEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeEventData {
    pub object: serde_json::Value,
}

/// Sesión de checkout completada, con el booking en metadata
#[derive(Debug, Deserialize)]
struct CheckoutSession {
    #[serde(default)]
    payment_intent: Option<String>,
    #[serde(default)]
    metadata: CheckoutMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct CheckoutMetadata {
    #[serde(default)]
    booking_id: Option<String>,
}

/// Generación de factura, colaborador externo best-effort: la factura es
/// un adjunto de conveniencia, nunca un registro financiero.
#[async_trait]
pub trait InvoiceGenerator: Send + Sync {
    async fn generate(&self, booking: &Booking) -> Result<(), AppError>;
}

/// Implementación por defecto: deja constancia en el log
pub struct LogInvoiceGenerator;

#[async_trait]
impl InvoiceGenerator for LogInvoiceGenerator {
    async fn generate(&self, booking: &Booking) -> Result<(), AppError> {
        tracing::info!(booking_id = %booking.id, total = %booking.total_amount, "generación de factura solicitada");
        Ok(())
    }
}

pub struct SettlementService {
    bookings: Arc<dyn BookingStore>,
    transactions: Arc<dyn TransactionStore>,
    invoices: Arc<dyn InvoiceGenerator>,
    dispatcher: Arc<NotificationDispatcher>,
}

impl SettlementService {
    pub fn new(
        bookings: Arc<dyn BookingStore>,
        transactions: Arc<dyn TransactionStore>,
        invoices: Arc<dyn InvoiceGenerator>,
        dispatcher: Arc<NotificationDispatcher>,
    ) -> Self {
        Self {
            bookings,
            transactions,
            invoices,
            dispatcher,
        }
    }

    /// Procesar un evento ya verificado. Devuelve el ack para el
    /// proveedor; tipos de evento desconocidos se reconocen y se ignoran
    /// para que el proveedor no reintente.
    pub async fn handle_event(&self, event: StripeEvent) -> Result<serde_json::Value, AppError> {
        match event.event_type.as_str() {
            "checkout.session.completed" => self.handle_checkout_completed(&event).await,
            other => {
                tracing::info!(event_type = other, event_id = %event.id, "tipo de evento ignorado");
                Ok(serde_json::json!({ "received": true }))
            }
        }
    }

    async fn handle_checkout_completed(
        &self,
        event: &StripeEvent,
    ) -> Result<serde_json::Value, AppError> {
        let session: CheckoutSession = serde_json::from_value(event.data.object.clone())
            .map_err(|e| AppError::BadRequest(format!("Malformed checkout session: {}", e)))?;

        let booking_id = session
            .metadata
            .booking_id
            .as_deref()
            .ok_or_else(|| AppError::BadRequest("Missing booking_id in event metadata".to_string()))?;
        let booking_id = Uuid::parse_str(booking_id)
            .map_err(|_| AppError::BadRequest(format!("Invalid booking_id '{}'", booking_id)))?;

        let payment_intent = session.payment_intent.unwrap_or_else(|| event.id.clone());

        // 1. Lookup: booking desconocido es fallo duro (404), los
        //    reintentos son cosa del proveedor
        let booking = self
            .bookings
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Booking '{}' not found", booking_id)))?;

        // 2. Idempotencia: una entrega duplicada del mismo intent no debe
        //    duplicar el ledger; se reconoce sin side effects
        if booking.payment_status == PaymentStatus::Paid {
            if booking.payment_intent_id.as_deref() == Some(payment_intent.as_str()) {
                tracing::info!(
                    booking_id = %booking.id,
                    payment_intent,
                    "webhook duplicado para un booking ya liquidado, ack sin side effects"
                );
                return Ok(serde_json::json!({ "received": true }));
            }
            return Err(AppError::Conflict(format!(
                "Booking '{}' already paid with a different payment intent",
                booking.id
            )));
        }

        if !booking.status.can_transition_to(BookingStatus::Paid) {
            return Err(illegal_transition_error(booking.status.as_str(), "paid"));
        }

        // 3. Transición canónica approved → paid
        let booking = self.bookings.mark_paid(booking.id, &payment_intent).await?;

        // 4. Ledger en orden: payment, payout, commission, deposit_hold.
        //    El orden importa para auditoría, no para corrección.
        self.transactions
            .create(NewTransaction {
                booking_id: booking.id,
                user_email: booking.renter_email.clone(),
                user_role: TransactionRole::Renter,
                kind: TransactionKind::Payment,
                amount: booking.total_amount,
                status: TransactionStatus::Completed,
                description: Some(format!("Pago de la reserva '{}'", booking.vehicle_title)),
            })
            .await?;
        self.transactions
            .create(NewTransaction {
                booking_id: booking.id,
                user_email: booking.owner_email.clone(),
                user_role: TransactionRole::Owner,
                kind: TransactionKind::Payout,
                amount: booking.owner_payout,
                status: TransactionStatus::Pending,
                description: Some("Payout pendiente de completar la reserva".to_string()),
            })
            .await?;
        self.transactions
            .create(NewTransaction {
                booking_id: booking.id,
                user_email: "platform".to_string(),
                user_role: TransactionRole::Platform,
                kind: TransactionKind::Commission,
                amount: booking.platform_fee,
                status: TransactionStatus::Completed,
                description: Some("Comisión de la plataforma (15%)".to_string()),
            })
            .await?;
        if booking.security_deposit > Decimal::ZERO {
            self.transactions
                .create(NewTransaction {
                    booking_id: booking.id,
                    user_email: booking.renter_email.clone(),
                    user_role: TransactionRole::Renter,
                    kind: TransactionKind::DepositHold,
                    amount: booking.security_deposit,
                    status: TransactionStatus::Pending,
                    description: Some("Fianza retenida".to_string()),
                })
                .await?;
        }

        // 5. Factura best-effort: el fallo se loguea y se traga
        if let Err(e) = self.invoices.generate(&booking).await {
            tracing::warn!(booking_id = %booking.id, "fallo generando factura: {}", e);
        }

        // 6. Emails y notificaciones best-effort, nunca revierten 3–4
        self.dispatcher
            .email(
                &booking.renter_email,
                "Pago confirmado",
                &format!(
                    "Tu pago de {} por '{}' fue confirmado. Reserva del {} al {}.",
                    booking.total_amount, booking.vehicle_title, booking.start_date, booking.end_date
                ),
            )
            .await;
        self.dispatcher
            .email(
                &booking.owner_email,
                "Reserva pagada",
                &format!(
                    "'{}' tiene una reserva pagada del {} al {}. Payout previsto: {}.",
                    booking.vehicle_title, booking.start_date, booking.end_date, booking.owner_payout
                ),
            )
            .await;
        self.dispatcher
            .notify(NewNotification {
                user_email: booking.renter_email.clone(),
                title: "Pago confirmado".to_string(),
                message: format!("Tu pago por '{}' fue confirmado", booking.vehicle_title),
                kind: NotificationKind::PaymentReceived,
                booking_id: Some(booking.id),
            })
            .await;
        self.dispatcher
            .notify(NewNotification {
                user_email: booking.owner_email.clone(),
                title: "Reserva pagada".to_string(),
                message: format!("La reserva de '{}' fue pagada", booking.vehicle_title),
                kind: NotificationKind::PaymentReceived,
                booking_id: Some(booking.id),
            })
            .await;

        tracing::info!(
            booking_id = %booking.id,
            payment_intent,
            total = %booking.total_amount,
            "settlement completado"
        );

        // 7. Ack al proveedor aunque 5–6 hayan fallado parcialmente
        Ok(serde_json::json!({ "received": true }))
    }
}
