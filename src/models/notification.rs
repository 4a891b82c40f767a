//! Modelo de Notification
//!
//! Creadas como side effect por la máquina de estados y el settlement.
//! El `kind` solo categoriza para el cliente (icono/routing visual).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Categoría de la notificación - mapea al ENUM notification_kind
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "notification_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    BookingRequest,
    BookingApproved,
    BookingRejected,
    BookingCancelled,
    PaymentReceived,
    BookingCompleted,
    ReviewReceived,
}

/// Notification principal - mapea a la tabla notifications
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub user_email: String,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub booking_id: Option<Uuid>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Campos para crear una notificación nueva
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_email: String,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub booking_id: Option<Uuid>,
}
