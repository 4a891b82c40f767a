//! Modelo de Transaction
//!
//! Ledger append-only ligado a un booking: varias transacciones por
//! booking. Nunca se borran; solo cambia su status en transiciones
//! posteriores (completado, cancelación).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Tipo de movimiento - mapea al ENUM transaction_kind
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "transaction_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Payment,
    Payout,
    Commission,
    DepositHold,
    DepositRelease,
    Refund,
}

/// Estado del movimiento - mapea al ENUM transaction_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "transaction_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Refunded,
    Cancelled,
    Failed,
}

/// Rol del usuario en el movimiento - mapea al ENUM transaction_role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "transaction_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransactionRole {
    Renter,
    Owner,
    Platform,
}

/// Transaction principal - mapea a la tabla transactions
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Transaction {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub user_email: String,
    pub user_role: TransactionRole,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub status: TransactionStatus,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Campos para insertar un movimiento nuevo en el ledger
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub booking_id: Uuid,
    pub user_email: String,
    pub user_role: TransactionRole,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub status: TransactionStatus,
    pub description: Option<String>,
}
