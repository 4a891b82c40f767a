//! Repositorio del ledger de transacciones

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::transaction::{NewTransaction, Transaction, TransactionStatus};
use crate::utils::errors::AppError;

/// Contrato del store del ledger. Append-only: las filas nunca se borran,
/// solo cambia su status.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn create(&self, tx: NewTransaction) -> Result<Transaction, AppError>;

    async fn find_by_booking(&self, booking_id: Uuid) -> Result<Vec<Transaction>, AppError>;

    async fn update_status(
        &self,
        id: Uuid,
        status: TransactionStatus,
    ) -> Result<Transaction, AppError>;
}

pub struct PgTransactionRepository {
    pool: PgPool,
}

impl PgTransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionStore for PgTransactionRepository {
    async fn create(&self, tx: NewTransaction) -> Result<Transaction, AppError> {
        let transaction = sqlx::query_as::<_, Transaction>(
            r#"
            INSERT INTO transactions
                (id, booking_id, user_email, user_role, kind, amount, status, description, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(tx.booking_id)
        .bind(&tx.user_email)
        .bind(tx.user_role)
        .bind(tx.kind)
        .bind(tx.amount)
        .bind(tx.status)
        .bind(&tx.description)
        .fetch_one(&self.pool)
        .await?;

        Ok(transaction)
    }

    async fn find_by_booking(&self, booking_id: Uuid) -> Result<Vec<Transaction>, AppError> {
        let transactions = sqlx::query_as::<_, Transaction>(
            "SELECT * FROM transactions WHERE booking_id = $1 ORDER BY created_at ASC",
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(transactions)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: TransactionStatus,
    ) -> Result<Transaction, AppError> {
        let transaction = sqlx::query_as::<_, Transaction>(
            "UPDATE transactions SET status = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        Ok(transaction)
    }
}
