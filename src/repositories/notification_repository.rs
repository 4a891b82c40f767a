//! Repositorio de notificaciones

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::notification::{NewNotification, Notification};
use crate::utils::errors::AppError;

/// Contrato del store de notificaciones
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn create(&self, notification: NewNotification) -> Result<Notification, AppError>;

    async fn list_for_user(&self, user_email: &str) -> Result<Vec<Notification>, AppError>;

    async fn mark_read(&self, id: Uuid, user_email: &str) -> Result<Notification, AppError>;
}

pub struct PgNotificationRepository {
    pool: PgPool,
}

impl PgNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationStore for PgNotificationRepository {
    async fn create(&self, notification: NewNotification) -> Result<Notification, AppError> {
        let created = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications
                (id, user_email, title, message, kind, booking_id, is_read, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, false, NOW())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&notification.user_email)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.kind)
        .bind(notification.booking_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn list_for_user(&self, user_email: &str) -> Result<Vec<Notification>, AppError> {
        let notifications = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE user_email = $1 ORDER BY created_at DESC",
        )
        .bind(user_email)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    async fn mark_read(&self, id: Uuid, user_email: &str) -> Result<Notification, AppError> {
        let notification = sqlx::query_as::<_, Notification>(
            "UPDATE notifications SET is_read = true WHERE id = $1 AND user_email = $2 RETURNING *",
        )
        .bind(id)
        .bind(user_email)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Notification '{}' not found", id)))?;

        Ok(notification)
    }
}
