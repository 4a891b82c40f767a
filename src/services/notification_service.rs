//! Dispatch de notificaciones y email saliente
//!
//! Todo lo que sale de aquí es best-effort: un fallo al crear la
//! notificación o al enviar el email se loguea y se traga, nunca bloquea
//! ni revierte la transición financiera que lo disparó.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::EnvironmentConfig;
use crate::models::notification::NewNotification;
use crate::repositories::NotificationStore;
use crate::utils::errors::AppError;

/// Colaborador de email saliente (fire-and-forget, texto plano)
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), AppError>;
}

/// Mailer que hace POST JSON a un relay HTTP configurado. Si no hay
/// `EMAIL_API_URL` queda en modo log-only.
pub struct HttpMailer {
    client: reqwest::Client,
    api_url: Option<String>,
    api_key: Option<String>,
}

impl HttpMailer {
    pub fn from_config(config: &EnvironmentConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.email_api_url.clone(),
            api_key: config.email_api_key.clone(),
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), AppError> {
        let Some(api_url) = &self.api_url else {
            tracing::info!(to, subject, "email relay no configurado, email omitido");
            return Ok(());
        };

        let mut request = self.client.post(api_url).json(&serde_json::json!({
            "to": to,
            "subject": subject,
            "body": body,
        }));

        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::ExternalApi(format!("email relay error: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalApi(format!(
                "email relay returned {}",
                response.status()
            )));
        }

        Ok(())
    }
}

/// Fan-out de side effects de la máquina de estados y el settlement
pub struct NotificationDispatcher {
    notifications: Arc<dyn NotificationStore>,
    mailer: Arc<dyn Mailer>,
}

impl NotificationDispatcher {
    pub fn new(notifications: Arc<dyn NotificationStore>, mailer: Arc<dyn Mailer>) -> Self {
        Self { notifications, mailer }
    }

    /// Crear una notificación in-app; el fallo se loguea y se traga
    pub async fn notify(&self, notification: NewNotification) {
        let user_email = notification.user_email.clone();
        if let Err(e) = self.notifications.create(notification).await {
            tracing::warn!(user_email, "fallo creando notificación: {}", e);
        }
    }

    /// Enviar un email; el fallo se loguea y se traga
    pub async fn email(&self, to: &str, subject: &str, body: &str) {
        if let Err(e) = self.mailer.send(to, subject, body).await {
            tracing::warn!(to, subject, "fallo enviando email: {}", e);
        }
    }
}
