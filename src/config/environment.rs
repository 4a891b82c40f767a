//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno y variables de configuración.

use std::env;

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub jwt_secret: String,
    pub cors_origins: Vec<String>,
    /// Secreto compartido para verificar webhooks de Stripe
    pub stripe_webhook_secret: String,
    /// Ventana de tolerancia del timestamp de la firma (segundos)
    pub stripe_signature_tolerance: i64,
    /// Relay de email saliente; si falta, el envío queda en modo log-only
    pub email_api_url: Option<String>,
    pub email_api_key: Option<String>,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("PORT must be a valid number"),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            cors_origins: env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            stripe_webhook_secret: env::var("STRIPE_WEBHOOK_SECRET")
                .expect("STRIPE_WEBHOOK_SECRET must be set"),
            stripe_signature_tolerance: env::var("STRIPE_SIGNATURE_TOLERANCE_SECONDS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .expect("STRIPE_SIGNATURE_TOLERANCE_SECONDS must be a valid number"),
            email_api_url: env::var("EMAIL_API_URL").ok(),
            email_api_key: env::var("EMAIL_API_KEY").ok(),
        }
    }
}

impl EnvironmentConfig {
    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Verificar si estamos en modo producción
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
