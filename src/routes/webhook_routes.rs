//! Webhook de settlement de pagos
//!
//! Entra con el body crudo + header `stripe-signature`. La verificación
//! falla cerrado: firma inválida o ausente → 400 sin side effects. El
//! handler responde `{"received":true}` al proveedor aunque los side
//! effects best-effort hayan fallado, para que no reintente un evento ya
//! liquidado financieramente.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};

use crate::services::StripeEvent;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::stripe_signature::verify_signature;

pub fn create_webhook_router() -> Router<AppState> {
    Router::new().route("/stripe", post(stripe_webhook))
}

async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Err(e) = verify_signature(
        &body,
        &headers,
        &state.config.stripe_webhook_secret,
        state.config.stripe_signature_tolerance,
    ) {
        return e.into_response();
    }

    let event: StripeEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            return AppError::BadRequest(format!("Malformed webhook payload: {}", e))
                .into_response()
        }
    };

    match state.settlement.handle_event(event).await {
        Ok(ack) => Json(ack).into_response(),
        Err(e) => settlement_error_response(e),
    }
}

/// El proveedor de pagos espera `{"error": mensaje}` plano en los 500;
/// el resto de errores (404, 409, 400) conserva el formato general.
fn settlement_error_response(error: AppError) -> Response {
    match error {
        e @ (AppError::Database(_) | AppError::Internal(_) | AppError::ExternalApi(_)) => {
            tracing::error!("fallo interno en settlement: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response()
        }
        e => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn error_interno_devuelve_body_plano() {
        let response = settlement_error_response(AppError::Internal("boom".to_string()));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body, serde_json::json!({ "error": "Internal server error: boom" }));
    }

    #[tokio::test]
    async fn not_found_conserva_el_formato_general() {
        let response =
            settlement_error_response(AppError::NotFound("Booking 'x' not found".to_string()));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["error"], "Not Found");
        assert_eq!(body["code"], "NOT_FOUND");
    }
}
