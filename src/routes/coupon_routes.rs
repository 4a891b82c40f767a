//! Rutas de cupones

use axum::{extract::State, routing::post, Extension, Json, Router};
use chrono::Utc;
use validator::Validate;

use crate::middleware::auth::AuthenticatedUser;
use crate::models::coupon::{CouponDiscount, ValidateCouponRequest};
use crate::models::response::ApiResponse;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_coupon_router() -> Router<AppState> {
    Router::new().route("/validate", post(validate_coupon))
}

/// Dry-run: resuelve el descuento sin registrar ningún canje
async fn validate_coupon(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<ValidateCouponRequest>,
) -> Result<Json<ApiResponse<CouponDiscount>>, AppError> {
    request.validate()?;
    let discount = state
        .coupons
        .validate(
            &request.code,
            request.booking_amount,
            &request.vehicle_type,
            &user.email,
            Utc::now(),
        )
        .await?;
    Ok(Json(ApiResponse::success(discount)))
}
