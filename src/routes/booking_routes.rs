//! Rutas de bookings
//!
//! Todas las transiciones de estado pasan por aquí salvo approved→paid,
//! que solo dispara el settlement del webhook de pagos.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::middleware::auth::AuthenticatedUser;
use crate::models::booking::{Booking, CancelBookingRequest, CreateBookingRequest, CreateReviewRequest};
use crate::models::response::ApiResponse;
use crate::models::review::Review;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_booking_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_booking))
        .route("/", get(list_bookings))
        .route("/:id", get(get_booking))
        .route("/:id/approve", post(approve_booking))
        .route("/:id/reject", post(reject_booking))
        .route("/:id/start", post(start_booking))
        .route("/:id/complete", post(complete_booking))
        .route("/:id/cancel", post(cancel_booking))
        .route("/:id/review", post(create_review))
}

async fn create_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<Json<ApiResponse<Booking>>, AppError> {
    request.validate()?;
    let booking = state.bookings.create_booking(&user, request).await?;
    Ok(Json(ApiResponse::success_with_message(
        booking,
        "Solicitud de reserva creada".to_string(),
    )))
}

async fn list_bookings(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let bookings = state.bookings.list_bookings(&user).await?;
    Ok(Json(bookings))
}

async fn get_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    let booking = state.bookings.get_booking(&user, id).await?;
    Ok(Json(booking))
}

async fn approve_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Booking>>, AppError> {
    let booking = state.bookings.approve(&user, id).await?;
    Ok(Json(ApiResponse::success_with_message(
        booking,
        "Reserva aprobada".to_string(),
    )))
}

async fn reject_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Booking>>, AppError> {
    let booking = state.bookings.reject(&user, id).await?;
    Ok(Json(ApiResponse::success_with_message(
        booking,
        "Reserva rechazada".to_string(),
    )))
}

async fn start_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Booking>>, AppError> {
    let booking = state.bookings.start(&user, id).await?;
    Ok(Json(ApiResponse::success_with_message(
        booking,
        "Vehículo entregado, reserva activa".to_string(),
    )))
}

async fn complete_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Booking>>, AppError> {
    let booking = state.bookings.complete(&user, id).await?;
    Ok(Json(ApiResponse::success_with_message(
        booking,
        "Reserva completada".to_string(),
    )))
}

async fn cancel_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<CancelBookingRequest>,
) -> Result<Json<ApiResponse<Booking>>, AppError> {
    request.validate()?;
    let booking = state.bookings.cancel(&user, id, request).await?;
    Ok(Json(ApiResponse::success_with_message(
        booking,
        "Reserva cancelada".to_string(),
    )))
}

async fn create_review(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<CreateReviewRequest>,
) -> Result<Json<ApiResponse<Review>>, AppError> {
    request.validate()?;
    let review = state.bookings.create_review(&user, id, request).await?;
    Ok(Json(ApiResponse::success_with_message(
        review,
        "Reseña publicada".to_string(),
    )))
}
