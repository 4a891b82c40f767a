//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum. Los servicios se construyen una vez
//! sobre los repositorios Postgres y se comparten vía Arc.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::EnvironmentConfig;
use crate::repositories::{
    NotificationStore, PgBookingRepository, PgCouponRepository, PgNotificationRepository,
    PgOwnerEarningsRepository, PgReviewRepository, PgTransactionRepository, PgVehicleRepository,
};
use crate::services::{
    BookingService, CouponService, HttpMailer, LogInvoiceGenerator, NotificationDispatcher,
    SettlementService,
};

#[derive(Clone)]
pub struct AppState {
    pub config: EnvironmentConfig,
    pub bookings: Arc<BookingService>,
    pub settlement: Arc<SettlementService>,
    pub coupons: Arc<CouponService>,
    pub notifications: Arc<dyn NotificationStore>,
}

impl AppState {
    pub fn new(pool: PgPool, config: EnvironmentConfig) -> Self {
        let booking_store = Arc::new(PgBookingRepository::new(pool.clone()));
        let vehicle_store = Arc::new(PgVehicleRepository::new(pool.clone()));
        let transaction_store = Arc::new(PgTransactionRepository::new(pool.clone()));
        let coupon_store = Arc::new(PgCouponRepository::new(pool.clone()));
        let notification_store: Arc<dyn NotificationStore> =
            Arc::new(PgNotificationRepository::new(pool.clone()));
        let review_store = Arc::new(PgReviewRepository::new(pool.clone()));
        let earnings_store = Arc::new(PgOwnerEarningsRepository::new(pool));

        let dispatcher = Arc::new(NotificationDispatcher::new(
            notification_store.clone(),
            Arc::new(HttpMailer::from_config(&config)),
        ));

        let bookings = Arc::new(BookingService::new(
            booking_store.clone(),
            vehicle_store,
            transaction_store.clone(),
            earnings_store,
            review_store,
            coupon_store.clone(),
            dispatcher.clone(),
        ));

        let settlement = Arc::new(SettlementService::new(
            booking_store,
            transaction_store,
            Arc::new(LogInvoiceGenerator),
            dispatcher,
        ));

        let coupons = Arc::new(CouponService::new(coupon_store));

        Self {
            config,
            bookings,
            settlement,
            coupons,
            notifications: notification_store,
        }
    }
}
