//! Routers de la API

pub mod booking_routes;
pub mod coupon_routes;
pub mod notification_routes;
pub mod webhook_routes;
