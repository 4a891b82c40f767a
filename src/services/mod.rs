//! Services module
//!
//! Este módulo contiene la lógica de negocio: pricing, política de
//! reembolsos, cupones, la máquina de estados del booking, el settlement
//! de pagos y el dispatch de notificaciones.

pub mod booking_service;
pub mod coupon_service;
pub mod notification_service;
pub mod pricing_service;
pub mod refund_policy;
pub mod settlement_service;

pub use booking_service::BookingService;
pub use coupon_service::CouponService;
pub use notification_service::{HttpMailer, Mailer, NotificationDispatcher};
pub use pricing_service::{compute_breakdown, day_count, PricingBreakdown};
pub use refund_policy::{days_until_start, refund_amount};
pub use settlement_service::{InvoiceGenerator, LogInvoiceGenerator, SettlementService, StripeEvent};
