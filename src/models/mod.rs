//! Modelos del marketplace de alquiler
//!
//! Cada entidad tiene su struct explícito y sus campos de estado/tipo como
//! enums cerrados en lugar de strings libres.

pub mod booking;
pub mod coupon;
pub mod notification;
pub mod response;
pub mod review;
pub mod transaction;
pub mod user;
pub mod vehicle;

pub use booking::{Booking, BookingStatus, PaymentStatus};
pub use coupon::{Coupon, CouponDiscountType, CouponUsage};
pub use notification::{Notification, NotificationKind};
pub use response::ApiResponse;
pub use review::Review;
pub use transaction::{Transaction, TransactionKind, TransactionRole, TransactionStatus};
pub use user::OwnerEarnings;
pub use vehicle::Vehicle;
