//! Repositorios de acceso a datos
//!
//! Cada familia de entidades expone un trait de store con alcance acotado
//! (el contrato del document store) y su implementación PostgreSQL. Los
//! servicios reciben `Arc<dyn …Store>`, lo que permite sustituir el store
//! por uno en memoria en los tests.

pub mod booking_repository;
pub mod coupon_repository;
pub mod notification_repository;
pub mod review_repository;
pub mod transaction_repository;
pub mod user_repository;
pub mod vehicle_repository;

pub use booking_repository::{BookingStore, PgBookingRepository};
pub use coupon_repository::{CouponStore, PgCouponRepository};
pub use notification_repository::{NotificationStore, PgNotificationRepository};
pub use review_repository::{NewReview, PgReviewRepository, ReviewStore};
pub use transaction_repository::{PgTransactionRepository, TransactionStore};
pub use user_repository::{OwnerEarningsStore, PgOwnerEarningsRepository};
pub use vehicle_repository::{PgVehicleRepository, VehicleStore};
