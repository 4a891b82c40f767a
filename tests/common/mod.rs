//! Dobles en memoria de los stores para los tests de integración
//!
//! Implementan los mismos traits que los repositorios Postgres, de modo
//! que los servicios se ejercitan completos sin base de datos.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use rental_marketplace::middleware::auth::AuthenticatedUser;
use rental_marketplace::models::booking::{Booking, BookingStatus, PaymentStatus};
use rental_marketplace::models::coupon::{Coupon, CouponUsage, NewCouponUsage};
use rental_marketplace::models::notification::{NewNotification, Notification};
use rental_marketplace::models::review::Review;
use rental_marketplace::models::transaction::{NewTransaction, Transaction, TransactionStatus};
use rental_marketplace::models::user::OwnerEarnings;
use rental_marketplace::models::vehicle::Vehicle;
use rental_marketplace::repositories::{
    BookingStore, CouponStore, NewReview, NotificationStore, OwnerEarningsStore, ReviewStore,
    TransactionStore, VehicleStore,
};
use rental_marketplace::services::{
    BookingService, InvoiceGenerator, Mailer, NotificationDispatcher, SettlementService,
    StripeEvent,
};
use rental_marketplace::utils::errors::AppError;

#[derive(Default)]
pub struct InMemoryBookingStore {
    pub bookings: Mutex<Vec<Booking>>,
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn create(&self, booking: Booking) -> Result<Booking, AppError> {
        self.bookings.lock().unwrap().push(booking.clone());
        Ok(booking)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>, AppError> {
        Ok(self.bookings.lock().unwrap().iter().find(|b| b.id == id).cloned())
    }

    async fn find_open_for_vehicle(&self, vehicle_id: Uuid) -> Result<Vec<Booking>, AppError> {
        Ok(self
            .bookings
            .lock()
            .unwrap()
            .iter()
            .filter(|b| {
                b.vehicle_id == vehicle_id
                    && matches!(
                        b.status,
                        BookingStatus::Pending
                            | BookingStatus::Approved
                            | BookingStatus::Paid
                            | BookingStatus::Active
                    )
            })
            .cloned()
            .collect())
    }

    async fn list_for_user(&self, email: &str) -> Result<Vec<Booking>, AppError> {
        Ok(self
            .bookings
            .lock()
            .unwrap()
            .iter()
            .filter(|b| b.renter_email == email || b.owner_email == email)
            .cloned()
            .collect())
    }

    async fn set_status(&self, id: Uuid, status: BookingStatus) -> Result<Booking, AppError> {
        let mut bookings = self.bookings.lock().unwrap();
        let booking = bookings
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Booking '{}' not found", id)))?;
        booking.status = status;
        booking.updated_at = Utc::now();
        Ok(booking.clone())
    }

    async fn mark_paid(&self, id: Uuid, payment_intent_id: &str) -> Result<Booking, AppError> {
        let mut bookings = self.bookings.lock().unwrap();
        let booking = bookings
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Booking '{}' not found", id)))?;
        booking.status = BookingStatus::Paid;
        booking.payment_status = PaymentStatus::Paid;
        booking.payment_intent_id = Some(payment_intent_id.to_string());
        booking.updated_at = Utc::now();
        Ok(booking.clone())
    }

    async fn mark_cancelled(
        &self,
        id: Uuid,
        cancelled_by: &str,
        reason: &str,
    ) -> Result<Booking, AppError> {
        let mut bookings = self.bookings.lock().unwrap();
        let booking = bookings
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Booking '{}' not found", id)))?;
        booking.status = BookingStatus::Cancelled;
        booking.cancelled_by = Some(cancelled_by.to_string());
        booking.cancellation_reason = Some(reason.to_string());
        booking.updated_at = Utc::now();
        Ok(booking.clone())
    }
}

#[derive(Default)]
pub struct InMemoryVehicleStore {
    pub vehicles: Mutex<Vec<Vehicle>>,
}

#[async_trait]
impl VehicleStore for InMemoryVehicleStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Vehicle>, AppError> {
        Ok(self.vehicles.lock().unwrap().iter().find(|v| v.id == id).cloned())
    }

    async fn set_blocked_dates(
        &self,
        id: Uuid,
        blocked_dates: Vec<NaiveDate>,
    ) -> Result<Vehicle, AppError> {
        let mut vehicles = self.vehicles.lock().unwrap();
        let vehicle = vehicles
            .iter_mut()
            .find(|v| v.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Vehicle '{}' not found", id)))?;
        vehicle.blocked_dates = blocked_dates;
        Ok(vehicle.clone())
    }

    async fn increment_total_bookings(&self, id: Uuid) -> Result<(), AppError> {
        let mut vehicles = self.vehicles.lock().unwrap();
        if let Some(vehicle) = vehicles.iter_mut().find(|v| v.id == id) {
            vehicle.total_bookings += 1;
        }
        Ok(())
    }

    async fn update_rating(
        &self,
        id: Uuid,
        average_rating: Decimal,
        total_reviews: i32,
    ) -> Result<(), AppError> {
        let mut vehicles = self.vehicles.lock().unwrap();
        if let Some(vehicle) = vehicles.iter_mut().find(|v| v.id == id) {
            vehicle.average_rating = average_rating;
            vehicle.total_reviews = total_reviews;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryTransactionStore {
    pub transactions: Mutex<Vec<Transaction>>,
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn create(&self, tx: NewTransaction) -> Result<Transaction, AppError> {
        let transaction = Transaction {
            id: Uuid::new_v4(),
            booking_id: tx.booking_id,
            user_email: tx.user_email,
            user_role: tx.user_role,
            kind: tx.kind,
            amount: tx.amount,
            status: tx.status,
            description: tx.description,
            created_at: Utc::now(),
        };
        self.transactions.lock().unwrap().push(transaction.clone());
        Ok(transaction)
    }

    async fn find_by_booking(&self, booking_id: Uuid) -> Result<Vec<Transaction>, AppError> {
        Ok(self
            .transactions
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.booking_id == booking_id)
            .cloned()
            .collect())
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: TransactionStatus,
    ) -> Result<Transaction, AppError> {
        let mut transactions = self.transactions.lock().unwrap();
        let transaction = transactions
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Transaction '{}' not found", id)))?;
        transaction.status = status;
        Ok(transaction.clone())
    }
}

#[derive(Default)]
pub struct InMemoryCouponStore {
    pub coupons: Mutex<Vec<Coupon>>,
    pub usages: Mutex<Vec<CouponUsage>>,
}

#[async_trait]
impl CouponStore for InMemoryCouponStore {
    async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>, AppError> {
        Ok(self.coupons.lock().unwrap().iter().find(|c| c.code == code).cloned())
    }

    async fn count_user_redemptions(
        &self,
        coupon_id: Uuid,
        user_email: &str,
    ) -> Result<i64, AppError> {
        Ok(self
            .usages
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.coupon_id == coupon_id && u.user_email == user_email)
            .count() as i64)
    }

    async fn redeem(&self, coupon_id: Uuid, usage: NewCouponUsage) -> Result<(), AppError> {
        // Las dos escrituras van juntas, como la transacción SQL del
        // repositorio Postgres
        let mut coupons = self.coupons.lock().unwrap();
        let coupon = coupons
            .iter_mut()
            .find(|c| c.id == coupon_id)
            .ok_or_else(|| AppError::NotFound(format!("Coupon '{}' not found", coupon_id)))?;
        coupon.used_count += 1;
        self.usages.lock().unwrap().push(CouponUsage {
            id: Uuid::new_v4(),
            coupon_id: usage.coupon_id,
            coupon_code: usage.coupon_code,
            booking_id: usage.booking_id,
            user_email: usage.user_email,
            discount_amount: usage.discount_amount,
            final_amount: usage.final_amount,
            created_at: Utc::now(),
        });
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryNotificationStore {
    pub notifications: Mutex<Vec<Notification>>,
}

#[async_trait]
impl NotificationStore for InMemoryNotificationStore {
    async fn create(&self, notification: NewNotification) -> Result<Notification, AppError> {
        let created = Notification {
            id: Uuid::new_v4(),
            user_email: notification.user_email,
            title: notification.title,
            message: notification.message,
            kind: notification.kind,
            booking_id: notification.booking_id,
            is_read: false,
            created_at: Utc::now(),
        };
        self.notifications.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn list_for_user(&self, user_email: &str) -> Result<Vec<Notification>, AppError> {
        Ok(self
            .notifications
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.user_email == user_email)
            .cloned()
            .collect())
    }

    async fn mark_read(&self, id: Uuid, user_email: &str) -> Result<Notification, AppError> {
        let mut notifications = self.notifications.lock().unwrap();
        let notification = notifications
            .iter_mut()
            .find(|n| n.id == id && n.user_email == user_email)
            .ok_or_else(|| AppError::NotFound(format!("Notification '{}' not found", id)))?;
        notification.is_read = true;
        Ok(notification.clone())
    }
}

#[derive(Default)]
pub struct InMemoryReviewStore {
    pub reviews: Mutex<Vec<Review>>,
}

#[async_trait]
impl ReviewStore for InMemoryReviewStore {
    async fn create(&self, review: NewReview) -> Result<Review, AppError> {
        let created = Review {
            id: Uuid::new_v4(),
            booking_id: review.booking_id,
            vehicle_id: review.vehicle_id,
            reviewer_email: review.reviewer_email,
            rating: review.rating,
            comment: review.comment,
            created_at: Utc::now(),
        };
        self.reviews.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn find_by_booking_and_reviewer(
        &self,
        booking_id: Uuid,
        reviewer_email: &str,
    ) -> Result<Option<Review>, AppError> {
        Ok(self
            .reviews
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.booking_id == booking_id && r.reviewer_email == reviewer_email)
            .cloned())
    }

    async fn find_by_vehicle(&self, vehicle_id: Uuid) -> Result<Vec<Review>, AppError> {
        Ok(self
            .reviews
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.vehicle_id == vehicle_id)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryEarningsStore {
    pub earnings: Mutex<Vec<OwnerEarnings>>,
}

#[async_trait]
impl OwnerEarningsStore for InMemoryEarningsStore {
    async fn credit_earnings(&self, owner_email: &str, amount: Decimal) -> Result<(), AppError> {
        let mut earnings = self.earnings.lock().unwrap();
        match earnings.iter_mut().find(|e| e.owner_email == owner_email) {
            Some(entry) => {
                entry.total_earnings += amount;
                entry.updated_at = Utc::now();
            }
            None => earnings.push(OwnerEarnings {
                owner_email: owner_email.to_string(),
                total_earnings: amount,
                updated_at: Utc::now(),
            }),
        }
        Ok(())
    }

    async fn find_by_email(&self, owner_email: &str) -> Result<Option<OwnerEarnings>, AppError> {
        Ok(self
            .earnings
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.owner_email == owner_email)
            .cloned())
    }
}

/// Mailer que registra los envíos; puede ponerse en modo fallo para
/// comprobar que los emails son best-effort
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<(String, String)>>,
    pub fail: Mutex<bool>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, _body: &str) -> Result<(), AppError> {
        if *self.fail.lock().unwrap() {
            return Err(AppError::ExternalApi("mailer down".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string()));
        Ok(())
    }
}

/// Generador de facturas que registra las peticiones
#[derive(Default)]
pub struct RecordingInvoiceGenerator {
    pub requested: Mutex<Vec<Uuid>>,
}

#[async_trait]
impl InvoiceGenerator for RecordingInvoiceGenerator {
    async fn generate(&self, booking: &Booking) -> Result<(), AppError> {
        self.requested.lock().unwrap().push(booking.id);
        Ok(())
    }
}

/// Entorno completo de servicios sobre stores en memoria
pub struct TestEnv {
    pub bookings: Arc<InMemoryBookingStore>,
    pub vehicles: Arc<InMemoryVehicleStore>,
    pub transactions: Arc<InMemoryTransactionStore>,
    pub coupons: Arc<InMemoryCouponStore>,
    pub notifications: Arc<InMemoryNotificationStore>,
    pub reviews: Arc<InMemoryReviewStore>,
    pub earnings: Arc<InMemoryEarningsStore>,
    pub mailer: Arc<RecordingMailer>,
    pub invoices: Arc<RecordingInvoiceGenerator>,
    pub booking_service: BookingService,
    pub settlement_service: SettlementService,
}

impl TestEnv {
    pub fn new() -> Self {
        let bookings = Arc::new(InMemoryBookingStore::default());
        let vehicles = Arc::new(InMemoryVehicleStore::default());
        let transactions = Arc::new(InMemoryTransactionStore::default());
        let coupons = Arc::new(InMemoryCouponStore::default());
        let notifications = Arc::new(InMemoryNotificationStore::default());
        let reviews = Arc::new(InMemoryReviewStore::default());
        let earnings = Arc::new(InMemoryEarningsStore::default());
        let mailer = Arc::new(RecordingMailer::default());
        let invoices = Arc::new(RecordingInvoiceGenerator::default());

        let dispatcher = Arc::new(NotificationDispatcher::new(
            notifications.clone(),
            mailer.clone(),
        ));

        let booking_service = BookingService::new(
            bookings.clone(),
            vehicles.clone(),
            transactions.clone(),
            earnings.clone(),
            reviews.clone(),
            coupons.clone(),
            dispatcher.clone(),
        );

        let settlement_service = SettlementService::new(
            bookings.clone(),
            transactions.clone(),
            invoices.clone(),
            dispatcher,
        );

        Self {
            bookings,
            vehicles,
            transactions,
            coupons,
            notifications,
            reviews,
            earnings,
            mailer,
            invoices,
            booking_service,
            settlement_service,
        }
    }

    /// Vehículo estándar: $50/día, fianza $100
    pub fn seed_vehicle(&self, owner: &AuthenticatedUser) -> Vehicle {
        let vehicle = Vehicle {
            id: Uuid::new_v4(),
            owner_id: owner.user_id,
            owner_email: owner.email.clone(),
            owner_name: owner.name.clone(),
            title: "Furgoneta camper".to_string(),
            vehicle_type: "van".to_string(),
            price_per_day: Decimal::new(50, 0),
            security_deposit: Decimal::new(100, 0),
            blocked_dates: Vec::new(),
            is_active: true,
            is_available: true,
            average_rating: Decimal::ZERO,
            total_reviews: 0,
            total_bookings: 0,
            created_at: Utc::now(),
        };
        self.vehicles.vehicles.lock().unwrap().push(vehicle.clone());
        vehicle
    }
}

pub fn renter() -> AuthenticatedUser {
    AuthenticatedUser {
        user_id: Uuid::new_v4(),
        email: "renter@test.com".to_string(),
        name: "Rita Renter".to_string(),
        role: "renter".to_string(),
    }
}

pub fn owner() -> AuthenticatedUser {
    AuthenticatedUser {
        user_id: Uuid::new_v4(),
        email: "owner@test.com".to_string(),
        name: "Oscar Owner".to_string(),
        role: "owner".to_string(),
    }
}

/// Evento checkout.session.completed con el booking en metadata
pub fn checkout_event(booking_id: Uuid, payment_intent: &str) -> StripeEvent {
    serde_json::from_value(serde_json::json!({
        "id": format!("evt_{}", payment_intent),
        "type": "checkout.session.completed",
        "data": {
            "object": {
                "id": "cs_test",
                "payment_intent": payment_intent,
                "metadata": { "booking_id": booking_id.to_string() }
            }
        }
    }))
    .expect("valid event json")
}

/// Fecha a `days` días de hoy (UTC)
pub fn date_in(days: i64) -> NaiveDate {
    Utc::now().date_naive() + chrono::Duration::days(days)
}
