use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use super::errors::DomainError;
use super::label::{LabelStatus, OrderShipment, ShippingLabel};

/// Why a label insert was refused.
#[derive(Debug, Error)]
pub enum InsertLabelError {
    #[error("order already has a shipping label")]
    OrderAlreadyLabelled,
    #[error("tracking number already issued")]
    TrackingNumberTaken,
    #[error(transparent)]
    Domain(#[from] DomainError),
}

pub trait ShippingRepository: Send + Sync + 'static {
    /// Persist a new label and stamp the order's shipment projection in one
    /// unit of work. Fails with `NotFound` when the order does not exist.
    fn insert_label(&self, label: &ShippingLabel) -> Result<ShippingLabel, InsertLabelError>;

    fn find_by_tracking_number(
        &self,
        tracking_number: &str,
    ) -> Result<Option<ShippingLabel>, DomainError>;

    fn find_by_order_id(&self, order_id: Uuid) -> Result<Option<ShippingLabel>, DomainError>;

    /// Compare-and-swap on `status`, mirroring the change onto the order.
    /// Returns `false` when the stored status no longer equals `expected`.
    fn update_status(
        &self,
        tracking_number: &str,
        expected: LabelStatus,
        new_status: LabelStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, DomainError>;

    /// Labels for orders belonging to `seller_id`, newest first.
    fn list_for_seller(&self, seller_id: Uuid) -> Result<Vec<ShippingLabel>, DomainError>;

    fn find_order_shipment(&self, order_id: Uuid) -> Result<Option<OrderShipment>, DomainError>;
}

/// Source of randomness for simulated routing distance and tracking suffixes.
pub trait RandomSource: Send + Sync + 'static {
    /// Uniform sample in `[0, 1)`.
    fn unit(&self) -> f64;

    /// `len` ASCII alphanumeric characters.
    fn alphanumeric(&self, len: usize) -> String;
}

pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}
