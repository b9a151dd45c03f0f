//! Process-local `ShippingRepository` with the same uniqueness and
//! compare-and-swap semantics as the Postgres adapter. Used by tests and for
//! running the service without a database.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::label::{LabelStatus, OrderShipment, OrderShippingStatus, ShippingLabel};
use crate::domain::ports::{InsertLabelError, ShippingRepository};

#[derive(Default)]
struct State {
    orders: HashMap<Uuid, OrderShipment>,
    labels: Vec<ShippingLabel>,
}

#[derive(Default)]
pub struct InMemoryShippingRepository {
    state: Mutex<State>,
}

impl InMemoryShippingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an order that labels can be issued against.
    pub fn add_order(&self, order_id: Uuid, seller_id: Uuid) {
        self.lock().orders.insert(
            order_id,
            OrderShipment {
                order_id,
                seller_id,
                tracking_number: None,
                shipping_status: None,
                shipping_cost: None,
            },
        );
    }

    pub fn label_count(&self) -> usize {
        self.lock().labels.len()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ShippingRepository for InMemoryShippingRepository {
    fn insert_label(&self, label: &ShippingLabel) -> Result<ShippingLabel, InsertLabelError> {
        let mut state = self.lock();
        if !state.orders.contains_key(&label.order_id) {
            return Err(DomainError::not_found(format!("Order {}", label.order_id)).into());
        }
        if state.labels.iter().any(|l| l.order_id == label.order_id) {
            return Err(InsertLabelError::OrderAlreadyLabelled);
        }
        if state
            .labels
            .iter()
            .any(|l| l.tracking_number == label.tracking_number)
        {
            return Err(InsertLabelError::TrackingNumberTaken);
        }

        state.labels.push(label.clone());
        if let Some(order) = state.orders.get_mut(&label.order_id) {
            order.tracking_number = Some(label.tracking_number.clone());
            order.shipping_status = Some(OrderShippingStatus::from(label.status));
            order.shipping_cost = Some(label.shipping_cost);
        }
        Ok(label.clone())
    }

    fn find_by_tracking_number(
        &self,
        tracking_number: &str,
    ) -> Result<Option<ShippingLabel>, DomainError> {
        Ok(self
            .lock()
            .labels
            .iter()
            .find(|l| l.tracking_number == tracking_number)
            .cloned())
    }

    fn find_by_order_id(&self, order_id: Uuid) -> Result<Option<ShippingLabel>, DomainError> {
        Ok(self
            .lock()
            .labels
            .iter()
            .find(|l| l.order_id == order_id)
            .cloned())
    }

    fn update_status(
        &self,
        tracking_number: &str,
        expected: LabelStatus,
        new_status: LabelStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        let mut state = self.lock();
        let Some(label) = state
            .labels
            .iter_mut()
            .find(|l| l.tracking_number == tracking_number && l.status == expected)
        else {
            return Ok(false);
        };
        label.status = new_status;
        label.status_updated_at = at;
        let order_id = label.order_id;

        if let Some(order) = state.orders.get_mut(&order_id) {
            order.shipping_status = Some(OrderShippingStatus::from(new_status));
        }
        Ok(true)
    }

    fn list_for_seller(&self, seller_id: Uuid) -> Result<Vec<ShippingLabel>, DomainError> {
        let state = self.lock();
        let mut labels: Vec<ShippingLabel> = state
            .labels
            .iter()
            .filter(|l| {
                state
                    .orders
                    .get(&l.order_id)
                    .is_some_and(|o| o.seller_id == seller_id)
            })
            .cloned()
            .collect();
        labels.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(labels)
    }

    fn find_order_shipment(&self, order_id: Uuid) -> Result<Option<OrderShipment>, DomainError> {
        Ok(self.lock().orders.get(&order_id).cloned())
    }
}
