use std::sync::Arc;

use log::{info, warn};

use crate::domain::errors::DomainError;
use crate::domain::label::{LabelStatus, ShippingLabel, Transition};
use crate::domain::ports::{Clock, ShippingRepository};
use crate::domain::tracking::{synthesize, TrackingInfo};

/// Optimistic status writes retried when another writer got there first.
const MAX_STATUS_ATTEMPTS: u32 = 3;

pub struct ShipmentTracker {
    repo: Arc<dyn ShippingRepository>,
    clock: Arc<dyn Clock>,
}

impl ShipmentTracker {
    pub fn new(repo: Arc<dyn ShippingRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    pub fn track(&self, tracking_number: &str) -> Result<TrackingInfo, DomainError> {
        let label = self.load(tracking_number)?;
        Ok(synthesize(&label, self.clock.now()))
    }

    /// Move a label through the state machine.
    ///
    /// The transition is validated against a fresh read and written with a
    /// compare-and-swap on the status it was validated against.
    pub fn update_status(
        &self,
        tracking_number: &str,
        new_status: LabelStatus,
    ) -> Result<(), DomainError> {
        for attempt in 1..=MAX_STATUS_ATTEMPTS {
            let label = self.load(tracking_number)?;
            match label.status.transition_to(new_status) {
                Ok(Transition::Unchanged) => return Ok(()),
                Ok(Transition::Advance) => {}
                Err(e) => {
                    warn!(
                        "[{}] rejected {} -> {} for {}",
                        e.code(),
                        label.status,
                        new_status,
                        tracking_number
                    );
                    return Err(e);
                }
            }

            let now = self.clock.now();
            if self
                .repo
                .update_status(tracking_number, label.status, new_status, now)?
            {
                info!(
                    "Shipment {} moved {} -> {}",
                    tracking_number, label.status, new_status
                );
                return Ok(());
            }
            warn!(
                "Status of {} changed concurrently (attempt {}), re-reading",
                tracking_number, attempt
            );
        }

        Err(DomainError::Internal(format!(
            "status of {tracking_number} kept changing under concurrent updates"
        )))
    }

    fn load(&self, tracking_number: &str) -> Result<ShippingLabel, DomainError> {
        self.repo
            .find_by_tracking_number(tracking_number)?
            .ok_or_else(|| DomainError::not_found(format!("Tracking number {tracking_number}")))
    }
}
