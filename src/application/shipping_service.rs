use std::sync::Arc;

use log::debug;
use uuid::Uuid;

use crate::domain::courier::{CourierPartner, CourierRegistry};
use crate::domain::errors::DomainError;
use crate::domain::label::{LabelStatus, OrderShipment, ShippingLabel};
use crate::domain::ports::{Clock, RandomSource, ShippingRepository};
use crate::domain::rates::{RateEngine, ShippingRate};
use crate::domain::tracking::TrackingInfo;

use super::label_issuer::{IssueLabelRequest, IssuerSettings, LabelIssuer};
use super::tracker::ShipmentTracker;

/// Single entry point for the HTTP layer: quoting, issuance and tracking.
pub struct ShippingService {
    registry: Arc<CourierRegistry>,
    engine: RateEngine,
    issuer: LabelIssuer,
    tracker: ShipmentTracker,
    repo: Arc<dyn ShippingRepository>,
    rng: Arc<dyn RandomSource>,
}

impl ShippingService {
    pub fn new(
        repo: Arc<dyn ShippingRepository>,
        registry: Arc<CourierRegistry>,
        rng: Arc<dyn RandomSource>,
        clock: Arc<dyn Clock>,
        settings: IssuerSettings,
    ) -> Self {
        Self {
            engine: RateEngine::new(registry.clone()),
            issuer: LabelIssuer::new(
                registry.clone(),
                repo.clone(),
                rng.clone(),
                clock.clone(),
                settings,
            ),
            tracker: ShipmentTracker::new(repo.clone(), clock),
            registry,
            repo,
            rng,
        }
    }

    pub fn list_partners(&self) -> &[CourierPartner] {
        self.registry.list_partners()
    }

    pub fn get_partner(&self, id: &str) -> Result<&CourierPartner, DomainError> {
        self.registry.get_partner(id)
    }

    pub fn get_rates(
        &self,
        from_pincode: &str,
        to_pincode: &str,
        weight_kg: f64,
        cod_amount: Option<f64>,
    ) -> Result<Vec<ShippingRate>, DomainError> {
        let rates = self.engine.quote(
            from_pincode,
            to_pincode,
            weight_kg,
            cod_amount,
            self.rng.as_ref(),
        )?;
        debug!(
            "Quoted {} options {} -> {} for {} kg",
            rates.len(),
            from_pincode,
            to_pincode,
            weight_kg
        );
        Ok(rates)
    }

    pub fn create_label(&self, req: IssueLabelRequest) -> Result<ShippingLabel, DomainError> {
        self.issuer.issue(req)
    }

    pub fn track(&self, tracking_number: &str) -> Result<TrackingInfo, DomainError> {
        self.tracker.track(tracking_number)
    }

    pub fn update_status(
        &self,
        tracking_number: &str,
        status: LabelStatus,
    ) -> Result<(), DomainError> {
        self.tracker.update_status(tracking_number, status)
    }

    pub fn list_labels_for_seller(&self, seller_id: Uuid) -> Result<Vec<ShippingLabel>, DomainError> {
        self.repo.list_for_seller(seller_id)
    }

    pub fn label_for_order(&self, order_id: Uuid) -> Result<ShippingLabel, DomainError> {
        self.repo
            .find_by_order_id(order_id)?
            .ok_or_else(|| DomainError::not_found(format!("Shipping label for order {order_id}")))
    }

    pub fn order_shipment(&self, order_id: Uuid) -> Result<OrderShipment, DomainError> {
        self.repo
            .find_order_shipment(order_id)?
            .ok_or_else(|| DomainError::not_found(format!("Order {order_id}")))
    }
}
