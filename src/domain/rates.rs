//! Rate engine: prices every eligible courier/service pair for a parcel.
//!
//! Distances are simulated. The pincode gap picks a band and the band's
//! kilometre range is sampled from the injected [`RandomSource`]; everything
//! downstream of the sampled distance is deterministic.

use std::cmp::Ordering;
use std::sync::Arc;

use super::courier::{CourierPartner, CourierRegistry, ServiceType};
use super::errors::DomainError;
use super::pincode::Pincode;
use super::ports::RandomSource;

const PER_KG_SURCHARGE: f64 = 10.0;
const COD_FEE_FLOOR: f64 = 20.0;
const COD_FEE_RATE: f64 = 0.02;

#[derive(Debug, Clone, PartialEq)]
pub struct ShippingRate {
    pub courier_id: String,
    pub courier_name: String,
    pub service_type: ServiceType,
    pub estimated_delivery_days: u32,
    pub cost: i64,
    pub cod_available: bool,
    pub tracking_available: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceBand {
    Near,
    Regional,
    CrossRegion,
    Far,
}

impl DistanceBand {
    pub fn from_gap(gap: u32) -> Self {
        match gap {
            0..=49 => DistanceBand::Near,
            50..=99 => DistanceBand::Regional,
            100..=499 => DistanceBand::CrossRegion,
            _ => DistanceBand::Far,
        }
    }

    pub fn km_range(self) -> (f64, f64) {
        match self {
            DistanceBand::Near => (50.0, 150.0),
            DistanceBand::Regional => (150.0, 350.0),
            DistanceBand::CrossRegion => (350.0, 850.0),
            DistanceBand::Far => (850.0, 1850.0),
        }
    }
}

pub fn sample_distance_km(band: DistanceBand, rng: &dyn RandomSource) -> f64 {
    let (lo, hi) = band.km_range();
    lo + rng.unit().clamp(0.0, 1.0) * (hi - lo)
}

fn distance_tier(distance_km: f64) -> usize {
    if distance_km < 100.0 {
        0
    } else if distance_km < 500.0 {
        1
    } else if distance_km < 1000.0 {
        2
    } else {
        3
    }
}

fn service_multiplier(service: ServiceType) -> f64 {
    match service {
        ServiceType::Express => 1.5,
        ServiceType::Surface | ServiceType::Economy => 0.8,
        ServiceType::Standard | ServiceType::Cod => 1.0,
    }
}

/// Distance tier flat rate plus `ceil(weight) * 10`, scaled by service level.
pub fn base_cost(distance_km: f64, weight_kg: f64, service: ServiceType) -> f64 {
    const TIER_RATES: [f64; 4] = [40.0, 60.0, 80.0, 120.0];
    let flat = TIER_RATES[distance_tier(distance_km)];
    (flat + weight_kg.ceil() * PER_KG_SURCHARGE) * service_multiplier(service)
}

pub fn cod_fee(cod_amount: f64) -> f64 {
    (cod_amount * COD_FEE_RATE).max(COD_FEE_FLOOR)
}

pub fn delivery_days(distance_km: f64, service: ServiceType) -> u32 {
    const EXPRESS: [u32; 4] = [1, 2, 3, 4];
    const STANDARD: [u32; 4] = [2, 4, 6, 8];
    let tier = distance_tier(distance_km);
    match service {
        ServiceType::Express => EXPRESS[tier],
        _ => STANDARD[tier],
    }
}

pub(crate) fn validate_package(weight_kg: f64, cod_amount: Option<f64>) -> Result<(), DomainError> {
    if !(weight_kg.is_finite() && weight_kg > 0.0) {
        return Err(DomainError::InvalidPackage(format!(
            "weight must be greater than zero, got {weight_kg}"
        )));
    }
    if let Some(cod) = cod_amount {
        if !(cod.is_finite() && cod >= 0.0) {
            return Err(DomainError::InvalidPackage(format!(
                "COD amount must not be negative, got {cod}"
            )));
        }
    }
    Ok(())
}

/// A zero COD amount collects nothing, so it is treated as no COD at all.
pub(crate) fn requested_cod(cod_amount: Option<f64>) -> Option<f64> {
    cod_amount.filter(|amount| *amount > 0.0)
}

pub(crate) fn check_cod_ceiling(
    registry: &CourierRegistry,
    cod_amount: Option<f64>,
) -> Result<(), DomainError> {
    let ceiling = registry.max_cod_limit();
    match cod_amount {
        Some(amount) if amount > ceiling => Err(DomainError::InvalidPackage(format!(
            "COD amount {amount} exceeds the largest courier limit of {ceiling}"
        ))),
        _ => Ok(()),
    }
}

/// Cheapest and dearest option `partner` could have quoted for this parcel
/// and service, across every distance band.
pub(crate) fn quote_envelope(
    partner: &CourierPartner,
    service: ServiceType,
    weight_kg: f64,
    cod_amount: Option<f64>,
) -> (ShippingRate, ShippingRate) {
    let (nearest, _) = DistanceBand::Near.km_range();
    let (_, farthest) = DistanceBand::Far.km_range();
    let cod_amount = requested_cod(cod_amount);
    (
        price_one(partner, service, nearest, weight_kg, cod_amount),
        price_one(partner, service, farthest, weight_kg, cod_amount),
    )
}

#[derive(Debug, Clone)]
pub struct RateEngine {
    registry: Arc<CourierRegistry>,
}

impl RateEngine {
    pub fn new(registry: Arc<CourierRegistry>) -> Self {
        Self { registry }
    }

    /// Ranked options for a parcel. An empty list means no courier can take it.
    pub fn quote(
        &self,
        from_pincode: &str,
        to_pincode: &str,
        weight_kg: f64,
        cod_amount: Option<f64>,
        rng: &dyn RandomSource,
    ) -> Result<Vec<ShippingRate>, DomainError> {
        let from = Pincode::parse(from_pincode)?;
        let to = Pincode::parse(to_pincode)?;
        validate_package(weight_kg, cod_amount)?;
        check_cod_ceiling(&self.registry, cod_amount)?;

        let distance_km = sample_distance_km(DistanceBand::from_gap(from.gap(to)), rng);
        Ok(self.price_options(distance_km, weight_kg, cod_amount))
    }

    /// The deterministic half of [`RateEngine::quote`], for a known distance.
    pub fn price_options(
        &self,
        distance_km: f64,
        weight_kg: f64,
        cod_amount: Option<f64>,
    ) -> Vec<ShippingRate> {
        let cod_amount = requested_cod(cod_amount);
        let mut rates: Vec<ShippingRate> = self
            .registry
            .list_partners()
            .iter()
            .filter(|p| weight_kg <= p.weight_limit_kg)
            .flat_map(|p| {
                p.services
                    .iter()
                    .map(move |&service| price_one(p, service, distance_km, weight_kg, cod_amount))
            })
            .collect();
        rates.sort_by(compare_rates);
        rates
    }
}

fn price_one(
    partner: &CourierPartner,
    service: ServiceType,
    distance_km: f64,
    weight_kg: f64,
    cod_amount: Option<f64>,
) -> ShippingRate {
    let cod_available = service == ServiceType::Cod
        || cod_amount.is_some_and(|amount| partner.accepts_cod(service, amount));

    let mut cost = base_cost(distance_km, weight_kg, service) * partner.price_multiplier;
    if let Some(amount) = cod_amount.filter(|_| cod_available) {
        cost += cod_fee(amount);
    }

    ShippingRate {
        courier_id: partner.id.clone(),
        courier_name: partner.name.clone(),
        service_type: service,
        estimated_delivery_days: delivery_days(distance_km, service),
        cost: cost.round() as i64,
        cod_available,
        tracking_available: true,
    }
}

fn compare_rates(a: &ShippingRate, b: &ShippingRate) -> Ordering {
    a.cost
        .cmp(&b.cost)
        .then(a.estimated_delivery_days.cmp(&b.estimated_delivery_days))
        .then_with(|| a.courier_id.cmp(&b.courier_id))
        .then(a.service_type.cmp(&b.service_type))
}
