use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::errors::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    Express,
    Standard,
    Surface,
    Economy,
    Cod,
}

impl ServiceType {
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceType::Express => "express",
            ServiceType::Standard => "standard",
            ServiceType::Surface => "surface",
            ServiceType::Economy => "economy",
            ServiceType::Cod => "cod",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "express" => Ok(ServiceType::Express),
            "standard" => Ok(ServiceType::Standard),
            "surface" => Ok(ServiceType::Surface),
            "economy" => Ok(ServiceType::Economy),
            "cod" => Ok(ServiceType::Cod),
            other => Err(DomainError::Internal(format!("unknown service type '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourierPartner {
    pub id: String,
    pub name: String,
    pub services: Vec<ServiceType>,
    /// Largest cash-on-delivery amount the partner will collect, in rupees.
    pub cod_limit: f64,
    pub weight_limit_kg: f64,
    /// Partner-specific pricing factor applied on top of the base cost.
    pub price_multiplier: f64,
    /// Three uppercase letters leading every tracking number this partner issues.
    pub tracking_prefix: String,
}

impl CourierPartner {
    pub fn offers(&self, service: ServiceType) -> bool {
        self.services.contains(&service)
    }

    /// Whether `service` can collect `amount` on delivery. The dedicated COD
    /// service always can; other services only up to `cod_limit`.
    pub fn accepts_cod(&self, service: ServiceType, amount: f64) -> bool {
        service == ServiceType::Cod || amount <= self.cod_limit
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("courier catalog is empty")]
    Empty,
    #[error("courier '{0}' is listed more than once")]
    DuplicateId(String),
    #[error("courier '{id}' is invalid: {reason}")]
    InvalidPartner { id: String, reason: String },
    #[error("could not read courier catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse courier catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Static catalog of the courier partners rates are quoted against.
#[derive(Debug, Clone)]
pub struct CourierRegistry {
    partners: Vec<CourierPartner>,
}

impl CourierRegistry {
    pub fn from_partners(partners: Vec<CourierPartner>) -> Result<Self, CatalogError> {
        if partners.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen = HashSet::new();
        for partner in &partners {
            validate_partner(partner)?;
            if !seen.insert(partner.id.as_str()) {
                return Err(CatalogError::DuplicateId(partner.id.clone()));
            }
        }
        Ok(Self { partners })
    }

    /// Load a catalog from a JSON array of partners.
    pub fn from_json_file(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        let partners: Vec<CourierPartner> = serde_json::from_str(&raw)?;
        Self::from_partners(partners)
    }

    pub fn builtin() -> Self {
        Self {
            partners: builtin_partners(),
        }
    }

    pub fn list_partners(&self) -> &[CourierPartner] {
        &self.partners
    }

    pub fn get_partner(&self, id: &str) -> Result<&CourierPartner, DomainError> {
        self.partners
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| DomainError::not_found(format!("Courier '{id}'")))
    }

    /// Highest COD limit across the catalog; no partner collects more.
    pub fn max_cod_limit(&self) -> f64 {
        self.partners
            .iter()
            .map(|p| p.cod_limit)
            .fold(0.0, f64::max)
    }
}

impl Default for CourierRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn validate_partner(partner: &CourierPartner) -> Result<(), CatalogError> {
    let invalid = |reason: &str| CatalogError::InvalidPartner {
        id: partner.id.clone(),
        reason: reason.to_string(),
    };
    if partner.id.trim().is_empty() {
        return Err(invalid("id must not be empty"));
    }
    if partner.services.is_empty() {
        return Err(invalid("at least one service is required"));
    }
    if !(partner.weight_limit_kg.is_finite() && partner.weight_limit_kg > 0.0) {
        return Err(invalid("weight limit must be positive"));
    }
    if !(partner.cod_limit.is_finite() && partner.cod_limit >= 0.0) {
        return Err(invalid("COD limit must not be negative"));
    }
    if !(partner.price_multiplier.is_finite() && partner.price_multiplier > 0.0) {
        return Err(invalid("price multiplier must be positive"));
    }
    let prefix_ok = partner.tracking_prefix.len() == 3
        && partner
            .tracking_prefix
            .chars()
            .all(|c| c.is_ascii_uppercase());
    if !prefix_ok {
        return Err(invalid("tracking prefix must be three uppercase letters"));
    }
    Ok(())
}

fn partner(
    id: &str,
    name: &str,
    services: &[ServiceType],
    cod_limit: f64,
    weight_limit_kg: f64,
    price_multiplier: f64,
    tracking_prefix: &str,
) -> CourierPartner {
    CourierPartner {
        id: id.to_string(),
        name: name.to_string(),
        services: services.to_vec(),
        cod_limit,
        weight_limit_kg,
        price_multiplier,
        tracking_prefix: tracking_prefix.to_string(),
    }
}

fn builtin_partners() -> Vec<CourierPartner> {
    use ServiceType::*;

    vec![
        partner("bluedart", "Blue Dart", &[Express, Standard], 50_000.0, 10.0, 1.2, "BLU"),
        partner("delhivery", "Delhivery", &[Express, Surface, Cod], 25_000.0, 20.0, 1.0, "DEL"),
        partner("dtdc", "DTDC", &[Standard, Economy, Cod], 20_000.0, 15.0, 0.9, "DTD"),
        partner("ecom_express", "Ecom Express", &[Standard, Cod], 30_000.0, 15.0, 0.95, "ECX"),
        partner("xpressbees", "Xpressbees", &[Express, Surface], 40_000.0, 20.0, 0.9, "XPB"),
        partner("shadowfax", "Shadowfax", &[Express, Standard], 10_000.0, 5.0, 1.0, "SFX"),
    ]
}
