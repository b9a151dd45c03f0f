use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::courier::ServiceType;
use super::errors::DomainError;
use super::pincode::Pincode;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub name: String,
    pub phone: String,
    pub address_line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
}

impl ShippingAddress {
    pub fn validate(&self) -> Result<Pincode, DomainError> {
        Pincode::parse(&self.pincode)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelStatus {
    Created,
    PickedUp,
    InTransit,
    Delivered,
    Returned,
}

/// Outcome of checking a requested status change against the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Re-assertion of the current status; nothing to write.
    Unchanged,
    Advance,
}

impl LabelStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LabelStatus::Created => "created",
            LabelStatus::PickedUp => "picked_up",
            LabelStatus::InTransit => "in_transit",
            LabelStatus::Delivered => "delivered",
            LabelStatus::Returned => "returned",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, LabelStatus::Delivered | LabelStatus::Returned)
    }

    /// Forward moves, skips included, plus `returned` from any live state.
    pub fn allowed_transitions(self) -> &'static [LabelStatus] {
        use LabelStatus::*;
        match self {
            Created => &[PickedUp, InTransit, Delivered, Returned],
            PickedUp => &[InTransit, Delivered, Returned],
            InTransit => &[Delivered, Returned],
            Delivered | Returned => &[],
        }
    }

    pub fn transition_to(self, to: LabelStatus) -> Result<Transition, DomainError> {
        if self == to {
            return Ok(Transition::Unchanged);
        }
        if self.allowed_transitions().contains(&to) {
            Ok(Transition::Advance)
        } else {
            Err(DomainError::InvalidTransition { from: self, to })
        }
    }

    /// Position on the happy path; `returned` sits outside it.
    pub(crate) fn progress(self) -> Option<u8> {
        match self {
            LabelStatus::Created => Some(0),
            LabelStatus::PickedUp => Some(1),
            LabelStatus::InTransit => Some(2),
            LabelStatus::Delivered => Some(3),
            LabelStatus::Returned => None,
        }
    }
}

impl fmt::Display for LabelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LabelStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(LabelStatus::Created),
            "picked_up" => Ok(LabelStatus::PickedUp),
            "in_transit" => Ok(LabelStatus::InTransit),
            "delivered" => Ok(LabelStatus::Delivered),
            "returned" => Ok(LabelStatus::Returned),
            other => Err(DomainError::Internal(format!("unknown label status '{other}'"))),
        }
    }
}

/// Shipment status mirrored onto the order row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderShippingStatus {
    LabelCreated,
    PickedUp,
    InTransit,
    Delivered,
    Returned,
}

impl OrderShippingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderShippingStatus::LabelCreated => "label_created",
            OrderShippingStatus::PickedUp => "picked_up",
            OrderShippingStatus::InTransit => "in_transit",
            OrderShippingStatus::Delivered => "delivered",
            OrderShippingStatus::Returned => "returned",
        }
    }
}

impl From<LabelStatus> for OrderShippingStatus {
    fn from(status: LabelStatus) -> Self {
        match status {
            LabelStatus::Created => OrderShippingStatus::LabelCreated,
            LabelStatus::PickedUp => OrderShippingStatus::PickedUp,
            LabelStatus::InTransit => OrderShippingStatus::InTransit,
            LabelStatus::Delivered => OrderShippingStatus::Delivered,
            LabelStatus::Returned => OrderShippingStatus::Returned,
        }
    }
}

impl FromStr for OrderShippingStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "label_created" => Ok(OrderShippingStatus::LabelCreated),
            "picked_up" => Ok(OrderShippingStatus::PickedUp),
            "in_transit" => Ok(OrderShippingStatus::InTransit),
            "delivered" => Ok(OrderShippingStatus::Delivered),
            "returned" => Ok(OrderShippingStatus::Returned),
            other => Err(DomainError::Internal(format!(
                "unknown order shipping status '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShippingLabel {
    pub id: Uuid,
    pub order_id: Uuid,
    pub tracking_number: String,
    pub courier_id: String,
    pub courier_name: String,
    pub service_type: ServiceType,
    pub from_address: ShippingAddress,
    pub to_address: ShippingAddress,
    pub package_weight_kg: f64,
    pub shipping_cost: i64,
    pub cod_amount: Option<f64>,
    pub label_url: String,
    pub status: LabelStatus,
    pub estimated_delivery_days: u32,
    pub created_at: DateTime<Utc>,
    pub status_updated_at: DateTime<Utc>,
}

impl ShippingLabel {
    pub fn estimated_delivery(&self) -> DateTime<Utc> {
        self.created_at + Duration::days(i64::from(self.estimated_delivery_days))
    }
}

/// Order-side view of a shipment, as denormalised onto the order row.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderShipment {
    pub order_id: Uuid,
    pub seller_id: Uuid,
    pub tracking_number: Option<String>,
    pub shipping_status: Option<OrderShippingStatus>,
    pub shipping_cost: Option<i64>,
}

/// `{prefix}{base-36 millis}{suffix}`, all uppercase.
pub fn tracking_number(prefix: &str, issued_at: DateTime<Utc>, suffix: &str) -> String {
    let millis = u64::try_from(issued_at.timestamp_millis()).unwrap_or_default();
    format!("{}{}{}", prefix, to_base36(millis), suffix).to_uppercase()
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}
