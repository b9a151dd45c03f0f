//! Tracking synthesizer.
//!
//! Courier scans are simulated: events are projected from fixed offsets after
//! label creation. A milestone appears once the persisted status has reached
//! it, or once enough time has passed for it to be plausible. Delivery is
//! never inferred from elapsed time alone.

use chrono::{DateTime, Duration, Utc};

use super::label::{LabelStatus, ShippingLabel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingStage {
    LabelCreated,
    PickedUp,
    InTransit,
    OutForDelivery,
    Delivered,
    Returned,
}

impl TrackingStage {
    pub fn as_str(self) -> &'static str {
        match self {
            TrackingStage::LabelCreated => "label_created",
            TrackingStage::PickedUp => "picked_up",
            TrackingStage::InTransit => "in_transit",
            TrackingStage::OutForDelivery => "out_for_delivery",
            TrackingStage::Delivered => "delivered",
            TrackingStage::Returned => "returned",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackingEvent {
    pub timestamp: DateTime<Utc>,
    pub status: TrackingStage,
    pub location: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackingInfo {
    pub tracking_number: String,
    pub courier_name: String,
    pub current_status: LabelStatus,
    pub estimated_delivery: DateTime<Utc>,
    pub events: Vec<TrackingEvent>,
}

struct Milestone {
    stage: TrackingStage,
    offset_hours: i64,
    /// Persisted status at which the milestone is known to have happened.
    confirmed_by: LabelStatus,
    inferable: bool,
}

const MILESTONES: [Milestone; 5] = [
    Milestone {
        stage: TrackingStage::LabelCreated,
        offset_hours: 0,
        confirmed_by: LabelStatus::Created,
        inferable: true,
    },
    Milestone {
        stage: TrackingStage::PickedUp,
        offset_hours: 12,
        confirmed_by: LabelStatus::PickedUp,
        inferable: true,
    },
    Milestone {
        stage: TrackingStage::InTransit,
        offset_hours: 24,
        confirmed_by: LabelStatus::InTransit,
        inferable: true,
    },
    Milestone {
        stage: TrackingStage::OutForDelivery,
        offset_hours: 48,
        confirmed_by: LabelStatus::Delivered,
        inferable: true,
    },
    Milestone {
        stage: TrackingStage::Delivered,
        offset_hours: 72,
        confirmed_by: LabelStatus::Delivered,
        inferable: false,
    },
];

fn confirmed(current: LabelStatus, needed: LabelStatus) -> bool {
    match (current.progress(), needed.progress()) {
        (Some(have), Some(need)) => have >= need,
        _ => false,
    }
}

pub fn synthesize(label: &ShippingLabel, now: DateTime<Utc>) -> TrackingInfo {
    let origin = label.from_address.city.as_str();
    let destination = label.to_address.city.as_str();
    // A returned parcel stops accruing scans at the moment it was returned.
    let horizon = if label.status == LabelStatus::Returned {
        label.status_updated_at.min(now)
    } else {
        now
    };

    let mut events: Vec<TrackingEvent> = MILESTONES
        .iter()
        .filter_map(|m| {
            let due = label.created_at + Duration::hours(m.offset_hours);
            let timestamp = if confirmed(label.status, m.confirmed_by) {
                due.min(label.status_updated_at).min(now)
            } else if m.inferable && horizon >= due {
                due
            } else {
                return None;
            };
            let (location, description) = describe(m.stage, label, origin, destination);
            Some(TrackingEvent {
                timestamp,
                status: m.stage,
                location,
                description,
            })
        })
        .collect();

    if label.status == LabelStatus::Returned {
        let last = events.last().map(|e| e.timestamp).unwrap_or(label.created_at);
        events.push(TrackingEvent {
            timestamp: label.status_updated_at.max(last),
            status: TrackingStage::Returned,
            location: origin.to_string(),
            description: "Shipment returned to sender".to_string(),
        });
    }

    TrackingInfo {
        tracking_number: label.tracking_number.clone(),
        courier_name: label.courier_name.clone(),
        current_status: label.status,
        estimated_delivery: label.estimated_delivery(),
        events,
    }
}

fn describe(
    stage: TrackingStage,
    label: &ShippingLabel,
    origin: &str,
    destination: &str,
) -> (String, String) {
    match stage {
        TrackingStage::LabelCreated => (
            origin.to_string(),
            format!("Shipping label created with {}", label.courier_name),
        ),
        TrackingStage::PickedUp => (origin.to_string(), "Package picked up by courier".to_string()),
        TrackingStage::InTransit => (
            format!("En route to {destination}"),
            "Package in transit".to_string(),
        ),
        TrackingStage::OutForDelivery => (destination.to_string(), "Out for delivery".to_string()),
        TrackingStage::Delivered => (destination.to_string(), "Package delivered".to_string()),
        TrackingStage::Returned => (origin.to_string(), "Shipment returned to sender".to_string()),
    }
}
