use thiserror::Error;
use uuid::Uuid;

use super::label::LabelStatus;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("Invalid package: {0}")]
    InvalidPackage(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("A shipping label already exists for order {0}")]
    DuplicateLabel(Uuid),
    #[error("Could not issue a tracking number: {0}")]
    Issuance(String),
    #[error("Cannot move shipment from {from} to {to}")]
    InvalidTransition { from: LabelStatus, to: LabelStatus },
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(what: impl Into<String>) -> Self {
        DomainError::NotFound(what.into())
    }

    /// Stable identifier for logs and telemetry. Never shown to users.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::InvalidAddress(_) => "invalid_address",
            DomainError::InvalidPackage(_) => "invalid_package",
            DomainError::NotFound(_) => "not_found",
            DomainError::DuplicateLabel(_) => "duplicate_label",
            DomainError::Issuance(_) => "issuance_failed",
            DomainError::InvalidTransition { .. } => "invalid_transition",
            DomainError::Internal(_) => "internal",
        }
    }
}
