//! Booking error taxonomy.
//!
//! Every failure a booking run can produce is a variant here, classified by
//! [`ErrorKind`]:
//!
//! - `Configuration`: setup data is missing; an operator must fix it, the
//!   user cannot recover inline.
//! - `Validation`: a required field is missing on a line or on the customer
//!   snapshot; recoverable by editing the draft.
//! - `State`: structural misuse of the API (already published, no item
//!   lines).
//! - `Sequencing`: a document-date regression; the date must be corrected.
//! - `Storage`: transport-level failure. Never collected into a booking
//!   outcome; it aborts the call immediately.

use chrono::NaiveDate;
use thiserror::Error;

use crate::id::{CustomerId, InvoiceId, InvoiceLineId, ProductTaxClassId};

/// Result type used across the booking engine.
pub type BookingResult<T> = Result<T, BookingError>;

/// Coarse classification of a [`BookingError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Validation,
    State,
    Sequencing,
    Storage,
}

/// Booking-time error.
///
/// Within one booking run these are *collected*, not thrown on first failure,
/// so the caller receives the complete list and a user can fix every problem
/// in one pass. Only `Storage`-kind errors abort immediately.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BookingError {
    /// No numbering sequence is configured for a document-type code.
    #[error("no document number sequence configured for code '{code}'")]
    MissingSequence { code: String },

    /// An item line references a product tax class absent from the
    /// customer's tax-rate configuration.
    #[error("no tax config for product class {class_id}")]
    MissingTaxConfig {
        line_id: InvoiceLineId,
        position: u32,
        class_id: ProductTaxClassId,
    },

    /// An item line has no quantity.
    #[error("line {position} is missing a quantity")]
    MissingQuantity { line_id: InvoiceLineId, position: u32 },

    /// An item line has no rate.
    #[error("line {position} is missing a rate")]
    MissingRate { line_id: InvoiceLineId, position: u32 },

    #[error("customer name is missing")]
    MissingCustomerName,

    #[error("customer address is missing")]
    MissingCustomerAddress,

    #[error("customer VAT id is missing")]
    MissingCustomerVatId,

    /// The invoice is already published; published documents are immutable.
    #[error("invoice {invoice_id} is already published")]
    AlreadyPublished { invoice_id: InvoiceId },

    /// The operation requires a published invoice.
    #[error("invoice {invoice_id} is not published")]
    NotPublished { invoice_id: InvoiceId },

    /// The invoice has no chargeable (item) lines.
    #[error("invoice has no item lines")]
    NoItemLines,

    /// Allocation date is strictly earlier than the last allocated date for
    /// the same code. Rejected to preserve legal numbering order.
    #[error(
        "allocation date {date} is earlier than last allocated date {last_date} for code '{code}'"
    )]
    DateRegression {
        code: String,
        date: NaiveDate,
        last_date: NaiveDate,
    },

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("invoice {invoice_id} not found")]
    InvoiceNotFound { invoice_id: InvoiceId },

    #[error("customer {customer_id} not found")]
    CustomerNotFound { customer_id: CustomerId },

    /// Storage-layer failure (lock poisoned, backend unavailable).
    #[error("storage failure: {0}")]
    Storage(String),
}

impl BookingError {
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Classify this error into the coarse taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingSequence { .. } | Self::MissingTaxConfig { .. } => ErrorKind::Configuration,
            Self::MissingQuantity { .. }
            | Self::MissingRate { .. }
            | Self::MissingCustomerName
            | Self::MissingCustomerAddress
            | Self::MissingCustomerVatId
            | Self::InvalidId(_) => ErrorKind::Validation,
            Self::AlreadyPublished { .. } | Self::NotPublished { .. } | Self::NoItemLines => {
                ErrorKind::State
            }
            Self::DateRegression { .. } => ErrorKind::Sequencing,
            Self::InvoiceNotFound { .. } | Self::CustomerNotFound { .. } | Self::Storage(_) => {
                ErrorKind::Storage
            }
        }
    }

    /// Whether this error belongs in a collected booking outcome (as opposed
    /// to aborting the call).
    pub fn is_collectable(&self) -> bool {
        self.kind() != ErrorKind::Storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_the_taxonomy() {
        let line_id = InvoiceLineId::new();
        assert_eq!(
            BookingError::MissingSequence {
                code: "invoice".to_string()
            }
            .kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            BookingError::MissingQuantity {
                line_id,
                position: 1
            }
            .kind(),
            ErrorKind::Validation
        );
        assert_eq!(BookingError::NoItemLines.kind(), ErrorKind::State);
        assert_eq!(
            BookingError::DateRegression {
                code: "invoice".to_string(),
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                last_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            }
            .kind(),
            ErrorKind::Sequencing
        );
        assert!(!BookingError::storage("lock poisoned").is_collectable());
    }

    #[test]
    fn missing_tax_config_message_names_the_class() {
        let class_id = ProductTaxClassId::new();
        let err = BookingError::MissingTaxConfig {
            line_id: InvoiceLineId::new(),
            position: 2,
            class_id,
        };
        assert_eq!(
            err.to_string(),
            format!("no tax config for product class {class_id}")
        );
    }
}
