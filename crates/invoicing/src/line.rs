use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use billcraft_core::{BookingError, InvoiceLineId, ProductTaxClassId};

use crate::money::round2;

/// Chargeable payload of an `item` line.
///
/// `quantity` and `rate` are optional while the draft is being edited; both
/// must be present before the invoice can be booked. The three `tax_*`
/// fields are a denormalized snapshot copied from the matching invoice tax
/// class during aggregation (used later for rendering and audit).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemData {
    pub quantity: Option<Decimal>,
    pub rate: Option<Decimal>,
    /// Always `quantity × rate`, written back by the orchestrator after
    /// validation.
    pub amount: Decimal,
    /// Product tax class this line is charged under.
    pub tax_class: ProductTaxClassId,
    pub tax_name: Option<String>,
    pub tax_rate: Option<Decimal>,
    pub tax_code: Option<String>,
}

/// Line variant discriminator.
///
/// Only `Item` carries charge data; the other variants are document
/// structure (headings, free text) and always have amount 0 with no
/// quantity or rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    Item(ItemData),
    Text,
    Subheading,
    Plain,
}

/// One line of an invoice. `position` defines document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub id: InvoiceLineId,
    pub position: u32,
    pub title: String,
    pub description: String,
    pub kind: LineKind,
}

impl InvoiceLine {
    /// New chargeable line. Quantity/rate may still be missing in a draft.
    pub fn item(
        title: impl Into<String>,
        description: impl Into<String>,
        quantity: Option<Decimal>,
        rate: Option<Decimal>,
        tax_class: ProductTaxClassId,
    ) -> Self {
        Self {
            id: InvoiceLineId::new(),
            position: 0,
            title: title.into(),
            description: description.into(),
            kind: LineKind::Item(ItemData {
                quantity,
                rate,
                amount: Decimal::ZERO,
                tax_class,
                tax_name: None,
                tax_rate: None,
                tax_code: None,
            }),
        }
    }

    pub fn text(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: InvoiceLineId::new(),
            position: 0,
            title: title.into(),
            description: description.into(),
            kind: LineKind::Text,
        }
    }

    pub fn subheading(title: impl Into<String>) -> Self {
        Self {
            id: InvoiceLineId::new(),
            position: 0,
            title: title.into(),
            description: String::new(),
            kind: LineKind::Subheading,
        }
    }

    pub fn plain(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: InvoiceLineId::new(),
            position: 0,
            title: title.into(),
            description: description.into(),
            kind: LineKind::Plain,
        }
    }

    pub fn is_item(&self) -> bool {
        matches!(self.kind, LineKind::Item(_))
    }

    pub fn item_data(&self) -> Option<&ItemData> {
        match &self.kind {
            LineKind::Item(item) => Some(item),
            _ => None,
        }
    }

    /// Line amount: `quantity × rate` for item lines, 0 for everything else.
    pub fn amount(&self) -> Decimal {
        match &self.kind {
            LineKind::Item(item) => item.amount,
            _ => Decimal::ZERO,
        }
    }

    /// Variant name for audit/rendering output.
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            LineKind::Item(_) => "item",
            LineKind::Text => "text",
            LineKind::Subheading => "subheading",
            LineKind::Plain => "plain",
        }
    }
}

/// Result of validating one line: the amount to store and any errors found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineCheck {
    pub amount: Decimal,
    pub errors: Vec<BookingError>,
}

impl LineCheck {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Per-line validation and amount computation.
///
/// Pure: returns the computed amount instead of writing it; persistence is
/// the orchestrator's responsibility.
pub struct LineValidator;

impl LineValidator {
    /// Validate one line and compute its amount.
    ///
    /// Item lines require both quantity and rate; each missing field is
    /// reported separately so the caller sees every problem at once.
    /// Non-item lines always compute to 0; they carry no charge data.
    pub fn validate_and_compute(line: &InvoiceLine) -> LineCheck {
        match &line.kind {
            LineKind::Item(item) => {
                let mut errors = Vec::new();
                if item.quantity.is_none() {
                    errors.push(BookingError::MissingQuantity {
                        line_id: line.id,
                        position: line.position,
                    });
                }
                if item.rate.is_none() {
                    errors.push(BookingError::MissingRate {
                        line_id: line.id,
                        position: line.position,
                    });
                }

                let amount = match (item.quantity, item.rate) {
                    (Some(quantity), Some(rate)) => round2(quantity * rate),
                    _ => Decimal::ZERO,
                };

                LineCheck { amount, errors }
            }
            LineKind::Text | LineKind::Subheading | LineKind::Plain => LineCheck {
                amount: Decimal::ZERO,
                errors: Vec::new(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn test_class() -> ProductTaxClassId {
        ProductTaxClassId::new()
    }

    #[test]
    fn item_amount_is_quantity_times_rate() {
        let line = InvoiceLine::item(
            "Consulting",
            "",
            Some(dec!(2)),
            Some(dec!(85.00)),
            test_class(),
        );
        let check = LineValidator::validate_and_compute(&line);
        assert!(check.is_ok());
        assert_eq!(check.amount, dec!(170.00));
    }

    #[test]
    fn missing_quantity_and_rate_are_both_reported() {
        let line = InvoiceLine::item("Consulting", "", None, None, test_class());
        let check = LineValidator::validate_and_compute(&line);
        assert_eq!(check.amount, Decimal::ZERO);
        assert_eq!(check.errors.len(), 2);
        match &check.errors[0] {
            BookingError::MissingQuantity { line_id, .. } => assert_eq!(*line_id, line.id),
            _ => panic!("Expected MissingQuantity error"),
        }
        match &check.errors[1] {
            BookingError::MissingRate { line_id, .. } => assert_eq!(*line_id, line.id),
            _ => panic!("Expected MissingRate error"),
        }
    }

    #[test]
    fn missing_rate_alone_is_reported() {
        let line = InvoiceLine::item("Consulting", "", Some(dec!(3)), None, test_class());
        let check = LineValidator::validate_and_compute(&line);
        assert_eq!(check.errors.len(), 1);
        match &check.errors[0] {
            BookingError::MissingRate { .. } => {}
            _ => panic!("Expected MissingRate error"),
        }
    }

    #[test]
    fn non_item_lines_compute_to_zero() {
        for line in [
            InvoiceLine::text("Note", "Delivery in June"),
            InvoiceLine::subheading("Phase 1"),
            InvoiceLine::plain("Remark", ""),
        ] {
            let check = LineValidator::validate_and_compute(&line);
            assert!(check.is_ok());
            assert_eq!(check.amount, Decimal::ZERO);
            assert_eq!(line.amount(), Decimal::ZERO);
            assert!(line.item_data().is_none());
        }
    }

    #[test]
    fn fractional_amounts_round_to_cents() {
        let line = InvoiceLine::item(
            "Metered usage",
            "",
            Some(dec!(0.333)),
            Some(dec!(10.00)),
            test_class(),
        );
        let check = LineValidator::validate_and_compute(&line);
        assert_eq!(check.amount, dec!(3.33));
    }
}
