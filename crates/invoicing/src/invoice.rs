use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use billcraft_core::{BookingError, BookingResult, CustomerId, Entity, InvoiceId, InvoiceLineId};
use billcraft_parties::Customer;

use crate::line::InvoiceLine;
use crate::tax::InvoiceTaxClass;

/// Invoice header document.
///
/// An invoice starts as a mutable draft and is turned into an immutable,
/// sequentially numbered, tax-computed financial document by the booking
/// orchestrator. Once `published` is set, no line, tax class or snapshot
/// field may change; every mutator on this type enforces that.
///
/// The customer snapshot fields (`customer_name` … `tax_note`) are copied
/// from the live customer record exactly once, at booking time, and are
/// never re-derived afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub(crate) id: InvoiceId,
    pub(crate) customer_id: CustomerId,
    pub(crate) published: bool,
    pub(crate) date: Option<NaiveDate>,
    pub(crate) due_date: Option<NaiveDate>,
    pub(crate) document_number: Option<String>,
    pub(crate) token: Option<String>,
    pub(crate) customer_name: String,
    pub(crate) customer_address: String,
    pub(crate) account_number: String,
    pub(crate) supplier_number: String,
    pub(crate) vat_id: String,
    pub(crate) tax_note: String,
    pub(crate) sum_net: Decimal,
    pub(crate) sum_total: Decimal,
    pub(crate) lines: Vec<InvoiceLine>,
    pub(crate) tax_classes: Vec<InvoiceTaxClass>,
}

impl Invoice {
    /// Create an empty draft for a customer. Lines are added by the
    /// upstream editing flow.
    pub fn draft(id: InvoiceId, customer_id: CustomerId) -> Self {
        Self {
            id,
            customer_id,
            published: false,
            date: None,
            due_date: None,
            document_number: None,
            token: None,
            customer_name: String::new(),
            customer_address: String::new(),
            account_number: String::new(),
            supplier_number: String::new(),
            vat_id: String::new(),
            tax_note: String::new(),
            sum_net: Decimal::ZERO,
            sum_total: Decimal::ZERO,
            lines: Vec::new(),
            tax_classes: Vec::new(),
        }
    }

    pub fn id_typed(&self) -> InvoiceId {
        self.id
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn is_published(&self) -> bool {
        self.published
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }

    pub fn document_number(&self) -> Option<&str> {
        self.document_number.as_deref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    pub fn customer_address(&self) -> &str {
        &self.customer_address
    }

    pub fn account_number(&self) -> &str {
        &self.account_number
    }

    pub fn supplier_number(&self) -> &str {
        &self.supplier_number
    }

    pub fn vat_id(&self) -> &str {
        &self.vat_id
    }

    pub fn tax_note(&self) -> &str {
        &self.tax_note
    }

    pub fn sum_net(&self) -> Decimal {
        self.sum_net
    }

    pub fn sum_total(&self) -> Decimal {
        self.sum_total
    }

    /// Lines in document (position) order.
    pub fn lines(&self) -> &[InvoiceLine] {
        &self.lines
    }

    pub fn tax_classes(&self) -> &[InvoiceTaxClass] {
        &self.tax_classes
    }

    pub fn has_item_lines(&self) -> bool {
        self.lines.iter().any(InvoiceLine::is_item)
    }

    fn ensure_draft(&self) -> BookingResult<()> {
        if self.published {
            return Err(BookingError::AlreadyPublished {
                invoice_id: self.id,
            });
        }
        Ok(())
    }

    /// Append a line, assigning the next position.
    pub fn add_line(&mut self, mut line: InvoiceLine) -> BookingResult<InvoiceLineId> {
        self.ensure_draft()?;
        line.position = self.lines.len() as u32 + 1;
        let id = line.id;
        self.lines.push(line);
        Ok(id)
    }

    /// Remove a line and renumber the remainder so positions stay dense.
    pub fn remove_line(&mut self, line_id: InvoiceLineId) -> BookingResult<bool> {
        self.ensure_draft()?;
        let before = self.lines.len();
        self.lines.retain(|l| l.id != line_id);
        let removed = self.lines.len() != before;
        if removed {
            for (idx, line) in self.lines.iter_mut().enumerate() {
                line.position = idx as u32 + 1;
            }
        }
        Ok(removed)
    }

    /// Mutable access to the lines of a draft. Rejected once published.
    pub fn lines_mut(&mut self) -> BookingResult<&mut Vec<InvoiceLine>> {
        self.ensure_draft()?;
        Ok(&mut self.lines)
    }

    pub fn set_date(&mut self, date: NaiveDate) -> BookingResult<()> {
        self.ensure_draft()?;
        self.date = Some(date);
        Ok(())
    }

    pub fn set_due_date(&mut self, due_date: NaiveDate) -> BookingResult<()> {
        self.ensure_draft()?;
        self.due_date = Some(due_date);
        Ok(())
    }

    /// Copy the snapshot fields from the live customer record. This is the
    /// only write point for these fields; after publication they are frozen.
    pub fn apply_customer_snapshot(&mut self, customer: &Customer) -> BookingResult<()> {
        self.ensure_draft()?;
        self.customer_name = customer.name.clone();
        self.customer_address = customer.address.clone();
        self.account_number = customer.account_number.clone();
        self.supplier_number = customer.supplier_number.clone();
        self.vat_id = customer.vat_id.clone();
        self.tax_note = customer.tax_note.clone();
        Ok(())
    }

    pub(crate) fn set_sums(&mut self, sum_net: Decimal, sum_total: Decimal) {
        self.sum_net = sum_net;
        self.sum_total = sum_total;
    }

    /// Force both sums to zero. Used when aggregation reported errors: a
    /// partially-taxed invoice must never be presented as financially final.
    pub fn zero_sums(&mut self) -> BookingResult<()> {
        self.ensure_draft()?;
        self.sum_net = Decimal::ZERO;
        self.sum_total = Decimal::ZERO;
        Ok(())
    }

    /// One-way transition to the published state, assigning the document
    /// number and payment token exactly once.
    pub fn publish(&mut self, document_number: String, token: String) -> BookingResult<()> {
        self.ensure_draft()?;
        self.document_number = Some(document_number);
        self.token = Some(token);
        self.published = true;
        Ok(())
    }
}

impl Entity for Invoice {
    type Id = InvoiceId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    use billcraft_core::ProductTaxClassId;

    fn test_draft() -> Invoice {
        Invoice::draft(InvoiceId::new(), CustomerId::new())
    }

    fn test_customer() -> Customer {
        Customer {
            id: CustomerId::new(),
            name: "Acme Trading Ltd".to_string(),
            address: "1 Main Street, Springfield".to_string(),
            account_number: "10023".to_string(),
            supplier_number: "884".to_string(),
            vat_id: "GB123456789".to_string(),
            payment_terms_days: 14,
            tax_note: "Goods remain our property until paid in full.".to_string(),
        }
    }

    #[test]
    fn add_line_assigns_dense_positions() {
        let mut invoice = test_draft();
        let class = ProductTaxClassId::new();
        invoice
            .add_line(InvoiceLine::item("A", "", Some(dec!(1)), Some(dec!(10)), class))
            .unwrap();
        invoice.add_line(InvoiceLine::subheading("B")).unwrap();
        let removed_id = invoice
            .add_line(InvoiceLine::text("C", ""))
            .unwrap();
        invoice.add_line(InvoiceLine::plain("D", "")).unwrap();

        assert!(invoice.remove_line(removed_id).unwrap());
        let positions: Vec<u32> = invoice.lines().iter().map(|l| l.position).collect();
        assert_eq!(positions, vec![1, 2, 3]);
    }

    #[test]
    fn snapshot_copies_all_customer_fields() {
        let mut invoice = test_draft();
        let customer = test_customer();
        invoice.apply_customer_snapshot(&customer).unwrap();

        assert_eq!(invoice.customer_name(), customer.name);
        assert_eq!(invoice.customer_address(), customer.address);
        assert_eq!(invoice.account_number(), customer.account_number);
        assert_eq!(invoice.supplier_number(), customer.supplier_number);
        assert_eq!(invoice.vat_id(), customer.vat_id);
        assert_eq!(invoice.tax_note(), customer.tax_note);
    }

    #[test]
    fn publish_is_one_way() {
        let mut invoice = test_draft();
        invoice
            .publish("20240001".to_string(), "tok".to_string())
            .unwrap();
        assert!(invoice.is_published());
        assert_eq!(invoice.document_number(), Some("20240001"));
        assert_eq!(invoice.token(), Some("tok"));

        let err = invoice
            .publish("20240002".to_string(), "tok2".to_string())
            .unwrap_err();
        match err {
            BookingError::AlreadyPublished { invoice_id } => {
                assert_eq!(invoice_id, invoice.id_typed());
            }
            _ => panic!("Expected AlreadyPublished error"),
        }
        // First assignment stands.
        assert_eq!(invoice.document_number(), Some("20240001"));
    }

    #[test]
    fn published_invoice_rejects_every_mutation() {
        let mut invoice = test_draft();
        let customer = test_customer();
        invoice
            .publish("20240001".to_string(), "tok".to_string())
            .unwrap();

        assert!(invoice.add_line(InvoiceLine::text("X", "")).is_err());
        assert!(invoice.remove_line(InvoiceLineId::new()).is_err());
        assert!(invoice.lines_mut().is_err());
        assert!(invoice
            .set_date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
            .is_err());
        assert!(invoice.apply_customer_snapshot(&customer).is_err());
        assert!(invoice.zero_sums().is_err());
    }
}
