use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use billcraft_core::{BookingError, BookingResult};
use billcraft_invoicing::Invoice;

/// Issuer metadata the renderer prints alongside the customer snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issuer {
    pub name: String,
    pub address: String,
    pub vat_id: String,
    pub bank_details: String,
}

/// One line of the renderer-facing projection, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineView {
    pub position: u32,
    pub kind: String,
    pub title: String,
    pub description: String,
    pub quantity: Option<Decimal>,
    pub rate: Option<Decimal>,
    pub amount: Decimal,
    pub tax_name: Option<String>,
    pub tax_rate: Option<Decimal>,
    pub tax_code: Option<String>,
}

/// One row of the tax table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxClassView {
    pub name: String,
    pub indicator_code: String,
    pub rate: Decimal,
    pub net: Decimal,
    pub value: Decimal,
    pub total: Decimal,
}

/// Flat field set handed to the external renderer for a committed invoice.
///
/// The engine exposes the data; generating a document from it (PDF, XML,
/// anything else) is the renderer collaborator's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderSnapshot {
    pub issuer_name: String,
    pub issuer_address: String,
    pub issuer_vat_id: String,
    pub issuer_bank_details: String,

    pub customer_name: String,
    pub customer_address: String,
    pub account_number: String,
    pub supplier_number: String,
    pub vat_id: String,
    pub tax_note: String,

    pub document_number: String,
    pub date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub token: String,

    pub lines: Vec<LineView>,
    pub tax_classes: Vec<TaxClassView>,
    pub sum_net: Decimal,
    pub sum_total: Decimal,
}

impl RenderSnapshot {
    /// Project a finalized (post-commit) invoice into the renderer field
    /// set. Drafts have nothing to render and are rejected.
    pub fn project(invoice: &Invoice, issuer: &Issuer) -> BookingResult<Self> {
        if !invoice.is_published() {
            return Err(BookingError::NotPublished {
                invoice_id: invoice.id_typed(),
            });
        }

        let lines = invoice
            .lines()
            .iter()
            .map(|line| {
                let item = line.item_data();
                LineView {
                    position: line.position,
                    kind: line.kind_name().to_string(),
                    title: line.title.clone(),
                    description: line.description.clone(),
                    quantity: item.and_then(|i| i.quantity),
                    rate: item.and_then(|i| i.rate),
                    amount: line.amount(),
                    tax_name: item.and_then(|i| i.tax_name.clone()),
                    tax_rate: item.and_then(|i| i.tax_rate),
                    tax_code: item.and_then(|i| i.tax_code.clone()),
                }
            })
            .collect();

        let tax_classes = invoice
            .tax_classes()
            .iter()
            .map(|tc| TaxClassView {
                name: tc.name().to_string(),
                indicator_code: tc.indicator_code().to_string(),
                rate: tc.rate(),
                net: tc.net(),
                value: tc.value(),
                total: tc.total(),
            })
            .collect();

        Ok(Self {
            issuer_name: issuer.name.clone(),
            issuer_address: issuer.address.clone(),
            issuer_vat_id: issuer.vat_id.clone(),
            issuer_bank_details: issuer.bank_details.clone(),
            customer_name: invoice.customer_name().to_string(),
            customer_address: invoice.customer_address().to_string(),
            account_number: invoice.account_number().to_string(),
            supplier_number: invoice.supplier_number().to_string(),
            vat_id: invoice.vat_id().to_string(),
            tax_note: invoice.tax_note().to_string(),
            document_number: invoice.document_number().unwrap_or_default().to_string(),
            date: invoice.date(),
            due_date: invoice.due_date(),
            token: invoice.token().unwrap_or_default().to_string(),
            lines,
            tax_classes,
            sum_net: invoice.sum_net(),
            sum_total: invoice.sum_total(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use billcraft_core::{CustomerId, InvoiceId};

    fn test_issuer() -> Issuer {
        Issuer {
            name: "Billcraft GmbH".to_string(),
            address: "Workshop Lane 4, 10115 Berlin".to_string(),
            vat_id: "DE987654321".to_string(),
            bank_details: "IBAN DE02 1203 0000 0000 2020 51".to_string(),
        }
    }

    #[test]
    fn drafts_cannot_be_projected() {
        let invoice = Invoice::draft(InvoiceId::new(), CustomerId::new());
        let err = RenderSnapshot::project(&invoice, &test_issuer()).unwrap_err();
        match err {
            BookingError::NotPublished { .. } => {}
            _ => panic!("Expected NotPublished error"),
        }
    }

    #[test]
    fn projection_carries_document_identity() {
        let mut invoice = Invoice::draft(InvoiceId::new(), CustomerId::new());
        invoice
            .publish("20240001".to_string(), "abcdefghij0123456789".to_string())
            .unwrap();

        let snapshot = RenderSnapshot::project(&invoice, &test_issuer()).unwrap();
        assert_eq!(snapshot.document_number, "20240001");
        assert_eq!(snapshot.token, "abcdefghij0123456789");
        assert_eq!(snapshot.issuer_name, "Billcraft GmbH");
    }
}
