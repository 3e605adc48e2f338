use std::collections::HashMap;
use std::sync::RwLock;

use billcraft_core::{BookingError, BookingResult, InvoiceId};
use billcraft_invoicing::Invoice;

/// Persistence seam for invoices.
///
/// `commit_booking` is the single write point of the booking commit: line
/// amounts, tax-class sums, document number, token and the `published` flag
/// arrive as one finalized document. A database-backed implementation must
/// bind this write and the document-number allocation into one transaction
/// so a failure rolls both back; the in-memory store cannot fail after
/// validation, which gives the same all-or-nothing behavior in-process.
pub trait InvoiceStore: Send + Sync {
    fn invoice(&self, id: InvoiceId) -> BookingResult<Option<Invoice>>;

    /// Store or replace a draft (upstream editing seam). Published invoices
    /// are immutable and can be neither stored here nor overwritten.
    fn put_draft(&self, invoice: Invoice) -> BookingResult<()>;

    /// Persist a finalized (published) invoice atomically.
    fn commit_booking(&self, invoice: &Invoice) -> BookingResult<()>;
}

impl<S> InvoiceStore for std::sync::Arc<S>
where
    S: InvoiceStore + ?Sized,
{
    fn invoice(&self, id: InvoiceId) -> BookingResult<Option<Invoice>> {
        (**self).invoice(id)
    }

    fn put_draft(&self, invoice: Invoice) -> BookingResult<()> {
        (**self).put_draft(invoice)
    }

    fn commit_booking(&self, invoice: &Invoice) -> BookingResult<()> {
        (**self).commit_booking(invoice)
    }
}

/// In-memory invoice store.
///
/// Intended for tests/dev and single-process deployments.
#[derive(Debug, Default)]
pub struct InMemoryInvoiceStore {
    invoices: RwLock<HashMap<InvoiceId, Invoice>>,
}

impl InMemoryInvoiceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl InvoiceStore for InMemoryInvoiceStore {
    fn invoice(&self, id: InvoiceId) -> BookingResult<Option<Invoice>> {
        let invoices = self
            .invoices
            .read()
            .map_err(|_| BookingError::storage("invoice store lock poisoned"))?;
        Ok(invoices.get(&id).cloned())
    }

    fn put_draft(&self, invoice: Invoice) -> BookingResult<()> {
        if invoice.is_published() {
            return Err(BookingError::AlreadyPublished {
                invoice_id: invoice.id_typed(),
            });
        }
        let mut invoices = self
            .invoices
            .write()
            .map_err(|_| BookingError::storage("invoice store lock poisoned"))?;
        if let Some(existing) = invoices.get(&invoice.id_typed()) {
            if existing.is_published() {
                return Err(BookingError::AlreadyPublished {
                    invoice_id: invoice.id_typed(),
                });
            }
        }
        invoices.insert(invoice.id_typed(), invoice);
        Ok(())
    }

    fn commit_booking(&self, invoice: &Invoice) -> BookingResult<()> {
        if !invoice.is_published() {
            return Err(BookingError::NotPublished {
                invoice_id: invoice.id_typed(),
            });
        }
        let mut invoices = self
            .invoices
            .write()
            .map_err(|_| BookingError::storage("invoice store lock poisoned"))?;
        invoices.insert(invoice.id_typed(), invoice.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use billcraft_core::CustomerId;

    #[test]
    fn draft_roundtrip() {
        let store = InMemoryInvoiceStore::new();
        let invoice = Invoice::draft(InvoiceId::new(), CustomerId::new());
        let id = invoice.id_typed();

        store.put_draft(invoice.clone()).unwrap();
        assert_eq!(store.invoice(id).unwrap(), Some(invoice));
    }

    #[test]
    fn commit_requires_published() {
        let store = InMemoryInvoiceStore::new();
        let invoice = Invoice::draft(InvoiceId::new(), CustomerId::new());
        let err = store.commit_booking(&invoice).unwrap_err();
        match err {
            BookingError::NotPublished { .. } => {}
            _ => panic!("Expected NotPublished error"),
        }
    }

    #[test]
    fn published_invoice_cannot_be_overwritten_by_draft() {
        let store = InMemoryInvoiceStore::new();
        let mut invoice = Invoice::draft(InvoiceId::new(), CustomerId::new());
        let id = invoice.id_typed();
        let draft_copy = invoice.clone();

        invoice
            .publish("20240001".to_string(), "tok".to_string())
            .unwrap();
        store.commit_booking(&invoice).unwrap();

        let err = store.put_draft(draft_copy).unwrap_err();
        match err {
            BookingError::AlreadyPublished { invoice_id } => assert_eq!(invoice_id, id),
            _ => panic!("Expected AlreadyPublished error"),
        }
    }
}
