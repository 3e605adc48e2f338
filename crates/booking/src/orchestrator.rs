use std::sync::Arc;

use chrono::{Days, Utc};
use tracing::{info, warn};

use billcraft_core::{BookingError, BookingResult, InvoiceId};
use billcraft_events::{EventBus, InMemoryEventBus};
use billcraft_invoicing::{InvoiceLine, LineCheck, LineKind, LineValidator, TaxAggregator};
use billcraft_numbering::{SequenceAllocator, SequenceStore};
use billcraft_parties::CustomerDirectory;

use crate::notification::InvoiceBooked;
use crate::store::InvoiceStore;
use crate::token::payment_token;

/// Document-type code under which invoice numbers are allocated.
pub const INVOICE_DOCUMENT_CODE: &str = "invoice";

/// Terminal state of a booking run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingDisposition {
    /// Commit requested and performed; the invoice is now published.
    Committed,
    /// Dry run passed; nothing was persisted.
    Validated,
    /// Errors were collected; nothing was persisted.
    Rejected,
}

/// Result of one `book()` call: the complete collected error list plus the
/// operator-readable audit trace, returned on every path.
#[derive(Debug)]
pub struct BookingOutcome {
    pub disposition: BookingDisposition,
    pub errors: Vec<BookingError>,
    pub audit_log: Vec<String>,
    /// Present only after a committed booking; the signal for downstream
    /// notification dispatch.
    pub event: Option<InvoiceBooked>,
}

impl BookingOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self.disposition, BookingDisposition::Rejected)
    }

    fn rejected(errors: Vec<BookingError>, audit_log: Vec<String>) -> Self {
        Self {
            disposition: BookingDisposition::Rejected,
            errors,
            audit_log,
            event: None,
        }
    }
}

/// Coordinates a booking run: Draft → Validating → {Rejected, Committed}.
///
/// All validation errors within one run are collected, never thrown on the
/// first failure, so the caller receives the complete list. Only storage
/// failures abort the call as a transport-level `Err`.
pub struct BookingOrchestrator<D, S, I, B = InMemoryEventBus<InvoiceBooked>> {
    directory: D,
    allocator: SequenceAllocator<S>,
    invoices: I,
    notifier: Option<Arc<B>>,
}

impl<D, S, I> BookingOrchestrator<D, S, I> {
    pub fn new(directory: D, allocator: SequenceAllocator<S>, invoices: I) -> Self {
        Self {
            directory,
            allocator,
            invoices,
            notifier: None,
        }
    }
}

impl<D, S, I, B> BookingOrchestrator<D, S, I, B> {
    /// Attach a notification bus; `InvoiceBooked` is published there after
    /// each committed booking.
    pub fn with_notifier<B2>(self, bus: Arc<B2>) -> BookingOrchestrator<D, S, I, B2> {
        BookingOrchestrator {
            directory: self.directory,
            allocator: self.allocator,
            invoices: self.invoices,
            notifier: Some(bus),
        }
    }
}

impl<D, S, I, B> BookingOrchestrator<D, S, I, B>
where
    D: CustomerDirectory,
    S: SequenceStore,
    I: InvoiceStore,
    B: EventBus<InvoiceBooked>,
{
    /// Validate a draft invoice and, when `commit` is set, publish it.
    ///
    /// With `commit = false` this is a pure preview: the working copy is
    /// validated and computed in memory and discarded. With `commit = true`
    /// and no errors, the invoice receives its document number, payment
    /// token and final sums, flips to `published`, and is persisted; any
    /// collected error means nothing reaches storage.
    pub fn book(&self, invoice_id: InvoiceId, commit: bool) -> BookingResult<BookingOutcome> {
        let mut invoice = self
            .invoices
            .invoice(invoice_id)?
            .ok_or(BookingError::InvoiceNotFound { invoice_id })?;

        let mut audit: Vec<String> = Vec::new();

        // Step 1: published documents are immutable; do no further work.
        if invoice.is_published() {
            audit.push(format!(
                "invoice {invoice_id} is already published as {}; nothing to do",
                invoice.document_number().unwrap_or("<unnumbered>")
            ));
            return Ok(BookingOutcome::rejected(
                vec![BookingError::AlreadyPublished { invoice_id }],
                audit,
            ));
        }

        let customer = self.directory.customer(invoice.customer_id()).ok_or(
            BookingError::CustomerNotFound {
                customer_id: invoice.customer_id(),
            },
        )?;

        let mut errors: Vec<BookingError> = Vec::new();

        // Step 2: snapshot the customer onto the invoice. Sole write point
        // of the snapshot fields.
        invoice.apply_customer_snapshot(&customer)?;

        // Step 3: booking date and due date.
        let date = invoice.date().unwrap_or_else(|| Utc::now().date_naive());
        invoice.set_date(date)?;
        let due_date = date + Days::new(u64::from(customer.payment_terms_days));
        invoice.set_due_date(due_date)?;

        audit.push(format!(
            "customer: {} ({}), account {}, supplier {}, VAT {}",
            invoice.customer_name(),
            invoice.customer_address(),
            invoice.account_number(),
            invoice.supplier_number(),
            invoice.vat_id()
        ));
        if !invoice.tax_note().is_empty() {
            audit.push(format!("tax note: {}", invoice.tax_note()));
        }
        audit.push(format!(
            "date {date}, due {due_date} ({} days)",
            customer.payment_terms_days
        ));

        // Step 4: snapshot fields must be usable on a legal document.
        if invoice.customer_name().trim().is_empty() {
            errors.push(BookingError::MissingCustomerName);
        }
        if invoice.customer_address().trim().is_empty() {
            errors.push(BookingError::MissingCustomerAddress);
        }
        if invoice.vat_id().trim().is_empty() {
            errors.push(BookingError::MissingCustomerVatId);
        }

        // Step 5: per-line validation and amount write-back.
        for line in invoice.lines_mut()? {
            let LineCheck {
                amount,
                errors: line_errors,
            } = LineValidator::validate_and_compute(line);
            errors.extend(line_errors);
            if let LineKind::Item(item) = &mut line.kind {
                item.amount = amount;
            }
            audit.push(line_trace(line));
        }

        // Step 6: tax aggregation against the current configuration.
        let rates = self.directory.tax_rates(customer.id);
        let tax_errors = TaxAggregator::recompute(&mut invoice, &rates);
        let aggregation_failed = !tax_errors.is_empty();
        errors.extend(tax_errors);
        if aggregation_failed {
            // A partially-taxed invoice must never be presented as
            // financially final.
            invoice.zero_sums()?;
        }

        for tc in invoice.tax_classes() {
            audit.push(format!(
                "tax class '{}' (code {}) {}%: net {:.2}, tax {:.2}, gross {:.2}",
                tc.name(),
                tc.indicator_code(),
                tc.rate(),
                tc.net(),
                tc.value(),
                tc.total()
            ));
        }
        audit.push(format!(
            "sums: net {:.2}, total {:.2}",
            invoice.sum_net(),
            invoice.sum_total()
        ));

        // Step 7: a document without chargeable lines is not an invoice.
        if !invoice.has_item_lines() {
            errors.push(BookingError::NoItemLines);
        }

        // Step 8: error barrier. Nothing below runs with collected errors.
        if !errors.is_empty() {
            audit.push(format!("rejected: {} error(s)", errors.len()));
            info!(%invoice_id, errors = errors.len(), "booking rejected");
            return Ok(BookingOutcome::rejected(errors, audit));
        }

        // Step 9: dry run stops here.
        if !commit {
            audit.push("validated (dry run), nothing persisted".to_string());
            return Ok(BookingOutcome {
                disposition: BookingDisposition::Validated,
                errors,
                audit_log: audit,
                event: None,
            });
        }

        // Step 10: allocate, tokenize, publish, persist.
        let number = match self.allocator.allocate(INVOICE_DOCUMENT_CODE, date) {
            Ok(number) => number,
            Err(err) if err.is_collectable() => {
                // Missing sequence config or a date regression: reported to
                // the caller like any other finding, nothing persisted.
                errors.push(err);
                audit.push(format!("rejected: {} error(s)", errors.len()));
                return Ok(BookingOutcome::rejected(errors, audit));
            }
            Err(err) => return Err(err),
        };

        let token = payment_token(customer.id, &number);
        invoice.publish(number.clone(), token)?;
        self.invoices.commit_booking(&invoice)?;

        let event = InvoiceBooked {
            invoice_id,
            customer_id: customer.id,
            document_number: number.clone(),
            sum_net: invoice.sum_net(),
            sum_total: invoice.sum_total(),
            occurred_at: Utc::now(),
        };
        if let Some(bus) = &self.notifier {
            if let Err(e) = bus.publish(event.clone()) {
                // The booking stands; delivery is an external concern.
                warn!(%invoice_id, error = ?e, "booked-invoice notification failed");
            }
        }

        audit.push(format!("committed as {number}"));
        info!(%invoice_id, number = %number, total = %invoice.sum_total(), "invoice booked");

        Ok(BookingOutcome {
            disposition: BookingDisposition::Committed,
            errors,
            audit_log: audit,
            event: Some(event),
        })
    }
}

fn line_trace(line: &InvoiceLine) -> String {
    match line.item_data() {
        Some(item) => match (item.quantity, item.rate) {
            (Some(quantity), Some(rate)) => format!(
                "line {} [item] '{}': {} x {:.2} = {:.2}",
                line.position, line.title, quantity, rate, item.amount
            ),
            _ => format!(
                "line {} [item] '{}': incomplete (missing quantity or rate)",
                line.position, line.title
            ),
        },
        None => format!(
            "line {} [{}] '{}'",
            line.position,
            line.kind_name(),
            line.title
        ),
    }
}
