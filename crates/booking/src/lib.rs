//! Booking orchestration.
//!
//! Turns a mutable draft invoice into an immutable, sequentially numbered,
//! tax-computed financial document. The orchestrator coordinates per-line
//! validation, tax aggregation and document-number allocation, collects
//! every error it finds, and commits all-or-nothing: no persistent state
//! change reaches storage unless the whole booking is valid.

pub mod notification;
pub mod orchestrator;
pub mod snapshot;
pub mod store;
pub mod token;

pub use notification::InvoiceBooked;
pub use orchestrator::{
    BookingDisposition, BookingOrchestrator, BookingOutcome, INVOICE_DOCUMENT_CODE,
};
pub use snapshot::{Issuer, LineView, RenderSnapshot, TaxClassView};
pub use store::{InMemoryInvoiceStore, InvoiceStore};
pub use token::{TOKEN_LEN, payment_token};
