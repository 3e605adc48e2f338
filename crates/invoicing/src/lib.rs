//! Invoicing domain module.
//!
//! This crate contains the invoice document model and the two computation
//! components that run over it during booking (per-line validation and
//! per-tax-class aggregation), implemented purely as deterministic domain
//! logic (no IO, no HTTP, no storage).

pub mod invoice;
pub mod line;
pub mod money;
pub mod tax;

pub use invoice::Invoice;
pub use line::{InvoiceLine, ItemData, LineCheck, LineKind, LineValidator};
pub use money::round2;
pub use tax::{InvoiceTaxClass, TaxAggregator};
