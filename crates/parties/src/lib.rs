//! Customer collaborator interface.
//!
//! Customer management itself lives outside the booking engine; this crate
//! defines what the engine *consumes*: the customer record whose fields are
//! snapshotted onto an invoice at booking time, the per-customer tax-rate
//! configuration, and the directory trait behind which both are fetched.

pub mod customer;

pub use customer::{Customer, CustomerDirectory, InMemoryCustomerDirectory, TaxRateConfig};
