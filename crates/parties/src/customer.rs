use std::collections::HashMap;
use std::sync::RwLock;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use billcraft_core::{CustomerId, Entity, ProductTaxClassId, ValueObject};

/// Customer record as delivered by the external customer provider.
///
/// The booking orchestrator copies `name`, `address`, `account_number`,
/// `supplier_number`, `vat_id` and `tax_note` onto the invoice at booking
/// time; after commit those snapshot fields are frozen and never re-derived
/// from this record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub address: String,
    pub account_number: String,
    pub supplier_number: String,
    pub vat_id: String,
    /// Payment terms in days; booking derives `due_date = date + terms`.
    pub payment_terms_days: u32,
    /// Free-text tax note printed on documents (e.g. reverse-charge wording).
    pub tax_note: String,
}

impl Entity for Customer {
    type Id = CustomerId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// One row of a customer's tax-rate configuration: the percentage applied to
/// item lines of a given product tax class, plus the name and indicator code
/// copied onto the invoice during aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRateConfig {
    pub product_class: ProductTaxClassId,
    pub name: String,
    pub indicator_code: String,
    /// Percentage, e.g. `20` for 20 %.
    pub rate: Decimal,
}

impl ValueObject for TaxRateConfig {}

/// Read access to customer master data and tax-rate configuration.
///
/// Implemented by the external customer provider; the in-memory directory
/// below serves tests and single-process deployments.
pub trait CustomerDirectory: Send + Sync {
    fn customer(&self, id: CustomerId) -> Option<Customer>;

    /// The customer's tax-rate configuration. The set of product tax classes
    /// referenced here is exactly the set of tax classes an invoice for this
    /// customer may use.
    fn tax_rates(&self, id: CustomerId) -> Vec<TaxRateConfig>;
}

#[derive(Debug, Clone)]
struct CustomerRecord {
    customer: Customer,
    rates: Vec<TaxRateConfig>,
}

/// In-memory customer directory.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryCustomerDirectory {
    records: RwLock<HashMap<CustomerId, CustomerRecord>>,
}

impl InMemoryCustomerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, customer: Customer, rates: Vec<TaxRateConfig>) {
        if let Ok(mut records) = self.records.write() {
            records.insert(customer.id, CustomerRecord { customer, rates });
        }
    }
}

impl CustomerDirectory for InMemoryCustomerDirectory {
    fn customer(&self, id: CustomerId) -> Option<Customer> {
        let records = self.records.read().ok()?;
        records.get(&id).map(|r| r.customer.clone())
    }

    fn tax_rates(&self, id: CustomerId) -> Vec<TaxRateConfig> {
        let Ok(records) = self.records.read() else {
            return Vec::new();
        };
        records.get(&id).map(|r| r.rates.clone()).unwrap_or_default()
    }
}

impl<D> CustomerDirectory for std::sync::Arc<D>
where
    D: CustomerDirectory + ?Sized,
{
    fn customer(&self, id: CustomerId) -> Option<Customer> {
        (**self).customer(id)
    }

    fn tax_rates(&self, id: CustomerId) -> Vec<TaxRateConfig> {
        (**self).tax_rates(id)
    }
}
