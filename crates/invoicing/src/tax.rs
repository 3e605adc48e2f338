use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use billcraft_core::{BookingError, ProductTaxClassId, ValueObject};
use billcraft_parties::TaxRateConfig;

use crate::invoice::Invoice;
use crate::line::LineKind;
use crate::money::round2;

/// Per-invoice tax aggregate: one row per product tax class actually used by
/// the customer's tax configuration.
///
/// `value` and `total` are always recomputed from `net` and `rate` whenever
/// `net` is written; they can never be set independently, which is why the
/// monetary fields are private and only writable through [`add_net`].
///
/// [`add_net`]: InvoiceTaxClass::add_net
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceTaxClass {
    product_class: ProductTaxClassId,
    name: String,
    indicator_code: String,
    /// Percentage, e.g. `20` for 20 %.
    rate: Decimal,
    net: Decimal,
    value: Decimal,
    total: Decimal,
}

impl InvoiceTaxClass {
    fn from_config(config: &TaxRateConfig) -> Self {
        Self {
            product_class: config.product_class,
            name: config.name.clone(),
            indicator_code: config.indicator_code.clone(),
            rate: config.rate,
            net: Decimal::ZERO,
            value: Decimal::ZERO,
            total: Decimal::ZERO,
        }
    }

    /// Refresh name/code/rate from the current configuration and reset the
    /// accumulator. Part of the reconcile step.
    fn reconfigure(&mut self, config: &TaxRateConfig) {
        self.name = config.name.clone();
        self.indicator_code = config.indicator_code.clone();
        self.rate = config.rate;
        self.net = Decimal::ZERO;
        self.rederive();
    }

    fn add_net(&mut self, amount: Decimal) {
        self.net += amount;
        self.rederive();
    }

    fn rederive(&mut self) {
        self.value = round2(self.net * self.rate / Decimal::ONE_HUNDRED);
        self.total = self.net + self.value;
    }

    pub fn product_class(&self) -> ProductTaxClassId {
        self.product_class
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn indicator_code(&self) -> &str {
        &self.indicator_code
    }

    pub fn rate(&self) -> Decimal {
        self.rate
    }

    /// Sum of item amounts taxed at this rate.
    pub fn net(&self) -> Decimal {
        self.net
    }

    /// Tax value: `net × rate / 100`, rounded to cents.
    pub fn value(&self) -> Decimal {
        self.value
    }

    /// Gross: `net + value`.
    pub fn total(&self) -> Decimal {
        self.total
    }
}

impl ValueObject for InvoiceTaxClass {}

/// Idempotent recomputation of the per-tax-class aggregates of one invoice.
pub struct TaxAggregator;

impl TaxAggregator {
    /// Recompute the invoice's tax classes and sums from its lines and the
    /// customer's current tax-rate configuration.
    ///
    /// 1. Reconcile: the required classes are exactly those referenced by
    ///    `rates`. Existing rows are refreshed from configuration with their
    ///    accumulator reset; rows whose class is no longer required are
    ///    deleted. Running this twice with unchanged input yields the same
    ///    rows.
    /// 2. Accumulate: each item line adds its amount to the matching class
    ///    and receives the class's name/rate/indicator code as a
    ///    denormalized snapshot. A line referencing a class outside the
    ///    configuration is reported and skipped.
    /// 3. Derive: per-class `value`/`total`, then invoice `sum_net` and
    ///    `sum_total`.
    ///
    /// Sums are computed from whatever accumulated successfully; the caller
    /// decides whether partial sums may stand (the orchestrator zeroes them
    /// on any error).
    pub fn recompute(invoice: &mut Invoice, rates: &[TaxRateConfig]) -> Vec<BookingError> {
        if invoice.is_published() {
            return vec![BookingError::AlreadyPublished {
                invoice_id: invoice.id_typed(),
            }];
        }

        let mut errors = Vec::new();

        // Step 1: reconcile tax-class rows against the configuration.
        invoice
            .tax_classes
            .retain(|tc| rates.iter().any(|c| c.product_class == tc.product_class));
        for config in rates {
            let existing = invoice
                .tax_classes
                .iter()
                .position(|tc| tc.product_class == config.product_class);
            match existing {
                Some(idx) => invoice.tax_classes[idx].reconfigure(config),
                None => invoice.tax_classes.push(InvoiceTaxClass::from_config(config)),
            }
        }

        // Step 2: accumulate item amounts into their classes.
        let lines = &mut invoice.lines;
        let tax_classes = &mut invoice.tax_classes;
        for line in lines.iter_mut() {
            let LineKind::Item(item) = &mut line.kind else {
                continue;
            };
            match tax_classes
                .iter_mut()
                .find(|tc| tc.product_class == item.tax_class)
            {
                Some(tc) => {
                    tc.add_net(item.amount);
                    item.tax_name = Some(tc.name.clone());
                    item.tax_rate = Some(tc.rate);
                    item.tax_code = Some(tc.indicator_code.clone());
                }
                None => {
                    errors.push(BookingError::MissingTaxConfig {
                        line_id: line.id,
                        position: line.position,
                        class_id: item.tax_class,
                    });
                }
            }
        }

        // Step 3: derive document sums.
        let sum_net: Decimal = invoice.tax_classes.iter().map(|tc| tc.net).sum();
        let sum_total: Decimal = invoice.tax_classes.iter().map(|tc| tc.total).sum();
        invoice.set_sums(sum_net, sum_total);

        debug!(
            invoice_id = %invoice.id_typed(),
            classes = invoice.tax_classes.len(),
            %sum_net,
            %sum_total,
            errors = errors.len(),
            "tax aggregation recomputed"
        );

        errors
    }
}
