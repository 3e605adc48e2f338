use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use billcraft_core::{CustomerId, InvoiceId};
use billcraft_events::Event;

/// Event: an invoice was committed to its published form.
///
/// Published after the booking transaction; downstream consumers (email
/// dispatch, dashboards) treat it as the signal that a new financial
/// document exists. Sending anything is their responsibility, not the
/// engine's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceBooked {
    pub invoice_id: InvoiceId,
    pub customer_id: CustomerId,
    pub document_number: String,
    pub sum_net: Decimal,
    pub sum_total: Decimal,
    pub occurred_at: DateTime<Utc>,
}

impl Event for InvoiceBooked {
    fn event_type(&self) -> &'static str {
        "booking.invoice.booked"
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}
