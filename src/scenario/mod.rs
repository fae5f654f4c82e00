//! Turns one catalog entry into the concrete request bodies to send.

mod dates;
mod expand;
mod params;
mod transforms;

pub use dates::{auto_payment_dates, AutoPaymentDates, DATE_FORMAT};
pub use expand::{expand, Expansion, ExpansionKind, Scenario, ScenarioBody};
pub use params::{coerce_id, split_ids, PaymentOverride, ScenarioParams};
