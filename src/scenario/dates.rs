use chrono::{Datelike, Days, Months, NaiveDate};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

const SECOND_PAYMENT_GAP_DAYS: u64 = 14;
const SECOND_PAYMENT_DAY_WHEN_FIRST: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoPaymentDates {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub second_payment_start_date: NaiveDate,
}

fn first_of_month(date: NaiveDate) -> Option<NaiveDate> {
    date.with_day(1)
}

/// `start_date` is the first of next month plus `offset_days`; `end_date` is
/// the first of the month two months after the start month. The second
/// bimonthly payment starts 14 days later, or on the 15th when the start is
/// the 1st. `None` only at the edge of chrono's date range.
pub fn auto_payment_dates(today: NaiveDate, offset_days: u64) -> Option<AutoPaymentDates> {
    let start_date = first_of_month(today)?
        .checked_add_months(Months::new(1))?
        .checked_add_days(Days::new(offset_days))?;

    let end_date = first_of_month(start_date)?.checked_add_months(Months::new(2))?;

    let second_payment_start_date = if start_date.day() == 1 {
        start_date.with_day(SECOND_PAYMENT_DAY_WHEN_FIRST)?
    } else {
        start_date.checked_add_days(Days::new(SECOND_PAYMENT_GAP_DAYS))?
    };

    Some(AutoPaymentDates {
        start_date,
        end_date,
        second_payment_start_date,
    })
}
