pub mod db;
pub mod sched;

use jiff::civil::{Date, Weekday};

/// NSE publishes the bhavcopy on weekdays only.
pub fn is_weekend(date: &Date) -> bool {
    matches!(date.weekday(), Weekday::Saturday | Weekday::Sunday)
}

#[test]
fn test_is_weekend() {
    assert!(is_weekend(&jiff::civil::date(2022, 12, 3)));
    assert!(!is_weekend(&jiff::civil::date(2022, 12, 5)));
}
