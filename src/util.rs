//! Small data helpers for filling forms.

use chrono::{Months, NaiveDate};
use rand::Rng;

use crate::{Error, Result};

/// `size` random uppercase ASCII letters.
pub fn random_string(size: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..size)
        .map(|_| rng.gen_range(b'A'..=b'Z') as char)
        .collect()
}

/// A random integer in `start..=finish`.
pub fn random_integer(start: i64, finish: i64) -> Result<i64> {
    if start > finish {
        return Err(Error::InvalidArgument(format!(
            "random_integer: start {start} is greater than finish {finish}"
        )));
    }
    Ok(rand::thread_rng().gen_range(start..=finish))
}

/// `date` shifted by `months`, clamping the day to the target month's length
/// (Jan 31 + 1 month is Feb 28 or 29).
pub fn add_months(date: NaiveDate, months: i32) -> Result<NaiveDate> {
    let shift = Months::new(months.unsigned_abs());
    let shifted = if months >= 0 {
        date.checked_add_months(shift)
    } else {
        date.checked_sub_months(shift)
    };
    shifted.ok_or_else(|| {
        Error::InvalidArgument(format!("add_months: {date} shifted by {months} is out of range"))
    })
}
