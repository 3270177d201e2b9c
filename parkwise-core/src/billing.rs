use chrono::{DateTime, SubsecRound, Utc};

use crate::{CoreError, CoreResult};

/// Current time at whole-second resolution. Booking timestamps are always
/// stored at this resolution so costs are reproducible from stored rows.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

/// Fractional hours between `start` and `end`.
pub fn booking_hours(start: DateTime<Utc>, end: DateTime<Utc>) -> CoreResult<f64> {
    if end < start {
        return Err(CoreError::ValidationError(format!(
            "booking end {} is before its start {}",
            end, start
        )));
    }
    Ok((end - start).num_seconds() as f64 / 3600.0)
}

/// Cost of a stay: hours × hourly price, rounded to two decimals.
pub fn compute_cost(start: DateTime<Utc>, end: DateTime<Utc>, price_per_hour: f64) -> CoreResult<f64> {
    if !price_per_hour.is_finite() || price_per_hour < 0.0 {
        return Err(CoreError::ValidationError(format!(
            "invalid hourly price {}",
            price_per_hour
        )));
    }
    let hours = booking_hours(start, end)?;
    Ok(round_currency(hours * price_per_hour))
}

pub fn round_currency(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
