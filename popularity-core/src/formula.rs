//! Time-decayed popularity.
//!
//! An item's popularity is its like count divided by a power of its age:
//!
//! ```text
//! popularity = likes / (elapsed_days + offset) ^ gravity
//! ```
//!
//! `offset` keeps the base away from zero for brand-new items and `gravity`
//! controls how steeply the score falls as the item ages.

use chrono::{DateTime, Utc};

use crate::Clock;

/// Milliseconds in one day.
pub const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Compute the time-decayed popularity score.
///
/// No range checks are applied. A zero base yields an infinite score and a
/// negative base raised to a fractional exponent yields NaN; both are
/// returned as-is.
///
/// # Examples
///
/// ```
/// use popularity_core::popularity;
///
/// let score = popularity(10.0, 1.0, 2.0, 1.5);
/// assert!((score - 1.9245).abs() < 1e-4);
/// ```
#[expect(
    clippy::float_arithmetic,
    reason = "the decay formula is floating-point by definition"
)]
#[must_use]
pub fn popularity(likes: f64, elapsed_days: f64, offset: f64, gravity: f64) -> f64 {
    likes / (elapsed_days + offset).powf(gravity)
}

/// Fractional days between `created` and `now`.
///
/// Millisecond resolution. Negative when `created` lies in the future.
#[expect(
    clippy::float_arithmetic,
    clippy::cast_precision_loss,
    reason = "elapsed time is reported as fractional days"
)]
#[must_use]
pub fn elapsed_days(created: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let millis = now.signed_duration_since(created).num_milliseconds();
    millis as f64 / MILLIS_PER_DAY
}

/// Fractional days between `created` and the clock's current instant.
#[must_use]
pub fn elapsed_days_since<C: Clock + ?Sized>(created: DateTime<Utc>, clock: &C) -> f64 {
    elapsed_days(created, clock.now())
}
