//! Property-based tests for the decay formula.
//!
//! # Invariants tested
//!
//! - **Closed form:** the score equals `likes / (days + offset)^gravity`.
//! - **Monotone decay:** with a positive offset and non-negative gravity the
//!   score never rises as an item ages.
//! - **Clock monotonicity:** elapsed days grow as the clock advances.

use chrono::{Duration, TimeZone, Utc};
use popularity_core::{elapsed_days, popularity};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn matches_closed_form(
        likes in 0.0_f64..10_000.0,
        days in 0.0_f64..3_650.0,
        offset in 0.01_f64..48.0,
        gravity in -3.0_f64..3.0,
    ) {
        let expected = likes / (days + offset).powf(gravity);
        let score = popularity(likes, days, offset, gravity);
        prop_assert!((score - expected).abs() <= expected.abs() * 1e-12);
    }

    #[test]
    fn never_increases_with_age(
        likes in 0.0_f64..10_000.0,
        days in 0.0_f64..3_650.0,
        extra in 0.0_f64..365.0,
        offset in 0.01_f64..48.0,
        gravity in 0.0_f64..3.0,
    ) {
        let younger = popularity(likes, days, offset, gravity);
        let older = popularity(likes, days + extra, offset, gravity);
        prop_assert!(older <= younger, "older {older} > younger {younger}");
    }

    #[test]
    fn elapsed_days_grow_with_the_clock(
        age_ms in 0_i64..10_000_000_000,
        step_ms in 1_i64..100_000_000,
    ) {
        let created = Utc
            .timestamp_millis_opt(1_600_000_000_000)
            .single()
            .unwrap_or_else(|| panic!("valid instant"));
        let earlier = created + Duration::milliseconds(age_ms);
        let later = earlier + Duration::milliseconds(step_ms);
        prop_assert!(elapsed_days(created, later) > elapsed_days(created, earlier));
    }
}
