//! Property-based tests for the review scheduler.
//!
//! Invariants covered:
//! - correct answers advance the stage by one, clamped at the top
//! - the due offset for a correct answer comes from the pre-increment stage
//! - wrong answers step back by one, clamped at zero, with a fixed retry window
//! - the scheduler is total over non-negative stages and rejects negatives

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

use blinkvocab_backend::srs::{
    compute_next, SrsError, MAX_STAGE, SRS_INTERVALS_MINUTES, WRONG_RETRY_MINUTES,
};

fn arb_now() -> impl Strategy<Value = DateTime<Utc>> {
    // Seconds across a few decades, well inside chrono's representable range.
    (0i64..=2_000_000_000i64).prop_map(|secs| Utc.timestamp_opt(secs, 0).unwrap())
}

proptest! {
    #[test]
    fn correct_advances_one_stage_clamped(stage in 0i32..=MAX_STAGE, now in arb_now()) {
        let outcome = compute_next(stage, true, now).unwrap();
        prop_assert_eq!(outcome.new_stage, (stage + 1).min(MAX_STAGE));
    }

    #[test]
    fn correct_due_offset_uses_pre_increment_stage(stage in 0i32..=MAX_STAGE, now in arb_now()) {
        let outcome = compute_next(stage, true, now).unwrap();
        let expected = Duration::minutes(SRS_INTERVALS_MINUTES[stage as usize]);
        prop_assert_eq!(outcome.next_due_at - now, expected);
    }

    #[test]
    fn wrong_steps_back_with_fixed_retry(stage in 0i32..=MAX_STAGE, now in arb_now()) {
        let outcome = compute_next(stage, false, now).unwrap();
        prop_assert_eq!(outcome.new_stage, (stage - 1).max(0));
        prop_assert_eq!(outcome.next_due_at - now, Duration::minutes(WRONG_RETRY_MINUTES));
    }

    #[test]
    fn stage_stays_in_bounds(stage in 0i32..=1000, correct: bool, now in arb_now()) {
        let outcome = compute_next(stage, correct, now).unwrap();
        prop_assert!(outcome.new_stage >= 0);
        prop_assert!(outcome.new_stage <= MAX_STAGE);
        prop_assert!(outcome.next_due_at > now);
    }

    #[test]
    fn negative_stage_is_rejected(stage in i32::MIN..0, correct: bool, now in arb_now()) {
        prop_assert_eq!(
            compute_next(stage, correct, now).unwrap_err(),
            SrsError::InvalidStage(stage)
        );
    }
}
