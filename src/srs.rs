use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

/// Review intervals in minutes, indexed by stage. A correct answer at stage
/// `s` schedules the next review `SRS_INTERVALS_MINUTES[s]` minutes out, then
/// advances the stage.
pub const SRS_INTERVALS_MINUTES: [i64; 6] = [10, 1440, 4320, 10080, 21600, 43200];

pub const MAX_STAGE: i32 = (SRS_INTERVALS_MINUTES.len() - 1) as i32;

/// Retry window after a wrong answer, regardless of stage.
pub const WRONG_RETRY_MINUTES: i64 = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SrsError {
    #[error("invalid stage: {0}")]
    InvalidStage(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewOutcome {
    pub new_stage: i32,
    pub next_due_at: DateTime<Utc>,
}

/// Compute the next stage and due time for a review answer.
///
/// Correct answers advance the stage (clamped at [`MAX_STAGE`]) and look the
/// interval up with the pre-increment stage. Wrong answers step the stage back
/// (clamped at 0) and always retry in [`WRONG_RETRY_MINUTES`].
///
/// A negative stage is a caller contract violation and is rejected rather
/// than clamped.
pub fn compute_next(
    stage: i32,
    correct: bool,
    now: DateTime<Utc>,
) -> Result<ReviewOutcome, SrsError> {
    if stage < 0 {
        return Err(SrsError::InvalidStage(stage));
    }

    if correct {
        let lookup = stage.min(MAX_STAGE) as usize;
        Ok(ReviewOutcome {
            new_stage: (stage + 1).min(MAX_STAGE),
            next_due_at: now + Duration::minutes(SRS_INTERVALS_MINUTES[lookup]),
        })
    } else {
        Ok(ReviewOutcome {
            new_stage: (stage - 1).max(0),
            next_due_at: now + Duration::minutes(WRONG_RETRY_MINUTES),
        })
    }
}

/// Status promotion applied alongside a review update. The scheduler itself
/// never touches status; the review transaction calls this with the record's
/// current status and the computed outcome.
pub fn promote_status(current_status: &str, new_stage: i32, correct: bool) -> Option<&'static str> {
    if !correct {
        return None;
    }
    if current_status == "new" {
        return Some("learning");
    }
    if new_stage >= 2 {
        return Some("review");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn correct_advances_stage_with_pre_increment_interval() {
        let now = t0();
        for stage in 0..=MAX_STAGE {
            let outcome = compute_next(stage, true, now).unwrap();
            assert_eq!(outcome.new_stage, (stage + 1).min(MAX_STAGE));
            let expected = now + Duration::minutes(SRS_INTERVALS_MINUTES[stage as usize]);
            assert_eq!(outcome.next_due_at, expected);
        }
    }

    #[test]
    fn wrong_steps_back_and_retries_in_ten_minutes() {
        let now = t0();
        for stage in 0..=MAX_STAGE {
            let outcome = compute_next(stage, false, now).unwrap();
            assert_eq!(outcome.new_stage, (stage - 1).max(0));
            assert_eq!(outcome.next_due_at, now + Duration::minutes(10));
        }
    }

    #[test]
    fn stage_zero_examples() {
        let now = t0();
        let correct = compute_next(0, true, now).unwrap();
        assert_eq!(correct.new_stage, 1);
        assert_eq!(correct.next_due_at, now + Duration::minutes(10));

        let wrong = compute_next(0, false, now).unwrap();
        assert_eq!(wrong.new_stage, 0);
        assert_eq!(wrong.next_due_at, now + Duration::minutes(10));
    }

    #[test]
    fn max_stage_clamps() {
        let now = t0();
        let outcome = compute_next(MAX_STAGE, true, now).unwrap();
        assert_eq!(outcome.new_stage, MAX_STAGE);
        assert_eq!(
            outcome.next_due_at,
            now + Duration::minutes(SRS_INTERVALS_MINUTES[MAX_STAGE as usize])
        );

        // Past-bounds input stays clamped rather than indexing out of range.
        let beyond = compute_next(MAX_STAGE + 3, true, now).unwrap();
        assert_eq!(beyond.new_stage, MAX_STAGE);
        assert_eq!(beyond.next_due_at, outcome.next_due_at);
    }

    #[test]
    fn negative_stage_is_rejected() {
        assert_eq!(
            compute_next(-1, true, t0()).unwrap_err(),
            SrsError::InvalidStage(-1)
        );
        assert_eq!(
            compute_next(-7, false, t0()).unwrap_err(),
            SrsError::InvalidStage(-7)
        );
    }

    #[test]
    fn status_promotions() {
        assert_eq!(promote_status("new", 1, true), Some("learning"));
        assert_eq!(promote_status("learning", 2, true), Some("review"));
        assert_eq!(promote_status("learning", 1, true), None);
        assert_eq!(promote_status("review", 5, true), Some("review"));
        assert_eq!(promote_status("new", 0, false), None);
        assert_eq!(promote_status("learning", 0, false), None);
    }
}
