//! Dashboard aggregation. Pure functions over rows the db layer already
//! fetched, so every bucketing rule is unit-testable without a database.

use chrono::{DateTime, Duration, NaiveDate, SecondsFormat, TimeZone, Utc};
use serde::Serialize;

use crate::db::operations::dashboard::DueCandidate;

pub const ACTIVITY_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub total: i64,
    pub new: i64,
    pub learning: i64,
    pub review: i64,
    pub mastered: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DueCounts {
    pub due_today: i64,
    pub overdue: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityDay {
    pub date: String,
    pub events: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub last7_days: Vec<ActivityDay>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardOverview {
    pub totals: Totals,
    pub due: DueCounts,
    pub activity: Activity,
}

/// Sum status buckets. `ignored` records count toward `total` but get no
/// named bucket, so the named buckets may sum to less than `total`.
pub fn build_totals(status_counts: &[(String, i64)]) -> Totals {
    let mut totals = Totals::default();
    for (status, count) in status_counts {
        totals.total += count;
        match status.as_str() {
            "new" => totals.new = *count,
            "learning" => totals.learning = *count,
            "review" => totals.review = *count,
            "mastered" => totals.mastered = *count,
            _ => {}
        }
    }
    totals
}

/// Split schedulable records into overdue (`next_due_at <= now`) and
/// due-today (`now < next_due_at <= next UTC midnight`). A record lands in at
/// most one bucket; mastered/ignored records and records without a timer are
/// skipped.
pub fn split_due_buckets(now: DateTime<Utc>, candidates: &[DueCandidate]) -> DueCounts {
    let today_end = utc_midnight(now.date_naive()) + Duration::days(1);

    let mut counts = DueCounts::default();
    for candidate in candidates {
        if candidate.status == "mastered" || candidate.status == "ignored" {
            continue;
        }
        let Some(due_at) = candidate.next_due_at else {
            continue;
        };

        if due_at <= now {
            counts.overdue += 1;
        } else if due_at <= today_end {
            counts.due_today += 1;
        }
    }
    counts
}

/// Exactly one entry per UTC calendar day for the trailing week including
/// today, oldest first. Days absent from `day_counts` appear with zero events.
pub fn build_activity(now: DateTime<Utc>, day_counts: &[(NaiveDate, i64)]) -> Vec<ActivityDay> {
    let today = now.date_naive();

    (0..ACTIVITY_WINDOW_DAYS)
        .rev()
        .map(|offset| {
            let day = today - Duration::days(offset);
            let events = day_counts
                .iter()
                .find(|(d, _)| *d == day)
                .map(|(_, count)| *count)
                .unwrap_or(0);
            ActivityDay {
                date: utc_midnight(day).to_rfc3339_opts(SecondsFormat::Millis, true),
                events,
            }
        })
        .collect()
}

fn utc_midnight(day: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&day.and_time(chrono::NaiveTime::MIN))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 10, 15, 30, 0).unwrap()
    }

    fn candidate(status: &str, due: Option<DateTime<Utc>>) -> DueCandidate {
        DueCandidate {
            status: status.to_string(),
            next_due_at: due,
        }
    }

    #[test]
    fn totals_include_ignored_in_total_only() {
        let counts = vec![
            ("new".to_string(), 3),
            ("learning".to_string(), 2),
            ("mastered".to_string(), 1),
            ("ignored".to_string(), 4),
        ];
        let totals = build_totals(&counts);
        assert_eq!(
            totals,
            Totals {
                total: 10,
                new: 3,
                learning: 2,
                review: 0,
                mastered: 1,
            }
        );
    }

    #[test]
    fn totals_match_dashboard_example() {
        let counts = vec![
            ("new".to_string(), 3),
            ("learning".to_string(), 2),
            ("mastered".to_string(), 1),
        ];
        let totals = build_totals(&counts);
        assert_eq!(totals.total, 6);
        assert_eq!(totals.new, 3);
        assert_eq!(totals.learning, 2);
        assert_eq!(totals.review, 0);
        assert_eq!(totals.mastered, 1);
    }

    #[test]
    fn due_buckets_are_disjoint() {
        let now = now();
        let candidates = vec![
            // overdue
            candidate("learning", Some(now - Duration::hours(1))),
            // boundary: exactly now counts as overdue
            candidate("review", Some(now)),
            // later today
            candidate("learning", Some(now + Duration::hours(2))),
            // tomorrow: neither bucket
            candidate("learning", Some(now + Duration::days(2))),
            // excluded statuses
            candidate("mastered", Some(now - Duration::hours(1))),
            candidate("ignored", Some(now - Duration::hours(1))),
            // no timer
            candidate("new", None),
        ];

        let counts = split_due_buckets(now, &candidates);
        assert_eq!(counts.overdue, 2);
        assert_eq!(counts.due_today, 1);
    }

    #[test]
    fn due_today_respects_utc_midnight_boundary() {
        let now = now();
        let end_of_day = Utc.with_ymd_and_hms(2025, 6, 11, 0, 0, 0).unwrap();
        let candidates = vec![
            candidate("learning", Some(end_of_day)),
            candidate("learning", Some(end_of_day + Duration::seconds(1))),
        ];

        let counts = split_due_buckets(now, &candidates);
        assert_eq!(counts.due_today, 1);
        assert_eq!(counts.overdue, 0);
    }

    #[test]
    fn activity_always_has_seven_days_oldest_first() {
        let days = build_activity(now(), &[]);
        assert_eq!(days.len(), 7);
        assert_eq!(days[0].date, "2025-06-04T00:00:00.000Z");
        assert_eq!(days[6].date, "2025-06-10T00:00:00.000Z");
        assert!(days.iter().all(|d| d.events == 0));
    }

    #[test]
    fn activity_places_counts_on_their_day() {
        let counts = vec![
            (NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(), 5),
            (NaiveDate::from_ymd_opt(2025, 6, 7).unwrap(), 2),
            // outside the window, ignored
            (NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(), 9),
        ];
        let days = build_activity(now(), &counts);
        assert_eq!(days.len(), 7);
        assert_eq!(days[6].events, 5);
        assert_eq!(days[3].events, 2);
        assert_eq!(days[0].events, 0);
    }
}
