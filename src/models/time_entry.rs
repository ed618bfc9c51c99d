use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TimeEntry {
    pub id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub is_running: bool,
    pub user_id: Uuid,
    pub project_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TimeEntry {
    /// Elapsed time of the entry, or `None` while it is still running.
    /// Derived on every read; never persisted.
    pub fn duration(&self) -> Option<Duration> {
        self.end_time.map(|end| end - self.start_time)
    }

    /// Duration expressed as fractional hours, only when strictly positive.
    /// Zero or negative spans (clock skew at the boundary) yield `None`.
    pub fn duration_hours(&self) -> Option<Decimal> {
        let duration = self.duration()?;
        let millis = duration.num_milliseconds();
        if millis <= 0 {
            return None;
        }
        Some(Decimal::new(millis, 3) / Decimal::from(3600))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> TimeEntry {
        TimeEntry {
            id: Uuid::new_v4(),
            start_time: start,
            end_time: end,
            description: None,
            is_running: end.is_none(),
            user_id: Uuid::new_v4(),
            project_id: None,
            created_at: start,
            updated_at: start,
        }
    }

    #[test]
    fn duration_is_none_while_running() {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let e = entry(start, None);
        assert!(e.duration().is_none());
        assert!(e.duration_hours().is_none());
    }

    #[test]
    fn duration_is_exactly_end_minus_start() {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 3, 1, 10, 30, 0).unwrap();
        let e = entry(start, Some(end));
        assert_eq!(e.duration(), Some(Duration::minutes(90)));
    }

    #[test]
    fn ninety_minutes_is_one_and_a_half_hours() {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let end = start + Duration::seconds(5400);
        let e = entry(start, Some(end));
        assert_eq!(e.duration_hours(), Some(Decimal::new(15, 1)));
    }

    #[test]
    fn zero_duration_has_no_hours() {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let e = entry(start, Some(start));
        assert_eq!(e.duration(), Some(Duration::zero()));
        assert!(e.duration_hours().is_none());
    }

    #[test]
    fn negative_duration_has_no_hours() {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let end = start - Duration::minutes(5);
        let e = entry(start, Some(end));
        assert_eq!(e.duration(), Some(Duration::minutes(-5)));
        assert!(e.duration_hours().is_none());
    }
}
