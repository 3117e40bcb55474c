//! The overdue rule: flag in-progress processes past the threshold.
//!
//! Only `ANDAMENTO` processes can be overdue — closed, granted, denied,
//! suspended, or otherwise settled processes are never flagged no matter how
//! old they are. The threshold is configuration (default 30 days), and the
//! reference date is pinned once per run so every record in a document is
//! judged against the same "today".

use crate::output::Status;
use chrono::NaiveDate;

/// Apply the overdue rule to one record's status and opening date.
///
/// Returns `(is_overdue, computed_overdue_days)`:
/// * overdue iff the status is `ANDAMENTO` and the opening date lies
///   *strictly more* than `threshold_days` before `today`;
/// * `computed_overdue_days` is the excess beyond the threshold when
///   overdue, otherwise 0. Never negative.
///
/// A record without an opening date cannot be evaluated and is never
/// flagged.
pub fn evaluate(
    status: Status,
    opening_date: Option<NaiveDate>,
    today: NaiveDate,
    threshold_days: i64,
) -> (bool, i64) {
    if status != Status::Andamento {
        return (false, 0);
    }
    let Some(opened) = opening_date else {
        return (false, 0);
    };

    let days_since_opening = (today - opened).num_days();
    if days_since_opening > threshold_days {
        (true, days_since_opening - threshold_days)
    } else {
        (false, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    #[test]
    fn andamento_past_threshold_is_overdue() {
        let opened = today() - Duration::days(45);
        assert_eq!(evaluate(Status::Andamento, Some(opened), today(), 30), (true, 15));
    }

    #[test]
    fn settled_statuses_are_never_overdue() {
        let opened = today() - Duration::days(45);
        for status in [
            Status::Encerramento,
            Status::Deferido,
            Status::Indeferido,
            Status::Suspenso,
            Status::Cancelado,
            Status::Desconhecido,
        ] {
            assert_eq!(evaluate(status, Some(opened), today(), 30), (false, 0));
        }
    }

    #[test]
    fn exactly_at_threshold_is_not_overdue() {
        // Strictly greater than the threshold, not greater-or-equal.
        let opened = today() - Duration::days(30);
        assert_eq!(evaluate(Status::Andamento, Some(opened), today(), 30), (false, 0));
    }

    #[test]
    fn one_day_past_threshold_computes_one() {
        let opened = today() - Duration::days(31);
        assert_eq!(evaluate(Status::Andamento, Some(opened), today(), 30), (true, 1));
    }

    #[test]
    fn missing_opening_date_is_never_overdue() {
        assert_eq!(evaluate(Status::Andamento, None, today(), 30), (false, 0));
    }

    #[test]
    fn future_opening_date_is_not_overdue() {
        let opened = today() + Duration::days(10);
        assert_eq!(evaluate(Status::Andamento, Some(opened), today(), 30), (false, 0));
    }

    #[test]
    fn zero_threshold_flags_any_aged_record() {
        let opened = today() - Duration::days(1);
        assert_eq!(evaluate(Status::Andamento, Some(opened), today(), 0), (true, 1));
    }
}
