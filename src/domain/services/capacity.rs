use crate::domain::models::{
    capacity::{CapacityCounts, CapacityInfo},
    session::EventSession,
};

/// Free slots left, clamped at zero. `None` for unlimited sessions.
pub fn available_spots(max_attendees: Option<i32>, registered: i64) -> Option<i64> {
    max_attendees.map(|max| (i64::from(max) - registered).max(0))
}

/// Percentage of capacity in use, rounded to one decimal. Unlimited sessions report 0.
pub fn utilization_rate(max_attendees: Option<i32>, registered: i64) -> f64 {
    match max_attendees {
        Some(max) if max > 0 => {
            let rate = registered as f64 / f64::from(max) * 100.0;
            (rate * 10.0).round() / 10.0
        }
        _ => 0.0,
    }
}

pub fn capacity_info(session: &EventSession, counts: CapacityCounts) -> CapacityInfo {
    let available = available_spots(session.max_attendees, counts.registered);
    CapacityInfo {
        session_id: session.id.clone(),
        title: session.title.clone(),
        max_attendees: session.max_attendees,
        allow_waitlist: session.allow_waitlist,
        registered_count: counts.registered,
        checked_in_count: counts.checked_in,
        waitlist_count: counts.waitlisted,
        available_spots: available,
        utilization_rate: utilization_rate(session.max_attendees, counts.registered),
        is_full: available == Some(0),
        is_overbooked: session
            .max_attendees
            .is_some_and(|max| counts.registered > i64::from(max)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::session::NewSessionParams;
    use chrono::{Duration, Utc};

    fn session(max_attendees: Option<i32>) -> EventSession {
        let start = Utc::now() + Duration::days(1);
        EventSession::new(NewSessionParams {
            event_id: "ev-1".into(),
            title: "Keynote".into(),
            description: None,
            start,
            end: start + Duration::hours(1),
            location: None,
            max_attendees,
            allow_waitlist: true,
        })
    }

    #[test]
    fn test_available_spots_clamps_at_zero() {
        assert_eq!(available_spots(Some(10), 3), Some(7));
        assert_eq!(available_spots(Some(2), 2), Some(0));
        assert_eq!(available_spots(Some(2), 5), Some(0));
        assert_eq!(available_spots(None, 500), None);
    }

    #[test]
    fn test_utilization_rate_rounds_to_one_decimal() {
        assert_eq!(utilization_rate(Some(3), 1), 33.3);
        assert_eq!(utilization_rate(Some(4), 4), 100.0);
        assert_eq!(utilization_rate(None, 42), 0.0);
    }

    #[test]
    fn test_capacity_info_flags_overbooked_sessions() {
        let s = session(Some(2));
        let info = capacity_info(&s, CapacityCounts { registered: 3, checked_in: 1, waitlisted: 4 });

        assert_eq!(info.available_spots, Some(0));
        assert!(info.is_full);
        assert!(info.is_overbooked);
        assert_eq!(info.utilization_rate, 150.0);
        assert_eq!(info.waitlist_count, 4);
        assert_eq!(info.checked_in_count, 1);
    }

    #[test]
    fn test_unlimited_session_is_never_full() {
        let s = session(None);
        let info = capacity_info(&s, CapacityCounts { registered: 1000, checked_in: 0, waitlisted: 0 });

        assert_eq!(info.available_spots, None);
        assert!(!info.is_full);
        assert!(!info.is_overbooked);
    }
}
