//! Provider-neutral calendar event snapshot.
//!
//! Providers convert their API responses into these types; the resolver
//! consumes them read-only for one polling cycle.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A timed calendar event (provider-neutral).
///
/// All-day entries are dropped at the provider boundary: they carry no
/// minute-level availability information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub summary: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Event {
    /// Whether `now` falls within `[start, end)`.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.start <= now && now < self.end
    }

    /// Whether this event starts within the next `lead` window.
    ///
    /// Strict about direction: an event that already started is never
    /// "imminent", so a just-ended meeting cannot re-resolve as imminent
    /// for itself.
    pub fn starts_within(&self, now: DateTime<Utc>, lead: Duration) -> bool {
        now < self.start && self.start - now <= lead
    }
}

/// The per-tick view of the calendar: events overlapping the fetch window,
/// sorted by start time.
#[derive(Debug, Clone, Default)]
pub struct EventWindow {
    events: Vec<Event>,
}

impl EventWindow {
    pub fn new(mut events: Vec<Event>) -> Self {
        events.sort_by_key(|e| e.start);
        EventWindow { events }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// All events active at `now`, in start order.
    pub fn active_at(&self, now: DateTime<Utc>) -> impl Iterator<Item = &Event> {
        self.events.iter().filter(move |e| e.is_active(now))
    }

    /// The next event strictly in the future, if any.
    pub fn next_after(&self, now: DateTime<Utc>) -> Option<&Event> {
        self.events.iter().find(|e| e.start > now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event(id: &str, start_min: i64, end_min: i64) -> Event {
        let base = Utc.with_ymd_and_hms(2025, 7, 4, 12, 0, 0).unwrap();
        Event {
            id: id.to_string(),
            summary: format!("Event {id}"),
            start: base + Duration::minutes(start_min),
            end: base + Duration::minutes(end_min),
        }
    }

    #[test]
    fn test_is_active_half_open_interval() {
        let e = event("a", 0, 30);
        let base = Utc.with_ymd_and_hms(2025, 7, 4, 12, 0, 0).unwrap();

        assert!(e.is_active(base));
        assert!(e.is_active(base + Duration::minutes(29)));
        // End is exclusive: the meeting is over at its end time.
        assert!(!e.is_active(base + Duration::minutes(30)));
        assert!(!e.is_active(base - Duration::seconds(1)));
    }

    #[test]
    fn test_starts_within_is_strictly_future() {
        let e = event("a", 1, 30);
        let base = Utc.with_ymd_and_hms(2025, 7, 4, 12, 0, 0).unwrap();

        assert!(e.starts_within(base, Duration::seconds(60)));
        assert!(!e.starts_within(base, Duration::seconds(59)));
        // An event that already started is not imminent.
        assert!(!e.starts_within(base + Duration::minutes(1), Duration::seconds(60)));
        assert!(!e.starts_within(base + Duration::minutes(2), Duration::seconds(60)));
    }

    #[test]
    fn test_window_sorts_and_finds_next() {
        let base = Utc.with_ymd_and_hms(2025, 7, 4, 12, 0, 0).unwrap();
        let window = EventWindow::new(vec![event("b", 40, 50), event("a", 10, 20)]);

        assert_eq!(window.events()[0].id, "a");
        assert_eq!(window.next_after(base).map(|e| e.id.as_str()), Some("a"));
        assert_eq!(
            window
                .next_after(base + Duration::minutes(15))
                .map(|e| e.id.as_str()),
            Some("b")
        );
        assert!(window.next_after(base + Duration::minutes(45)).is_none());
    }

    #[test]
    fn test_active_at_returns_start_order() {
        let base = Utc.with_ymd_and_hms(2025, 7, 4, 12, 0, 0).unwrap();
        let window = EventWindow::new(vec![event("later", 5, 60), event("earlier", 0, 30)]);

        let active: Vec<_> = window
            .active_at(base + Duration::minutes(10))
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(active, vec!["earlier", "later"]);
    }
}
