//! Tick scheduling aligned to wall-clock boundaries.
//!
//! Evaluations land on multiples of the refresh interval (:00/:15/:30/:45
//! for the 15-second floor) instead of drifting by process start time, so
//! meeting-start transitions happen close to real clock boundaries.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Delay from `now` until the next tick: the next wall-clock instant that
/// is a whole multiple of `interval_secs`. Always strictly positive; a
/// tick exactly on a boundary waits a full interval.
pub fn next_tick_delay(now: DateTime<Utc>, interval_secs: u64) -> Duration {
    let interval_ms = (interval_secs.max(1) * 1000) as i64;
    let now_ms = now.timestamp_millis();
    let next_ms = (now_ms.div_euclid(interval_ms) + 1) * interval_ms;
    Duration::from_millis((next_ms - now_ms) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(sec: u32, milli: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 4, 12, 17, sec).unwrap()
            + chrono::Duration::milliseconds(milli as i64)
    }

    #[test]
    fn test_fifteen_second_boundaries() {
        // Mirrors the boundary table: 0 -> :15, 7.5 -> :15, 14.9 -> :15,
        // 15 -> :30, 22.3 -> :30, 45 -> :00 of the next minute.
        assert_eq!(next_tick_delay(at(0, 0), 15), Duration::from_millis(15_000));
        assert_eq!(next_tick_delay(at(7, 500), 15), Duration::from_millis(7_500));
        assert_eq!(next_tick_delay(at(14, 900), 15), Duration::from_millis(100));
        assert_eq!(next_tick_delay(at(15, 0), 15), Duration::from_millis(15_000));
        assert_eq!(next_tick_delay(at(22, 300), 15), Duration::from_millis(7_700));
        assert_eq!(next_tick_delay(at(45, 0), 15), Duration::from_millis(15_000));
        assert_eq!(next_tick_delay(at(52, 700), 15), Duration::from_millis(7_300));
    }

    #[test]
    fn test_sixty_second_boundary_hits_top_of_minute() {
        let now = at(23, 456);
        let delay = next_tick_delay(now, 60);
        let next = now + chrono::Duration::from_std(delay).unwrap();

        assert_eq!(delay, Duration::from_millis(36_544));
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 7, 4, 12, 18, 0).unwrap());
    }

    #[test]
    fn test_sequence_stays_on_boundaries() {
        let mut now = at(23, 456);
        for _ in 0..8 {
            let delay = next_tick_delay(now, 15);
            assert!(delay > Duration::ZERO);
            assert!(delay <= Duration::from_secs(15));
            now += chrono::Duration::from_std(delay).unwrap();
            assert_eq!(now.timestamp_millis() % 15_000, 0);
        }
    }
}
