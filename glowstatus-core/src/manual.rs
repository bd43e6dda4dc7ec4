//! Manual override state.
//!
//! The one piece of cross-tick mutable state the resolver consults. Owned by
//! the evaluator; control-surface writes all funnel through it.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::TAG_MEETING_ENDED_EARLY;

/// A manually pinned status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualOverride {
    pub tag: String,
    /// When the override was set. `None` is malformed legacy state (a
    /// timestamp-less override once pinned users into manual mode forever)
    /// and is treated as already expired.
    pub set_at: Option<DateTime<Utc>>,
}

impl ManualOverride {
    pub fn new(tag: &str, now: DateTime<Utc>) -> Self {
        ManualOverride {
            tag: tag.to_string(),
            set_at: Some(now),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>, expiry: Duration) -> bool {
        match self.set_at {
            Some(set_at) => now - set_at > expiry,
            None => true,
        }
    }

    /// Whether this override marks a meeting the user ended before its
    /// calendar end time. Gets special treatment around imminent meetings.
    pub fn is_meeting_ended_early(&self) -> bool {
        self.tag == TAG_MEETING_ENDED_EARLY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_expiry_window() {
        let now = Utc.with_ymd_and_hms(2025, 7, 4, 12, 0, 0).unwrap();
        let expiry = Duration::hours(2);

        let recent = ManualOverride::new("lunch", now - Duration::minutes(30));
        assert!(!recent.is_expired(now, expiry));

        let old = ManualOverride::new("lunch", now - Duration::hours(3));
        assert!(old.is_expired(now, expiry));
    }

    #[test]
    fn test_missing_timestamp_is_expired() {
        let now = Utc.with_ymd_and_hms(2025, 7, 4, 12, 0, 0).unwrap();
        let stuck = ManualOverride {
            tag: "in_meeting".to_string(),
            set_at: None,
        };
        assert!(stuck.is_expired(now, Duration::hours(2)));
    }
}
