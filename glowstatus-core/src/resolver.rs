//! Status resolution and meeting-transition engine.
//!
//! Reconciles the tick's event snapshot, the manual override, and timing
//! windows into one authoritative [`ResolvedStatus`], and tells the caller
//! when the override must be dropped in favor of calendar authority.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::constants::{TAG_AVAILABLE, TAG_IN_MEETING, TAG_UNKNOWN};
use crate::event::{Event, EventWindow};
use crate::manual::ManualOverride;
use crate::matcher::match_status;
use crate::status::{ResolvedStatus, StatusRule, StatusRules, StatusSource};

/// Tunables for one resolution pass, derived from configuration.
#[derive(Debug, Clone)]
pub struct ResolvePolicy {
    pub lead_window: Duration,
    pub override_expiry: Duration,
    pub power_off_when_available: bool,
    pub off_for_unknown_status: bool,
}

impl Default for ResolvePolicy {
    fn default() -> Self {
        ResolvePolicy {
            lead_window: Duration::seconds(crate::constants::DEFAULT_LEAD_WINDOW_SECS as i64),
            override_expiry: Duration::seconds(
                crate::constants::DEFAULT_OVERRIDE_EXPIRY_SECS as i64,
            ),
            power_off_when_available: false,
            off_for_unknown_status: false,
        }
    }
}

/// Selection among overlapping active meetings.
///
/// First-start-wins is the shipped behavior; letting the user pick among
/// overlapping meetings plugs in here.
pub trait MeetingPicker {
    fn pick<'a>(&self, candidates: &[&'a Event]) -> Option<&'a Event>;
}

/// Default picker: the earliest-starting active meeting is authoritative.
pub struct FirstStartWins;

impl MeetingPicker for FirstStartWins {
    fn pick<'a>(&self, candidates: &[&'a Event]) -> Option<&'a Event> {
        candidates.iter().min_by_key(|e| e.start).copied()
    }
}

/// The outcome of one resolution pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub status: ResolvedStatus,
    /// The stored override must be dropped: calendar authority resumed, or
    /// the override expired.
    pub clear_override: bool,
}

/// Resolve the authoritative status for one tick.
///
/// Priority order: active matched meeting, then the meeting-ended-early /
/// imminent-meeting transition, then any other manual override, then
/// imminent-meeting pre-activation, then the default policy.
pub fn resolve(
    now: DateTime<Utc>,
    window: &EventWindow,
    manual: Option<&ManualOverride>,
    rules: &StatusRules,
    policy: &ResolvePolicy,
    picker: &dyn MeetingPicker,
) -> Resolution {
    // An expired override is dropped before anything else looks at it.
    let mut expired_cleared = false;
    let manual = match manual {
        Some(m) if m.is_expired(now, policy.override_expiry) => {
            debug!(tag = %m.tag, "manual override expired");
            expired_cleared = true;
            None
        }
        other => other,
    };

    // Rule 1: an active, keyword-matched meeting always wins and clears any
    // override, even meeting_ended_early. Once a meeting has actually
    // started the light must not stay off.
    let active: Vec<&Event> = window.active_at(now).collect();
    let matched_active: Vec<(&Event, &StatusRule)> = active
        .iter()
        .filter_map(|e| match_status(&e.summary, rules).map(|rule| (*e, rule)))
        .collect();
    let candidates: Vec<&Event> = matched_active.iter().map(|(e, _)| *e).collect();
    if let Some(event) = picker.pick(&candidates)
        && let Some((_, rule)) = matched_active.iter().find(|(e, _)| e.id == event.id)
    {
        return Resolution {
            status: from_rule(rule, StatusSource::Calendar),
            clear_override: manual.is_some() || expired_cleared,
        };
    }

    let next = window.next_after(now);
    let imminent = next
        .filter(|e| e.starts_within(now, policy.lead_window))
        .map(|e| imminent_status(e, rules));

    if let Some(manual) = manual {
        if manual.is_meeting_ended_early() {
            // Rule 2: ended early, but the next meeting is about to start.
            // Pre-activate it and hand authority back to the calendar.
            if let Some(status) = imminent {
                debug!(next = %status.tag, "imminent meeting supersedes meeting_ended_early");
                return Resolution {
                    status,
                    clear_override: true,
                };
            }
        }
        // Rules 2 (gap case) and 3: the override holds.
        return Resolution {
            status: manual_status(manual, rules),
            clear_override: false,
        };
    }

    // Rule 4: imminent-meeting pre-activation without any override.
    if let Some(status) = imminent {
        return Resolution {
            status,
            clear_override: expired_cleared,
        };
    }

    // Rule 5: default policy. An active event that matched nothing resolves
    // to the unknown tag rather than pretending the user is free.
    let status = if !active.is_empty() {
        ResolvedStatus {
            tag: TAG_UNKNOWN.to_string(),
            source: StatusSource::Calendar,
            color: None,
            power_off: policy.off_for_unknown_status,
        }
    } else {
        available_status(rules, policy)
    };

    Resolution {
        status,
        clear_override: expired_cleared,
    }
}

fn from_rule(rule: &StatusRule, source: StatusSource) -> ResolvedStatus {
    ResolvedStatus {
        tag: rule.keyword.clone(),
        source,
        color: Some(rule.color),
        power_off: rule.power_off,
    }
}

/// Status a not-yet-started meeting pre-activates. Unmatched titles fall
/// back to the in_meeting rule so the light still warns the user.
fn imminent_status(event: &Event, rules: &StatusRules) -> ResolvedStatus {
    if let Some(rule) = match_status(&event.summary, rules) {
        return from_rule(rule, StatusSource::Calendar);
    }
    match rules.by_tag(TAG_IN_MEETING) {
        Some(rule) => from_rule(rule, StatusSource::Calendar),
        None => ResolvedStatus {
            tag: TAG_IN_MEETING.to_string(),
            source: StatusSource::Calendar,
            color: None,
            power_off: false,
        },
    }
}

fn manual_status(manual: &ManualOverride, rules: &StatusRules) -> ResolvedStatus {
    match rules.by_tag(&manual.tag) {
        Some(rule) => ResolvedStatus {
            tag: rule.keyword.clone(),
            source: StatusSource::Manual,
            color: Some(rule.color),
            power_off: rule.power_off,
        },
        None => ResolvedStatus {
            tag: manual.tag.clone(),
            source: StatusSource::Manual,
            color: None,
            power_off: false,
        },
    }
}

fn available_status(rules: &StatusRules, policy: &ResolvePolicy) -> ResolvedStatus {
    let rule = rules.by_tag(TAG_AVAILABLE);
    ResolvedStatus {
        tag: TAG_AVAILABLE.to_string(),
        source: StatusSource::Default,
        color: rule.map(|r| r.color),
        power_off: policy.power_off_when_available || rule.is_some_and(|r| r.power_off),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::TAG_MEETING_ENDED_EARLY;
    use crate::status::{BLUE, GREEN, LightCommand, RED, Rgb, StatusRule};
    use chrono::TimeZone;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 4, 12, 0, 0).unwrap()
    }

    fn event(id: &str, summary: &str, start_secs: i64, end_secs: i64) -> Event {
        Event {
            id: id.to_string(),
            summary: summary.to_string(),
            start: base() + Duration::seconds(start_secs),
            end: base() + Duration::seconds(end_secs),
        }
    }

    fn resolve_now(
        window: &EventWindow,
        manual: Option<&ManualOverride>,
        rules: &StatusRules,
        policy: &ResolvePolicy,
    ) -> Resolution {
        resolve(base(), window, manual, rules, policy, &FirstStartWins)
    }

    #[test]
    fn test_scenario_a_active_event_clears_override() {
        // Rules [{keyword:"focus", color: blue}], "Deep Focus Block" active
        // now: resolves to blue and any override is cleared.
        let rules = StatusRules::new(vec![StatusRule::new("focus", BLUE, false)]);
        let window = EventWindow::new(vec![event("e1", "Deep Focus Block", -600, 600)]);
        let manual = ManualOverride::new(TAG_MEETING_ENDED_EARLY, base() - Duration::minutes(5));

        let resolution = resolve_now(&window, Some(&manual), &rules, &ResolvePolicy::default());

        assert_eq!(resolution.status.tag, "focus");
        assert_eq!(resolution.status.source, StatusSource::Calendar);
        assert_eq!(resolution.status.color, Some(BLUE));
        assert!(resolution.clear_override);
    }

    #[test]
    fn test_scenario_b_imminent_meeting_preactivates() {
        // No active event, "Standup" starts in 30s, lead window 60s.
        let rules = StatusRules::new(vec![StatusRule::new("standup", RED, false)]);
        let window = EventWindow::new(vec![event("e1", "Standup", 30, 1800)]);

        let resolution = resolve_now(&window, None, &rules, &ResolvePolicy::default());

        assert_eq!(resolution.status.tag, "standup");
        assert_eq!(resolution.status.source, StatusSource::Calendar);
        assert!(!resolution.clear_override);
    }

    #[test]
    fn test_scenario_c_override_retained_across_long_gap() {
        // Override "lunch" (power off), next event in 10 minutes, lead 60s:
        // lunch holds and the override survives.
        let rules = StatusRules::new(vec![
            StatusRule::new("meeting", RED, false),
            StatusRule::new("lunch", GREEN, true),
        ]);
        let window = EventWindow::new(vec![event("e1", "Team meeting", 600, 2400)]);
        let manual = ManualOverride::new("lunch", base() - Duration::minutes(10));

        let resolution = resolve_now(&window, Some(&manual), &rules, &ResolvePolicy::default());

        assert_eq!(resolution.status.tag, "lunch");
        assert_eq!(resolution.status.source, StatusSource::Manual);
        assert!(resolution.status.power_off);
        assert!(!resolution.clear_override);
    }

    #[test]
    fn test_scenario_e_overlapping_events_first_start_wins() {
        let rules = StatusRules::new(vec![
            StatusRule::new("focus", BLUE, false),
            StatusRule::new("meeting", RED, false),
        ]);
        // X started before Y; both active now.
        let window = EventWindow::new(vec![
            event("y", "Team meeting", -300, 1800),
            event("x", "Focus block", -900, 900),
        ]);

        let resolution = resolve_now(&window, None, &rules, &ResolvePolicy::default());

        assert_eq!(resolution.status.tag, "focus");
    }

    #[test]
    fn test_ended_early_with_imminent_meeting_transitions() {
        let rules = StatusRules::default();
        let window = EventWindow::new(vec![event("e1", "Design call", 45, 1800)]);
        let manual = ManualOverride::new(TAG_MEETING_ENDED_EARLY, base() - Duration::minutes(20));

        let resolution = resolve_now(&window, Some(&manual), &rules, &ResolvePolicy::default());

        assert_eq!(resolution.status.tag, "call");
        assert!(resolution.clear_override);
    }

    #[test]
    fn test_ended_early_holds_outside_lead_window() {
        let rules = StatusRules::default();
        let window = EventWindow::new(vec![event("e1", "Design call", 120, 1800)]);
        let manual = ManualOverride::new(TAG_MEETING_ENDED_EARLY, base() - Duration::minutes(20));

        let resolution = resolve_now(&window, Some(&manual), &rules, &ResolvePolicy::default());

        assert_eq!(resolution.status.tag, TAG_MEETING_ENDED_EARLY);
        assert!(resolution.status.power_off);
        assert!(!resolution.clear_override);
    }

    #[test]
    fn test_just_ended_meeting_is_not_imminent_for_itself() {
        // The meeting ended exactly now. It must neither be active nor
        // count as imminent, even with a generous lead window.
        let rules = StatusRules::default();
        let window = EventWindow::new(vec![event("e1", "Team meeting", -1800, 0)]);

        let resolution = resolve_now(&window, None, &rules, &ResolvePolicy::default());

        assert_eq!(resolution.status.tag, TAG_AVAILABLE);
        assert_eq!(resolution.status.source, StatusSource::Default);
    }

    #[test]
    fn test_back_to_back_meetings_no_gap() {
        let rules = StatusRules::default();
        // First meeting ends exactly when the second starts; at the seam
        // the second one is active.
        let window = EventWindow::new(vec![
            event("a", "Standup meeting", -1800, 0),
            event("b", "Planning meeting", 0, 1800),
        ]);

        let resolution = resolve_now(&window, None, &rules, &ResolvePolicy::default());

        assert_eq!(resolution.status.tag, "meeting");
        assert_eq!(resolution.status.source, StatusSource::Calendar);
    }

    #[test]
    fn test_expired_override_falls_back_to_calendar() {
        let rules = StatusRules::default();
        let window = EventWindow::new(vec![]);
        let manual = ManualOverride::new("focus", base() - Duration::hours(3));

        let resolution = resolve_now(&window, Some(&manual), &rules, &ResolvePolicy::default());

        assert_eq!(resolution.status.tag, TAG_AVAILABLE);
        assert!(resolution.clear_override);
    }

    #[test]
    fn test_stuck_override_without_timestamp_is_cleared() {
        let rules = StatusRules::default();
        let window = EventWindow::new(vec![]);
        let manual = ManualOverride {
            tag: TAG_IN_MEETING.to_string(),
            set_at: None,
        };

        let resolution = resolve_now(&window, Some(&manual), &rules, &ResolvePolicy::default());

        assert_eq!(resolution.status.tag, TAG_AVAILABLE);
        assert!(resolution.clear_override);
    }

    #[test]
    fn test_manual_override_suppresses_imminent_for_non_ended_early_tags() {
        // Only meeting_ended_early yields to an imminent meeting; a plain
        // manual "focus" keeps the calendar suppressed until rule 1 fires.
        let rules = StatusRules::default();
        let window = EventWindow::new(vec![event("e1", "Team meeting", 30, 1800)]);
        let manual = ManualOverride::new("focus", base() - Duration::minutes(5));

        let resolution = resolve_now(&window, Some(&manual), &rules, &ResolvePolicy::default());

        assert_eq!(resolution.status.tag, "focus");
        assert!(!resolution.clear_override);
    }

    #[test]
    fn test_active_unmatched_event_resolves_unknown() {
        let rules = StatusRules::new(vec![StatusRule::new("focus", BLUE, false)]);
        let window = EventWindow::new(vec![event("e1", "Dentist", -600, 600)]);

        let off_policy = ResolvePolicy {
            off_for_unknown_status: true,
            ..ResolvePolicy::default()
        };
        let resolution = resolve_now(&window, None, &rules, &off_policy);
        assert_eq!(resolution.status.tag, TAG_UNKNOWN);
        assert_eq!(resolution.status.light_command(), LightCommand::Off);

        let on_policy = ResolvePolicy::default();
        let resolution = resolve_now(&window, None, &rules, &on_policy);
        assert_eq!(resolution.status.tag, TAG_UNKNOWN);
        assert_eq!(
            resolution.status.light_command(),
            LightCommand::On {
                color: Rgb::new(255, 255, 255)
            }
        );
    }

    #[test]
    fn test_unmatched_active_event_does_not_clear_override() {
        // Rule 1 requires a keyword match; an unmatched active event leaves
        // the override in charge.
        let rules = StatusRules::new(vec![StatusRule::new("lunch", GREEN, true)]);
        let window = EventWindow::new(vec![event("e1", "Dentist", -600, 600)]);
        let manual = ManualOverride::new("lunch", base() - Duration::minutes(5));

        let resolution = resolve_now(&window, Some(&manual), &rules, &ResolvePolicy::default());

        assert_eq!(resolution.status.tag, "lunch");
        assert!(!resolution.clear_override);
    }

    #[test]
    fn test_overlap_picks_earliest_matched_event() {
        // The earliest active event matches nothing; authority goes to the
        // earliest *matched* one.
        let rules = StatusRules::new(vec![StatusRule::new("meeting", RED, false)]);
        let window = EventWindow::new(vec![
            event("unmatched", "Errand", -900, 900),
            event("matched", "Team meeting", -300, 1800),
        ]);

        let resolution = resolve_now(&window, None, &rules, &ResolvePolicy::default());

        assert_eq!(resolution.status.tag, "meeting");
    }

    #[test]
    fn test_power_off_when_available_policy() {
        let rules = StatusRules::default();
        let window = EventWindow::new(vec![]);
        let policy = ResolvePolicy {
            power_off_when_available: true,
            ..ResolvePolicy::default()
        };

        let resolution = resolve_now(&window, None, &rules, &policy);

        assert_eq!(resolution.status.tag, TAG_AVAILABLE);
        assert_eq!(resolution.status.light_command(), LightCommand::Off);
    }
}
