//! Shared constants for the glowstatus ecosystem.

/// Default polling interval in seconds.
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 60;

/// Minimum polling interval enforced at runtime. Config files may contain
/// smaller values for backwards compatibility; the engine clamps them.
pub const MIN_REFRESH_INTERVAL_SECS: u64 = 15;

/// Ticks land on wall-clock multiples of this many seconds (:00/:15/:30/:45).
pub const TICK_BOUNDARY_SECS: u32 = 15;

/// Default lookahead before a meeting's start during which its status is
/// pre-activated.
pub const DEFAULT_LEAD_WINDOW_SECS: u64 = 60;

/// Default lifetime of a manual override before calendar authority resumes.
pub const DEFAULT_OVERRIDE_EXPIRY_SECS: u64 = 2 * 60 * 60;

/// How far around "now" the event fetch window reaches. Long-running events
/// that started hours ago must still be visible as active.
pub const FETCH_WINDOW_PAST_HOURS: i64 = 24;
pub const FETCH_WINDOW_FUTURE_HOURS: i64 = 24;

/// Status tag used when no event matches and no override is active.
pub const TAG_AVAILABLE: &str = "available";

/// Status tag for an active event whose title matches no rule.
pub const TAG_UNKNOWN: &str = "unknown";

/// Status tag an imminent meeting pre-activates when its title matches no
/// rule.
pub const TAG_IN_MEETING: &str = "in_meeting";

/// Status tag set when the user manually ends a meeting before its
/// calendar end time.
pub const TAG_MEETING_ENDED_EARLY: &str = "meeting_ended_early";

/// Consecutive transient fetch failures before a prominent warning is logged.
pub const NETWORK_FAILURE_WARN_THRESHOLD: u32 = 3;
