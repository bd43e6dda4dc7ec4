//! Status tags, keyword rules, and resolved-status types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::TAG_AVAILABLE;
use crate::error::GlowError;

/// An RGB color, serialized in config files as `"r,g,b"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

pub const WHITE: Rgb = Rgb::new(255, 255, 255);
pub const RED: Rgb = Rgb::new(255, 0, 0);
pub const GREEN: Rgb = Rgb::new(0, 255, 0);
pub const BLUE: Rgb = Rgb::new(0, 0, 255);
pub const YELLOW: Rgb = Rgb::new(255, 255, 0);
pub const GRAY: Rgb = Rgb::new(128, 128, 128);

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = GlowError;

    /// Parse `"r,g,b"`. Components outside 0..=255 are clamped rather than
    /// rejected, matching what device firmware would do anyway.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(GlowError::Config(format!(
                "Invalid color '{s}': expected \"r,g,b\""
            )));
        }

        let mut channels = [0u8; 3];
        for (i, part) in parts.iter().enumerate() {
            let value: i64 = part
                .parse()
                .map_err(|_| GlowError::Config(format!("Invalid color '{s}': expected \"r,g,b\"")))?;
            channels[i] = value.clamp(0, 255) as u8;
        }

        Ok(Rgb::new(channels[0], channels[1], channels[2]))
    }
}

impl Serialize for Rgb {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A user-configured keyword rule. The keyword doubles as the status tag it
/// produces, and insertion order is the tie-break priority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRule {
    pub keyword: String,
    pub color: Rgb,
    #[serde(default)]
    pub power_off: bool,
}

impl StatusRule {
    pub fn new(keyword: &str, color: Rgb, power_off: bool) -> Self {
        StatusRule {
            keyword: keyword.to_string(),
            color,
            power_off,
        }
    }
}

/// Ordered rule table.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusRules {
    rules: Vec<StatusRule>,
}

impl StatusRules {
    pub fn new(rules: Vec<StatusRule>) -> Self {
        StatusRules { rules }
    }

    pub fn rules(&self) -> &[StatusRule] {
        &self.rules
    }

    /// Look up a rule by its exact tag (used to map override tags to light
    /// behavior, as opposed to keyword matching against event titles).
    pub fn by_tag(&self, tag: &str) -> Option<&StatusRule> {
        self.rules.iter().find(|r| r.keyword == tag)
    }
}

impl Default for StatusRules {
    /// The built-in rule table, used when no config exists or as the
    /// per-entry fallback for malformed config entries.
    fn default() -> Self {
        StatusRules::new(vec![
            StatusRule::new(crate::constants::TAG_IN_MEETING, RED, false),
            StatusRule::new("meeting", RED, false),
            StatusRule::new("call", RED, false),
            StatusRule::new("focus", BLUE, false),
            StatusRule::new("lunch", GREEN, true),
            StatusRule::new("break", YELLOW, true),
            StatusRule::new(TAG_AVAILABLE, GREEN, false),
            StatusRule::new(crate::constants::TAG_MEETING_ENDED_EARLY, YELLOW, true),
        ])
    }
}

/// Where the authoritative status came from this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusSource {
    Calendar,
    Manual,
    Default,
}

/// The single authoritative status for one tick. Recomputed every tick and
/// never persisted; the only thing remembered across ticks is the
/// dispatcher's last-command cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedStatus {
    pub tag: String,
    pub source: StatusSource,
    pub color: Option<Rgb>,
    pub power_off: bool,
}

impl ResolvedStatus {
    /// The wire command this status maps to. Unknown tags with no color
    /// fall back to white unless `power_off` says otherwise.
    pub fn light_command(&self) -> LightCommand {
        if self.power_off {
            LightCommand::Off
        } else {
            LightCommand::On {
                color: self.color.unwrap_or(WHITE),
            }
        }
    }
}

/// A deduplicable light command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "power", rename_all = "snake_case")]
pub enum LightCommand {
    On { color: Rgb },
    Off,
}
