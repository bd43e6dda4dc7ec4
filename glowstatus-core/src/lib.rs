//! Core types and the status-resolution engine for the glowstatus
//! ecosystem.
//!
//! This crate provides everything the daemon and collaborator crates share:
//! - `Event` and the per-tick `EventWindow` snapshot
//! - keyword matching and the ordered `StatusRules` table
//! - the status resolver and meeting-transition engine
//! - manual override state, configuration, and error types

pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod manual;
pub mod matcher;
pub mod resolver;
pub mod status;

pub use config::GlowConfig;
pub use error::{CalendarError, DeviceError, GlowError, GlowResult};
pub use event::{Event, EventWindow};
pub use manual::ManualOverride;
pub use matcher::match_status;
pub use resolver::{FirstStartWins, MeetingPicker, ResolvePolicy, Resolution, resolve};
pub use status::{LightCommand, ResolvedStatus, Rgb, StatusRule, StatusRules, StatusSource};
