//! Error types for the glowstatus ecosystem.

use thiserror::Error;

/// Errors from the calendar event source.
///
/// The evaluator degrades differently depending on the variant: `Auth`
/// disables calendar sync for the session, everything else retries on the
/// next tick.
#[derive(Error, Debug)]
pub enum CalendarError {
    #[error("Calendar authentication failed: {0}")]
    Auth(String),

    #[error("Calendar request failed: {0}")]
    Network(String),

    #[error("Calendar API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Calendar session error: {0}")]
    Session(String),
}

impl CalendarError {
    /// Whether this failure should disable calendar sync until the user
    /// re-enables it, rather than being retried next tick.
    pub fn is_auth(&self) -> bool {
        matches!(self, CalendarError::Auth(_))
    }
}

/// Errors from the light device. Handled entirely at the dispatcher; the
/// resolved status stays authoritative whether or not the light reflects it.
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("Light device is not configured")]
    NotConfigured,

    #[error("Light device request failed: {0}")]
    Http(String),

    #[error("Light device API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },
}

/// Errors for glowstatus operations outside the collaborator boundaries.
#[derive(Error, Debug)]
pub enum GlowError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for glowstatus operations.
pub type GlowResult<T> = Result<T, GlowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_auth_failures_disable_sync() {
        assert!(CalendarError::Auth("token revoked".into()).is_auth());
        assert!(!CalendarError::Network("connection reset".into()).is_auth());
        assert!(
            !CalendarError::Api {
                status: 404,
                message: "calendar not found".into()
            }
            .is_auth()
        );
        assert!(!CalendarError::Session("unreadable session file".into()).is_auth());
    }
}
