//! Google Calendar v3 REST calls and mapping into core events.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use glowstatus_core::constants::{FETCH_WINDOW_FUTURE_HOURS, FETCH_WINDOW_PAST_HOURS};
use glowstatus_core::{CalendarError, Event, EventWindow};
use serde::Deserialize;
use tracing::debug;

const EVENTS_URL: &str = "https://www.googleapis.com/calendar/v3/calendars";

/// Upper bound on one events request; a hung calendar API call must not
/// stall the polling loop past this ceiling.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Plenty for a day of meetings on a single-user calendar.
const MAX_RESULTS: &str = "100";

/// A calendar to poll for one account.
pub struct GoogleCalendarSource {
    account: String,
    calendar_id: String,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct EventsResponse {
    #[serde(default)]
    items: Vec<GoogleEvent>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleEvent {
    #[serde(default)]
    id: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    status: String,
    start: Option<GoogleEventTime>,
    end: Option<GoogleEventTime>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleEventTime {
    date_time: Option<DateTime<Utc>>,
    #[allow(dead_code)]
    date: Option<NaiveDate>,
}

impl GoogleCalendarSource {
    pub fn new(account: &str, calendar_id: &str) -> Result<Self, CalendarError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| CalendarError::Network(format!("Failed to build HTTP client: {e}")))?;

        Ok(GoogleCalendarSource {
            account: account.to_string(),
            calendar_id: calendar_id.to_string(),
            http,
        })
    }

    /// Fetch the per-tick snapshot: everything overlapping the lookaround
    /// window, sorted by start.
    pub async fn fetch_window(&self, now: DateTime<Utc>) -> Result<EventWindow, CalendarError> {
        let from = now - chrono::Duration::hours(FETCH_WINDOW_PAST_HOURS);
        let to = now + chrono::Duration::hours(FETCH_WINDOW_FUTURE_HOURS);

        let events = self.fetch_events(from, to).await?;
        Ok(EventWindow::new(events))
    }

    /// Fetch events within `[from, to]` from the Calendar v3 REST API.
    pub async fn fetch_events(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Event>, CalendarError> {
        let session = crate::session::Session::load_valid(&self.account).await?;

        let url = format!(
            "{EVENTS_URL}/{}/events",
            urlencoding::encode(&self.calendar_id)
        );

        let response = self
            .http
            .get(&url)
            .bearer_auth(session.access_token())
            .query(&[
                ("timeMin", from.to_rfc3339().as_str()),
                ("timeMax", to.to_rfc3339().as_str()),
                ("singleEvents", "true"),
                ("orderBy", "startTime"),
                ("maxResults", MAX_RESULTS),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CalendarError::Network(format!("Calendar request timed out: {e}"))
                } else {
                    CalendarError::Network(format!("Calendar request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 | 403 => CalendarError::Auth(format!(
                    "Calendar access rejected (HTTP {status}): {message}"
                )),
                429 | 500..=599 => CalendarError::Network(format!(
                    "Calendar temporarily unavailable (HTTP {status})"
                )),
                code => CalendarError::Api {
                    status: code,
                    message,
                },
            });
        }

        let body: EventsResponse = response
            .json()
            .await
            .map_err(|e| CalendarError::Network(format!("Invalid events response: {e}")))?;

        let events: Vec<Event> = body
            .items
            .into_iter()
            .filter_map(from_google_event)
            .collect();

        debug!(
            calendar = %self.calendar_id,
            count = events.len(),
            "fetched calendar events"
        );

        Ok(events)
    }
}

/// Map a Google event into the core model. Cancelled entries and all-day
/// (date-only) entries are dropped: neither says anything about
/// minute-level availability.
fn from_google_event(event: GoogleEvent) -> Option<Event> {
    if event.id.is_empty() || event.status == "cancelled" {
        return None;
    }

    let start = event.start.as_ref()?.date_time?;
    let end = event.end.as_ref()?.date_time?;

    Some(Event {
        id: event.id,
        summary: if event.summary.is_empty() {
            "(No title)".to_string()
        } else {
            event.summary
        },
        start,
        end,
    })
}
