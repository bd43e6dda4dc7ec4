//! Terminal rendering for daemon responses.

use chrono::Utc;
use owo_colors::OwoColorize;

use crate::client::StatusReport;

/// Extension trait for colored terminal rendering.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for StatusReport {
    fn render(&self) -> String {
        let mut lines = Vec::new();

        match &self.status {
            Some(status) => {
                let tag = if status.power_off {
                    status.tag.dimmed().to_string()
                } else {
                    status.tag.bold().green().to_string()
                };
                let light = match (&status.color, status.power_off) {
                    (_, true) => "light off".dimmed().to_string(),
                    (Some(color), false) => format!("light {color}"),
                    (None, false) => "light white".to_string(),
                };
                lines.push(format!("Status: {tag} ({}, {light})", status.source));
            }
            None => lines.push(format!("Status: {}", "not evaluated yet".dimmed())),
        }

        match &self.manual {
            Some(manual) => lines.push(format!(
                "Override: {} {}",
                manual.tag.yellow(),
                render_age(manual.set_at).dimmed()
            )),
            None => lines.push(format!("Override: {}", "none".dimmed())),
        }

        if let Some(next) = &self.next_event {
            let until = (next.start - Utc::now()).num_seconds();
            if until > 0 {
                let until = humantime::format_duration(std::time::Duration::from_secs(
                    until as u64,
                ));
                lines.push(format!("Next: {} in {until}", next.summary));
            } else {
                lines.push(format!("Next: {}", next.summary));
            }
        }

        lines.push(format!(
            "Sync: {}   Lights: {}",
            render_switch(self.sync_enabled, self.sync_degraded),
            render_switch(self.lights_enabled, false),
        ));

        lines.join("\n")
    }
}

fn render_switch(enabled: bool, degraded: bool) -> String {
    if degraded {
        "degraded".red().to_string()
    } else if enabled {
        "on".green().to_string()
    } else {
        "off".dimmed().to_string()
    }
}

fn render_age(set_at: Option<chrono::DateTime<Utc>>) -> String {
    match set_at {
        Some(at) => {
            let secs = (Utc::now() - at).num_seconds().max(0) as u64;
            format!(
                "(set {} ago)",
                humantime::format_duration(std::time::Duration::from_secs(secs))
            )
        }
        None => "(no timestamp)".to_string(),
    }
}
