//! Display shaping for raw upstream values: durations, counts and timestamps.

use std::sync::OnceLock;

use chrono::{DateTime, Duration, TimeZone, Utc};
use regex::Regex;

pub const MISSING_DURATION: &str = "N/A";

fn iso8601_duration_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?)?$")
            .expect("valid duration pattern")
    })
}

/// `PT1H2M3S` -> `1:02:03`, `PT4M5S` -> `4:05`, `PT45S` -> `0:45`.
///
/// Days fold into hours. Returns `None` for anything that is not an
/// ISO-8601 duration with at least one component.
pub fn format_iso8601_duration(raw: &str) -> Option<String> {
    let caps = iso8601_duration_re().captures(raw.trim())?;
    if caps.iter().skip(1).all(|c| c.is_none()) {
        return None;
    }
    // Absent components count as zero; present ones must fit a u64.
    let part = |idx: usize| -> Option<u64> {
        caps.get(idx)
            .map_or(Some(0), |m| m.as_str().parse::<u64>().ok())
    };
    let days = part(1)?;
    let hours = days.checked_mul(24)?.checked_add(part(2)?)?;
    let minutes = part(3)?;
    let seconds = part(4)?;

    if hours > 0 {
        Some(format!("{hours}:{minutes:02}:{seconds:02}"))
    } else {
        Some(format!("{minutes}:{seconds:02}"))
    }
}

/// Compact counter: `1500` -> `1.5K`, `2_300_000` -> `2.3M`.
pub fn format_count(count: u64) -> String {
    if count >= 1_000_000 {
        format!("{:.1}M", count as f64 / 1_000_000.0)
    } else if count >= 1_000 {
        format!("{:.1}K", count as f64 / 1_000.0)
    } else {
        count.to_string()
    }
}

/// Relative age in Indonesian, matching the site copy.
pub fn format_time_ago(published: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now.signed_duration_since(published);
    let mins = diff.num_minutes();
    let hours = diff.num_hours();
    let days = diff.num_days();
    let weeks = days / 7;
    let months = days / 30;
    let years = days / 365;

    if mins < 1 {
        "baru saja".to_string()
    } else if mins < 60 {
        format!("{mins} menit lalu")
    } else if hours < 24 {
        format!("{hours} jam lalu")
    } else if days < 7 {
        format!("{days} hari lalu")
    } else if weeks < 4 {
        format!("{weeks} minggu lalu")
    } else if months < 12 {
        format!("{months} bulan lalu")
    } else {
        format!("{years} tahun lalu")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Freshness {
    /// Published within the last six hours.
    VeryNew,
    /// Published within the last three days.
    New,
    Regular,
}

impl Freshness {
    pub fn of(published: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        if published >= now - Duration::hours(6) {
            Self::VeryNew
        } else if published >= now - fresh_window() {
            Self::New
        } else {
            Self::Regular
        }
    }

    pub fn badge(self) -> Option<&'static str> {
        match self {
            Self::VeryNew => Some("LIVE"),
            Self::New => Some("NEW"),
            Self::Regular => None,
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            Self::VeryNew => "very-new",
            Self::New => "new",
            Self::Regular => "",
        }
    }
}

/// Window used by the NEW badge and the "fresh" statistic.
pub fn fresh_window() -> Duration {
    Duration::days(3)
}

/// `HH:MM` in the given zone, used for the "last update" label.
pub fn format_clock<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%H:%M").to_string()
}
