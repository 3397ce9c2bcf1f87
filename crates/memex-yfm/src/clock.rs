//! Dates and timestamps written into front matter.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, Local, Utc};
use chrono_tz::Tz;

/// Environment variable that overrides the configured timezone.
pub const TZ_ENV: &str = "MEMEX_TZ";

/// Timestamp format used when none (or an invalid one) is configured.
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

#[derive(Debug, Clone, Copy, PartialEq)]
enum Zone {
    Local,
    Fixed(FixedOffset),
    Named(Tz),
}

/// Source of "now" for a single invocation.
#[derive(Debug, Clone)]
pub struct Clock {
    zone: Zone,
    format: String,
    pinned: Option<DateTime<FixedOffset>>,
}

impl Clock {
    /// Clock in the given timezone (`Asia/Tokyo`, `UTC`, `+08:00`, ...),
    /// or the system zone when `None` or unrecognized.
    pub fn new(timezone: Option<&str>, format: &str) -> Self {
        let zone = match timezone.map(str::trim).filter(|tz| !tz.is_empty()) {
            None => Zone::Local,
            Some(tz) => parse_zone(tz).unwrap_or_else(|| {
                tracing::warn!("Unrecognized timezone `{}`, using system time", tz);
                Zone::Local
            }),
        };

        Self {
            zone,
            format: checked_format(format),
            pinned: None,
        }
    }

    /// Resolve the timezone from `explicit`, then `MEMEX_TZ`, then `configured`.
    pub fn resolve(explicit: Option<&str>, configured: Option<&str>, format: &str) -> Self {
        let env = std::env::var(TZ_ENV).ok().filter(|v| !v.trim().is_empty());
        let timezone = explicit.or(env.as_deref()).or(configured);
        Self::new(timezone, format)
    }

    /// Clock frozen at `at`.
    pub fn pinned(at: DateTime<FixedOffset>, format: &str) -> Self {
        Self {
            zone: Zone::Fixed(*at.offset()),
            format: checked_format(format),
            pinned: Some(at),
        }
    }

    pub fn now(&self) -> DateTime<FixedOffset> {
        if let Some(at) = self.pinned {
            return at;
        }
        match self.zone {
            Zone::Local => Local::now().fixed_offset(),
            Zone::Fixed(offset) => Utc::now().with_timezone(&offset),
            Zone::Named(tz) => Utc::now().with_timezone(&tz).fixed_offset(),
        }
    }

    /// Today as `YYYY-MM-DD`.
    pub fn today(&self) -> String {
        self.now().format("%Y-%m-%d").to_string()
    }

    /// Now in the configured timestamp format.
    pub fn timestamp(&self) -> String {
        self.now().format(&self.format).to_string()
    }

    /// Compact stamp for backup file names.
    pub fn backup_stamp(&self) -> String {
        self.now().format("%Y%m%d-%H%M%S").to_string()
    }
}

fn checked_format(format: &str) -> String {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        tracing::warn!("Invalid timestamp format `{}`, using default", format);
        return DEFAULT_TIMESTAMP_FORMAT.to_string();
    }
    format.to_string()
}

fn parse_zone(tz: &str) -> Option<Zone> {
    if let Some(offset) = parse_offset(tz) {
        return Some(Zone::Fixed(offset));
    }
    tz.parse::<Tz>().ok().map(Zone::Named)
}

/// Parse `UTC`/`GMT`/`Z` or a `+HH:MM`, `+HHMM`, `+HH` offset.
pub fn parse_offset(tz: &str) -> Option<FixedOffset> {
    let tz = tz.trim();
    if matches!(
        tz.to_ascii_uppercase().as_str(),
        "UTC" | "GMT" | "Z" | "ETC/UTC" | "ETC/GMT"
    ) {
        return FixedOffset::east_opt(0);
    }

    let (sign, rest) = match tz.as_bytes().first()? {
        b'+' => (1, &tz[1..]),
        b'-' => (-1, &tz[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let (hours, minutes) = match digits.len() {
        2 => (digits.parse::<i32>().ok()?, 0),
        4 => (digits[..2].parse::<i32>().ok()?, digits[2..].parse::<i32>().ok()?),
        _ => return None,
    };
    if hours > 23 || minutes > 59 {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(offset_hours: i32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(offset_hours * 3600)
            .unwrap()
            .with_ymd_and_hms(2025, 8, 30, 15, 32, 16)
            .unwrap()
    }

    #[test]
    fn parses_offsets() {
        assert_eq!(parse_offset("UTC"), FixedOffset::east_opt(0));
        assert_eq!(parse_offset("z"), FixedOffset::east_opt(0));
        assert_eq!(parse_offset("+08:00"), FixedOffset::east_opt(8 * 3600));
        assert_eq!(parse_offset("-0530"), FixedOffset::west_opt(5 * 3600 + 30 * 60));
        assert_eq!(parse_offset("+02"), FixedOffset::east_opt(2 * 3600));
        assert_eq!(parse_offset("Africa/Abidjan"), None);
        assert_eq!(parse_offset("+25:00"), None);
        assert_eq!(parse_offset(""), None);
    }

    #[test]
    fn formats_pinned_time() {
        let clock = Clock::pinned(at(0), DEFAULT_TIMESTAMP_FORMAT);

        assert_eq!(clock.today(), "2025-08-30");
        assert_eq!(clock.timestamp(), "2025-08-30 15:32:16 +0000");
        assert_eq!(clock.backup_stamp(), "20250830-153216");
    }

    #[test]
    fn keeps_offset_in_timestamp() {
        let clock = Clock::pinned(at(8), DEFAULT_TIMESTAMP_FORMAT);

        assert_eq!(clock.timestamp(), "2025-08-30 15:32:16 +0800");
    }

    #[test]
    fn invalid_format_falls_back() {
        let clock = Clock::pinned(at(0), "%Y-%");

        assert_eq!(clock.timestamp(), "2025-08-30 15:32:16 +0000");
    }

    #[test]
    fn named_zone_uses_its_offset() {
        assert_eq!(Clock::new(Some("Asia/Tokyo"), "%z").timestamp(), "+0900");
        assert_eq!(Clock::new(Some("Africa/Abidjan"), "%z").timestamp(), "+0000");
        assert_eq!(parse_zone("America/New_York"), Some(Zone::Named(Tz::America__New_York)));
        assert_eq!(parse_zone("Mars/Olympus"), None);
    }

    #[test]
    fn fixed_zone_uses_offset() {
        let clock = Clock::new(Some("+08:00"), "%z");

        assert_eq!(clock.timestamp(), "+0800");
    }
}
