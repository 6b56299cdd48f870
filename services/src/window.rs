//! Class-session windows.
//!
//! A session opens shortly before its scheduled start and closes a while
//! after; scans outside every open window are rejected. The demo default
//! is an always-open policy so the kiosk responds out of the box.

use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime, Weekday};

/// Minutes a window opens before the scheduled start.
pub const OPENS_BEFORE_MIN: i64 = 10;

/// Minutes a window stays open after the scheduled start.
pub const CLOSES_AFTER_MIN: i64 = 20;

#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid session window {spec:?}: {reason}")]
pub struct WindowParseError {
    pub spec: String,
    pub reason: String,
}

/// One scheduled session: a start time on a set of weekdays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionWindow {
    pub start: NaiveTime,
    pub days: Vec<Weekday>,
}

impl SessionWindow {
    /// Parses a `HH:MM@Mon,Wed,Fri` spec.
    pub fn parse(spec: &str) -> Result<Self, WindowParseError> {
        let fail = |reason: &str| WindowParseError {
            spec: spec.to_owned(),
            reason: reason.to_owned(),
        };

        let (time, days) = spec.split_once('@').ok_or_else(|| fail("missing '@'"))?;
        let start = NaiveTime::parse_from_str(time.trim(), "%H:%M")
            .map_err(|err| fail(&format!("bad start time: {err}")))?;
        let days = days
            .split(',')
            .map(|day| day.trim().parse::<Weekday>().map_err(|_| fail("bad weekday")))
            .collect::<Result<Vec<_>, _>>()?;
        if days.is_empty() {
            return Err(fail("no weekdays"));
        }
        Ok(Self { start, days })
    }

    /// Whether `now` falls inside this window on one of its days.
    pub fn contains(&self, now: NaiveDateTime) -> bool {
        if !self.days.contains(&now.weekday()) {
            return false;
        }
        let start = now.date().and_time(self.start);
        let open = start - Duration::minutes(OPENS_BEFORE_MIN);
        let close = start + Duration::minutes(CLOSES_AFTER_MIN);
        (open..=close).contains(&now)
    }
}

/// When the kiosk accepts scans.
#[derive(Debug, Clone, Default)]
pub enum WindowPolicy {
    /// Every request is accepted. The demo default.
    #[default]
    AlwaysOpen,
    /// Requests are accepted only inside one of the listed windows.
    Scheduled(Vec<SessionWindow>),
}

impl WindowPolicy {
    pub fn is_open(&self, now: NaiveDateTime) -> bool {
        match self {
            Self::AlwaysOpen => true,
            Self::Scheduled(windows) => windows.iter().any(|window| window.contains(now)),
        }
    }

    /// Parses a `;`-separated list of window specs.
    pub fn parse(specs: &str) -> Result<Self, WindowParseError> {
        let windows = specs
            .split(';')
            .filter(|spec| !spec.trim().is_empty())
            .map(SessionWindow::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::Scheduled(windows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn monday_at(hour: u32, min: u32) -> NaiveDateTime {
        // 2026-08-03 is a Monday.
        NaiveDate::from_ymd_opt(2026, 8, 3)
            .expect("valid date")
            .and_hms_opt(hour, min, 0)
            .expect("valid time")
    }

    fn window() -> SessionWindow {
        SessionWindow::parse("13:45@Mon,Wed").expect("valid spec")
    }

    #[test]
    fn parses_time_and_days() {
        let window = window();
        assert_eq!(window.start, NaiveTime::from_hms_opt(13, 45, 0).expect("valid"));
        assert_eq!(window.days, vec![Weekday::Mon, Weekday::Wed]);
    }

    #[test]
    fn rejects_malformed_specs() {
        assert!(SessionWindow::parse("13:45").is_err());
        assert!(SessionWindow::parse("25:00@Mon").is_err());
        assert!(SessionWindow::parse("13:45@Funday").is_err());
        assert!(SessionWindow::parse("13:45@").is_err());
    }

    #[test]
    fn opens_ten_minutes_early_and_closes_twenty_late() {
        let window = window();
        assert!(!window.contains(monday_at(13, 34)));
        assert!(window.contains(monday_at(13, 35)));
        assert!(window.contains(monday_at(13, 45)));
        assert!(window.contains(monday_at(14, 5)));
        assert!(!window.contains(monday_at(14, 6)));
    }

    #[test]
    fn closed_on_other_weekdays() {
        // 2026-08-04 is a Tuesday.
        let tuesday = NaiveDate::from_ymd_opt(2026, 8, 4)
            .expect("valid date")
            .and_hms_opt(13, 45, 0)
            .expect("valid time");
        assert!(!window().contains(tuesday));
    }

    #[test]
    fn always_open_policy_accepts_everything() {
        assert!(WindowPolicy::AlwaysOpen.is_open(monday_at(3, 0)));
    }

    #[test]
    fn scheduled_policy_checks_each_window() {
        let policy = WindowPolicy::parse("13:45@Mon;16:00@Tue").expect("valid specs");
        assert!(policy.is_open(monday_at(13, 50)));
        assert!(!policy.is_open(monday_at(16, 0)));
    }

    #[test]
    fn empty_schedule_is_never_open() {
        let policy = WindowPolicy::Scheduled(Vec::new());
        assert!(!policy.is_open(monday_at(13, 45)));
    }
}
