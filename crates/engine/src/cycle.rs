//! Date-window arithmetic: calendar months and the payroll cycle.
//!
//! The payroll cycle is not aligned to calendar months: with the default
//! boundary day 21 a cycle runs from the 21st of one month to the 20th of the
//! next. Membership is decided on integer-encoded dates
//! (`year * 10000 + month * 100 + day`) so no timezone conversion can move a
//! record across an edge.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Datelike, NaiveDate};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::EngineError;

pub const DEFAULT_BOUNDARY_DAY: u32 = 21;

/// Calendar month identity, rendered as `YYYY-MM`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    /// Returns `None` unless `month` is in `1..=12`.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u32 {
        self.month
    }

    /// The following calendar month.
    pub fn succ(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// The preceding calendar month.
    pub fn pred(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// `day` of this month; days past the month's end clamp to its last day.
    fn day(self, day: u32) -> NaiveDate {
        let last = self
            .succ()
            .first()
            .and_then(|next| next.pred_opt())
            .map_or(28, |d| d.day());
        // Only fails for years outside chrono's supported range.
        NaiveDate::from_ymd_opt(self.year, self.month, day.clamp(1, last)).unwrap_or_default()
    }

    fn first(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = EngineError;

    /// Parses exactly `YYYY-MM`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::InvalidDate(format!("expected YYYY-MM, got '{s}'"));
        let s = s.trim();
        if s.len() != 7 {
            return Err(invalid());
        }
        year_first_month(s).ok_or_else(invalid)
    }
}

impl Serialize for MonthKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MonthKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Month identity of a raw sheet date.
///
/// Two encodings are understood: year-first (`YYYY-MM-DD`, or anything that
/// starts with `YYYY-MM` such as an RFC 3339 timestamp) and day-first with
/// slashes (`DD/MM/YYYY`). The string is day-first when its first `/` sits at
/// index 2 or lower. Anything else yields `None`, which no window matches.
pub fn month_key(raw: &str) -> Option<MonthKey> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.find('/') {
        Some(idx) if idx <= 2 => day_first_month(raw),
        _ => year_first_month(raw),
    }
}

fn day_first_month(raw: &str) -> Option<MonthKey> {
    let mut parts = raw.split('/');
    let day = parts.next()?;
    let month = parts.next()?;
    let year = parts.next()?.split_whitespace().next()?;
    if parts.next().is_some() {
        return None;
    }
    let short_number = |s: &str| (1..=2).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit());
    if !short_number(day) || !short_number(month) {
        return None;
    }
    if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    MonthKey::new(year.parse().ok()?, month.parse().ok()?)
}

fn year_first_month(raw: &str) -> Option<MonthKey> {
    let bytes = raw.as_bytes();
    if bytes.len() < 7 || bytes[4] != b'-' {
        return None;
    }
    if !bytes[..4].iter().chain(&bytes[5..7]).all(u8::is_ascii_digit) {
        return None;
    }
    if bytes.len() > 7 && bytes[7] != b'-' {
        return None;
    }
    MonthKey::new(raw[..4].parse().ok()?, raw[5..7].parse().ok()?)
}

/// Calendar date of a raw sheet value.
///
/// Accepts `YYYY-MM-DD`, `DD/MM/YYYY` and RFC 3339 timestamps; timestamps are
/// converted to `tz` first (the sheet serializes local midnight as UTC).
pub fn parse_date(raw: &str, tz: Tz) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Some(idx) = raw.find('/')
        && idx <= 2
    {
        return NaiveDate::parse_from_str(raw, "%d/%m/%Y").ok();
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&tz).date_naive());
    }
    raw.get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

/// `year * 10000 + month * 100 + day`.
pub fn date_key(date: NaiveDate) -> i64 {
    i64::from(date.year()) * 10_000 + i64::from(date.month()) * 100 + i64::from(date.day())
}

/// Inclusive date range of one pay cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayCycleWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl PayCycleWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        let key = date_key(date);
        date_key(self.start) <= key && key <= date_key(self.end)
    }
}

/// Pay cycle configuration: the day of month on which a new cycle starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PayCycle {
    boundary_day: u32,
}

impl Default for PayCycle {
    fn default() -> Self {
        Self {
            boundary_day: DEFAULT_BOUNDARY_DAY,
        }
    }
}

impl PayCycle {
    /// The boundary must leave both edge days inside every month: `2..=28`.
    pub fn new(boundary_day: u32) -> Result<Self, EngineError> {
        if !(2..=28).contains(&boundary_day) {
            return Err(EngineError::InvalidBoundaryDay(boundary_day));
        }
        Ok(Self { boundary_day })
    }

    pub fn boundary_day(self) -> u32 {
        self.boundary_day
    }

    /// The unique window containing `reference`.
    pub fn window_containing(self, reference: NaiveDate) -> PayCycleWindow {
        let current = MonthKey::of(reference);
        let start_month = if reference.day() <= self.boundary_day - 1 {
            current.pred()
        } else {
            current
        };
        self.window_starting_in(start_month)
    }

    /// The window right after `window`.
    pub fn following(self, window: PayCycleWindow) -> PayCycleWindow {
        self.window_starting_in(MonthKey::of(window.start).succ())
    }

    /// The window right before `window`.
    pub fn preceding(self, window: PayCycleWindow) -> PayCycleWindow {
        self.window_starting_in(MonthKey::of(window.start).pred())
    }

    fn window_starting_in(self, month: MonthKey) -> PayCycleWindow {
        PayCycleWindow {
            start: month.day(self.boundary_day),
            end: month.succ().day(self.boundary_day - 1),
        }
    }
}

/// Window containing `reference` for a given boundary day.
pub fn pay_cycle_window(
    reference: NaiveDate,
    boundary_day: u32,
) -> Result<PayCycleWindow, EngineError> {
    Ok(PayCycle::new(boundary_day)?.window_containing(reference))
}

/// The last `n` calendar months up to and including today's, oldest first.
pub fn last_n_month_keys(today: NaiveDate, n: usize) -> Vec<MonthKey> {
    let mut keys = Vec::with_capacity(n);
    let mut month = MonthKey::of(today);
    for _ in 0..n {
        keys.push(month);
        month = month.pred();
    }
    keys.reverse();
    keys
}

/// The calendar month following today's.
pub fn next_month_key(today: NaiveDate) -> MonthKey {
    MonthKey::of(today).succ()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn key(s: &str) -> MonthKey {
        s.parse().unwrap()
    }

    #[test]
    fn month_key_reads_both_encodings() {
        assert_eq!(month_key("2024-03-10"), Some(key("2024-03")));
        assert_eq!(month_key("10/03/2024"), Some(key("2024-03")));
        assert_eq!(month_key("1/3/2024"), Some(key("2024-03")));
        assert_eq!(month_key("2024-03-09T17:00:00.000Z"), Some(key("2024-03")));
    }

    #[test]
    fn month_key_rejects_unknown_shapes() {
        assert_eq!(month_key(""), None);
        assert_eq!(month_key("2024/03/10"), None);
        assert_eq!(month_key("March 2024"), None);
        assert_eq!(month_key("10/13/2024"), None);
        assert_eq!(month_key("2024-3-5"), None);
    }

    #[test]
    fn parse_date_converts_timestamps_to_local_day() {
        let tz = chrono_tz::Asia::Bangkok;
        assert_eq!(parse_date("2024-03-10", tz), Some(date(2024, 3, 10)));
        assert_eq!(parse_date("10/03/2024", tz), Some(date(2024, 3, 10)));
        assert_eq!(
            parse_date("2024-03-09T17:00:00.000Z", tz),
            Some(date(2024, 3, 10))
        );
        assert_eq!(parse_date("garbage", tz), None);
    }

    #[test]
    fn window_before_boundary_starts_previous_month() {
        let window = pay_cycle_window(date(2024, 3, 20), 21).unwrap();
        assert_eq!(window.start, date(2024, 2, 21));
        assert_eq!(window.end, date(2024, 3, 20));
    }

    #[test]
    fn window_on_boundary_starts_current_month() {
        let window = pay_cycle_window(date(2024, 3, 21), 21).unwrap();
        assert_eq!(window.start, date(2024, 3, 21));
        assert_eq!(window.end, date(2024, 4, 20));
    }

    #[test]
    fn window_wraps_year_end() {
        let window = pay_cycle_window(date(2024, 12, 25), 21).unwrap();
        assert_eq!(window.start, date(2024, 12, 21));
        assert_eq!(window.end, date(2025, 1, 20));

        let window = pay_cycle_window(date(2025, 1, 5), 21).unwrap();
        assert_eq!(window.start, date(2024, 12, 21));
    }

    #[test]
    fn boundary_day_is_validated() {
        assert_eq!(PayCycle::new(1), Err(EngineError::InvalidBoundaryDay(1)));
        assert_eq!(PayCycle::new(29), Err(EngineError::InvalidBoundaryDay(29)));
        assert!(PayCycle::new(28).is_ok());
    }

    #[test]
    fn following_and_preceding_are_adjacent() {
        let cycle = PayCycle::default();
        let window = cycle.window_containing(date(2024, 2, 1));
        let next = cycle.following(window);
        let prev = cycle.preceding(window);
        assert_eq!(window.end.succ_opt().unwrap(), next.start);
        assert_eq!(prev.end.succ_opt().unwrap(), window.start);
    }

    #[test]
    fn last_three_months_oldest_first() {
        let keys: Vec<String> = last_n_month_keys(date(2024, 3, 15), 3)
            .into_iter()
            .map(|k| k.to_string())
            .collect();
        assert_eq!(keys, vec!["2024-01", "2024-02", "2024-03"]);
    }

    #[test]
    fn last_months_cross_year() {
        let keys = last_n_month_keys(date(2024, 1, 31), 2);
        assert_eq!(keys, vec![key("2023-12"), key("2024-01")]);
        assert!(last_n_month_keys(date(2024, 1, 31), 0).is_empty());
    }

    #[test]
    fn next_month_rolls_over_december() {
        assert_eq!(next_month_key(date(2024, 12, 31)), key("2025-01"));
        assert_eq!(next_month_key(date(2024, 1, 31)), key("2024-02"));
    }

    #[test]
    fn month_key_serializes_as_string() {
        let json = serde_json::to_string(&key("2024-07")).unwrap();
        assert_eq!(json, "\"2024-07\"");
        let back: MonthKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key("2024-07"));
    }
}
