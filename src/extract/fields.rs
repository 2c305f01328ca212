use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use super::text::clean;

static FRACTION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)(?:\s+of\s+(\d+))?").expect("fraction pattern"));
static PERCENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)%").expect("percent pattern"));
static CLOCK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+):(\d+)").expect("clock pattern"));
static SCHEDULE_DAY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([A-Za-z]{3})\s+(\d{1,2})").expect("schedule date pattern"));

const MONTHS: [&str; 12] = ["jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec"];

/// `"96 of 119"` → `(96, 119)`, bare `"96"` → `(96, 96)`, anything else → `(0, 0)`.
pub fn parse_fraction(s: &str) -> (u32, u32) {
    let s = s.trim();
    if s.is_empty() || s == "---" { return (0, 0); }
    let Some(caps) = FRACTION.captures(s) else { return (0, 0) };
    let landed = caps.get(1).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
    let attempted = caps.get(2).and_then(|m| m.as_str().parse().ok()).unwrap_or(landed);
    (landed, attempted)
}

/// Integer in front of a literal `%`, else 0.
pub fn parse_percentage(s: &str) -> u32 {
    PERCENT
        .captures(s.trim())
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// `"MM:SS"` → total seconds; placeholders and junk → 0.
pub fn parse_time_control(s: &str) -> u32 {
    let s = s.trim();
    if matches!(s, "" | "---" | "0:00") { return 0; }
    let Some(caps) = CLOCK.captures(s) else { return 0 };
    let minutes: u32 = caps[1].parse().unwrap_or(0);
    let seconds: u32 = caps[2].parse().unwrap_or(0);
    minutes.checked_mul(60).and_then(|m| m.checked_add(seconds)).unwrap_or(0)
}

/// Small non-negative counters such as knockdowns; non-digits → 0.
pub fn parse_count(s: &str) -> u32 {
    let s = s.trim();
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) { return 0; }
    s.parse().unwrap_or(0)
}

/// Career averages like `"4.21"`; empty or malformed → 0.0.
pub fn parse_decimal(s: &str) -> f64 {
    s.trim().parse().unwrap_or(0.0)
}

/// `"Sep 28"` + 2024 → `"2024-09-28"`.
///
/// Anything that doesn't look like a month abbreviation and a real day of that
/// month in `year` is returned cleaned and otherwise untouched.
pub fn parse_schedule_date(s: &str, year: i32) -> String {
    let fallback = || clean(s);
    let Some(caps) = SCHEDULE_DAY.captures(s.trim()) else { return fallback() };
    let mon = caps[1].to_lowercase();
    let Some(month) = MONTHS.iter().position(|m| *m == mon) else { return fallback() };
    let Ok(day) = caps[2].parse::<u32>() else { return fallback() };
    match NaiveDate::from_ymd_opt(year, month as u32 + 1, day) {
        Some(d) => d.format("%Y-%m-%d").to_string(),
        None => fallback(),
    }
}
