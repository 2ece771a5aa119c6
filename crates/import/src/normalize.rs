//! Locale-aware parsing of the date and amount encodings found in
//! spreadsheet exports.

use chrono::{Duration, NaiveDate};
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::row::Cell;

/// Serial 60 is the phantom 1900-02-29 spreadsheets inherited from Lotus 1-2-3.
const PHANTOM_LEAP_DAY: i64 = 60;
/// Largest serial spreadsheets accept (9999-12-31).
const MAX_SERIAL: f64 = 2_958_465.0;

const CURRENCY_SYMBOLS: &[&str] = &["R$", "US$", "$", "€", "£"];

fn serial_text() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+(\.\d+)?$").expect("valid regex"))
}

/// Normalizes a date cell: numbers, and text made only of digits, are
/// spreadsheet serial day counts; other text must be `D/M/Y`. Anything else
/// yields `None`.
pub fn normalize_date(input: &Cell) -> Option<NaiveDate> {
    match input {
        Cell::Number(serial) => date_from_serial(*serial),
        Cell::Text(s) => {
            let s = s.trim();
            if serial_text().is_match(s) {
                date_from_serial(s.parse().ok()?)
            } else {
                parse_day_month_year(s)
            }
        }
        Cell::Empty => None,
    }
}

/// Converts a spreadsheet serial day count to a calendar date, dropping any
/// time-of-day fraction.
pub fn date_from_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 || serial > MAX_SERIAL {
        return None;
    }
    let days = serial.floor() as i64;
    if days == PHANTOM_LEAP_DAY {
        return None;
    }
    // Serials after the phantom leap day are one ahead of the real calendar.
    let epoch = if days < PHANTOM_LEAP_DAY {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };
    epoch.checked_add_signed(Duration::days(days))
}

/// Parses `D/M/Y` with any digit lengths. Exactly three numeric parts are
/// required and the result must be a real calendar day.
pub fn parse_day_month_year(s: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = s.trim().split('/').collect();
    let [day, month, year] = parts.as_slice() else {
        return None;
    };
    let day: u32 = day.trim().parse().ok()?;
    let month: u32 = month.trim().parse().ok()?;
    let year: i32 = year.trim().parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parses a locale-formatted amount such as `R$ 1.234,56` or `-45,90`.
///
/// `.` is a thousands separator and `,` the decimal mark. Returns `None`
/// when what remains after stripping the symbol is not a number.
pub fn normalize_amount(input: &str) -> Option<Decimal> {
    let mut s = input.trim();
    let mut negative = false;

    if let Some(rest) = s.strip_prefix('-') {
        negative = true;
        s = rest.trim_start();
    }
    s = strip_currency_symbol(s);
    if let Some(rest) = s.strip_prefix('-') {
        negative = !negative;
        s = rest.trim_start();
    }

    if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',') {
        return None;
    }

    let canonical = s.replace('.', "").replacen(',', ".", 1);
    let value = Decimal::from_str(&canonical).ok()?;
    Some(if negative { -value } else { value })
}

fn strip_currency_symbol(s: &str) -> &str {
    for symbol in CURRENCY_SYMBOLS {
        if let Some(rest) = s.strip_prefix(symbol) {
            return rest.trim();
        }
        if let Some(rest) = s.strip_suffix(symbol) {
            return rest.trim();
        }
    }
    s
}
