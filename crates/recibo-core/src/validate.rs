//! Pure input validation for the identity flow.
//!
//! Error display strings are user-facing — the dialogue engine embeds them
//! verbatim in its re-prompts.

use chrono::{Datelike, NaiveDate, Utc};
use thiserror::Error;

/// National-id format rejection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    #[error("La cédula solo debe contener números")]
    NoDigits,
}

/// Issue-date rejection, calendar-aware.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    #[error("El formato debe ser DD/MM/AAAA (ejemplo: 15/03/1990)")]
    Format,
    #[error("El año debe estar entre 1900 y {0}")]
    YearRange(i32),
    #[error("El mes debe estar entre 1 y 12")]
    MonthRange,
    #[error("El día {day} no es válido para el mes {month}")]
    DayOfMonth { day: u32, month: u32 },
}

/// Strip non-digits from a candidate national id.
///
/// Valid iff at least one digit remains; no length bound beyond that.
pub fn normalize_national_id(input: &str) -> Result<String, IdError> {
    let digits: String = input.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return Err(IdError::NoDigits);
    }
    Ok(digits)
}

/// Parse a `DD/MM/YYYY` issue date with calendar and leap-year checks.
///
/// Year is bounded to `[1900, current year]`.
pub fn parse_issue_date(input: &str) -> Result<NaiveDate, DateError> {
    let parts: Vec<&str> = input.trim().split('/').collect();
    if parts.len() != 3 {
        return Err(DateError::Format);
    }

    let day = parse_component(parts[0], 2)?;
    let month = parse_component(parts[1], 2)?;
    let year = if parts[2].len() == 4 {
        parts[2].parse::<i32>().map_err(|_| DateError::Format)?
    } else {
        return Err(DateError::Format);
    };

    let current_year = Utc::now().year();
    if !(1900..=current_year).contains(&year) {
        return Err(DateError::YearRange(current_year));
    }
    if !(1..=12).contains(&month) {
        return Err(DateError::MonthRange);
    }
    if day < 1 || day > days_in_month(year, month) {
        return Err(DateError::DayOfMonth { day, month });
    }

    NaiveDate::from_ymd_opt(year, month, day).ok_or(DateError::DayOfMonth { day, month })
}

fn parse_component(s: &str, max_len: usize) -> Result<u32, DateError> {
    if s.is_empty() || s.len() > max_len || !s.chars().all(|c| c.is_ascii_digit()) {
        return Err(DateError::Format);
    }
    s.parse().map_err(|_| DateError::Format)
}

/// Gregorian leap-year rule.
pub fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// Days in a month, leap-aware. `month` must be in [1, 12].
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 0,
    }
}
