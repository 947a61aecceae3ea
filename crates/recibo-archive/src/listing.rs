//! Parsing of Unix-style `LIST` lines.
//!
//! The archive server prints the classic nine-column format:
//!
//! ```text
//! -rw-r--r-- 1 ftp ftp 48213 Sep  4 11:02 recibo_1001234567.pdf
//! ```
//!
//! A recent file shows `HH:MM` in the eighth column and omits the year;
//! an older one shows the year and omits the time.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Utc};

/// One file entry recovered from a `LIST` line.
#[derive(Debug, Clone, PartialEq)]
pub struct ListEntry {
    pub name: String,
    pub size: Option<u64>,
    pub modified: Option<DateTime<Utc>>,
}

/// Parse a single `LIST` line. Directories and malformed lines yield `None`.
pub fn parse_list_line(line: &str) -> Option<ListEntry> {
    parse_list_line_at(line, Utc::now())
}

fn parse_list_line_at(line: &str, now: DateTime<Utc>) -> Option<ListEntry> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 9 || parts[0].starts_with('d') {
        return None;
    }

    // Filenames may contain spaces; everything past the date is the name.
    let name = parts[8..].join(" ");
    let size = parts[4].parse::<u64>().ok();
    let modified = parse_modified(parts[5], parts[6], parts[7], now);

    Some(ListEntry {
        name,
        size,
        modified,
    })
}

fn month_number(name: &str) -> Option<u32> {
    let n = match name {
        "Jan" => 1,
        "Feb" => 2,
        "Mar" => 3,
        "Apr" => 4,
        "May" => 5,
        "Jun" => 6,
        "Jul" => 7,
        "Aug" => 8,
        "Sep" => 9,
        "Oct" => 10,
        "Nov" => 11,
        "Dec" => 12,
        _ => return None,
    };
    Some(n)
}

/// Interpret the three date columns. When the server prints a time instead
/// of a year the file is from the last twelve months; assume the current
/// year and roll back one if that lands in the future.
fn parse_modified(month: &str, day: &str, tail: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let month = month_number(month)?;
    let day: u32 = day.parse().ok()?;

    let naive: NaiveDateTime = if let Some((h, m)) = tail.split_once(':') {
        let hour: u32 = h.parse().ok()?;
        let minute: u32 = m.parse().ok()?;
        let date = NaiveDate::from_ymd_opt(now.year(), month, day)?;
        let time = NaiveTime::from_hms_opt(hour, minute, 0)?;

        let candidate = date.and_time(time);
        if candidate > now.naive_utc() {
            NaiveDate::from_ymd_opt(now.year() - 1, month, day)?.and_time(time)
        } else {
            candidate
        }
    } else {
        let year: i32 = tail.parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)?.and_time(NaiveTime::MIN)
    };

    Some(naive.and_utc())
}
