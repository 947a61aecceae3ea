//! Owner-id recovery from receipt filenames.
//!
//! Payroll exports embed the employee's national id somewhere in the
//! filename, surrounded by arbitrary separators, dates, and timestamps.
//! The extractor pulls every digit run out of the name, discards runs
//! that are clearly dates or times, and keeps the most id-shaped survivor.

use chrono::NaiveDate;

/// Digit-run lengths that can plausibly be a national id.
const MIN_ID_LEN: usize = 6;
const MAX_ID_LEN: usize = 12;

/// Recover the owner's national id from a filename, if one can be resolved.
pub fn owner_id_from_filename(filename: &str) -> Option<String> {
    let mut candidates: Vec<&str> = Vec::new();

    let bytes = filename.as_bytes();
    let mut start = None;
    for (i, b) in bytes.iter().enumerate() {
        match (b.is_ascii_digit(), start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                candidates.push(&filename[s..i]);
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        candidates.push(&filename[s..]);
    }

    candidates.retain(|run| {
        run.len() >= MIN_ID_LEN
            && run.len() <= MAX_ID_LEN
            && !is_compact_date(run)
            && !is_compact_time(run)
    });

    // Ids are most often 8-10 digits; prefer the longest in that band,
    // then fall back to the longest run of any surviving length.
    candidates
        .iter()
        .filter(|run| (8..=10).contains(&run.len()))
        .max_by_key(|run| run.len())
        .or_else(|| candidates.iter().max_by_key(|run| run.len()))
        .map(|run| run.to_string())
}

/// `YYYYMMDD` with a real calendar date and a sane year.
fn is_compact_date(run: &str) -> bool {
    if run.len() != 8 {
        return false;
    }
    let (Ok(year), Ok(month), Ok(day)) = (
        run[..4].parse::<i32>(),
        run[4..6].parse::<u32>(),
        run[6..].parse::<u32>(),
    ) else {
        return false;
    };
    (1900..=2100).contains(&year) && NaiveDate::from_ymd_opt(year, month, day).is_some()
}

/// `HHMMSS` wall-clock time.
fn is_compact_time(run: &str) -> bool {
    if run.len() != 6 {
        return false;
    }
    let (Ok(h), Ok(m), Ok(s)) = (
        run[..2].parse::<u32>(),
        run[2..4].parse::<u32>(),
        run[4..].parse::<u32>(),
    ) else {
        return false;
    };
    h < 24 && m < 60 && s < 60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_id() {
        assert_eq!(
            owner_id_from_filename("recibo_1001234567.pdf"),
            Some("1001234567".to_string())
        );
    }

    #[test]
    fn discards_date_keeps_id() {
        assert_eq!(
            owner_id_from_filename("20240515_recibo_1001234567.pdf"),
            Some("1001234567".to_string())
        );
    }

    #[test]
    fn discards_date_and_time() {
        assert_eq!(
            owner_id_from_filename("nomina_20240515_235959_80123456.pdf"),
            Some("80123456".to_string())
        );
    }

    #[test]
    fn invalid_date_is_a_candidate() {
        // 20241399 is 8 digits but not a calendar date, so it stays in play
        // and wins over the shorter run.
        assert_eq!(
            owner_id_from_filename("x_20241399_123456a.pdf"),
            Some("20241399".to_string())
        );
    }

    #[test]
    fn prefers_eight_to_ten_band() {
        // The 12-digit run survives filtering but the 9-digit one is
        // more id-shaped.
        assert_eq!(
            owner_id_from_filename("ref123456789012_id123456789.pdf"),
            Some("123456789".to_string())
        );
    }

    #[test]
    fn falls_back_to_longest() {
        // No run in [8, 10]: longest survivor wins.
        assert_eq!(
            owner_id_from_filename("a654321_b123456789012.pdf"),
            Some("123456789012".to_string())
        );
    }

    #[test]
    fn too_short_or_long_runs_unresolved() {
        assert_eq!(owner_id_from_filename("recibo_12345.pdf"), None);
        assert_eq!(owner_id_from_filename("recibo_1234567890123.pdf"), None);
        assert_eq!(owner_id_from_filename("recibo.pdf"), None);
    }

    #[test]
    fn valid_time_discarded() {
        // 235959 is a valid HHMMSS; 256161 is not, so it survives.
        assert_eq!(owner_id_from_filename("t235959.pdf"), None);
        assert_eq!(
            owner_id_from_filename("t256161.pdf"),
            Some("256161".to_string())
        );
    }
}
