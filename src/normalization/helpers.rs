// src/normalization/helpers.rs - Field-level cleanup that needs no reference data
use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

pub const MIN_AGE: i64 = 1;
pub const MAX_AGE: i64 = 120;
pub const SUMMARY_MAX_CHARS: usize = 1000;
pub const TRUNCATION_MARKER: &str = "[... truncated]";

const DATE_FORMATS: [&str; 12] = [
    "%Y-%m-%d",
    "%d-%m-%Y",
    "%d/%m/%Y",
    "%d.%m.%Y",
    "%Y/%m/%d",
    "%d %m %Y",
    "%d %b %Y",
    "%d %B %Y",
    "%d-%b-%Y",
    "%b %d %Y",
    "%B %d %Y",
    "%d %B, %Y",
];

const INSTITUTION_INDICATORS: [&str; 9] = [
    "university",
    "college",
    "institute",
    "school",
    "department",
    "faculty",
    "academy",
    "campus",
    "hospital",
];

static ORDINAL_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2})(st|nd|rd|th)\b").expect("valid ordinal regex"));
static DATE_NOISE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[,\s]+").expect("valid date noise regex"));
static FIRST_INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{1,3}").expect("valid integer regex"));
static TWELVE_HOUR_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})(?:[:.](\d{2}))?\s*([ap])\.?\s*m\b\.?").expect("valid 12h regex")
});
static TWENTY_FOUR_HOUR_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,2})[:.\-](\d{2})(?:[:.](\d{2}))?\b").expect("valid 24h regex")
});
static HEIGHT_FORMATTED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d+ft\s+\d+in\s*\(\s*\d+\s*cms?\s*\)$").expect("valid height regex")
});
static HEIGHT_FEET_INCHES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(\d)\s*(?:ft|feet|foot|')\s*(\d{1,2})?\s*(?:in|inch|inches|")?"#)
        .expect("valid feet regex")
});
static HEIGHT_CM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d{2,3})(?:\.\d+)?\s*(?:cm|cms|centimet(?:er|re)s?)\b").expect("valid cm regex")
});
static HEIGHT_DOTTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d)[.\-\s](\d{1,2})$").expect("valid dotted height regex"));
static UNIT_GAP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d)\s+(ft|in|cms?)\b").expect("valid unit gap regex"));
static SECTION_RULE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*[*\-_=]{3,}\s*").expect("valid rule regex"));

/// Trims and collapses internal whitespace. Blank input is `None`.
pub fn clean_str(value: &str) -> Option<String> {
    let cleaned = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Splits a full name into (first, last). Supports "Last, First" ordering;
/// otherwise the first token is the given name and the final token the
/// surname. Single tokens have no surname.
pub fn parse_name(full_name: &str) -> (Option<String>, Option<String>) {
    let Some(name) = clean_str(full_name) else {
        return (None, None);
    };
    if let Some((last, first)) = name.split_once(',') {
        return (clean_str(first), clean_str(last));
    }
    let tokens: Vec<&str> = name.split(' ').collect();
    match tokens.as_slice() {
        [] => (None, None),
        [only] => (Some(only.to_string()), None),
        [first, .., last] => (Some(first.to_string()), Some(last.to_string())),
    }
}

/// Parses the common written date forms to ISO `YYYY-MM-DD`. Numeric forms are
/// read day-first.
pub fn normalize_date(raw: &str) -> Option<NaiveDate> {
    let text = clean_str(raw)?;
    let text = ORDINAL_SUFFIX.replace_all(&text, "$1");
    let variants = [text.to_string(), DATE_NOISE.replace_all(&text, " ").trim().to_string()];
    for candidate in variants.iter() {
        for format in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(candidate, format) {
                return Some(date);
            }
        }
    }
    None
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Whole years between `dob` and `today`, if within the plausible range.
pub fn age_from_dob(dob: NaiveDate, today: NaiveDate) -> Option<i64> {
    let mut age = i64::from(today.year() - dob.year());
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        age -= 1;
    }
    (MIN_AGE..=MAX_AGE).contains(&age).then_some(age)
}

/// First integer in the text, kept only within the plausible range.
pub fn normalize_age(raw: &str) -> Option<i64> {
    let m = FIRST_INTEGER.find(raw)?;
    let age: i64 = m.as_str().parse().ok()?;
    (MIN_AGE..=MAX_AGE).contains(&age).then_some(age)
}

/// Renders recognizable times as `h:MM AM`. Unrecognized text is `None`.
pub fn normalize_birth_time(raw: &str) -> Option<String> {
    if let Some(caps) = TWELVE_HOUR_TIME.captures(raw) {
        let hour: u32 = caps[1].parse().ok()?;
        let minute: u32 = caps.get(2).map_or(Some(0), |m| m.as_str().parse().ok())?;
        if !(1..=12).contains(&hour) || minute > 59 {
            return None;
        }
        let meridiem = if caps[3].eq_ignore_ascii_case("a") { "AM" } else { "PM" };
        return Some(format!("{}:{:02} {}", hour, minute, meridiem));
    }
    let caps = TWENTY_FOUR_HOUR_TIME.captures(raw)?;
    let hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps[2].parse().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    let (display, meridiem) = match hour {
        0 => (12, "AM"),
        1..=11 => (hour, "AM"),
        12 => (12, "PM"),
        _ => (hour - 12, "PM"),
    };
    Some(format!("{}:{:02} {}", display, minute, meridiem))
}

/// Lowercased height text with unit spellings folded to `ft` / `in`.
pub fn normalize_height_key(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let folded = lowered
        .replace("inches", "in")
        .replace("inch", "in")
        .replace("feet", "ft")
        .replace("foot", "ft")
        .replace('\'', "ft ")
        .replace('"', "in");
    let collapsed = folded.split_whitespace().collect::<Vec<_>>().join(" ");
    UNIT_GAP.replace_all(&collapsed, "${1}${2}").into_owned()
}

fn render_height(feet: u32, inches: u32) -> Option<String> {
    if !(3..=8).contains(&feet) || inches > 11 {
        return None;
    }
    let total_inches = feet * 12 + inches;
    let cms = (f64::from(total_inches) * 2.54).round() as u32;
    Some(format!("{}ft {}in ({} cms)", feet, inches, cms))
}

/// Renders a height as `Xft Yin (N cms)` from feet/inches, centimetres, or a
/// dotted `5.6` form. Unrecognized input is `None`.
pub fn normalize_height_format(raw: &str) -> Option<String> {
    let text = clean_str(raw)?;
    if HEIGHT_FORMATTED.is_match(&text) {
        return Some(text);
    }
    if let Some(caps) = HEIGHT_FEET_INCHES.captures(&text) {
        let feet: u32 = caps[1].parse().ok()?;
        let inches: u32 = caps.get(2).map_or(Some(0), |m| m.as_str().parse().ok())?;
        return render_height(feet, inches);
    }
    if let Some(caps) = HEIGHT_CM.captures(&text) {
        let cms: f64 = caps[1].parse().ok()?;
        if !(100.0..=250.0).contains(&cms) {
            return None;
        }
        let total_inches = (cms / 2.54).round() as u32;
        return render_height(total_inches / 12, total_inches % 12);
    }
    if let Some(caps) = HEIGHT_DOTTED.captures(&text) {
        let feet: u32 = caps[1].parse().ok()?;
        let inches: u32 = caps[2].parse().ok()?;
        return render_height(feet, inches);
    }
    None
}

/// True when a master height entry and a raw height agree: equal after
/// folding, or one is the other followed by more detail.
pub fn height_keys_agree(master: &str, raw: &str) -> bool {
    let (m, r) = (normalize_height_key(master), normalize_height_key(raw));
    if m.is_empty() || r.is_empty() {
        return false;
    }
    let extends = |long: &str, short: &str| {
        long.strip_prefix(short)
            .map_or(false, |rest| rest.starts_with(' ') || rest.starts_with('('))
    };
    m == r || extends(&m, &r) || extends(&r, &m)
}

/// Flags state/region text that names an institution or carries list
/// separators.
pub fn is_institution_like(value: &str) -> bool {
    let lowered = value.to_lowercase();
    INSTITUTION_INDICATORS.iter().any(|w| lowered.contains(w))
        || value.contains(',')
        || value.contains(';')
}

/// Cleans free text for the summary field: section rules become line breaks,
/// blank lines are dropped, and text past the cap is cut at the last line
/// break and marked.
pub fn summarize_about_yourself(raw: &str) -> Option<String> {
    let broken = SECTION_RULE.replace_all(raw, "\n");
    let lines: Vec<String> = broken.lines().filter_map(clean_str).collect();
    if lines.is_empty() {
        return None;
    }
    let text = lines.join("\n");
    if text.chars().count() <= SUMMARY_MAX_CHARS {
        return Some(text);
    }
    let capped: String = text.chars().take(SUMMARY_MAX_CHARS).collect();
    let kept = match capped.rfind('\n') {
        Some(idx) if idx > 0 => &capped[..idx],
        _ => capped.as_str(),
    };
    Some(format!("{}\n{}", kept.trim_end(), TRUNCATION_MARKER))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_str() {
        assert_eq!(clean_str("  Priya   Sharma \n").as_deref(), Some("Priya Sharma"));
        assert_eq!(clean_str(" \t "), None);
    }

    #[test]
    fn test_parse_name_forms() {
        assert_eq!(
            parse_name("Priya Sharma"),
            (Some("Priya".into()), Some("Sharma".into()))
        );
        assert_eq!(
            parse_name("Sharma, Priya"),
            (Some("Priya".into()), Some("Sharma".into()))
        );
        assert_eq!(
            parse_name("Priya Kumari Sharma"),
            (Some("Priya".into()), Some("Sharma".into()))
        );
        assert_eq!(parse_name("Priya"), (Some("Priya".into()), None));
        assert_eq!(parse_name("  "), (None, None));
    }

    #[test]
    fn test_normalize_date_formats() {
        let expected = NaiveDate::from_ymd_opt(1995, 3, 12).unwrap();
        for raw in ["1995-03-12", "12-03-1995", "12/03/1995", "12.03.1995", "12 Mar 1995", "12th March, 1995", "March 12, 1995"] {
            assert_eq!(normalize_date(raw), Some(expected), "{}", raw);
        }
        assert_eq!(normalize_date("sometime in 95"), None);
        assert_eq!(normalize_date("31/02/1995"), None);
    }

    #[test]
    fn test_age_from_dob() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 11).unwrap();
        let dob = NaiveDate::from_ymd_opt(1995, 3, 12).unwrap();
        assert_eq!(age_from_dob(dob, today), Some(28));
        let future = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        assert_eq!(age_from_dob(future, today), None);
    }

    #[test]
    fn test_normalize_age_range() {
        assert_eq!(normalize_age("28 years"), Some(28));
        assert_eq!(normalize_age("0"), None);
        assert_eq!(normalize_age("150"), None);
        assert_eq!(normalize_age("unknown"), None);
    }

    #[test]
    fn test_birth_time_forms() {
        assert_eq!(normalize_birth_time("14:35").as_deref(), Some("2:35 PM"));
        assert_eq!(normalize_birth_time("00:05").as_deref(), Some("12:05 AM"));
        assert_eq!(normalize_birth_time("2:30 PM").as_deref(), Some("2:30 PM"));
        assert_eq!(normalize_birth_time("6 a.m.").as_deref(), Some("6:00 AM"));
        assert_eq!(normalize_birth_time("25:10"), None);
        assert_eq!(normalize_birth_time("morning"), None);
    }

    #[test]
    fn test_height_formats() {
        assert_eq!(normalize_height_format("5'6\"").as_deref(), Some("5ft 6in (168 cms)"));
        assert_eq!(normalize_height_format("5 feet 2 inches").as_deref(), Some("5ft 2in (157 cms)"));
        assert_eq!(normalize_height_format("170 cm").as_deref(), Some("5ft 7in (170 cms)"));
        assert_eq!(normalize_height_format("5.4").as_deref(), Some("5ft 4in (163 cms)"));
        assert_eq!(normalize_height_format("5ft 4in (163 cms)").as_deref(), Some("5ft 4in (163 cms)"));
        assert_eq!(normalize_height_format("tall"), None);
    }

    #[test]
    fn test_height_keys_agree_on_boundaries() {
        assert!(height_keys_agree("5ft 1in (155 cms)", "5 feet 1 inch"));
        assert!(!height_keys_agree("5ft 11in (180 cms)", "5ft 1in"));
        assert!(height_keys_agree("5ft 4in", "5ft 4in (163 cms)"));
    }

    #[test]
    fn test_institution_like() {
        assert!(is_institution_like("Central University of Rajasthan"));
        assert!(is_institution_like("Jaipur, Rajasthan"));
        assert!(!is_institution_like("Rajasthan"));
    }

    #[test]
    fn test_summary_cleanup_and_truncation() {
        let text = summarize_about_yourself("Loves music.  \n\n*****\nWorks in Pune").unwrap();
        assert_eq!(text, "Loves music.\nWorks in Pune");

        let long = format!("{}\n{}", "a".repeat(600), "b".repeat(600));
        let summary = summarize_about_yourself(&long).unwrap();
        assert!(summary.ends_with(TRUNCATION_MARKER));
        assert!(!summary.contains('b'));
        assert_eq!(summarize_about_yourself(" \n "), None);
    }
}
