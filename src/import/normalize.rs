//! Field normalizers for the legacy dump.
//!
//! Each normalizer takes one raw nullable cell and returns the normalized
//! value together with any repair notes, or a [`FieldRejection`] for the
//! small fatal whitelist (a required identity field that is entirely
//! absent). Normalizers are pure and idempotent: feeding one its own output
//! yields zero additional repairs.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use super::rows::{key_or_zero, Sex};

static DURATION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2}):(\d{2})(?::(\d{2}))?$").expect("valid duration pattern")
});

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~.-]+@[A-Za-z0-9]([A-Za-z0-9-]*[A-Za-z0-9])?(\.[A-Za-z0-9]([A-Za-z0-9-]*[A-Za-z0-9])?)+$")
        .expect("valid email pattern")
});

/// Earliest visit date the legacy application could produce; anything older
/// is a transcription artifact.
const MIN_PLAUSIBLE_YEAR: i32 = 1900;

const MAX_EMAIL_LEN: usize = 200;
const MAX_PHONE_DIGITS: usize = 10;
const MAX_POSTCODE: i64 = 9999;

/// A normalized value plus the repairs it took to get there.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized<T> {
    pub value: T,
    pub repairs: Vec<String>,
}

impl<T> Normalized<T> {
    pub fn clean(value: T) -> Self {
        Self {
            value,
            repairs: Vec::new(),
        }
    }

    pub fn repaired(value: T, note: impl Into<String>) -> Self {
        Self {
            value,
            repairs: vec![note.into()],
        }
    }

    pub fn is_clean(&self) -> bool {
        self.repairs.is_empty()
    }
}

/// A required field was entirely absent; the record cannot be imported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct FieldRejection {
    pub field: &'static str,
    pub reason: &'static str,
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|text| !text.is_empty())
}

fn truncate_chars(text: &str, max_len: usize) -> String {
    text.chars().take(max_len).collect()
}

/// Identity fields: must be present, truncates to the destination width.
pub fn required_text(
    field: &'static str,
    raw: Option<&str>,
    max_len: usize,
) -> Result<Normalized<String>, FieldRejection> {
    let text = non_empty(raw).ok_or(FieldRejection {
        field,
        reason: "required value is missing",
    })?;
    if text.chars().count() > max_len {
        Ok(Normalized::repaired(
            truncate_chars(text, max_len),
            format!("{field} truncated to {max_len} characters"),
        ))
    } else {
        Ok(Normalized::clean(text.to_string()))
    }
}

pub fn optional_text(
    field: &'static str,
    raw: Option<&str>,
    max_len: usize,
) -> Normalized<Option<String>> {
    let Some(text) = non_empty(raw) else {
        return Normalized::clean(None);
    };
    if text.chars().count() > max_len {
        Normalized::repaired(
            Some(truncate_chars(text, max_len)),
            format!("{field} truncated to {max_len} characters"),
        )
    } else {
        Normalized::clean(Some(text.to_string()))
    }
}

/// Dates never cause a skip: the MySQL sentinel zero date and anything
/// unparsable both normalize to null.
pub fn date(field: &'static str, raw: Option<&str>) -> Normalized<Option<NaiveDate>> {
    let Some(text) = non_empty(raw) else {
        return Normalized::clean(None);
    };
    if text == "0000-00-00" || text == "0000-00-00 00:00:00" {
        return Normalized::repaired(None, format!("sentinel zero date in {field} cleared"));
    }
    let parsed = NaiveDate::parse_from_str(text, "%Y-%m-%d").or_else(|_| {
        NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").map(|dt| dt.date())
    });
    match parsed {
        Ok(value) if value.year() >= MIN_PLAUSIBLE_YEAR => Normalized::clean(Some(value)),
        Ok(value) => Normalized::repaired(
            None,
            format!("implausible date \"{value}\" in {field} cleared"),
        ),
        Err(_) => Normalized::repaired(
            None,
            format!("unparsable date \"{text}\" in {field} cleared"),
        ),
    }
}

/// Grooming durations: `HH:MM[:SS]` passes through, a bare integer is read
/// as a minute count, everything else clears to null.
pub fn duration(field: &'static str, raw: Option<&str>) -> Normalized<Option<NaiveTime>> {
    let Some(text) = non_empty(raw) else {
        return Normalized::clean(None);
    };

    if let Some(captures) = DURATION_PATTERN.captures(text) {
        let hours: u32 = captures[1].parse().unwrap_or(u32::MAX);
        let minutes: u32 = captures[2].parse().unwrap_or(u32::MAX);
        let seconds: u32 = captures
            .get(3)
            .map(|m| m.as_str().parse().unwrap_or(u32::MAX))
            .unwrap_or(0);
        return match NaiveTime::from_hms_opt(hours, minutes, seconds) {
            Some(value) => Normalized::clean(Some(value)),
            None => Normalized::repaired(
                None,
                format!("{field} \"{text}\" out of range, cleared"),
            ),
        };
    }

    if let Ok(minutes) = text.parse::<u32>() {
        return match NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0) {
            Some(value) => Normalized::repaired(
                Some(value),
                format!("{field} \"{text}\" interpreted as {minutes} minutes"),
            ),
            None => Normalized::repaired(
                None,
                format!("{field} \"{text}\" out of range, cleared"),
            ),
        };
    }

    Normalized::repaired(None, format!("unparsable {field} \"{text}\" cleared"))
}

/// Phones reduce to bare digits; placeholder values clear to null.
pub fn phone(field: &'static str, raw: Option<&str>) -> Normalized<Option<String>> {
    let Some(text) = non_empty(raw) else {
        return Normalized::clean(None);
    };
    if text.eq_ignore_ascii_case("unknown") {
        return Normalized::repaired(None, format!("{field} placeholder \"{text}\" cleared"));
    }

    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() || digits == "0" {
        return Normalized::repaired(
            None,
            format!("{field} \"{text}\" has no usable digits, cleared"),
        );
    }

    let mut repairs = Vec::new();
    if digits != text {
        repairs.push(format!("non-digit characters stripped from {field}"));
    }
    let mut value = digits;
    if value.len() > MAX_PHONE_DIGITS {
        value.truncate(MAX_PHONE_DIGITS);
        repairs.push(format!("{field} truncated to {MAX_PHONE_DIGITS} digits"));
    }
    Normalized { value: Some(value), repairs }
}

/// Strict ASCII email check; an invalid address clears to null rather than
/// blocking the record.
pub fn email(field: &'static str, raw: Option<&str>) -> Normalized<Option<String>> {
    let Some(text) = non_empty(raw) else {
        return Normalized::clean(None);
    };
    if !EMAIL_PATTERN.is_match(text) {
        return Normalized::repaired(None, format!("invalid email \"{text}\" cleared"));
    }
    if text.len() > MAX_EMAIL_LEN {
        return Normalized::repaired(
            Some(text[..MAX_EMAIL_LEN].to_string()),
            format!("{field} truncated to {MAX_EMAIL_LEN} characters"),
        );
    }
    Normalized::clean(Some(text.to_string()))
}

/// Costs: negative clamps to 0, fractional floors, garbage defaults to 0.
pub fn non_negative(field: &'static str, raw: Option<&str>) -> Normalized<Option<i64>> {
    let Some(text) = non_empty(raw) else {
        return Normalized::clean(None);
    };
    if let Ok(value) = text.parse::<i64>() {
        return if value < 0 {
            Normalized::repaired(Some(0), format!("negative {field} {value} clamped to 0"))
        } else {
            Normalized::clean(Some(value))
        };
    }
    if let Ok(value) = text.parse::<f64>() {
        let floored = value.floor() as i64;
        return if floored < 0 {
            Normalized::repaired(Some(0), format!("negative {field} {text} clamped to 0"))
        } else {
            Normalized::repaired(
                Some(floored),
                format!("fractional {field} \"{text}\" floored to {floored}"),
            )
        };
    }
    Normalized::repaired(
        Some(0),
        format!("non-numeric {field} \"{text}\" defaulted to 0"),
    )
}

/// Postcodes must land in 0-9999 once stripped to digits.
pub fn postcode(field: &'static str, raw: Option<&str>) -> Normalized<Option<i64>> {
    let Some(text) = non_empty(raw) else {
        return Normalized::clean(None);
    };
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return Normalized::repaired(
            None,
            format!("non-numeric {field} \"{text}\" cleared"),
        );
    }
    let value = match digits.parse::<i64>() {
        Ok(value) if value <= MAX_POSTCODE => value,
        _ => {
            return Normalized::repaired(
                None,
                format!("{field} \"{text}\" outside 0-{MAX_POSTCODE}, cleared"),
            );
        }
    };
    if digits != text {
        Normalized::repaired(
            Some(value),
            format!("non-digit characters stripped from {field}"),
        )
    } else {
        Normalized::clean(Some(value))
    }
}

/// Sex maps case-insensitively onto {Male, Female}; anything else falls back
/// to Male with a note rather than blocking the record.
pub fn sex(raw: Option<&str>) -> Normalized<Sex> {
    let Some(text) = non_empty(raw) else {
        return Normalized::repaired(Sex::Male, "missing SEX defaulted to Male");
    };
    match text.to_ascii_lowercase().as_str() {
        "male" | "m" => Normalized::clean(Sex::Male),
        "female" | "f" => Normalized::clean(Sex::Female),
        _ => Normalized::repaired(
            Sex::Male,
            format!("unrecognized SEX \"{text}\" defaulted to Male"),
        ),
    }
}

/// Preserved-key import cannot mint identifiers, so a missing or garbled
/// primary key rejects the record outright.
pub fn primary_key(field: &'static str, raw: Option<&str>) -> Result<i64, FieldRejection> {
    match key_or_zero(raw) {
        0 => Err(FieldRejection {
            field,
            reason: "missing or invalid primary key",
        }),
        id => Ok(id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_text_rejects_absent_values() {
        assert!(required_text("breedname", None, 30).is_err());
        assert!(required_text("breedname", Some("   "), 30).is_err());
        let ok = required_text("breedname", Some("Poodle"), 30).unwrap();
        assert_eq!(ok.value, "Poodle");
        assert!(ok.is_clean());
    }

    #[test]
    fn required_text_truncates_long_values() {
        let long = "x".repeat(40);
        let out = required_text("breedname", Some(&long), 30).unwrap();
        assert_eq!(out.value.len(), 30);
        assert_eq!(out.repairs, vec!["breedname truncated to 30 characters"]);
    }

    #[test]
    fn sentinel_zero_date_clears_to_null() {
        for raw in ["0000-00-00", "0000-00-00 00:00:00"] {
            let out = date("lastvisit", Some(raw));
            assert_eq!(out.value, None);
            assert_eq!(out.repairs.len(), 1, "sentinel must leave a repair note");
        }
    }

    #[test]
    fn dates_parse_plain_and_datetime_forms() {
        let plain = date("lastvisit", Some("2019-03-07"));
        assert_eq!(plain.value, NaiveDate::from_ymd_opt(2019, 3, 7));
        assert!(plain.is_clean());

        let stamped = date("lastvisit", Some("2019-03-07 14:25:00"));
        assert_eq!(stamped.value, NaiveDate::from_ymd_opt(2019, 3, 7));
    }

    #[test]
    fn garbage_dates_clear_with_note() {
        let out = date("thisvisit", Some("next tuesday"));
        assert_eq!(out.value, None);
        assert!(out.repairs[0].contains("next tuesday"));
    }

    #[test]
    fn pre_1900_dates_are_implausible() {
        let out = date("lastvisit", Some("1742-01-01"));
        assert_eq!(out.value, None);
        assert_eq!(out.repairs.len(), 1);
    }

    #[test]
    fn duration_accepts_clock_form() {
        let out = duration("avgtime", Some("01:30:00"));
        assert_eq!(out.value, NaiveTime::from_hms_opt(1, 30, 0));
        assert!(out.is_clean());

        let short = duration("avgtime", Some("9:05"));
        assert_eq!(short.value, NaiveTime::from_hms_opt(9, 5, 0));
        assert!(short.is_clean());
    }

    #[test]
    fn duration_converts_bare_minutes() {
        let out = duration("avgtime", Some("45"));
        assert_eq!(out.value, NaiveTime::from_hms_opt(0, 45, 0));
        assert_eq!(
            out.repairs,
            vec!["avgtime \"45\" interpreted as 45 minutes"]
        );

        let long = duration("avgtime", Some("90"));
        assert_eq!(long.value, NaiveTime::from_hms_opt(1, 30, 0));
    }

    #[test]
    fn duration_clears_garbage_and_out_of_range() {
        assert_eq!(duration("avgtime", Some("99:99")).value, None);
        assert_eq!(duration("avgtime", Some("soon")).value, None);
        assert_eq!(duration("avgtime", Some("100000")).value, None);
    }

    #[test]
    fn phone_strips_to_digits() {
        let out = phone("phone1", Some("(03) 9555-1234"));
        assert_eq!(out.value.as_deref(), Some("0395551234"));
        assert_eq!(out.repairs.len(), 1);

        let clean = phone("phone1", Some("0395551234"));
        assert!(clean.is_clean());
    }

    #[test]
    fn phone_placeholders_clear() {
        assert_eq!(phone("phone2", Some("unknown")).value, None);
        assert_eq!(phone("phone2", Some("0")).value, None);
        assert_eq!(phone("phone2", Some("n/a")).value, None);
        let empty = phone("phone2", Some(""));
        assert_eq!(empty.value, None);
        assert!(empty.is_clean());
    }

    #[test]
    fn email_validates_strictly() {
        let ok = email("email", Some("sam@example.com"));
        assert_eq!(ok.value.as_deref(), Some("sam@example.com"));
        assert!(ok.is_clean());

        for bad in ["not-an-email", "a@@b.com", "a@b", "a b@c.com"] {
            let out = email("email", Some(bad));
            assert_eq!(out.value, None, "{bad} should clear");
            assert_eq!(out.repairs.len(), 1);
        }
    }

    #[test]
    fn non_negative_clamps_and_defaults() {
        assert_eq!(non_negative("avgcost", Some("35")).value, Some(35));
        let neg = non_negative("avgcost", Some("-10"));
        assert_eq!(neg.value, Some(0));
        assert_eq!(neg.repairs, vec!["negative avgcost -10 clamped to 0"]);
        let junk = non_negative("cost", Some("cheap"));
        assert_eq!(junk.value, Some(0));
        assert_eq!(junk.repairs.len(), 1);
        let frac = non_negative("cost", Some("12.9"));
        assert_eq!(frac.value, Some(12));
    }

    #[test]
    fn postcode_range_and_stripping() {
        assert_eq!(postcode("postcode", Some("3181")).value, Some(3181));
        let stripped = postcode("postcode", Some(" 3181 VIC"));
        assert_eq!(stripped.value, Some(3181));
        assert_eq!(stripped.repairs.len(), 1);
        assert_eq!(postcode("postcode", Some("123456")).value, None);
        assert_eq!(postcode("postcode", Some("none")).value, None);
    }

    #[test]
    fn sex_maps_case_insensitively() {
        assert_eq!(sex(Some("FEMALE")).value, Sex::Female);
        assert_eq!(sex(Some("f")).value, Sex::Female);
        assert_eq!(sex(Some("Male")).value, Sex::Male);
        let odd = sex(Some("yes"));
        assert_eq!(odd.value, Sex::Male);
        assert_eq!(odd.repairs.len(), 1);
        assert_eq!(sex(None).value, Sex::Male);
        assert_eq!(sex(None).repairs.len(), 1);
    }

    #[test]
    fn primary_key_requires_positive_integer() {
        assert_eq!(primary_key("breedID", Some("5")), Ok(5));
        assert!(primary_key("breedID", Some("0")).is_err());
        assert!(primary_key("breedID", Some("five")).is_err());
        assert!(primary_key("breedID", None).is_err());
    }

    /// Re-normalizing a normalizer's own output must be a no-op.
    #[test]
    fn normalizers_are_idempotent() {
        let date_once = date("lastvisit", Some("2019-03-07 14:25:00"));
        let rendered = date_once.value.map(|d| d.format("%Y-%m-%d").to_string());
        let date_twice = date("lastvisit", rendered.as_deref());
        assert_eq!(date_twice.value, date_once.value);
        assert!(date_twice.is_clean());

        let dur_once = duration("avgtime", Some("45"));
        let rendered = dur_once.value.map(|t| t.format("%H:%M:%S").to_string());
        let dur_twice = duration("avgtime", rendered.as_deref());
        assert_eq!(dur_twice.value, dur_once.value);
        assert!(dur_twice.is_clean());

        let phone_once = phone("phone1", Some("(03) 9555-1234"));
        let phone_twice = phone("phone1", phone_once.value.as_deref());
        assert_eq!(phone_twice.value, phone_once.value);
        assert!(phone_twice.is_clean());

        let cost_once = non_negative("cost", Some("-10"));
        let cost_twice = non_negative("cost", cost_once.value.map(|v| v.to_string()).as_deref());
        assert_eq!(cost_twice.value, cost_once.value);
        assert!(cost_twice.is_clean());

        let sex_once = sex(Some("girl"));
        let sex_twice = sex(Some(sex_once.value.as_str()));
        assert_eq!(sex_twice.value, sex_once.value);
        assert!(sex_twice.is_clean());
    }
}
