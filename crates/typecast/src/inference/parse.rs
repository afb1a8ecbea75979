//! Lexical parsers for single cell values.
//!
//! Every parser returns `None` for a value it cannot read; the classifier
//! counts those failures against the null tolerance.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::schema::{CellValue, Complex};

// =============================================================================
// LAZY STATIC PATTERNS
// =============================================================================

/// `D/M/Y`, `D-M-Y`, `D.M.Y` (or month-first), with an optional time.
static NUMERIC_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2})[/.\-](\d{1,2})[/.\-](\d{4}|\d{2})(?:[T ]\s*(.+))?$").unwrap()
});

/// `Y-M-D`, `Y/M/D`, `Y.M.D`, with an optional time.
static YEAR_FIRST_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4})[/.\-](\d{1,2})[/.\-](\d{1,2})(?:[T ]\s*(.+))?$").unwrap()
});

static TIME_OF_DAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2}):(\d{2})(?::(\d{2})(?:[.,](\d{1,9}))?)?\s*(?:([AaPp])\.?[Mm]\.?)?\s*Z?$")
        .unwrap()
});

/// Any signed integer or decimal literal.
static NUMBER_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[-+]?(?:\d*\.\d+|\d+)").unwrap());

/// `[-]D days [HH:MM:SS[.f]]` or a bare clock `HH:MM:SS[.f]`.
static CLOCK_DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([-+])?\s*(?:(\d+)\s*days?,?\s*)?(?:(\d{1,2}):(\d{2}):(\d{2})(?:\.(\d{1,9}))?)?$")
        .unwrap()
});

/// One `<number><unit>` component of a duration such as `1h 30m`.
static UNIT_COMPONENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d*)?|\.\d+)\s*([A-Za-zµ]+)\s*,?\s*").unwrap());

static ISO_DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^([-+])?P(?:(\d+(?:\.\d+)?)W)?(?:(\d+(?:\.\d+)?)D)?(?:T(?:(\d+(?:\.\d+)?)H)?(?:(\d+(?:\.\d+)?)M)?(?:(\d+(?:\.\d+)?)S)?)?$",
    )
    .unwrap()
});

/// Textual-month date layouts. Two-digit-year layouts come first so a
/// four-digit year is never read as year 20.
const TEXTUAL_DATES: &[&str] = &[
    "%d %B %y",
    "%d-%B-%y",
    "%d/%B/%y",
    "%d %B %Y",
    "%d-%B-%Y",
    "%d/%B/%Y",
    "%d %B, %Y",
    "%B %d %Y",
    "%B %d, %Y",
    "%B-%d-%Y",
    "%A %d %B %Y",
    "%A, %d %B %Y",
    "%A %B %d %Y",
    "%A, %B %d, %Y",
    "%Y %B %d",
    "%Y-%B-%d",
];

const TEXTUAL_TIMES: &[&str] = &[" %H:%M:%S%.f", " %H:%M", " %I:%M %p", " %I:%M:%S %p"];

static TEXTUAL_DATETIMES: Lazy<Vec<String>> = Lazy::new(|| {
    TEXTUAL_DATES
        .iter()
        .flat_map(|date| TEXTUAL_TIMES.iter().map(move |time| format!("{date}{time}")))
        .collect()
});

const NANOS_PER_SECOND: i128 = 1_000_000_000;

// =============================================================================
// BOOLEAN
// =============================================================================

/// Map a value through the fixed boolean table, case-insensitively.
pub fn parse_bool(text: &str) -> Option<bool> {
    match text.to_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

// =============================================================================
// NUMBERS
// =============================================================================

/// A parsed numeric value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }
}

/// Read a cell as a number. Booleans count as 1/0; NaN is a failure.
pub fn parse_number(cell: &CellValue) -> Option<Number> {
    match cell {
        CellValue::Integer(i) => Some(Number::Int(*i)),
        CellValue::Float(f) if !f.is_nan() => Some(Number::Float(*f)),
        CellValue::Bool(b) => Some(Number::Int(i64::from(*b))),
        CellValue::Text(s) => parse_number_text(s),
        _ => None,
    }
}

fn parse_number_text(text: &str) -> Option<Number> {
    let text = text.trim();
    if let Ok(i) = text.parse::<i64>() {
        return Some(Number::Int(i));
    }
    match text.parse::<f64>() {
        Ok(f) if !f.is_nan() => Some(Number::Float(f)),
        _ => None,
    }
}

// =============================================================================
// DATES
// =============================================================================

/// Parse a date or timestamp.
///
/// Ambiguous numeric dates are read day-first when `day_first` is set,
/// falling back to the other order when that reading is not a valid date.
/// Two-digit years map 70-99 to the 1900s and 00-69 to the 2000s.
pub fn parse_datetime(text: &str, day_first: bool) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() || !text.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }

    if let Some(caps) = YEAR_FIRST_DATE.captures(text) {
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let day: u32 = caps[3].parse().ok()?;
        let date = NaiveDate::from_ymd_opt(year, month, day)?;
        return with_time(date, caps.get(4).map(|m| m.as_str()));
    }

    if let Some(caps) = NUMERIC_DATE.captures(text) {
        let first: u32 = caps[1].parse().ok()?;
        let second: u32 = caps[2].parse().ok()?;
        let year = expand_year(&caps[3])?;
        let (day, month) = if day_first {
            (first, second)
        } else {
            (second, first)
        };
        let date = NaiveDate::from_ymd_opt(year, month, day)
            .or_else(|| NaiveDate::from_ymd_opt(year, day, month))?;
        return with_time(date, caps.get(4).map(|m| m.as_str()));
    }

    if text.bytes().any(|b| b.is_ascii_alphabetic()) {
        return parse_textual_date(text);
    }

    None
}

fn expand_year(digits: &str) -> Option<i32> {
    let year: i32 = digits.parse().ok()?;
    Some(match digits.len() {
        2 if year >= 70 => 1900 + year,
        2 => 2000 + year,
        _ => year,
    })
}

fn with_time(date: NaiveDate, time: Option<&str>) -> Option<NaiveDateTime> {
    match time {
        None => date.and_hms_opt(0, 0, 0),
        Some(time) => Some(date.and_time(parse_time(time)?)),
    }
}

fn parse_time(text: &str) -> Option<NaiveTime> {
    let caps = TIME_OF_DAY.captures(text.trim())?;
    let mut hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps[2].parse().ok()?;
    let second: u32 = caps.get(3).map_or(Ok(0), |m| m.as_str().parse()).ok()?;
    let nano = caps.get(4).map_or(0, |m| fraction_nanos(m.as_str()));

    if let Some(meridiem) = caps.get(5) {
        if !(1..=12).contains(&hour) {
            return None;
        }
        let pm = meridiem.as_str().eq_ignore_ascii_case("p");
        hour = match (pm, hour) {
            (false, 12) => 0,
            (true, 12) => 12,
            (true, h) => h + 12,
            (false, h) => h,
        };
    }

    NaiveTime::from_hms_nano_opt(hour, minute, second, nano)
}

/// Nanoseconds in a decimal fraction given by its digits (at most 9).
fn fraction_nanos(digits: &str) -> u32 {
    digits
        .chars()
        .chain(std::iter::repeat('0'))
        .take(9)
        .collect::<String>()
        .parse()
        .unwrap_or(0)
}

fn parse_textual_date(text: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.naive_utc());
    }
    for layout in TEXTUAL_DATES {
        if let Ok(date) = NaiveDate::parse_from_str(text, layout) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    TEXTUAL_DATETIMES
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(text, layout).ok())
}

// =============================================================================
// COMPLEX NUMBERS
// =============================================================================

/// Read a value holding exactly two numeric literals as `(re, im)`.
///
/// `"3+4j"`, `"(1, -2)"` and `"1.5 2"` all parse; one or three literals
/// do not.
pub fn parse_complex(text: &str) -> Option<Complex> {
    let mut tokens = NUMBER_TOKEN.find_iter(text);
    let re = tokens.next()?;
    let im = tokens.next()?;
    if tokens.next().is_some() {
        return None;
    }
    Some(Complex::new(
        re.as_str().parse().ok()?,
        im.as_str().parse().ok()?,
    ))
}

// =============================================================================
// DURATIONS
// =============================================================================

/// Parse a time difference.
///
/// Accepts `D days HH:MM:SS[.f]`, bare `HH:MM:SS[.f]`, unit sequences such
/// as `1h 30m` or `2 weeks`, and ISO 8601 durations like `P1DT2H`.
pub fn parse_duration(text: &str) -> Option<TimeDelta> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    parse_clock_duration(text)
        .or_else(|| parse_iso_duration(text))
        .or_else(|| parse_unit_duration(text))
}

fn parse_clock_duration(text: &str) -> Option<TimeDelta> {
    let caps = CLOCK_DURATION.captures(text)?;
    if caps.get(2).is_none() && caps.get(3).is_none() {
        return None;
    }

    let days = caps.get(2).map_or(Some(0), |m| m.as_str().parse::<i128>().ok())?;
    let hours = caps.get(3).map_or(Some(0), |m| m.as_str().parse::<i128>().ok())?;
    let minutes = caps.get(4).map_or(Some(0), |m| m.as_str().parse::<i128>().ok())?;
    let seconds = caps.get(5).map_or(Some(0), |m| m.as_str().parse::<i128>().ok())?;
    if minutes >= 60 || seconds >= 60 {
        return None;
    }
    let nanos = caps.get(6).map_or(0, |m| i128::from(fraction_nanos(m.as_str())));

    let total = days
        .checked_mul(24)?
        .checked_add(hours)?
        .checked_mul(60)?
        .checked_add(minutes)?
        .checked_mul(60)?
        .checked_add(seconds)?
        .checked_mul(NANOS_PER_SECOND)?
        .checked_add(nanos)?;
    delta_from_nanos(total, is_negative(caps.get(1).map(|m| m.as_str())))
}

fn parse_iso_duration(text: &str) -> Option<TimeDelta> {
    let caps = ISO_DURATION.captures(text)?;
    if (2..=6).all(|i| caps.get(i).is_none()) || text.ends_with('T') {
        return None;
    }

    const SCALES: [i128; 5] = [
        7 * 86_400 * NANOS_PER_SECOND,
        86_400 * NANOS_PER_SECOND,
        3_600 * NANOS_PER_SECOND,
        60 * NANOS_PER_SECOND,
        NANOS_PER_SECOND,
    ];

    let mut total: i128 = 0;
    for (i, scale) in SCALES.iter().enumerate() {
        if let Some(m) = caps.get(i + 2) {
            total = total.checked_add(scaled(m.as_str(), *scale)?)?;
        }
    }
    delta_from_nanos(total, is_negative(caps.get(1).map(|m| m.as_str())))
}

fn parse_unit_duration(text: &str) -> Option<TimeDelta> {
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, text.strip_prefix('+').unwrap_or(text).trim_start()),
    };

    let mut position = 0;
    let mut total: i128 = 0;
    for caps in UNIT_COMPONENT.captures_iter(body) {
        let whole = caps.get(0)?;
        if whole.start() != position {
            return None;
        }
        position = whole.end();
        let scale = unit_nanos(&caps[2])?;
        total = total.checked_add(scaled(&caps[1], scale)?)?;
    }

    if position == 0 || position != body.len() {
        return None;
    }
    delta_from_nanos(total, negative)
}

/// Nanoseconds per duration unit, short and long names.
fn unit_nanos(unit: &str) -> Option<i128> {
    let nanos = match unit.to_lowercase().as_str() {
        "w" | "wk" | "wks" | "week" | "weeks" => 7 * 86_400 * NANOS_PER_SECOND,
        "d" | "day" | "days" => 86_400 * NANOS_PER_SECOND,
        "h" | "hr" | "hrs" | "hour" | "hours" => 3_600 * NANOS_PER_SECOND,
        "m" | "min" | "mins" | "minute" | "minutes" | "t" => 60 * NANOS_PER_SECOND,
        "s" | "sec" | "secs" | "second" | "seconds" => NANOS_PER_SECOND,
        "ms" | "milli" | "millis" | "millisecond" | "milliseconds" | "l" => 1_000_000,
        "us" | "µs" | "micro" | "micros" | "microsecond" | "microseconds" | "u" => 1_000,
        "ns" | "nano" | "nanos" | "nanosecond" | "nanoseconds" | "n" => 1,
        _ => return None,
    };
    Some(nanos)
}

/// `number * scale` for a decimal literal, exact to the nanosecond.
fn scaled(number: &str, scale: i128) -> Option<i128> {
    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
    if !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let whole: i128 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let mut total = whole.checked_mul(scale)?;

    let fraction = &fraction[..fraction.len().min(18)];
    if !fraction.is_empty() {
        let digits: i128 = fraction.parse().ok()?;
        let denominator = 10_i128.pow(fraction.len() as u32);
        total = total.checked_add(digits.checked_mul(scale)? / denominator)?;
    }
    Some(total)
}

fn is_negative(sign: Option<&str>) -> bool {
    sign == Some("-")
}

fn delta_from_nanos(total: i128, negative: bool) -> Option<TimeDelta> {
    let total = if negative { -total } else { total };
    i64::try_from(total).ok().map(TimeDelta::nanoseconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_bool_table() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("Yes"), Some(true));
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("no"), Some(false));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("1.0"), None);
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(&CellValue::Text("42".into())), Some(Number::Int(42)));
        assert_eq!(parse_number(&CellValue::Text(" 2.5 ".into())), Some(Number::Float(2.5)));
        assert_eq!(parse_number(&CellValue::Text("1e3".into())), Some(Number::Float(1000.0)));
        assert_eq!(parse_number(&CellValue::Bool(true)), Some(Number::Int(1)));
        assert_eq!(parse_number(&CellValue::Text("NaN".into())), None);
        assert_eq!(parse_number(&CellValue::Text("abc".into())), None);
        assert_eq!(parse_number(&CellValue::Null), None);
    }

    #[test]
    fn test_parse_datetime_day_first() {
        assert_eq!(parse_datetime("02/01/2023", true), Some(date(2023, 1, 2)));
        assert_eq!(parse_datetime("02/01/2023", false), Some(date(2023, 2, 1)));
    }

    #[test]
    fn test_parse_datetime_swaps_when_day_first_is_invalid() {
        assert_eq!(parse_datetime("01/13/2023", true), Some(date(2023, 1, 13)));
        assert_eq!(parse_datetime("13/01/2023", false), Some(date(2023, 1, 13)));
    }

    #[test]
    fn test_parse_datetime_iso_and_rfc3339() {
        assert_eq!(parse_datetime("2023-01-02", true), Some(date(2023, 1, 2)));
        let with_time = parse_datetime("2023-01-02 10:30", true).unwrap();
        assert_eq!(with_time.time(), NaiveTime::from_hms_opt(10, 30, 0).unwrap());
        let utc = parse_datetime("2023-01-02T10:00:00+02:00", true).unwrap();
        assert_eq!(utc.time(), NaiveTime::from_hms_opt(8, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_datetime_textual_months() {
        assert_eq!(parse_datetime("2 January 2023", true), Some(date(2023, 1, 2)));
        assert_eq!(parse_datetime("Jan 2, 2023", true), Some(date(2023, 1, 2)));
        assert_eq!(parse_datetime("02-Jan-23", true), Some(date(2023, 1, 2)));
        assert_eq!(parse_datetime("15-Mar-99", true), Some(date(1999, 3, 15)));
    }

    #[test]
    fn test_parse_datetime_meridiem() {
        let pm = parse_datetime("2023-01-02 3:15 PM", true).unwrap();
        assert_eq!(pm.time(), NaiveTime::from_hms_opt(15, 15, 0).unwrap());
        let midnight = parse_datetime("2023-01-02 12:00 am", true).unwrap();
        assert_eq!(midnight.time(), NaiveTime::from_hms_opt(0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_datetime_rejects_non_dates() {
        assert_eq!(parse_datetime("hello", true), None);
        assert_eq!(parse_datetime("42", true), None);
        assert_eq!(parse_datetime("32/13/2023", true), None);
        assert_eq!(parse_datetime("", true), None);
    }

    #[test]
    fn test_parse_complex_needs_exactly_two_tokens() {
        assert_eq!(parse_complex("3+4j"), Some(Complex::new(3.0, 4.0)));
        assert_eq!(parse_complex("(1.5, -2)"), Some(Complex::new(1.5, -2.0)));
        assert_eq!(parse_complex("-.5-.25j"), Some(Complex::new(-0.5, -0.25)));
        assert_eq!(parse_complex("7"), None);
        assert_eq!(parse_complex("1 2 3"), None);
        assert_eq!(parse_complex("abc"), None);
    }

    #[test]
    fn test_parse_duration_clock_forms() {
        let expected = TimeDelta::days(1) + TimeDelta::hours(2) + TimeDelta::minutes(3);
        assert_eq!(parse_duration("1 days 02:03:00"), Some(expected));
        assert_eq!(parse_duration("2 days"), Some(TimeDelta::days(2)));
        assert_eq!(
            parse_duration("00:00:01.5"),
            Some(TimeDelta::milliseconds(1_500))
        );
        assert_eq!(parse_duration("-1 day"), Some(-TimeDelta::days(1)));
        assert_eq!(parse_duration("00:61:00"), None);
    }

    #[test]
    fn test_parse_duration_overflow_is_none() {
        assert_eq!(parse_duration("10000000000000000000000000000000000000 days"), None);
        assert_eq!(parse_duration("10000000000000000000000000000000000000 days 01:00:00"), None);
        assert_eq!(parse_duration("99999999999999999999999999999999999999999 days"), None);
        assert_eq!(parse_duration("10000000000000000000000000000000000000 hours"), None);
    }

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(
            parse_duration("1h 30m"),
            Some(TimeDelta::minutes(90))
        );
        assert_eq!(parse_duration("3 hours"), Some(TimeDelta::hours(3)));
        assert_eq!(parse_duration("1.5s"), Some(TimeDelta::milliseconds(1_500)));
        assert_eq!(parse_duration("2 weeks"), Some(TimeDelta::weeks(2)));
        assert_eq!(parse_duration("250ms"), Some(TimeDelta::milliseconds(250)));
        assert_eq!(parse_duration("5 parsecs"), None);
        assert_eq!(parse_duration("hours"), None);
    }

    #[test]
    fn test_parse_duration_iso() {
        assert_eq!(
            parse_duration("P1DT2H"),
            Some(TimeDelta::days(1) + TimeDelta::hours(2))
        );
        assert_eq!(parse_duration("PT0.5S"), Some(TimeDelta::milliseconds(500)));
        assert_eq!(parse_duration("P"), None);
        assert_eq!(parse_duration("P1DT"), None);
    }

    #[test]
    fn test_scaled_is_exact() {
        assert_eq!(scaled("1.5", 1_000), Some(1_500));
        assert_eq!(scaled(".25", 100), Some(25));
        assert_eq!(scaled("3", 7), Some(21));
    }
}
