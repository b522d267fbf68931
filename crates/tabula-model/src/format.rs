//! Host number-format language.
//!
//! A format is either a number pattern (`0`, `#`, `,`, `.`, `%` plus literals) or a date/time
//! pattern (`d`, `m`, `y`, `h`, `s`, `a` runs plus separators). Literal text is written as
//! `[$...]`; a small set of punctuation is accepted unescaped.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use thiserror::Error;

/// Characters that may appear unescaped and print as themselves.
const PLAIN_LITERALS: &[char] = &[' ', '-', '/', ':', '(', ')', '+', '.', ','];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("empty format")]
    Empty,
    #[error("unexpected character '{ch}' at position {position}")]
    UnexpectedChar { ch: char, position: usize },
    #[error("unterminated literal escape starting at position {0}")]
    UnterminatedEscape(usize),
    #[error("invalid date token '{0}'")]
    InvalidDateToken(String),
    #[error("format mixes date and number tokens")]
    MixedDateAndNumber,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NumberToken {
    /// `0`: always printed.
    Zero,
    /// `#`: printed only when significant.
    Hash,
    Thousands,
    DecimalPoint,
    Percent,
    Literal(String),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DatePart {
    Day,
    DayPadded,
    WeekdayShort,
    WeekdayLong,
    Month,
    MonthPadded,
    MonthShort,
    MonthLong,
    YearShort,
    YearLong,
    Hour,
    HourPadded,
    Minute,
    MinutePadded,
    Second,
    SecondPadded,
    Meridiem,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DateToken {
    Part(DatePart),
    Literal(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Format {
    Number(Vec<NumberToken>),
    Date(Vec<DateToken>),
}

impl Format {
    pub fn is_date(&self) -> bool {
        matches!(self, Format::Date(_))
    }
}

enum Raw {
    Number(NumberToken),
    DateRun(char, usize),
    Literal(String),
}

fn is_date_letter(c: char) -> bool {
    matches!(c, 'd' | 'm' | 'y' | 'h' | 's' | 'a')
}

fn lex(format: &str) -> Result<Vec<Raw>, FormatError> {
    let chars: Vec<char> = format.chars().collect();
    let mut out = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            '[' => {
                if chars.get(i + 1) != Some(&'$') {
                    return Err(FormatError::UnexpectedChar { ch: c, position: i });
                }
                let start = i;
                let mut j = i + 2;
                let mut text = String::new();
                while j < chars.len() && chars[j] != ']' {
                    text.push(chars[j]);
                    j += 1;
                }
                if j >= chars.len() {
                    return Err(FormatError::UnterminatedEscape(start));
                }
                out.push(Raw::Literal(text));
                i = j + 1;
            }
            '0' => {
                out.push(Raw::Number(NumberToken::Zero));
                i += 1;
            }
            '#' => {
                out.push(Raw::Number(NumberToken::Hash));
                i += 1;
            }
            '%' => {
                out.push(Raw::Number(NumberToken::Percent));
                i += 1;
            }
            c if is_date_letter(c) => {
                let mut len = 1;
                while chars.get(i + len) == Some(&c) {
                    len += 1;
                }
                out.push(Raw::DateRun(c, len));
                i += len;
            }
            c if PLAIN_LITERALS.contains(&c) => {
                out.push(Raw::Literal(c.to_string()));
                i += 1;
            }
            _ => return Err(FormatError::UnexpectedChar { ch: c, position: i }),
        }
    }
    Ok(out)
}

/// Parse a host format string.
pub fn parse_format(format: &str) -> Result<Format, FormatError> {
    if format.trim().is_empty() {
        return Err(FormatError::Empty);
    }
    let raw = lex(format)?;
    let has_date = raw.iter().any(|r| matches!(r, Raw::DateRun(..)));
    let has_digits = raw.iter().any(|r| {
        matches!(
            r,
            Raw::Number(NumberToken::Zero | NumberToken::Hash | NumberToken::Percent)
        )
    });
    if has_date && has_digits {
        return Err(FormatError::MixedDateAndNumber);
    }
    if has_date {
        return parse_date_tokens(raw).map(Format::Date);
    }
    Ok(Format::Number(number_tokens(raw)))
}

/// `.` and `,` only act as number punctuation between digit placeholders.
fn number_tokens(raw: Vec<Raw>) -> Vec<NumberToken> {
    let is_digit = |r: &Raw| matches!(r, Raw::Number(NumberToken::Zero | NumberToken::Hash));
    let first_digit = raw.iter().position(is_digit);
    let last_digit = raw.iter().rposition(is_digit);
    let mut out = Vec::with_capacity(raw.len());
    for (idx, r) in raw.into_iter().enumerate() {
        let inside = matches!((first_digit, last_digit), (Some(f), Some(l)) if idx > f && idx < l);
        match r {
            Raw::Number(token) => out.push(token),
            Raw::Literal(text) if text == "." && (inside || Some(idx) == last_digit.map(|l| l + 1)) => {
                out.push(NumberToken::DecimalPoint)
            }
            Raw::Literal(text) if text == "," && inside => out.push(NumberToken::Thousands),
            Raw::Literal(text) => out.push(NumberToken::Literal(text)),
            Raw::DateRun(..) => {}
        }
    }
    out
}

fn parse_date_tokens(raw: Vec<Raw>) -> Result<Vec<DateToken>, FormatError> {
    let mut tokens = Vec::with_capacity(raw.len());
    for r in &raw {
        match r {
            Raw::Literal(text) => tokens.push(DateToken::Literal(text.clone())),
            Raw::Number(_) => return Err(FormatError::MixedDateAndNumber),
            Raw::DateRun(c, len) => {
                let invalid = || FormatError::InvalidDateToken(c.to_string().repeat(*len));
                let part = match (c, len) {
                    ('d', 1) => DatePart::Day,
                    ('d', 2) => DatePart::DayPadded,
                    ('d', 3) => DatePart::WeekdayShort,
                    ('d', 4) => DatePart::WeekdayLong,
                    ('m', 1) => DatePart::Month,
                    ('m', 2) => DatePart::MonthPadded,
                    ('m', 3) => DatePart::MonthShort,
                    ('m', 4) => DatePart::MonthLong,
                    ('y', 2) => DatePart::YearShort,
                    ('y', 4) => DatePart::YearLong,
                    ('h', 1) => DatePart::Hour,
                    ('h', 2) => DatePart::HourPadded,
                    ('s', 1) => DatePart::Second,
                    ('s', 2) => DatePart::SecondPadded,
                    ('a', 1) => DatePart::Meridiem,
                    _ => return Err(invalid()),
                };
                tokens.push(DateToken::Part(part));
            }
        }
    }
    resolve_minutes(&mut tokens);
    Ok(tokens)
}

/// `m`/`mm` directly after an hour token or before a second token denote minutes.
fn resolve_minutes(tokens: &mut [DateToken]) {
    let parts: Vec<(usize, DatePart)> = tokens
        .iter()
        .enumerate()
        .filter_map(|(i, t)| match t {
            DateToken::Part(p) => Some((i, *p)),
            DateToken::Literal(_) => None,
        })
        .collect();
    for (k, (idx, part)) in parts.iter().enumerate() {
        if !matches!(part, DatePart::Month | DatePart::MonthPadded) {
            continue;
        }
        let after_hour = k > 0 && matches!(parts[k - 1].1, DatePart::Hour | DatePart::HourPadded);
        let before_second = parts
            .get(k + 1)
            .is_some_and(|(_, p)| matches!(p, DatePart::Second | DatePart::SecondPadded));
        if after_hour || before_second {
            tokens[*idx] = DateToken::Part(if *part == DatePart::Month {
                DatePart::Minute
            } else {
                DatePart::MinutePadded
            });
        }
    }
}

/// Render `value` with `format`. Date formats interpret `value` as a 1900-system serial.
pub fn format_number(value: f64, format: &Format) -> String {
    match format {
        Format::Number(tokens) => format_with_number_tokens(value, tokens),
        Format::Date(tokens) => format_with_date_tokens(value, tokens),
    }
}

fn format_with_number_tokens(value: f64, tokens: &[NumberToken]) -> String {
    let percent_count = tokens.iter().filter(|t| **t == NumberToken::Percent).count();
    let mut value = value;
    for _ in 0..percent_count {
        value *= 100.0;
    }

    let point = tokens.iter().position(|t| *t == NumberToken::DecimalPoint);
    let (int_tokens, frac_tokens) = match point {
        Some(p) => (&tokens[..p], &tokens[p + 1..]),
        None => (tokens, &[][..]),
    };
    let min_int = int_tokens.iter().filter(|t| **t == NumberToken::Zero).count();
    let min_frac = frac_tokens.iter().filter(|t| **t == NumberToken::Zero).count();
    let max_frac = frac_tokens
        .iter()
        .filter(|t| matches!(t, NumberToken::Zero | NumberToken::Hash))
        .count();
    let thousands = int_tokens.contains(&NumberToken::Thousands);

    let rendered = format!("{:.*}", max_frac, value.abs());
    let (int_part, frac_part) = rendered.split_once('.').unwrap_or((rendered.as_str(), ""));
    let mut frac = frac_part.to_string();
    while frac.len() > min_frac && frac.ends_with('0') {
        frac.pop();
    }
    let mut int = int_part.trim_start_matches('0').to_string();
    while int.len() < min_int {
        int.insert(0, '0');
    }
    if thousands {
        int = group_thousands(&int);
    }

    let is_digit = |t: &NumberToken| matches!(t, NumberToken::Zero | NumberToken::Hash);
    let render_literals = |tokens: &[NumberToken], out: &mut String| {
        for token in tokens {
            match token {
                NumberToken::Literal(text) => out.push_str(text),
                NumberToken::Percent => out.push('%'),
                _ => {}
            }
        }
    };
    let mut out = String::new();
    let (Some(first), Some(last)) = (
        tokens.iter().position(is_digit),
        tokens.iter().rposition(is_digit),
    ) else {
        render_literals(tokens, &mut out);
        return out;
    };
    let is_zero = int.chars().all(|c| c == '0' || c == ',') && frac.chars().all(|c| c == '0');
    if value < 0.0 && !is_zero {
        out.push('-');
    }
    render_literals(&tokens[..first], &mut out);
    out.push_str(&int);
    if !frac.is_empty() {
        out.push('.');
        out.push_str(&frac);
    }
    render_literals(&tokens[last + 1..], &mut out);
    out
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

const MONTHS: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];
const WEEKDAYS: [&str; 7] = [
    "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday",
];

/// Serial of 1970-01-01.
const UNIX_EPOCH_SERIAL: f64 = 25_569.0;

/// Convert a 1900-system serial to a date-time. Serials before 61 (1900-03-01) are off by
/// one day because the 1900 system counts a non-existent 1900-02-29.
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 || serial > 2_958_465.0 {
        return None;
    }
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let days = serial.trunc() as i64;
    let seconds = ((serial - serial.trunc()) * 86_400.0).round() as i64;
    base.checked_add_signed(Duration::days(days))?
        .checked_add_signed(Duration::seconds(seconds))
}

/// Inverse of [`serial_to_datetime`].
pub fn datetime_to_serial(dt: NaiveDateTime) -> f64 {
    dt.and_utc().timestamp() as f64 / 86_400.0 + UNIX_EPOCH_SERIAL
}

fn format_with_date_tokens(value: f64, tokens: &[DateToken]) -> String {
    let Some(dt) = serial_to_datetime(value) else {
        return crate::format_number_literal(value);
    };
    let twelve_hour = tokens.contains(&DateToken::Part(DatePart::Meridiem));
    let hour = if twelve_hour {
        match dt.hour() % 12 {
            0 => 12,
            h => h,
        }
    } else {
        dt.hour()
    };
    let mut out = String::new();
    for token in tokens {
        match token {
            DateToken::Literal(text) => out.push_str(text),
            DateToken::Part(part) => {
                let text = match part {
                    DatePart::Day => dt.day().to_string(),
                    DatePart::DayPadded => format!("{:02}", dt.day()),
                    DatePart::WeekdayShort => {
                        WEEKDAYS[dt.weekday().num_days_from_monday() as usize][..3].to_string()
                    }
                    DatePart::WeekdayLong => {
                        WEEKDAYS[dt.weekday().num_days_from_monday() as usize].to_string()
                    }
                    DatePart::Month => dt.month().to_string(),
                    DatePart::MonthPadded => format!("{:02}", dt.month()),
                    DatePart::MonthShort => MONTHS[dt.month0() as usize][..3].to_string(),
                    DatePart::MonthLong => MONTHS[dt.month0() as usize].to_string(),
                    DatePart::YearShort => format!("{:02}", dt.year().rem_euclid(100)),
                    DatePart::YearLong => format!("{:04}", dt.year()),
                    DatePart::Hour => hour.to_string(),
                    DatePart::HourPadded => format!("{hour:02}"),
                    DatePart::Minute => dt.minute().to_string(),
                    DatePart::MinutePadded => format!("{:02}", dt.minute()),
                    DatePart::Second => dt.second().to_string(),
                    DatePart::SecondPadded => format!("{:02}", dt.second()),
                    DatePart::Meridiem => (if dt.hour() < 12 { "AM" } else { "PM" }).to_string(),
                };
                out.push_str(&text);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn render(value: f64, format: &str) -> String {
        format_number(value, &parse_format(format).unwrap())
    }

    #[test]
    fn number_patterns() {
        assert_eq!(render(1234.5, "#,##0.00"), "1,234.50");
        assert_eq!(render(0.256, "0.0%"), "25.6%");
        assert_eq!(render(-3.0, "0"), "-3");
        assert_eq!(render(1.5, "0.##"), "1.5");
        assert_eq!(render(12.0, "[$€]#,##0"), "€12");
    }

    #[test]
    fn date_patterns() {
        // 2024-03-05 14:07:09
        let serial = 45356.0 + (14.0 * 3600.0 + 7.0 * 60.0 + 9.0) / 86_400.0;
        assert_eq!(render(serial, "yyyy-mm-dd"), "2024-03-05");
        assert_eq!(render(serial, "hh:mm:ss"), "14:07:09");
        assert_eq!(render(serial, "hh:mm a"), "02:07 PM");
        assert_eq!(render(serial, "d mmm yyyy"), "5 Mar 2024");
        assert_eq!(render(serial, "dddd"), "Tuesday");
    }

    #[test]
    fn rejects_unknown_tokens() {
        assert!(matches!(
            parse_format("0.00 \"EUR\""),
            Err(FormatError::UnexpectedChar { ch: '"', .. })
        ));
        assert_eq!(parse_format("[$abc"), Err(FormatError::UnterminatedEscape(0)));
        assert_eq!(parse_format("yyy"), Err(FormatError::InvalidDateToken("yyy".into())));
        assert_eq!(parse_format("dd 0"), Err(FormatError::MixedDateAndNumber));
        assert_eq!(parse_format(""), Err(FormatError::Empty));
    }

    #[test]
    fn month_after_hour_is_minute() {
        let Format::Date(tokens) = parse_format("h:m").unwrap() else {
            panic!("expected a date format");
        };
        assert_eq!(tokens[2], DateToken::Part(DatePart::Minute));
    }

    #[test]
    fn serial_conversion_round_trips() {
        let dt = NaiveDate::from_ymd_opt(2021, 7, 1)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap();
        let serial = datetime_to_serial(dt);
        assert_eq!(serial, 44378.25);
        assert_eq!(serial_to_datetime(serial), Some(dt));
    }
}
