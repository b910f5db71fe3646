use std::ops::Range;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::error::{EdfError, Result};

/// A fixed-width field of the main header record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub offset: usize,
    pub width: usize,
}

impl FieldSpec {
    const fn first(name: &'static str, width: usize) -> Self {
        FieldSpec { name, offset: 0, width }
    }

    const fn after(prev: FieldSpec, name: &'static str, width: usize) -> Self {
        FieldSpec {
            name,
            offset: prev.offset + prev.width,
            width,
        }
    }

    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.width
    }
}

// 主头部字段，偏移量为前面字段宽度之和
pub const VERSION: FieldSpec = FieldSpec::first("version", 8);
pub const PATIENT: FieldSpec = FieldSpec::after(VERSION, "local patient identification", 80);
pub const RECORDING: FieldSpec = FieldSpec::after(PATIENT, "local recording identification", 80);
pub const START_DATE: FieldSpec = FieldSpec::after(RECORDING, "startdate of recording", 8);
pub const START_TIME: FieldSpec = FieldSpec::after(START_DATE, "starttime of recording", 8);
pub const HEADER_BYTES: FieldSpec = FieldSpec::after(START_TIME, "number of bytes in header record", 8);
pub const RESERVED: FieldSpec = FieldSpec::after(HEADER_BYTES, "reserved", 44);
pub const DATA_RECORDS: FieldSpec = FieldSpec::after(RESERVED, "number of data records", 8);
pub const RECORD_DURATION: FieldSpec = FieldSpec::after(DATA_RECORDS, "duration of a data record", 8);
pub const SIGNAL_COUNT: FieldSpec = FieldSpec::after(RECORD_DURATION, "number of signals", 4);

/// Per-signal columns in the order they are stored, with their widths
pub const SIGNAL_COLUMNS: [(&str, usize); 10] = [
    ("label", 16),
    ("transducer type", 80),
    ("physical dimension", 8),
    ("physical minimum", 8),
    ("physical maximum", 8),
    ("digital minimum", 8),
    ("digital maximum", 8),
    ("prefiltering", 80),
    ("number of samples in each data record", 8),
    ("signal reserved", 32),
];

pub const VERSION_DEFAULT: &str = "0       ";
pub const RECORDING_DEFAULT: &str = "Startdate";
pub const INVALID_START: &str = "00.00.0000.00.00";
pub const UNKNOWN_SUBFIELD: &str = "X";
pub const SUBFIELD_SEPARATOR: char = ' ';
pub const SPACE_REPLACEMENT: char = '_';

const MONTHS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

/// Decodes header bytes as ASCII, bytes above 0x7F become `?`
pub fn ascii_text(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| if b.is_ascii() { b as char } else { '?' })
        .collect()
}

/// Raw, untrimmed text of a main header field
pub fn read_field(header: &[u8], spec: FieldSpec) -> String {
    ascii_text(&header[spec.range()])
}

/// Forces `value` to exactly `width` bytes: space padded, or truncated
///
/// Non-ASCII characters are replaced by `_` before fitting.
pub fn fit_field(value: &str, width: usize) -> Vec<u8> {
    let mut field: Vec<u8> = value
        .chars()
        .map(|c| if c.is_ascii() { c as u8 } else { b'_' })
        .take(width)
        .collect();
    field.resize(width, b' ');
    field
}

pub fn write_field(header: &mut [u8], spec: FieldSpec, value: &str) {
    header[spec.range()].copy_from_slice(&fit_field(value, spec.width));
}

/// Trims and parses a numeric field, naming the field on failure
pub fn parse_number<T: FromStr>(s: &str, field: &'static str) -> Result<T> {
    s.trim().parse::<T>().map_err(|_| EdfError::field(field))
}

/// Duration of a data record: bare integer when whole, else three decimals
pub fn format_duration(seconds: f64) -> String {
    if seconds.fract() == 0.0 {
        format!("{}", seconds as i64)
    } else {
        format!("{:.3}", seconds)
    }
}

/// Locale-free decimal text for physical extrema
pub fn format_number(value: f64) -> String {
    format!("{}", value)
}

/// Splits an EDF+ field on single spaces; runs of spaces yield empty tokens
pub fn split_subfields(field: &str) -> Vec<&str> {
    field.split(SUBFIELD_SEPARATOR).collect()
}

/// Encodes a free-text sub-field: `X` when empty, spaces replaced by `_`
pub fn encode_subfield(value: &str) -> String {
    if value.is_empty() {
        UNKNOWN_SUBFIELD.to_string()
    } else {
        value.replace(SUBFIELD_SEPARATOR, &SPACE_REPLACEMENT.to_string())
    }
}

/// Inverse of `encode_subfield`, except that `_` stays `_`
pub fn decode_subfield(token: &str) -> String {
    if token == UNKNOWN_SUBFIELD {
        String::new()
    } else {
        token.to_string()
    }
}

/// Parses `dd-MMM-yyyy`, e.g. `02-MAY-1951`
pub fn parse_edf_date(s: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = s.split('-').collect();
    if parts.len() != 3 {
        return None;
    }

    let day = parts[0].trim().parse::<u32>().ok()?;
    let month = MONTHS.iter().position(|m| *m == parts[1])? as u32 + 1;
    let year = parts[2].trim().parse::<i32>().ok()?;

    NaiveDate::from_ymd_opt(year, month, day)
}

pub fn format_edf_date(date: NaiveDate) -> String {
    format!(
        "{:02}-{}-{:04}",
        date.day(),
        MONTHS[date.month0() as usize],
        date.year()
    )
}

fn split_triplet(field: &str) -> Option<[i32; 3]> {
    let parts: Vec<&str> = field.trim_end().split('.').collect();
    if parts.len() != 3 {
        return None;
    }

    let mut values = [0i32; 3];
    for (value, part) in values.iter_mut().zip(&parts) {
        *value = part.trim().parse().ok()?;
    }
    Some(values)
}

/// Parses the `dd.mm.yy` and `hh.mm.ss` start fields
///
/// Two-digit years above 85 belong to the 1900s, the rest to the 2000s.
/// Returns `None` when a token is missing, not numeric, or out of range
/// (years before 1993 or after `max_year` included).
pub fn parse_start_datetime(date: &str, time: &str, max_year: i32) -> Option<NaiveDateTime> {
    let [day, month, yy] = split_triplet(date)?;
    let [hour, minute, second] = split_triplet(time)?;

    let year = if yy > 85 { 1900 + yy } else { 2000 + yy };

    let in_range = (1..=31).contains(&day)
        && (1..=12).contains(&month)
        && year > 1992
        && year <= max_year
        && (0..24).contains(&hour)
        && (0..60).contains(&minute)
        && (0..60).contains(&second);
    if !in_range {
        return None;
    }

    NaiveDate::from_ymd_opt(year, month as u32, day as u32)?
        .and_hms_opt(hour as u32, minute as u32, second as u32)
}

/// Text for the combined 16-byte start date and time fields
pub fn format_start_datetime(start: Option<NaiveDateTime>) -> String {
    match start {
        Some(dt) => format!(
            "{:02}.{:02}.{:02}{:02}.{:02}.{:02}",
            dt.day(),
            dt.month(),
            dt.year().rem_euclid(100),
            dt.hour(),
            dt.minute(),
            dt.second()
        ),
        None => INVALID_START.to_string(),
    }
}
