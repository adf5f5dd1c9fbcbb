//! Conversion of raw cell text into typed field values.
use crate::spreadsheet::cell::serial_to_datetime;
use crate::table::field::FieldType;
use crate::table::field::Value;
use crate::table::field::ValueKind;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];
const TIME_FORMATS: [&str; 2] = ["%H:%M:%S%.f", "%H:%M"];

/// Converts raw cell text into a value of the target type.
///
/// Blank text yields the type's zero value without an error. Unconvertible
/// text yields the zero value together with a `Cannot convert` message.
/// This function never fails otherwise.
pub fn coerce(raw: &str, target: &FieldType) -> (Value, Option<String>) {
    let text = raw.trim();
    if text.is_empty() {
        return (target.zero(), None);
    }
    let value = match target.kind {
        // Text keeps surrounding whitespace; only blank text is normalised.
        ValueKind::Text => Some(Value::Text(raw.to_owned())),
        ValueKind::Int32 => parse_integer(text)
            .filter(|value| i32::try_from(*value).is_ok())
            .map(Value::Integer),
        ValueKind::Int64 => parse_integer(text).map(Value::Integer),
        ValueKind::Decimal => text
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .map(Value::Decimal),
        ValueKind::Boolean => parse_boolean(text).map(Value::Boolean),
        ValueKind::Date => parse_date(text).map(Value::Date),
        ValueKind::Time => parse_time(text).map(Value::Time),
        ValueKind::DateTime => parse_datetime(text).map(Value::DateTime),
        ValueKind::Enumeration(enumeration) => enumeration
            .members
            .iter()
            .find(|member| member.eq_ignore_ascii_case(text))
            .map(|member| Value::Enum(*member)),
    };
    match value {
        Some(value) => (value, None),
        None => (
            target.zero(),
            Some(format!("Cannot convert '{}' to {}", raw, target.type_name())),
        ),
    }
}

/// Parses a whole number, accepting a decimal rendering whose fraction is all zeros.
fn parse_integer(text: &str) -> Option<i64> {
    if let Ok(value) = text.parse::<i64>() {
        return Some(value);
    }
    let (whole, fraction) = text.split_once('.')?;
    if whole.trim_start_matches(['+', '-']).is_empty() || !fraction.chars().all(|char| char == '0') {
        return None;
    }
    whole.parse::<i64>().ok()
}

fn parse_boolean(text: &str) -> Option<bool> {
    if text.eq_ignore_ascii_case("true") || text == "1" {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") || text == "0" {
        Some(false)
    } else {
        None
    }
}

/// Parses an ISO date-time, an ISO date (at midnight) or an Excel serial number.
fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, DATE_FORMAT)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .or_else(|| parse_serial(text))
}

/// Parses an ISO date, or the date part of anything [`parse_datetime`] accepts.
fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .ok()
        .or_else(|| parse_datetime(text).map(|datetime| datetime.date()))
}

/// Parses an ISO time of day, the time part of an ISO date-time, or a serial
/// fraction of a day.
fn parse_time(text: &str) -> Option<NaiveTime> {
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(text, format).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
                .map(|datetime| datetime.time())
        })
        .or_else(|| {
            let serial = text.parse::<f64>().ok()?;
            serial_to_datetime(serial.fract(), false).map(|datetime| datetime.time())
        })
}

/// Reads an Excel serial number in the 1900 date system.
fn parse_serial(text: &str) -> Option<NaiveDateTime> {
    serial_to_datetime(text.parse::<f64>().ok()?, false)
}
