use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::decode::Decode;
use crate::error::BoxDynError;
use crate::oracle::{Oracle, OracleTypeInfo, OracleValueRef, ValueKind};
use crate::types::Type;

impl Type<Oracle> for NaiveDate {
    fn type_info() -> OracleTypeInfo {
        OracleTypeInfo::DATE
    }

    fn compatible(ty: &OracleTypeInfo) -> bool {
        ty.is_kind(&[ValueKind::Date])
    }
}

impl Type<Oracle> for NaiveDateTime {
    fn type_info() -> OracleTypeInfo {
        OracleTypeInfo::DATE
    }

    fn compatible(ty: &OracleTypeInfo) -> bool {
        ty.is_kind(&[ValueKind::Date])
    }
}

impl<'r> Decode<'r, Oracle> for NaiveDate {
    fn decode(value: OracleValueRef<'r>) -> Result<Self, BoxDynError> {
        Ok(<NaiveDateTime as Decode<Oracle>>::decode(value)?.date())
    }
}

impl<'r> Decode<'r, Oracle> for NaiveDateTime {
    fn decode(value: OracleValueRef<'r>) -> Result<Self, BoxDynError> {
        let bytes = value.bytes()?;

        if value.kind() != ValueKind::Date {
            return Err(format!("cannot decode a {} value as a date", value.kind()).into());
        }

        decode_date(bytes)
    }
}

/// Decodes the seven byte external date format.
///
/// Century and year are stored excess-100, so `120, 124` is 2024 and `100, 99` is 1 BC (year 0
/// in the proleptic calendar chrono uses). Hour, minute and second are stored excess-1.
pub(crate) fn decode_date(bytes: &[u8]) -> Result<NaiveDateTime, BoxDynError> {
    let [century, year, month, day, hour, minute, second] = match bytes {
        [a, b, c, d, e, f, g] => [*a, *b, *c, *d, *e, *f, *g],
        _ => return Err(format!("expected 7 bytes for a date, got {}", bytes.len()).into()),
    };

    let year = (i32::from(century) - 100) * 100 + i32::from(year) - 100;

    // there is no year 0 here; chrono's year 0 is 1 BC
    let year = if year < 0 { year + 1 } else { year };

    let date = NaiveDate::from_ymd_opt(year, u32::from(month), u32::from(day))
        .ok_or_else(|| format!("invalid date: {}-{}-{}", year, month, day))?;

    let time = NaiveTime::from_hms_opt(
        u32::from(hour.wrapping_sub(1)),
        u32::from(minute.wrapping_sub(1)),
        u32::from(second.wrapping_sub(1)),
    )
    .ok_or_else(|| format!("invalid time: {}:{}:{}", hour, minute, second))?;

    Ok(NaiveDateTime::new(date, time))
}

/// Encodes a timestamp in the seven byte external date format, dropping fractional seconds.
#[cfg(any(test, feature = "mock"))]
pub(crate) fn encode_date(value: &NaiveDateTime) -> [u8; 7] {
    use chrono::{Datelike, Timelike};

    let year = value.year();
    // chrono's year 0 is 1 BC
    let year = if year <= 0 { year - 1 } else { year };

    [
        (year / 100 + 100) as u8,
        (year % 100 + 100) as u8,
        value.month() as u8,
        value.day() as u8,
        value.hour() as u8 + 1,
        value.minute() as u8 + 1,
        value.second() as u8 + 1,
    ]
}
