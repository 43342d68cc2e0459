use byteorder::{ByteOrder, NativeEndian};

use crate::decode::Decode;
use crate::error::BoxDynError;
use crate::oracle::{Oracle, OracleTypeInfo, OracleValueRef, ValueKind};
use crate::types::Type;

const I64_MIN: f64 = i64::MIN as f64;

impl Type<Oracle> for i64 {
    fn type_info() -> OracleTypeInfo {
        OracleTypeInfo::INTEGER
    }

    fn compatible(ty: &OracleTypeInfo) -> bool {
        ty.is_kind(&[ValueKind::Integer, ValueKind::Decimal, ValueKind::Float])
    }
}

impl Type<Oracle> for i32 {
    fn type_info() -> OracleTypeInfo {
        OracleTypeInfo::INTEGER
    }

    fn compatible(ty: &OracleTypeInfo) -> bool {
        <i64 as Type<Oracle>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Oracle> for i64 {
    fn decode(value: OracleValueRef<'r>) -> Result<Self, BoxDynError> {
        if value.kind() == ValueKind::Decimal {
            return parse_integer(<&str as Decode<Oracle>>::decode(value)?);
        }

        let bytes = value.bytes()?;

        if bytes.len() < 8 {
            return Err(format!("expected 8 bytes for a number, got {}", bytes.len()).into());
        }

        match value.kind() {
            ValueKind::Integer => Ok(NativeEndian::read_i64(bytes)),

            ValueKind::Float => {
                let float = NativeEndian::read_f64(bytes);

                // 2^63 itself does not fit
                if float.fract() == 0.0 && float >= I64_MIN && float < -I64_MIN {
                    Ok(float as i64)
                } else {
                    Err(format!("number {} does not fit an integer", float).into())
                }
            }

            kind => Err(format!("cannot decode a {} value as an integer", kind).into()),
        }
    }
}

/// Parses the decimal text of a `NUMBER` exactly. A fraction of zeros is accepted, anything
/// else after the point or a value outside `i64` is an error.
fn parse_integer(text: &str) -> Result<i64, BoxDynError> {
    let digits = match text.split_once('.') {
        Some((whole, fraction)) if fraction.bytes().all(|b| b == b'0') => whole,
        Some(_) => return Err(format!("number {} is not an integer", text).into()),
        None => text,
    };

    // Oracle renders 0.5 as ".5", so a whole part can be empty
    let digits = match digits {
        "" | "-" | "+" => "0",
        digits => digits,
    };

    digits
        .parse::<i64>()
        .map_err(|err| format!("number {} does not fit an i64: {}", text, err).into())
}

impl<'r> Decode<'r, Oracle> for i32 {
    fn decode(value: OracleValueRef<'r>) -> Result<Self, BoxDynError> {
        let value = <i64 as Decode<Oracle>>::decode(value)?;

        Ok(i32::try_from(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_accepts_numbers_only() {
        assert!(<i64 as Type<Oracle>>::compatible(&OracleTypeInfo::from_code(2, 22, 10, 0)));
        assert!(<i32 as Type<Oracle>>::compatible(&OracleTypeInfo::from_code(2, 22, 0, -127)));
        assert!(<i64 as Type<Oracle>>::compatible(&OracleTypeInfo::BINARY_DOUBLE));
        assert!(!<i64 as Type<Oracle>>::compatible(&OracleTypeInfo::VARCHAR2));
        assert!(!<i32 as Type<Oracle>>::compatible(&OracleTypeInfo::DATE));
    }

    #[test]
    fn it_parses_number_text_exactly() {
        assert_eq!(parse_integer("9007199254740993").unwrap(), 9_007_199_254_740_993);
        assert_eq!(parse_integer("-9223372036854775808").unwrap(), i64::MIN);
        assert_eq!(parse_integer("42.000").unwrap(), 42);
        assert_eq!(parse_integer("-.0").unwrap(), 0);

        assert!(parse_integer("2.5").is_err());
        assert!(parse_integer(".5").is_err());
        assert!(parse_integer("9223372036854775808").is_err());
        assert!(parse_integer("12345678901234567890123456789012345678").is_err());
        assert!(parse_integer("1E+40").is_err());
    }
}
