use byteorder::{ByteOrder, NativeEndian};

use crate::decode::Decode;
use crate::error::BoxDynError;
use crate::oracle::{Oracle, OracleTypeInfo, OracleValueRef, ValueKind};
use crate::types::Type;

impl Type<Oracle> for f64 {
    fn type_info() -> OracleTypeInfo {
        OracleTypeInfo::BINARY_DOUBLE
    }

    fn compatible(ty: &OracleTypeInfo) -> bool {
        ty.is_kind(&[ValueKind::Float, ValueKind::Decimal, ValueKind::Integer])
    }
}

impl Type<Oracle> for f32 {
    fn type_info() -> OracleTypeInfo {
        OracleTypeInfo::BINARY_DOUBLE
    }

    fn compatible(ty: &OracleTypeInfo) -> bool {
        <f64 as Type<Oracle>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Oracle> for f64 {
    fn decode(value: OracleValueRef<'r>) -> Result<Self, BoxDynError> {
        if value.kind() == ValueKind::Decimal {
            let text = <&str as Decode<Oracle>>::decode(value)?;

            return text
                .parse::<f64>()
                .map_err(|err| format!("invalid number {:?}: {}", text, err).into());
        }

        let bytes = value.bytes()?;

        if bytes.len() < 8 {
            return Err(format!("expected 8 bytes for a number, got {}", bytes.len()).into());
        }

        match value.kind() {
            ValueKind::Float => Ok(NativeEndian::read_f64(bytes)),
            ValueKind::Integer => Ok(NativeEndian::read_i64(bytes) as f64),
            kind => Err(format!("cannot decode a {} value as a float", kind).into()),
        }
    }
}

impl<'r> Decode<'r, Oracle> for f32 {
    fn decode(value: OracleValueRef<'r>) -> Result<Self, BoxDynError> {
        Ok(<f64 as Decode<Oracle>>::decode(value)? as f32)
    }
}
