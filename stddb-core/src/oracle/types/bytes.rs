use crate::decode::Decode;
use crate::error::BoxDynError;
use crate::oracle::{Oracle, OracleTypeInfo, OracleValueRef, ValueKind};
use crate::types::Type;

impl Type<Oracle> for [u8] {
    fn type_info() -> OracleTypeInfo {
        OracleTypeInfo::RAW
    }

    fn compatible(ty: &OracleTypeInfo) -> bool {
        // character data can be read as its bytes
        ty.is_kind(&[ValueKind::Binary, ValueKind::String])
    }
}

impl Type<Oracle> for Vec<u8> {
    fn type_info() -> OracleTypeInfo {
        <[u8] as Type<Oracle>>::type_info()
    }

    fn compatible(ty: &OracleTypeInfo) -> bool {
        <[u8] as Type<Oracle>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Oracle> for &'r [u8] {
    fn decode(value: OracleValueRef<'r>) -> Result<Self, BoxDynError> {
        let bytes = value.bytes()?;

        match value.kind() {
            ValueKind::Binary => Ok(bytes),
            // up to the terminator, whatever the encoding
            ValueKind::String => Ok(match memchr::memchr(b'\0', bytes) {
                Some(end) => &bytes[..end],
                None => bytes,
            }),
            kind => Err(format!("cannot decode a {} value as bytes", kind).into()),
        }
    }
}

impl<'r> Decode<'r, Oracle> for Vec<u8> {
    fn decode(value: OracleValueRef<'r>) -> Result<Self, BoxDynError> {
        <&[u8] as Decode<Oracle>>::decode(value).map(ToOwned::to_owned)
    }
}
