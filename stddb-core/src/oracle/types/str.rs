use crate::decode::Decode;
use crate::error::BoxDynError;
use crate::oracle::{Oracle, OracleTypeInfo, OracleValueRef, ValueKind};
use crate::types::Type;

impl Type<Oracle> for str {
    fn type_info() -> OracleTypeInfo {
        OracleTypeInfo::VARCHAR2
    }

    fn compatible(ty: &OracleTypeInfo) -> bool {
        // a NUMBER fetched as text reads back exactly
        ty.is_kind(&[ValueKind::String, ValueKind::Decimal])
    }
}

impl Type<Oracle> for String {
    fn type_info() -> OracleTypeInfo {
        <str as Type<Oracle>>::type_info()
    }

    fn compatible(ty: &OracleTypeInfo) -> bool {
        <str as Type<Oracle>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Oracle> for &'r str {
    fn decode(value: OracleValueRef<'r>) -> Result<Self, BoxDynError> {
        let bytes = value.bytes()?;

        // string slots are NUL terminated; the returned length may or may not count it
        let text = match memchr::memchr(b'\0', bytes) {
            Some(end) => &bytes[..end],
            None => bytes,
        };

        Ok(std::str::from_utf8(text)?)
    }
}

impl<'r> Decode<'r, Oracle> for String {
    fn decode(value: OracleValueRef<'r>) -> Result<Self, BoxDynError> {
        <&str as Decode<Oracle>>::decode(value).map(ToOwned::to_owned)
    }
}
