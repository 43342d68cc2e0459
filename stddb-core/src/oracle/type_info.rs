use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::type_info::TypeInfo;

/// Native (internal) data type codes reported by column describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeType {
    Varchar2,
    Number,
    Long,
    Rowid,
    Date,
    Raw,
    LongRaw,
    Char,
    BinaryFloat,
    BinaryDouble,
    Clob,
    Blob,
    Bfile,
    Timestamp,
    TimestampTz,
    TimestampLtz,
    IntervalYm,
    IntervalDs,
    Urowid,
    Other(u16),
}

impl NativeType {
    pub fn code(self) -> u16 {
        match self {
            NativeType::Varchar2 => 1,
            NativeType::Number => 2,
            NativeType::Long => 8,
            NativeType::Rowid => 104,
            NativeType::Date => 12,
            NativeType::Raw => 23,
            NativeType::LongRaw => 24,
            NativeType::Char => 96,
            NativeType::BinaryFloat => 100,
            NativeType::BinaryDouble => 101,
            NativeType::Clob => 112,
            NativeType::Blob => 113,
            NativeType::Bfile => 114,
            NativeType::Timestamp => 187,
            NativeType::TimestampTz => 188,
            NativeType::TimestampLtz => 232,
            NativeType::IntervalYm => 189,
            NativeType::IntervalDs => 190,
            NativeType::Urowid => 208,
            NativeType::Other(code) => code,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            NativeType::Varchar2 => "VARCHAR2",
            NativeType::Number => "NUMBER",
            NativeType::Long => "LONG",
            NativeType::Rowid => "ROWID",
            NativeType::Date => "DATE",
            NativeType::Raw => "RAW",
            NativeType::LongRaw => "LONG RAW",
            NativeType::Char => "CHAR",
            NativeType::BinaryFloat => "BINARY_FLOAT",
            NativeType::BinaryDouble => "BINARY_DOUBLE",
            NativeType::Clob => "CLOB",
            NativeType::Blob => "BLOB",
            NativeType::Bfile => "BFILE",
            NativeType::Timestamp => "TIMESTAMP",
            NativeType::TimestampTz => "TIMESTAMP WITH TIME ZONE",
            NativeType::TimestampLtz => "TIMESTAMP WITH LOCAL TIME ZONE",
            NativeType::IntervalYm => "INTERVAL YEAR TO MONTH",
            NativeType::IntervalDs => "INTERVAL DAY TO SECOND",
            NativeType::Urowid => "UROWID",
            NativeType::Other(_) => "UNKNOWN",
        }
    }
}

impl From<u16> for NativeType {
    fn from(code: u16) -> Self {
        // describe reports internal codes; some clients report the external ones
        match code {
            1 => NativeType::Varchar2,
            2 => NativeType::Number,
            8 => NativeType::Long,
            11 | 69 | 104 => NativeType::Rowid,
            12 => NativeType::Date,
            23 => NativeType::Raw,
            24 => NativeType::LongRaw,
            96 => NativeType::Char,
            4 | 21 | 100 => NativeType::BinaryFloat,
            22 | 101 => NativeType::BinaryDouble,
            112 => NativeType::Clob,
            113 => NativeType::Blob,
            114 => NativeType::Bfile,
            180 | 187 => NativeType::Timestamp,
            181 | 188 => NativeType::TimestampTz,
            231 | 232 => NativeType::TimestampLtz,
            182 | 189 => NativeType::IntervalYm,
            183 | 190 => NativeType::IntervalDs,
            208 => NativeType::Urowid,
            other => NativeType::Other(other),
        }
    }
}

/// How the bytes of a column are transferred and interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Integer,
    /// `NUMBER` that may not fit an `i64`, transferred as its decimal text.
    Decimal,
    Float,
    String,
    Date,
    Binary,
}

impl ValueKind {
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Integer => "integer",
            ValueKind::Decimal => "decimal",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::Date => "date",
            ValueKind::Binary => "binary",
        }
    }
}

impl Display for ValueKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.name())
    }
}

/// Longest text a NUMBER renders to, including sign, point, exponent and terminator.
pub(crate) const NUMBER_STRING_SIZE: u32 = 64;

/// Longest string a ROWID or UROWID renders to, including the terminator.
pub(crate) const ROWID_STRING_SIZE: u32 = 4001;

/// Type information for an Oracle column, as reported by describe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleTypeInfo {
    pub(crate) native: NativeType,
    pub(crate) data_size: u32,
    pub(crate) precision: i16,
    pub(crate) scale: i8,
}

impl OracleTypeInfo {
    pub(crate) const INTEGER: Self = Self::new(NativeType::Number, 22, 18, 0);
    pub(crate) const BINARY_DOUBLE: Self = Self::new(NativeType::BinaryDouble, 8, 0, 0);
    pub(crate) const VARCHAR2: Self = Self::new(NativeType::Varchar2, 4000, 0, 0);
    pub(crate) const DATE: Self = Self::new(NativeType::Date, 7, 0, 0);
    pub(crate) const RAW: Self = Self::new(NativeType::Raw, 2000, 0, 0);

    pub const fn new(native: NativeType, data_size: u32, precision: i16, scale: i8) -> Self {
        Self {
            native,
            data_size,
            precision,
            scale,
        }
    }

    pub fn from_code(code: u16, data_size: u32, precision: i16, scale: i8) -> Self {
        Self::new(NativeType::from(code), data_size, precision, scale)
    }

    pub fn native_type(&self) -> NativeType {
        self.native
    }

    pub fn data_size(&self) -> u32 {
        self.data_size
    }

    pub fn precision(&self) -> i16 {
        self.precision
    }

    pub fn scale(&self) -> i8 {
        self.scale
    }

    /// `NUMBER(p, 0)` with `p <= 18` always fits an `i64`.
    pub fn is_integral(&self) -> bool {
        self.native == NativeType::Number && self.scale == 0 && (1..=18).contains(&self.precision)
    }

    /// The value kind this column is fetched as, or `None` if no transfer buffer exists
    /// for its native type.
    pub fn kind(&self) -> Option<ValueKind> {
        match self.native {
            NativeType::Number if self.is_integral() => Some(ValueKind::Integer),
            NativeType::Number => Some(ValueKind::Decimal),
            NativeType::BinaryFloat | NativeType::BinaryDouble => Some(ValueKind::Float),
            NativeType::Varchar2 | NativeType::Char | NativeType::Rowid | NativeType::Urowid => {
                Some(ValueKind::String)
            }
            NativeType::Date | NativeType::Timestamp => Some(ValueKind::Date),
            NativeType::Raw => Some(ValueKind::Binary),
            NativeType::Long
            | NativeType::LongRaw
            | NativeType::Clob
            | NativeType::Blob
            | NativeType::Bfile
            | NativeType::TimestampTz
            | NativeType::TimestampLtz
            | NativeType::IntervalYm
            | NativeType::IntervalDs
            | NativeType::Other(_) => None,
        }
    }

    /// Bytes needed to hold one value of this column in its transfer buffer.
    pub fn slot_size(&self) -> Option<usize> {
        let size = match self.kind()? {
            ValueKind::Integer | ValueKind::Float => 8,
            ValueKind::Decimal => NUMBER_STRING_SIZE,
            ValueKind::Date => 7,
            ValueKind::String => match self.native {
                NativeType::Rowid | NativeType::Urowid => ROWID_STRING_SIZE,
                _ => self.data_size + 1,
            },
            ValueKind::Binary => self.data_size.max(1),
        };

        Some(size as usize)
    }

    pub(crate) fn is_kind(&self, kinds: &[ValueKind]) -> bool {
        self.kind().map_or(false, |kind| kinds.contains(&kind))
    }
}

impl TypeInfo for OracleTypeInfo {
    fn name(&self) -> &str {
        self.native.name()
    }

    fn is_bindable(&self) -> bool {
        self.kind().is_some()
    }
}

impl Display for OracleTypeInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self.native {
            NativeType::Number if self.precision > 0 => {
                write!(f, "NUMBER({}, {})", self.precision, self.scale)
            }
            NativeType::Varchar2 | NativeType::Char | NativeType::Raw => {
                write!(f, "{}({})", self.native.name(), self.data_size)
            }
            NativeType::Other(code) => write!(f, "UNKNOWN({})", code),
            native => f.write_str(native.name()),
        }
    }
}
