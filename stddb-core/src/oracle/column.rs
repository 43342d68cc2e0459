use crate::column::Column;
use crate::oracle::{Oracle, OracleTypeInfo, ValueKind};

/// One column of a described result set.
///
/// Everything here is copied out of the driver's parameter descriptor, which is released
/// as soon as describe has read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleColumn {
    pub(crate) name: String,
    pub(crate) type_info: OracleTypeInfo,
    pub(crate) ordinal: usize,
    pub(crate) nullable: bool,
}

impl OracleColumn {
    pub fn new(name: impl Into<String>, type_info: OracleTypeInfo, ordinal: usize) -> Self {
        Self {
            name: name.into(),
            type_info,
            ordinal,
            nullable: true,
        }
    }

    /// Whether the column may hold `NULL`, as far as the server knows.
    pub fn nullable(&self) -> bool {
        self.nullable
    }

    pub fn kind(&self) -> Option<ValueKind> {
        self.type_info.kind()
    }
}

impl Column for OracleColumn {
    type Database = Oracle;

    fn ordinal(&self) -> usize {
        self.ordinal
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn type_info(&self) -> &OracleTypeInfo {
        &self.type_info
    }
}
