use std::borrow::Cow;

use crate::decode::Decode;
use crate::error::{BoxDynError, Error, UnexpectedNullError};
use crate::oracle::bind::ColumnBuffer;
use crate::oracle::{Oracle, OracleColumn, OracleTypeInfo, ValueKind};
use crate::rowset::decode_checked;
use crate::types::Type;
use crate::value::ValueRef;

/// One cell of the current row: a view into the column's transfer buffer.
///
/// The view borrows the rowset, so it cannot outlive the row it was read from.
#[derive(Debug, Clone, Copy)]
pub struct OracleValueRef<'r> {
    column: &'r OracleColumn,
    buffer: &'r ColumnBuffer,
    row: usize,
}

impl<'r> OracleValueRef<'r> {
    pub(crate) fn new(column: &'r OracleColumn, buffer: &'r ColumnBuffer, row: usize) -> Self {
        Self {
            column,
            buffer,
            row,
        }
    }

    pub fn column(&self) -> &'r OracleColumn {
        self.column
    }

    pub fn kind(&self) -> ValueKind {
        self.buffer.info().kind
    }

    /// The indicator the driver wrote for this cell.
    pub fn indicator(&self) -> i16 {
        self.buffer.indicator(self.row)
    }

    pub fn is_truncated(&self) -> bool {
        self.buffer.is_truncated(self.row)
    }

    /// The bytes the driver returned for this cell.
    ///
    /// `NULL` is an [`UnexpectedNullError`]. A value that did not fit its slot is an error
    /// rather than a silently shortened read.
    pub fn bytes(&self) -> Result<&'r [u8], BoxDynError> {
        if self.buffer.is_null(self.row) {
            return Err(UnexpectedNullError.into());
        }

        if self.buffer.is_truncated(self.row) {
            return Err(format!(
                "value of column {:?} was truncated to {} bytes (indicator {})",
                self.column.name,
                self.buffer.slot(self.row).len(),
                self.buffer.indicator(self.row)
            )
            .into());
        }

        Ok(self.buffer.value(self.row))
    }

    /// Decodes this cell after checking `T` against the described column type.
    pub fn get<T>(self) -> Result<T, Error>
    where
        T: Decode<'r, Oracle> + Type<Oracle>,
    {
        let index = self.column.ordinal;

        decode_checked::<Oracle, T>(self, &index)
    }
}

impl<'r> ValueRef<'r> for OracleValueRef<'r> {
    type Database = Oracle;

    fn type_info(&self) -> Cow<'_, OracleTypeInfo> {
        Cow::Borrowed(&self.column.type_info)
    }

    fn is_null(&self) -> bool {
        self.buffer.is_null(self.row)
    }
}
