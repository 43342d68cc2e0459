use crate::column::{Column, ColumnIndex};
use crate::database::{Database, HasValueRef};
use crate::decode::Decode;
use crate::error::{mismatched_types, Error};
use crate::types::Type;
use crate::value::ValueRef;

/// A forward-only cursor over the rows of an executed query.
///
/// A rowset owns the transfer buffers for every column of the result set. Values are read
/// from the current row only, and a value borrowed from the rowset must be dropped before
/// the cursor can be advanced with [`next`](Rowset::next).
pub trait Rowset: Sized {
    type Database: Database;

    /// Returns `true` if this rowset has no columns.
    #[inline]
    fn is_empty(&self) -> bool {
        self.columns().is_empty()
    }

    /// Returns the number of columns in this rowset.
    #[inline]
    fn len(&self) -> usize {
        self.columns().len()
    }

    /// Gets all columns in this statement.
    fn columns(&self) -> &[<Self::Database as Database>::Column];

    /// Gets the column information at `index`.
    ///
    /// A string index can be used to access a column by name and a `usize` index
    /// can be used to access a column by position (zero-based).
    fn try_column<I>(&self, index: I) -> Result<&<Self::Database as Database>::Column, Error>
    where
        I: ColumnIndex<Self>,
    {
        Ok(&self.columns()[index.index(self)?])
    }

    /// Gets the name of the column at the zero-based position `index`.
    fn name(&self, index: usize) -> Result<&str, Error> {
        let columns = self.columns();

        columns
            .get(index)
            .map(Column::name)
            .ok_or(Error::ColumnIndexOutOfBounds {
                index,
                len: columns.len(),
            })
    }

    /// Advances the cursor to the next row.
    ///
    /// Returns `false` once the result set is exhausted, and keeps returning `false` on every
    /// later call.
    fn next(&mut self) -> Result<bool, Error>;

    /// Index into the current row and decode a single value.
    ///
    /// A string index can be used to access a column by name and a `usize` index
    /// can be used to access a column by position (zero-based).
    ///
    /// # Errors
    ///
    ///  * [`ColumnNotFound`] if the column by the given name was not found.
    ///  * [`ColumnIndexOutOfBounds`] if the `usize` index was greater than the number of columns in the row.
    ///  * [`ColumnDecode`] if the value could not be decoded into the requested type.
    ///
    /// [`ColumnDecode`]: Error::ColumnDecode
    /// [`ColumnNotFound`]: Error::ColumnNotFound
    /// [`ColumnIndexOutOfBounds`]: Error::ColumnIndexOutOfBounds
    fn try_get<'r, T, I>(&'r self, index: I) -> Result<T, Error>
    where
        I: ColumnIndex<Self>,
        T: Decode<'r, Self::Database> + Type<Self::Database>,
    {
        let value = self.try_get_raw(&index)?;

        decode_checked::<Self::Database, T>(value, &index)
    }

    /// Index into the current row and decode a single value.
    ///
    /// Unlike [`try_get`](Rowset::try_get), this method does not check that the type
    /// being returned from the database is compatible with the Rust type and blindly tries
    /// to decode the value.
    #[inline]
    fn try_get_unchecked<'r, T, I>(&'r self, index: I) -> Result<T, Error>
    where
        I: ColumnIndex<Self>,
        T: Decode<'r, Self::Database>,
    {
        let value = self.try_get_raw(&index)?;

        T::decode(value).map_err(|source| Error::ColumnDecode {
            index: format!("{:?}", index),
            source,
        })
    }

    /// Index into the current row and retrieve a raw value.
    ///
    /// # Errors
    ///
    ///  * [`ColumnNotFound`] if the column by the given name was not found.
    ///  * [`ColumnIndexOutOfBounds`] if the `usize` index was greater than the number of columns in the row.
    ///  * [`InvalidState`] if the cursor is not positioned on a row.
    ///
    /// [`ColumnNotFound`]: Error::ColumnNotFound
    /// [`ColumnIndexOutOfBounds`]: Error::ColumnIndexOutOfBounds
    /// [`InvalidState`]: Error::InvalidState
    fn try_get_raw<I>(
        &self,
        index: I,
    ) -> Result<<Self::Database as HasValueRef<'_>>::ValueRef, Error>
    where
        I: ColumnIndex<Self>;
}

/// Decode `value` into `T` after checking that the described SQL type is compatible.
///
/// `NULL` skips the compatibility check so `Option<T>` decodes regardless of the column type.
pub fn decode_checked<'r, DB, T>(
    value: <DB as HasValueRef<'r>>::ValueRef,
    index: &dyn std::fmt::Debug,
) -> Result<T, Error>
where
    DB: Database,
    T: Decode<'r, DB> + Type<DB>,
{
    if !value.is_null() {
        let ty = value.type_info();

        if !T::compatible(&ty) {
            return Err(Error::ColumnDecode {
                index: format!("{:?}", index),
                source: mismatched_types::<DB, T>(&ty),
            });
        }
    }

    T::decode(value).map_err(|source| Error::ColumnDecode {
        index: format!("{:?}", index),
        source,
    })
}
