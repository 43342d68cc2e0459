use crate::error::Error;
use crate::oracle::error::check_with;
use crate::oracle::oci::{DefineTarget, ExternalType, Oci};
use crate::oracle::{OracleColumn, OracleStatement, ValueKind};

/// Indicator value the driver writes for a `NULL`.
pub(crate) const INDICATOR_NULL: i16 = -1;

/// How one column is transferred: its kind, the external type it is defined with and the
/// size of one row's slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindInfo {
    pub kind: ValueKind,
    pub external_type: ExternalType,
    pub slot_size: usize,
}

impl BindInfo {
    /// Classifies a described column. Columns of a type with no buffer binding are refused.
    pub fn for_column(column: &OracleColumn) -> Result<Self, Error> {
        let unsupported = || Error::UnsupportedColumnType {
            column: column.name.clone(),
            type_code: column.type_info.native_type().code(),
        };

        let kind = column.type_info.kind().ok_or_else(unsupported)?;
        let slot_size = column.type_info.slot_size().ok_or_else(unsupported)?;

        let external_type = match kind {
            ValueKind::Integer => ExternalType::Int,
            ValueKind::Float => ExternalType::BDouble,
            ValueKind::Decimal | ValueKind::String => ExternalType::Str,
            ValueKind::Date => ExternalType::Dat,
            ValueKind::Binary => ExternalType::Bin,
        };

        Ok(Self {
            kind,
            external_type,
            slot_size,
        })
    }
}

/// The transfer buffer of one column: `rows` fixed-size slots with an indicator and a
/// returned length per slot.
#[derive(Debug)]
pub struct ColumnBuffer {
    info: BindInfo,
    data: Box<[u8]>,
    indicators: Box<[i16]>,
    lengths: Box<[u16]>,
}

impl ColumnBuffer {
    pub fn new(info: BindInfo, rows: usize) -> Self {
        Self {
            info,
            data: vec![0; info.slot_size * rows].into_boxed_slice(),
            indicators: vec![INDICATOR_NULL; rows].into_boxed_slice(),
            lengths: vec![0; rows].into_boxed_slice(),
        }
    }

    #[inline]
    pub fn info(&self) -> BindInfo {
        self.info
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.indicators.len()
    }

    /// The full slot of `row`, including bytes past the returned length.
    #[inline]
    pub fn slot(&self, row: usize) -> &[u8] {
        let start = row * self.info.slot_size;
        &self.data[start..start + self.info.slot_size]
    }

    /// The bytes the driver returned for `row`.
    #[inline]
    pub fn value(&self, row: usize) -> &[u8] {
        let slot = self.slot(row);
        &slot[..(self.lengths[row] as usize).min(slot.len())]
    }

    #[inline]
    pub fn indicator(&self, row: usize) -> i16 {
        self.indicators[row]
    }

    #[inline]
    pub fn is_null(&self, row: usize) -> bool {
        self.indicators[row] == INDICATOR_NULL
    }

    /// The value did not fit its slot. A positive indicator is the untruncated length.
    #[inline]
    pub fn is_truncated(&self, row: usize) -> bool {
        self.indicators[row] > 0 || self.indicators[row] < INDICATOR_NULL
    }

    fn define_target(&mut self) -> DefineTarget {
        DefineTarget {
            external_type: self.info.external_type,
            data: self.data.as_mut_ptr(),
            slot_size: self.info.slot_size,
            indicators: self.indicators.as_mut_ptr(),
            lengths: self.lengths.as_mut_ptr(),
            rows: self.indicators.len(),
        }
    }
}

/// The buffers of every column of a rowset, indexed by column.
#[derive(Debug)]
pub struct RowBuffers {
    columns: Vec<ColumnBuffer>,
    rows: usize,
}

impl RowBuffers {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn get(&self, index: usize) -> Option<&ColumnBuffer> {
        self.columns.get(index)
    }
}

/// Allocates a buffer of `rows` slots per column and registers each with the driver.
///
/// If any column fails, the buffers allocated so far are dropped with the error.
pub(crate) fn bind<D: Oci>(
    statement: &OracleStatement<'_, D>,
    columns: &[OracleColumn],
    rows: usize,
) -> Result<RowBuffers, Error> {
    let driver = statement.driver();
    let err = statement.error_handle();

    let mut buffers = RowBuffers {
        columns: Vec::with_capacity(columns.len()),
        rows,
    };

    for column in columns {
        let info = statement.track(BindInfo::for_column(column))?;
        let mut buffer = ColumnBuffer::new(info, rows);
        let target = buffer.define_target();
        let position = column.ordinal as u32 + 1;

        // SAFETY: the slices behind `target` are heap allocations that are never resized.
        // They are owned by the rowset, which borrows the statement for as long as it lives,
        // so no fetch on this statement can happen after they are freed. Executing again
        // re-defines every position before the next fetch.
        #[allow(unsafe_code)]
        let status = unsafe { driver.define_by_pos(statement.handle(), err, position, target) };

        statement.track(check_with("OCIDefineByPos", status, driver, err))?;

        log::trace!(
            "oracle: defined column {} as {:?}, {} bytes x {} rows",
            position,
            info.external_type,
            info.slot_size,
            rows
        );

        buffers.columns.push(buffer);
    }

    Ok(buffers)
}
