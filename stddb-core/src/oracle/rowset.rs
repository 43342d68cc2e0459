use std::fmt::{self, Debug, Formatter};

use crate::column::ColumnIndex;
use crate::error::Error;
use crate::logger::QueryLogger;
use crate::oracle::bind::{self, RowBuffers};
use crate::oracle::describe::describe;
use crate::oracle::error::check_with;
use crate::oracle::oci::{Attr, FetchOrientation, Oci, Status};
use crate::oracle::statement::StatementState;
use crate::oracle::{Oracle, OracleColumn, OracleStatement, OracleValueRef};
use crate::rowset::Rowset;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CursorState {
    /// Executed, nothing fetched yet.
    Bound,
    HasRow,
    NoMoreRows,
    Failed,
}

/// A forward-only cursor over the result of an executed statement.
///
/// Rows are fetched from the driver in batches of the connection's `fetch_rows` setting;
/// [`next`](Rowset::next) serves rows out of the current batch and only calls the driver
/// when the batch runs out.
pub struct OracleRowset<'s, D: Oci> {
    statement: &'s OracleStatement<'s, D>,
    columns: Vec<OracleColumn>,
    buffers: RowBuffers,
    state: CursorState,
    // rows in the current batch, and the position of the current row within it
    batch_len: usize,
    position: usize,
    // the driver reported the end of the result set along with the current batch
    last_batch: bool,
    rows_fetched: u64,
    logger: QueryLogger<'s>,
}

impl<'s, D: Oci> OracleRowset<'s, D> {
    /// Describes and binds every column of `statement`, then executes it.
    pub(crate) fn open(statement: &'s OracleStatement<'s, D>) -> Result<Self, Error> {
        let columns = describe(statement)?;

        let fetch_rows = statement.connection().fetch_settings().fetch_rows.max(1) as usize;
        let buffers = bind::bind(statement, &columns, fetch_rows)?;

        let logger = QueryLogger::new(
            statement.sql(),
            statement.connection().log_settings().clone(),
        );

        // a SELECT is executed with zero iterations so no row is fetched before `next`
        statement.run(if statement.is_select() { 0 } else { 1 })?;

        Ok(Self {
            statement,
            columns,
            buffers,
            state: CursorState::Bound,
            batch_len: 0,
            position: 0,
            last_batch: false,
            rows_fetched: 0,
            logger,
        })
    }

    /// Total number of rows served by [`next`](Rowset::next) so far.
    pub fn rows_fetched(&self) -> u64 {
        self.rows_fetched
    }

    pub fn statement(&self) -> &'s OracleStatement<'s, D> {
        self.statement
    }

    /// The value of column `index` in the current row.
    pub fn cell(&self, index: usize) -> Result<OracleValueRef<'_>, Error> {
        self.try_get_raw(index)
    }

    fn fetch_batch(&mut self) -> Result<bool, Error> {
        let statement = self.statement;
        let driver = statement.driver();
        let err = statement.error_handle();
        let requested = self.buffers.rows() as u32;

        let status = driver.stmt_fetch(statement.handle(), err, requested, FetchOrientation::Next);

        if status == Status::NO_DATA {
            log::trace!("OCIStmtFetch2: {}", status);
        } else if let Err(error) = check_with("OCIStmtFetch2", status, driver, err) {
            self.fail();
            return Err(error);
        }

        let fetched = match statement
            .get_int_attr("OCIAttrGet(OCI_ATTR_ROWS_FETCHED)", Attr::RowsFetched)
        {
            Ok(fetched) => fetched.max(0) as usize,
            Err(error) => {
                self.fail();
                return Err(error);
            }
        };

        self.last_batch = status == Status::NO_DATA || fetched < requested as usize;

        if fetched == 0 {
            self.finish();
            return Ok(false);
        }

        self.batch_len = fetched.min(self.buffers.rows());
        self.position = 0;
        self.advance();

        Ok(true)
    }

    fn advance(&mut self) {
        self.state = CursorState::HasRow;
        self.rows_fetched += 1;
        self.logger.increment_rows_returned();
        self.statement.set_state(StatementState::Fetching);
    }

    fn finish(&mut self) {
        self.state = CursorState::NoMoreRows;
        self.statement.set_state(StatementState::Exhausted);
    }

    fn fail(&mut self) {
        self.state = CursorState::Failed;
        self.statement.set_state(StatementState::Failed);
    }
}

impl<D: Oci> Rowset for OracleRowset<'_, D> {
    type Database = Oracle;

    fn columns(&self) -> &[OracleColumn] {
        &self.columns
    }

    fn next(&mut self) -> Result<bool, Error> {
        match self.state {
            CursorState::NoMoreRows => return Ok(false),

            CursorState::Failed => {
                return Err(Error::InvalidState {
                    object: "rowset",
                    operation: "fetch",
                    state: "failed",
                })
            }

            CursorState::HasRow if self.position + 1 < self.batch_len => {
                self.position += 1;
                self.advance();

                return Ok(true);
            }

            CursorState::Bound | CursorState::HasRow => {}
        }

        if self.columns.is_empty() || self.last_batch {
            self.finish();
            return Ok(false);
        }

        self.fetch_batch()
    }

    fn try_get_raw<I>(&self, index: I) -> Result<OracleValueRef<'_>, Error>
    where
        I: ColumnIndex<Self>,
    {
        let index = index.index(self)?;

        if self.state != CursorState::HasRow {
            return Err(Error::InvalidState {
                object: "rowset",
                operation: "read a column",
                state: "not positioned on a row",
            });
        }

        let buffer = self
            .buffers
            .get(index)
            .ok_or(Error::ColumnIndexOutOfBounds {
                index,
                len: self.buffers.len(),
            })?;

        Ok(OracleValueRef::new(&self.columns[index], buffer, self.position))
    }
}

impl<D: Oci> Drop for OracleRowset<'_, D> {
    fn drop(&mut self) {
        // release the server-side cursor of a result set that was not read to the end
        if matches!(self.state, CursorState::Bound | CursorState::HasRow)
            && !self.last_batch
            && !self.columns.is_empty()
        {
            let statement = self.statement;
            let status = statement.driver().stmt_fetch(
                statement.handle(),
                statement.error_handle(),
                0,
                FetchOrientation::Next,
            );

            if let Err(error) = check_with(
                "OCIStmtFetch2(cancel)",
                status,
                statement.driver(),
                statement.error_handle(),
            ) {
                log::warn!("oracle: failed to cancel cursor: {}", error);
            }
        }
    }
}

impl<D: Oci> ColumnIndex<OracleRowset<'_, D>> for usize {
    fn index(&self, rowset: &OracleRowset<'_, D>) -> Result<usize, Error> {
        let len = rowset.columns.len();

        if *self >= len {
            return Err(Error::ColumnIndexOutOfBounds { len, index: *self });
        }

        Ok(*self)
    }
}

impl<D: Oci> ColumnIndex<OracleRowset<'_, D>> for &'_ str {
    fn index(&self, rowset: &OracleRowset<'_, D>) -> Result<usize, Error> {
        // Try exact match first (for performance)
        if let Some(pos) = rowset.columns.iter().position(|col| col.name == *self) {
            return Ok(pos);
        }

        // Fall back to case-insensitive match, as unquoted identifiers are reported upper case
        rowset
            .columns
            .iter()
            .position(|col| col.name.eq_ignore_ascii_case(self))
            .ok_or_else(|| Error::ColumnNotFound((*self).into()))
    }
}

impl<D: Oci> Debug for OracleRowset<'_, D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("OracleRowset")
            .field("sql", &self.statement.sql())
            .field("columns", &self.columns)
            .field("state", &self.state)
            .field("rows_fetched", &self.rows_fetched)
            .finish()
    }
}
