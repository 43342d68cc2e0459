use std::cell::Cell;
use std::fmt::{self, Debug, Display, Formatter};

use crate::error::Error;
use crate::logger::QueryLogger;
use crate::oracle::error::check_with;
use crate::oracle::oci::{Attr, ExecMode, HandleType, Oci, StatementType};
use crate::oracle::{HandleGuard, OracleConnection, OracleRowset};

/// Where a statement is in its life cycle.
///
/// `Fetching` and `Exhausted` are entered by the rowset a query returns. A statement that
/// hit an error is `Failed` and refuses further work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementState {
    Constructed,
    Prepared,
    Described,
    Executed,
    Fetching,
    Exhausted,
    Failed,
}

impl StatementState {
    pub fn name(self) -> &'static str {
        match self {
            StatementState::Constructed => "constructed",
            StatementState::Prepared => "prepared",
            StatementState::Described => "described",
            StatementState::Executed => "executed",
            StatementState::Fetching => "fetching",
            StatementState::Exhausted => "exhausted",
            StatementState::Failed => "failed",
        }
    }
}

impl Display for StatementState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// states from which the statement can be (re-)executed
const RUNNABLE: &[StatementState] = &[
    StatementState::Prepared,
    StatementState::Described,
    StatementState::Executed,
    StatementState::Fetching,
    StatementState::Exhausted,
];

/// A SQL statement on a connection.
///
/// The statement owns its native handle and SQL text. [`query`](OracleStatement::query)
/// hands out a rowset that borrows the statement mutably, so a statement has at most one
/// open cursor at a time.
pub struct OracleStatement<'c, D: Oci> {
    conn: &'c OracleConnection<'c, D>,
    handle: HandleGuard<D>,
    sql: String,
    statement_type: Option<StatementType>,
    described: bool,
    binds: usize,
    state: Cell<StatementState>,
}

impl<'c, D: Oci> OracleStatement<'c, D> {
    /// Allocates the statement handle and sets its prefetch row count.
    pub(crate) fn new(conn: &'c OracleConnection<'c, D>, sql: &str) -> Result<Self, Error> {
        let driver = conn.driver();
        let err = conn.error_handle();

        let handle =
            HandleGuard::acquire(driver, conn.environment().handle(), HandleType::Stmt)?;

        let prefetch = conn.fetch_settings().prefetch_rows;
        let status =
            driver.attr_set_int(handle.get(), HandleType::Stmt, Attr::PrefetchRows, prefetch, err);
        check_with("OCIAttrSet(OCI_ATTR_PREFETCH_ROWS)", status, &**driver, err)?;

        Ok(Self {
            conn,
            handle,
            sql: sql.to_owned(),
            statement_type: None,
            described: false,
            binds: 0,
            state: Cell::new(StatementState::Constructed),
        })
    }

    /// Hands the SQL text to the driver. Only valid once, right after construction.
    pub fn prepare(&mut self) -> Result<(), Error> {
        self.expect_state("prepare", &[StatementState::Constructed])?;

        let status = self
            .driver()
            .stmt_prepare(self.handle.get(), self.error_handle(), &self.sql);
        self.track(check_with(
            "OCIStmtPrepare",
            status,
            self.driver(),
            self.error_handle(),
        ))?;

        self.state.set(StatementState::Prepared);

        log::debug!("oracle: prepared {:?}", self.sql);

        Ok(())
    }

    /// The kind of statement the server parsed, read once and cached.
    pub fn statement_type(&mut self) -> Result<StatementType, Error> {
        if let Some(statement_type) = self.statement_type {
            return Ok(statement_type);
        }

        self.expect_state("read the statement type", RUNNABLE)?;

        let code = self.get_int_attr("OCIAttrGet(OCI_ATTR_STMT_TYPE)", Attr::StmtType)?;
        let statement_type = StatementType::from(code as u16);

        self.statement_type = Some(statement_type);

        Ok(statement_type)
    }

    /// Describes the result set without fetching, returning its column count.
    ///
    /// Statements other than `SELECT` have no result set: for them this does nothing and
    /// returns zero. Calling this again returns the cached count.
    pub fn get_select_columns(&mut self) -> Result<usize, Error> {
        if self.state() == StatementState::Constructed {
            self.prepare()?;
        }

        if self.described {
            return Ok(self.binds);
        }

        self.expect_state("describe", RUNNABLE)?;

        if self.statement_type()? != StatementType::Select {
            self.described = true;
            self.binds = 0;

            return Ok(0);
        }

        let status = self.driver().stmt_execute(
            self.conn.svc_ctx(),
            self.handle.get(),
            self.error_handle(),
            0,
            ExecMode::DESCRIBE_ONLY,
        );
        self.track(check_with(
            "OCIStmtExecute(OCI_DESCRIBE_ONLY)",
            status,
            self.driver(),
            self.error_handle(),
        ))?;

        let count = self.get_int_attr("OCIAttrGet(OCI_ATTR_PARAM_COUNT)", Attr::ParamCount)?;

        self.binds = count as usize;
        self.described = true;
        self.state.set(StatementState::Described);

        log::debug!("oracle: described {} columns of {:?}", self.binds, self.sql);

        Ok(self.binds)
    }

    /// Executes the statement and opens a cursor over its rows.
    ///
    /// Prepares and describes first if that has not happened yet. No row is consumed
    /// before the first call to [`next`](crate::rowset::Rowset::next). A statement that does
    /// not return rows yields an empty rowset.
    pub fn query(&mut self) -> Result<OracleRowset<'_, D>, Error> {
        if self.state() == StatementState::Constructed {
            self.prepare()?;
        }

        self.expect_state("query", RUNNABLE)?;
        self.get_select_columns()?;

        OracleRowset::open(self)
    }

    /// Executes a statement that does not return rows, returning the affected row count.
    ///
    /// A `SELECT` passed here is executed without fetching, and reports zero rows.
    pub fn execute(&mut self) -> Result<u64, Error> {
        if self.state() == StatementState::Constructed {
            self.prepare()?;
        }

        self.expect_state("execute", RUNNABLE)?;

        let select = self.statement_type()? == StatementType::Select;
        let mut logger = QueryLogger::new(&self.sql, self.conn.log_settings().clone());

        self.run(if select { 0 } else { 1 })?;

        let rows = if select {
            0
        } else {
            self.get_int_attr("OCIAttrGet(OCI_ATTR_ROW_COUNT)", Attr::RowCount)? as u64
        };

        logger.increase_rows_affected(rows);

        Ok(rows)
    }

    /// Runs the statement `iters` times, moving it to `Executed` (or `Failed`).
    pub(crate) fn run(&self, iters: u32) -> Result<(), Error> {
        let status = self.driver().stmt_execute(
            self.conn.svc_ctx(),
            self.handle.get(),
            self.error_handle(),
            iters,
            ExecMode::DEFAULT,
        );
        self.track(check_with(
            "OCIStmtExecute",
            status,
            self.driver(),
            self.error_handle(),
        ))?;

        self.state.set(StatementState::Executed);

        Ok(())
    }

    pub(crate) fn get_int_attr(&self, label: &str, attr: Attr) -> Result<i64, Error> {
        let mut value = 0;
        let status = self.driver().attr_get_int(
            self.handle.get(),
            HandleType::Stmt,
            attr,
            self.error_handle(),
            &mut value,
        );
        self.track(check_with(
            label,
            status,
            self.driver(),
            self.error_handle(),
        ))?;

        Ok(value)
    }

    fn expect_state(
        &self,
        operation: &'static str,
        allowed: &[StatementState],
    ) -> Result<(), Error> {
        let state = self.state();

        if allowed.contains(&state) {
            Ok(())
        } else {
            Err(Error::InvalidState {
                object: "statement",
                operation,
                state: state.name(),
            })
        }
    }

    /// Moves the statement to `Failed` if `result` is an error.
    pub(crate) fn track<T>(&self, result: Result<T, Error>) -> Result<T, Error> {
        if result.is_err() {
            self.state.set(StatementState::Failed);
        }

        result
    }

    pub(crate) fn set_state(&self, state: StatementState) {
        self.state.set(state);
    }

    pub fn state(&self) -> StatementState {
        self.state.get()
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Number of result columns, once described.
    pub fn binds(&self) -> usize {
        self.binds
    }

    pub fn connection(&self) -> &'c OracleConnection<'c, D> {
        self.conn
    }

    #[inline]
    pub(crate) fn handle(&self) -> D::Handle {
        self.handle.get()
    }

    #[inline]
    pub(crate) fn driver(&self) -> &D {
        &**self.conn.driver()
    }

    #[inline]
    pub(crate) fn error_handle(&self) -> D::Handle {
        self.conn.error_handle()
    }

    pub(crate) fn is_select(&self) -> bool {
        self.statement_type == Some(StatementType::Select)
    }
}

impl<D: Oci> Debug for OracleStatement<'_, D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("OracleStatement")
            .field("sql", &self.sql)
            .field("handle", &self.handle)
            .field("statement_type", &self.statement_type)
            .field("binds", &self.binds)
            .field("state", &self.state.get())
            .finish()
    }
}
