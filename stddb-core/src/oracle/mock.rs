//! An in-process native client, for tests.
//!
//! [`MockOci`] implements [`Oci`] over a table of canned results. It keeps the books a real
//! client keeps (live handles and their parents, attached servers, open sessions, cursors)
//! and records every misuse it sees instead of crashing: freeing a handle twice, freeing a
//! parent before its children, detaching a server under an open session. Tests read those
//! records back through the inspection methods.
//!
//! Clones share their state, so a test can hand one clone to an
//! [`OracleEnvironment`](super::OracleEnvironment) and inspect the other.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt::{self, Debug, Formatter};
use std::ptr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use byteorder::{ByteOrder, NativeEndian};
use chrono::{NaiveDate, NaiveDateTime};

use crate::oracle::oci::{
    Attr, Credentials, DefineTarget, EnvMode, ExecMode, ExternalType, FetchOrientation,
    HandleType, Oci, Status,
};
use crate::oracle::types::chrono::encode_date;

/// A native call, as recorded by [`MockOci::count`] and targeted by [`MockOci::fail_next`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockCall {
    EnvCreate,
    AttrSet,
    AttrGet,
    ServerAttach,
    ServerDetach,
    SessionBegin,
    SessionEnd,
    Prepare,
    /// A describe-only execute.
    Describe,
    Execute,
    Fetch,
    /// A zero-row fetch, closing the cursor.
    Cancel,
    ParamGet,
    Define,
    Commit,
    Rollback,
    Ping,
    ServerVersion,
}

/// A handle of the in-process client.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct MockHandle(u32);

impl Debug for MockHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One value of a canned result row.
#[derive(Debug, Clone, PartialEq)]
pub enum MockValue {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDateTime),
    Raw(Vec<u8>),
}

impl From<i64> for MockValue {
    fn from(value: i64) -> Self {
        MockValue::Int(value)
    }
}

impl From<i32> for MockValue {
    fn from(value: i32) -> Self {
        MockValue::Int(value.into())
    }
}

impl From<f64> for MockValue {
    fn from(value: f64) -> Self {
        MockValue::Float(value)
    }
}

impl From<&'_ str> for MockValue {
    fn from(value: &str) -> Self {
        MockValue::Text(value.to_owned())
    }
}

impl From<String> for MockValue {
    fn from(value: String) -> Self {
        MockValue::Text(value)
    }
}

impl From<&'_ [u8]> for MockValue {
    fn from(value: &[u8]) -> Self {
        MockValue::Raw(value.to_vec())
    }
}

impl From<Vec<u8>> for MockValue {
    fn from(value: Vec<u8>) -> Self {
        MockValue::Raw(value)
    }
}

impl From<NaiveDateTime> for MockValue {
    fn from(value: NaiveDateTime) -> Self {
        MockValue::Date(value)
    }
}

impl From<NaiveDate> for MockValue {
    fn from(value: NaiveDate) -> Self {
        // midnight always exists
        value
            .and_hms_opt(0, 0, 0)
            .map_or(MockValue::Null, MockValue::Date)
    }
}

impl<T: Into<MockValue>> From<Option<T>> for MockValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(MockValue::Null, Into::into)
    }
}

/// The describe data of one canned result column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockColumn {
    name: String,
    type_code: u16,
    data_size: u32,
    precision: i16,
    scale: i8,
    nullable: bool,
}

impl MockColumn {
    pub fn new(name: &str, type_code: u16, data_size: u32, precision: i16, scale: i8) -> Self {
        Self {
            name: name.to_owned(),
            type_code,
            data_size,
            precision,
            scale,
            nullable: true,
        }
    }

    /// `NUMBER(10)`
    pub fn integer(name: &str) -> Self {
        Self::new(name, 2, 22, 10, 0)
    }

    /// `NUMBER` without precision, as aggregates report.
    pub fn number(name: &str) -> Self {
        Self::new(name, 2, 22, 0, -127)
    }

    pub fn decimal(name: &str, precision: i16, scale: i8) -> Self {
        Self::new(name, 2, 22, precision, scale)
    }

    pub fn binary_double(name: &str) -> Self {
        Self::new(name, 101, 8, 0, 0)
    }

    pub fn varchar2(name: &str, size: u32) -> Self {
        Self::new(name, 1, size, 0, 0)
    }

    pub fn char(name: &str, size: u32) -> Self {
        Self::new(name, 96, size, 0, 0)
    }

    pub fn date(name: &str) -> Self {
        Self::new(name, 12, 7, 0, 0)
    }

    pub fn timestamp(name: &str) -> Self {
        Self::new(name, 187, 11, 0, 6)
    }

    pub fn raw(name: &str, size: u32) -> Self {
        Self::new(name, 23, size, 0, 0)
    }

    pub fn rowid(name: &str) -> Self {
        Self::new(name, 104, 10, 0, 0)
    }

    pub fn clob(name: &str) -> Self {
        Self::new(name, 112, 4000, 0, 0)
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }
}

/// A canned result set: its columns and rows.
#[derive(Debug, Clone, Default)]
pub struct MockResult {
    columns: Vec<MockColumn>,
    rows: Vec<Vec<MockValue>>,
}

impl MockResult {
    pub fn new(columns: Vec<MockColumn>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn row(mut self, values: Vec<MockValue>) -> Self {
        self.rows.push(values);
        self
    }

    pub fn rows(mut self, rows: impl IntoIterator<Item = Vec<MockValue>>) -> Self {
        self.rows.extend(rows);
        self
    }
}

#[derive(Debug)]
struct Entry {
    handle_type: HandleType,
    parent: Option<u32>,
}

#[derive(Debug, Default)]
struct StmtState {
    sql: Option<String>,
    described: bool,
    defines: BTreeMap<u32, DefineTarget>,
    // next row of the open cursor
    cursor: Option<usize>,
    rows_fetched: u64,
    row_count: u64,
    prefetch_rows: u32,
}

#[derive(Debug, Default)]
struct State {
    next_id: u32,
    live: HashMap<u32, Entry>,
    allocated: HashMap<HandleType, usize>,
    freed: HashMap<HandleType, usize>,
    release_order: Vec<HandleType>,
    double_frees: usize,
    violations: Vec<String>,
    calls: Vec<MockCall>,

    alloc_failures: HashSet<HandleType>,
    failures: HashMap<MockCall, (i32, String)>,
    diagnostics: HashMap<u32, (i32, String)>,

    credentials: Option<(String, String)>,
    queries: HashMap<String, MockResult>,
    dml: HashMap<String, u64>,

    attached: HashSet<u32>,
    active_sessions: HashSet<u32>,
    svc_server: HashMap<u32, u32>,
    svc_session: HashMap<u32, u32>,
    logins: HashMap<u32, (String, String)>,
    statements: HashMap<u32, StmtState>,
    params: HashMap<u32, MockColumn>,
    prefetch_rows: Option<u32>,
    commits: usize,
    rollbacks: usize,
}

impl State {
    fn alloc(&mut self, handle_type: HandleType, parent: Option<u32>) -> MockHandle {
        self.next_id += 1;

        let id = self.next_id;
        self.live.insert(id, Entry { handle_type, parent });
        *self.allocated.entry(handle_type).or_default() += 1;

        if handle_type == HandleType::Stmt {
            self.statements.insert(id, StmtState::default());
        }

        MockHandle(id)
    }

    fn is_live(&self, handle: MockHandle, handle_type: HandleType) -> bool {
        self.live
            .get(&handle.0)
            .map_or(false, |entry| entry.handle_type == handle_type)
    }

    fn expect_live(&mut self, handle: MockHandle, handle_type: HandleType) -> Result<(), Status> {
        if self.is_live(handle, handle_type) {
            Ok(())
        } else {
            self.violations
                .push(format!("used {:?} as a live {} handle", handle, handle_type));
            Err(Status::INVALID_HANDLE)
        }
    }

    fn free(&mut self, handle: MockHandle, handle_type: HandleType) -> Status {
        let entry = match self.live.get(&handle.0) {
            Some(entry) => entry,
            None => {
                self.double_frees += 1;
                return Status::INVALID_HANDLE;
            }
        };

        if entry.handle_type != handle_type {
            self.violations.push(format!(
                "freed {} {:?} as a {} handle",
                entry.handle_type, handle, handle_type
            ));
            return Status::INVALID_HANDLE;
        }

        let mut children: Vec<_> = self
            .live
            .iter()
            .filter(|(_, child)| child.parent == Some(handle.0))
            .map(|(id, child)| (*id, child.handle_type))
            .collect();
        children.sort_unstable();

        for (id, child_type) in children {
            self.violations.push(format!(
                "freed {} {:?} while its {} #{} is live",
                handle_type, handle, child_type, id
            ));
        }

        let in_use = match handle_type {
            HandleType::Server => self.attached.contains(&handle.0),
            HandleType::Session => self.active_sessions.contains(&handle.0),
            HandleType::SvcCtx => self
                .svc_session
                .get(&handle.0)
                .map_or(false, |session| self.active_sessions.contains(session)),
            _ => false,
        };

        if in_use {
            self.violations
                .push(format!("freed {} {:?} while in use", handle_type, handle));
        }

        self.live.remove(&handle.0);
        self.statements.remove(&handle.0);
        self.params.remove(&handle.0);
        self.diagnostics.remove(&handle.0);

        *self.freed.entry(handle_type).or_default() += 1;
        self.release_order.push(handle_type);

        Status::SUCCESS
    }

    /// Records `call`, clears the diagnostics of `err` and applies an injected failure.
    fn begin(&mut self, call: MockCall, err: Option<MockHandle>) -> Result<(), Status> {
        self.calls.push(call);

        match err {
            Some(err) => {
                self.expect_live(err, HandleType::Error)?;
                self.diagnostics.remove(&err.0);

                match self.failures.remove(&call) {
                    Some((code, message)) => Err(self.fail(err, code, message)),
                    None => Ok(()),
                }
            }

            None if self.failures.remove(&call).is_some() => Err(Status::ERROR),
            None => Ok(()),
        }
    }

    fn fail(&mut self, err: MockHandle, code: i32, message: impl Into<String>) -> Status {
        self.diagnostics.insert(err.0, (code, message.into()));
        Status::ERROR
    }

    fn statement(&mut self, stmt: MockHandle) -> Result<&mut StmtState, Status> {
        self.expect_live(stmt, HandleType::Stmt)?;
        self.statements.get_mut(&stmt.0).ok_or(Status::INVALID_HANDLE)
    }

    fn connected(&self, svc: MockHandle) -> bool {
        self.svc_session
            .get(&svc.0)
            .map_or(false, |session| self.active_sessions.contains(session))
    }

    fn column_count(&self, sql: &str) -> usize {
        self.queries.get(sql).map_or(0, |result| result.columns.len())
    }

    fn fetch(&mut self, stmt: MockHandle, err: MockHandle, requested: u32) -> Status {
        let outcome = match self.statements.get_mut(&stmt.0) {
            Some(statement) => match (statement.cursor, statement.sql.clone()) {
                (Some(position), Some(sql)) => match self.queries.get(&sql) {
                    // SAFETY: the targets were registered through `define_by_pos`, whose
                    // contract keeps them valid for `rows` slots until the statement is freed
                    // or re-defined, and `fetch_into` never writes past `rows`.
                    Some(result) => unsafe { fetch_into(statement, result, position, requested) },
                    None => Err((942, "ORA-00942: table or view does not exist".to_owned())),
                },
                _ => Err((1002, "ORA-01002: fetch out of sequence".to_owned())),
            },
            None => return Status::INVALID_HANDLE,
        };

        match outcome {
            Ok(Fetched::Rows) => Status::SUCCESS,
            Ok(Fetched::Truncated) => {
                self.diagnostics.insert(
                    err.0,
                    (
                        24345,
                        "ORA-24345: A Truncation or null fetch error occurred".to_owned(),
                    ),
                );
                Status::SUCCESS_WITH_INFO
            }
            Ok(Fetched::End) => Status::NO_DATA,
            Err((code, message)) => self.fail(err, code, message),
        }
    }
}

enum Fetched {
    Rows,
    Truncated,
    End,
}

/// Copies up to `requested` rows of `result`, starting at `position`, into the statement's
/// defined buffers and moves its cursor past them.
///
/// # Safety
///
/// Every define target of `statement` must be valid for its `rows` slots.
unsafe fn fetch_into(
    statement: &mut StmtState,
    result: &MockResult,
    position: usize,
    requested: u32,
) -> Result<Fetched, (i32, String)> {
    let requested = requested as usize;
    let capacity = statement
        .defines
        .values()
        .map(|target| target.rows)
        .min()
        .unwrap_or(requested);

    let remaining = result.rows.len().saturating_sub(position);
    let count = requested.min(remaining).min(capacity);
    let mut truncated = false;

    for (slot, row) in result.rows[position..position + count].iter().enumerate() {
        for (&column, target) in &statement.defines {
            let value = row.get(column as usize - 1).unwrap_or(&MockValue::Null);

            truncated |= write_value(target, slot, value)?;
        }
    }

    statement.rows_fetched = count as u64;

    if count < requested && position + count >= result.rows.len() {
        statement.cursor = None;
        return Ok(Fetched::End);
    }

    statement.cursor = Some(position + count);

    Ok(if truncated {
        Fetched::Truncated
    } else {
        Fetched::Rows
    })
}

/// Writes `value` into slot `row` of `target`, returning whether it was truncated.
///
/// # Safety
///
/// `target` must be valid for its `rows` slots and `row` must be less than `rows`.
unsafe fn write_value(
    target: &DefineTarget,
    row: usize,
    value: &MockValue,
) -> Result<bool, (i32, String)> {
    let bytes = match (target.external_type, value) {
        (_, MockValue::Null) => None,

        (ExternalType::Int, MockValue::Int(value)) => {
            let mut buf = [0; 8];
            NativeEndian::write_i64(&mut buf, *value);
            Some(buf.to_vec())
        }

        (ExternalType::Int, MockValue::Float(value)) if value.fract() == 0.0 => {
            let mut buf = [0; 8];
            NativeEndian::write_i64(&mut buf, *value as i64);
            Some(buf.to_vec())
        }

        (ExternalType::BDouble, MockValue::Float(value)) => {
            let mut buf = [0; 8];
            NativeEndian::write_f64(&mut buf, *value);
            Some(buf.to_vec())
        }

        (ExternalType::BDouble, MockValue::Int(value)) => {
            let mut buf = [0; 8];
            NativeEndian::write_f64(&mut buf, *value as f64);
            Some(buf.to_vec())
        }

        (ExternalType::Str, MockValue::Text(value)) => Some(value.as_bytes().to_vec()),
        (ExternalType::Str, MockValue::Int(value)) => Some(value.to_string().into_bytes()),
        (ExternalType::Str, MockValue::Float(value)) => Some(number_text(*value).into_bytes()),
        (ExternalType::Str, MockValue::Raw(value)) => Some(value.clone()),

        (ExternalType::Dat, MockValue::Date(value)) => Some(encode_date(value).to_vec()),

        (ExternalType::Bin, MockValue::Raw(value)) => Some(value.clone()),
        (ExternalType::Bin, MockValue::Text(value)) => Some(value.as_bytes().to_vec()),

        (external_type, value) => {
            return Err((
                932,
                format!(
                    "ORA-00932: inconsistent datatypes: expected {:?} got {:?}",
                    external_type, value
                ),
            ))
        }
    };

    let indicator = target.indicators.add(row);
    let length = target.lengths.add(row);
    let slot = target.data.add(row * target.slot_size);

    let bytes = match bytes {
        Some(bytes) => bytes,
        None => {
            *indicator = -1;
            *length = 0;
            return Ok(false);
        }
    };

    // strings keep room for their terminator
    let terminated = target.external_type == ExternalType::Str;
    let capacity = if terminated {
        target.slot_size.saturating_sub(1)
    } else {
        target.slot_size
    };

    let written = bytes.len().min(capacity);
    ptr::copy_nonoverlapping(bytes.as_ptr(), slot, written);

    if terminated && target.slot_size > 0 {
        *slot.add(written) = 0;
    }

    *length = written as u16;

    if written < bytes.len() {
        // the untruncated length, or -2 if that does not fit
        *indicator = i16::try_from(bytes.len()).unwrap_or(-2);
        Ok(true)
    } else {
        *indicator = 0;
        Ok(false)
    }
}

/// Renders a number the way the server converts `NUMBER` to text: no leading zero before
/// the decimal point.
fn number_text(value: f64) -> String {
    let text = value.to_string();

    if let Some(rest) = text.strip_prefix("0.") {
        format!(".{}", rest)
    } else if let Some(rest) = text.strip_prefix("-0.") {
        format!("-.{}", rest)
    } else {
        text
    }
}

fn statement_type(sql: &str) -> u16 {
    let keyword = sql
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_uppercase();

    match keyword.as_str() {
        "SELECT" | "WITH" => 1,
        "UPDATE" => 2,
        "DELETE" => 3,
        "INSERT" => 4,
        "CREATE" => 5,
        "DROP" => 6,
        "ALTER" => 7,
        "BEGIN" => 8,
        "DECLARE" => 9,
        "CALL" => 10,
        "MERGE" => 16,
        _ => 0,
    }
}

/// The in-process client. See the [module documentation](self).
#[derive(Clone, Default)]
pub struct MockOci {
    state: Arc<Mutex<State>>,
}

impl MockOci {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuses sessions that do not log in as `username` with `password`.
    pub fn with_credentials(self, username: &str, password: &str) -> Self {
        self.state().credentials = Some((username.to_owned(), password.to_owned()));
        self
    }

    /// Answers `sql` with `result`.
    pub fn add_query(&self, sql: &str, result: MockResult) {
        self.state().queries.insert(sql.trim().to_owned(), result);
    }

    /// Answers `sql` by reporting `rows` affected rows.
    pub fn add_dml(&self, sql: &str, rows: u64) {
        self.state().dml.insert(sql.trim().to_owned(), rows);
    }

    /// Fails the next `call` with the diagnostic `code` and `message`.
    pub fn fail_next(&self, call: MockCall, code: i32, message: impl Into<String>) {
        self.state().failures.insert(call, (code, message.into()));
    }

    /// Fails the next allocation of a `handle_type` handle.
    pub fn fail_alloc(&self, handle_type: HandleType) {
        self.state().alloc_failures.insert(handle_type);
    }

    pub fn allocated(&self, handle_type: HandleType) -> usize {
        self.state()
            .allocated
            .get(&handle_type)
            .copied()
            .unwrap_or_default()
    }

    pub fn freed(&self, handle_type: HandleType) -> usize {
        self.state()
            .freed
            .get(&handle_type)
            .copied()
            .unwrap_or_default()
    }

    pub fn live_handles(&self) -> usize {
        self.state().live.len()
    }

    /// Every handle allocated was freed exactly once.
    pub fn is_balanced(&self) -> bool {
        let state = self.state();

        state.live.is_empty() && state.double_frees == 0 && state.allocated == state.freed
    }

    pub fn double_frees(&self) -> usize {
        self.state().double_frees
    }

    /// Misuses seen so far: handles freed before their children or while in use, freed
    /// handles passed to a call.
    pub fn violations(&self) -> Vec<String> {
        self.state().violations.clone()
    }

    /// The type of every handle freed, in the order they were freed.
    pub fn release_order(&self) -> Vec<HandleType> {
        self.state().release_order.clone()
    }

    /// How many times `call` was made.
    pub fn count(&self, call: MockCall) -> usize {
        self.state().calls.iter().filter(|c| **c == call).count()
    }

    pub fn commits(&self) -> usize {
        self.state().commits
    }

    pub fn rollbacks(&self) -> usize {
        self.state().rollbacks
    }

    /// The prefetch row count last set on a statement.
    pub fn prefetch_rows(&self) -> Option<u32> {
        self.state().prefetch_rows
    }

    pub fn open_cursors(&self) -> usize {
        self.state()
            .statements
            .values()
            .filter(|statement| statement.cursor.is_some())
            .count()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn call(
        &self,
        call: MockCall,
        err: Option<MockHandle>,
        f: impl FnOnce(&mut State) -> Result<Status, Status>,
    ) -> Status {
        let mut state = self.state();

        match state.begin(call, err).and_then(|()| f(&mut *state)) {
            Ok(status) | Err(status) => status,
        }
    }
}

impl Debug for MockOci {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockOci")
            .field("live_handles", &self.live_handles())
            .finish()
    }
}

impl Oci for MockOci {
    type Handle = MockHandle;

    fn env_create(&self, _mode: EnvMode, env: &mut Option<MockHandle>) -> Status {
        self.call(MockCall::EnvCreate, None, |state| {
            *env = Some(state.alloc(HandleType::Env, None));
            Ok(Status::SUCCESS)
        })
    }

    fn handle_alloc(
        &self,
        parent: MockHandle,
        handle_type: HandleType,
        handle: &mut Option<MockHandle>,
    ) -> Status {
        let mut state = self.state();

        if state.expect_live(parent, HandleType::Env).is_err() {
            return Status::INVALID_HANDLE;
        }

        if state.alloc_failures.remove(&handle_type) {
            return Status::ERROR;
        }

        *handle = Some(state.alloc(handle_type, Some(parent.0)));

        Status::SUCCESS
    }

    fn handle_free(&self, handle: MockHandle, handle_type: HandleType) -> Status {
        let mut state = self.state();

        if handle_type.is_descriptor() {
            state
                .violations
                .push(format!("freed descriptor {:?} as a handle", handle));
        }

        state.free(handle, handle_type)
    }

    fn descriptor_free(&self, descriptor: MockHandle, handle_type: HandleType) -> Status {
        let mut state = self.state();

        if !handle_type.is_descriptor() {
            state
                .violations
                .push(format!("freed handle {:?} as a descriptor", descriptor));
        }

        state.free(descriptor, handle_type)
    }

    fn attr_set_int(
        &self,
        target: MockHandle,
        target_type: HandleType,
        attr: Attr,
        value: u32,
        err: MockHandle,
    ) -> Status {
        self.call(MockCall::AttrSet, Some(err), |state| {
            state.expect_live(target, target_type)?;

            match (target_type, attr) {
                (HandleType::Stmt, Attr::PrefetchRows) => {
                    state.statement(target)?.prefetch_rows = value;
                    state.prefetch_rows = Some(value);
                    Ok(Status::SUCCESS)
                }
                _ => Err(state.fail(err, 24315, "ORA-24315: illegal attribute type")),
            }
        })
    }

    fn attr_set_text(
        &self,
        target: MockHandle,
        target_type: HandleType,
        attr: Attr,
        value: &str,
        err: MockHandle,
    ) -> Status {
        self.call(MockCall::AttrSet, Some(err), |state| {
            state.expect_live(target, target_type)?;

            match (target_type, attr) {
                (HandleType::Session, Attr::Username) => {
                    state.logins.entry(target.0).or_default().0 = value.to_owned()
                }
                (HandleType::Session, Attr::Password) => {
                    state.logins.entry(target.0).or_default().1 = value.to_owned()
                }
                _ => return Err(state.fail(err, 24315, "ORA-24315: illegal attribute type")),
            }

            Ok(Status::SUCCESS)
        })
    }

    fn attr_set_handle(
        &self,
        target: MockHandle,
        target_type: HandleType,
        attr: Attr,
        value: MockHandle,
        err: MockHandle,
    ) -> Status {
        self.call(MockCall::AttrSet, Some(err), |state| {
            state.expect_live(target, target_type)?;

            match (target_type, attr) {
                (HandleType::SvcCtx, Attr::Server) => {
                    state.expect_live(value, HandleType::Server)?;
                    state.svc_server.insert(target.0, value.0);
                }
                (HandleType::SvcCtx, Attr::Session) => {
                    state.expect_live(value, HandleType::Session)?;
                    state.svc_session.insert(target.0, value.0);
                }
                _ => return Err(state.fail(err, 24315, "ORA-24315: illegal attribute type")),
            }

            Ok(Status::SUCCESS)
        })
    }

    fn attr_get_int(
        &self,
        target: MockHandle,
        target_type: HandleType,
        attr: Attr,
        err: MockHandle,
        value: &mut i64,
    ) -> Status {
        self.call(MockCall::AttrGet, Some(err), |state| {
            state.expect_live(target, target_type)?;

            *value = match target_type {
                HandleType::Stmt => {
                    let statement = state.statement(target)?;

                    let sql = match &statement.sql {
                        Some(sql) => sql.clone(),
                        None => {
                            return Err(state.fail(
                                err,
                                24337,
                                "ORA-24337: statement handle not prepared",
                            ))
                        }
                    };

                    match attr {
                        Attr::StmtType => statement_type(&sql).into(),
                        Attr::RowCount => statement.row_count as i64,
                        Attr::RowsFetched => statement.rows_fetched as i64,
                        Attr::PrefetchRows => statement.prefetch_rows.into(),
                        Attr::ParamCount if statement.described => state.column_count(&sql) as i64,
                        Attr::ParamCount => {
                            return Err(state.fail(
                                err,
                                24338,
                                "ORA-24338: statement handle not executed",
                            ))
                        }
                        _ => {
                            return Err(state.fail(err, 24315, "ORA-24315: illegal attribute type"))
                        }
                    }
                }

                HandleType::Param => {
                    let column = state.params.get(&target.0).ok_or(Status::INVALID_HANDLE)?;

                    match attr {
                        Attr::DataType => column.type_code.into(),
                        Attr::DataSize => column.data_size.into(),
                        Attr::Precision => column.precision.into(),
                        Attr::Scale => column.scale.into(),
                        Attr::IsNull => column.nullable.into(),
                        _ => {
                            return Err(state.fail(err, 24315, "ORA-24315: illegal attribute type"))
                        }
                    }
                }

                _ => return Err(state.fail(err, 24315, "ORA-24315: illegal attribute type")),
            };

            Ok(Status::SUCCESS)
        })
    }

    fn attr_get_text(
        &self,
        target: MockHandle,
        target_type: HandleType,
        attr: Attr,
        err: MockHandle,
        value: &mut String,
    ) -> Status {
        self.call(MockCall::AttrGet, Some(err), |state| {
            state.expect_live(target, target_type)?;

            let name = match (target_type, attr) {
                (HandleType::Param, Attr::Name) => {
                    state.params.get(&target.0).map(|column| column.name.clone())
                }
                _ => None,
            };

            match name {
                Some(name) => {
                    *value = name;
                    Ok(Status::SUCCESS)
                }
                None => Err(state.fail(err, 24315, "ORA-24315: illegal attribute type")),
            }
        })
    }

    fn server_attach(&self, server: MockHandle, err: MockHandle, dblink: &str) -> Status {
        self.call(MockCall::ServerAttach, Some(err), |state| {
            state.expect_live(server, HandleType::Server)?;

            if dblink.is_empty() {
                return Err(state.fail(
                    err,
                    12162,
                    "ORA-12162: TNS:net service name is incorrectly specified",
                ));
            }

            state.attached.insert(server.0);

            Ok(Status::SUCCESS)
        })
    }

    fn server_detach(&self, server: MockHandle, err: MockHandle) -> Status {
        self.call(MockCall::ServerDetach, Some(err), |state| {
            state.expect_live(server, HandleType::Server)?;

            let in_use = state.svc_server.iter().any(|(svc, attached)| {
                *attached == server.0 && state.connected(MockHandle(*svc))
            });

            if in_use {
                state
                    .violations
                    .push(format!("detached server {:?} under an open session", server));
            }

            if !state.attached.remove(&server.0) {
                return Err(state.fail(err, 24324, "ORA-24324: service handle not initialized"));
            }

            Ok(Status::SUCCESS)
        })
    }

    fn session_begin(
        &self,
        svc: MockHandle,
        err: MockHandle,
        session: MockHandle,
        credentials: Credentials,
    ) -> Status {
        self.call(MockCall::SessionBegin, Some(err), |state| {
            state.expect_live(svc, HandleType::SvcCtx)?;
            state.expect_live(session, HandleType::Session)?;

            let attached = state
                .svc_server
                .get(&svc.0)
                .map_or(false, |server| state.attached.contains(server));

            if !attached {
                return Err(state.fail(
                    err,
                    24327,
                    "ORA-24327: need explicit attach before authenticating a user",
                ));
            }

            if credentials == Credentials::Rdbms {
                if let Some(expected) = &state.credentials {
                    if state.logins.get(&session.0) != Some(expected) {
                        return Err(state.fail(
                            err,
                            1017,
                            "ORA-01017: invalid username/password; logon denied",
                        ));
                    }
                }
            }

            state.active_sessions.insert(session.0);
            state.svc_session.insert(svc.0, session.0);

            Ok(Status::SUCCESS)
        })
    }

    fn session_end(&self, svc: MockHandle, err: MockHandle, session: MockHandle) -> Status {
        self.call(MockCall::SessionEnd, Some(err), |state| {
            state.expect_live(svc, HandleType::SvcCtx)?;
            state.expect_live(session, HandleType::Session)?;

            if !state.active_sessions.remove(&session.0) {
                return Err(state.fail(err, 1012, "ORA-01012: not logged on"));
            }

            Ok(Status::SUCCESS)
        })
    }

    fn stmt_prepare(&self, stmt: MockHandle, err: MockHandle, sql: &str) -> Status {
        self.call(MockCall::Prepare, Some(err), |state| {
            let statement = state.statement(stmt)?;

            *statement = StmtState {
                sql: Some(sql.trim().to_owned()),
                prefetch_rows: statement.prefetch_rows,
                ..StmtState::default()
            };

            Ok(Status::SUCCESS)
        })
    }

    fn stmt_execute(
        &self,
        svc: MockHandle,
        stmt: MockHandle,
        err: MockHandle,
        iters: u32,
        mode: ExecMode,
    ) -> Status {
        let call = if mode.contains(ExecMode::DESCRIBE_ONLY) {
            MockCall::Describe
        } else {
            MockCall::Execute
        };

        self.call(call, Some(err), |state| {
            state.expect_live(svc, HandleType::SvcCtx)?;

            if !state.connected(svc) {
                return Err(state.fail(err, 3114, "ORA-03114: not connected to ORACLE"));
            }

            let sql = match &state.statement(stmt)?.sql {
                Some(sql) => sql.clone(),
                None => {
                    return Err(state.fail(err, 24337, "ORA-24337: statement handle not prepared"))
                }
            };

            if state.queries.contains_key(&sql) {
                let statement = state.statement(stmt)?;
                statement.described = true;

                if call == MockCall::Describe {
                    return Ok(Status::SUCCESS);
                }

                statement.cursor = Some(0);
                statement.rows_fetched = 0;

                // a query executed with iterations fetches that many rows right away
                if iters > 0 {
                    let status = state.fetch(stmt, err, iters);

                    return Ok(if status == Status::NO_DATA {
                        Status::SUCCESS
                    } else {
                        status
                    });
                }

                return Ok(Status::SUCCESS);
            }

            let rows = match state.dml.get(&sql) {
                Some(rows) => *rows,
                None => {
                    return Err(state.fail(err, 942, "ORA-00942: table or view does not exist"))
                }
            };

            if call == MockCall::Describe {
                state.statement(stmt)?.described = true;
                return Ok(Status::SUCCESS);
            }

            if iters == 0 {
                return Err(state.fail(
                    err,
                    24333,
                    "ORA-24333: zero iteration count",
                ));
            }

            let statement = state.statement(stmt)?;
            statement.described = true;
            statement.row_count = rows;

            if mode.contains(ExecMode::COMMIT_ON_SUCCESS) {
                state.commits += 1;
            }

            Ok(Status::SUCCESS)
        })
    }

    fn stmt_fetch(
        &self,
        stmt: MockHandle,
        err: MockHandle,
        rows: u32,
        _orientation: FetchOrientation,
    ) -> Status {
        let call = if rows == 0 {
            MockCall::Cancel
        } else {
            MockCall::Fetch
        };

        self.call(call, Some(err), |state| {
            if rows == 0 {
                let statement = state.statement(stmt)?;
                statement.cursor = None;
                statement.rows_fetched = 0;

                return Ok(Status::SUCCESS);
            }

            state.statement(stmt)?;

            Ok(state.fetch(stmt, err, rows))
        })
    }

    fn param_get(
        &self,
        stmt: MockHandle,
        err: MockHandle,
        position: u32,
        param: &mut Option<MockHandle>,
    ) -> Status {
        self.call(MockCall::ParamGet, Some(err), |state| {
            let statement = state.statement(stmt)?;

            if !statement.described {
                return Err(state.fail(err, 24338, "ORA-24338: statement handle not executed"));
            }

            let sql = statement.sql.clone().unwrap_or_default();
            let column = state
                .queries
                .get(&sql)
                .and_then(|result| result.columns.get((position as usize).wrapping_sub(1)))
                .cloned();

            let column = match column {
                Some(column) => column,
                None => {
                    return Err(state.fail(
                        err,
                        24334,
                        "ORA-24334: no descriptor for this position",
                    ))
                }
            };

            let handle = state.alloc(HandleType::Param, Some(stmt.0));
            state.params.insert(handle.0, column);
            *param = Some(handle);

            Ok(Status::SUCCESS)
        })
    }

    unsafe fn define_by_pos(
        &self,
        stmt: MockHandle,
        err: MockHandle,
        position: u32,
        target: DefineTarget,
    ) -> Status {
        self.call(MockCall::Define, Some(err), |state| {
            if position == 0 {
                return Err(state.fail(err, 24334, "ORA-24334: no descriptor for this position"));
            }

            state.statement(stmt)?.defines.insert(position, target);

            Ok(Status::SUCCESS)
        })
    }

    fn trans_commit(&self, svc: MockHandle, err: MockHandle) -> Status {
        self.call(MockCall::Commit, Some(err), |state| {
            state.expect_live(svc, HandleType::SvcCtx)?;

            if !state.connected(svc) {
                return Err(state.fail(err, 3114, "ORA-03114: not connected to ORACLE"));
            }

            state.commits += 1;

            Ok(Status::SUCCESS)
        })
    }

    fn trans_rollback(&self, svc: MockHandle, err: MockHandle) -> Status {
        self.call(MockCall::Rollback, Some(err), |state| {
            state.expect_live(svc, HandleType::SvcCtx)?;

            if !state.connected(svc) {
                return Err(state.fail(err, 3114, "ORA-03114: not connected to ORACLE"));
            }

            state.rollbacks += 1;

            Ok(Status::SUCCESS)
        })
    }

    fn ping(&self, svc: MockHandle, err: MockHandle) -> Status {
        self.call(MockCall::Ping, Some(err), |state| {
            state.expect_live(svc, HandleType::SvcCtx)?;

            if !state.connected(svc) {
                return Err(state.fail(err, 3114, "ORA-03114: not connected to ORACLE"));
            }

            Ok(Status::SUCCESS)
        })
    }

    fn server_version(&self, svc: MockHandle, err: MockHandle, version: &mut String) -> Status {
        self.call(MockCall::ServerVersion, Some(err), |state| {
            state.expect_live(svc, HandleType::SvcCtx)?;

            *version = "Oracle Database 19c Enterprise Edition Release 19.0.0.0.0 - Production"
                .to_owned();

            Ok(Status::SUCCESS)
        })
    }

    fn error_get(&self, err: MockHandle, record: u32) -> Option<(i32, String)> {
        match record {
            1 => self.state().diagnostics.get(&err.0).cloned(),
            _ => None,
        }
    }
}
