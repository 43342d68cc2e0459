//! The native client capability set.
//!
//! Everything the backend needs from the vendor client library goes through the [`Oci`]
//! trait. Calls mirror the C interface: each one returns a [`Status`], and anything it
//! allocates or reads comes back through an out-parameter, so the error translator sees
//! every status before any result is used.

use std::fmt::{self, Debug, Display, Formatter};

use bitflags::bitflags;

/// Status code returned by every native call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Status(pub i32);

impl Status {
    pub const SUCCESS: Status = Status(0);
    pub const SUCCESS_WITH_INFO: Status = Status(1);
    pub const NEED_DATA: Status = Status(99);
    pub const NO_DATA: Status = Status(100);
    pub const ERROR: Status = Status(-1);
    pub const INVALID_HANDLE: Status = Status(-2);
    pub const STILL_EXECUTING: Status = Status(-3123);

    /// `SUCCESS` and `SUCCESS_WITH_INFO` are the only successful outcomes.
    #[inline]
    pub fn is_success(self) -> bool {
        matches!(self, Status::SUCCESS | Status::SUCCESS_WITH_INFO)
    }

    pub fn name(self) -> &'static str {
        match self {
            Status::SUCCESS => "OCI_SUCCESS",
            Status::SUCCESS_WITH_INFO => "OCI_SUCCESS_WITH_INFO",
            Status::NEED_DATA => "OCI_NEED_DATA",
            Status::NO_DATA => "OCI_NO_DATA",
            Status::ERROR => "OCI_ERROR",
            Status::INVALID_HANDLE => "OCI_INVALID_HANDLE",
            Status::STILL_EXECUTING => "OCI_STILL_EXECUTING",
            _ => "OCI_UNKNOWN",
        }
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.0)
    }
}

/// Kinds of native handles and descriptors the backend allocates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum HandleType {
    Env = 1,
    Error = 2,
    SvcCtx = 3,
    Stmt = 4,
    Server = 8,
    Session = 9,
    /// Column parameter descriptor, returned by `param_get`.
    Param = 53,
}

impl HandleType {
    #[inline]
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Descriptors are released with `descriptor_free`, handles with `handle_free`.
    #[inline]
    pub fn is_descriptor(self) -> bool {
        matches!(self, HandleType::Param)
    }

    pub fn name(self) -> &'static str {
        match self {
            HandleType::Env => "environment",
            HandleType::Error => "error",
            HandleType::SvcCtx => "service context",
            HandleType::Stmt => "statement",
            HandleType::Server => "server",
            HandleType::Session => "session",
            HandleType::Param => "parameter descriptor",
        }
    }
}

impl Display for HandleType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Attributes read or written through `attr_get_*` / `attr_set_*`.
///
/// Attribute codes are only unique per handle type, so this is not a `repr` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attr {
    // service context
    Server,
    Session,
    // session
    Username,
    Password,
    // statement
    PrefetchRows,
    StmtType,
    ParamCount,
    RowCount,
    RowsFetched,
    // parameter descriptor
    DataSize,
    DataType,
    Name,
    Precision,
    Scale,
    IsNull,
}

impl Attr {
    pub fn code(self) -> u32 {
        match self {
            Attr::Server => 6,
            Attr::Session => 7,
            Attr::Username => 22,
            Attr::Password => 23,
            Attr::PrefetchRows => 11,
            Attr::StmtType => 24,
            Attr::ParamCount => 18,
            Attr::RowCount => 9,
            Attr::RowsFetched => 197,
            Attr::DataSize => 1,
            Attr::DataType => 2,
            Attr::Name => 4,
            Attr::Precision => 5,
            Attr::Scale => 6,
            Attr::IsNull => 7,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Attr::Server => "OCI_ATTR_SERVER",
            Attr::Session => "OCI_ATTR_SESSION",
            Attr::Username => "OCI_ATTR_USERNAME",
            Attr::Password => "OCI_ATTR_PASSWORD",
            Attr::PrefetchRows => "OCI_ATTR_PREFETCH_ROWS",
            Attr::StmtType => "OCI_ATTR_STMT_TYPE",
            Attr::ParamCount => "OCI_ATTR_PARAM_COUNT",
            Attr::RowCount => "OCI_ATTR_ROW_COUNT",
            Attr::RowsFetched => "OCI_ATTR_ROWS_FETCHED",
            Attr::DataSize => "OCI_ATTR_DATA_SIZE",
            Attr::DataType => "OCI_ATTR_DATA_TYPE",
            Attr::Name => "OCI_ATTR_NAME",
            Attr::Precision => "OCI_ATTR_PRECISION",
            Attr::Scale => "OCI_ATTR_SCALE",
            Attr::IsNull => "OCI_ATTR_IS_NULL",
        }
    }
}

bitflags! {
    /// Environment creation mode.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EnvMode: u32 {
        const DEFAULT = 0x0;
        const THREADED = 0x1;
        const OBJECT = 0x2;
    }
}

bitflags! {
    /// Statement execution mode.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ExecMode: u32 {
        const DEFAULT = 0x0;
        const DESCRIBE_ONLY = 0x10;
        const COMMIT_ON_SUCCESS = 0x20;
    }
}

/// How a session authenticates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Credentials {
    /// Username and password attributes of the session handle.
    Rdbms = 1,
    /// External (OS) authentication.
    External = 2,
}

/// Direction of a fetch call. Only forward cursors are used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum FetchOrientation {
    Next = 0x02,
}

/// Statement type reported through [`Attr::StmtType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementType {
    Select,
    Update,
    Delete,
    Insert,
    Create,
    Drop,
    Alter,
    Begin,
    Declare,
    Call,
    Merge,
    Unknown(u16),
}

impl StatementType {
    pub fn code(self) -> u16 {
        match self {
            StatementType::Select => 1,
            StatementType::Update => 2,
            StatementType::Delete => 3,
            StatementType::Insert => 4,
            StatementType::Create => 5,
            StatementType::Drop => 6,
            StatementType::Alter => 7,
            StatementType::Begin => 8,
            StatementType::Declare => 9,
            StatementType::Call => 10,
            StatementType::Merge => 16,
            StatementType::Unknown(code) => code,
        }
    }
}

impl From<u16> for StatementType {
    fn from(code: u16) -> Self {
        match code {
            1 => StatementType::Select,
            2 => StatementType::Update,
            3 => StatementType::Delete,
            4 => StatementType::Insert,
            5 => StatementType::Create,
            6 => StatementType::Drop,
            7 => StatementType::Alter,
            8 => StatementType::Begin,
            9 => StatementType::Declare,
            10 => StatementType::Call,
            16 => StatementType::Merge,
            other => StatementType::Unknown(other),
        }
    }
}

/// External data types the column buffers are defined with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ExternalType {
    /// Native-endian signed integer (`SQLT_INT`).
    Int = 3,
    /// NUL-terminated string (`SQLT_STR`).
    Str = 5,
    /// Seven byte date (`SQLT_DAT`).
    Dat = 12,
    /// IEEE 754 double (`SQLT_BDOUBLE`).
    BDouble = 22,
    /// Raw bytes (`SQLT_BIN`).
    Bin = 23,
}

impl ExternalType {
    #[inline]
    pub fn code(self) -> u16 {
        self as u16
    }
}

/// One column buffer, as handed to [`Oci::define_by_pos`].
///
/// The buffer holds `rows` slots of `slot_size` bytes each, laid out back to back, with one
/// indicator and one returned-length entry per slot.
#[derive(Debug, Clone, Copy)]
pub struct DefineTarget {
    pub external_type: ExternalType,
    pub data: *mut u8,
    pub slot_size: usize,
    pub indicators: *mut i16,
    pub lengths: *mut u16,
    pub rows: usize,
}

// SAFETY: a target is plain addresses; the driver only writes through them while a fetch
// call runs on the thread that owns the rowset the buffers belong to.
unsafe impl Send for DefineTarget {}

/// The native client library, as seen by the backend.
///
/// Every method corresponds to one call of the C interface and returns its status unchanged.
/// Handles are opaque copies; ownership of what they point to is tracked by
/// [`HandleGuard`](super::HandleGuard), never by the driver.
pub trait Oci: Debug + 'static {
    type Handle: Copy + Debug + Eq;

    /// Creates a new environment handle.
    fn env_create(&self, mode: EnvMode, env: &mut Option<Self::Handle>) -> Status;

    /// Allocates a handle of `handle_type` against `parent` (always the environment).
    fn handle_alloc(
        &self,
        parent: Self::Handle,
        handle_type: HandleType,
        handle: &mut Option<Self::Handle>,
    ) -> Status;

    fn handle_free(&self, handle: Self::Handle, handle_type: HandleType) -> Status;

    fn descriptor_free(&self, descriptor: Self::Handle, handle_type: HandleType) -> Status;

    fn attr_set_int(
        &self,
        target: Self::Handle,
        target_type: HandleType,
        attr: Attr,
        value: u32,
        err: Self::Handle,
    ) -> Status;

    fn attr_set_text(
        &self,
        target: Self::Handle,
        target_type: HandleType,
        attr: Attr,
        value: &str,
        err: Self::Handle,
    ) -> Status;

    fn attr_set_handle(
        &self,
        target: Self::Handle,
        target_type: HandleType,
        attr: Attr,
        value: Self::Handle,
        err: Self::Handle,
    ) -> Status;

    /// Reads an integer attribute, sign-extended or widened to `i64` whatever its native width.
    fn attr_get_int(
        &self,
        target: Self::Handle,
        target_type: HandleType,
        attr: Attr,
        err: Self::Handle,
        value: &mut i64,
    ) -> Status;

    fn attr_get_text(
        &self,
        target: Self::Handle,
        target_type: HandleType,
        attr: Attr,
        err: Self::Handle,
        value: &mut String,
    ) -> Status;

    fn server_attach(&self, server: Self::Handle, err: Self::Handle, dblink: &str) -> Status;

    fn server_detach(&self, server: Self::Handle, err: Self::Handle) -> Status;

    fn session_begin(
        &self,
        svc: Self::Handle,
        err: Self::Handle,
        session: Self::Handle,
        credentials: Credentials,
    ) -> Status;

    fn session_end(&self, svc: Self::Handle, err: Self::Handle, session: Self::Handle) -> Status;

    fn stmt_prepare(&self, stmt: Self::Handle, err: Self::Handle, sql: &str) -> Status;

    fn stmt_execute(
        &self,
        svc: Self::Handle,
        stmt: Self::Handle,
        err: Self::Handle,
        iters: u32,
        mode: ExecMode,
    ) -> Status;

    /// Fetches up to `rows` rows into the defined buffers. `rows == 0` cancels the cursor.
    fn stmt_fetch(
        &self,
        stmt: Self::Handle,
        err: Self::Handle,
        rows: u32,
        orientation: FetchOrientation,
    ) -> Status;

    /// Gets the parameter descriptor of the column at the 1-based `position`.
    fn param_get(
        &self,
        stmt: Self::Handle,
        err: Self::Handle,
        position: u32,
        param: &mut Option<Self::Handle>,
    ) -> Status;

    /// Registers the output buffer of the column at the 1-based `position`.
    ///
    /// # Safety
    ///
    /// Every pointer in `target` must stay valid for `rows` slots until the statement is
    /// re-defined at `position`, or freed. Fetching writes through them.
    unsafe fn define_by_pos(
        &self,
        stmt: Self::Handle,
        err: Self::Handle,
        position: u32,
        target: DefineTarget,
    ) -> Status;

    fn trans_commit(&self, svc: Self::Handle, err: Self::Handle) -> Status;

    fn trans_rollback(&self, svc: Self::Handle, err: Self::Handle) -> Status;

    fn ping(&self, svc: Self::Handle, err: Self::Handle) -> Status;

    fn server_version(&self, svc: Self::Handle, err: Self::Handle, version: &mut String)
        -> Status;

    /// Reads diagnostic record `record` (1-based) from an error handle: `(code, message)`.
    fn error_get(&self, err: Self::Handle, record: u32) -> Option<(i32, String)>;
}
