//! [`Oci`] over the vendor client library (`libclntsh`).

use std::ptr;
use std::slice;

use libc::{c_int, c_void, size_t};

use crate::oracle::oci::{
    Attr, Credentials, DefineTarget, EnvMode, ExecMode, FetchOrientation, HandleType, Oci,
    Status,
};

type Sword = c_int;

const OCI_DEFAULT: u32 = 0;
const OCI_NTV_SYNTAX: u32 = 1;
const OCI_HTYPE_ERROR: u32 = 2;
const OCI_HTYPE_SVCCTX: u8 = 3;

// diagnostics longer than this are cut
const ERROR_BUFFER_SIZE: usize = 3072;
const VERSION_BUFFER_SIZE: usize = 512;

#[link(name = "clntsh")]
extern "C" {
    fn OCIEnvCreate(
        envhpp: *mut *mut c_void,
        mode: u32,
        ctxp: *mut c_void,
        malocfp: *const c_void,
        ralocfp: *const c_void,
        mfreefp: *const c_void,
        xtramem_sz: size_t,
        usrmempp: *mut *mut c_void,
    ) -> Sword;

    fn OCIHandleAlloc(
        parenth: *const c_void,
        hndlpp: *mut *mut c_void,
        htype: u32,
        xtramem_sz: size_t,
        usrmempp: *mut *mut c_void,
    ) -> Sword;

    fn OCIHandleFree(hndlp: *mut c_void, htype: u32) -> Sword;

    fn OCIDescriptorFree(descp: *mut c_void, dtype: u32) -> Sword;

    fn OCIAttrSet(
        trgthndlp: *mut c_void,
        trghndltyp: u32,
        attributep: *mut c_void,
        size: u32,
        attrtype: u32,
        errhp: *mut c_void,
    ) -> Sword;

    fn OCIAttrGet(
        trgthndlp: *const c_void,
        trghndltyp: u32,
        attributep: *mut c_void,
        sizep: *mut u32,
        attrtype: u32,
        errhp: *mut c_void,
    ) -> Sword;

    fn OCIServerAttach(
        srvhp: *mut c_void,
        errhp: *mut c_void,
        dblink: *const u8,
        dblink_len: i32,
        mode: u32,
    ) -> Sword;

    fn OCIServerDetach(srvhp: *mut c_void, errhp: *mut c_void, mode: u32) -> Sword;

    fn OCISessionBegin(
        svchp: *mut c_void,
        errhp: *mut c_void,
        usrhp: *mut c_void,
        credt: u32,
        mode: u32,
    ) -> Sword;

    fn OCISessionEnd(svchp: *mut c_void, errhp: *mut c_void, usrhp: *mut c_void, mode: u32)
        -> Sword;

    fn OCIStmtPrepare(
        stmtp: *mut c_void,
        errhp: *mut c_void,
        stmt: *const u8,
        stmt_len: u32,
        language: u32,
        mode: u32,
    ) -> Sword;

    fn OCIStmtExecute(
        svchp: *mut c_void,
        stmtp: *mut c_void,
        errhp: *mut c_void,
        iters: u32,
        rowoff: u32,
        snap_in: *const c_void,
        snap_out: *mut c_void,
        mode: u32,
    ) -> Sword;

    fn OCIStmtFetch2(
        stmtp: *mut c_void,
        errhp: *mut c_void,
        nrows: u32,
        orientation: u16,
        fetch_offset: i32,
        mode: u32,
    ) -> Sword;

    fn OCIParamGet(
        hndlp: *const c_void,
        htype: u32,
        errhp: *mut c_void,
        parmdpp: *mut *mut c_void,
        pos: u32,
    ) -> Sword;

    fn OCIDefineByPos(
        stmtp: *mut c_void,
        defnpp: *mut *mut c_void,
        errhp: *mut c_void,
        position: u32,
        valuep: *mut c_void,
        value_sz: i32,
        dty: u16,
        indp: *mut c_void,
        rlenp: *mut u16,
        rcodep: *mut u16,
        mode: u32,
    ) -> Sword;

    fn OCITransCommit(svchp: *mut c_void, errhp: *mut c_void, flags: u32) -> Sword;

    fn OCITransRollback(svchp: *mut c_void, errhp: *mut c_void, flags: u32) -> Sword;

    fn OCIPing(svchp: *mut c_void, errhp: *mut c_void, mode: u32) -> Sword;

    fn OCIServerVersion(
        hndlp: *mut c_void,
        errhp: *mut c_void,
        bufp: *mut u8,
        bufsz: u32,
        hndltype: u8,
    ) -> Sword;

    fn OCIErrorGet(
        hndlp: *mut c_void,
        recordno: u32,
        sqlstate: *mut u8,
        errcodep: *mut i32,
        bufp: *mut u8,
        bufsiz: u32,
        htype: u32,
    ) -> Sword;
}

/// A native handle or descriptor pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OciHandle(*mut c_void);

impl OciHandle {
    #[inline]
    fn ptr(self) -> *mut c_void {
        self.0
    }
}

fn handle(ptr: *mut c_void) -> Option<OciHandle> {
    if ptr.is_null() {
        None
    } else {
        Some(OciHandle(ptr))
    }
}

fn text(buf: &[u8]) -> String {
    let end = memchr::memchr(0, buf).unwrap_or(buf.len());

    String::from_utf8_lossy(&buf[..end]).into_owned()
}

/// The vendor client library, linked as `libclntsh`.
#[derive(Debug, Default, Clone, Copy)]
pub struct OciLib;

impl OciLib {
    pub fn new() -> Self {
        OciLib
    }
}

impl Oci for OciLib {
    type Handle = OciHandle;

    fn env_create(&self, mode: EnvMode, env: &mut Option<OciHandle>) -> Status {
        let mut ptr = ptr::null_mut();

        let status = unsafe {
            OCIEnvCreate(
                &mut ptr,
                mode.bits(),
                ptr::null_mut(),
                ptr::null(),
                ptr::null(),
                ptr::null(),
                0,
                ptr::null_mut(),
            )
        };

        *env = handle(ptr);

        Status(status)
    }

    fn handle_alloc(
        &self,
        parent: OciHandle,
        handle_type: HandleType,
        out: &mut Option<OciHandle>,
    ) -> Status {
        let mut ptr = ptr::null_mut();

        let status = unsafe {
            OCIHandleAlloc(
                parent.ptr(),
                &mut ptr,
                handle_type.code(),
                0,
                ptr::null_mut(),
            )
        };

        *out = handle(ptr);

        Status(status)
    }

    fn handle_free(&self, handle: OciHandle, handle_type: HandleType) -> Status {
        Status(unsafe { OCIHandleFree(handle.ptr(), handle_type.code()) })
    }

    fn descriptor_free(&self, descriptor: OciHandle, handle_type: HandleType) -> Status {
        Status(unsafe { OCIDescriptorFree(descriptor.ptr(), handle_type.code()) })
    }

    fn attr_set_int(
        &self,
        target: OciHandle,
        target_type: HandleType,
        attr: Attr,
        value: u32,
        err: OciHandle,
    ) -> Status {
        let mut value = value;

        Status(unsafe {
            OCIAttrSet(
                target.ptr(),
                target_type.code(),
                &mut value as *mut u32 as *mut c_void,
                0,
                attr.code(),
                err.ptr(),
            )
        })
    }

    fn attr_set_text(
        &self,
        target: OciHandle,
        target_type: HandleType,
        attr: Attr,
        value: &str,
        err: OciHandle,
    ) -> Status {
        // the library copies text attributes
        Status(unsafe {
            OCIAttrSet(
                target.ptr(),
                target_type.code(),
                value.as_ptr() as *mut c_void,
                value.len() as u32,
                attr.code(),
                err.ptr(),
            )
        })
    }

    fn attr_set_handle(
        &self,
        target: OciHandle,
        target_type: HandleType,
        attr: Attr,
        value: OciHandle,
        err: OciHandle,
    ) -> Status {
        Status(unsafe {
            OCIAttrSet(
                target.ptr(),
                target_type.code(),
                value.ptr(),
                0,
                attr.code(),
                err.ptr(),
            )
        })
    }

    fn attr_get_int(
        &self,
        target: OciHandle,
        target_type: HandleType,
        attr: Attr,
        err: OciHandle,
        value: &mut i64,
    ) -> Status {
        // every attribute is written at its own width; read into a zeroed 8 byte cell and
        // interpret the prefix
        let mut cell = [0u8; 8];
        let mut size = 0u32;

        let status = unsafe {
            OCIAttrGet(
                target.ptr(),
                target_type.code(),
                cell.as_mut_ptr() as *mut c_void,
                &mut size,
                attr.code(),
                err.ptr(),
            )
        };

        *value = match attr {
            Attr::StmtType | Attr::DataType | Attr::DataSize => {
                u16::from_ne_bytes([cell[0], cell[1]]).into()
            }
            Attr::Precision => i16::from_ne_bytes([cell[0], cell[1]]).into(),
            Attr::Scale => i8::from_ne_bytes([cell[0]]).into(),
            Attr::IsNull => cell[0].into(),
            _ => u32::from_ne_bytes([cell[0], cell[1], cell[2], cell[3]]).into(),
        };

        Status(status)
    }

    fn attr_get_text(
        &self,
        target: OciHandle,
        target_type: HandleType,
        attr: Attr,
        err: OciHandle,
        value: &mut String,
    ) -> Status {
        let mut text: *mut u8 = ptr::null_mut();
        let mut len = 0u32;

        let status = unsafe {
            OCIAttrGet(
                target.ptr(),
                target_type.code(),
                &mut text as *mut *mut u8 as *mut c_void,
                &mut len,
                attr.code(),
                err.ptr(),
            )
        };

        if Status(status).is_success() && !text.is_null() {
            // SAFETY: the library returned `len` bytes owned by `target`, valid until it is
            // freed; they are copied out immediately
            let bytes = unsafe { slice::from_raw_parts(text, len as usize) };
            *value = String::from_utf8_lossy(bytes).into_owned();
        }

        Status(status)
    }

    fn server_attach(&self, server: OciHandle, err: OciHandle, dblink: &str) -> Status {
        Status(unsafe {
            OCIServerAttach(
                server.ptr(),
                err.ptr(),
                dblink.as_ptr(),
                dblink.len() as i32,
                OCI_DEFAULT,
            )
        })
    }

    fn server_detach(&self, server: OciHandle, err: OciHandle) -> Status {
        Status(unsafe { OCIServerDetach(server.ptr(), err.ptr(), OCI_DEFAULT) })
    }

    fn session_begin(
        &self,
        svc: OciHandle,
        err: OciHandle,
        session: OciHandle,
        credentials: Credentials,
    ) -> Status {
        Status(unsafe {
            OCISessionBegin(
                svc.ptr(),
                err.ptr(),
                session.ptr(),
                credentials as u32,
                OCI_DEFAULT,
            )
        })
    }

    fn session_end(&self, svc: OciHandle, err: OciHandle, session: OciHandle) -> Status {
        Status(unsafe { OCISessionEnd(svc.ptr(), err.ptr(), session.ptr(), OCI_DEFAULT) })
    }

    fn stmt_prepare(&self, stmt: OciHandle, err: OciHandle, sql: &str) -> Status {
        Status(unsafe {
            OCIStmtPrepare(
                stmt.ptr(),
                err.ptr(),
                sql.as_ptr(),
                sql.len() as u32,
                OCI_NTV_SYNTAX,
                OCI_DEFAULT,
            )
        })
    }

    fn stmt_execute(
        &self,
        svc: OciHandle,
        stmt: OciHandle,
        err: OciHandle,
        iters: u32,
        mode: ExecMode,
    ) -> Status {
        Status(unsafe {
            OCIStmtExecute(
                svc.ptr(),
                stmt.ptr(),
                err.ptr(),
                iters,
                0,
                ptr::null(),
                ptr::null_mut(),
                mode.bits(),
            )
        })
    }

    fn stmt_fetch(
        &self,
        stmt: OciHandle,
        err: OciHandle,
        rows: u32,
        orientation: FetchOrientation,
    ) -> Status {
        Status(unsafe {
            OCIStmtFetch2(
                stmt.ptr(),
                err.ptr(),
                rows,
                orientation as u16,
                0,
                OCI_DEFAULT,
            )
        })
    }

    fn param_get(
        &self,
        stmt: OciHandle,
        err: OciHandle,
        position: u32,
        param: &mut Option<OciHandle>,
    ) -> Status {
        let mut ptr = ptr::null_mut();

        let status = unsafe {
            OCIParamGet(
                stmt.ptr(),
                HandleType::Stmt.code(),
                err.ptr(),
                &mut ptr,
                position,
            )
        };

        *param = handle(ptr);

        Status(status)
    }

    unsafe fn define_by_pos(
        &self,
        stmt: OciHandle,
        err: OciHandle,
        position: u32,
        target: DefineTarget,
    ) -> Status {
        // the define handle belongs to the statement and is freed with it
        let mut define = ptr::null_mut();

        Status(OCIDefineByPos(
            stmt.ptr(),
            &mut define,
            err.ptr(),
            position,
            target.data as *mut c_void,
            target.slot_size as i32,
            target.external_type.code(),
            target.indicators as *mut c_void,
            target.lengths,
            ptr::null_mut(),
            OCI_DEFAULT,
        ))
    }

    fn trans_commit(&self, svc: OciHandle, err: OciHandle) -> Status {
        Status(unsafe { OCITransCommit(svc.ptr(), err.ptr(), OCI_DEFAULT) })
    }

    fn trans_rollback(&self, svc: OciHandle, err: OciHandle) -> Status {
        Status(unsafe { OCITransRollback(svc.ptr(), err.ptr(), OCI_DEFAULT) })
    }

    fn ping(&self, svc: OciHandle, err: OciHandle) -> Status {
        Status(unsafe { OCIPing(svc.ptr(), err.ptr(), OCI_DEFAULT) })
    }

    fn server_version(&self, svc: OciHandle, err: OciHandle, version: &mut String) -> Status {
        let mut buf = [0u8; VERSION_BUFFER_SIZE];

        let status = unsafe {
            OCIServerVersion(
                svc.ptr(),
                err.ptr(),
                buf.as_mut_ptr(),
                buf.len() as u32,
                OCI_HTYPE_SVCCTX,
            )
        };

        if Status(status).is_success() {
            *version = text(&buf);
        }

        Status(status)
    }

    fn error_get(&self, err: OciHandle, record: u32) -> Option<(i32, String)> {
        let mut code = 0i32;
        let mut buf = [0u8; ERROR_BUFFER_SIZE];

        let status = unsafe {
            OCIErrorGet(
                err.ptr(),
                record,
                ptr::null_mut(),
                &mut code,
                buf.as_mut_ptr(),
                buf.len() as u32,
                OCI_HTYPE_ERROR,
            )
        };

        if Status(status) == Status::SUCCESS {
            Some((code, text(&buf)))
        } else {
            None
        }
    }
}
