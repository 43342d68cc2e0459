use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use crate::error::Error;
use crate::oracle::oci::{HandleType, Oci, Status};

/// Owns exactly one native handle or descriptor and frees it exactly once.
///
/// A guard is either acquired (allocated through the driver) or adopted (taking over a
/// handle some other call created, such as the environment or a parameter descriptor).
/// It is released when dropped, or earlier with [`release`](HandleGuard::release).
pub struct HandleGuard<D: Oci> {
    driver: Arc<D>,
    handle: D::Handle,
    handle_type: HandleType,
    live: bool,
}

impl<D: Oci> HandleGuard<D> {
    /// Allocates a handle of `handle_type` against `parent`.
    pub fn acquire(
        driver: &Arc<D>,
        parent: D::Handle,
        handle_type: HandleType,
    ) -> Result<Self, Error> {
        let mut handle = None;
        let status = driver.handle_alloc(parent, handle_type, &mut handle);

        log::trace!("OCIHandleAlloc({}): {}", handle_type, status);

        match handle {
            Some(handle) if status.is_success() => Ok(Self::adopt(driver, handle, handle_type)),

            // a handle returned alongside a failure is still ours to free
            Some(handle) => {
                drop(Self::adopt(driver, handle, handle_type));

                Err(Error::Resource {
                    kind: handle_type.name(),
                    status: status.0,
                })
            }

            None => Err(Error::Resource {
                kind: handle_type.name(),
                status: if status.is_success() {
                    Status::INVALID_HANDLE.0
                } else {
                    status.0
                },
            }),
        }
    }

    /// Takes ownership of an already created handle.
    pub fn adopt(driver: &Arc<D>, handle: D::Handle, handle_type: HandleType) -> Self {
        Self {
            driver: Arc::clone(driver),
            handle,
            handle_type,
            live: true,
        }
    }

    /// The raw handle, for passing to the driver.
    ///
    /// After [`release`](HandleGuard::release) this is a dangling value the driver will reject.
    #[inline]
    pub fn get(&self) -> D::Handle {
        self.handle
    }

    #[inline]
    pub fn handle_type(&self) -> HandleType {
        self.handle_type
    }

    #[inline]
    pub fn is_live(&self) -> bool {
        self.live
    }

    /// Frees the handle now. Calling this more than once does nothing.
    pub fn release(&mut self) {
        if !self.live {
            return;
        }

        self.live = false;

        let status = if self.handle_type.is_descriptor() {
            self.driver.descriptor_free(self.handle, self.handle_type)
        } else {
            self.driver.handle_free(self.handle, self.handle_type)
        };

        log::trace!("OCIHandleFree({}): {}", self.handle_type, status);

        if !status.is_success() {
            log::warn!(
                "failed to free {} handle {:?}: {}",
                self.handle_type,
                self.handle,
                status
            );
        }
    }

    /// Gives up ownership without freeing; the caller becomes responsible for the handle.
    pub fn into_raw(mut self) -> D::Handle {
        self.live = false;
        self.handle
    }
}

impl<D: Oci> Drop for HandleGuard<D> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<D: Oci> Debug for HandleGuard<D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleGuard")
            .field("handle", &self.handle)
            .field("handle_type", &self.handle_type)
            .field("live", &self.live)
            .finish()
    }
}
