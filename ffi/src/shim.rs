//! Resolution of the original `write` and the per-call interception path.

use std::ffi::CStr;
use std::sync::OnceLock;

use libc::{c_int, c_void, size_t, ssize_t};
use rfwd_core::{EnvStore, Error, Interceptor, OutputSink, ProcessEnv, Result, StreamId};

use crate::diag;

/// Signature of libc `write`.
pub type WriteFn = unsafe extern "C" fn(c_int, *const c_void, size_t) -> ssize_t;

/// The `write` the shim forwards to.
#[derive(Clone, Copy)]
pub struct RealWrite {
    func: WriteFn,
}

impl RealWrite {
    /// Look up the next `write` after this library in load order.
    #[cfg(not(target_os = "macos"))]
    pub fn resolve() -> Result<Self> {
        // SAFETY: dlerror/dlsym are called with a valid NUL-terminated name.
        let sym = unsafe {
            libc::dlerror();
            libc::dlsym(libc::RTLD_NEXT, c"write".as_ptr())
        };
        if sym.is_null() {
            return Err(Error::Resolve(format!("write: {}", dlerror_message())));
        }

        // SAFETY: the symbol named `write` has libc's write signature.
        let func = unsafe { std::mem::transmute::<*mut c_void, WriteFn>(sym) };

        #[cfg(not(test))]
        ensure_distinct(func, crate::write as *const ())?;

        Ok(Self { func })
    }

    /// dyld applies `__interpose` tuples to every image except the one that
    /// declares them, so libc's `write` is still the original from here.
    #[cfg(target_os = "macos")]
    pub fn resolve() -> Result<Self> {
        Ok(Self { func: libc::write })
    }

    pub const fn from_fn(func: WriteFn) -> Self {
        Self { func }
    }

    /// Call the original `write` with the caller's arguments verbatim.
    ///
    /// # Safety
    ///
    /// Same contract as `write(2)`.
    pub unsafe fn call(&self, fd: c_int, buf: *const c_void, count: size_t) -> ssize_t {
        (self.func)(fd, buf, count)
    }
}

impl OutputSink for RealWrite {
    type Output = ssize_t;

    fn forward(&self, stream: StreamId, bytes: &[u8]) -> ssize_t {
        // SAFETY: `bytes` is a valid slice for the duration of the call.
        unsafe { self.call(stream.as_raw(), bytes.as_ptr().cast(), bytes.len()) }
    }
}

/// Reject a resolved `write` that is the shim's own export.
#[cfg_attr(any(test, target_os = "macos"), allow(dead_code))]
fn ensure_distinct(func: WriteFn, own: *const ()) -> Result<()> {
    if func as *const () == own {
        return Err(Error::Resolve("write resolved to the shim itself".to_string()));
    }
    Ok(())
}

#[cfg(not(target_os = "macos"))]
fn dlerror_message() -> String {
    // SAFETY: dlerror returns NULL or a NUL-terminated string owned by libdl.
    unsafe {
        let err = libc::dlerror();
        if err.is_null() {
            "symbol not found".to_string()
        } else {
            CStr::from_ptr(err).to_string_lossy().into_owned()
        }
    }
}

pub type Shim = Interceptor<RealWrite, ProcessEnv>;

static SHIM: OnceLock<Result<Shim>> = OnceLock::new();

/// Resolve the original `write` once and build the interceptor around it.
///
/// Nothing here may call `write`: a call during initialization would wait on
/// the very `OnceLock` being initialized.
pub fn install() -> std::result::Result<&'static Shim, &'static Error> {
    SHIM.get_or_init(|| RealWrite::resolve().map(|real| Interceptor::new(real, ProcessEnv::new())))
        .as_ref()
}

/// Body of the exported `write`.
///
/// # Safety
///
/// Same contract as `write(2)`.
#[cfg_attr(test, allow(dead_code))]
pub unsafe fn intercepted_write(fd: c_int, buf: *const c_void, count: size_t) -> ssize_t {
    match install() {
        Ok(shim) => handle(shim, fd, buf, count),
        Err(e) => diag::fatal(&format!("cannot forward write({}): {}", fd, e)),
    }
}

/// Inspect and forward one raw `write` call.
///
/// # Safety
///
/// Same contract as `write(2)`.
pub unsafe fn handle<E: EnvStore>(
    shim: &Interceptor<RealWrite, E>,
    fd: c_int,
    buf: *const c_void,
    count: size_t,
) -> ssize_t {
    // No slice can describe these; let the original report the error
    if buf.is_null() || count > isize::MAX as usize {
        return shim.sink().call(fd, buf, count);
    }

    let bytes = std::slice::from_raw_parts(buf.cast::<u8>(), count);
    shim.emit(StreamId::from_raw(fd), bytes)
}
