//! Raw directory enumeration syscalls
//!
//! One `DirHandle` wraps an enumeration-only file descriptor and issues the
//! raw kernel call (`getdents64` on Linux, `__getdirentries64` on macOS)
//! into a caller-owned buffer. The handle is closed on drop, so every exit
//! path of a scan task releases its descriptor.

use std::ffi::CString;
use std::io;

/// Size of the reusable enumeration buffer
pub const SCAN_BUF_LEN: usize = 4 * 1024;

/// Retries when open(2) is interrupted by a signal
const OPEN_EINTR_RETRIES: u32 = 5;

/// An open directory file descriptor used only for raw enumeration
#[derive(Debug)]
pub struct DirHandle {
    fd: libc::c_int,
    /// Seek cookie updated by the kernel between calls
    #[cfg(target_os = "macos")]
    basep: i64,
}

impl DirHandle {
    /// Open `path` for enumeration-only access.
    ///
    /// Retries a bounded number of times on EINTR; any other failure (or
    /// exhausting the retries) is returned as-is for the caller to wrap
    /// with the path.
    pub fn open(path: &str) -> io::Result<Self> {
        let c_path = CString::new(path).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidInput, "path contains NUL byte")
        })?;

        let flags = libc::O_RDONLY | libc::O_DIRECTORY | libc::O_CLOEXEC;

        let mut last_err = io::Error::from_raw_os_error(libc::EINTR);
        for _ in 0..OPEN_EINTR_RETRIES {
            let fd = unsafe { libc::open(c_path.as_ptr(), flags) };
            if fd >= 0 {
                return Ok(Self {
                    fd,
                    #[cfg(target_os = "macos")]
                    basep: 0,
                });
            }

            last_err = io::Error::last_os_error();
            if last_err.raw_os_error() != Some(libc::EINTR) {
                return Err(last_err);
            }
        }
        Err(last_err)
    }

    /// Fill `buf` with raw directory records.
    ///
    /// Returns the number of valid bytes written; 0 means the directory is
    /// exhausted. The buffer contents are only meaningful up to the returned
    /// length and are overwritten by the next call.
    #[cfg(target_os = "linux")]
    pub fn read_records(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let ret = unsafe {
            libc::syscall(
                libc::SYS_getdents64,
                self.fd,
                buf.as_mut_ptr() as *mut libc::c_void,
                buf.len(),
            )
        };
        if ret < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(ret as usize)
    }

    /// Fill `buf` with raw directory records.
    ///
    /// Returns the number of valid bytes written; 0 means the directory is
    /// exhausted.
    #[cfg(target_os = "macos")]
    pub fn read_records(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        extern "C" {
            fn __getdirentries64(
                fd: libc::c_int,
                buf: *mut libc::c_void,
                nbytes: libc::size_t,
                basep: *mut i64,
            ) -> libc::ssize_t;
        }

        let ret = unsafe {
            __getdirentries64(
                self.fd,
                buf.as_mut_ptr() as *mut libc::c_void,
                buf.len(),
                &mut self.basep,
            )
        };
        if ret < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(ret as usize)
    }
}

impl Drop for DirHandle {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}
