//! File-like surface of a device node as seen by the kernel's descriptor table.

use std::sync::Arc;

use tracing::{debug, debug_span, warn};

use crate::args::IoctlArgs;
use crate::config::GcConfigError;
use crate::dispatch::{GcContext, GcDispatcher};

/// One element of a vectored I/O request. `base` is a guest address.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IoVec {
    pub base: u64,
    pub len: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Whence {
    Set,
    Current,
    End,
}

/// Guest `struct stat` as filled in by `fstat`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KernelStat {
    pub dev: u32,
    pub ino: u32,
    pub mode: u16,
    pub nlink: u16,
    pub uid: u32,
    pub gid: u32,
    pub rdev: u32,
    pub size: i64,
    pub blocks: i64,
    pub blksize: u32,
    pub flags: u32,
}

/// Operations every device kind exposes through an open handle.
///
/// Return values follow the guest syscall conventions: byte counts or offsets for the stream
/// operations, `0` / `-errno` for the rest.
pub trait Device: Send + Sync {
    fn ioctl(&self, cmd: u64, args: &mut IoctlArgs<'_>) -> i32;
    fn write(&self, buf: u64, nbytes: usize) -> i64;
    fn read(&self, buf: u64, nbytes: usize) -> i64;
    fn readv(&self, iov: &[IoVec]) -> usize;
    fn writev(&self, iov: &[IoVec]) -> usize;
    fn preadv(&self, iov: &[IoVec], offset: u64) -> i64;
    fn pwrite(&self, buf: u64, nbytes: usize, offset: u64) -> i64;
    fn lseek(&self, offset: i64, whence: Whence) -> i64;
    fn fstat(&self, stat: &mut KernelStat) -> i32;
    fn fsync(&self) -> i32;
    fn ftruncate(&self, length: i64) -> i32;
    fn getdents(&self, buf: u64, nbytes: u32, basep: Option<&mut i64>) -> i32;
}

/// An open `/dev/gc` handle.
///
/// Only `ioctl` does anything; the byte-stream operations are accepted and report zero bytes,
/// since the node is not a stream device.
pub struct GcDevice {
    handle: u32,
    dispatcher: GcDispatcher,
}

impl GcDevice {
    pub fn create(
        handle: u32,
        path: &str,
        flags: i32,
        mode: u16,
        ctx: GcContext,
    ) -> Result<Arc<dyn Device>, GcConfigError> {
        let dispatcher = GcDispatcher::new(ctx)?;
        debug!(handle, path, flags, mode, "opened gc device");
        Ok(Arc::new(Self { handle, dispatcher }))
    }

    pub fn handle(&self) -> u32 {
        self.handle
    }

    pub fn dispatcher(&self) -> &GcDispatcher {
        &self.dispatcher
    }
}

impl Device for GcDevice {
    fn ioctl(&self, cmd: u64, args: &mut IoctlArgs<'_>) -> i32 {
        let _span = debug_span!("gc", handle = self.handle).entered();
        self.dispatcher.dispatch(cmd, args)
    }

    fn write(&self, _buf: u64, _nbytes: usize) -> i64 {
        warn!("(STUBBED) write called");
        0
    }

    fn read(&self, _buf: u64, _nbytes: usize) -> i64 {
        warn!("(STUBBED) read called");
        0
    }

    fn readv(&self, _iov: &[IoVec]) -> usize {
        warn!("(STUBBED) readv called");
        0
    }

    fn writev(&self, _iov: &[IoVec]) -> usize {
        warn!("(STUBBED) writev called");
        0
    }

    fn preadv(&self, _iov: &[IoVec], _offset: u64) -> i64 {
        warn!("(STUBBED) preadv called");
        0
    }

    fn pwrite(&self, _buf: u64, _nbytes: usize, _offset: u64) -> i64 {
        warn!("(STUBBED) pwrite called");
        0
    }

    fn lseek(&self, _offset: i64, _whence: Whence) -> i64 {
        warn!("(STUBBED) lseek called");
        0
    }

    fn fstat(&self, _stat: &mut KernelStat) -> i32 {
        warn!("(STUBBED) fstat called");
        0
    }

    fn fsync(&self) -> i32 {
        warn!("(STUBBED) fsync called");
        0
    }

    fn ftruncate(&self, _length: i64) -> i32 {
        warn!("(STUBBED) ftruncate called");
        0
    }

    fn getdents(&self, _buf: u64, _nbytes: u32, _basep: Option<&mut i64>) -> i32 {
        warn!("(STUBBED) getdents called");
        0
    }
}
