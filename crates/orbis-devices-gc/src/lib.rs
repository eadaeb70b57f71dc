//! `/dev/gc` device model.
//!
//! The guest GNM driver opens `/dev/gc` and drives the GPU through `ioctl`. This crate models
//! the kernel side of that handle:
//! - [`args`]: the per-call argument cursor and typed guest pointers,
//! - [`request`]: statically typed decoding of a command code into the pointers it carries,
//! - [`dispatch`]: the total `ioctl` dispatcher and the process-wide state it acts on,
//! - [`queue`]: compute pipe/queue bindings,
//! - [`submits`]: the lazily mapped submission ring,
//! - [`sink`]: the boundary to whatever consumes submitted command buffers, and
//! - [`device`]: the file-like [`device::Device`] surface the kernel's fd table sees.
//!
//! Guest memory and the mapper are injected ([`orbis_vmem::GuestMemory`],
//! [`orbis_vmem::MemoryMapper`]); the crate never dereferences host pointers.
#![forbid(unsafe_code)]

pub mod args;
pub mod config;
pub mod device;
pub mod dispatch;
pub mod error;
pub mod queue;
pub mod request;
pub mod sink;
pub mod submits;

pub use args::{GuestPtr, IoctlArgs};
pub use config::{GcConfigError, GcDeviceConfig};
pub use device::{Device, GcDevice, IoVec, KernelStat, Whence};
pub use dispatch::{GcContext, GcDispatcher};
pub use error::{errno, GcError};
pub use queue::{ComputeQueueSlot, ComputeQueueTable};
pub use request::GcRequest;
pub use sink::{EndOfPipe, GcCommandSink, GcSubmission, NullGcCommandSink, RecordingGcCommandSink};
pub use submits::SubmissionRing;
