use orbis_vmem::{GuestMemoryError, MapError};
use thiserror::Error;

/// POSIX error numbers returned (negated) to the guest.
pub mod errno {
    pub const ENOMEM: i32 = 12;
    pub const EFAULT: i32 = 14;
    pub const ENODEV: i32 = 19;
    pub const EINVAL: i32 = 22;
}

/// Why a `/dev/gc` request did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GcError {
    #[error("failed to map the submission ring: {0}")]
    OutOfMemory(#[source] MapError),
    /// Deliberate negative answer to a capability probe.
    #[error("no such device")]
    NoDevice,
    #[error("unknown mip stats report type {0:#x}")]
    InvalidMipStatsType(u32),
    /// An argument pointer does not resolve to mapped guest memory.
    #[error("guest fault: {0}")]
    Fault(#[from] GuestMemoryError),
    /// The argument block was readable but did not decode as the command's structure.
    #[error("malformed {size}-byte argument block at {addr:#x}")]
    MalformedArgument { addr: u64, size: usize },
}

impl GcError {
    pub fn errno(&self) -> i32 {
        match self {
            Self::OutOfMemory(_) => errno::ENOMEM,
            Self::NoDevice => errno::ENODEV,
            Self::InvalidMipStatsType(_) => errno::EINVAL,
            Self::Fault(_) | Self::MalformedArgument { .. } => errno::EFAULT,
        }
    }

    /// Value returned from `ioctl`: the negated errno.
    pub fn status(&self) -> i32 {
        -self.errno()
    }
}
