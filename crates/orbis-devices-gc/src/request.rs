//! Command code → typed request.
//!
//! Each variant carries exactly the arguments its command extracts, so handlers never
//! reinterpret an untyped pointer.

use orbis_gc_protocol::{
    GcCommand, MapComputeQueueArgs, MipStatsReportArgs, SetGsRingSizesArgs,
    SetWaveLimitMultipliersArgs, SubmitArgs, SubmitEopArgs, CU_MASK_WORDS,
};

use crate::args::{GuestPtr, IoctlArgs};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GcRequest {
    FlushGarlic,
    SubmitDone,
    WaitIdle,
    WaitFree,
    GetNumTcaUnits { out: GuestPtr<u32> },
    SwitchBuffer,
    DebugHardwareStatus,
    InitializeSubmits { out: GuestPtr<u64> },
    UnmapComputeQueue,
    SetGsRingSizes(GuestPtr<SetGsRingSizesArgs>),
    Submit(GuestPtr<SubmitArgs>),
    GetCuMask { out: GuestPtr<[u32; CU_MASK_WORDS]> },
    DingDong,
    RequiresNeoCompat,
    SubmitEop(GuestPtr<SubmitEopArgs>),
    MapComputeQueue(GuestPtr<MapComputeQueueArgs>),
    MapComputeQueueWithPriority(GuestPtr<MapComputeQueueArgs>),
    SetWaveLimitMultipliers(GuestPtr<SetWaveLimitMultipliersArgs>),
    MipStatsReport(GuestPtr<MipStatsReportArgs>),
    /// A code outside the known set. Nothing is extracted.
    Unknown(u64),
}

impl GcRequest {
    /// Pulls the command's arguments off `args`. Total over all `code` values.
    pub fn decode(code: u64, args: &mut IoctlArgs<'_>) -> Self {
        let Some(cmd) = GcCommand::from_u64(code) else {
            return Self::Unknown(code);
        };
        match cmd {
            GcCommand::FlushGarlic => Self::FlushGarlic,
            GcCommand::SubmitDone => Self::SubmitDone,
            GcCommand::WaitIdle => Self::WaitIdle,
            GcCommand::WaitFree => Self::WaitFree,
            GcCommand::GetNumTcaUnits => Self::GetNumTcaUnits {
                out: args.next_ptr(),
            },
            GcCommand::SwitchBuffer => Self::SwitchBuffer,
            GcCommand::DebugHardwareStatus => Self::DebugHardwareStatus,
            GcCommand::InitializeSubmits => Self::InitializeSubmits {
                out: args.next_ptr(),
            },
            GcCommand::UnmapComputeQueue => Self::UnmapComputeQueue,
            GcCommand::SetGsRingSizes => Self::SetGsRingSizes(args.next_ptr()),
            GcCommand::Submit => Self::Submit(args.next_ptr()),
            GcCommand::GetCuMask => Self::GetCuMask {
                out: args.next_ptr(),
            },
            GcCommand::DingDong => Self::DingDong,
            GcCommand::RequiresNeoCompat => Self::RequiresNeoCompat,
            GcCommand::SubmitEop => Self::SubmitEop(args.next_ptr()),
            GcCommand::MapComputeQueue => Self::MapComputeQueue(args.next_ptr()),
            GcCommand::MapComputeQueueWithPriority => {
                Self::MapComputeQueueWithPriority(args.next_ptr())
            }
            GcCommand::SetWaveLimitMultipliers => Self::SetWaveLimitMultipliers(args.next_ptr()),
            GcCommand::MipStatsReport => Self::MipStatsReport(args.next_ptr()),
        }
    }

    pub fn command(&self) -> Option<GcCommand> {
        let cmd = match self {
            Self::FlushGarlic => GcCommand::FlushGarlic,
            Self::SubmitDone => GcCommand::SubmitDone,
            Self::WaitIdle => GcCommand::WaitIdle,
            Self::WaitFree => GcCommand::WaitFree,
            Self::GetNumTcaUnits { .. } => GcCommand::GetNumTcaUnits,
            Self::SwitchBuffer => GcCommand::SwitchBuffer,
            Self::DebugHardwareStatus => GcCommand::DebugHardwareStatus,
            Self::InitializeSubmits { .. } => GcCommand::InitializeSubmits,
            Self::UnmapComputeQueue => GcCommand::UnmapComputeQueue,
            Self::SetGsRingSizes(_) => GcCommand::SetGsRingSizes,
            Self::Submit(_) => GcCommand::Submit,
            Self::GetCuMask { .. } => GcCommand::GetCuMask,
            Self::DingDong => GcCommand::DingDong,
            Self::RequiresNeoCompat => GcCommand::RequiresNeoCompat,
            Self::SubmitEop(_) => GcCommand::SubmitEop,
            Self::MapComputeQueue(_) => GcCommand::MapComputeQueue,
            Self::MapComputeQueueWithPriority(_) => GcCommand::MapComputeQueueWithPriority,
            Self::SetWaveLimitMultipliers(_) => GcCommand::SetWaveLimitMultipliers,
            Self::MipStatsReport(_) => GcCommand::MipStatsReport,
            Self::Unknown(_) => return None,
        };
        Some(cmd)
    }
}
