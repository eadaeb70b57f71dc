//! Command codes understood by `/dev/gc`.

use crate::ioctl::IoctlCode;
use crate::layout::{
    GuestStruct, MapComputeQueueArgs, MipStatsReportArgs, SetGsRingSizesArgs,
    SetWaveLimitMultipliersArgs, SubmitArgs, SubmitEopArgs, CU_MASK_WORDS,
};

#[repr(u64)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GcCommand {
    /// Flush the Garlic (CPU-coherent) bus.
    FlushGarlic = 0xc004_8114,
    SubmitDone = 0xc004_8116,
    WaitIdle = 0xc004_8117,
    WaitFree = 0xc004_811d,
    /// Number of texture-cache-attached compute units.
    GetNumTcaUnits = 0xc004_811f,
    SwitchBuffer = 0xc008_8101,
    DebugHardwareStatus = 0xc008_8111,
    InitializeSubmits = 0xc008_811b,
    UnmapComputeQueue = 0xc00c_810e,
    SetGsRingSizes = 0xc00c_8110,
    Submit = 0xc010_8102,
    GetCuMask = 0xc010_810b,
    DingDong = 0xc010_811c,
    /// Probe for the "Neo" (enhanced hardware) compatibility path.
    RequiresNeoCompat = 0xc010_8120,
    /// Submit with an end-of-pipe event.
    SubmitEop = 0xc020_810c,
    MapComputeQueue = 0xc030_810d,
    MapComputeQueueWithPriority = 0xc030_811a,
    SetWaveLimitMultipliers = 0xc030_811e,
    MipStatsReport = 0xc084_8119,
}

/// What a command pulls out of its argument list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GcArgLayout {
    /// Nothing is extracted.
    None,
    /// One pointer to a `u32` output slot.
    OutU32,
    /// One pointer to a 64-bit guest-address output slot.
    OutAddr,
    /// One pointer to [`CU_MASK_WORDS`] consecutive `u32` output slots.
    OutCuMask,
    /// One pointer to an argument structure of the given size.
    Struct(usize),
}

impl GcCommand {
    pub const ALL: [GcCommand; 19] = [
        Self::FlushGarlic,
        Self::SubmitDone,
        Self::WaitIdle,
        Self::WaitFree,
        Self::GetNumTcaUnits,
        Self::SwitchBuffer,
        Self::DebugHardwareStatus,
        Self::InitializeSubmits,
        Self::UnmapComputeQueue,
        Self::SetGsRingSizes,
        Self::Submit,
        Self::GetCuMask,
        Self::DingDong,
        Self::RequiresNeoCompat,
        Self::SubmitEop,
        Self::MapComputeQueue,
        Self::MapComputeQueueWithPriority,
        Self::SetWaveLimitMultipliers,
        Self::MipStatsReport,
    ];

    pub const fn from_u64(v: u64) -> Option<Self> {
        match v {
            0xc004_8114 => Some(Self::FlushGarlic),
            0xc004_8116 => Some(Self::SubmitDone),
            0xc004_8117 => Some(Self::WaitIdle),
            0xc004_811d => Some(Self::WaitFree),
            0xc004_811f => Some(Self::GetNumTcaUnits),
            0xc008_8101 => Some(Self::SwitchBuffer),
            0xc008_8111 => Some(Self::DebugHardwareStatus),
            0xc008_811b => Some(Self::InitializeSubmits),
            0xc00c_810e => Some(Self::UnmapComputeQueue),
            0xc00c_8110 => Some(Self::SetGsRingSizes),
            0xc010_8102 => Some(Self::Submit),
            0xc010_810b => Some(Self::GetCuMask),
            0xc010_811c => Some(Self::DingDong),
            0xc010_8120 => Some(Self::RequiresNeoCompat),
            0xc020_810c => Some(Self::SubmitEop),
            0xc030_810d => Some(Self::MapComputeQueue),
            0xc030_811a => Some(Self::MapComputeQueueWithPriority),
            0xc030_811e => Some(Self::SetWaveLimitMultipliers),
            0xc084_8119 => Some(Self::MipStatsReport),
            _ => None,
        }
    }

    pub const fn code(self) -> IoctlCode {
        IoctlCode(self as u64)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::FlushGarlic => "FlushGarlic",
            Self::SubmitDone => "SubmitDone",
            Self::WaitIdle => "WaitIdle",
            Self::WaitFree => "WaitFree",
            Self::GetNumTcaUnits => "GetNumTcaUnits",
            Self::SwitchBuffer => "SwitchBuffer",
            Self::DebugHardwareStatus => "DebugHardwareStatus",
            Self::InitializeSubmits => "InitializeSubmits",
            Self::UnmapComputeQueue => "UnmapComputeQueue",
            Self::SetGsRingSizes => "SetGsRingSizes",
            Self::Submit => "Submit",
            Self::GetCuMask => "GetCuMask",
            Self::DingDong => "DingDong",
            Self::RequiresNeoCompat => "RequiresNeoCompat",
            Self::SubmitEop => "SubmitEop",
            Self::MapComputeQueue => "MapComputeQueue",
            Self::MapComputeQueueWithPriority => "MapComputeQueueWithPriority",
            Self::SetWaveLimitMultipliers => "SetWaveLimitMultipliers",
            Self::MipStatsReport => "MipStatsReport",
        }
    }

    pub const fn arg_layout(self) -> GcArgLayout {
        match self {
            Self::FlushGarlic
            | Self::SubmitDone
            | Self::WaitIdle
            | Self::WaitFree
            | Self::SwitchBuffer
            | Self::DebugHardwareStatus
            | Self::UnmapComputeQueue
            | Self::DingDong
            | Self::RequiresNeoCompat => GcArgLayout::None,
            Self::GetNumTcaUnits => GcArgLayout::OutU32,
            Self::InitializeSubmits => GcArgLayout::OutAddr,
            Self::GetCuMask => GcArgLayout::OutCuMask,
            Self::SetGsRingSizes => GcArgLayout::Struct(SetGsRingSizesArgs::SIZE_BYTES),
            Self::Submit => GcArgLayout::Struct(SubmitArgs::SIZE_BYTES),
            Self::SubmitEop => GcArgLayout::Struct(SubmitEopArgs::SIZE_BYTES),
            Self::MapComputeQueue | Self::MapComputeQueueWithPriority => {
                GcArgLayout::Struct(MapComputeQueueArgs::SIZE_BYTES)
            }
            Self::SetWaveLimitMultipliers => {
                GcArgLayout::Struct(SetWaveLimitMultipliersArgs::SIZE_BYTES)
            }
            Self::MipStatsReport => GcArgLayout::Struct(MipStatsReportArgs::SIZE_BYTES),
        }
    }

    /// Bytes the guest may touch through this command's pointer argument.
    pub const fn arg_bytes(self) -> usize {
        match self.arg_layout() {
            GcArgLayout::None => 0,
            GcArgLayout::OutU32 => 4,
            GcArgLayout::OutAddr => 8,
            GcArgLayout::OutCuMask => CU_MASK_WORDS * 4,
            GcArgLayout::Struct(size) => size,
        }
    }
}

impl TryFrom<u64> for GcCommand {
    type Error = u64;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::from_u64(value).ok_or(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_u64_covers_every_variant() {
        for cmd in GcCommand::ALL {
            assert_eq!(GcCommand::from_u64(cmd as u64), Some(cmd), "{}", cmd.name());
        }
    }

    #[test]
    fn unknown_codes_are_not_recognized() {
        assert_eq!(GcCommand::from_u64(0), None);
        assert_eq!(GcCommand::from_u64(0xc004_8115), None);
        assert_eq!(GcCommand::try_from(0xdead_beef_u64), Err(0xdead_beef));
    }
}
