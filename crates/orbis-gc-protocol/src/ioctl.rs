//! BSD `_IOC`-style command code packing.
//!
//! ```text
//!  63           32 31 30 29        16 15      8 7       0
//! +---------------+-----+------------+---------+---------+
//! |   (unused)    | dir | param size |  group  | number  |
//! +---------------+-----+------------+---------+---------+
//! ```
//!
//! Every `/dev/gc` command uses group `0x81` and direction `IN | OUT`.

use core::fmt;

/// Group byte shared by all graphics-core commands.
pub const GC_IOCTL_GROUP: u8 = 0x81;

const NUMBER_MASK: u64 = 0xff;
const GROUP_SHIFT: u32 = 8;
const GROUP_MASK: u64 = 0xff;
const SIZE_SHIFT: u32 = 16;
const SIZE_MASK: u64 = 0x1fff;
const DIR_SHIFT: u32 = 30;
const DIR_MASK: u64 = 0b11;

/// Transfer direction encoded in the top bits of a command code.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IoctlDirection {
    /// `IOC_VOID`: the command carries no parameter block.
    Void = 0b00,
    /// `IOC_OUT`: the kernel writes the parameter block.
    Out = 0b01,
    /// `IOC_IN`: the kernel reads the parameter block.
    In = 0b10,
    /// `IOC_INOUT`: both.
    InOut = 0b11,
}

impl IoctlDirection {
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => Self::Void,
            0b01 => Self::Out,
            0b10 => Self::In,
            _ => Self::InOut,
        }
    }
}

/// A raw 64-bit command code as issued by the guest.
///
/// Any value is representable; whether the device recognizes it is decided by
/// [`crate::GcCommand::from_u64`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct IoctlCode(pub u64);

impl IoctlCode {
    pub const fn encode(dir: IoctlDirection, group: u8, number: u8, param_size: u16) -> Self {
        Self(
            ((dir as u64 & DIR_MASK) << DIR_SHIFT)
                | ((param_size as u64 & SIZE_MASK) << SIZE_SHIFT)
                | ((group as u64) << GROUP_SHIFT)
                | number as u64,
        )
    }

    pub const fn raw(self) -> u64 {
        self.0
    }

    pub const fn direction(self) -> IoctlDirection {
        IoctlDirection::from_bits(((self.0 >> DIR_SHIFT) & DIR_MASK) as u8)
    }

    /// Size in bytes of the parameter block the guest packed for this command.
    pub const fn param_size(self) -> u16 {
        ((self.0 >> SIZE_SHIFT) & SIZE_MASK) as u16
    }

    pub const fn group(self) -> u8 {
        ((self.0 >> GROUP_SHIFT) & GROUP_MASK) as u8
    }

    pub const fn number(self) -> u8 {
        (self.0 & NUMBER_MASK) as u8
    }
}

impl From<u64> for IoctlCode {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Debug for IoctlCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IoctlCode")
            .field("raw", &format_args!("{:#x}", self.0))
            .field("dir", &self.direction())
            .field("size", &self.param_size())
            .field("group", &format_args!("{:#x}", self.group()))
            .field("nr", &format_args!("{:#x}", self.number()))
            .finish()
    }
}

impl fmt::LowerHex for IoctlCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}
