//! Argument structures carried by `/dev/gc` commands.
//!
//! Field order and widths are the guest ABI. The Rust structs are `#[repr(C)]` so the
//! compile-time assertions below pin the layout, but all guest I/O goes through the explicit
//! little-endian decode/encode helpers rather than transmutes.

use core::mem::{offset_of, size_of};

/// Number of `u32` words written by `GetCuMask`.
pub const CU_MASK_WORDS: usize = 4;

/// Number of per-stage scaling values in [`SetWaveLimitMultipliersArgs`].
pub const WAVE_LIMIT_VALUES: usize = 8;

/// Report types accepted by `MipStatsReport`.
pub const MIP_STATS_TYPE_A: u32 = 0x1_0001;
pub const MIP_STATS_TYPE_B: u32 = 0x1_8001;

/// A fixed-size structure that lives in guest memory.
pub trait GuestStruct: Sized + Copy {
    const SIZE_BYTES: usize;

    /// Returns `None` if `buf` is shorter than [`Self::SIZE_BYTES`].
    fn decode_from_le_bytes(buf: &[u8]) -> Option<Self>;

    /// Serializes into exactly [`Self::SIZE_BYTES`] bytes.
    fn encode_to_le_bytes(&self) -> Vec<u8>;
}

fn le_u32(buf: &[u8], off: usize) -> u32 {
    let mut b = [0u8; 4];
    b.copy_from_slice(&buf[off..off + 4]);
    u32::from_le_bytes(b)
}

fn le_i32(buf: &[u8], off: usize) -> i32 {
    le_u32(buf, off) as i32
}

fn le_u64(buf: &[u8], off: usize) -> u64 {
    let mut b = [0u8; 8];
    b.copy_from_slice(&buf[off..off + 8]);
    u64::from_le_bytes(b)
}

fn put_u32(buf: &mut [u8], off: usize, v: u32) {
    buf[off..off + 4].copy_from_slice(&v.to_le_bytes());
}

fn put_u64(buf: &mut [u8], off: usize, v: u64) {
    buf[off..off + 8].copy_from_slice(&v.to_le_bytes());
}

/// `SetGsRingSizes`: ES→GS and GS→VS ring sizes.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SetGsRingSizesArgs {
    pub esgs_ring_size: u32,
    pub gsvs_ring_size: u32,
    pub reserved: u32,
}

impl GuestStruct for SetGsRingSizesArgs {
    const SIZE_BYTES: usize = 12;

    fn decode_from_le_bytes(buf: &[u8]) -> Option<Self> {
        if buf.len() < Self::SIZE_BYTES {
            return None;
        }
        Some(Self {
            esgs_ring_size: le_u32(buf, 0),
            gsvs_ring_size: le_u32(buf, 4),
            reserved: le_u32(buf, 8),
        })
    }

    fn encode_to_le_bytes(&self) -> Vec<u8> {
        let mut out = vec![0u8; Self::SIZE_BYTES];
        put_u32(&mut out, 0, self.esgs_ring_size);
        put_u32(&mut out, 4, self.gsvs_ring_size);
        put_u32(&mut out, 8, self.reserved);
        out
    }
}

/// `Submit`: a batch of command words owned by process `pid`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SubmitArgs {
    pub pid: u32,
    /// Number of 64-bit words at `cmds`.
    pub count: u32,
    /// Guest address of the command words.
    pub cmds: u64,
}

impl GuestStruct for SubmitArgs {
    const SIZE_BYTES: usize = 16;

    fn decode_from_le_bytes(buf: &[u8]) -> Option<Self> {
        if buf.len() < Self::SIZE_BYTES {
            return None;
        }
        Some(Self {
            pid: le_u32(buf, 0),
            count: le_u32(buf, 4),
            cmds: le_u64(buf, 8),
        })
    }

    fn encode_to_le_bytes(&self) -> Vec<u8> {
        let mut out = vec![0u8; Self::SIZE_BYTES];
        put_u32(&mut out, 0, self.pid);
        put_u32(&mut out, 4, self.count);
        put_u64(&mut out, 8, self.cmds);
        out
    }
}

/// `SubmitEop`: [`SubmitArgs`] plus the end-of-pipe event value and wait flag.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SubmitEopArgs {
    pub pid: u32,
    pub count: u32,
    pub cmds: u64,
    pub eop_value: u64,
    pub wait: i32,
    pub reserved0: u32,
}

impl SubmitEopArgs {
    pub fn as_submit(&self) -> SubmitArgs {
        SubmitArgs {
            pid: self.pid,
            count: self.count,
            cmds: self.cmds,
        }
    }
}

impl GuestStruct for SubmitEopArgs {
    const SIZE_BYTES: usize = 32;

    fn decode_from_le_bytes(buf: &[u8]) -> Option<Self> {
        if buf.len() < Self::SIZE_BYTES {
            return None;
        }
        Some(Self {
            pid: le_u32(buf, 0),
            count: le_u32(buf, 4),
            cmds: le_u64(buf, 8),
            eop_value: le_u64(buf, 16),
            wait: le_i32(buf, 24),
            reserved0: le_u32(buf, 28),
        })
    }

    fn encode_to_le_bytes(&self) -> Vec<u8> {
        let mut out = vec![0u8; Self::SIZE_BYTES];
        put_u32(&mut out, 0, self.pid);
        put_u32(&mut out, 4, self.count);
        put_u64(&mut out, 8, self.cmds);
        put_u64(&mut out, 16, self.eop_value);
        put_u32(&mut out, 24, self.wait as u32);
        put_u32(&mut out, 28, self.reserved0);
        out
    }
}

/// `MapComputeQueue` / `MapComputeQueueWithPriority`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MapComputeQueueArgs {
    pub pipe_hi: u32,
    /// 1-based pipe number.
    pub pipe_lo: u32,
    pub queue_id: u32,
    pub g_queue_id: u32,
    pub ring_base_addr: u64,
    pub read_ptr_addr: u64,
    pub ding_dong_ptr: u64,
    /// Ring size as a power-of-two exponent (bytes = `1 << ring_size_dw`).
    pub ring_size_dw: u32,
    pub pipe_priority: u32,
}

impl MapComputeQueueArgs {
    pub const PIPE_PRIORITY_OFFSET: usize = offset_of!(MapComputeQueueArgs, pipe_priority);
}

impl GuestStruct for MapComputeQueueArgs {
    const SIZE_BYTES: usize = 48;

    fn decode_from_le_bytes(buf: &[u8]) -> Option<Self> {
        if buf.len() < Self::SIZE_BYTES {
            return None;
        }
        Some(Self {
            pipe_hi: le_u32(buf, 0),
            pipe_lo: le_u32(buf, 4),
            queue_id: le_u32(buf, 8),
            g_queue_id: le_u32(buf, 12),
            ring_base_addr: le_u64(buf, 16),
            read_ptr_addr: le_u64(buf, 24),
            ding_dong_ptr: le_u64(buf, 32),
            ring_size_dw: le_u32(buf, 40),
            pipe_priority: le_u32(buf, 44),
        })
    }

    fn encode_to_le_bytes(&self) -> Vec<u8> {
        let mut out = vec![0u8; Self::SIZE_BYTES];
        put_u32(&mut out, 0, self.pipe_hi);
        put_u32(&mut out, 4, self.pipe_lo);
        put_u32(&mut out, 8, self.queue_id);
        put_u32(&mut out, 12, self.g_queue_id);
        put_u64(&mut out, 16, self.ring_base_addr);
        put_u64(&mut out, 24, self.read_ptr_addr);
        put_u64(&mut out, 32, self.ding_dong_ptr);
        put_u32(&mut out, 40, self.ring_size_dw);
        put_u32(&mut out, 44, self.pipe_priority);
        out
    }
}

/// `SetWaveLimitMultipliers`: a stage bitset plus one scaling value per stage.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SetWaveLimitMultipliersArgs {
    pub bitset: i32,
    pub values: [i32; WAVE_LIMIT_VALUES],
    pub reserved: [i32; 3],
}

impl GuestStruct for SetWaveLimitMultipliersArgs {
    const SIZE_BYTES: usize = 48;

    fn decode_from_le_bytes(buf: &[u8]) -> Option<Self> {
        if buf.len() < Self::SIZE_BYTES {
            return None;
        }
        let mut values = [0i32; WAVE_LIMIT_VALUES];
        for (i, v) in values.iter_mut().enumerate() {
            *v = le_i32(buf, 4 + i * 4);
        }
        let mut reserved = [0i32; 3];
        for (i, v) in reserved.iter_mut().enumerate() {
            *v = le_i32(buf, 36 + i * 4);
        }
        Some(Self {
            bitset: le_i32(buf, 0),
            values,
            reserved,
        })
    }

    fn encode_to_le_bytes(&self) -> Vec<u8> {
        let mut out = vec![0u8; Self::SIZE_BYTES];
        put_u32(&mut out, 0, self.bitset as u32);
        for (i, v) in self.values.iter().enumerate() {
            put_u32(&mut out, 4 + i * 4, *v as u32);
        }
        for (i, v) in self.reserved.iter().enumerate() {
            put_u32(&mut out, 36 + i * 4, *v as u32);
        }
        out
    }
}

/// `MipStatsReport` header.
///
/// The command's size class is `0x84`; only this 16-byte prefix is interpreted.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MipStatsReportArgs {
    pub report_type: u32,
    pub reserved: [u32; 3],
}

impl MipStatsReportArgs {
    pub const fn is_known_type(&self) -> bool {
        matches!(self.report_type, MIP_STATS_TYPE_A | MIP_STATS_TYPE_B)
    }
}

impl GuestStruct for MipStatsReportArgs {
    const SIZE_BYTES: usize = 16;

    fn decode_from_le_bytes(buf: &[u8]) -> Option<Self> {
        if buf.len() < Self::SIZE_BYTES {
            return None;
        }
        Some(Self {
            report_type: le_u32(buf, 0),
            reserved: [le_u32(buf, 4), le_u32(buf, 8), le_u32(buf, 12)],
        })
    }

    fn encode_to_le_bytes(&self) -> Vec<u8> {
        let mut out = vec![0u8; Self::SIZE_BYTES];
        put_u32(&mut out, 0, self.report_type);
        for (i, v) in self.reserved.iter().enumerate() {
            put_u32(&mut out, 4 + i * 4, *v);
        }
        out
    }
}

impl GuestStruct for u32 {
    const SIZE_BYTES: usize = 4;

    fn decode_from_le_bytes(buf: &[u8]) -> Option<Self> {
        (buf.len() >= 4).then(|| le_u32(buf, 0))
    }

    fn encode_to_le_bytes(&self) -> Vec<u8> {
        self.to_le_bytes().to_vec()
    }
}

impl GuestStruct for u64 {
    const SIZE_BYTES: usize = 8;

    fn decode_from_le_bytes(buf: &[u8]) -> Option<Self> {
        (buf.len() >= 8).then(|| le_u64(buf, 0))
    }

    fn encode_to_le_bytes(&self) -> Vec<u8> {
        self.to_le_bytes().to_vec()
    }
}

/// Consecutive `u32` output slots, e.g. the `GetCuMask` result.
impl<const N: usize> GuestStruct for [u32; N] {
    const SIZE_BYTES: usize = 4 * N;

    fn decode_from_le_bytes(buf: &[u8]) -> Option<Self> {
        if buf.len() < Self::SIZE_BYTES {
            return None;
        }
        let mut out = [0u32; N];
        for (i, v) in out.iter_mut().enumerate() {
            *v = le_u32(buf, i * 4);
        }
        Some(out)
    }

    fn encode_to_le_bytes(&self) -> Vec<u8> {
        self.iter().flat_map(|v| v.to_le_bytes()).collect()
    }
}

// Compile-time layout assertions; the decode offsets above must agree with `repr(C)`.
const _: () = {
    assert!(size_of::<SetGsRingSizesArgs>() == SetGsRingSizesArgs::SIZE_BYTES);
    assert!(size_of::<SubmitArgs>() == SubmitArgs::SIZE_BYTES);
    assert!(offset_of!(SubmitArgs, cmds) == 8);
    assert!(size_of::<SubmitEopArgs>() == SubmitEopArgs::SIZE_BYTES);
    assert!(offset_of!(SubmitEopArgs, eop_value) == 16);
    assert!(offset_of!(SubmitEopArgs, wait) == 24);
    assert!(size_of::<MapComputeQueueArgs>() == MapComputeQueueArgs::SIZE_BYTES);
    assert!(offset_of!(MapComputeQueueArgs, ring_base_addr) == 16);
    assert!(offset_of!(MapComputeQueueArgs, read_ptr_addr) == 24);
    assert!(offset_of!(MapComputeQueueArgs, ding_dong_ptr) == 32);
    assert!(offset_of!(MapComputeQueueArgs, ring_size_dw) == 40);
    assert!(offset_of!(MapComputeQueueArgs, pipe_priority) == 44);
    assert!(size_of::<SetWaveLimitMultipliersArgs>() == SetWaveLimitMultipliersArgs::SIZE_BYTES);
    assert!(offset_of!(SetWaveLimitMultipliersArgs, reserved) == 36);
    assert!(size_of::<MipStatsReportArgs>() == MipStatsReportArgs::SIZE_BYTES);
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_buffers_do_not_decode() {
        assert!(SubmitArgs::decode_from_le_bytes(&[0u8; 15]).is_none());
        assert!(MapComputeQueueArgs::decode_from_le_bytes(&[0u8; 47]).is_none());
        assert!(MipStatsReportArgs::decode_from_le_bytes(&[]).is_none());
    }

    #[test]
    fn mip_stats_known_types() {
        let mut args = MipStatsReportArgs::default();
        assert!(!args.is_known_type());
        args.report_type = MIP_STATS_TYPE_A;
        assert!(args.is_known_type());
        args.report_type = MIP_STATS_TYPE_B;
        assert!(args.is_known_type());
        args.report_type = 0x1_0002;
        assert!(!args.is_known_type());
    }
}
