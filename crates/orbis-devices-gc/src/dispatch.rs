//! The `/dev/gc` ioctl dispatcher.
//!
//! [`GcDispatcher::dispatch`] is total: every code, known or not, produces a status and no
//! guest input can make it panic. Unknown codes are acknowledged with success because guest
//! drivers probe for commands the emulation may not implement.

use std::sync::Arc;

use orbis_gc_protocol::{
    GuestStruct, MapComputeQueueArgs, MipStatsReportArgs, SetGsRingSizesArgs,
    SetWaveLimitMultipliersArgs, SubmitArgs,
};
use orbis_vmem::{GuestMemory, GuestMemoryResult, MemoryMapper};
use tracing::{debug, warn};

use crate::args::{GuestPtr, IoctlArgs};
use crate::config::{GcConfigError, GcDeviceConfig};
use crate::error::GcError;
use crate::queue::{ComputeQueueSlot, ComputeQueueTable};
use crate::request::GcRequest;
use crate::sink::{EndOfPipe, GcCommandSink, GcSubmission, NullGcCommandSink};
use crate::submits::SubmissionRing;

/// Words copied out of guest memory per read when collecting a submission.
const SUBMIT_READ_CHUNK_WORDS: usize = 512;

/// Process-scoped state and collaborators shared by every open `/dev/gc` handle.
#[derive(Clone)]
pub struct GcContext {
    pub memory: Arc<dyn GuestMemory>,
    pub mapper: Arc<dyn MemoryMapper>,
    pub sink: Arc<dyn GcCommandSink>,
    pub submits: Arc<SubmissionRing>,
    pub queues: Arc<ComputeQueueTable>,
    pub config: GcDeviceConfig,
}

impl GcContext {
    /// Fresh process state over an address space that is both accessor and mapper. Submissions
    /// go to a [`NullGcCommandSink`] until [`GcContext::with_sink`] replaces it.
    pub fn new<M>(memory: Arc<M>, config: GcDeviceConfig) -> Self
    where
        M: GuestMemory + MemoryMapper + 'static,
    {
        Self {
            memory: memory.clone(),
            mapper: memory,
            sink: Arc::new(NullGcCommandSink::new()),
            submits: Arc::new(SubmissionRing::new()),
            queues: Arc::new(ComputeQueueTable::new()),
            config,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn GcCommandSink>) -> Self {
        self.sink = sink;
        self
    }
}

pub struct GcDispatcher {
    ctx: GcContext,
}

impl GcDispatcher {
    pub fn new(ctx: GcContext) -> Result<Self, GcConfigError> {
        ctx.config.validate()?;
        Ok(Self { ctx })
    }

    pub fn context(&self) -> &GcContext {
        &self.ctx
    }

    /// Handles one `ioctl(code, ...)` and returns the guest-visible status (0 or `-errno`).
    pub fn dispatch(&self, code: u64, args: &mut IoctlArgs<'_>) -> i32 {
        let request = GcRequest::decode(code, args);
        match self.execute(request) {
            Ok(()) => 0,
            Err(err) => {
                match (&err, request.command()) {
                    (GcError::NoDevice, _) => debug!("ioctl {code:#x}: {err}"),
                    (GcError::Fault(_) | GcError::MalformedArgument { .. }, Some(cmd)) => warn!(
                        "ioctl {} ({code:#x}) could not access its {}-byte argument: {err}",
                        cmd.name(),
                        cmd.arg_bytes()
                    ),
                    _ => warn!("ioctl {code:#x} failed: {err}"),
                }
                err.status()
            }
        }
    }

    pub fn execute(&self, request: GcRequest) -> Result<(), GcError> {
        let mem = self.ctx.memory.as_ref();
        match request {
            GcRequest::FlushGarlic
            | GcRequest::SubmitDone
            | GcRequest::WaitIdle
            | GcRequest::WaitFree
            | GcRequest::SwitchBuffer
            | GcRequest::UnmapComputeQueue
            | GcRequest::DingDong => {
                warn!("ioctl {} (no-op)", command_name(&request));
                Ok(())
            }
            GcRequest::DebugHardwareStatus => Ok(()),
            GcRequest::GetNumTcaUnits { out } => {
                out.write(mem, &self.ctx.config.num_compute_units)?;
                Ok(())
            }
            GcRequest::InitializeSubmits { out } => {
                let addr =
                    self.ctx
                        .submits
                        .initialize(mem, self.ctx.mapper.as_ref(), &self.ctx.config)?;
                out.write(mem, &addr)?;
                Ok(())
            }
            GcRequest::SetGsRingSizes(ptr) => self.set_gs_ring_sizes(ptr),
            GcRequest::Submit(ptr) => {
                let args = ptr.read(mem)?;
                self.submit(args, None)
            }
            GcRequest::SubmitEop(ptr) => {
                let args = ptr.read(mem)?;
                let eop = EndOfPipe {
                    value: args.eop_value,
                    wait: args.wait != 0,
                };
                self.submit(args.as_submit(), Some(eop))
            }
            GcRequest::GetCuMask { out } => {
                out.write(mem, &self.ctx.config.cu_mask)?;
                Ok(())
            }
            GcRequest::RequiresNeoCompat => Err(GcError::NoDevice),
            GcRequest::MapComputeQueue(ptr) => self.map_compute_queue(ptr, false),
            GcRequest::MapComputeQueueWithPriority(ptr) => self.map_compute_queue(ptr, true),
            GcRequest::SetWaveLimitMultipliers(ptr) => self.set_wave_limit_multipliers(ptr),
            GcRequest::MipStatsReport(ptr) => self.mip_stats_report(ptr),
            GcRequest::Unknown(code) => {
                warn!("unhandled ioctl cmd = {code:#x}");
                Ok(())
            }
        }
    }

    fn set_gs_ring_sizes(&self, ptr: GuestPtr<SetGsRingSizesArgs>) -> Result<(), GcError> {
        let args = ptr.read(self.ctx.memory.as_ref())?;
        warn!(
            "SetGsRingSizes not modeled: esgs={:#x} gsvs={:#x}",
            args.esgs_ring_size, args.gsvs_ring_size
        );
        Ok(())
    }

    fn submit(&self, args: SubmitArgs, end_of_pipe: Option<EndOfPipe>) -> Result<(), GcError> {
        let commands = read_command_words(
            self.ctx.memory.as_ref(),
            GuestPtr::new(args.cmds),
            args.count,
        )?;
        debug!(
            pid = args.pid,
            count = args.count,
            eop = end_of_pipe.is_some(),
            "submit"
        );
        self.ctx.sink.submit(GcSubmission {
            pid: args.pid,
            commands,
            end_of_pipe,
        });
        Ok(())
    }

    fn map_compute_queue(
        &self,
        ptr: GuestPtr<MapComputeQueueArgs>,
        with_priority: bool,
    ) -> Result<(), GcError> {
        let mem = self.ctx.memory.as_ref();
        let mut args = ptr.read(mem)?;
        if !with_priority {
            // The plain variant clears the guest's priority field before binding.
            args.pipe_priority = 0;
            ptr.byte_offset::<u32>(MapComputeQueueArgs::PIPE_PRIORITY_OFFSET as u64)
                .write(mem, &0)?;
        }

        let slot = ComputeQueueSlot::from_args(&args, args.pipe_priority);
        debug!(
            pipe_id = slot.pipe_id,
            queue_id = slot.queue_id,
            ring_base = slot.ring_base_addr,
            ring_size = slot.ring_size_bytes,
            priority = slot.priority,
            "map compute queue"
        );
        if let Some(prev) = self.ctx.queues.map(slot) {
            debug!(
                "compute queue ({}, {}) rebound, previous ring {:#x}",
                prev.pipe_id, prev.queue_id, prev.ring_base_addr
            );
        }
        Ok(())
    }

    fn set_wave_limit_multipliers(
        &self,
        ptr: GuestPtr<SetWaveLimitMultipliersArgs>,
    ) -> Result<(), GcError> {
        let args = ptr.read(self.ctx.memory.as_ref())?;
        warn!(
            "SetWaveLimitMultipliers not modeled: bitset={:#x} values={:?}",
            args.bitset, args.values
        );
        Ok(())
    }

    fn mip_stats_report(&self, ptr: GuestPtr<MipStatsReportArgs>) -> Result<(), GcError> {
        let args = ptr.read(self.ctx.memory.as_ref())?;
        if !args.is_known_type() {
            return Err(GcError::InvalidMipStatsType(args.report_type));
        }
        Ok(())
    }
}

fn command_name(request: &GcRequest) -> &'static str {
    request.command().map_or("unknown", |cmd| cmd.name())
}

/// Copies `count` command words starting at `base`.
///
/// Reads in bounded chunks so a bogus `count` faults on the first unmapped chunk instead of
/// sizing one huge buffer up front.
fn read_command_words(
    mem: &dyn GuestMemory,
    base: GuestPtr<u64>,
    count: u32,
) -> GuestMemoryResult<Vec<u64>> {
    let count = count as usize;
    let mut words = Vec::with_capacity(count.min(SUBMIT_READ_CHUNK_WORDS));
    let mut buf = [0u8; SUBMIT_READ_CHUNK_WORDS * u64::SIZE_BYTES];
    let mut addr = base.addr();
    while words.len() < count {
        let n = (count - words.len()).min(SUBMIT_READ_CHUNK_WORDS);
        let bytes = &mut buf[..n * u64::SIZE_BYTES];
        mem.read_into(addr, bytes)?;
        words.extend(bytes.chunks_exact(u64::SIZE_BYTES).map(|chunk| {
            let mut word = [0u8; 8];
            word.copy_from_slice(chunk);
            u64::from_le_bytes(word)
        }));
        addr = addr.wrapping_add(bytes.len() as u64);
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbis_vmem::{MemoryMapFlags, MemoryProt, VirtualMemory, VmaType};

    #[test]
    fn command_words_span_multiple_chunks() {
        let vm = VirtualMemory::default();
        let count = SUBMIT_READ_CHUNK_WORDS + 3;
        let base = vm
            .map_memory(
                0x10_0000,
                (count * 8) as u64,
                MemoryProt::CPU_READ_WRITE,
                MemoryMapFlags::ANON,
                VmaType::Flexible,
            )
            .unwrap();
        for i in 0..count {
            vm.write_u64_le(base + i as u64 * 8, i as u64 ^ 0xabcd).unwrap();
        }

        let words = read_command_words(&vm, GuestPtr::new(base), count as u32).unwrap();
        assert_eq!(words.len(), count);
        assert_eq!(words[0], 0xabcd);
        assert_eq!(words[count - 1], (count as u64 - 1) ^ 0xabcd);
    }

    #[test]
    fn zero_count_never_touches_memory() {
        let vm = VirtualMemory::default();
        let words = read_command_words(&vm, GuestPtr::new(0), 0).unwrap();
        assert!(words.is_empty());
    }
}
