#![allow(dead_code)]

use std::sync::Arc;

use orbis_devices_gc::{
    GcContext, GcDeviceConfig, GcDispatcher, IoctlArgs, RecordingGcCommandSink,
};
use orbis_gc_protocol::{GcCommand, GuestStruct};
use orbis_vmem::{
    GuestMemory, MemoryMapFlags, MemoryMapper, MemoryProt, VirtualMemory, VirtualMemoryConfig,
    VmaType, PAGE_SIZE,
};

/// Guest memory the tests use for argument blocks and output slots.
pub const SCRATCH_ADDR: u64 = 0x1000_0000;
pub const SCRATCH_LEN: u64 = 4 * PAGE_SIZE;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub struct Harness {
    pub vm: Arc<VirtualMemory>,
    pub sink: Arc<RecordingGcCommandSink>,
    pub dispatcher: GcDispatcher,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(VirtualMemoryConfig::default(), GcDeviceConfig::default())
    }

    pub fn with(vm_config: VirtualMemoryConfig, config: GcDeviceConfig) -> Self {
        init_tracing();
        let vm = Arc::new(VirtualMemory::new(vm_config));
        let scratch = vm
            .map_memory(
                SCRATCH_ADDR,
                SCRATCH_LEN,
                MemoryProt::CPU_READ_WRITE,
                MemoryMapFlags::PRIVATE | MemoryMapFlags::ANON | MemoryMapFlags::FIXED,
                VmaType::Flexible,
            )
            .unwrap();
        assert_eq!(scratch, SCRATCH_ADDR);

        let sink = Arc::new(RecordingGcCommandSink::new(16));
        let ctx = GcContext::new(vm.clone(), config).with_sink(sink.clone());
        let dispatcher = GcDispatcher::new(ctx).unwrap();
        Self {
            vm,
            sink,
            dispatcher,
        }
    }

    pub fn ioctl(&self, cmd: GcCommand, words: &[u64]) -> i32 {
        self.ioctl_raw(cmd.code().raw(), words)
    }

    pub fn ioctl_raw(&self, code: u64, words: &[u64]) -> i32 {
        self.dispatcher.dispatch(code, &mut IoctlArgs::new(words))
    }

    /// Places `value` at `SCRATCH_ADDR + offset` and returns its guest address.
    pub fn put<T: GuestStruct>(&self, offset: u64, value: &T) -> u64 {
        let addr = SCRATCH_ADDR + offset;
        self.vm
            .write_from(addr, &value.encode_to_le_bytes())
            .unwrap();
        addr
    }

    pub fn get<T: GuestStruct>(&self, addr: u64) -> T {
        let mut buf = vec![0u8; T::SIZE_BYTES];
        self.vm.read_into(addr, &mut buf).unwrap();
        T::decode_from_le_bytes(&buf).unwrap()
    }

    pub fn scratch_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0u8; SCRATCH_LEN as usize];
        self.vm.read_into(SCRATCH_ADDR, &mut buf).unwrap();
        buf
    }
}
