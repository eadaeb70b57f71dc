mod common;

use std::sync::Arc;

use common::{init_tracing, SCRATCH_ADDR};
use orbis_devices_gc::{
    errno, Device, GcConfigError, GcContext, GcDevice, GcDeviceConfig, IoVec, IoctlArgs,
    KernelStat, Whence,
};
use orbis_gc_protocol::{GcCommand, CU_MASK_WORDS};
use orbis_vmem::{GuestMemory, MemoryMapFlags, MemoryMapper, MemoryProt, VirtualMemory, VmaType};
use pretty_assertions::assert_eq;

fn open(vm: &Arc<VirtualMemory>) -> Arc<dyn Device> {
    init_tracing();
    let ctx = GcContext::new(vm.clone(), GcDeviceConfig::default());
    GcDevice::create(3, "/dev/gc", 2, 0o666, ctx).unwrap()
}

fn mapped_vm() -> Arc<VirtualMemory> {
    let vm = Arc::new(VirtualMemory::default());
    vm.map_memory(
        SCRATCH_ADDR,
        0x4000,
        MemoryProt::CPU_READ_WRITE,
        MemoryMapFlags::FIXED | MemoryMapFlags::ANON,
        VmaType::Flexible,
    )
    .unwrap();
    vm
}

#[test]
fn ioctl_routes_to_the_dispatcher() {
    let vm = mapped_vm();
    let dev = open(&vm);

    let words = [SCRATCH_ADDR];
    assert_eq!(
        dev.ioctl(GcCommand::GetCuMask.code().raw(), &mut IoctlArgs::new(&words)),
        0
    );
    let mut mask = [0u32; CU_MASK_WORDS];
    for (i, word) in mask.iter_mut().enumerate() {
        *word = vm.read_u32_le(SCRATCH_ADDR + i as u64 * 4).unwrap();
    }
    assert_eq!(mask, [0x10, 0x10, 0, 0]);

    assert_eq!(
        dev.ioctl(GcCommand::RequiresNeoCompat.code().raw(), &mut IoctlArgs::new(&[])),
        -errno::ENODEV
    );
}

#[test]
fn byte_stream_operations_are_inert() {
    let vm = mapped_vm();
    let dev = open(&vm);
    vm.write_from(SCRATCH_ADDR, &[0x5a; 32]).unwrap();
    let iov = [IoVec {
        base: SCRATCH_ADDR,
        len: 32,
    }];

    assert_eq!(dev.read(SCRATCH_ADDR, 32), 0);
    assert_eq!(dev.write(SCRATCH_ADDR, 32), 0);
    assert_eq!(dev.readv(&iov), 0);
    assert_eq!(dev.writev(&iov), 0);
    assert_eq!(dev.preadv(&iov, 0x100), 0);
    assert_eq!(dev.pwrite(SCRATCH_ADDR, 32, 0x100), 0);
    assert_eq!(dev.lseek(10, Whence::Set), 0);
    assert_eq!(dev.lseek(-1, Whence::End), 0);
    assert_eq!(dev.fsync(), 0);
    assert_eq!(dev.ftruncate(0), 0);

    let mut basep = 99i64;
    assert_eq!(dev.getdents(SCRATCH_ADDR, 32, Some(&mut basep)), 0);
    assert_eq!(basep, 99);
    assert_eq!(dev.getdents(SCRATCH_ADDR, 32, None), 0);

    let mut buf = [0u8; 32];
    vm.read_into(SCRATCH_ADDR, &mut buf).unwrap();
    assert_eq!(buf, [0x5a; 32]);
}

#[test]
fn fstat_leaves_the_record_alone() {
    let vm = mapped_vm();
    let dev = open(&vm);
    let mut stat = KernelStat {
        mode: 0o20666,
        size: 123,
        ..Default::default()
    };
    let expected = stat;
    assert_eq!(dev.fstat(&mut stat), 0);
    assert_eq!(stat, expected);
}

#[test]
fn create_rejects_invalid_config() {
    let vm = mapped_vm();
    let ctx = GcContext::new(
        vm,
        GcDeviceConfig {
            submits_len: 0x100,
            ..Default::default()
        },
    );
    assert_eq!(
        GcDevice::create(4, "/dev/gc", 0, 0, ctx).err(),
        Some(GcConfigError::UnalignedRingLength { len: 0x100 })
    );
}

#[test]
fn handles_share_process_state() {
    let vm = mapped_vm();
    let ctx = GcContext::new(vm.clone(), GcDeviceConfig::default());
    let a = GcDevice::create(3, "/dev/gc", 2, 0, ctx.clone()).unwrap();
    let b = GcDevice::create(4, "/dev/gc", 2, 0, ctx.clone()).unwrap();

    let first = [SCRATCH_ADDR];
    let second = [SCRATCH_ADDR + 8];
    let code = GcCommand::InitializeSubmits.code().raw();
    assert_eq!(a.ioctl(code, &mut IoctlArgs::new(&first)), 0);
    assert_eq!(b.ioctl(code, &mut IoctlArgs::new(&second)), 0);

    assert_eq!(
        vm.read_u64_le(SCRATCH_ADDR).unwrap(),
        vm.read_u64_le(SCRATCH_ADDR + 8).unwrap()
    );
    assert_eq!(vm.map_count(), 2);
    assert!(ctx.submits.address().is_some());
}
