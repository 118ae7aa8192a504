//! Tests for context initialization, teardown and the RAM data path.

use proptest::prelude::*;

use crate::context::DeviceContext;
use crate::def::{
    CM_L4PER2_PRUSS1_CLKCTRL_ADDR as CLK, PRUSS1_CFG_ADDR as CFG, PRUSS1_PRU0_DRAM_ADDR as DRAM,
    PRUSS1_PRU0_IRAM_ADDR as IRAM, PRUSS_PRU_DRAM_SIZE, PRUSS_PRU_IRAM_SIZE,
};
use crate::error::Error;
use crate::mock::{Event, MockPlatform};
use crate::pubdef::{CfgRegister, Instance, RamTarget, RegionKind};

fn init(platform: &MockPlatform) -> DeviceContext<MockPlatform> {
    DeviceContext::init(platform, Instance::Icss1, true).unwrap()
}

#[test]
fn init_claims_every_region_in_order() {
    let platform = MockPlatform::new();
    let context = init(&platform);

    assert!(context.is_initialized());
    assert_eq!(context.ram_target(), RamTarget::Iram);
    assert_eq!(
        platform.events(),
        vec![
            Event::Reserve(CLK),
            Event::Map(CLK),
            Event::Reserve(CFG),
            Event::Map(CFG),
            Event::Reserve(IRAM),
            Event::Map(IRAM),
            Event::Reserve(DRAM),
            Event::Map(DRAM),
        ]
    );
    assert_eq!(platform.reservations().len(), 4);
}

#[test]
fn free_releases_everything_claimed() {
    let platform = MockPlatform::new();
    let mut context = init(&platform);
    platform.clear_events();

    context.free();

    assert!(!context.is_initialized());
    assert!(platform.reservations().is_empty());
    assert_eq!(platform.live_mappings(), 0);
    // Each region is unmapped before its reservation is given back.
    assert_eq!(
        platform.events(),
        vec![
            Event::Unmap(DRAM),
            Event::Unreserve(DRAM),
            Event::Unmap(IRAM),
            Event::Unreserve(IRAM),
            Event::Unmap(CFG),
            Event::Unreserve(CFG),
            Event::Unmap(CLK),
            Event::Unreserve(CLK),
        ]
    );
}

#[test]
fn free_is_idempotent() {
    let platform = MockPlatform::new();
    let mut context = init(&platform);

    context.free();
    let events = platform.events().len();
    context.free();
    drop(context);

    assert_eq!(platform.events().len(), events);
}

#[test]
fn drop_releases_everything_claimed() {
    let platform = MockPlatform::new();
    drop(init(&platform));

    assert!(platform.reservations().is_empty());
    assert_eq!(platform.live_mappings(), 0);
}

#[test]
fn reservation_failure_unwinds_in_reverse_order() {
    let platform = MockPlatform::new();
    platform.fail_reserve(IRAM);

    let err = DeviceContext::init(&platform, Instance::Icss1, true).unwrap_err();

    assert_eq!(
        err,
        Error::IoFailure {
            region: "PRU-ICSS1 PRU0 IRAM",
            cause: Box::new(Error::Busy { base: IRAM }),
        }
    );
    assert_eq!(
        platform.events(),
        vec![
            Event::Reserve(CLK),
            Event::Map(CLK),
            Event::Reserve(CFG),
            Event::Map(CFG),
            Event::Reserve(IRAM),
            Event::Unmap(CFG),
            Event::Unreserve(CFG),
            Event::Unmap(CLK),
            Event::Unreserve(CLK),
        ]
    );
    assert!(platform.reservations().is_empty());
}

#[test]
fn map_failure_gives_reservation_back() {
    let platform = MockPlatform::new();
    platform.fail_map(DRAM);

    let err = DeviceContext::init(&platform, Instance::Icss1, true).unwrap_err();

    assert_eq!(
        err,
        Error::IoFailure {
            region: "PRU-ICSS1 PRU0 DRAM",
            cause: Box::new(Error::MapFailed { base: DRAM }),
        }
    );
    assert_eq!(
        platform.events()[6..],
        [
            Event::Reserve(DRAM),
            Event::Map(DRAM),
            Event::Unreserve(DRAM),
            Event::Unmap(IRAM),
            Event::Unreserve(IRAM),
            Event::Unmap(CFG),
            Event::Unreserve(CFG),
            Event::Unmap(CLK),
            Event::Unreserve(CLK),
        ]
    );
    assert!(platform.reservations().is_empty());
    assert_eq!(platform.live_mappings(), 0);
}

#[test]
fn range_held_elsewhere_fails_init() {
    let platform = MockPlatform::new();
    let held = platform.reservations().reserve(CFG, 4, "other driver").unwrap();

    let err = DeviceContext::init(&platform, Instance::Icss1, true).unwrap_err();

    assert_eq!(
        err,
        Error::IoFailure {
            region: "PRU-ICSS1 CTRL REG",
            cause: Box::new(Error::Busy { base: CFG }),
        }
    );
    assert_eq!(platform.reservations().len(), 1);
    platform.reservations().release(held);
}

#[test]
fn second_instance_is_unsupported() {
    let platform = MockPlatform::new();

    let err = DeviceContext::init(&platform, Instance::Icss2, true).unwrap_err();

    assert_eq!(err, Error::Unsupported);
    assert!(platform.events().is_empty());
}

#[test]
fn single_ram_context_rejects_data_ram() {
    let platform = MockPlatform::new();
    let mut context = DeviceContext::init(&platform, Instance::Icss1, false).unwrap();

    assert_eq!(platform.reservations().len(), 3);
    assert_eq!(context.select_target(RamTarget::Dram), Err(Error::Unsupported));
    assert_eq!(context.ram_target(), RamTarget::Iram);
    assert!(context.region(RegionKind::DataRam).is_err());
}

#[test]
fn torn_down_context_rejects_everything() {
    let platform = MockPlatform::new();
    let mut context = init(&platform);
    context.free();

    assert_eq!(context.read(4), Err(Error::InvalidArgument));
    assert_eq!(context.write(&[1]), Err(Error::InvalidArgument));
    assert_eq!(context.select_target(RamTarget::Dram), Err(Error::InvalidArgument));
    assert_eq!(context.get_state(), Err(Error::InvalidArgument));
    assert_eq!(context.cfg_read(CfgRegister::Revid), Err(Error::InvalidArgument));
}

#[test]
fn zero_length_transfers_are_invalid() {
    let platform = MockPlatform::new();
    let context = init(&platform);

    assert_eq!(context.read(0), Err(Error::InvalidArgument));
    assert_eq!(context.write(&[]), Err(Error::InvalidArgument));
}

#[test]
fn oversized_write_is_truncated_to_window() {
    let platform = MockPlatform::new();
    let context = init(&platform);
    let data = vec![0x5a; PRUSS_PRU_IRAM_SIZE + 16];

    assert_eq!(context.write(&data), Ok(PRUSS_PRU_IRAM_SIZE));
    assert_eq!(platform.memory(IRAM, PRUSS_PRU_IRAM_SIZE), vec![0x5a; PRUSS_PRU_IRAM_SIZE]);
}

#[test]
fn short_write_leaves_rest_of_window_untouched() {
    let platform = MockPlatform::new();
    let context = init(&platform);

    assert_eq!(context.write(&[1, 2, 3]), Ok(3));
    assert_eq!(platform.memory(IRAM, 5), vec![1, 2, 3, 0, 0]);
}

#[test]
fn oversized_read_is_truncated_to_window() {
    let platform = MockPlatform::new();
    let mut context = init(&platform);
    context.select_target(RamTarget::Dram).unwrap();

    assert_eq!(context.window_size(), Ok(PRUSS_PRU_DRAM_SIZE));
    assert_eq!(context.read(0x10000).unwrap().len(), PRUSS_PRU_DRAM_SIZE);
    assert_eq!(context.read(7).unwrap().len(), 7);
}

#[test]
fn ram_windows_are_distinct() {
    let platform = MockPlatform::new();
    let mut context = init(&platform);

    context.select_target(RamTarget::Iram).unwrap();
    context.write(&[0xaa, 0xbb]).unwrap();
    context.select_target(RamTarget::Dram).unwrap();
    assert_ne!(context.read(2).unwrap(), vec![0xaa, 0xbb]);

    context.select_target(RamTarget::Iram).unwrap();
    assert_eq!(context.read(2).unwrap(), vec![0xaa, 0xbb]);
}

#[test]
fn configuration_registers() {
    let platform = MockPlatform::new();
    let context = init(&platform);

    context.cfg_write(CfgRegister::Syscfg, 0x10).unwrap();
    assert_eq!(context.cfg_read(CfgRegister::Syscfg), Ok(0x10));
    assert_eq!(platform.memory(CFG, 8), vec![0, 0, 0, 0, 0x10, 0, 0, 0]);
}

proptest! {
    #[test]
    fn write_returns_smaller_of_length_and_window(len in 1usize..0x4000) {
        let platform = MockPlatform::new();
        let mut context = init(&platform);
        context.select_target(RamTarget::Dram).unwrap();

        let written = context.write(&vec![0xff; len]).unwrap();

        prop_assert_eq!(written, len.min(PRUSS_PRU_DRAM_SIZE));
        prop_assert_eq!(context.read(len).unwrap().len(), written);
    }
}
