//! Tests for the session protocol surface.

use crate::config::Config;
use crate::def::{CLKCTRL_IDLEST_MASK, PRUSS1_PRU0_IRAM_ADDR};
use crate::error::Error;
use crate::mock::{Event, MockPlatform};
use crate::pubdef::{CallPath, CfgRegister, DeviceState, Instance, RamTarget, SessionState};
use crate::session::Session;

fn config() -> Config {
    Config::default().with_state_timeout_ns(1_000_000).with_dual_ram(true)
}

#[test]
fn open_enables_clock_domain() {
    let platform = MockPlatform::new();
    let mut session = Session::new(&platform, config());

    session.open().unwrap();

    assert_eq!(session.state(), SessionState::Open);
    assert_eq!(session.device_state(), Ok(DeviceState::Enabled));
    assert_eq!(platform.clkctrl() & 0b11, 0b10);
    assert_eq!(platform.reservations().len(), 4);
}

#[test]
fn open_twice_is_rejected() {
    let platform = MockPlatform::new();
    let mut session = Session::new(&platform, config());
    session.open().unwrap();
    let events = platform.events().len();

    assert_eq!(session.open(), Err(Error::AlreadyOpen));
    assert_eq!(platform.events().len(), events);
    assert_eq!(session.state(), SessionState::Open);
}

#[test]
fn close_disables_and_releases() {
    let platform = MockPlatform::new();
    let mut session = Session::new(&platform, config());
    session.open().unwrap();

    session.close();

    assert_eq!(session.state(), SessionState::Closed);
    assert_eq!(platform.clkctrl() & 0b11, 0);
    assert_eq!(platform.clkctrl() & CLKCTRL_IDLEST_MASK, CLKCTRL_IDLEST_MASK);
    assert!(platform.reservations().is_empty());
    assert_eq!(platform.live_mappings(), 0);
    assert_eq!(session.device_state(), Err(Error::InvalidArgument));
}

#[test]
fn close_without_open_is_harmless() {
    let platform = MockPlatform::new();
    let mut session = Session::new(&platform, config());

    session.close();
    session.close();

    assert_eq!(session.state(), SessionState::Closed);
    assert!(platform.events().is_empty());
}

#[test]
fn session_can_be_reopened() {
    let platform = MockPlatform::new();
    let mut session = Session::new(&platform, config());

    session.open().unwrap();
    session.close();
    session.open().unwrap();

    assert_eq!(session.state(), SessionState::Open);
    assert_eq!(session.ram_target(), Ok(RamTarget::Iram));
}

#[test]
fn open_timeout_leaves_no_trace() {
    let platform = MockPlatform::new();
    platform.set_clock_stuck(true);
    let mut session = Session::new(&platform, config());

    let err = session.open().unwrap_err();

    assert!(matches!(err, Error::Timeout { overshoot_ns } if overshoot_ns > 0));
    assert_eq!(session.state(), SessionState::Closed);
    // Disabling was requested before teardown.
    assert_eq!(platform.clkctrl() & 0b11, 0);
    assert!(platform.reservations().is_empty());
    assert_eq!(platform.live_mappings(), 0);
    assert_eq!(session.device_state(), Err(Error::InvalidArgument));
    assert_eq!(session.read(CallPath::RealTime, 4), Err(Error::InvalidArgument));
}

#[test]
fn open_claim_failure_is_reported() {
    let platform = MockPlatform::new();
    platform.fail_map(PRUSS1_PRU0_IRAM_ADDR);
    let mut session = Session::new(&platform, config());

    assert_eq!(
        session.open(),
        Err(Error::IoFailure {
            region: "PRU-ICSS1 PRU0 IRAM",
            cause: Box::new(Error::MapFailed { base: PRUSS1_PRU0_IRAM_ADDR }),
        })
    );
    assert_eq!(session.state(), SessionState::Closed);
    assert!(platform.reservations().is_empty());
}

#[test]
fn unsupported_instance_claims_nothing() {
    let platform = MockPlatform::new();
    let mut session = Session::new(&platform, config().with_instance(Instance::Icss2));

    assert_eq!(session.open(), Err(Error::Unsupported));
    assert!(platform.events().is_empty());
}

#[test]
fn non_real_time_transfers_are_stubs() {
    let platform = MockPlatform::new();
    let mut session = Session::new(&platform, config());
    session.open().unwrap();

    assert_eq!(session.write(CallPath::NonRealTime, &[1, 2, 3]), Ok(0));
    assert_eq!(session.read(CallPath::NonRealTime, 3), Ok(Vec::new()));
    assert_eq!(platform.memory(PRUSS1_PRU0_IRAM_ADDR, 3), vec![0, 0, 0]);

    assert_eq!(session.write(CallPath::RealTime, &[1, 2, 3]), Ok(3));
    assert_eq!(session.read(CallPath::RealTime, 3), Ok(vec![1, 2, 3]));
}

#[test]
fn ioctl_selects_ram_target_on_real_time_path_only() {
    let platform = MockPlatform::new();
    let mut session = Session::new(&platform, config());
    session.open().unwrap();

    assert_eq!(session.ioctl(CallPath::NonRealTime, RamTarget::Dram.into()), Err(Error::PermissionDenied));
    assert_eq!(session.ram_target(), Ok(RamTarget::Iram));

    assert_eq!(session.ioctl(CallPath::RealTime, 7), Err(Error::InvalidArgument));
    assert_eq!(session.ram_target(), Ok(RamTarget::Iram));

    session.ioctl(CallPath::RealTime, RamTarget::Dram.into()).unwrap();
    assert_eq!(session.ram_target(), Ok(RamTarget::Dram));
}

#[test]
fn ioctl_on_closed_session_is_invalid() {
    let platform = MockPlatform::new();
    let session = Session::new(&platform, config());

    assert_eq!(session.ioctl(CallPath::RealTime, 0), Err(Error::InvalidArgument));
}

#[test]
fn mmap_is_never_allowed() {
    let platform = MockPlatform::new();
    let mut session = Session::new(&platform, config());
    session.open().unwrap();

    assert_eq!(session.mmap(CallPath::RealTime), Err(Error::PermissionDenied));
    assert_eq!(session.mmap(CallPath::NonRealTime), Err(Error::PermissionDenied));
}

#[test]
fn configuration_registers_need_real_time_path() {
    let platform = MockPlatform::new();
    let mut session = Session::new(&platform, config());
    session.open().unwrap();

    assert_eq!(session.cfg_read(CallPath::NonRealTime, CfgRegister::Revid), Err(Error::PermissionDenied));
    assert_eq!(session.cfg_write(CallPath::NonRealTime, CfgRegister::Cgr, 1), Err(Error::PermissionDenied));

    session.cfg_write(CallPath::RealTime, CfgRegister::Cgr, 0x24).unwrap();
    assert_eq!(session.cfg_read(CallPath::RealTime, CfgRegister::Cgr), Ok(0x24));
}

#[test]
fn drop_closes_session() {
    let platform = MockPlatform::new();
    {
        let mut session = Session::new(&platform, config());
        session.open().unwrap();
    }

    assert!(platform.reservations().is_empty());
    assert_eq!(platform.clkctrl() & 0b11, 0);
    assert_eq!(platform.events().last(), Some(&Event::Unreserve(crate::def::CM_L4PER2_PRUSS1_CLKCTRL_ADDR)));
}
