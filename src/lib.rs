//! Exclusive, real-time access to the clock domain and on-chip RAM of a TI Programmable
//! Real-time Unit subsystem (PRU-ICSS), in the manner of a Xenomai RTDM character device.
//!
//! A `Session` claims the physical ranges of the clock control register, the PRU-ICSS
//! configuration block and the PRU0 instruction and data RAMs, maps them, enables the
//! clock domain and lets the caller copy bytes to and from either RAM window. Closing or
//! dropping the session gates the clock domain and gives every range back.
//!
//!
//! # Design rationale
//!
//! All host services (physical range reservation, mapping, monotonic time) are reached
//! through the `Platform` trait rather than through free pointers. `DevMem` implements it
//! on top of `/dev/mem` while `MockPlatform` (behind the `mock` feature) simulates the
//! hardware and injects faults.
//!
//! Resource release is tied to ownership:
//!
//! * a `MappedRegion` holds both the reservation and the mapping of a range and gives
//! both back, mapping first, when released or dropped,
//!
//! * a `DeviceContext` is either fully initialized or holds nothing: a failure while
//! claiming its k-th region releases regions k-1 down to 1 before the error surfaces,
//!
//! * a `Session` that fails to bring the clock domain up requests it down again and
//! releases its context before reporting the failure.
//!
//! Enabling the clock domain is asynchronous in hardware. `DeviceContext::wait_for_state`
//! busy-polls the clock control register against a deadline and returns the signed time
//! left, which is negative if the deadline was exceeded.
//!
//! Register accesses and RAM transfers are only performed on behalf of real-time callers
//! (`CallPath::RealTime`). Non-real-time reads and writes transfer nothing and
//! non-real-time ioctls are refused: this is a capability split, not an oversight.
//!
//!
//! # Hello world
//!
//! ```no_run
//! extern crate pructl;
//!
//! use pructl::{CallPath, Config, DevMem, RamTarget, Session};
//!
//! fn main() {
//!     let config = Config::default();
//!     let platform = DevMem::new(&config).unwrap();
//!     let mut session = Session::new(&platform, config);
//!     session.open().unwrap();
//!
//!     // Write to the data RAM then read it back.
//!     session.ioctl(CallPath::RealTime, RamTarget::Dram.into()).unwrap();
//!     session.write(CallPath::RealTime, b"hello").unwrap();
//!     let data = session.read(CallPath::RealTime, 5).unwrap();
//!     assert_eq!(&data[..], b"hello");
//!
//!     // The `session` destructor gates the clock domain and releases all ranges.
//! }
//! ```

extern crate libc;
extern crate log;

mod clock;
mod config;
mod context;
mod def;
mod devmem;
mod error;
mod platform;
mod pubdef;
mod region;
mod session;
pub mod util;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use clock::{request_value, settled};
pub use config::Config;
pub use context::DeviceContext;
pub use def::region_table;
pub use devmem::{DevMem, MemMap};
pub use error::Error;
pub use platform::{Platform, Reservation, ReservationTable};
pub use pubdef::*;
pub use region::{claim_all, release_all, MappedRegion};
pub use session::Session;

use std::result;



/// Result type for the PRU subsystem.
pub type Result<T> = result::Result<T, Error>;
