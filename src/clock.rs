//! Clock domain state machine.
//!
//! Enabling or disabling the PRU-ICSS clock domain is a two-step process: a new mode is
//! requested through the MODULEMODE field (bits 0-1) of the clock control register, then
//! the IDLEST field (bits 16-17) reports when the hardware has actually settled. Requests
//! are therefore asynchronous and confirmation is a separate, deadline-bounded busy poll.

use log::{debug, trace};

use crate::context::DeviceContext;
use crate::def::{CLKCTRL_MODULEMODE_ENABLE, CLKCTRL_MODULEMODE_MASK, CLKCTRL_REG};
use crate::platform::Platform;
use crate::pubdef::{DeviceState, RegionKind};
use crate::Result;



/// Returns true if the raw clock control register value reports `target` as settled.
pub fn settled(raw: u32, target: DeviceState) -> bool {
    DeviceState::from_register(raw) == target
}

/// Returns the clock control register value requesting `target`.
///
/// Only the MODULEMODE field is modified; all other bits of `raw` are preserved.
pub fn request_value(raw: u32, target: DeviceState) -> u32 {
    let cleared = raw & !CLKCTRL_MODULEMODE_MASK;
    match target {
        DeviceState::Enabled => cleared | CLKCTRL_MODULEMODE_ENABLE,
        DeviceState::Disabled => cleared,
    }
}



impl<'p, P: Platform> DeviceContext<'p, P> {
    /// Requests a new clock domain state without waiting for the hardware to settle.
    pub fn request_state(&self, target: DeviceState) -> Result<()> {
        let clk = self.region(RegionKind::ClockControl)?;
        let raw = clk.read32(CLKCTRL_REG);
        clk.write32(CLKCTRL_REG, request_value(raw, target));
        debug!("Requested clock domain state {:?}", target);

        Ok(())
    }

    /// Busy-polls the clock control register until the clock domain settles in `target`.
    ///
    /// The register is read at least once, even if `timeout_ns` is zero or negative. The
    /// deadline is checked after each read.
    ///
    /// Returns the time left before the deadline, in nanoseconds. A negative value means
    /// the deadline was exceeded (by its magnitude) and must be checked by the caller.
    pub fn wait_for_state(&self, target: DeviceState, timeout_ns: i64) -> Result<i64> {
        let clk = self.region(RegionKind::ClockControl)?;
        let start = self.platform.now_ns();
        let mut polls = 0u64;
        loop {
            let raw = clk.read32(CLKCTRL_REG);
            polls += 1;
            let is_settled = settled(raw, target);
            let elapsed = self.platform.now_ns().saturating_sub(start);

            if is_settled || elapsed > timeout_ns {
                trace!("Clock domain polled {} times in {}ns", polls, elapsed);
                return Ok(timeout_ns.saturating_sub(elapsed));
            }
        }
    }

    /// Reads the settled state of the clock domain.
    pub fn get_state(&self) -> Result<DeviceState> {
        let raw = self.region(RegionKind::ClockControl)?.read32(CLKCTRL_REG);

        Ok(DeviceState::from_register(raw))
    }
}


#[cfg(test)]
#[path = "clock_test.rs"]
mod clock_test;
