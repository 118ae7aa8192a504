//! Character-device protocol over a PRU subsystem.
//!
//! A `Session` plays the role of an open file descriptor on the PRU device: it owns the
//! storage for one `DeviceContext` and sequences open/close/read/write/ioctl calls on it.
//! Every data call is tagged with the `CallPath` it originates from. Register accesses and
//! RAM transfers are reserved to the real-time path; on the non-real-time path reads and
//! writes transfer nothing, and ioctls are refused.

use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{error, info, warn};

use crate::config::Config;
use crate::context::DeviceContext;
use crate::def::{CLKCTRL_MODULEMODE_MASK, CLKCTRL_REG};
use crate::error::Error;
use crate::platform::Platform;
use crate::pubdef::{CallPath, CfgRegister, DeviceState, RamTarget, RegionKind, SessionState};
use crate::Result;



/// A device session.
///
/// `open` and `close` take the session by mutable reference and thus never overlap with
/// each other or with data calls. `read`, `write` and `ioctl` may be issued concurrently
/// from several threads; they are serialized on the session's context so that a RAM
/// window change never interleaves with a transfer.
pub struct Session<'p, P: Platform> {
    platform: &'p P,
    config: Config,
    state: SessionState,
    context: Mutex<Option<DeviceContext<'p, P>>>,
}

impl<'p, P: Platform> Session<'p, P> {
    /// Creates a closed session.
    pub fn new(platform: &'p P, config: Config) -> Self {
        Session {
            platform,
            config,
            state: SessionState::Closed,
            context: Mutex::new(None),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Claims the PRU subsystem and enables its clock domain.
    ///
    /// The session is open once the clock domain has settled in the enabled state. If it
    /// does not settle within the configured timeout, disabling is requested, every region
    /// is released and the session stays closed.
    ///
    /// # Errors
    ///
    /// `Error::AlreadyOpen` if the session is not closed, the errors of
    /// `DeviceContext::init`, and `Error::Timeout` if the clock domain did not settle.
    pub fn open(&mut self) -> Result<()> {
        if self.state != SessionState::Closed {
            return Err(Error::AlreadyOpen);
        }
        info!("PRU driver opened");
        self.state = SessionState::Opening;

        let mut context =
            match DeviceContext::init(self.platform, self.config.instance(), self.config.dual_ram()) {
                Ok(context) => context,
                Err(err) => {
                    error!("PRU context initialization failed: {}", err);
                    self.state = SessionState::Closed;
                    return Err(err);
                }
            };

        info!("Enabling PRU-ICSS");
        let timeout_ns = self.config.state_timeout_ns();
        let time_left = context
            .request_state(DeviceState::Enabled)
            .and_then(|_| context.wait_for_state(DeviceState::Enabled, timeout_ns));

        match time_left {
            Ok(time_left) if time_left >= 0 => {
                info!("PRU-ICSS enabled, time left before timeout: {}ns", time_left);
                *self.slot() = Some(context);
                self.state = SessionState::Open;

                Ok(())
            }
            Ok(time_left) => {
                error!("PRU-ICSS did not reach the expected state within {}ns, overshoot {}ns",
                       timeout_ns, -time_left);
                let _ = context.request_state(DeviceState::Disabled);
                context.free();
                self.state = SessionState::Closed;

                Err(Error::Timeout { overshoot_ns: -time_left })
            }
            Err(err) => {
                context.free();
                self.state = SessionState::Closed;

                Err(err)
            }
        }
    }

    /// Gates the clock domain and releases the PRU subsystem.
    ///
    /// Closing always succeeds, including on a session that never reached the open state.
    pub fn close(&mut self) {
        let Some(mut context) = self.slot().take() else {
            return;
        };
        info!("Closing PRU driver");
        self.state = SessionState::Closing;

        // Teardown is unconditional: a missing clock region is not worth reporting.
        if let Ok(clk) = context.region(RegionKind::ClockControl) {
            let raw = clk.read32(CLKCTRL_REG);
            clk.write32(CLKCTRL_REG, raw & !CLKCTRL_MODULEMODE_MASK);
        }
        context.free();
        self.state = SessionState::Closed;
    }

    /// Reads up to `size` bytes from the selected RAM window.
    ///
    /// On the non-real-time path nothing is transferred and an empty buffer is returned.
    pub fn read(&self, path: CallPath, size: usize) -> Result<Vec<u8>> {
        match path {
            CallPath::RealTime => self.with_context(|context| context.read(size)),
            CallPath::NonRealTime => {
                warn!("PRU driver read called from non-RT context");
                Ok(Vec::new())
            }
        }
    }

    /// Writes `data` to the selected RAM window, truncated to the window size.
    ///
    /// Returns the number of bytes written, which is zero on the non-real-time path.
    pub fn write(&self, path: CallPath, data: &[u8]) -> Result<usize> {
        match path {
            CallPath::RealTime => self.with_context(|context| context.write(data)),
            CallPath::NonRealTime => {
                warn!("PRU driver write called from non-RT context");
                Ok(0)
            }
        }
    }

    /// Selects the RAM window from a raw request code (see `RamTarget`).
    ///
    /// # Errors
    ///
    /// `Error::PermissionDenied` on the non-real-time path and `Error::InvalidArgument` for
    /// an unknown request code, both without side effect.
    pub fn ioctl(&self, path: CallPath, request: u32) -> Result<()> {
        if path == CallPath::NonRealTime {
            return Err(Error::PermissionDenied);
        }
        let target = RamTarget::try_from(request).map_err(|err| {
            error!("Invalid target for memory access: {}", request);
            err
        })?;
        self.with_context_mut(|context| context.select_target(target))
    }

    /// Memory mapping of the PRU device is not allowed.
    pub fn mmap(&self, _path: CallPath) -> Result<()> {
        Err(Error::PermissionDenied)
    }

    /// Reads a configuration block register.
    pub fn cfg_read(&self, path: CallPath, reg: CfgRegister) -> Result<u32> {
        match path {
            CallPath::RealTime => self.with_context(|context| context.cfg_read(reg)),
            CallPath::NonRealTime => Err(Error::PermissionDenied),
        }
    }

    /// Writes a configuration block register.
    pub fn cfg_write(&self, path: CallPath, reg: CfgRegister, value: u32) -> Result<()> {
        match path {
            CallPath::RealTime => self.with_context(|context| context.cfg_write(reg, value)),
            CallPath::NonRealTime => Err(Error::PermissionDenied),
        }
    }

    /// Settled state of the clock domain.
    pub fn device_state(&self) -> Result<DeviceState> {
        self.with_context(|context| context.get_state())
    }

    /// The RAM window currently targeted by transfers.
    pub fn ram_target(&self) -> Result<RamTarget> {
        self.with_context(|context| Ok(context.ram_target()))
    }

    fn slot(&self) -> MutexGuard<Option<DeviceContext<'p, P>>> {
        self.context.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_context<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&DeviceContext<'p, P>) -> Result<T>,
    {
        match self.slot().as_ref() {
            Some(context) => f(context),
            None => Err(Error::InvalidArgument),
        }
    }

    fn with_context_mut<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut DeviceContext<'p, P>) -> Result<T>,
    {
        match self.slot().as_mut() {
            Some(context) => f(context),
            None => Err(Error::InvalidArgument),
        }
    }
}

impl<'p, P: Platform> Drop for Session<'p, P> {
    fn drop(&mut self) {
        self.close();
    }
}


#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;
