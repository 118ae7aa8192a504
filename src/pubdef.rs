
use crate::def::{CLKCTRL_IDLEST_MASK, PRU_ACCESS_DRAM, PRU_ACCESS_IRAM};
use crate::error::Error;



/// A PRU subsystem instance.
///
/// Only PRU-ICSS1 is supported; any attempt to use PRU-ICSS2 fails with `Error::Unsupported`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Instance {
    Icss1,
    Icss2,
}



/// A hardware block of a PRU subsystem instance.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RegionKind {
    /// Clock control register of the PRU-ICSS clock domain.
    ClockControl,
    /// PRU-ICSS configuration block.
    Config,
    /// PRU0 instruction RAM.
    InstructionRam,
    /// PRU0 data RAM.
    DataRam,
}



/// A named physical address range.
#[derive(Debug, PartialEq, Eq)]
pub struct RegionDescriptor {
    pub kind: RegionKind,
    pub name: &'static str,
    pub base_address: u64,
    pub size: usize,
}



/// On-chip RAM window targeted by reads and writes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum RamTarget {
    /// PRU0 instruction RAM.
    #[default]
    Iram,
    /// PRU0 data RAM.
    Dram,
}

impl RamTarget {
    /// The region holding the window.
    pub fn region(self) -> RegionKind {
        match self {
            RamTarget::Iram => RegionKind::InstructionRam,
            RamTarget::Dram => RegionKind::DataRam,
        }
    }
}

impl TryFrom<u32> for RamTarget {
    type Error = Error;

    fn try_from(request: u32) -> Result<Self, Error> {
        match request {
            PRU_ACCESS_IRAM => Ok(RamTarget::Iram),
            PRU_ACCESS_DRAM => Ok(RamTarget::Dram),
            _ => Err(Error::InvalidArgument),
        }
    }
}

impl From<RamTarget> for u32 {
    fn from(target: RamTarget) -> u32 {
        match target {
            RamTarget::Iram => PRU_ACCESS_IRAM,
            RamTarget::Dram => PRU_ACCESS_DRAM,
        }
    }
}



/// Settled state of the PRU-ICSS clock domain.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DeviceState {
    Enabled,
    Disabled,
}

impl DeviceState {
    /// Decodes the IDLEST field (bits 16-17) of the clock control register.
    ///
    /// Both bits set means the module is disabled, any other value means it is enabled.
    pub fn from_register(raw: u32) -> DeviceState {
        if raw & CLKCTRL_IDLEST_MASK == CLKCTRL_IDLEST_MASK {
            DeviceState::Disabled
        } else {
            DeviceState::Enabled
        }
    }
}



/// Execution context a session call originates from.
///
/// Register accesses and RAM transfers are only honored on the real-time path.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CallPath {
    RealTime,
    NonRealTime,
}



/// Life cycle of a device session.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    Closed,
    Opening,
    Open,
    Closing,
}



/// Registers of the PRU-ICSS configuration block.
#[repr(usize)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CfgRegister {
    Revid = 0x00,
    Syscfg = 0x04,
    Gpcfg0 = 0x08,
    Gpcfg1 = 0x0c,
    Cgr = 0x10,
    Isrp = 0x14,
    Isp = 0x18,
    Iesp = 0x1c,
    Iecp = 0x20,
    Pmao = 0x28,
    MiiRt = 0x2c,
    Iepclk = 0x30,
    Spp = 0x34,
    PinMx = 0x40,
}

impl CfgRegister {
    /// Byte offset relative to the configuration block base.
    pub fn offset(self) -> usize {
        self as usize
    }
}
