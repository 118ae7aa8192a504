use crate::error::Error;
use crate::pubdef::{Instance, RegionDescriptor, RegionKind};


// Physical addresses of the PRU-ICSS1 blocks (AM57xx)
pub const PRUSS1_SLAVE_PORT_ADDR: u64 = 0x4b20_0000;
pub const PRUSS1_CFG_ADDR: u64 = 0x4b22_6000;
pub const CM_L4PER2_PRUSS1_CLKCTRL_ADDR: u64 = 0x4a00_9718;
pub const PRUSS1_PRU0_IRAM_ADDR: u64 = PRUSS1_SLAVE_PORT_ADDR + 0x34000;
pub const PRUSS1_PRU0_DRAM_ADDR: u64 = PRUSS1_SLAVE_PORT_ADDR;


// Size of the PRU-ICSS1 blocks
pub const CLKCTRL_SIZE: usize = 4;
pub const PRUSS_CFG_SIZE: usize = 0x2000; // 8kB
pub const PRUSS_PRU_IRAM_SIZE: usize = 0x3000; // 12kB
pub const PRUSS_PRU_DRAM_SIZE: usize = 0x2000; // 8kB


// Clock control register fields
pub const CLKCTRL_REG: usize = 0x0;
pub const CLKCTRL_MODULEMODE_MASK: u32 = 0b11;
pub const CLKCTRL_MODULEMODE_ENABLE: u32 = 0b10;
pub const CLKCTRL_IDLEST_MASK: u32 = 0b11 << 16;


// ioctl requests selecting the RAM window
pub const PRU_ACCESS_IRAM: u32 = 0;
pub const PRU_ACCESS_DRAM: u32 = 1;


// Misc
pub const DEFAULT_STATE_TIMEOUT_NS: i64 = 1_000_000_000; // 1s
pub const DEFAULT_MEM_DEVICE_PATH: &str = "/dev/mem";


/// Region table of PRU-ICSS1, in claim order.
pub static PRUSS1_REGIONS: [RegionDescriptor; 4] = [
    RegionDescriptor {
        kind: RegionKind::ClockControl,
        name: "PRU-ICSS1 CLK CTRL REG",
        base_address: CM_L4PER2_PRUSS1_CLKCTRL_ADDR,
        size: CLKCTRL_SIZE,
    },
    RegionDescriptor {
        kind: RegionKind::Config,
        name: "PRU-ICSS1 CTRL REG",
        base_address: PRUSS1_CFG_ADDR,
        size: PRUSS_CFG_SIZE,
    },
    RegionDescriptor {
        kind: RegionKind::InstructionRam,
        name: "PRU-ICSS1 PRU0 IRAM",
        base_address: PRUSS1_PRU0_IRAM_ADDR,
        size: PRUSS_PRU_IRAM_SIZE,
    },
    RegionDescriptor {
        kind: RegionKind::DataRam,
        name: "PRU-ICSS1 PRU0 DRAM",
        base_address: PRUSS1_PRU0_DRAM_ADDR,
        size: PRUSS_PRU_DRAM_SIZE,
    },
];


/// Returns the region table of a subsystem instance.
pub fn region_table(instance: Instance) -> Result<&'static [RegionDescriptor], Error> {
    match instance {
        Instance::Icss1 => Ok(&PRUSS1_REGIONS),
        Instance::Icss2 => Err(Error::Unsupported),
    }
}
