//! Session configuration.
//!
//! Defaults may be overridden at build time through the `PRUCTL_STATE_TIMEOUT_NS`,
//! `PRUCTL_DUAL_RAM` and `PRUCTL_MEM_DEVICE` environment variables.

use crate::def::{DEFAULT_MEM_DEVICE_PATH, DEFAULT_STATE_TIMEOUT_NS};
use crate::pubdef::Instance;


/// Timeout used when waiting for the clock domain to settle on `open`.
pub const STATE_TIMEOUT_NS: i64 =
    parse_i64_or(option_env!("PRUCTL_STATE_TIMEOUT_NS"), DEFAULT_STATE_TIMEOUT_NS);

/// Whether the data RAM window is mapped in addition to the instruction RAM.
pub const DUAL_RAM: bool = match option_env!("PRUCTL_DUAL_RAM") {
    Some(value) => !matches!(value.as_bytes(), b"false"),
    None => true,
};

/// Memory device used by `DevMem` to map physical ranges.
pub const MEM_DEVICE_PATH: &str = match option_env!("PRUCTL_MEM_DEVICE") {
    Some(path) => path,
    None => DEFAULT_MEM_DEVICE_PATH,
};


const fn parse_i64_or(env_var: Option<&str>, default: i64) -> i64 {
    match env_var {
        Some(value) => match i64::from_str_radix(value, 10) {
            Ok(value) => value,
            Err(_) => panic!("Failed to parse integer from configuration"),
        },
        None => default,
    }
}



/// Configuration of a device session.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    instance: Instance,
    state_timeout_ns: i64,
    dual_ram: bool,
    mem_device: String,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            instance: Instance::Icss1,
            state_timeout_ns: STATE_TIMEOUT_NS,
            dual_ram: DUAL_RAM,
            mem_device: MEM_DEVICE_PATH.to_owned(),
        }
    }
}

impl Config {
    /// Selects the PRU subsystem instance opened by the session.
    pub fn with_instance(mut self, instance: Instance) -> Config {
        self.instance = instance;
        self
    }

    /// Sets the time budget for the clock domain to reach the enabled state.
    pub fn with_state_timeout_ns(mut self, timeout_ns: i64) -> Config {
        self.state_timeout_ns = timeout_ns;
        self
    }

    /// Enables or disables mapping of the data RAM window.
    pub fn with_dual_ram(mut self, dual_ram: bool) -> Config {
        self.dual_ram = dual_ram;
        self
    }

    /// Sets the memory device used to map physical ranges.
    pub fn with_mem_device<S: Into<String>>(mut self, path: S) -> Config {
        self.mem_device = path.into();
        self
    }

    pub fn instance(&self) -> Instance {
        self.instance
    }

    pub fn state_timeout_ns(&self) -> i64 {
        self.state_timeout_ns
    }

    pub fn dual_ram(&self) -> bool {
        self.dual_ram
    }

    pub fn mem_device(&self) -> &str {
        &self.mem_device
    }
}
