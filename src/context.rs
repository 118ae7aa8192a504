//! Per-session view of a PRU subsystem instance.

use std::fmt;

use log::{error, info};

use crate::def::region_table;
use crate::error::Error;
use crate::platform::Platform;
use crate::pubdef::{CfgRegister, Instance, RamTarget, RegionDescriptor, RegionKind};
use crate::region::{claim_all, release_all, MappedRegion};
use crate::Result;



/// Mapped registers and RAM windows of one PRU subsystem instance.
///
/// A context is either fully initialized, holding every region it needs, or torn down,
/// holding none: operations on a torn down context fail with `Error::InvalidArgument`.
pub struct DeviceContext<'p, P: Platform> {
    pub(crate) platform: &'p P,
    // Kept in claim order so that teardown can proceed in reverse.
    regions: Vec<MappedRegion<'p, P>>,
    ram_target: RamTarget,
}

impl<'p, P: Platform> DeviceContext<'p, P> {
    /// Claims and maps the clock control register, the configuration block and the
    /// instruction RAM of a PRU subsystem instance, plus the data RAM if `dual_ram` is set.
    ///
    /// # Errors
    ///
    /// `Error::Unsupported` if the instance is not supported, in which case nothing is
    /// claimed. `Error::IoFailure` if any region cannot be claimed, carrying the `Busy` or
    /// `MapFailed` cause; the regions claimed so far are then released in reverse order.
    pub fn init(platform: &'p P, instance: Instance, dual_ram: bool) -> Result<Self> {
        let table = region_table(instance).map_err(|err| {
            error!("{:?} is not yet supported", instance);
            err
        })?;
        let descriptors: Vec<&'static RegionDescriptor> = table
            .iter()
            .filter(|descriptor| dual_ram || descriptor.kind != RegionKind::DataRam)
            .collect();

        let regions = claim_all(platform, &descriptors).map_err(|err| {
            error!("Failed to initialize PRU context: {}", err);
            let region = match err {
                Error::Busy { base } | Error::MapFailed { base } => descriptors
                    .iter()
                    .find(|descriptor| descriptor.base_address == base)
                    .map_or("PRU region", |descriptor| descriptor.name),
                _ => "PRU region",
            };
            Error::IoFailure { region, cause: Box::new(err) }
        })?;
        info!("PRU context initialized");

        Ok(DeviceContext {
            platform,
            regions,
            ram_target: RamTarget::default(),
        })
    }

    /// Releases every region held by the context.
    ///
    /// The context is left torn down. Calling this on a torn down context does nothing.
    pub fn free(&mut self) {
        if !self.regions.is_empty() {
            release_all(std::mem::take(&mut self.regions));
            info!("PRU context freed");
        }
    }

    /// Returns true if the context holds its regions.
    pub fn is_initialized(&self) -> bool {
        !self.regions.is_empty()
    }

    /// Returns the mapped region of the given kind.
    pub fn region(&self, kind: RegionKind) -> Result<&MappedRegion<'p, P>> {
        if self.regions.is_empty() {
            return Err(Error::InvalidArgument);
        }
        self.regions
            .iter()
            .find(|region| region.descriptor().kind == kind)
            .ok_or(Error::Unsupported)
    }

    /// The RAM window targeted by `read` and `write`.
    pub fn ram_target(&self) -> RamTarget {
        self.ram_target
    }

    /// Selects the RAM window targeted by subsequent transfers.
    ///
    /// # Errors
    ///
    /// `Error::Unsupported` if the window is not mapped by this context; the selection is
    /// then left unchanged.
    pub fn select_target(&mut self, target: RamTarget) -> Result<()> {
        self.region(target.region())?;
        self.ram_target = target;

        Ok(())
    }

    /// Size of the currently selected RAM window.
    pub fn window_size(&self) -> Result<usize> {
        Ok(self.window()?.size())
    }

    /// Copies up to `size` bytes from the start of the selected RAM window.
    ///
    /// The returned buffer is truncated to the window size if `size` exceeds it.
    ///
    /// # Errors
    ///
    /// `Error::InvalidArgument` if `size` is zero or the context is torn down,
    /// `Error::OutOfMemory` if the buffer cannot be allocated.
    pub fn read(&self, size: usize) -> Result<Vec<u8>> {
        if size == 0 {
            return Err(Error::InvalidArgument);
        }
        let window = self.window()?;
        let len = size.min(window.size());

        let mut buffer = Vec::new();
        buffer.try_reserve_exact(len).map_err(|_| Error::OutOfMemory)?;
        buffer.resize(len, 0);
        window.read_bytes(&mut buffer);

        Ok(buffer)
    }

    /// Copies `data` to the start of the selected RAM window.
    ///
    /// Data that does not fit in the window is silently dropped: the number of bytes
    /// actually written is returned and a short count is not an error.
    ///
    /// # Errors
    ///
    /// `Error::InvalidArgument` if `data` is empty or the context is torn down.
    pub fn write(&self, data: &[u8]) -> Result<usize> {
        if data.is_empty() {
            return Err(Error::InvalidArgument);
        }
        let window = self.window()?;
        let len = data.len().min(window.size());
        window.write_bytes(&data[..len]);

        Ok(len)
    }

    /// Reads a register of the configuration block.
    pub fn cfg_read(&self, reg: CfgRegister) -> Result<u32> {
        Ok(self.region(RegionKind::Config)?.read32(reg.offset()))
    }

    /// Writes a register of the configuration block.
    pub fn cfg_write(&self, reg: CfgRegister, value: u32) -> Result<()> {
        self.region(RegionKind::Config)?.write32(reg.offset(), value);

        Ok(())
    }

    fn window(&self) -> Result<&MappedRegion<'p, P>> {
        self.region(self.ram_target.region())
    }
}

impl<'p, P: Platform> Drop for DeviceContext<'p, P> {
    fn drop(&mut self) {
        self.free();
    }
}

impl<'p, P: Platform> fmt::Debug for DeviceContext<'p, P> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("DeviceContext")
            .field("regions", &self.regions)
            .field("ram_target", &self.ram_target)
            .finish()
    }
}


#[cfg(test)]
#[path = "context_test.rs"]
mod context_test;
