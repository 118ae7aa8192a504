//! Claiming and releasing physical ranges.

use std::fmt;
use std::mem::ManuallyDrop;

use log::{debug, error, info};

use crate::platform::Platform;
use crate::pubdef::RegionDescriptor;
use crate::Result;



/// A reserved and mapped physical range.
///
/// The reservation and the mapping are acquired together by `claim` and given back
/// together when the region is released or dropped: the mapping is torn down first, then
/// the reservation. A `MappedRegion` can therefore never be observed with only one of the
/// two, and since `release` consumes the region it cannot be released twice.
pub struct MappedRegion<'p, P: Platform> {
    platform: &'p P,
    descriptor: &'static RegionDescriptor,
    // Both fields are only taken out in `drop`.
    token: ManuallyDrop<P::Token>,
    handle: ManuallyDrop<P::Handle>,
}

impl<'p, P: Platform> MappedRegion<'p, P> {
    /// Reserves then maps a physical range.
    ///
    /// # Errors
    ///
    /// `Error::Busy` if the range is already reserved. `Error::MapFailed` if the mapping
    /// could not be established, in which case the reservation is given back before
    /// returning.
    pub fn claim(platform: &'p P, descriptor: &'static RegionDescriptor) -> Result<Self> {
        debug!("Requesting memory region {}", descriptor.name);
        let token = platform.reserve(descriptor.base_address, descriptor.size, descriptor.name)?;
        let handle = match platform.map(descriptor.base_address, descriptor.size) {
            Ok(handle) => handle,
            Err(err) => {
                error!("Failed to map {}", descriptor.name);
                platform.unreserve(token);
                return Err(err);
            }
        };

        Ok(MappedRegion {
            platform,
            descriptor,
            token: ManuallyDrop::new(token),
            handle: ManuallyDrop::new(handle),
        })
    }

    /// Unmaps the range then gives back its reservation.
    pub fn release(self) {
        drop(self);
    }

    pub fn descriptor(&self) -> &'static RegionDescriptor {
        self.descriptor
    }

    /// Size of the range in bytes.
    pub fn size(&self) -> usize {
        self.descriptor.size
    }

    /// Reads the 32-bit register at byte `offset`.
    pub fn read32(&self, offset: usize) -> u32 {
        self.platform.read32(&self.handle, offset)
    }

    /// Writes the 32-bit register at byte `offset`.
    pub fn write32(&self, offset: usize, value: u32) {
        self.platform.write32(&self.handle, offset, value)
    }

    /// Fills `dst` from the start of the range.
    pub fn read_bytes(&self, dst: &mut [u8]) {
        self.platform.read_bytes(&self.handle, 0, dst)
    }

    /// Copies `src` to the start of the range.
    pub fn write_bytes(&self, src: &[u8]) {
        self.platform.write_bytes(&self.handle, 0, src)
    }
}

impl<'p, P: Platform> Drop for MappedRegion<'p, P> {
    fn drop(&mut self) {
        // Neither field is accessed again after this point.
        let (handle, token) = unsafe {
            (ManuallyDrop::take(&mut self.handle), ManuallyDrop::take(&mut self.token))
        };
        self.platform.unmap(handle);
        self.platform.unreserve(token);
        debug!("Released memory region {}", self.descriptor.name);
    }
}

impl<'p, P: Platform> fmt::Debug for MappedRegion<'p, P> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("MappedRegion")
            .field("descriptor", self.descriptor)
            .finish()
    }
}



/// Claims every range of `descriptors`, in order, all or nothing.
///
/// If claiming the k-th range fails, ranges `k-1` down to `1` are released in that order
/// before the error is returned.
pub fn claim_all<'p, P: Platform>(
    platform: &'p P,
    descriptors: &[&'static RegionDescriptor],
) -> Result<Vec<MappedRegion<'p, P>>> {
    let mut claimed = Vec::with_capacity(descriptors.len());
    for &descriptor in descriptors {
        match MappedRegion::claim(platform, descriptor) {
            Ok(region) => claimed.push(region),
            Err(err) => {
                error!("Failed to claim {}: {}", descriptor.name, err);
                release_all(claimed);
                return Err(err);
            }
        }
    }
    info!("Memory regions requested successfully");

    Ok(claimed)
}

/// Releases regions in the reverse order of their acquisition.
pub fn release_all<P: Platform>(mut regions: Vec<MappedRegion<P>>) {
    while let Some(region) = regions.pop() {
        region.release();
    }
}
