//! Host capabilities required to claim and drive the PRU subsystem.
//!
//! All hardware access goes through a `Platform`, which bundles the region reservation
//! authority, the mapping authority and the monotonic clock. `DevMem` provides the real
//! implementation while `MockPlatform` allows fault injection in tests.

use std::sync::{Mutex, PoisonError};

use log::debug;

use crate::error::Error;
use crate::Result;



/// Reservation authority, mapping authority and monotonic clock of the host.
pub trait Platform {
    /// Proof of exclusive reservation over a physical range.
    type Token;
    /// Handle to a mapped physical range.
    type Handle;

    /// Reserves `[base, base + size)` for the exclusive use of the caller.
    ///
    /// Fails with `Error::Busy` if any byte of the range is already reserved.
    fn reserve(&self, base: u64, size: usize, label: &'static str) -> Result<Self::Token>;

    /// Gives back a reservation.
    fn unreserve(&self, token: Self::Token);

    /// Maps `[base, base + size)` for register-width reads and writes.
    ///
    /// Fails with `Error::MapFailed` if the range cannot be mapped.
    fn map(&self, base: u64, size: usize) -> Result<Self::Handle>;

    /// Tears down a mapping.
    fn unmap(&self, handle: Self::Handle);

    /// Reads the 32-bit register at byte `offset` of a mapping.
    fn read32(&self, handle: &Self::Handle, offset: usize) -> u32;

    /// Writes the 32-bit register at byte `offset` of a mapping.
    fn write32(&self, handle: &Self::Handle, offset: usize, value: u32);

    /// Copies `dst.len()` bytes starting at byte `offset` of a mapping.
    fn read_bytes(&self, handle: &Self::Handle, offset: usize, dst: &mut [u8]);

    /// Copies `src` to byte `offset` of a mapping.
    fn write_bytes(&self, handle: &Self::Handle, offset: usize, src: &[u8]);

    /// Monotonic time in nanoseconds.
    fn now_ns(&self) -> i64;
}



/// Exclusive claim over a physical range, handed out by a `ReservationTable`.
///
/// Reservations are neither copyable nor clonable: the only way to give one back is to
/// move it into `ReservationTable::release`.
#[derive(Debug, PartialEq, Eq)]
pub struct Reservation {
    base: u64,
    size: usize,
    label: &'static str,
}

impl Reservation {
    pub fn base(&self) -> u64 {
        self.base
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn label(&self) -> &'static str {
        self.label
    }
}



/// Registry of reserved physical ranges.
///
/// A single table must arbitrate a given physical address space so that two sessions can
/// never claim overlapping ranges; `DevMem` uses a process-wide instance.
pub struct ReservationTable {
    ranges: Mutex<Vec<(u64, usize, &'static str)>>,
}

impl ReservationTable {
    pub const fn new() -> ReservationTable {
        ReservationTable {
            ranges: Mutex::new(Vec::new()),
        }
    }

    /// Reserves a range unless it overlaps a range that is already reserved.
    ///
    /// Empty ranges and ranges running past the end of the address space are rejected
    /// with `Error::InvalidArgument`.
    pub fn reserve(&self, base: u64, size: usize, label: &'static str) -> Result<Reservation> {
        let end = range_end(base, size).ok_or(Error::InvalidArgument)?;
        let mut ranges = self.ranges.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(&(_, _, owner)) = ranges
            .iter()
            .find(|&&(b, s, _)| b < end && base < b + s as u64)
        {
            debug!("Range {:#010x}+{:#x} for {} already held by {}", base, size, label, owner);
            return Err(Error::Busy { base });
        }
        ranges.push((base, size, label));

        Ok(Reservation { base, size, label })
    }

    /// Releases a reservation.
    pub fn release(&self, reservation: Reservation) {
        let mut ranges = self.ranges.lock().unwrap_or_else(PoisonError::into_inner);
        ranges.retain(|&(b, s, _)| b != reservation.base || s != reservation.size);
    }

    /// Returns true if any byte of the range is reserved.
    pub fn is_reserved(&self, base: u64, size: usize) -> bool {
        let Some(end) = range_end(base, size) else {
            return false;
        };
        let ranges = self.ranges.lock().unwrap_or_else(PoisonError::into_inner);
        ranges.iter().any(|&(b, s, _)| b < end && base < b + s as u64)
    }

    /// Number of ranges currently reserved.
    pub fn len(&self) -> usize {
        self.ranges.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// Exclusive end of a non-empty range, if it fits in the address space.
fn range_end(base: u64, size: usize) -> Option<u64> {
    if size == 0 {
        return None;
    }
    base.checked_add(size as u64)
}

impl Default for ReservationTable {
    fn default() -> ReservationTable {
        ReservationTable::new()
    }
}
