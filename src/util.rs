//! Volatile accessors for memory-mapped I/O.
//!
//! Plain loads, stores and `ptr::copy` may be merged, reordered or elided by the compiler,
//! which is not acceptable for device memory. All accesses below are volatile and, for
//! bulk copies, performed one byte at a time so that no wider access is ever issued to a
//! RAM window.

use std::ptr::{read_volatile, write_volatile};



/// Reads a 32-bit register.
///
/// # Safety
///
/// `base + offset` must be a valid, 4-byte aligned pointer into mapped device memory.
#[inline]
pub unsafe fn ioread32(base: *mut u8, offset: usize) -> u32 {
    read_volatile(base.add(offset) as *const u32)
}

/// Writes a 32-bit register.
///
/// # Safety
///
/// `base + offset` must be a valid, 4-byte aligned pointer into mapped device memory.
#[inline]
pub unsafe fn iowrite32(base: *mut u8, offset: usize, value: u32) {
    write_volatile(base.add(offset) as *mut u32, value)
}

/// Copies bytes out of device memory.
///
/// # Safety
///
/// `[base + offset, base + offset + dst.len())` must lie within mapped device memory.
pub unsafe fn memcpy_fromio(dst: &mut [u8], base: *mut u8, offset: usize) {
    let src = base.add(offset) as *const u8;
    for (i, byte) in dst.iter_mut().enumerate() {
        *byte = read_volatile(src.add(i));
    }
}

/// Copies bytes into device memory.
///
/// # Safety
///
/// `[base + offset, base + offset + src.len())` must lie within mapped device memory.
pub unsafe fn memcpy_toio(base: *mut u8, offset: usize, src: &[u8]) {
    let dst = base.add(offset);
    for (i, &byte) in src.iter().enumerate() {
        write_volatile(dst.add(i), byte);
    }
}
