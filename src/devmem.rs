//! Host platform backed by the `/dev/mem` physical memory device.

use std::ffi::CString;
use std::io;
use std::ptr;

use log::{debug, error};

use crate::config::Config;
use crate::error::Error;
use crate::platform::{Platform, Reservation, ReservationTable};
use crate::util::{ioread32, iowrite32, memcpy_fromio, memcpy_toio};
use crate::Result;



// Physical ranges reserved by any `DevMem` of this process.
static RESERVATIONS: ReservationTable = ReservationTable::new();



/// Access to physical memory through `/dev/mem` (or any device configured in `Config`).
pub struct DevMem {
    file: SyncFile,
    page_size: usize,
}

impl DevMem {
    /// Opens the memory device named by the configuration.
    ///
    /// # Errors
    ///
    /// `Error::DeviceNotFound` if the device does not exist and `Error::PermissionDenied` if
    /// the process is not allowed to open it (root is usually required).
    pub fn new(config: &Config) -> Result<DevMem> {
        let file = SyncFile::new(config.mem_device())?;
        let page_size = match unsafe { libc::sysconf(libc::_SC_PAGESIZE) } {
            size if size > 0 => size as usize,
            _ => 4096,
        };

        Ok(DevMem { file, page_size })
    }
}

impl Platform for DevMem {
    type Token = Reservation;
    type Handle = MemMap;

    fn reserve(&self, base: u64, size: usize, label: &'static str) -> Result<Reservation> {
        RESERVATIONS.reserve(base, size, label)
    }

    fn unreserve(&self, token: Reservation) {
        RESERVATIONS.release(token);
    }

    fn map(&self, base: u64, size: usize) -> Result<MemMap> {
        MemMap::new(self.file.fd, base, size, self.page_size).map_err(|err| {
            error!("mmap of {:#010x}+{:#x} failed: {}", base, size, err);
            Error::MapFailed { base }
        })
    }

    fn unmap(&self, handle: MemMap) {
        drop(handle);
    }

    fn read32(&self, handle: &MemMap, offset: usize) -> u32 {
        debug_assert!(offset + 4 <= handle.size);
        unsafe { ioread32(handle.base, offset) }
    }

    fn write32(&self, handle: &MemMap, offset: usize, value: u32) {
        debug_assert!(offset + 4 <= handle.size);
        unsafe { iowrite32(handle.base, offset, value) }
    }

    fn read_bytes(&self, handle: &MemMap, offset: usize, dst: &mut [u8]) {
        assert!(offset + dst.len() <= handle.size);
        unsafe { memcpy_fromio(dst, handle.base, offset) }
    }

    fn write_bytes(&self, handle: &MemMap, offset: usize, src: &[u8]) {
        assert!(offset + src.len() <= handle.size);
        unsafe { memcpy_toio(handle.base, offset, src) }
    }

    fn now_ns(&self) -> i64 {
        let mut ts = libc::timespec { tv_sec: 0, tv_nsec: 0 };
        unsafe {
            libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut ts);
        }

        ts.tv_sec as i64 * 1_000_000_000 + ts.tv_nsec as i64
    }
}



/// A read-write file with synchronized I/O.
struct SyncFile {
    fd: libc::c_int,
}

impl SyncFile {
    fn new(path: &str) -> io::Result<SyncFile> {
        let path = CString::new(path).map_err(|_| io::Error::from(io::ErrorKind::InvalidInput))?;
        let fd = unsafe { libc::open(path.as_ptr(), libc::O_RDWR | libc::O_SYNC) };
        match fd {
            err if err < 0 => Err(io::Error::last_os_error()),
            _ => Ok(SyncFile { fd }),
        }
    }
}

impl Drop for SyncFile {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}



/// Memory-mapped physical range.
///
/// The mapping starts on a page boundary; `base` points at the first byte of the
/// requested range within it.
pub struct MemMap {
    map_base: *mut u8,
    map_size: usize,
    base: *mut u8,
    size: usize,
}

impl MemMap {
    fn new(fd: libc::c_int, phys: u64, size: usize, page_size: usize) -> io::Result<MemMap> {
        let page_offset = (phys % page_size as u64) as usize;
        let map_size = size + page_offset;
        unsafe {
            let map_base = libc::mmap(ptr::null_mut(),
                                      map_size as libc::size_t,
                                      libc::PROT_READ | libc::PROT_WRITE,
                                      libc::MAP_SHARED,
                                      fd,
                                      (phys - page_offset as u64) as libc::off_t);
            if map_base == libc::MAP_FAILED {
                Err(io::Error::last_os_error())
            } else {
                debug!("Mapped {:#010x}+{:#x}", phys, size);
                let map_base = map_base as *mut u8;
                Ok(MemMap {
                    map_base,
                    map_size,
                    base: map_base.add(page_offset),
                    size,
                })
            }
        }
    }
}

impl Drop for MemMap {
    fn drop(&mut self) {
        unsafe {
            libc::munmap(self.map_base as *mut libc::c_void, self.map_size as libc::size_t);
        }
    }
}

unsafe impl Send for MemMap {}

unsafe impl Sync for MemMap {}


#[cfg(test)]
#[path = "devmem_test.rs"]
mod devmem_test;
