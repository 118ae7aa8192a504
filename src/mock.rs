//! Mock platform for testing.
//!
//! `MockPlatform` simulates the physical address space with zero-initialized buffers and
//! models the clock control register of the PRU-ICSS: writing a MODULEMODE request makes
//! the IDLEST field settle immediately, unless the clock domain has been declared stuck.
//! It records every reservation, mapping and clock register read, can be told to fail the
//! reservation or mapping of a given base address, and advances a simulated monotonic
//! clock by a fixed step on every reading.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::def::{
    CLKCTRL_IDLEST_MASK, CLKCTRL_MODULEMODE_ENABLE, CLKCTRL_MODULEMODE_MASK, CLKCTRL_REG,
    CM_L4PER2_PRUSS1_CLKCTRL_ADDR,
};
use crate::error::Error;
use crate::platform::{Platform, Reservation, ReservationTable};
use crate::Result;



/// Default advance of the simulated clock per reading.
pub const DEFAULT_CLOCK_STEP_NS: i64 = 1_000;



/// Something the platform was asked to do.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Reserve(u64),
    Unreserve(u64),
    Map(u64),
    Unmap(u64),
}



/// Handle to a mock mapping.
#[derive(Debug)]
pub struct MockHandle {
    base: u64,
    size: usize,
}



#[derive(Default)]
struct State {
    // Backing store of each mapped range, keyed by base address. Contents outlive
    // mappings, like hardware memory does.
    memory: HashMap<u64, Vec<u8>>,
    events: Vec<Event>,
    fail_reserve: HashSet<u64>,
    fail_map: HashSet<u64>,
    clock_stuck: bool,
    clkctrl_reads: usize,
    live_mappings: usize,
}



/// A fault-injecting host platform.
pub struct MockPlatform {
    reservations: ReservationTable,
    state: Mutex<State>,
    now: AtomicI64,
    step: AtomicI64,
}

impl MockPlatform {
    /// Creates a platform on which the PRU clock domain is initially disabled.
    pub fn new() -> MockPlatform {
        let platform = MockPlatform {
            reservations: ReservationTable::new(),
            state: Mutex::new(State::default()),
            now: AtomicI64::new(0),
            step: AtomicI64::new(DEFAULT_CLOCK_STEP_NS),
        };
        platform.set_clkctrl(CLKCTRL_IDLEST_MASK);

        platform
    }

    /// Makes the reservation of the range starting at `base` fail with `Error::Busy`.
    pub fn fail_reserve(&self, base: u64) {
        self.lock().fail_reserve.insert(base);
    }

    /// Makes the mapping of the range starting at `base` fail with `Error::MapFailed`.
    pub fn fail_map(&self, base: u64) {
        self.lock().fail_map.insert(base);
    }

    /// When set, the IDLEST field no longer follows MODULEMODE requests.
    pub fn set_clock_stuck(&self, stuck: bool) {
        self.lock().clock_stuck = stuck;
    }

    /// Sets the advance of the simulated clock per reading.
    pub fn set_clock_step_ns(&self, step: i64) {
        self.step.store(step, Ordering::SeqCst);
    }

    /// Overwrites the clock control register.
    pub fn set_clkctrl(&self, value: u32) {
        let mut state = self.lock();
        let reg = state.memory.entry(CM_L4PER2_PRUSS1_CLKCTRL_ADDR).or_insert_with(|| vec![0; 4]);
        reg[CLKCTRL_REG..CLKCTRL_REG + 4].copy_from_slice(&value.to_le_bytes());
    }

    /// Current value of the clock control register.
    pub fn clkctrl(&self) -> u32 {
        let state = self.lock();
        state
            .memory
            .get(&CM_L4PER2_PRUSS1_CLKCTRL_ADDR)
            .map_or(0, |reg| read_le32(reg, CLKCTRL_REG))
    }

    /// Number of clock control register reads so far.
    pub fn clkctrl_reads(&self) -> usize {
        self.lock().clkctrl_reads
    }

    /// Everything the platform was asked to do, in order.
    pub fn events(&self) -> Vec<Event> {
        self.lock().events.clone()
    }

    pub fn clear_events(&self) {
        self.lock().events.clear();
    }

    /// Contents of the physical range starting at `base`.
    pub fn memory(&self, base: u64, len: usize) -> Vec<u8> {
        let state = self.lock();
        state
            .memory
            .get(&base)
            .map_or_else(|| vec![0; len], |mem| mem[..len.min(mem.len())].to_vec())
    }

    /// The reservation authority.
    pub fn reservations(&self) -> &ReservationTable {
        &self.reservations
    }

    /// Number of mappings not yet torn down.
    pub fn live_mappings(&self) -> usize {
        self.lock().live_mappings
    }

    fn lock(&self) -> MutexGuard<State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MockPlatform {
    fn default() -> MockPlatform {
        MockPlatform::new()
    }
}

impl Platform for MockPlatform {
    type Token = Reservation;
    type Handle = MockHandle;

    fn reserve(&self, base: u64, size: usize, label: &'static str) -> Result<Reservation> {
        let mut state = self.lock();
        state.events.push(Event::Reserve(base));
        if state.fail_reserve.contains(&base) {
            return Err(Error::Busy { base });
        }
        self.reservations.reserve(base, size, label)
    }

    fn unreserve(&self, token: Reservation) {
        self.lock().events.push(Event::Unreserve(token.base()));
        self.reservations.release(token);
    }

    fn map(&self, base: u64, size: usize) -> Result<MockHandle> {
        let mut state = self.lock();
        state.events.push(Event::Map(base));
        if state.fail_map.contains(&base) {
            return Err(Error::MapFailed { base });
        }
        let mem = state.memory.entry(base).or_default();
        if mem.len() < size {
            mem.resize(size, 0);
        }
        state.live_mappings += 1;

        Ok(MockHandle { base, size })
    }

    fn unmap(&self, handle: MockHandle) {
        let mut state = self.lock();
        state.events.push(Event::Unmap(handle.base));
        state.live_mappings -= 1;
    }

    fn read32(&self, handle: &MockHandle, offset: usize) -> u32 {
        assert!(offset + 4 <= handle.size);
        let mut state = self.lock();
        if handle.base == CM_L4PER2_PRUSS1_CLKCTRL_ADDR && offset == CLKCTRL_REG {
            state.clkctrl_reads += 1;
        }
        read_le32(&state.memory[&handle.base], offset)
    }

    fn write32(&self, handle: &MockHandle, offset: usize, value: u32) {
        assert!(offset + 4 <= handle.size);
        let mut state = self.lock();
        let mut value = value;
        if handle.base == CM_L4PER2_PRUSS1_CLKCTRL_ADDR && offset == CLKCTRL_REG && !state.clock_stuck {
            value &= !CLKCTRL_IDLEST_MASK;
            if value & CLKCTRL_MODULEMODE_MASK != CLKCTRL_MODULEMODE_ENABLE {
                value |= CLKCTRL_IDLEST_MASK;
            }
        }
        if let Some(mem) = state.memory.get_mut(&handle.base) {
            mem[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
        }
    }

    fn read_bytes(&self, handle: &MockHandle, offset: usize, dst: &mut [u8]) {
        assert!(offset + dst.len() <= handle.size);
        let state = self.lock();
        dst.copy_from_slice(&state.memory[&handle.base][offset..offset + dst.len()]);
    }

    fn write_bytes(&self, handle: &MockHandle, offset: usize, src: &[u8]) {
        assert!(offset + src.len() <= handle.size);
        let mut state = self.lock();
        if let Some(mem) = state.memory.get_mut(&handle.base) {
            mem[offset..offset + src.len()].copy_from_slice(src);
        }
    }

    fn now_ns(&self) -> i64 {
        let step = self.step.load(Ordering::SeqCst);
        self.now.fetch_add(step, Ordering::SeqCst) + step
    }
}


fn read_le32(mem: &[u8], offset: usize) -> u32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&mem[offset..offset + 4]);
    u32::from_le_bytes(bytes)
}
