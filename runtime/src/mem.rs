//! Guest memory access for lifted code.
//!
//! Lifted functions receive only a register state; loads and stores they emit
//! resolve guest addresses through the scratch region of the invocation in
//! flight on the current thread. The harness installs the region before the
//! call and uninstalls it after, so these helpers are meaningful only inside
//! an invocation.
//!
//! Accesses are word-granular: the low two address bits are ignored, as the
//! translation pipeline emits word-aligned stack traffic.

use std::cell::Cell;
use std::marker::PhantomData;

use log::trace;

use crate::stack::ScratchStack;

#[derive(Clone, Copy)]
pub(crate) struct ActiveRegion {
    pub(crate) ptr: *mut u32,
    pub(crate) words: usize,
    pub(crate) base: u32,
}

thread_local! {
    static ACTIVE: Cell<Option<ActiveRegion>> = const { Cell::new(None) };
}

/// Uninstalls the active region when the invocation scope ends.
pub(crate) struct RegionGuard<'a> {
    prev: Option<ActiveRegion>,
    _stack: PhantomData<&'a mut ScratchStack>,
}

pub(crate) fn install<'a>(region: ActiveRegion) -> RegionGuard<'a> {
    let prev = ACTIVE.with(|slot| slot.replace(Some(region)));
    RegionGuard {
        prev,
        _stack: PhantomData,
    }
}

impl Drop for RegionGuard<'_> {
    fn drop(&mut self) {
        ACTIVE.with(|slot| slot.set(self.prev));
    }
}

#[inline(always)]
fn word_index(region: &ActiveRegion, addr: u32) -> Option<usize> {
    if addr < region.base {
        return None;
    }
    let index = ((addr - region.base) >> 2) as usize;
    (index < region.words).then_some(index)
}

/// Load one word at a guest address.
///
/// Outside the active region (or outside any invocation) the result is
/// undefined by the callee contract; this implementation yields zero.
#[inline(always)]
pub fn load_word(addr: u32) -> u32 {
    ACTIVE.with(|slot| match slot.get() {
        Some(region) => match word_index(&region, addr) {
            Some(i) => unsafe { *region.ptr.add(i) },
            None => {
                trace!("guest load outside scratch region: {addr:#010X}");
                0
            }
        },
        None => 0,
    })
}

/// Store one word at a guest address.
///
/// Outside the active region the store has no effect; the invocation's
/// result is undefined by the callee contract.
#[inline(always)]
pub fn store_word(addr: u32, value: u32) {
    ACTIVE.with(|slot| {
        if let Some(region) = slot.get() {
            match word_index(&region, addr) {
                Some(i) => unsafe { *region.ptr.add(i) = value },
                None => trace!("guest store outside scratch region: {addr:#010X}"),
            }
        }
    });
}
