//! Stand-in lifted output.
//!
//! The translation pipeline emits one `fn(&mut RegState)` per original
//! function plus an entry-address lookup table; this crate hand-writes two
//! such functions in the same shape so the harness and demo driver have
//! something concrete to exercise without a full pipeline run. Bodies are
//! straight-line register operations mirroring the machine code they stand
//! in for, with stack traffic going through [`relift_runtime::mem`].

use log::trace;
use relift_runtime::{mem, set_lookup_lifted_fn, LiftedFn, RegState, LAYOUT_VERSION, REGSTATE_BYTES};

// This module was written against layout revision 1 of the register state;
// refuse to build against a relaid-out one.
const _: () = assert!(LAYOUT_VERSION == 1 && REGSTATE_BYTES == 60);

/// Entry address of [`sub_8000001`], the doubling demo.
pub const DEMO_DOUBLE_ENTRY: u32 = 0x0800_0001;

/// Entry address of [`sub_8000002`], the identity demo.
pub const DEMO_IDENTITY_ENTRY: u32 = 0x0800_0002;

#[repr(C)]
struct EntryDesc {
    addr: u32,
    func: LiftedFn,
}

const ENTRIES: &[EntryDesc] = &[
    EntryDesc {
        addr: DEMO_DOUBLE_ENTRY,
        func: sub_8000001,
    },
    EntryDesc {
        addr: DEMO_IDENTITY_ENTRY,
        func: sub_8000002,
    },
];

/// Resolve a lifted function by entry address.
pub fn lookup(addr: u32) -> Option<LiftedFn> {
    ENTRIES.iter().find(|e| e.addr == addr).map(|e| e.func)
}

/// Install this module's lookup as the process-wide entry resolver.
pub fn register() {
    trace!("registering demo lifted module ({} entries)", ENTRIES.len());
    set_lookup_lifted_fn(lookup);
}

/// Lifted `int double(int k)`: doubles the accumulator through a
/// conventional stack frame.
///
/// ```text
/// push ebp           mov ebp, esp
/// sub esp, 4         mov [ebp-4], eax
/// add eax, [ebp-4]
/// mov esp, ebp       pop ebp
/// ret
/// ```
pub fn sub_8000001(state: &mut RegState) {
    // push ebp; mov ebp, esp
    state.esp = state.esp.wrapping_sub(4);
    mem::store_word(state.esp, state.ebp);
    state.ebp = state.esp;
    // sub esp, 4; mov [ebp-4], eax
    state.esp = state.esp.wrapping_sub(4);
    mem::store_word(state.ebp.wrapping_sub(4), state.eax);
    // add eax, [ebp-4]
    let spill = mem::load_word(state.ebp.wrapping_sub(4));
    let (sum, carry) = state.eax.overflowing_add(spill);
    state.eax = sum;
    state.cf = carry as u32;
    state.zf = (sum == 0) as u32;
    state.sf = sum >> 31;
    // mov esp, ebp; pop ebp
    state.esp = state.ebp;
    state.ebp = mem::load_word(state.esp);
    state.esp = state.esp.wrapping_add(4);
}

/// Lifted identity: leaves the accumulator untouched and witnesses the
/// entry stack pointer in `ebx`.
pub fn sub_8000002(state: &mut RegState) {
    state.ebx = state.esp;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_hits_registered_entries_only() {
        assert!(lookup(DEMO_DOUBLE_ENTRY).is_some());
        assert!(lookup(DEMO_IDENTITY_ENTRY).is_some());
        assert!(lookup(0x0800_0003).is_none());
        assert!(lookup(0).is_none());
    }
}
