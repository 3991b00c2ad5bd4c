use std::sync::OnceLock;

use log::trace;

use crate::types::LiftedFn;

static LOOKUP_LIFTED_FN: OnceLock<fn(u32) -> Option<LiftedFn>> = OnceLock::new();

/// Install the process-wide entry-address lookup.
///
/// Lifted-output crates call this once at startup with their generated
/// lookup. The first installation wins; later calls are ignored.
pub fn set_lookup_lifted_fn(func: fn(u32) -> Option<LiftedFn>) {
    let _ = LOOKUP_LIFTED_FN.set(func);
}

/// Resolve a lifted function by its original entry address.
pub fn lookup_lifted_fn(addr: u32) -> Option<LiftedFn> {
    let resolved = match LOOKUP_LIFTED_FN.get() {
        Some(func) => func(addr),
        None => None,
    };
    trace!(
        "lookup lifted fn {addr:#010X}: {}",
        if resolved.is_some() { "hit" } else { "miss" }
    );
    resolved
}
