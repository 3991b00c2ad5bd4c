use log::debug;
use thiserror::Error;

use crate::dispatch::lookup_lifted_fn;
use crate::regstate::RegState;
use crate::stack::ScratchStack;
use crate::types::LiftedFn;

/// Diagnosable invocation failures.
///
/// The core invocation path is infallible by design: stack exhaustion and
/// layout mismatch are undefined behavior, not errors. These variants cover
/// the two opt-in diagnostics layered on top.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum InvokeError {
    #[error("no lifted function registered at entry address {0:#010X}")]
    UnknownEntry(u32),
    #[error("scratch stack guard band clobbered ({clobbered} sentinel words overwritten)")]
    StackGuard { clobbered: usize },
}

/// Drives lifted functions through the register-state calling convention.
///
/// One invocation: zero-initialize a [`RegState`], plant the stack pointer
/// near the top of the owned scratch region, seed the input registers, call
/// the lifted function with the state by reference, and read the result
/// registers back. The callee may read and write every field, including the
/// stack pointer, and spills its emulated stack frames into the scratch
/// region as a byproduct.
///
/// Invocations are synchronous and exclusive: the harness owns its scratch
/// region and each call runs to completion before the next.
pub struct Harness {
    stack: ScratchStack,
}

impl Harness {
    /// Harness with a default-sized, unguarded scratch stack.
    pub fn new() -> Self {
        Self::with_stack(ScratchStack::new())
    }

    pub fn with_stack(stack: ScratchStack) -> Self {
        Self { stack }
    }

    /// Stack-pointer value every callee observes at entry.
    pub fn entry_esp(&self) -> u32 {
        self.stack.entry_esp()
    }

    pub fn stack(&self) -> &ScratchStack {
        &self.stack
    }

    /// Invoke with `input` seeded into the accumulator; returns the
    /// accumulator after the call.
    pub fn invoke(&mut self, func: LiftedFn, input: u32) -> u32 {
        let mut state = RegState::new();
        state.eax = input;
        self.invoke_state(func, &mut state);
        state.eax
    }

    /// Lower-level variant: the caller seeds any registers it likes; the
    /// harness only plants the stack pointer.
    pub fn invoke_state(&mut self, func: LiftedFn, state: &mut RegState) {
        state.esp = self.stack.entry_esp();
        debug!(
            "invoking lifted function: esp={:#010X} eax={:#010X}",
            state.esp, state.eax
        );
        let _active = self.stack.activate();
        func(state);
    }

    /// [`invoke`](Self::invoke) plus a post-call check of the guard band.
    ///
    /// Only meaningful with a stack built by [`ScratchStack::with_guard`];
    /// detection is best-effort, see the stack documentation.
    pub fn invoke_checked(&mut self, func: LiftedFn, input: u32) -> Result<u32, InvokeError> {
        let result = self.invoke(func, input);
        match self.stack.clobbered_guard_words() {
            0 => Ok(result),
            clobbered => Err(InvokeError::StackGuard { clobbered }),
        }
    }

    /// Resolve an entry address through the registered lookup and invoke it.
    pub fn invoke_entry(&mut self, addr: u32, input: u32) -> Result<u32, InvokeError> {
        let func = lookup_lifted_fn(addr).ok_or(InvokeError::UnknownEntry(addr))?;
        Ok(self.invoke(func, input))
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::set_lookup_lifted_fn;
    use crate::mem;
    use crate::stack::{DEFAULT_STACK_WORDS, STACK_BASE};

    // Copies the registers the harness planted into readable fields.
    fn entry_witness(state: &mut RegState) {
        state.ebx = state.esp;
        state.ecx = state.eax;
    }

    fn increment(state: &mut RegState) {
        state.eax = state.eax.wrapping_add(1);
    }

    // Spills through esp and restores it, like a well-behaved callee.
    fn spill_and_restore(state: &mut RegState) {
        state.esp = state.esp.wrapping_sub(4);
        mem::store_word(state.esp, state.eax);
        state.eax = mem::load_word(state.esp).wrapping_mul(3);
        state.esp = state.esp.wrapping_add(4);
    }

    // Scribbles over the base of the region, where the guard band lives.
    fn stack_smasher(state: &mut RegState) {
        for i in 0..8 {
            mem::store_word(STACK_BASE + i * 4, state.eax);
        }
    }

    fn test_lookup(addr: u32) -> Option<LiftedFn> {
        match addr {
            0x1000 => Some(increment as LiftedFn),
            _ => None,
        }
    }

    #[test]
    fn callee_observes_seeded_eax_and_planted_esp() {
        let mut harness = Harness::new();
        let mut state = RegState::new();
        state.eax = 0x8;
        harness.invoke_state(entry_witness, &mut state);
        assert_eq!(state.ebx, harness.entry_esp());
        assert_eq!(state.ecx, 0x8);
    }

    #[test]
    fn invoke_returns_final_accumulator() {
        let mut harness = Harness::new();
        assert_eq!(harness.invoke(increment, 8), 9);
    }

    #[test]
    fn repeated_invocations_are_deterministic() {
        let mut harness = Harness::new();
        let first = harness.invoke(spill_and_restore, 8);
        for _ in 0..10 {
            assert_eq!(harness.invoke(spill_and_restore, 8), first);
        }
        assert_eq!(first, 24);
    }

    #[test]
    fn spills_land_in_the_scratch_region() {
        let mut harness = Harness::new();
        harness.invoke(spill_and_restore, 0xAB);
        let spilled_at = harness.entry_esp() - 4;
        assert_eq!(harness.stack().read_word(spilled_at), 0xAB);
    }

    #[test]
    fn guard_passes_for_well_behaved_callee() {
        let mut harness = Harness::with_stack(ScratchStack::with_guard(DEFAULT_STACK_WORDS));
        assert_eq!(harness.invoke_checked(spill_and_restore, 8), Ok(24));
    }

    #[test]
    fn guard_flags_writes_below_the_live_stack() {
        let mut harness = Harness::with_stack(ScratchStack::with_guard(DEFAULT_STACK_WORDS));
        assert_eq!(
            harness.invoke_checked(stack_smasher, 1),
            Err(InvokeError::StackGuard { clobbered: 8 })
        );
    }

    #[test]
    fn entry_dispatch_resolves_registered_addresses() {
        set_lookup_lifted_fn(test_lookup);
        let mut harness = Harness::new();
        assert_eq!(harness.invoke_entry(0x1000, 8), Ok(9));
        assert_eq!(
            harness.invoke_entry(0x2000, 8),
            Err(InvokeError::UnknownEntry(0x2000))
        );
    }
}
