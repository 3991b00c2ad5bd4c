//! Register-State Invocation Runtime
//!
//! This crate provides the runtime half of the contract between a test
//! harness and functions produced by a binary-to-IR translation pipeline:
//! arguments and results travel through an emulated x86-32 register state
//! rather than the native calling convention.
//!
//! # Architecture
//!
//! - **[`RegState`]**: fixed-layout record standing in for CPU register
//!   contents, passed by reference to every lifted function
//! - **[`ScratchStack`]**: harness-owned memory block emulating the callee's
//!   runtime stack, addressed by 32-bit guest addresses
//! - **[`Harness`]**: builds the state, plants the stack pointer, seeds
//!   inputs, calls, and reads results back
//! - **[`mem`]**: guest loads/stores lifted code resolves against the
//!   invocation's scratch region
//!
//! # Usage Pattern
//!
//! Lifted-output crates register an address lookup and the harness resolves
//! entries through it:
//!
//! ```ignore
//! relift_runtime::set_lookup_lifted_fn(my_generated_lookup);
//!
//! let mut harness = Harness::new();
//! let result = harness.invoke_entry(0x0800_0001, 8)?;
//! println!("{result:#X}");
//! ```

mod dispatch;
mod harness;
pub mod mem;
mod regstate;
mod stack;
mod types;

// Re-export core types
pub use dispatch::{lookup_lifted_fn, set_lookup_lifted_fn};
pub use harness::{Harness, InvokeError};
pub use regstate::{RegState, Register, LAYOUT_VERSION, REGSTATE_BYTES};
pub use stack::{ScratchStack, DEFAULT_STACK_WORDS, GUARD_WORDS, STACK_BASE};
pub use types::LiftedFn;
