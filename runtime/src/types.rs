//! Core contract types shared between the harness and lifted code.

use crate::regstate::RegState;

/// Function pointer type for lifted function entry points.
///
/// A lifted function accepts exactly one parameter, the register state by
/// mutable reference, and returns nothing directly: all inputs and outputs
/// pass through the state's fields. The stack-pointer field holds a guest
/// address into the scratch region active on the calling thread; spills go
/// through [`crate::mem`].
pub type LiftedFn = fn(&mut RegState);
