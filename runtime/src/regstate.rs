use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};
use static_assertions::const_assert_eq;
use strum_macros::EnumIter;

/// Revision of the register-state layout contract.
///
/// Lifted code is compiled against one specific field set and ordering;
/// extending the state (FPU, SSE, segment registers) is a visible bump of
/// this constant, not a silent relayout.
pub const LAYOUT_VERSION: u32 = 1;

/// Size in bytes of [`RegState`]: 8 general-purpose registers plus 7 status
/// flags, each one 32-bit machine word.
pub const REGSTATE_BYTES: usize = (8 + 7) * 4;

/// Emulated x86-32 register state exchanged with lifted functions.
///
/// This is the sole explicit parameter of every lifted function: the caller
/// seeds input registers, the callee reads and writes any field in place, and
/// the caller reads result registers after the call returns. It is pure data.
/// Field order and width are part of the binary contract shared with the
/// translation pipeline's output; the layout is pinned below at compile time.
///
/// Status flags occupy a whole word each, matching the lifted representation
/// (a flag is 0 or 1, never a packed EFLAGS bitfield).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable, Serialize, Deserialize)]
pub struct RegState {
    pub eax: u32,
    pub ebx: u32,
    pub ecx: u32,
    pub edx: u32,
    pub esi: u32,
    pub edi: u32,
    pub esp: u32,
    pub ebp: u32,
    // Status flags, one word each.
    pub cf: u32,
    pub pf: u32,
    pub af: u32,
    pub zf: u32,
    pub sf: u32,
    pub of: u32,
    pub df: u32,
}

const_assert_eq!(core::mem::size_of::<RegState>(), REGSTATE_BYTES);
const_assert_eq!(core::mem::align_of::<RegState>(), 4);

/// General-purpose registers of the emulated machine, for indexed access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum Register {
    Eax,
    Ebx,
    Ecx,
    Edx,
    Esi,
    Edi,
    Esp,
    Ebp,
}

impl RegState {
    /// All-zero register state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a general-purpose register.
    #[inline(always)]
    pub fn read(&self, reg: Register) -> u32 {
        match reg {
            Register::Eax => self.eax,
            Register::Ebx => self.ebx,
            Register::Ecx => self.ecx,
            Register::Edx => self.edx,
            Register::Esi => self.esi,
            Register::Edi => self.edi,
            Register::Esp => self.esp,
            Register::Ebp => self.ebp,
        }
    }

    /// Write a general-purpose register.
    #[inline(always)]
    pub fn write(&mut self, reg: Register, value: u32) {
        match reg {
            Register::Eax => self.eax = value,
            Register::Ebx => self.ebx = value,
            Register::Ecx => self.ecx = value,
            Register::Edx => self.edx = value,
            Register::Esi => self.esi = value,
            Register::Edi => self.edi = value,
            Register::Esp => self.esp = value,
            Register::Ebp => self.ebp = value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn zeroed_state_reads_zero_everywhere() {
        let state = RegState::new();
        for reg in Register::iter() {
            assert_eq!(state.read(reg), 0, "{reg:?} not zero after init");
        }
        assert_eq!(bytemuck::bytes_of(&state), &[0u8; REGSTATE_BYTES]);
    }

    #[test]
    fn register_write_then_read() {
        let mut state = RegState::new();
        for (i, reg) in Register::iter().enumerate() {
            state.write(reg, 0x1000 + i as u32);
        }
        for (i, reg) in Register::iter().enumerate() {
            assert_eq!(state.read(reg), 0x1000 + i as u32);
        }
    }

    #[test]
    fn raw_view_matches_field_order() {
        let mut state = RegState::new();
        state.eax = 0x11111111;
        state.ebp = 0x88888888;
        state.df = 1;
        let words: &[u32] = bytemuck::cast_slice(bytemuck::bytes_of(&state));
        assert_eq!(words[0], 0x11111111); // eax is the first word
        assert_eq!(words[7], 0x88888888); // ebp is the eighth word
        assert_eq!(words[14], 1); // df is the last word
    }

    #[test]
    fn snapshot_survives_bincode_round_trip() {
        let mut state = RegState::new();
        state.eax = 0xDEAD;
        state.esp = 0x7000_9000;
        state.zf = 1;
        let bytes = bincode::serialize(&state).unwrap();
        let restored: RegState = bincode::deserialize(&bytes).unwrap();
        assert_eq!(restored, state);
    }
}
