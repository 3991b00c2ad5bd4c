use crate::mem::{self, ActiveRegion};

/// Default scratch stack capacity in words (160 KiB), generously
/// over-provisioned since the callee's actual stack usage is unknown.
pub const DEFAULT_STACK_WORDS: usize = 4096 * 10;

/// Guest address at which the scratch region is mapped.
pub const STACK_BASE: u32 = 0x7000_0000;

/// Width of the optional sentinel guard band at the base of the region.
pub const GUARD_WORDS: usize = 64;

const GUARD_SENTINEL: u32 = 0xDEAD_BEEF;

/// Harness-owned memory block emulating the callee's runtime stack.
///
/// The region is addressed by 32-bit guest addresses starting at
/// [`STACK_BASE`]; the stack pointer handed to a lifted function sits near
/// the high end so that downward growth stays inside the region. The region
/// never grows and has no guard pages: a callee that runs below the base
/// produces an undefined result, not an error.
///
/// [`with_guard`](Self::with_guard) adds a best-effort overflow diagnostic: a
/// sentinel pattern over the lowest [`GUARD_WORDS`] words, re-checked by the
/// harness after an invocation. An overflow that skips the band entirely is
/// still undetected.
pub struct ScratchStack {
    words: Box<[u32]>,
    guarded: bool,
}

impl ScratchStack {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_STACK_WORDS)
    }

    /// Unguarded region of `words` 32-bit words.
    pub fn with_capacity(words: usize) -> Self {
        assert!(words > 0, "scratch stack cannot be empty");
        Self {
            words: vec![0u32; words].into_boxed_slice(),
            guarded: false,
        }
    }

    /// Region of `words` words with a sentinel guard band at the base.
    pub fn with_guard(words: usize) -> Self {
        let mut stack = Self::with_capacity(words);
        let band = GUARD_WORDS.min(stack.words.len());
        stack.words[..band].fill(GUARD_SENTINEL);
        stack.guarded = true;
        stack
    }

    pub fn capacity_words(&self) -> usize {
        self.words.len()
    }

    /// Lowest guest address of the region.
    pub fn base(&self) -> u32 {
        STACK_BASE
    }

    /// One past the highest guest address of the region.
    pub fn limit(&self) -> u32 {
        STACK_BASE + (self.words.len() * 4) as u32
    }

    /// Guest address planted into the stack-pointer field before a call.
    ///
    /// Sits at 9/10 of capacity, leaving the vast majority of the region
    /// available below for downward growth.
    pub fn entry_esp(&self) -> u32 {
        STACK_BASE + (self.words.len() / 10 * 9 * 4) as u32
    }

    /// Read one word at a guest address. Out-of-region reads yield zero.
    pub fn read_word(&self, addr: u32) -> u32 {
        match self.word_index(addr) {
            Some(i) => self.words[i],
            None => 0,
        }
    }

    /// Write one word at a guest address. Out-of-region writes are dropped.
    pub fn write_word(&mut self, addr: u32, value: u32) {
        if let Some(i) = self.word_index(addr) {
            self.words[i] = value;
        }
    }

    /// Number of guard-band sentinel words overwritten since construction.
    ///
    /// Always zero for an unguarded region.
    pub fn clobbered_guard_words(&self) -> usize {
        if !self.guarded {
            return 0;
        }
        let band = GUARD_WORDS.min(self.words.len());
        self.words[..band]
            .iter()
            .filter(|&&w| w != GUARD_SENTINEL)
            .count()
    }

    fn word_index(&self, addr: u32) -> Option<usize> {
        if addr < STACK_BASE {
            return None;
        }
        let index = ((addr - STACK_BASE) >> 2) as usize;
        (index < self.words.len()).then_some(index)
    }

    /// Expose the region to guest loads and stores for the duration of one
    /// invocation. The returned guard uninstalls it on drop.
    pub(crate) fn activate(&mut self) -> mem::RegionGuard<'_> {
        mem::install(ActiveRegion {
            ptr: self.words.as_mut_ptr(),
            words: self.words.len(),
            base: STACK_BASE,
        })
    }
}

impl Default for ScratchStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_esp_leaves_most_of_the_region_below() {
        let stack = ScratchStack::new();
        let esp = stack.entry_esp();
        assert_eq!(esp, STACK_BASE + (4096 * 9 * 4) as u32);
        assert!(esp > stack.base() && esp < stack.limit());
        // At least 9/10 of the region sits below the entry point.
        let below = (esp - stack.base()) as usize / 4;
        assert!(below * 10 >= stack.capacity_words() * 9);
    }

    #[test]
    fn word_access_round_trips_and_ignores_out_of_region() {
        let mut stack = ScratchStack::with_capacity(256);
        let addr = stack.entry_esp() - 4;
        stack.write_word(addr, 0xCAFE);
        assert_eq!(stack.read_word(addr), 0xCAFE);

        stack.write_word(stack.limit(), 0x1234);
        assert_eq!(stack.read_word(stack.limit()), 0);
        assert_eq!(stack.read_word(STACK_BASE - 4), 0);
    }

    #[test]
    fn guard_band_reports_clobbers() {
        let mut stack = ScratchStack::with_guard(1024);
        assert_eq!(stack.clobbered_guard_words(), 0);

        stack.write_word(STACK_BASE, 0);
        stack.write_word(STACK_BASE + 4, 0);
        assert_eq!(stack.clobbered_guard_words(), 2);
    }

    #[test]
    fn unguarded_region_never_reports() {
        let mut stack = ScratchStack::with_capacity(1024);
        stack.write_word(STACK_BASE, 7);
        assert_eq!(stack.clobbered_guard_words(), 0);
    }
}
