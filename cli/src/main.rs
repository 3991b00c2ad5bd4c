//! Demo driver: one fixed invocation of the demo lifted entry.
//!
//! Takes no flags and no runtime input; seeds the accumulator with a literal
//! value, invokes the lifted function, and prints the resulting accumulator
//! in hexadecimal.

use log::debug;
use relift_lifted_demo::{register, DEMO_DOUBLE_ENTRY};
use relift_runtime::Harness;

const DEMO_INPUT: u32 = 8;

fn main() {
    env_logger::init();
    register();

    let mut harness = Harness::new();
    debug!(
        "demo invocation: entry={DEMO_DOUBLE_ENTRY:#010X} input={DEMO_INPUT:#X} esp={:#010X}",
        harness.entry_esp()
    );
    let k = harness
        .invoke_entry(DEMO_DOUBLE_ENTRY, DEMO_INPUT)
        .expect("demo lifted entry not registered");

    println!("{k:#X}");
}
