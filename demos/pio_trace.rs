//! PIO Trace
//!
//! Prints the assembled toggle program and runs it cycle by cycle,
//! showing each display write next to the logical state.
//!
//! Run with: RUST_LOG=trace cargo run --example pio_trace

use toggle_counter::config::MachineConfig;
use toggle_counter::core::PinLevel;
use toggle_counter::pio::PioStateMachine;

fn main() {
    env_logger::init();

    println!("=== PIO Trace Example ===\n");

    let config = MachineConfig::default();
    let mut sm = PioStateMachine::toggle_binary(&config);

    let program = sm.program();
    for (address, instruction) in program.instructions().iter().enumerate() {
        let marker = if address == usize::from(program.wrap_target()) {
            "<- wrap target"
        } else if address == usize::from(program.wrap()) {
            "<- wrap"
        } else {
            ""
        };
        println!("{:02}: {:<24} {}", address, instruction.to_string(), marker);
    }
    println!();

    // press between cycle 2200 and 2300
    while sm.cycle() < 7_000 {
        let level = PinLevel::from((2_200..2_300).contains(&sm.cycle()));
        sm.set_input(config.toggle_pin, level);
        if let Some(frame) = sm.tick() {
            println!(
                "cycle {:>5}: {} ({:>2})  x={:#x} y={:#x} state={:?}",
                frame.cycle,
                frame.value,
                frame.value.value(),
                sm.x(),
                sm.y(),
                sm.counter_state()
            );
        }
    }
}
