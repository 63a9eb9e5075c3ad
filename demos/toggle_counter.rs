//! Toggle Counter
//!
//! Runs the counter against a simulated board with a scripted button:
//! three idle phases counting down, then one press that reverses the
//! direction. Saves a checkpoint halfway and resumes from it.
//!
//! Run with: RUST_LOG=debug cargo run --example toggle_counter

use toggle_counter::checkpoint::Checkpoint;
use toggle_counter::config::MachineConfig;
use toggle_counter::effects::{CounterStateMachine, SimulatedBoard};
use toggle_counter::stimulus::ButtonScript;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("=== Toggle Counter Example ===\n");

    let config = MachineConfig::builder()
        .frequency(2_000)
        .toggle_pin(15)
        .out_base(0)
        .build()?;
    let script = ButtonScript::new().press(6_500, 100);
    let board = SimulatedBoard::new(script.clone());

    let mut machine = CounterStateMachine::configure(config.clone())?;
    machine.start()?;
    machine.run_until(&board, 8_000).await?;

    let json = machine.checkpoint().to_json()?;
    println!("Checkpoint at cycle {}:\n{}\n", machine.cycle(), json);
    machine.stop();

    let mut resumed = CounterStateMachine::from_checkpoint(Checkpoint::from_json(&json)?)?;
    resumed.start()?;
    let rest = SimulatedBoard::new(script);
    resumed.run_until(&rest, 20_000).await?;

    println!("{:>8}  {:>10}  {:>6}", "cycle", "time", "leds");
    for frame in board.frames().iter().chain(rest.frames().iter()) {
        let time = config.cycles_to_duration(frame.cycle);
        println!(
            "{:>8}  {:>9.3}s  {} ({})",
            frame.cycle,
            time.as_secs_f64(),
            frame.value,
            frame.value.value()
        );
    }

    println!("\nFinal direction: {:?}", resumed.direction());
    Ok(())
}
