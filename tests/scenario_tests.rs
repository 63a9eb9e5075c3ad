//! End-to-end scenarios across the core, the effect runner and the
//! instruction simulator.

use toggle_counter::checkpoint::Checkpoint;
use toggle_counter::config::MachineConfig;
use toggle_counter::core::{CounterState, Direction};
use toggle_counter::effects::{CounterStateMachine, MachineError, SimulatedBoard};
use toggle_counter::pio::PioStateMachine;
use toggle_counter::stimulus::{values, ButtonScript};

/// Press and release during the fourth delay phase (Begin at 6170).
fn fourth_phase_press() -> ButtonScript {
    ButtonScript::new().press(6_500, 100)
}

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[tokio::test]
async fn effect_runner_reverses_after_press() {
    init_logger();
    let mut machine = CounterStateMachine::configure(MachineConfig::default()).unwrap();
    machine.start().unwrap();
    let board = SimulatedBoard::new(fourth_phase_press());

    machine.run_until(&board, 16_000).await.unwrap();

    assert_eq!(
        values(&board.frames()),
        vec![15, 14, 13, 12, 13, 14, 15, 0, 1]
    );
    assert_eq!(machine.direction(), Direction::Increment);
}

#[test]
fn simulator_reverses_after_press() {
    let mut sm = PioStateMachine::toggle_binary(&MachineConfig::default());
    let frames = sm.run_script(&fourth_phase_press(), 16_000);
    assert_eq!(values(&frames), vec![15, 14, 13, 12, 13, 14, 15, 0, 1]);
}

#[tokio::test]
async fn runner_and_simulator_agree_frame_for_frame() {
    let script = fourth_phase_press().press(9_000, 2_500).press(13_100, 3);
    let mut machine = CounterStateMachine::configure(MachineConfig::default()).unwrap();
    machine.start().unwrap();
    let board = SimulatedBoard::new(script.clone());
    machine.run_until(&board, 30_000).await.unwrap();

    let mut sm = PioStateMachine::toggle_binary(&MachineConfig::default());
    assert_eq!(sm.run_script(&script, 30_000), board.frames());
}

#[tokio::test]
async fn held_button_blocks_until_release() {
    let mut machine = CounterStateMachine::configure(MachineConfig::default()).unwrap();
    machine.start().unwrap();
    let board = SimulatedBoard::new(ButtonScript::new().press(100, 50_000));

    machine.run_until(&board, 40_000).await.unwrap();
    assert_eq!(machine.current_state(), CounterState::TogglePress);
    assert_eq!(values(&board.frames()), vec![15]);

    machine.run_until(&board, 50_200).await.unwrap();
    assert_eq!(machine.direction(), Direction::Increment);
    assert_eq!(values(&board.frames()), vec![15, 0]);
}

#[tokio::test]
async fn binary_checkpoint_resumes_mid_phase() {
    let config = MachineConfig::from_json(r#"{ "history_capacity": 16 }"#).unwrap();
    let mut machine = CounterStateMachine::configure(config).unwrap();
    machine.start().unwrap();
    let board = SimulatedBoard::new(fourth_phase_press());
    machine.run_until(&board, 6_550).await.unwrap();

    let bytes = machine.checkpoint().to_binary().unwrap();
    machine.stop();
    assert_eq!(machine.start(), Err(MachineError::Stopped));

    let checkpoint = Checkpoint::from_binary(&bytes).unwrap();
    assert_eq!(checkpoint.config.history_capacity, 16);
    let mut resumed: CounterStateMachine<SimulatedBoard> =
        CounterStateMachine::from_checkpoint(checkpoint).unwrap();
    assert_eq!(resumed.history().len(), 16);
    resumed.start().unwrap();

    let rest = SimulatedBoard::new(fourth_phase_press());
    resumed.run_until(&rest, 16_000).await.unwrap();
    assert_eq!(values(&rest.frames()), vec![13, 14, 15, 0, 1]);
}
