use std::time::{Duration, Instant};

use chip8vm::display::DummyDisplay;
use chip8vm::environment::Environment;
use chip8vm::input::DummyInput;
use chip8vm::keypad::keys_down;
use chip8vm::{Chip8Interpreter, Config, FaultKind, Output, RunState, Session};

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

fn spawn(prog: &[u8]) -> Session {
    let config = Config {
        seed: Some(3),
        ..Config::default()
    };
    let mut interpreter = Chip8Interpreter::new(&config).unwrap();
    interpreter.load_bytes(prog).unwrap();
    Session::spawn(interpreter, &config).unwrap()
}

fn next_frame(session: &Session) {
    match session.output().recv_timeout(RECV_TIMEOUT) {
        Ok(Output::Frame(_)) => {}
        other => panic!("expected a frame, got {:?}", other),
    }
}

#[test]
fn test_halt_stops_between_instructions() {
    // 200: JP 200
    let session = spawn(&[0x12, 0x00]);
    next_frame(&session);
    session.halt();
    let report = session.join().unwrap();
    assert_eq!(report.fault, None);
    assert!(report.frames >= 1);
    assert_eq!(report.interpreter.program_counter(), 0x200);
}

#[test]
fn test_fault_is_reported() {
    let session = spawn(&[0x00, 0xee]);
    let halted = loop {
        match session.output().recv_timeout(RECV_TIMEOUT) {
            Ok(Output::Halted(fault)) => break fault,
            Ok(Output::Frame(_)) => continue,
            Err(e) => panic!("no halt: {:?}", e),
        }
    };
    let fault = halted.expect("fault");
    assert_eq!(fault.kind, FaultKind::StackUnderflow);
    assert_eq!(fault.pc, 0x200);

    let report = session.join().unwrap();
    assert_eq!(report.fault, Some(fault));
}

#[test]
fn test_wait_for_key_through_session() {
    // 200: LD V5, K; 202: JP 202
    let session = spawn(&[0xf5, 0x0a, 0x12, 0x02]);
    next_frame(&session);
    let dump = session.dump().unwrap();
    assert_eq!(dump.run_state, RunState::AwaitingKey(5));
    assert_eq!(dump.program_counter, 0x200);

    assert!(session.send_keypad(keys_down(&[0xb])));
    let dump = session.dump().unwrap();
    assert_eq!(dump.registers[5], 0xb);
    assert_eq!(dump.program_counter, 0x202);
    assert_eq!(dump.run_state, RunState::Running);
    session.halt();
    session.join().unwrap();
}

#[test]
fn test_halt_while_awaiting_key() {
    // 200: LD V0, K
    let session = spawn(&[0xf0, 0x0a]);
    next_frame(&session);
    assert_eq!(
        session.dump().map(|d| d.run_state),
        Some(RunState::AwaitingKey(0))
    );

    let start = Instant::now();
    session.halt();
    let halted = loop {
        match session.output().recv_timeout(RECV_TIMEOUT) {
            Ok(Output::Halted(fault)) => break fault,
            Ok(Output::Frame(_)) => continue,
            Err(e) => panic!("no halt: {:?}", e),
        }
    };
    assert_eq!(halted, None);
    assert!(start.elapsed() < RECV_TIMEOUT);

    let report = session.join().unwrap();
    assert_eq!(report.fault, None);
    assert_eq!(report.interpreter.program_counter(), 0x200);
    assert!(report.interpreter.is_awaiting_key());
}

#[test]
fn test_disassemble_through_session() {
    let session = spawn(&[0x00, 0xe0, 0x12, 0x02]);
    let listing = session.disassemble().unwrap();
    assert_eq!(listing, ["0x200: CLS", "0x202: JP 0x202"]);
    session.halt();
    session.join().unwrap();
}

#[test]
fn test_timers_decay_no_faster_than_60hz() {
    // 200: LD V0, 60; 202: LD DT, V0; 204: JP 204
    let start = Instant::now();
    let session = spawn(&[0x60, 0x3c, 0xf0, 0x15, 0x12, 0x04]);
    std::thread::sleep(Duration::from_millis(250));
    let dump = session.dump().unwrap();
    let elapsed = start.elapsed().as_secs_f64();
    session.halt();
    session.join().unwrap();

    let ticks = 60 - dump.timers.delay as u32;
    assert!(ticks >= 1, "timer never ticked");
    assert!(
        ticks as f64 <= elapsed * 60.0 + 2.0,
        "{} ticks in {:.3}s",
        ticks,
        elapsed
    );
}

#[test]
fn test_environment_frame_limit() {
    let session = spawn(&[0x12, 0x00]);
    let mut display = DummyDisplay::new();
    let mut input = DummyInput::new(&[]);
    let report = Environment::new(session)
        .frame_limit(Some(3))
        .run(&mut display, &mut input)
        .unwrap();
    assert!(display.frames >= 3);
    assert_eq!(report.fault, None);
}

#[test]
fn test_environment_feeds_keypad() {
    // 200: LD V0, K; 202: LD I, 0x050 (font 0); 204: DRW V0, V0, 5; 206: JP 206
    let session = spawn(&[0xf0, 0x0a, 0xa0, 0x50, 0xd0, 0x05, 0x12, 0x06]);
    let mut display = DummyDisplay::new();
    let mut input = DummyInput::new(&[]).then(&[]).then(&[3]);
    let report = Environment::new(session)
        .frame_limit(Some(20))
        .run(&mut display, &mut input)
        .unwrap();
    assert_eq!(report.interpreter.registers()[0], 3);
    assert_eq!(report.interpreter.program_counter(), 0x206);
    assert!(report.interpreter.framebuffer().get(3, 3));
    assert!(display.last.unwrap().lit_count() > 0);
}

#[test]
fn test_environment_quit() {
    let session = spawn(&[0x12, 0x00]);
    let mut display = DummyDisplay::new();
    let mut input = DummyInput::new(&[]).quit_after(2);
    let report = Environment::new(session)
        .run(&mut display, &mut input)
        .unwrap();
    assert!(input.scans() >= 2);
    assert_eq!(report.fault, None);
}
