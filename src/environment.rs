use crate::display::Display;
use crate::error::RunError;
use crate::input::Input;
use crate::keypad::KEY_COUNT;
use crate::session::{Output, Report, Session};
use crossbeam::channel::RecvTimeoutError;
use log::{debug, info};
use std::time::Duration;

/// how long to wait on the executor before polling input anyway
const OUTPUT_TIMEOUT: Duration = Duration::from_millis(50);

/// Sits between a running [`Session`] and the outside world: frames go to
/// the display, keypad snapshots come back from the input, and a quit from
/// either side halts the executor.
pub struct Environment {
    session: Session,
    frame_limit: Option<u64>,
}

impl Environment {
    pub fn new(session: Session) -> Self {
        Environment {
            session,
            frame_limit: None,
        }
    }

    /// halt after showing this many frames
    pub fn frame_limit(mut self, limit: Option<u64>) -> Self {
        self.frame_limit = limit;
        self
    }

    /// main loop; returns once the executor has stopped
    pub fn run(self, display: &mut dyn Display, input: &mut dyn Input) -> Result<Report, RunError> {
        let pumped = self.pump(display, input);
        if pumped.is_err() {
            self.session.halt();
        }
        let report = self.session.join().map_err(|_| RunError::ExecutorPanicked)?;
        pumped.map(|_| report)
    }

    fn pump(&self, display: &mut dyn Display, input: &mut dyn Input) -> Result<(), RunError> {
        let mut last_keys = [false; KEY_COUNT];
        let mut shown = 0u64;
        let mut halting = false;

        loop {
            match self.session.output().recv_timeout(OUTPUT_TIMEOUT) {
                Ok(Output::Frame(frame)) => {
                    display.draw(&frame)?;
                    shown += 1;
                }
                Ok(Output::Halted(fault)) => {
                    match fault {
                        Some(f) => info!("executor faulted: {}", f),
                        None => info!("executor halted after {} frames shown", shown),
                    }
                    return Ok(());
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return Ok(()),
            }

            let keys = input.scan()?;
            if keys != last_keys {
                self.session.send_keypad(keys);
                last_keys = keys;
            }

            let out_of_frames = self.frame_limit.map_or(false, |n| shown >= n);
            if !halting && (input.quit_requested() || out_of_frames) {
                debug!("stopping after {} frames", shown);
                self.session.halt();
                halting = true;
            }
        }
    }
}
