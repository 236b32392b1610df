use std::time::{Duration, Instant};

/// timer decay and frame cadence
pub const TIMER_HZ: u32 = 60;

/// The delay and sound timers. Only the 60 Hz interrupt counts them down;
/// instructions just read and write them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timers {
    pub delay: u8,
    pub sound: u8,
}

impl Timers {
    /// one 60 Hz tick; both timers stop at zero
    pub fn tick(&mut self) {
        self.delay = self.delay.saturating_sub(1);
        self.sound = self.sound.saturating_sub(1);
    }

    /// a tone would be audible while this holds
    pub fn is_sounding(&self) -> bool {
        self.sound > 0
    }
}

/// how much of each frame is slept out with spin_sleep rather than the OS
const SPIN_MARGIN: Duration = Duration::from_millis(1);

/// Paces frames against wall-clock deadlines. A late frame moves the
/// schedule forward instead of bursting to catch up, so ticks never come
/// faster than the configured rate.
#[derive(Debug, Clone)]
pub struct FrameClock {
    period: Duration,
    deadline: Instant,
}

impl FrameClock {
    pub fn new(rate_hz: u32) -> Self {
        let period = Duration::from_secs(1) / rate_hz.max(1);
        FrameClock {
            period,
            deadline: Instant::now() + period,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// when a blocking wait should hand over to [`FrameClock::wait`]
    pub fn wake_deadline(&self) -> Instant {
        self.deadline.checked_sub(SPIN_MARGIN).unwrap_or(self.deadline)
    }

    /// time left until the current frame is due
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// sleep out whatever is left of the frame
    pub fn wait(&self) {
        let left = self.remaining();
        if !left.is_zero() {
            spin_sleep::sleep(left);
        }
    }

    /// move on to the next frame
    pub fn advance(&mut self) {
        let now = Instant::now();
        self.deadline += self.period;
        if self.deadline < now {
            self.deadline = now + self.period;
        }
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        FrameClock::new(TIMER_HZ)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timers_count_down_to_zero() {
        let mut t = Timers {
            delay: 2,
            sound: 1,
        };
        t.tick();
        assert_eq!(t, Timers { delay: 1, sound: 0 });
        t.tick();
        assert_eq!(t.delay, 0);
        t.tick();
        assert_eq!(t, Timers::default());
        assert!(!t.is_sounding());
    }

    #[test]
    fn test_period_is_sixtieth() {
        let c = FrameClock::default();
        assert_eq!(c.period(), Duration::from_secs(1) / 60);
    }

    #[test]
    fn test_wait_reaches_deadline() {
        let c = FrameClock::new(200);
        c.wait();
        assert!(Instant::now() >= c.deadline());
    }

    #[test]
    fn test_wake_deadline_leaves_spin_margin() {
        let c = FrameClock::default();
        assert_eq!(c.deadline() - c.wake_deadline(), SPIN_MARGIN);
    }

    #[test]
    fn test_late_frame_does_not_burst() {
        let mut c = FrameClock::new(1000);
        std::thread::sleep(Duration::from_millis(20));
        c.advance();
        // a catch-up schedule would leave the deadline in the past
        assert!(c.deadline() > Instant::now());
    }
}
