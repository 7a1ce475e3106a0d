use std::time::{Duration, Instant};

use crate::control::{Controls, Wake};

/// Source of delays for the typing loop.
pub trait Clock {
    /// Wait `dur`, returning early with [`Wake::Stopped`] when stop is raised.
    fn sleep(&mut self, dur: Duration, controls: &Controls) -> Wake;

    /// Time since the clock was created.
    fn elapsed(&self) -> Duration;
}

impl<C: Clock + ?Sized> Clock for &mut C {
    fn sleep(&mut self, dur: Duration, controls: &Controls) -> Wake {
        (**self).sleep(dur, controls)
    }

    fn elapsed(&self) -> Duration {
        (**self).elapsed()
    }
}

/// Wall-clock delays.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    started: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn sleep(&mut self, dur: Duration, controls: &Controls) -> Wake {
        controls.sleep(dur)
    }

    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Virtual time: records every requested delay and returns at once.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    slept: Vec<Duration>,
    now: Duration,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slept(&self) -> &[Duration] {
        &self.slept
    }
}

impl Clock for ManualClock {
    fn sleep(&mut self, dur: Duration, controls: &Controls) -> Wake {
        if controls.is_stopped() {
            return Wake::Stopped;
        }
        self.slept.push(dur);
        self.now += dur;
        Wake::Elapsed
    }

    fn elapsed(&self) -> Duration {
        self.now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_accumulates_virtual_time() {
        let controls = Controls::new();
        let mut clock = ManualClock::new();
        clock.sleep(Duration::from_millis(300), &controls);
        clock.sleep(Duration::from_millis(700), &controls);
        assert_eq!(clock.elapsed(), Duration::from_secs(1));
        assert_eq!(clock.slept().len(), 2);
    }

    #[test]
    fn manual_clock_honors_stop() {
        let controls = Controls::new();
        controls.stop();
        let mut clock = ManualClock::new();
        assert_eq!(clock.sleep(Duration::from_secs(5), &controls), Wake::Stopped);
        assert_eq!(clock.elapsed(), Duration::ZERO);
    }
}
