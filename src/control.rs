//! Operator intents and the suspend points that observe them.
//!
//! A [`Controls`] handle is shared between the host (which raises pause,
//! resume and stop) and the running session (which waits on it). Every wait
//! wakes on stop, including the pause wait.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::model::SessionState;

/// Why a wait returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    Elapsed,
    Resumed,
    Stopped,
}

#[derive(Debug, Default)]
struct Flags {
    paused: bool,
    stopped: bool,
    snapshot: SessionState,
}

#[derive(Debug, Clone, Default)]
pub struct Controls {
    shared: Arc<(Mutex<Flags>, Condvar)>,
}

impl Controls {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Flags> {
        self.shared.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update(&self, f: impl FnOnce(&mut Flags)) {
        let mut flags = self.lock();
        f(&mut flags);
        drop(flags);
        self.shared.1.notify_all();
    }

    pub fn pause(&self) {
        self.update(|f| f.paused = true);
    }

    pub fn resume(&self) {
        self.update(|f| f.paused = false);
    }

    pub fn stop(&self) {
        self.update(|f| f.stopped = true);
    }

    pub fn is_paused(&self) -> bool {
        self.lock().paused
    }

    pub fn is_stopped(&self) -> bool {
        self.lock().stopped
    }

    /// Last state published by the session.
    pub fn snapshot(&self) -> SessionState {
        self.lock().snapshot.clone()
    }

    pub(crate) fn publish(&self, state: &SessionState) {
        self.lock().snapshot = state.clone();
    }

    /// Clear pending intents before a new run.
    pub(crate) fn reset(&self) {
        self.update(|f| {
            f.paused = false;
            f.stopped = false;
        });
    }

    /// Block while paused. Returns `Stopped` as soon as stop is raised, even
    /// while still paused.
    pub fn wait_while_paused(&self) -> Wake {
        let (_, cvar) = &*self.shared;
        let flags = cvar
            .wait_while(self.lock(), |f| f.paused && !f.stopped)
            .unwrap_or_else(PoisonError::into_inner);
        if flags.stopped {
            Wake::Stopped
        } else {
            Wake::Resumed
        }
    }

    /// Sleep for `dur` unless stop is raised first.
    pub fn sleep(&self, dur: Duration) -> Wake {
        let (_, cvar) = &*self.shared;
        let deadline = Instant::now() + dur;
        let mut flags = self.lock();
        loop {
            if flags.stopped {
                return Wake::Stopped;
            }
            let now = Instant::now();
            if now >= deadline {
                return Wake::Elapsed;
            }
            flags = cvar
                .wait_timeout(flags, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn wait_returns_immediately_when_not_paused() {
        let controls = Controls::new();
        assert_eq!(controls.wait_while_paused(), Wake::Resumed);
    }

    #[test]
    fn resume_from_another_thread_wakes_pause() {
        let controls = Controls::new();
        controls.pause();
        let remote = controls.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            remote.resume();
        });
        assert_eq!(controls.wait_while_paused(), Wake::Resumed);
        handle.join().unwrap();
    }

    #[test]
    fn stop_wakes_a_paused_wait() {
        let controls = Controls::new();
        controls.pause();
        let remote = controls.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            remote.stop();
        });
        assert_eq!(controls.wait_while_paused(), Wake::Stopped);
        assert!(controls.is_paused());
        handle.join().unwrap();
    }

    #[test]
    fn stop_cuts_a_sleep_short() {
        let controls = Controls::new();
        let remote = controls.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            remote.stop();
        });
        let started = Instant::now();
        assert_eq!(controls.sleep(Duration::from_secs(30)), Wake::Stopped);
        assert!(started.elapsed() < Duration::from_secs(10));
        handle.join().unwrap();
    }

    #[test]
    fn short_sleep_elapses() {
        let controls = Controls::new();
        assert_eq!(controls.sleep(Duration::from_millis(5)), Wake::Elapsed);
    }

    #[test]
    fn reset_clears_intents() {
        let controls = Controls::new();
        controls.pause();
        controls.stop();
        controls.reset();
        assert!(!controls.is_paused());
        assert!(!controls.is_stopped());
    }
}
