//! Advisory duration estimates shown to the operator before a run.
//!
//! The estimate never drives per-word timing. The speed derived from a chosen
//! completion time becomes the `wpm_setting` fed to the pace model.

use serde::Serialize;

pub const BATCH_SIZE: usize = 3;

const TYPO_RATE: f64 = 0.05;
const AVG_TYPO_PENALTY_SECS: f64 = 1.2;
const BREAK_RATE: f64 = 1.0 / 30.0;
const AVG_BREAK_SECS: f64 = 2.5;
const API_PENALTY_SECS: f64 = 0.2;

pub const SEARCH_WPM_MIN: f64 = 50.0;
pub const SEARCH_WPM_MAX: f64 = 175.0;
const SEARCH_ITERATIONS: usize = 20;
const SEARCH_TOLERANCE_SECS: f64 = 1.0;

/// Shortest completion time the operator may ask for (3 min 54 sec).
pub const MIN_TARGET_SECS: u64 = 234;
pub const DEFAULT_WPM: u32 = 80;

/// Predicted seconds to type `total_words` at `wpm`, including typo, break and
/// API overheads.
pub fn estimate_time(wpm: f64, total_words: usize) -> f64 {
    let words = total_words as f64;
    let base = words / wpm * 60.0;
    let typos = words * TYPO_RATE * AVG_TYPO_PENALTY_SECS;
    let breaks = words * BREAK_RATE * AVG_BREAK_SECS;
    let api = words / BATCH_SIZE as f64 * API_PENALTY_SECS;
    base + typos + breaks + api
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WpmEstimate {
    pub wpm: u32,
    /// False when the search ran out of iterations before getting within a
    /// second of the target; `wpm` is then the last midpoint.
    pub converged: bool,
}

/// Invert [`estimate_time`] by bisection over `[50, 175]` wpm.
pub fn estimate_wpm(target_secs: f64, total_words: usize) -> WpmEstimate {
    let mut low = SEARCH_WPM_MIN;
    let mut high = SEARCH_WPM_MAX;
    let mut mid = (low + high) / 2.0;

    for _ in 0..SEARCH_ITERATIONS {
        mid = (low + high) / 2.0;
        let t = estimate_time(mid, total_words);
        if (t - target_secs).abs() < SEARCH_TOLERANCE_SECS {
            return WpmEstimate {
                wpm: mid as u32,
                converged: true,
            };
        }
        // Time falls as speed rises.
        if t > target_secs {
            low = mid;
        } else {
            high = mid;
        }
    }

    tracing::debug!(target_secs, total_words, mid, "wpm search did not converge");
    WpmEstimate {
        wpm: mid as u32,
        converged: false,
    }
}

/// Bounds and default for the operator's completion-time choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompletionWindow {
    pub min_secs: u64,
    pub max_secs: u64,
    pub default_secs: u64,
}

impl CompletionWindow {
    pub fn for_words(total_words: usize) -> Self {
        let max_secs = estimate_time(SEARCH_WPM_MIN, total_words) as u64;
        let default_secs = estimate_time(f64::from(DEFAULT_WPM), total_words) as u64;
        let min_secs = MIN_TARGET_SECS.min(max_secs);
        Self {
            min_secs,
            max_secs,
            default_secs: default_secs.clamp(min_secs, max_secs),
        }
    }

    pub fn clamp(&self, secs: u64) -> u64 {
        secs.clamp(self.min_secs, self.max_secs)
    }
}

pub fn format_duration(secs: u64) -> String {
    let (mins, secs) = (secs / 60, secs % 60);
    format!("{mins} min {secs} sec")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_adds_all_overheads() {
        // 300 words at 60 wpm: 300s typing, 18s typos, 25s breaks, 20s api.
        let t = estimate_time(60.0, 300);
        assert!((t - 363.0).abs() < 1e-9, "{t}");
    }

    #[test]
    fn estimate_is_monotonic_decreasing_in_wpm() {
        let mut prev = f64::INFINITY;
        for wpm in 50..=175 {
            let t = estimate_time(f64::from(wpm), 500);
            assert!(t < prev);
            prev = t;
        }
    }

    #[test]
    fn wpm_round_trips_through_time() {
        for n in [2_000usize, 5_000] {
            for w in (50..=175).step_by(5) {
                let t = estimate_time(f64::from(w), n);
                let got = estimate_wpm(t, n);
                assert!(got.converged);
                assert!(
                    (i64::from(got.wpm) - i64::from(w)).abs() <= 1,
                    "n={n} w={w} got={}",
                    got.wpm
                );
            }
        }
    }

    #[test]
    fn unreachable_target_is_soft_failure() {
        let n = 1_000;
        let fastest = estimate_time(SEARCH_WPM_MAX, n);
        let got = estimate_wpm(fastest - 100.0, n);
        assert!(!got.converged);
        assert!(got.wpm >= 174 && got.wpm <= 175);

        let slowest = estimate_time(SEARCH_WPM_MIN, n);
        let got = estimate_wpm(slowest + 100.0, n);
        assert!(!got.converged);
        assert_eq!(got.wpm, 50);
    }

    #[test]
    fn window_caps_minimum_for_short_documents() {
        let w = CompletionWindow::for_words(10);
        assert!(w.min_secs <= w.max_secs);
        assert_eq!(w.min_secs, w.max_secs);

        let w = CompletionWindow::for_words(1_000);
        assert_eq!(w.min_secs, MIN_TARGET_SECS);
        assert_eq!(w.max_secs, estimate_time(50.0, 1_000) as u64);
        assert_eq!(w.default_secs, estimate_time(80.0, 1_000) as u64);
        assert_eq!(w.clamp(1), MIN_TARGET_SECS);
    }

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_duration(234), "3 min 54 sec");
        assert_eq!(format_duration(59), "0 min 59 sec");
    }
}
