use std::ops::RangeInclusive;
use std::time::Duration;

use rand::Rng;

/// Per-word pacing and break decisions.
///
/// Stateless: the caller passes the running word count on every call.
#[derive(Debug, Clone)]
pub struct PaceModel {
    pub wpm_floor: u32,
    pub wpm_ceiling: u32,
    /// Half-width of the per-word speed jitter around the setting.
    pub wpm_jitter: u32,
    /// A fresh break threshold is drawn from this window on every check.
    pub break_every_words: RangeInclusive<u64>,
    pub break_secs: RangeInclusive<f64>,
    pub correction_secs: RangeInclusive<f64>,
}

impl Default for PaceModel {
    fn default() -> Self {
        Self {
            wpm_floor: 50,
            wpm_ceiling: 220,
            wpm_jitter: 5,
            break_every_words: 20..=40,
            break_secs: 1.5..=3.5,
            correction_secs: 0.3..=0.7,
        }
    }
}

/// What to wait for after a word has been typed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Delay {
    Word(Duration),
    Break(Duration),
}

impl Delay {
    pub fn duration(self) -> Duration {
        match self {
            Delay::Word(d) | Delay::Break(d) => d,
        }
    }
}

impl PaceModel {
    /// Draw the effective speed for one word.
    pub fn effective_wpm(&self, wpm_setting: u32, rng: &mut impl Rng) -> u32 {
        let lower = self.wpm_floor.max(wpm_setting.saturating_sub(self.wpm_jitter));
        let upper = self
            .wpm_ceiling
            .min(wpm_setting.saturating_add(self.wpm_jitter));
        if lower > upper {
            lower
        } else {
            rng.gen_range(lower..=upper)
        }
    }

    pub fn delay_for(&self, wpm_setting: u32, rng: &mut impl Rng) -> Duration {
        let wpm = self.effective_wpm(wpm_setting, rng).max(1);
        Duration::from_secs_f64(60.0 / f64::from(wpm))
    }

    /// Break duration if `words_typed` lands on a freshly drawn threshold.
    pub fn break_after(&self, words_typed: u64, rng: &mut impl Rng) -> Option<Duration> {
        let every = rng.gen_range(self.break_every_words.clone()).max(1);
        if words_typed != 0 && words_typed % every == 0 {
            Some(uniform_secs(&self.break_secs, rng))
        } else {
            None
        }
    }

    pub fn next_delay(&self, words_typed: u64, wpm_setting: u32, rng: &mut impl Rng) -> Delay {
        let word = self.delay_for(wpm_setting, rng);
        match self.break_after(words_typed, rng) {
            Some(pause) => Delay::Break(pause),
            None => Delay::Word(word),
        }
    }

    /// How long the typist stares at a typo before fixing it.
    pub fn correction_pause(&self, rng: &mut impl Rng) -> Duration {
        uniform_secs(&self.correction_secs, rng)
    }
}

fn uniform_secs(range: &RangeInclusive<f64>, rng: &mut impl Rng) -> Duration {
    let (lo, hi) = (*range.start(), *range.end());
    let secs = if lo < hi { rng.gen_range(lo..=hi) } else { lo };
    Duration::from_secs_f64(secs.max(0.0))
}
