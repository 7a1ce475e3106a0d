use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Running,
    Paused,
    Completed,
    Stopped,
    Failed,
}

impl Phase {
    pub fn is_active(self) -> bool {
        matches!(self, Phase::Running | Phase::Paused)
    }
}

/// Position and settings of a typing session.
///
/// `paragraph_index`/`word_index` always name the next word to type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub phase: Phase,
    pub paragraph_index: usize,
    pub word_index: usize,
    pub words_typed: usize,
    pub total_words: usize,
    pub wpm_setting: u32,
}

impl SessionState {
    pub fn running(&self) -> bool {
        self.phase.is_active()
    }

    pub fn paused(&self) -> bool {
        self.phase == Phase::Paused
    }

    /// Return to the start, keeping only the terminal phase for display.
    pub(crate) fn reset(&mut self, phase: Phase) {
        *self = SessionState {
            phase,
            ..Default::default()
        };
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Progress {
    pub paragraph_index: usize,
    pub word_index: usize,
    pub words_typed: usize,
    pub total_words: usize,
    /// Whole-document fraction.
    pub fraction: f64,
    /// Fraction of the current paragraph.
    pub paragraph_fraction: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Completed { words_typed: usize, elapsed: Duration },
    Stopped { words_typed: usize },
}
