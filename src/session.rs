use anyhow::{ensure, Result};
use rand::Rng;

use crate::clock::Clock;
use crate::control::{Controls, Wake};
use crate::document::{extract_doc_id, DocumentId, Manuscript};
use crate::error::SessionError;
use crate::estimate::BATCH_SIZE;
use crate::gateway::DocumentGateway;
use crate::model::{Outcome, Phase, Progress, SessionState};
use crate::pace::{Delay, PaceModel};
use crate::trace::{SessionEvent, SessionObserver};
use crate::typo::TypoModel;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Words sent per append.
    pub batch_size: usize,
    pub typo: TypoModel,
    pub pace: PaceModel,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            batch_size: BATCH_SIZE,
            typo: TypoModel::default(),
            pace: PaceModel::default(),
        }
    }
}

pub fn validate_config(cfg: &SessionConfig) -> Result<()> {
    ensure!(cfg.batch_size > 0, "batch_size must be > 0");

    ensure!(
        (0.0..=1.0).contains(&cfg.typo.rate),
        "typo rate must be between 0.0 and 1.0"
    );

    let pace = &cfg.pace;
    ensure!(pace.wpm_floor > 0, "wpm_floor must be > 0");
    ensure!(
        pace.wpm_floor <= pace.wpm_ceiling,
        "wpm_floor must be <= wpm_ceiling"
    );
    ensure!(
        *pace.break_every_words.start() > 0
            && pace.break_every_words.start() <= pace.break_every_words.end(),
        "break window must be a non-empty range of positive word counts"
    );

    for (name, range) in [
        ("break_secs", &pace.break_secs),
        ("correction_secs", &pace.correction_secs),
    ] {
        ensure!(
            range.start().is_finite() && range.end().is_finite(),
            "{name} must be finite"
        );
        ensure!(
            *range.start() >= 0.0 && range.start() <= range.end(),
            "{name} must be a non-negative, non-empty range"
        );
    }

    Ok(())
}

enum Flow {
    Finished,
    Stopped,
}

/// Types one source document into a target document, word by word.
///
/// Lifecycle: `Idle -> Running -> (Paused <-> Running) -> Completed | Stopped | Failed`.
/// Intents arrive through the [`Controls`] handle returned by [`TypingSession::controls`];
/// they are observed between words and inside every wait.
pub struct TypingSession<G, C, R> {
    gateway: G,
    clock: C,
    rng: R,
    config: SessionConfig,
    controls: Controls,
    state: SessionState,
    manuscript: Manuscript,
    target: Option<DocumentId>,
}

impl<G, C, R> TypingSession<G, C, R>
where
    G: DocumentGateway,
    C: Clock,
    R: Rng,
{
    pub fn new(gateway: G, clock: C, rng: R, config: SessionConfig) -> Result<Self, SessionError> {
        validate_config(&config).map_err(|err| SessionError::InvalidConfig(err.to_string()))?;
        Ok(Self {
            gateway,
            clock,
            rng,
            config,
            controls: Controls::new(),
            state: SessionState::default(),
            manuscript: Manuscript::default(),
            target: None,
        })
    }

    pub fn controls(&self) -> Controls {
        self.controls.clone()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Resolve both links, fetch the source and move to `Running`.
    ///
    /// Neither link is fetched unless both carry a document id.
    pub fn start(
        &mut self,
        source_link: &str,
        target_link: &str,
        wpm_setting: u32,
    ) -> Result<(), SessionError> {
        if self.state.running() {
            return Err(SessionError::AlreadyRunning);
        }
        self.controls.reset();

        let source = extract_doc_id(source_link);
        let target = extract_doc_id(target_link);
        let (source, target) = match (source, target) {
            (Some(source), Some(target)) => (source, target),
            (None, _) => {
                let err = SessionError::InvalidLink(source_link.into());
                return Err(self.fail_start(err));
            }
            (_, None) => {
                let err = SessionError::InvalidLink(target_link.into());
                return Err(self.fail_start(err));
            }
        };

        let text = match self.gateway.fetch(&source) {
            Ok(text) => text,
            Err(err) => return Err(self.fail_start(err.into())),
        };

        self.manuscript = Manuscript::parse(&text);
        self.target = Some(target);
        self.state = SessionState {
            phase: Phase::Running,
            paragraph_index: 0,
            word_index: 0,
            words_typed: 0,
            total_words: self.manuscript.total_words(),
            wpm_setting,
        };
        self.controls.publish(&self.state);

        tracing::info!(
            source = %source,
            paragraphs = self.manuscript.paragraph_count(),
            words = self.state.total_words,
            wpm_setting,
            "session started"
        );
        Ok(())
    }

    fn fail_start(&mut self, err: SessionError) -> SessionError {
        tracing::warn!(error = %err, "session failed to start");
        self.finish(Phase::Failed);
        err
    }

    /// Type the fetched document until it is exhausted or stopped.
    ///
    /// A gateway error ends the run in `Failed`. Text appended before the error
    /// stays in the target.
    pub fn run<O>(&mut self, observer: &mut O) -> Result<Outcome, SessionError>
    where
        O: SessionObserver + ?Sized,
    {
        if !self.state.running() {
            return Err(SessionError::NotRunning);
        }
        let Some(target) = self.target.clone() else {
            return Err(SessionError::NotRunning);
        };
        let manuscript = std::mem::take(&mut self.manuscript);

        observer.on_event(&SessionEvent::Started {
            total_words: self.state.total_words,
            wpm_setting: self.state.wpm_setting,
        });
        let started = self.clock.elapsed();

        let result = self.type_manuscript(&manuscript, &target, observer);
        let words_typed = self.state.words_typed;

        match result {
            Ok(Flow::Finished) => {
                let elapsed = self.clock.elapsed().saturating_sub(started);
                tracing::info!(words_typed, ?elapsed, "session completed");
                self.finish(Phase::Completed);
                observer.on_event(&SessionEvent::Completed {
                    words_typed,
                    elapsed,
                });
                Ok(Outcome::Completed {
                    words_typed,
                    elapsed,
                })
            }
            Ok(Flow::Stopped) => {
                tracing::info!(words_typed, "session stopped");
                self.finish(Phase::Stopped);
                observer.on_event(&SessionEvent::Stopped { words_typed });
                Ok(Outcome::Stopped { words_typed })
            }
            Err(err) => {
                tracing::warn!(words_typed, error = %err, "session failed");
                self.finish(Phase::Failed);
                observer.on_event(&SessionEvent::Failed {
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// [`start`](Self::start) followed by [`run`](Self::run).
    pub fn type_document<O>(
        &mut self,
        source_link: &str,
        target_link: &str,
        wpm_setting: u32,
        observer: &mut O,
    ) -> Result<Outcome, SessionError>
    where
        O: SessionObserver + ?Sized,
    {
        if let Err(err) = self.start(source_link, target_link, wpm_setting) {
            observer.on_event(&SessionEvent::Failed {
                message: err.to_string(),
            });
            return Err(err);
        }
        self.run(observer)
    }

    fn finish(&mut self, phase: Phase) {
        self.state.reset(phase);
        self.manuscript = Manuscript::default();
        self.target = None;
        self.controls.publish(&self.state);
    }

    fn type_manuscript<O>(
        &mut self,
        manuscript: &Manuscript,
        target: &DocumentId,
        observer: &mut O,
    ) -> Result<Flow, SessionError>
    where
        O: SessionObserver + ?Sized,
    {
        let paragraph_count = manuscript.paragraph_count();

        while self.state.paragraph_index < paragraph_count {
            let paragraph_index = self.state.paragraph_index;
            let words = manuscript.paragraph(paragraph_index).unwrap_or_default();

            while self.state.word_index < words.len() {
                if self.controls.is_stopped() {
                    return Ok(Flow::Stopped);
                }

                let mut batch: Vec<&str> = Vec::with_capacity(self.config.batch_size);
                while batch.len() < self.config.batch_size && self.state.word_index < words.len() {
                    if self.hold_while_paused(observer) == Wake::Stopped
                        || self.controls.is_stopped()
                    {
                        return Ok(Flow::Stopped);
                    }

                    let word = words[self.state.word_index].as_str();
                    if self.type_word(word, words.len(), &mut batch, observer) == Wake::Stopped {
                        return Ok(Flow::Stopped);
                    }
                }

                // Never send a batch that was being filled when stop arrived.
                if self.controls.is_stopped() {
                    return Ok(Flow::Stopped);
                }

                let text = format!("{} ", batch.join(" "));
                self.append(target, text, observer)?;
            }

            if paragraph_index + 1 < paragraph_count {
                if self.controls.is_stopped() {
                    return Ok(Flow::Stopped);
                }
                self.append(target, "\n".to_string(), observer)?;
            }

            self.state.paragraph_index += 1;
            self.state.word_index = 0;
            self.controls.publish(&self.state);
        }

        Ok(Flow::Finished)
    }

    fn hold_while_paused<O>(&mut self, observer: &mut O) -> Wake
    where
        O: SessionObserver + ?Sized,
    {
        if !self.controls.is_paused() {
            return Wake::Elapsed;
        }

        self.state.phase = Phase::Paused;
        self.controls.publish(&self.state);
        tracing::debug!(
            paragraph = self.state.paragraph_index,
            word = self.state.word_index,
            "paused"
        );
        observer.on_event(&SessionEvent::Paused {
            paragraph_index: self.state.paragraph_index,
            word_index: self.state.word_index,
        });

        let wake = self.controls.wait_while_paused();
        if wake == Wake::Resumed {
            self.state.phase = Phase::Running;
            self.controls.publish(&self.state);
            observer.on_event(&SessionEvent::Resumed);
        }
        wake
    }

    /// Type one word into `batch`, then wait out its delay.
    fn type_word<'w, O>(
        &mut self,
        word: &'w str,
        paragraph_len: usize,
        batch: &mut Vec<&'w str>,
        observer: &mut O,
    ) -> Wake
    where
        O: SessionObserver + ?Sized,
    {
        let typo = self.config.typo.maybe_typo(word, &mut self.rng);
        if typo.is_typo {
            observer.on_event(&SessionEvent::Typo {
                word: word.to_string(),
                typed: typo.display,
            });
            let pause = self.config.pace.correction_pause(&mut self.rng);
            if self.clock.sleep(pause, &self.controls) == Wake::Stopped {
                return Wake::Stopped;
            }
        }
        // The corrected word is what gets sent.
        batch.push(word);

        self.state.word_index += 1;
        self.state.words_typed += 1;
        self.controls.publish(&self.state);
        observer.on_event(&SessionEvent::Progress(self.progress(paragraph_len)));

        let delay = self.config.pace.next_delay(
            self.state.words_typed as u64,
            self.state.wpm_setting,
            &mut self.rng,
        );
        if let Delay::Break(pause) = delay {
            observer.on_event(&SessionEvent::Break { pause });
        }
        self.clock.sleep(delay.duration(), &self.controls)
    }

    fn append<O>(
        &mut self,
        target: &DocumentId,
        text: String,
        observer: &mut O,
    ) -> Result<(), SessionError>
    where
        O: SessionObserver + ?Sized,
    {
        tracing::debug!(doc = %target, len = text.len(), "append");
        self.gateway.append(target, &text)?;
        observer.on_event(&SessionEvent::Appended { text });
        Ok(())
    }

    fn progress(&self, paragraph_len: usize) -> Progress {
        let s = &self.state;
        Progress {
            paragraph_index: s.paragraph_index,
            word_index: s.word_index,
            words_typed: s.words_typed,
            total_words: s.total_words,
            fraction: fraction(s.words_typed, s.total_words),
            paragraph_fraction: fraction(s.word_index, paragraph_len),
        }
    }
}

fn fraction(done: usize, total: usize) -> f64 {
    if total == 0 {
        1.0
    } else {
        done as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::gateway::memory::MemoryGateway;
    use crate::trace::Silent;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn session(gw: MemoryGateway) -> TypingSession<MemoryGateway, ManualClock, StdRng> {
        TypingSession::new(
            gw,
            ManualClock::new(),
            StdRng::seed_from_u64(42),
            SessionConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn rejects_invalid_config() {
        let cfg = SessionConfig {
            batch_size: 0,
            ..Default::default()
        };
        let err = TypingSession::new(
            MemoryGateway::new(),
            ManualClock::new(),
            StdRng::seed_from_u64(1),
            cfg,
        )
        .err()
        .unwrap();
        assert!(matches!(err, SessionError::InvalidConfig(_)));
    }

    #[test]
    fn default_config_validates() {
        validate_config(&SessionConfig::default()).unwrap();
    }

    #[test]
    fn run_requires_start() {
        let mut s = session(MemoryGateway::new());
        assert!(matches!(s.run(&mut Silent), Err(SessionError::NotRunning)));
    }

    #[test]
    fn start_records_settings() {
        let gw = MemoryGateway::new()
            .with_document("src", "a b\nc")
            .with_document("dst", "");
        let mut s = session(gw);
        s.start("/d/src/", "/d/dst/", 120).unwrap();
        let st = s.state();
        assert_eq!(st.phase, Phase::Running);
        assert_eq!(st.total_words, 3);
        assert_eq!(st.wpm_setting, 120);
        assert_eq!(s.controls().snapshot(), *st);
        assert!(matches!(
            s.start("/d/src/", "/d/dst/", 120),
            Err(SessionError::AlreadyRunning)
        ));
    }

    #[test]
    fn empty_source_completes_without_appends() {
        let gw = MemoryGateway::new()
            .with_document("src", "")
            .with_document("dst", "");
        let mut s = session(gw);
        let outcome = s.type_document("/d/src/", "/d/dst/", 80, &mut Silent).unwrap();
        assert!(matches!(outcome, Outcome::Completed { words_typed: 0, .. }));
        assert!(s.gateway().appends().is_empty());
    }
}
