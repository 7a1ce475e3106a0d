use std::time::Duration;

use crate::estimate::format_duration;
use crate::model::Progress;

/// Everything a control surface may want to show about a run.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Started {
        total_words: usize,
        wpm_setting: u32,
    },
    Typo {
        word: String,
        typed: String,
    },
    Break {
        pause: Duration,
    },
    Progress(Progress),
    Appended {
        text: String,
    },
    Paused {
        paragraph_index: usize,
        word_index: usize,
    },
    Resumed,
    Stopped {
        words_typed: usize,
    },
    Completed {
        words_typed: usize,
        elapsed: Duration,
    },
    Failed {
        message: String,
    },
}

pub trait SessionObserver {
    fn on_event(&mut self, event: &SessionEvent);
}

impl<F: FnMut(&SessionEvent)> SessionObserver for F {
    fn on_event(&mut self, event: &SessionEvent) {
        self(event)
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl SessionObserver for Silent {
    fn on_event(&mut self, _event: &SessionEvent) {}
}

fn escape_for_log(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}

/// Status line for an event, or `None` for events that are not worth a line.
pub fn event_line(event: &SessionEvent) -> Option<String> {
    let line = match event {
        SessionEvent::Started {
            total_words,
            wpm_setting,
        } => format!("Typing {total_words} words at ~{wpm_setting} WPM..."),
        SessionEvent::Typo { word, typed } => format!(
            "Typo \"{}\" as \"{}\", correcting...",
            escape_for_log(word),
            escape_for_log(typed)
        ),
        SessionEvent::Break { pause } => {
            format!("Break: taking a short break ({:.1}s)...", pause.as_secs_f64())
        }
        SessionEvent::Paused { .. } => "Paused. Resume to continue typing.".to_string(),
        SessionEvent::Resumed => "Resumed.".to_string(),
        SessionEvent::Stopped { words_typed } => {
            format!("Stopped after {words_typed} words.")
        }
        SessionEvent::Completed {
            words_typed,
            elapsed,
        } => format!(
            "Done typing {words_typed} words in {}.",
            format_duration(elapsed.as_secs())
        ),
        SessionEvent::Failed { message } => format!("Error: {message}"),
        SessionEvent::Progress(_) | SessionEvent::Appended { .. } => return None,
    };
    Some(line)
}

fn print_trace_line(line: &str) {
    const RESET: &str = "\x1b[0m";
    const TYPING: &str = "\x1b[34m";
    const TYPO: &str = "\x1b[33m";
    const ERROR: &str = "\x1b[31m";

    if let Some(rest) = line.strip_prefix("Typing") {
        eprintln!("{TYPING}Typing{RESET}{rest}");
    } else if let Some(rest) = line.strip_prefix("Typo") {
        eprintln!("{TYPO}Typo{RESET}{rest}");
    } else if let Some(rest) = line.strip_prefix("Error") {
        eprintln!("{ERROR}Error{RESET}{rest}");
    } else {
        eprintln!("{line}");
    }
}

/// Prints status lines and whole-percent progress to stderr.
#[derive(Debug, Default)]
pub struct ConsoleTrace {
    last_percent: Option<u32>,
}

impl ConsoleTrace {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionObserver for ConsoleTrace {
    fn on_event(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::Progress(p) => {
                let percent = (p.fraction * 100.0).floor() as u32;
                if self.last_percent != Some(percent) {
                    self.last_percent = Some(percent);
                    eprintln!("Progress {percent}% ({}/{} words)", p.words_typed, p.total_words);
                }
            }
            SessionEvent::Completed { .. } => {
                if let Some(line) = event_line(event) {
                    print_trace_line(&line);
                }
                // Terminal bell as the completion notification.
                eprint!("\x07");
            }
            _ => {
                if let Some(line) = event_line(event) {
                    print_trace_line(&line);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typo_line_shows_both_forms() {
        let line = event_line(&SessionEvent::Typo {
            word: "hello".into(),
            typed: "hwllo".into(),
        });
        assert_eq!(
            line.as_deref(),
            Some("Typo \"hello\" as \"hwllo\", correcting...")
        );
    }

    #[test]
    fn completion_line_formats_elapsed() {
        let line = event_line(&SessionEvent::Completed {
            words_typed: 12,
            elapsed: Duration::from_secs(75),
        });
        assert_eq!(line.as_deref(), Some("Done typing 12 words in 1 min 15 sec."));
    }

    #[test]
    fn progress_and_appends_have_no_line() {
        assert_eq!(
            event_line(&SessionEvent::Appended {
                text: "a b c ".into()
            }),
            None
        );
    }

    #[test]
    fn closures_observe_events() {
        let mut seen = Vec::new();
        {
            let mut observer = |e: &SessionEvent| seen.push(e.clone());
            observer.on_event(&SessionEvent::Resumed);
        }
        assert_eq!(seen, vec![SessionEvent::Resumed]);
    }
}
