use rand::rngs::StdRng;
use rand::SeedableRng;

use typist::clock::ManualClock;
use typist::gateway::memory::MemoryGateway;
use typist::session::{SessionConfig, TypingSession};
use typist::trace::{event_line, SessionEvent};

fn trace_lines(source_text: &str, cfg: SessionConfig) -> Vec<String> {
    let gw = MemoryGateway::new()
        .with_document("src", source_text)
        .with_document("dst", "");
    let mut session =
        TypingSession::new(gw, ManualClock::new(), StdRng::seed_from_u64(3), cfg).unwrap();

    let mut lines = Vec::new();
    let mut observer = |e: &SessionEvent| lines.extend(event_line(e));
    session
        .type_document("/d/src/", "/d/dst/", 90, &mut observer)
        .unwrap();
    lines
}

#[test]
fn run_starts_with_typing_line_and_ends_with_done() {
    let mut cfg = SessionConfig::default();
    cfg.typo.rate = 0.0;
    let lines = trace_lines("hello there\ngeneral kenobi", cfg);

    assert_eq!(
        lines.first().map(String::as_str),
        Some("Typing 4 words at ~90 WPM...")
    );
    let last = lines.last().expect("expected a completion line");
    assert!(last.starts_with("Done typing 4 words in 0 min "), "{last}");
    assert_eq!(lines.len(), 2);
}

#[test]
fn typos_are_logged_before_completion() {
    let mut cfg = SessionConfig::default();
    cfg.typo.rate = 1.0;
    let lines = trace_lines("keyboard", cfg);

    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("Typo \"keyboard\" as \""), "{}", lines[1]);
    assert!(lines[1].ends_with("\", correcting..."));
}

#[test]
fn failed_start_is_reported() {
    let mut session = TypingSession::new(
        MemoryGateway::new(),
        ManualClock::new(),
        StdRng::seed_from_u64(3),
        SessionConfig::default(),
    )
    .unwrap();

    let mut lines = Vec::new();
    let mut observer = |e: &SessionEvent| lines.extend(event_line(e));
    assert!(session
        .type_document("bad", "/d/dst/", 90, &mut observer)
        .is_err());
    assert_eq!(lines, vec!["Error: invalid document link: \"bad\"".to_string()]);
}
