use std::io::{self, BufRead};
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use typist::clock::{Clock, ManualClock, SystemClock};
use typist::control::Controls;
use typist::document::{count_words, extract_doc_id};
use typist::estimate::{
    estimate_time, estimate_wpm, format_duration, CompletionWindow, WpmEstimate, DEFAULT_WPM,
};
use typist::gateway::{open_gateway, DocumentGateway, GatewayBackend};
use typist::model::Outcome;
use typist::session::{SessionConfig, TypingSession};
use typist::trace::{ConsoleTrace, SessionObserver, Silent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BackendArg {
    Files,
    Google,
}

impl BackendArg {
    fn to_library(self) -> GatewayBackend {
        match self {
            BackendArg::Files => GatewayBackend::Files,
            BackendArg::Google => GatewayBackend::Google,
        }
    }
}

#[derive(Debug, Args, Clone)]
struct GatewayArgs {
    /// Where documents live.
    ///
    /// - files: `<id>.txt` under --docs-dir
    /// - google: Google Docs API, token from GOOGLE_DOCS_TOKEN (needs `--features gdocs`)
    #[arg(long, value_enum, default_value_t = BackendArg::Files)]
    backend: BackendArg,

    /// Directory holding documents for the files backend.
    #[arg(long, value_name = "DIR")]
    docs_dir: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
#[group(multiple = false)]
struct SpeedArgs {
    /// Typing speed setting in words per minute.
    #[arg(long)]
    wpm: Option<u32>,

    /// Desired completion time in seconds; converted to a WPM setting.
    #[arg(long, value_name = "SECS")]
    target_time: Option<u64>,
}

#[derive(Debug, Parser)]
#[command(name = "typist")]
#[command(about = "Types one document into another at a human pace", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show how long typing a source document would take
    Estimate {
        /// Source document link (must contain /d/<id>/)
        #[arg(long, value_name = "LINK")]
        source: String,

        #[command(flatten)]
        speed: SpeedArgs,

        #[command(flatten)]
        gateway: GatewayArgs,

        /// Print the estimate as JSON
        #[arg(long)]
        json: bool,
    },

    /// Type the source document into the target document
    ///
    /// While running, type `pause`, `resume` or `stop` (or p/r/s) and Enter.
    Run {
        /// Source document link (read from)
        #[arg(long, value_name = "LINK")]
        source: String,

        /// Target document link (typed into)
        #[arg(long, value_name = "LINK")]
        target: String,

        #[command(flatten)]
        speed: SpeedArgs,

        #[command(flatten)]
        gateway: GatewayArgs,

        /// Optional RNG seed (for debugging)
        #[arg(long)]
        seed: Option<u64>,

        /// Skip real delays; text is still appended to the target
        #[arg(long)]
        dry_run: bool,

        /// Disable console status output
        #[arg(long)]
        no_trace: bool,
    },
}

#[derive(Debug, Serialize)]
struct EstimateReport {
    total_words: usize,
    window: CompletionWindow,
    wpm: WpmEstimate,
    estimated_secs: u64,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn source_word_count(gateway: &mut dyn DocumentGateway, source: &str) -> Result<usize> {
    let id = extract_doc_id(source)
        .ok_or_else(|| anyhow!("invalid source document link: {source:?}"))?;
    let text = gateway
        .fetch(&id)
        .with_context(|| format!("failed to read source document {id}"))?;
    Ok(count_words(&text))
}

/// Pick the WPM setting: an explicit speed wins, otherwise a target time is
/// clamped to the completion window and inverted.
fn resolve_speed(speed: &SpeedArgs, total_words: usize) -> (WpmEstimate, u64) {
    let window = CompletionWindow::for_words(total_words);

    if let Some(wpm) = speed.wpm {
        let secs = estimate_time(f64::from(wpm.max(1)), total_words) as u64;
        return (
            WpmEstimate {
                wpm,
                converged: true,
            },
            secs,
        );
    }

    let secs = window.clamp(speed.target_time.unwrap_or(window.default_secs));
    if total_words == 0 {
        return (
            WpmEstimate {
                wpm: DEFAULT_WPM,
                converged: true,
            },
            secs,
        );
    }
    (estimate_wpm(secs as f64, total_words), secs)
}

fn spawn_control_reader(controls: Controls) {
    std::thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            match line.trim() {
                "p" | "pause" => controls.pause(),
                "r" | "resume" | "c" | "continue" => controls.resume(),
                "s" | "stop" => {
                    controls.stop();
                    break;
                }
                "" => {}
                other => eprintln!("Unknown command {other:?} (pause, resume, stop)"),
            }
        }
    });
}

fn run_session<C: Clock>(
    gateway: Box<dyn DocumentGateway>,
    clock: C,
    seed: Option<u64>,
    links: (&str, &str),
    wpm: u32,
    observer: &mut dyn SessionObserver,
) -> Result<Outcome> {
    let mut session = TypingSession::new(
        gateway,
        clock,
        rng_from_seed(seed),
        SessionConfig::default(),
    )?;

    let controls = session.controls();
    {
        let controls = controls.clone();
        ctrlc::set_handler(move || controls.stop())
            .context("failed to install Ctrl+C handler")?;
    }
    spawn_control_reader(controls);

    let (source, target) = links;
    let outcome = session.type_document(source, target, wpm, observer)?;
    Ok(outcome)
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Estimate {
            source,
            speed,
            gateway,
            json,
        } => {
            let mut gw = open_gateway(gateway.backend.to_library(), gateway.docs_dir.as_deref())?;
            let total_words = source_word_count(&mut *gw, &source)?;
            let (wpm, estimated_secs) = resolve_speed(&speed, total_words);

            let report = EstimateReport {
                total_words,
                window: CompletionWindow::for_words(total_words),
                wpm,
                estimated_secs,
            };

            if json {
                let out = serde_json::to_string_pretty(&report)
                    .context("failed to serialize estimate")?;
                println!("{out}");
            } else {
                println!("Words: {}", report.total_words);
                println!(
                    "Completion time range: {} to {}",
                    format_duration(report.window.min_secs),
                    format_duration(report.window.max_secs)
                );
                println!(
                    "Estimated completion time: {}",
                    format_duration(report.estimated_secs)
                );
                println!("Calculated WPM: {}", report.wpm.wpm);
                if !report.wpm.converged {
                    eprintln!("Target time is outside the reachable range; using nearest speed.");
                }
            }
        }
        Command::Run {
            source,
            target,
            speed,
            gateway,
            seed,
            dry_run,
            no_trace,
        } => {
            let mut gw = open_gateway(gateway.backend.to_library(), gateway.docs_dir.as_deref())?;

            let wpm = match speed.wpm {
                Some(wpm) => wpm,
                None => {
                    let total_words = source_word_count(&mut *gw, &source)?;
                    let (wpm, secs) = resolve_speed(&speed, total_words);
                    eprintln!(
                        "Estimated completion time: {} ({} WPM)",
                        format_duration(secs),
                        wpm.wpm
                    );
                    wpm.wpm
                }
            };

            let mut console = ConsoleTrace::new();
            let mut silent = Silent;
            let observer: &mut dyn SessionObserver = if no_trace {
                &mut silent
            } else {
                &mut console
            };

            let links = (source.as_str(), target.as_str());
            let outcome = if dry_run {
                run_session(gw, ManualClock::new(), seed, links, wpm, observer)?
            } else {
                eprintln!("Commands: pause, resume, stop (Enter after each).");
                run_session(gw, SystemClock::new(), seed, links, wpm, observer)?
            };

            // The console trace already reports the stop.
            match outcome {
                Outcome::Stopped { words_typed } if no_trace => {
                    eprintln!("Typing stopped after {words_typed} words.");
                }
                _ => {}
            }
        }
    }

    Ok(())
}
