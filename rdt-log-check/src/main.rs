//! Entry point for `rdt-log-check`.
//!
//! Reads the three logs (and optionally the transferred files), runs the
//! selected checks and prints the results.  All checking is delegated to
//! library modules; `main.rs` owns only process setup and output.

use std::path::PathBuf;
use std::process;

use anyhow::{bail, Context};
use clap::Parser;

use rdt_log_check::config::{ColorChoice, OutputFormat, DEFAULT_SEGMENT_SIZE};
use rdt_log_check::report::{Painter, ParseFailureReport, TextReport};
use rdt_log_check::trace::{self, TraceError, TracePaths, Traces};
use rdt_log_check::{run_battery, Check};

/// Cross-check sender, receiver and agent logs of a reliable transfer.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Sender log.
    send_log: PathBuf,
    /// Receiver log.
    recv_log: PathBuf,
    /// Agent log.
    agent_log: PathBuf,
    /// File the sender transmitted.
    #[arg(requires = "dst_file")]
    src_file: Option<PathBuf>,
    /// File the receiver wrote.
    dst_file: Option<PathBuf>,

    /// Run only these checks (repeatable).  Defaults to every check the
    /// given inputs allow.
    #[arg(short, long = "check", value_enum)]
    checks: Vec<Check>,

    /// Bytes per data segment.
    #[arg(long, default_value_t = DEFAULT_SEGMENT_SIZE, value_parser = clap::value_parser!(u64).range(1..))]
    segment_size: u64,

    #[arg(long, value_enum, default_value_t = ColorChoice::Auto)]
    color: ColorChoice,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise env_logger; set RUST_LOG to control verbosity.
    env_logger::init();

    let cli = Cli::parse();
    let painter = Painter::new(cli.format == OutputFormat::Text && cli.color.enabled());

    let files = cli.src_file.as_deref().zip(cli.dst_file.as_deref());
    let mut checks = if cli.checks.is_empty() {
        Check::default_battery(files.is_some())
    } else {
        cli.checks.clone()
    };
    let mut seen = Vec::with_capacity(checks.len());
    checks.retain(|check| {
        let first = !seen.contains(check);
        seen.push(*check);
        first
    });
    if files.is_none() {
        if cli.segment_size != DEFAULT_SEGMENT_SIZE {
            log::warn!("--segment-size has no effect without <SRC_FILE> and <DST_FILE>");
        }
        if let Some(check) = checks.iter().find(|check| check.needs_transfer()) {
            bail!("check {check} needs <SRC_FILE> and <DST_FILE>");
        }
    }

    let paths = TracePaths {
        sender: cli.send_log.clone(),
        receiver: cli.recv_log.clone(),
        agent: cli.agent_log.clone(),
    };
    let traces = match Traces::load(&paths).await {
        Ok(traces) => traces,
        Err(TraceError::Parse(failures)) => {
            match cli.format {
                OutputFormat::Text => print!(
                    "{}",
                    ParseFailureReport {
                        failures: &failures,
                        painter,
                    }
                ),
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "parse_failures": failures
                    }))?
                ),
            }
            process::exit(1);
        }
        Err(err) => return Err(err).context("failed to load logs"),
    };

    let transfer = match files {
        Some((src, dst)) => Some(
            trace::load_transfer(src, dst, cli.segment_size)
                .await
                .context("failed to load transferred files")?,
        ),
        None => None,
    };

    log::info!("running {} check(s)", checks.len());
    let report = run_battery(&checks, &traces, transfer.as_ref());

    match cli.format {
        OutputFormat::Text => print!(
            "{}",
            TextReport {
                report: &report,
                painter,
            }
        ),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    if !report.passed() {
        process::exit(1);
    }
    Ok(())
}
