//! Running a battery of checks.
//!
//! Every [`Check`] is a pure function of the traces (and, for transfer
//! checks, of the two files) into its own list of diagnostics.  A failing
//! check never stops the next one from running.

use serde::Serialize;

use crate::diagnostic::Diagnostic;
use crate::trace::Traces;
use crate::transfer::{self, Transfer};
use crate::{agent, coherency, receiver, sender};

/// One named check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum Check {
    AgentFormat,
    ReceiverFormat,
    SenderResend,
    Coherency,
    SegmentCount,
    OutputFile,
    OutputDigest,
}

impl Check {
    /// Checks that need only the three logs.
    pub const TRACE: [Check; 4] = [
        Check::AgentFormat,
        Check::ReceiverFormat,
        Check::SenderResend,
        Check::Coherency,
    ];

    /// Checks that also need the source and destination files.
    pub const TRANSFER: [Check; 3] = [Check::SegmentCount, Check::OutputFile, Check::OutputDigest];

    pub fn name(self) -> &'static str {
        match self {
            Check::AgentFormat => "agent_format",
            Check::ReceiverFormat => "receiver_format",
            Check::SenderResend => "sender_resend",
            Check::Coherency => "coherency",
            Check::SegmentCount => "segment_count",
            Check::OutputFile => "output_file",
            Check::OutputDigest => "output_digest",
        }
    }

    pub fn needs_transfer(self) -> bool {
        Self::TRANSFER.contains(&self)
    }

    /// Run this check.  A transfer check without a transfer reports that as
    /// its only diagnostic.
    pub fn run(self, traces: &Traces, transfer: Option<&Transfer>) -> Vec<Diagnostic> {
        match (self, transfer) {
            (Check::AgentFormat, _) => agent::check_agent_format(&traces.agent),
            (Check::ReceiverFormat, _) => receiver::check_receiver_format(&traces.receiver),
            (Check::SenderResend, _) => sender::check_sender_resend(&traces.sender),
            (Check::Coherency, _) => coherency::check_coherency(traces),
            (Check::SegmentCount, Some(t)) => transfer::check_segment_count(&traces.sender, t),
            (Check::OutputFile, Some(t)) => transfer::check_output_file(t),
            (Check::OutputDigest, Some(t)) => transfer::check_output_digest(&traces.receiver, t),
            (Check::SegmentCount | Check::OutputFile | Check::OutputDigest, None) => {
                vec![Diagnostic::general(
                    "needs the source and destination files",
                )]
            }
        }
    }

    /// The checks run when none are selected explicitly.
    pub fn default_battery(with_transfer: bool) -> Vec<Check> {
        let mut checks = Self::TRACE.to_vec();
        if with_transfer {
            checks.extend(Self::TRANSFER);
        }
        checks
    }
}

impl std::fmt::Display for Check {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Result of one check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckOutcome {
    pub check: Check,
    pub passed: bool,
    pub diagnostics: Vec<Diagnostic>,
}

/// Results of a whole battery, in run order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub outcomes: Vec<CheckOutcome>,
}

impl Report {
    pub fn passed(&self) -> bool {
        self.outcomes.iter().all(|outcome| outcome.passed)
    }

    pub fn failed_checks(&self) -> impl Iterator<Item = Check> + '_ {
        self.outcomes
            .iter()
            .filter(|outcome| !outcome.passed)
            .map(|outcome| outcome.check)
    }
}

/// Run `checks` in order, each with a fresh diagnostic list.
pub fn run_battery(checks: &[Check], traces: &Traces, transfer: Option<&Transfer>) -> Report {
    let outcomes = checks
        .iter()
        .map(|&check| {
            let diagnostics = check.run(traces, transfer);
            log::info!("{check}: {} diagnostic(s)", diagnostics.len());
            CheckOutcome {
                check,
                passed: diagnostics.is_empty(),
                diagnostics,
            }
        })
        .collect();
    Report { outcomes }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
