//! Loading the three participant logs.
//!
//! [`Traces`] is the parsed, immutable input every check works on.  This
//! module owns only file I/O and the hand-off to [`crate::parse`]; it never
//! interprets events.
//!
//! ```text
//!  send.log ──┐                       ┌─▶ Traces { sender, receiver, agent }
//!  recv.log ──┼─ tokio::join! ─ parse ┤
//!  agent.log ─┘                       └─▶ ParseFailures (no check runs)
//! ```

use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::event::{AgentEvent, ReceiverEvent, SenderEvent, Stream};
use crate::parse::{self, ParseFailure};
use crate::transfer::Transfer;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum TraceError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{} line(s) failed to parse", .0.count())]
    Parse(ParseFailures),
}

/// Every line that failed to parse, grouped by stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseFailures {
    pub sender: Vec<ParseFailure>,
    pub receiver: Vec<ParseFailure>,
    pub agent: Vec<ParseFailure>,
}

impl ParseFailures {
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    pub fn count(&self) -> usize {
        self.sender.len() + self.receiver.len() + self.agent.len()
    }

    /// Non-empty groups in stream order.
    pub fn by_stream(&self) -> impl Iterator<Item = (Stream, &[ParseFailure])> {
        [
            (Stream::Sender, self.sender.as_slice()),
            (Stream::Receiver, self.receiver.as_slice()),
            (Stream::Agent, self.agent.as_slice()),
        ]
        .into_iter()
        .filter(|(_, failures)| !failures.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Traces
// ---------------------------------------------------------------------------

/// Where the three logs live.
#[derive(Debug, Clone)]
pub struct TracePaths {
    pub sender: PathBuf,
    pub receiver: PathBuf,
    pub agent: PathBuf,
}

/// The three parsed logs of one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Traces {
    pub sender: Vec<SenderEvent>,
    pub receiver: Vec<ReceiverEvent>,
    pub agent: Vec<AgentEvent>,
}

impl Traces {
    /// Parse the three logs.  Any failure in any log rejects the whole set.
    pub fn parse(sender: &str, receiver: &str, agent: &str) -> Result<Self, ParseFailures> {
        let sender = parse::parse_sender(sender);
        let receiver = parse::parse_receiver(receiver);
        let agent = parse::parse_agent(agent);

        let failures = ParseFailures {
            sender: sender.failures,
            receiver: receiver.failures,
            agent: agent.failures,
        };
        if !failures.is_empty() {
            return Err(failures);
        }

        let traces = Self {
            sender: sender.events,
            receiver: receiver.events,
            agent: agent.events,
        };
        log::debug!(
            "parsed {} sender, {} receiver, {} agent event(s)",
            traces.sender.len(),
            traces.receiver.len(),
            traces.agent.len()
        );
        Ok(traces)
    }

    /// Read the three logs concurrently, then parse them.
    pub async fn load(paths: &TracePaths) -> Result<Self, TraceError> {
        let (sender, receiver, agent) = tokio::join!(
            read_text(&paths.sender),
            read_text(&paths.receiver),
            read_text(&paths.agent),
        );
        Self::parse(&sender?, &receiver?, &agent?).map_err(TraceError::Parse)
    }
}

/// Read the source and destination files of a transfer concurrently.
pub async fn load_transfer(
    source: &Path,
    destination: &Path,
    segment_size: u64,
) -> Result<Transfer, TraceError> {
    let (src, dst) = tokio::join!(read_bytes(source), read_bytes(destination));
    Ok(Transfer {
        source: src?,
        destination: dst?,
        segment_size,
    })
}

async fn read_text(path: &Path) -> Result<String, TraceError> {
    log::debug!("reading {}", path.display());
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| TraceError::Io {
            path: path.to_path_buf(),
            source,
        })
}

async fn read_bytes(path: &Path) -> Result<Vec<u8>, TraceError> {
    log::debug!("reading {}", path.display());
    tokio::fs::read(path).await.map_err(|source| TraceError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
