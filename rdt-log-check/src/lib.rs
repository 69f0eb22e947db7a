//! `rdt-log-check`: cross-checks the logs of a reliable transfer over a
//! lossy link.
//!
//! # Architecture
//!
//! ```text
//!  ┌────────┐  data   ┌────────┐  data   ┌──────────┐
//!  │ Sender │────────▶│ Agent  │────────▶│ Receiver │
//!  │        │◀────────│(lossy) │◀────────│          │
//!  └───┬────┘  acks   └───┬────┘  acks   └────┬─────┘
//!      │ send.log         │ agent.log         │ recv.log
//!  ┌───▼──────────────────▼───────────────────▼────┐
//!  │   trace: read + parse into typed events       │
//!  └───────────────────────┬───────────────────────┘
//!  ┌───────────────────────▼───────────────────────┐
//!  │   harness: run each check, collect diagnostics│
//!  └───────────────────────┬───────────────────────┘
//!                      report (text / JSON)
//! ```
//!
//! Each module has a single responsibility:
//! - [`event`]: typed log lines of the three participants
//! - [`parse`]: text lines → events
//! - [`pattern`]: structural matching of event windows
//! - [`diagnostic`]: located violation messages
//! - [`agent`]: local grammar of the agent log
//! - [`receiver`]: local grammar of the receiver log
//! - [`sender`]: retransmission marking in the sender log
//! - [`coherency`]: field agreement between pairs of logs
//! - [`transfer`]: source/destination file checks
//! - [`trace`]: async loading of logs and files
//! - [`harness`]: named checks and batteries
//! - [`report`]: text rendering of results
//! - [`config`]: run-time options

pub mod agent;
pub mod coherency;
pub mod config;
pub mod diagnostic;
pub mod event;
pub mod harness;
pub mod parse;
pub mod pattern;
pub mod receiver;
pub mod report;
pub mod sender;
pub mod trace;
pub mod transfer;

pub use diagnostic::{Diagnostic, Location};
pub use event::{AgentEvent, Event, Field, FieldValue, ReceiverEvent, SenderEvent, Stream};
pub use harness::{run_battery, Check, CheckOutcome, Report};
pub use trace::{ParseFailures, TraceError, TracePaths, Traces};
pub use transfer::Transfer;
