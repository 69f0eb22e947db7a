//! Local grammar of the agent log.
//!
//! The agent reports everything it handles as a pair of lines:
//!
//! ```text
//!  get data #N ──▶ fwd data #N | corrupt data #N | drop data #N
//!  get ack  #A ──▶ fwd ack  #A          (acks are forwarded verbatim)
//! ```
//!
//! and its last line is the forwarded FINACK.  [`check_agent_format`] walks
//! the log once, two lines at a time where a pair is expected, and reports
//! every place the log leaves this grammar instead of stopping at the first.

use crate::diagnostic::Diagnostic;
use crate::event::{render_window, AgentEvent, AgentKind, Field, FieldValue, Stream};
use crate::pattern::{self, Pattern};

/// What the agent may do with a data segment it picked up.
const DISPOSITIONS: [AgentKind; 3] = [
    AgentKind::FwdData,
    AgentKind::CorruptData,
    AgentKind::DropData,
];

/// Check the agent log against its pairwise grammar.
pub fn check_agent_format(log: &[AgentEvent]) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let mut i = 0;

    while i < log.len() {
        let window = &log[i..log.len().min(i + 2)];

        match &log[i] {
            AgentEvent::GetData { seq_num, .. } => {
                let seq = FieldValue::from(*seq_num);
                let get = Pattern::new(AgentKind::GetData).with(Field::SeqNum, seq.clone());
                let handled = DISPOSITIONS.iter().any(|&disposition| {
                    let expected = [
                        get.clone(),
                        Pattern::new(disposition).with(Field::SeqNum, seq.clone()),
                    ];
                    pattern::matches(window, &expected)
                });
                if !handled {
                    diagnostics.push(Diagnostic::at_span(
                        Stream::Agent,
                        i + 1,
                        i + window.len(),
                        format!(
                            "Expected [GetData(seq_num={seq}), Fwd|Corrupt|DropData(seq_num={seq})], \
                             but got {} instead",
                            render_window(window)
                        ),
                    ));
                }
                i += 2;
            }

            get_ack @ AgentEvent::GetAck { .. } => {
                let expected = [
                    Pattern::exact(AgentKind::GetAck, get_ack),
                    Pattern::exact(AgentKind::FwdAck, get_ack),
                ];
                if !pattern::matches(window, &expected) {
                    let differing = match window.get(1) {
                        Some(fwd) => expected[1]
                            .mismatched_fields(fwd)
                            .iter()
                            .map(|field| field.name())
                            .collect::<Vec<_>>()
                            .join(", "),
                        None => "missing".to_owned(),
                    };
                    diagnostics.push(Diagnostic::at_span(
                        Stream::Agent,
                        i + 1,
                        i + window.len(),
                        format!(
                            "Mismatch: {} should match {} ({differing})",
                            render_window(window),
                            pattern::render(&expected)
                        ),
                    ));
                }
                i += 2;
            }

            unexpected @ (AgentEvent::FwdData { .. }
            | AgentEvent::CorruptData { .. }
            | AgentEvent::DropData { .. }
            | AgentEvent::FwdAck { .. }) => {
                diagnostics.push(Diagnostic::at_line(
                    Stream::Agent,
                    i + 1,
                    format!("Unexpected {unexpected}"),
                ));
                i += 1;
            }
        }
    }

    let last = &log[log.len().saturating_sub(1)..];
    let fin_ack = [Pattern::new(AgentKind::FwdAck).with(Field::IsFin, true)];
    if !pattern::matches(last, &fin_ack) {
        diagnostics.push(Diagnostic::for_stream(
            Stream::Agent,
            "Expected fwd finack as last line",
        ));
    }

    log::debug!(
        "agent log: {} event(s), {} violation(s)",
        log.len(),
        diagnostics.len()
    );
    diagnostics
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
