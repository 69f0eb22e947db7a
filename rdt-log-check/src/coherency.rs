//! Cross-log coherency.
//!
//! The agent sits between sender and receiver, so every segment shows up in
//! two logs.  Each [`Alignment`] filters both logs down to the events that
//! should correspond, pairs them by rank and compares a fixed set of fields:
//!
//! ```text
//!   sender              agent                       receiver
//!   SendData  ───────▶  GetData
//!                       FwdData | CorruptData ────▶ RecvData
//!                       CorruptData ──────────────▶ RecvData(dropped, "corrupted")
//!                       GetAck  ◀────────────────── SendAck
//!   RecvAck   ◀───────  FwdAck
//! ```
//!
//! Only the first mismatching pair of an alignment is reported; everything
//! after it is usually the same slip echoed down the log.  Pairing stops at
//! the shorter list, so a log that merely ends early is not a mismatch.

use serde::Serialize;

use crate::diagnostic::Diagnostic;
use crate::event::{AgentEvent, Event, Field, ReceiverEvent, SenderEvent};
use crate::trace::Traces;

const DATA_FIELDS: &[Field] = &[Field::SeqNum];
const ACK_FIELDS: &[Field] = &[Field::Ack, Field::Sack];

/// One pairing of two filtered logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    /// Every data segment the sender sends is picked up by the agent.
    SenderData,
    /// Every ack the agent forwards reaches the sender.
    SenderAck,
    /// Every ack the receiver sends is picked up by the agent.
    ReceiverAck,
    /// Every data segment the agent passes on (corrupted or not) reaches the
    /// receiver.
    ReceiverData,
    /// Every segment the agent corrupts is dropped as corrupted by the
    /// receiver.
    ReceiverCorruption,
}

impl Alignment {
    pub const ALL: [Alignment; 5] = [
        Alignment::SenderData,
        Alignment::SenderAck,
        Alignment::ReceiverAck,
        Alignment::ReceiverData,
        Alignment::ReceiverCorruption,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Alignment::SenderData => "Sender/Agent data segment coherency",
            Alignment::SenderAck => "Sender/Agent ack segment coherency",
            Alignment::ReceiverAck => "Receiver/Agent ack segment coherency",
            Alignment::ReceiverData => "Receiver/Agent data segment coherency",
            Alignment::ReceiverCorruption => "Receiver/Agent corruption coherency",
        }
    }

    /// The first mismatching pair of this alignment, if any.
    pub fn check(self, traces: &Traces) -> Option<Diagnostic> {
        let (sender, receiver, agent) = (&traces.sender, &traces.receiver, &traces.agent);
        match self {
            Alignment::SenderData => first_mismatch(
                self,
                &project(sender, is_send_data),
                &project(agent, is_get_data),
                DATA_FIELDS,
            ),
            Alignment::SenderAck => first_mismatch(
                self,
                &project(sender, is_recv_ack),
                &project(agent, is_fwd_ack),
                ACK_FIELDS,
            ),
            Alignment::ReceiverAck => first_mismatch(
                self,
                &project(receiver, is_send_ack),
                &project(agent, is_get_ack),
                ACK_FIELDS,
            ),
            Alignment::ReceiverData => first_mismatch(
                self,
                &project(receiver, is_recv_data),
                &project(agent, is_passed_on),
                DATA_FIELDS,
            ),
            Alignment::ReceiverCorruption => first_mismatch(
                self,
                &project(receiver, is_corruption_drop),
                &project(agent, is_corrupt_data),
                DATA_FIELDS,
            ),
        }
    }
}

/// Run every alignment; each contributes at most one diagnostic.
pub fn check_coherency(traces: &Traces) -> Vec<Diagnostic> {
    Alignment::ALL
        .iter()
        .filter_map(|alignment| alignment.check(traces))
        .collect()
}

/// Keep the events selected by `keep`, tagged with their 1-based line.
fn project<E>(log: &[E], keep: impl Fn(&E) -> bool) -> Vec<(usize, &E)> {
    log.iter()
        .enumerate()
        .map(|(index, event)| (index + 1, event))
        .filter(|&(_, event)| keep(event))
        .collect()
}

fn first_mismatch<A: Event, B: Event>(
    alignment: Alignment,
    left: &[(usize, &A)],
    right: &[(usize, &B)],
    fields: &[Field],
) -> Option<Diagnostic> {
    if left.len() != right.len() {
        log::debug!(
            "{}: {} {} vs {} {} event(s), pairing the first {}",
            alignment.title(),
            left.len(),
            A::STREAM,
            right.len(),
            B::STREAM,
            left.len().min(right.len())
        );
    }

    left.iter()
        .zip(right)
        .find(|((_, a), (_, b))| differs(*a, *b, fields))
        .map(|(&(left_line, a), &(right_line, b))| {
            Diagnostic::at_pair(
                (A::STREAM, left_line),
                (B::STREAM, right_line),
                format!("{}: first mismatch: {a} != {b}", alignment.title()),
            )
        })
}

fn differs<A: Event, B: Event>(a: &A, b: &B, fields: &[Field]) -> bool {
    fields.iter().any(|&f| a.field(f) != b.field(f))
}

// ---------------------------------------------------------------------------
// Event filters
// ---------------------------------------------------------------------------

fn is_send_data(event: &SenderEvent) -> bool {
    matches!(event, SenderEvent::SendData { .. })
}

fn is_recv_ack(event: &SenderEvent) -> bool {
    matches!(event, SenderEvent::RecvAck { .. })
}

fn is_send_ack(event: &ReceiverEvent) -> bool {
    matches!(event, ReceiverEvent::SendAck { .. })
}

fn is_recv_data(event: &ReceiverEvent) -> bool {
    matches!(event, ReceiverEvent::RecvData { .. })
}

/// A segment the receiver dropped because it arrived corrupted.
fn is_corruption_drop(event: &ReceiverEvent) -> bool {
    match event {
        ReceiverEvent::RecvData {
            is_dropped: true,
            comment: Some(comment),
            ..
        } => comment == "corrupted",
        _ => false,
    }
}

fn is_get_data(event: &AgentEvent) -> bool {
    matches!(event, AgentEvent::GetData { .. })
}

/// Forwarded to the receiver, intact or not.
fn is_passed_on(event: &AgentEvent) -> bool {
    matches!(
        event,
        AgentEvent::FwdData { .. } | AgentEvent::CorruptData { .. }
    )
}

fn is_corrupt_data(event: &AgentEvent) -> bool {
    matches!(event, AgentEvent::CorruptData { .. })
}

fn is_get_ack(event: &AgentEvent) -> bool {
    matches!(event, AgentEvent::GetAck { .. })
}

fn is_fwd_ack(event: &AgentEvent) -> bool {
    matches!(event, AgentEvent::FwdAck { .. })
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::Location;
    use crate::event::Stream;

    /// One segment, delivered on the first try, then the fin handshake.
    fn clean() -> Traces {
        Traces {
            sender: vec![
                SenderEvent::send_data(1, 1),
                SenderEvent::recv_ack(1, 1),
                SenderEvent::send_fin(),
                SenderEvent::recv_finack(),
            ],
            receiver: vec![
                ReceiverEvent::recv_data(1, "in order"),
                ReceiverEvent::send_ack(1, 1),
                ReceiverEvent::recv_fin(),
                ReceiverEvent::send_finack(),
                ReceiverEvent::Flush,
                ReceiverEvent::sha256(5, "00"),
                ReceiverEvent::finsha("00"),
            ],
            agent: vec![
                AgentEvent::get_data(1),
                AgentEvent::fwd_data(1),
                AgentEvent::get_ack(1, 1),
                AgentEvent::fwd_ack(1, 1),
                AgentEvent::get_fin(),
                AgentEvent::fwd_fin(),
                AgentEvent::get_finack(),
                AgentEvent::fwd_finack(),
            ],
        }
    }

    #[test]
    fn clean_run_is_coherent() {
        assert!(check_coherency(&clean()).is_empty());
    }

    #[test]
    fn corrupted_segment_is_coherent() {
        let mut traces = clean();
        traces.sender.splice(
            0..0,
            [SenderEvent::send_data(1, 1), SenderEvent::recv_ack(0, 0)],
        );
        traces.sender[2] = SenderEvent::resend_data(1, 1);
        traces.receiver.splice(
            0..0,
            [
                ReceiverEvent::drop_data(1, "corrupted"),
                ReceiverEvent::send_ack(0, 0),
            ],
        );
        traces.agent.splice(
            0..0,
            [
                AgentEvent::get_data(1),
                AgentEvent::corrupt_data(1),
                AgentEvent::get_ack(0, 0),
                AgentEvent::fwd_ack(0, 0),
            ],
        );
        assert!(check_coherency(&traces).is_empty());
    }

    #[test]
    fn renumbered_send_is_reported_once() {
        let mut traces = clean();
        traces.sender[0] = SenderEvent::send_data(2, 1);
        let diags = check_coherency(&traces);
        assert_eq!(diags.len(), 1);
        assert_eq!(
            diags[0].location,
            Some(Location::Pair {
                left: Stream::Sender,
                left_line: 1,
                right: Stream::Agent,
                right_line: 1,
            })
        );
        let message = &diags[0].message;
        assert!(message.starts_with("Sender/Agent data segment coherency"));
    }

    #[test]
    fn later_mismatch_points_at_both_lines() {
        // Ranks pair the nth send with the nth pickup, so the slip is reported
        // at line 2 of each log even though rank 1 agrees.
        let traces = Traces {
            sender: vec![SenderEvent::send_data(1, 1), SenderEvent::send_data(2, 2)],
            receiver: Vec::new(),
            agent: vec![AgentEvent::get_data(1), AgentEvent::get_data(3)],
        };
        let diags = check_coherency(&traces);
        assert_eq!(diags.len(), 1);
        assert_eq!(
            diags[0].location,
            Some(Location::Pair {
                left: Stream::Sender,
                left_line: 2,
                right: Stream::Agent,
                right_line: 2,
            })
        );
        assert!(diags[0].message.contains("!= GetData(seq_num=3"));
    }

    #[test]
    fn only_first_mismatch_is_reported() {
        let mut traces = clean();
        // Both receiver acks disagree with what the agent picked up.
        traces.receiver[1] = ReceiverEvent::send_ack(1, 2);
        traces.receiver[3] = ReceiverEvent::send_ack(5, 5);
        let diags = check_coherency(&traces);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.starts_with("Receiver/Agent ack"));
    }

    #[test]
    fn fin_against_number_mismatches() {
        let mut traces = clean();
        traces.agent[7] = AgentEvent::fwd_ack(1, 1);
        let diag = Alignment::SenderAck.check(&traces).unwrap();
        assert_eq!(
            diag.location,
            Some(Location::Pair {
                left: Stream::Sender,
                left_line: 4,
                right: Stream::Agent,
                right_line: 8,
            })
        );
    }

    #[test]
    fn shorter_log_is_not_a_mismatch() {
        let mut traces = clean();
        // The receiver never logs the fin: under-delivery goes unnoticed by
        // the rank pairing.
        traces.receiver.drain(2..4);
        assert!(Alignment::ReceiverData.check(&traces).is_none());
        assert!(Alignment::ReceiverAck.check(&traces).is_none());
    }

    #[test]
    fn corruption_needs_the_corrupted_comment() {
        let mut traces = clean();
        traces.agent[1] = AgentEvent::corrupt_data(1);
        traces.receiver[0] = ReceiverEvent::drop_data(1, "buffer overflow");
        assert!(Alignment::ReceiverCorruption.check(&traces).is_none());

        let stray = ReceiverEvent::drop_data(9, "corrupted");
        traces.receiver.insert(0, stray);
        let diag = Alignment::ReceiverCorruption.check(&traces).unwrap();
        assert!(diag.message.contains("RecvData(seq_num=9"));
    }

    #[test]
    fn alignments_are_independent() {
        let mut traces = clean();
        traces.sender[0] = SenderEvent::send_data(7, 1);
        traces.receiver[1] = ReceiverEvent::send_ack(7, 7);
        let diags = check_coherency(&traces);
        assert_eq!(diags.len(), 2);
    }
}
