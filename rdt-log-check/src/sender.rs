//! Retransmission audit of the sender log.
//!
//! The sender marks every retransmission as `resnd`.  That gives two rules,
//! checked over the data lines in log order:
//! - a sequence number seen before must be marked as a resend;
//! - a sequence number never seen before must not be.
//!
//! Acks and timeouts play no part.  The FIN counts as one more sequence
//! number (with no numeric value).

use std::collections::HashMap;

use crate::diagnostic::Diagnostic;
use crate::event::{SenderEvent, Stream};

fn segment_label(seq_num: Option<u32>) -> String {
    match seq_num {
        Some(n) => format!("seq_num {n}"),
        None => "fin".to_owned(),
    }
}

/// Check that exactly the repeated transmissions are marked as resends.
pub fn check_sender_resend(log: &[SenderEvent]) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    // seq_num -> line of its first transmission
    let mut first_sent: HashMap<Option<u32>, usize> = HashMap::new();

    for (index, event) in log.iter().enumerate() {
        let line = index + 1;
        let (seq_num, is_resnd) = match event {
            SenderEvent::SendData {
                seq_num, is_resnd, ..
            } => (*seq_num, *is_resnd),
            SenderEvent::RecvAck { .. } | SenderEvent::Timeout { .. } => continue,
        };

        match (first_sent.get(&seq_num), is_resnd) {
            (Some(first), false) => diagnostics.push(Diagnostic::at_line(
                Stream::Sender,
                line,
                format!(
                    "{} appeared in line {first}, but this line is not resnd",
                    segment_label(seq_num)
                ),
            )),
            (None, true) => diagnostics.push(Diagnostic::at_line(
                Stream::Sender,
                line,
                format!(
                    "{} never appeared before but this line is resnd",
                    segment_label(seq_num)
                ),
            )),
            (Some(_), true) | (None, false) => {}
        }

        first_sent.entry(seq_num).or_insert(line);
    }

    log::debug!(
        "sender log: {} distinct segment(s), {} violation(s)",
        first_sent.len(),
        diagnostics.len()
    );
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marked_resend_passes() {
        let log = vec![
            SenderEvent::send_data(5, 1),
            SenderEvent::Timeout {
                threshold: 2,
                win_size: 1,
            },
            SenderEvent::resend_data(5, 1),
            SenderEvent::recv_ack(5, 5),
            SenderEvent::send_fin(),
            SenderEvent::recv_finack(),
        ];
        assert!(check_sender_resend(&log).is_empty());
    }

    #[test]
    fn swapped_marks_fail_both_lines() {
        let log = vec![SenderEvent::resend_data(5, 1), SenderEvent::send_data(5, 1)];
        let diags = check_sender_resend(&log);
        assert_eq!(diags.len(), 2);
        assert_eq!(
            diags[0].to_string(),
            "Line sender:1: seq_num 5 never appeared before but this line is resnd"
        );
        assert_eq!(
            diags[1].to_string(),
            "Line sender:2: seq_num 5 appeared in line 1, but this line is not resnd"
        );
    }

    #[test]
    fn first_occurrence_line_is_kept() {
        let log = vec![
            SenderEvent::recv_ack(0, 0),
            SenderEvent::send_data(3, 1),
            SenderEvent::resend_data(3, 1),
            SenderEvent::send_data(3, 1),
        ];
        let diags = check_sender_resend(&log);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("appeared in line 2"));
    }

    #[test]
    fn repeated_fin_must_be_marked() {
        let log = vec![SenderEvent::send_fin(), SenderEvent::send_fin()];
        let diags = check_sender_resend(&log);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.starts_with("fin appeared in line 1"));
    }

    #[test]
    fn distinct_numbers_are_independent() {
        let log: Vec<SenderEvent> = (1..=20).map(|seq| SenderEvent::send_data(seq, 4)).collect();
        assert!(check_sender_resend(&log).is_empty());
    }
}
