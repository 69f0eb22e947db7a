//! File-level checks on a completed transfer.
//!
//! These need the source file the sender read and the destination file the
//! receiver wrote, which the logs alone cannot supply.

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

use crate::diagnostic::Diagnostic;
use crate::event::{ReceiverEvent, SenderEvent, Stream};

/// The two ends of a transfer plus the segment size the sender used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub source: Vec<u8>,
    pub destination: Vec<u8>,
    pub segment_size: u64,
}

impl Transfer {
    /// Number of data segments the source file splits into.  An empty file
    /// has none; only the fin is sent.
    pub fn expected_segments(&self) -> u64 {
        let size = self.segment_size.max(1);
        (self.source.len() as u64).div_ceil(size)
    }
}

/// The first `offset` bytes of `output`, if it has that many.
fn leading_bytes(output: &[u8], offset: u64) -> Option<&[u8]> {
    usize::try_from(offset)
        .ok()
        .and_then(|end| output.get(..end))
}

/// Lowercase hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

// ---------------------------------------------------------------------------
// Checks
// ---------------------------------------------------------------------------

/// The sender must transmit every segment of the source file, and nothing
/// beyond it.
pub fn check_segment_count(sender: &[SenderEvent], transfer: &Transfer) -> Vec<Diagnostic> {
    let expected = transfer.expected_segments();
    // seq_num -> first line it was sent on
    let mut seen: BTreeMap<u32, usize> = BTreeMap::new();
    for (index, event) in sender.iter().enumerate() {
        match event {
            SenderEvent::SendData { seq_num, .. } => {
                if let Some(seq) = seq_num {
                    seen.entry(*seq).or_insert(index + 1);
                }
            }
            SenderEvent::RecvAck { .. } | SenderEvent::Timeout { .. } => {}
        }
    }

    let mut diagnostics: Vec<Diagnostic> = seen
        .iter()
        .filter(|&(&seq, _)| seq == 0 || u64::from(seq) > expected)
        .map(|(&seq, &line)| {
            Diagnostic::at_line(
                Stream::Sender,
                line,
                format!("seq_num {seq} is outside the file's {expected} segment(s)"),
            )
        })
        .collect();

    let sent = seen.len() as u64;
    if sent != expected {
        diagnostics.push(Diagnostic::for_stream(
            Stream::Sender,
            format!(
                "sent {sent} distinct segment(s), expected {expected} ({} bytes / {} per segment)",
                transfer.source.len(),
                transfer.segment_size
            ),
        ));
    }
    diagnostics
}

/// The destination file must be a byte-exact copy of the source.
pub fn check_output_file(transfer: &Transfer) -> Vec<Diagnostic> {
    let (src, dst) = (&transfer.source, &transfer.destination);
    if src == dst {
        return Vec::new();
    }
    let offset = src
        .iter()
        .zip(dst.iter())
        .position(|(a, b)| a != b)
        .unwrap_or_else(|| src.len().min(dst.len()));
    vec![Diagnostic::general(format!(
        "output file differs from source at byte {offset} (source {} bytes, output {} bytes)",
        src.len(),
        dst.len()
    ))]
}

/// Every digest the receiver printed must match the destination file.
pub fn check_output_digest(receiver: &[ReceiverEvent], transfer: &Transfer) -> Vec<Diagnostic> {
    let output = &transfer.destination;
    let mut diagnostics = Vec::new();
    let mut saw_finsha = false;

    for (index, event) in receiver.iter().enumerate() {
        let line = index + 1;
        match event {
            ReceiverEvent::Sha256 { offset, digest } => {
                let Some(prefix) = leading_bytes(output, *offset) else {
                    diagnostics.push(Diagnostic::at_line(
                        Stream::Receiver,
                        line,
                        format!(
                            "sha256 offset {offset} is past the end of the output ({} bytes)",
                            output.len()
                        ),
                    ));
                    continue;
                };
                let actual = sha256_hex(prefix);
                if *digest != actual {
                    diagnostics.push(Diagnostic::at_line(
                        Stream::Receiver,
                        line,
                        format!("sha256 of {offset} bytes is {actual}, log says {digest}"),
                    ));
                }
            }
            ReceiverEvent::Finsha { digest } => {
                saw_finsha = true;
                let actual = sha256_hex(output);
                if *digest != actual {
                    diagnostics.push(Diagnostic::at_line(
                        Stream::Receiver,
                        line,
                        format!("finsha of the output is {actual}, log says {digest}"),
                    ));
                }
            }
            ReceiverEvent::RecvData { .. }
            | ReceiverEvent::SendAck { .. }
            | ReceiverEvent::Flush => {}
        }
    }

    if !saw_finsha {
        diagnostics.push(Diagnostic::for_stream(
            Stream::Receiver,
            "no finsha line to check against the output",
        ));
    }
    diagnostics
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::Location;

    const HELLO: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    fn transfer(src: &[u8], dst: &[u8], segment_size: u64) -> Transfer {
        Transfer {
            source: src.to_vec(),
            destination: dst.to_vec(),
            segment_size,
        }
    }

    #[test]
    fn known_digest() {
        assert_eq!(sha256_hex(b"hello"), HELLO);
    }

    #[test]
    fn expected_segments_rounds_up() {
        assert_eq!(transfer(&[0; 2500], &[], 1000).expected_segments(), 3);
        assert_eq!(transfer(&[0; 2000], &[], 1000).expected_segments(), 2);
        assert_eq!(transfer(&[0; 1], &[], 1000).expected_segments(), 1);
        assert_eq!(transfer(&[], &[], 1000).expected_segments(), 0);
    }

    #[test]
    fn segment_count_passes_with_resends() {
        let t = transfer(&[0; 1500], &[], 1000);
        let sender = vec![
            SenderEvent::send_data(1, 1),
            SenderEvent::send_data(2, 2),
            SenderEvent::resend_data(2, 1),
            SenderEvent::send_fin(),
        ];
        assert!(check_segment_count(&sender, &t).is_empty());
    }

    #[test]
    fn empty_file_needs_only_the_fin() {
        let t = transfer(&[], &[], 1000);
        let sender = vec![SenderEvent::send_fin(), SenderEvent::recv_finack()];
        assert!(check_segment_count(&sender, &t).is_empty());

        let sender = vec![SenderEvent::send_data(1, 1), SenderEvent::send_fin()];
        let diags = check_segment_count(&sender, &t);
        assert_eq!(diags.len(), 2);
        assert_eq!(
            diags[0].to_string(),
            "Line sender:1: seq_num 1 is outside the file's 0 segment(s)"
        );
    }

    #[test]
    fn missing_segment_fails() {
        let t = transfer(&[0; 2500], &[], 1000);
        let sender = vec![SenderEvent::send_data(1, 1), SenderEvent::send_data(2, 2)];
        let diags = check_segment_count(&sender, &t);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.starts_with("sent 2 distinct"));
    }

    #[test]
    fn out_of_range_segment_is_located() {
        let t = transfer(b"hello", &[], 1000);
        let sender = vec![SenderEvent::send_data(1, 1), SenderEvent::send_data(7, 1)];
        let diags = check_segment_count(&sender, &t);
        assert_eq!(diags.len(), 2);
        assert_eq!(
            diags[0].to_string(),
            "Line sender:2: seq_num 7 is outside the file's 1 segment(s)"
        );
    }

    #[test]
    fn output_file_reports_first_difference() {
        let same = check_output_file(&transfer(b"hello", b"hello", 1));
        assert!(same.is_empty());
        let diags = check_output_file(&transfer(b"hello", b"help!", 1));
        assert!(diags[0].message.contains("at byte 3"));
        let diags = check_output_file(&transfer(b"hello", b"hel", 1));
        let message = &diags[0].message;
        assert!(message.contains("at byte 3"));
        assert!(message.ends_with("(source 5 bytes, output 3 bytes)"));
    }

    #[test]
    fn digests_are_checked_against_output() {
        let t = transfer(b"hello", b"hello", 1000);
        let receiver = vec![
            ReceiverEvent::Flush,
            ReceiverEvent::sha256(5, HELLO),
            ReceiverEvent::finsha(HELLO),
        ];
        assert!(check_output_digest(&receiver, &t).is_empty());

        let receiver = vec![
            ReceiverEvent::sha256(4, HELLO),
            ReceiverEvent::sha256(6, HELLO),
            ReceiverEvent::finsha(HELLO),
        ];
        let diags = check_output_digest(&receiver, &t);
        assert_eq!(diags.len(), 2);
        let first = diags[0].to_string();
        assert!(first.starts_with("Line receiver:1: sha256 of 4 bytes"));
        assert!(diags[1].message.contains("past the end"));
    }

    #[test]
    fn wrong_or_missing_finsha_fails() {
        let t = transfer(b"hello", b"hello", 1000);
        let wrong = "0".repeat(64);
        let diags = check_output_digest(&[ReceiverEvent::finsha(&wrong)], &t);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.starts_with("finsha"));

        let diags = check_output_digest(&[], &t);
        assert_eq!(diags.len(), 1);
        assert_eq!(
            diags[0].location,
            Some(Location::Whole {
                stream: Stream::Receiver
            })
        );
    }
}
