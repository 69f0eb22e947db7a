//! Local grammar of the receiver log.
//!
//! Every data arrival is answered by exactly one ack, and an in-order
//! arrival that fills the buffer is additionally followed by a flush and the
//! digest of everything written so far:
//!
//! ```text
//!  recv data #N ──▶ send ack ──▶ flush ──▶ sha256     (buffer flushed)
//!  recv data #N ──▶ send ack                          (kept in buffer)
//!  drop data #N ──▶ send ack                          (corrupted / overflow)
//!  ...
//!  finsha                                             (last line only)
//! ```
//!
//! [`check_receiver_format`] tries the three shapes in that order at every
//! data line.  When none fits it reports the line and moves on by one, so it
//! realigns on the next arrival instead of giving up.

use crate::diagnostic::Diagnostic;
use crate::event::{render_window, Field, ReceiverEvent, ReceiverKind, Stream};
use crate::pattern::{self, Pattern};

fn delivered() -> [Pattern<ReceiverKind>; 4] {
    [
        Pattern::new(ReceiverKind::RecvData).with(Field::IsDropped, false),
        Pattern::new(ReceiverKind::SendAck),
        Pattern::new(ReceiverKind::Flush),
        Pattern::new(ReceiverKind::Sha256),
    ]
}

fn dropped() -> [Pattern<ReceiverKind>; 2] {
    [
        Pattern::new(ReceiverKind::RecvData).with(Field::IsDropped, true),
        Pattern::new(ReceiverKind::SendAck),
    ]
}

/// Check the receiver log against its local grammar.
pub fn check_receiver_format(log: &[ReceiverEvent]) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let last_index = log.len().saturating_sub(1);
    let mut i = 0;

    while i < log.len() {
        match &log[i] {
            finsha @ ReceiverEvent::Finsha { .. } => {
                if i != last_index {
                    diagnostics.push(Diagnostic::at_line(
                        Stream::Receiver,
                        i + 1,
                        format!("Unexpected {finsha}"),
                    ));
                }
                i += 1;
            }

            ReceiverEvent::RecvData { .. } => {
                let delivered = delivered();
                let window = &log[i..log.len().min(i + delivered.len())];
                let head = &window[..window.len().min(2)];

                if pattern::matches(window, &delivered) {
                    i += 4;
                } else if pattern::matches(head, &delivered[..2])
                    || pattern::matches(head, &dropped())
                {
                    i += 2;
                } else {
                    diagnostics.push(Diagnostic::at_line(
                        Stream::Receiver,
                        i + 1,
                        format!(
                            "Expected to match {} or {}, but got {} instead",
                            pattern::render(&[
                                Pattern::new(ReceiverKind::RecvData),
                                Pattern::new(ReceiverKind::SendAck)
                            ]),
                            pattern::render(&delivered),
                            render_window(window)
                        ),
                    ));
                    i += 1;
                }
            }

            unexpected @ (ReceiverEvent::SendAck { .. }
            | ReceiverEvent::Flush
            | ReceiverEvent::Sha256 { .. }) => {
                diagnostics.push(Diagnostic::at_line(
                    Stream::Receiver,
                    i + 1,
                    format!("Unexpected {unexpected}"),
                ));
                i += 1;
            }
        }
    }

    let last = &log[log.len().saturating_sub(1)..];
    if !pattern::matches(last, &[Pattern::new(ReceiverKind::Finsha)]) {
        diagnostics.push(Diagnostic::for_stream(
            Stream::Receiver,
            "Last line is not finsha",
        ));
    }

    log::debug!(
        "receiver log: {} event(s), {} violation(s)",
        log.len(),
        diagnostics.len()
    );
    diagnostics
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
