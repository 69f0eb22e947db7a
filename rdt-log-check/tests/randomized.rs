//! Seeded random lossy runs.
//!
//! [`lossy_run`] plays a stop-and-wait transfer through an agent that drops,
//! corrupts or forwards each segment at random, writing the three logs as
//! the real programs would.  Whatever the agent does, the logs must pass
//! every trace check, and a single altered number must be caught by exactly
//! one coherency alignment.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use rdt_log_check::coherency::{check_coherency, Alignment};
use rdt_log_check::{run_battery, AgentEvent, Check, ReceiverEvent, SenderEvent, Traces};

const SEEDS: std::ops::Range<u64> = 0..32;
const DIGEST: &str = "00";

fn timeout() -> SenderEvent {
    SenderEvent::Timeout {
        threshold: 1,
        win_size: 1,
    }
}

/// Acknowledge `ack` on every hop from receiver to sender.
fn ack_round(traces: &mut Traces, ack: u32) {
    traces.receiver.push(ReceiverEvent::send_ack(ack, ack));
    traces.agent.push(AgentEvent::get_ack(ack, ack));
    traces.agent.push(AgentEvent::fwd_ack(ack, ack));
    traces.sender.push(SenderEvent::recv_ack(ack, ack));
}

fn is_data_send(event: &SenderEvent) -> bool {
    matches!(event, SenderEvent::SendData { seq_num: Some(_), .. })
}

fn is_data_forward(event: &AgentEvent) -> bool {
    matches!(event, AgentEvent::FwdAck { is_fin: false, .. })
}

fn lossy_run(rng: &mut StdRng) -> Traces {
    let mut traces = Traces::default();
    let segments = rng.random_range(1..=12u32);

    for seq in 1..=segments {
        let mut attempt = 0;
        loop {
            traces.sender.push(if attempt == 0 {
                SenderEvent::send_data(seq, 1)
            } else {
                SenderEvent::resend_data(seq, 1)
            });
            traces.agent.push(AgentEvent::get_data(seq));
            attempt += 1;

            match rng.random_range(0..4) {
                0 => {
                    traces.agent.push(AgentEvent::drop_data(seq));
                    traces.sender.push(timeout());
                }
                1 => {
                    traces.agent.push(AgentEvent::corrupt_data(seq));
                    let dropped = ReceiverEvent::drop_data(seq, "corrupted");
                    traces.receiver.push(dropped);
                    ack_round(&mut traces, seq - 1);
                    traces.sender.push(timeout());
                }
                _ => {
                    traces.agent.push(AgentEvent::fwd_data(seq));
                    let arrived = ReceiverEvent::recv_data(seq, "in order");
                    traces.receiver.push(arrived);
                    ack_round(&mut traces, seq);
                    // The sha256 line follows the ack on the receiver's log,
                    // wherever the other logs happen to be.
                    if rng.random_bool(0.3) {
                        traces.receiver.push(ReceiverEvent::Flush);
                        traces
                            .receiver
                            .push(ReceiverEvent::sha256(u64::from(seq) * 1000, DIGEST));
                    }
                    break;
                }
            }
        }
    }

    // The fin may be lost on its way too.
    traces.sender.push(SenderEvent::send_fin());
    traces.agent.push(AgentEvent::get_fin());
    while rng.random_bool(0.25) {
        traces.agent.push(AgentEvent::DropData {
            seq_num: None,
            is_fin: true,
            error_rate: Some(0.25),
        });
        traces.sender.push(timeout());
        traces.sender.push(SenderEvent::SendData {
            seq_num: None,
            is_fin: true,
            is_resnd: true,
            win_size: None,
        });
        traces.agent.push(AgentEvent::get_fin());
    }
    traces.agent.push(AgentEvent::fwd_fin());

    traces.receiver.extend([
        ReceiverEvent::recv_fin(),
        ReceiverEvent::send_finack(),
        ReceiverEvent::Flush,
        ReceiverEvent::sha256(u64::from(segments) * 1000, DIGEST),
        ReceiverEvent::finsha(DIGEST),
    ]);
    traces
        .agent
        .extend([AgentEvent::get_finack(), AgentEvent::fwd_finack()]);
    traces.sender.push(SenderEvent::recv_finack());
    traces
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn test_lossy_runs_pass_every_trace_check() {
    for seed in SEEDS {
        let traces = lossy_run(&mut StdRng::seed_from_u64(seed));
        let report = run_battery(&Check::TRACE, &traces, None);
        for outcome in &report.outcomes {
            assert!(
                outcome.passed,
                "seed {seed}, {}: {:?}",
                outcome.check, outcome.diagnostics
            );
        }
    }
}

#[test]
fn test_renumbered_send_fails_sender_data_only() {
    for seed in SEEDS {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut traces = lossy_run(&mut rng);

        let sends: Vec<usize> = traces
            .sender
            .iter()
            .enumerate()
            .filter(|(_, e)| is_data_send(e))
            .map(|(i, _)| i)
            .collect();
        let victim = sends[rng.random_range(0..sends.len())];
        if let SenderEvent::SendData { seq_num, .. } = &mut traces.sender[victim] {
            *seq_num = seq_num.map(|n| n + 1000);
        }

        let diags = check_coherency(&traces);
        assert_eq!(diags.len(), 1, "seed {seed}: {diags:?}");
        assert!(Alignment::SenderData.check(&traces).is_some());
    }
}

#[test]
fn test_altered_forwarded_ack_fails_sender_ack_only() {
    for seed in SEEDS {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut traces = lossy_run(&mut rng);

        let forwards: Vec<usize> = traces
            .agent
            .iter()
            .enumerate()
            .filter(|(_, e)| is_data_forward(e))
            .map(|(i, _)| i)
            .collect();
        let victim = forwards[rng.random_range(0..forwards.len())];
        if let AgentEvent::FwdAck { ack, .. } = &mut traces.agent[victim] {
            *ack = ack.map(|n| n + 1000);
        }

        let diags = check_coherency(&traces);
        assert_eq!(diags.len(), 1, "seed {seed}: {diags:?}");
        assert!(Alignment::SenderAck.check(&traces).is_some());
    }
}
