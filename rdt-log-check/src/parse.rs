//! Text log lines → typed events.
//!
//! Each participant prints one event per line, fields separated by tabs:
//!
//! ```text
//! sender                         receiver                       agent
//! send   data  #1,  winSize = 1  recv  data  #1  (in order)     get  data  #1
//! resnd  data  #1,  winSize = 1  drop  data  #2  (corrupted)    fwd  data  #1,  error rate = 0.1000
//! recv   ack   #1,  sack  #1     send  ack   #1,  sack  #1      get  ack   #1,  sack  #1
//! time   out,  threshold = 2,..  flush                          corrupt|drop  data  #2, ...
//! send   fin                     sha256  1000  <hex>            get  fin / fwd  fin
//! recv   finack                  recv  fin / send  finack       get  finack / fwd  finack
//!                                finsha  <hex>
//! ```
//!
//! Parsing never stops at a bad line: every line is either an event or a
//! [`ParseFailure`] carrying its 1-based line number, so one pass reports
//! all of them.  Trailing commas on a token are punctuation and are
//! stripped before matching.

use std::fmt;

use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::event::{AgentEvent, ReceiverEvent, SenderEvent};

/// Hex digits in a SHA-256 digest.
const DIGEST_LEN: usize = 64;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a single line could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty line")]
    Empty,
    #[error("unrecognized line {0:?}")]
    Unrecognized(String),
    #[error("invalid {field} in {token:?}")]
    InvalidField { field: &'static str, token: String },
}

/// A line that did not parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseFailure {
    pub line: usize,
    #[serde(rename = "reason", serialize_with = "serialize_display")]
    pub error: ParseError,
}

fn serialize_display<T: fmt::Display, S: Serializer>(value: &T, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(value)
}

/// Outcome of parsing one log.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed<E> {
    pub events: Vec<E>,
    pub failures: Vec<ParseFailure>,
}

impl<E> Parsed<E> {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

pub fn parse_sender(text: &str) -> Parsed<SenderEvent> {
    parse_lines(text, sender_line)
}

pub fn parse_receiver(text: &str) -> Parsed<ReceiverEvent> {
    parse_lines(text, receiver_line)
}

pub fn parse_agent(text: &str) -> Parsed<AgentEvent> {
    parse_lines(text, agent_line)
}

fn parse_lines<E>(text: &str, parse_line: fn(&str) -> Result<E, ParseError>) -> Parsed<E> {
    let mut parsed = Parsed {
        events: Vec::new(),
        failures: Vec::new(),
    };

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim_end();
        let result = if line.trim().is_empty() {
            Err(ParseError::Empty)
        } else {
            parse_line(line)
        };
        match result {
            Ok(event) => parsed.events.push(event),
            Err(error) => parsed.failures.push(ParseFailure {
                line: index + 1,
                error,
            }),
        }
    }

    parsed
}

// ---------------------------------------------------------------------------
// Per-stream grammars
// ---------------------------------------------------------------------------

fn sender_line(line: &str) -> Result<SenderEvent, ParseError> {
    match tokens(line).as_slice() {
        [verb @ ("send" | "resnd"), "data", seq, win] => Ok(SenderEvent::SendData {
            seq_num: Some(number(seq, "seq_num")?),
            is_fin: false,
            is_resnd: *verb == "resnd",
            win_size: Some(labelled(win, "winSize")?),
        }),
        [verb @ ("send" | "resnd"), "fin"] => Ok(SenderEvent::SendData {
            seq_num: None,
            is_fin: true,
            is_resnd: *verb == "resnd",
            win_size: None,
        }),
        ["recv", "ack", ack, "sack", sack] => Ok(SenderEvent::RecvAck {
            ack: Some(number(ack, "ack")?),
            sack: Some(number(sack, "sack")?),
            is_fin: false,
        }),
        ["recv", "finack"] => Ok(SenderEvent::recv_finack()),
        ["time", "out", threshold, win] => Ok(SenderEvent::Timeout {
            threshold: labelled(threshold, "threshold")?,
            win_size: labelled(win, "winSize")?,
        }),
        _ => Err(ParseError::Unrecognized(line.to_owned())),
    }
}

fn receiver_line(line: &str) -> Result<ReceiverEvent, ParseError> {
    match tokens(line).as_slice() {
        [verb @ ("recv" | "drop"), "data", seq, rest @ ..] if rest.len() <= 1 => {
            let comment = match rest.first() {
                Some(token) => Some(parenthesized(token)?.to_owned()),
                None => None,
            };
            Ok(ReceiverEvent::RecvData {
                seq_num: Some(number(seq, "seq_num")?),
                is_fin: false,
                is_dropped: *verb == "drop",
                comment,
            })
        }
        ["recv", "fin"] => Ok(ReceiverEvent::recv_fin()),
        ["send", "ack", ack, "sack", sack] => Ok(ReceiverEvent::SendAck {
            ack: Some(number(ack, "ack")?),
            sack: Some(number(sack, "sack")?),
            is_fin: false,
        }),
        ["send", "finack"] => Ok(ReceiverEvent::send_finack()),
        ["flush"] => Ok(ReceiverEvent::Flush),
        ["sha256", offset, digest] => Ok(ReceiverEvent::Sha256 {
            offset: offset.parse().map_err(|_| invalid("offset", offset))?,
            digest: hex_digest(digest)?,
        }),
        ["finsha", digest] => Ok(ReceiverEvent::Finsha {
            digest: hex_digest(digest)?,
        }),
        _ => Err(ParseError::Unrecognized(line.to_owned())),
    }
}

fn agent_line(line: &str) -> Result<AgentEvent, ParseError> {
    match tokens(line).as_slice() {
        ["get", "data", seq] => Ok(AgentEvent::get_data(number(seq, "seq_num")?)),
        ["get", "fin"] => Ok(AgentEvent::get_fin()),
        [verb @ ("fwd" | "corrupt" | "drop"), "data", seq, rest @ ..] if rest.len() <= 1 => {
            disposition(verb, Some(number(seq, "seq_num")?), rest)
        }
        [verb @ ("fwd" | "corrupt" | "drop"), "fin", rest @ ..] if rest.len() <= 1 => {
            disposition(verb, None, rest)
        }
        [verb @ ("get" | "fwd"), "ack", ack, "sack", sack] => {
            let (ack, sack) = (Some(number(ack, "ack")?), Some(number(sack, "sack")?));
            Ok(match *verb {
                "get" => AgentEvent::GetAck {
                    ack,
                    sack,
                    is_fin: false,
                },
                _ => AgentEvent::FwdAck {
                    ack,
                    sack,
                    is_fin: false,
                },
            })
        }
        ["get", "finack"] => Ok(AgentEvent::get_finack()),
        ["fwd", "finack"] => Ok(AgentEvent::fwd_finack()),
        _ => Err(ParseError::Unrecognized(line.to_owned())),
    }
}

/// Build a forward/corrupt/drop event; `rest` holds the optional
/// `error rate = R` token.
fn disposition(verb: &str, seq_num: Option<u32>, rest: &[&str]) -> Result<AgentEvent, ParseError> {
    let error_rate = match rest.first() {
        Some(token) => Some(labelled::<f64>(token, "error rate")?),
        None => None,
    };
    let is_fin = seq_num.is_none();
    Ok(match verb {
        "fwd" => AgentEvent::FwdData {
            seq_num,
            is_fin,
            error_rate,
        },
        "corrupt" => AgentEvent::CorruptData {
            seq_num,
            is_fin,
            error_rate,
        },
        _ => AgentEvent::DropData {
            seq_num,
            is_fin,
            error_rate,
        },
    })
}

// ---------------------------------------------------------------------------
// Token helpers
// ---------------------------------------------------------------------------

fn tokens(line: &str) -> Vec<&str> {
    line.split('\t')
        .map(|token| token.trim().trim_end_matches(','))
        .filter(|token| !token.is_empty())
        .collect()
}

fn invalid(field: &'static str, token: &str) -> ParseError {
    ParseError::InvalidField {
        field,
        token: token.to_owned(),
    }
}

/// `#12` → 12
fn number(token: &str, field: &'static str) -> Result<u32, ParseError> {
    token
        .strip_prefix('#')
        .and_then(|digits| digits.parse().ok())
        .ok_or_else(|| invalid(field, token))
}

/// `winSize = 4` → 4
fn labelled<T: std::str::FromStr>(token: &str, label: &'static str) -> Result<T, ParseError> {
    token
        .strip_prefix(label)
        .and_then(|rest| rest.trim_start().strip_prefix('='))
        .and_then(|value| value.trim().parse().ok())
        .ok_or_else(|| invalid(label, token))
}

/// `(in order)` → `in order`
fn parenthesized(token: &str) -> Result<&str, ParseError> {
    token
        .strip_prefix('(')
        .and_then(|inner| inner.strip_suffix(')'))
        .ok_or_else(|| invalid("comment", token))
}

fn hex_digest(token: &str) -> Result<String, ParseError> {
    if token.len() == DIGEST_LEN && token.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(token.to_ascii_lowercase())
    } else {
        Err(invalid("digest", token))
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
