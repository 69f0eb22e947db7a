//! Typed log events for the three participants of a transfer.
//!
//! A transfer involves three processes, each writing its own log:
//!
//! ```text
//!  ┌──────────┐  data   ┌─────────┐  data   ┌──────────┐
//!  │  Sender  │────────▶│  Agent  │────────▶│ Receiver │
//!  │          │◀────────│ (lossy) │◀────────│          │
//!  └──────────┘  acks   └─────────┘  acks   └──────────┘
//! ```
//!
//! Every line of a log becomes one event of that log's closed enum
//! ([`SenderEvent`], [`ReceiverEvent`], [`AgentEvent`]).  The checks in this
//! crate never look at events through anything but:
//! - the variant ([`Event::kind`]), and
//! - single-field lookups by name ([`Event::field`]).
//!
//! That uniform view is what lets [`crate::pattern`] compare an event against
//! a partial field set, and [`crate::coherency`] compare events of two
//! different streams field by field.
//!
//! No I/O happens here.

use std::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Stream
// ---------------------------------------------------------------------------

/// The participant a log (and every event in it) belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stream {
    Sender,
    Receiver,
    Agent,
}

impl Stream {
    /// All three streams, in report order.
    pub const ALL: [Stream; 3] = [Stream::Sender, Stream::Receiver, Stream::Agent];

    /// Lower-case name used in line locations (`agent:12`).
    pub fn name(self) -> &'static str {
        match self {
            Stream::Sender => "sender",
            Stream::Receiver => "receiver",
            Stream::Agent => "agent",
        }
    }

    /// Capitalised name used for stream-wide diagnostics.
    pub fn title(self) -> &'static str {
        match self {
            Stream::Sender => "Sender",
            Stream::Receiver => "Receiver",
            Stream::Agent => "Agent",
        }
    }
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Fields
// ---------------------------------------------------------------------------

/// Name of a field an event may carry.
///
/// The declaration order is the order fields are printed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    SeqNum,
    Ack,
    Sack,
    IsFin,
    IsDropped,
    IsResnd,
    Comment,
    WinSize,
    Threshold,
    ErrorRate,
    Offset,
    Digest,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::SeqNum => "seq_num",
            Field::Ack => "ack",
            Field::Sack => "sack",
            Field::IsFin => "is_fin",
            Field::IsDropped => "is_dropped",
            Field::IsResnd => "is_resnd",
            Field::Comment => "comment",
            Field::WinSize => "win_size",
            Field::Threshold => "threshold",
            Field::ErrorRate => "error_rate",
            Field::Offset => "offset",
            Field::Digest => "digest",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Value of one field of one event.
///
/// FIN and FINACK lines carry no numbers; their `seq_num` / `ack` / `sack`
/// are [`FieldValue::Absent`], which equals only another `Absent`.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Absent,
    Num(u64),
    Flag(bool),
    Rate(f64),
    Text(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Absent => f.write_str("none"),
            FieldValue::Num(n) => write!(f, "{n}"),
            FieldValue::Flag(b) => write!(f, "{b}"),
            FieldValue::Rate(r) => write!(f, "{r}"),
            FieldValue::Text(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<u32> for FieldValue {
    fn from(n: u32) -> Self {
        FieldValue::Num(u64::from(n))
    }
}

impl From<u64> for FieldValue {
    fn from(n: u64) -> Self {
        FieldValue::Num(n)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Flag(b)
    }
}

impl From<f64> for FieldValue {
    fn from(r: f64) -> Self {
        FieldValue::Rate(r)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Absent, Into::into)
    }
}

// ---------------------------------------------------------------------------
// Event trait
// ---------------------------------------------------------------------------

/// Uniform view over the events of any one stream.
pub trait Event: fmt::Debug + fmt::Display {
    /// Field-less tag naming the variant.
    type Kind: Copy + Eq + fmt::Debug + fmt::Display;

    /// Stream this event type is logged by.
    const STREAM: Stream;

    fn kind(&self) -> Self::Kind;

    /// Fields this event's variant carries, in print order.
    fn field_names(&self) -> &'static [Field];

    /// Value of `field`, or `None` when this variant does not carry it.
    fn field(&self, field: Field) -> Option<FieldValue>;

    /// Every carried field with its value.
    fn fields(&self) -> Vec<(Field, FieldValue)> {
        self.field_names()
            .iter()
            .filter_map(|&name| self.field(name).map(|value| (name, value)))
            .collect()
    }
}

/// Write `Kind(field=value, ...)`.
fn write_event<E: Event>(f: &mut fmt::Formatter<'_>, event: &E) -> fmt::Result {
    write!(f, "{}(", event.kind())?;
    for (i, (name, value)) in event.fields().into_iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{name}={value}")?;
    }
    f.write_str(")")
}

/// Render a run of events as `[A(..), B(..)]` for diagnostics.
pub fn render_window<E: Event>(events: &[E]) -> String {
    let items: Vec<String> = events.iter().map(ToString::to_string).collect();
    format!("[{}]", items.join(", "))
}

const DATA_FIELDS: &[Field] = &[Field::SeqNum, Field::IsFin];
const ACK_FIELDS: &[Field] = &[Field::Ack, Field::Sack, Field::IsFin];
const ARRIVAL_FIELDS: &[Field] = &[
    Field::SeqNum,
    Field::IsFin,
    Field::IsDropped,
    Field::Comment,
];

// ---------------------------------------------------------------------------
// Sender
// ---------------------------------------------------------------------------

/// One line of the sender's log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SenderEvent {
    /// `send data #N` / `resnd data #N`, or the FIN (`send fin`).
    SendData {
        seq_num: Option<u32>,
        is_fin: bool,
        is_resnd: bool,
        win_size: Option<u32>,
    },
    /// `recv ack #A, sack #S`, or the FINACK (`recv finack`).
    RecvAck {
        ack: Option<u32>,
        sack: Option<u32>,
        is_fin: bool,
    },
    /// `time out, threshold = T, winSize = W`.
    Timeout { threshold: u32, win_size: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderKind {
    SendData,
    RecvAck,
    Timeout,
}

impl fmt::Display for SenderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl SenderEvent {
    pub fn send_data(seq_num: u32, win_size: u32) -> Self {
        SenderEvent::SendData {
            seq_num: Some(seq_num),
            is_fin: false,
            is_resnd: false,
            win_size: Some(win_size),
        }
    }

    pub fn resend_data(seq_num: u32, win_size: u32) -> Self {
        SenderEvent::SendData {
            seq_num: Some(seq_num),
            is_fin: false,
            is_resnd: true,
            win_size: Some(win_size),
        }
    }

    pub fn send_fin() -> Self {
        SenderEvent::SendData {
            seq_num: None,
            is_fin: true,
            is_resnd: false,
            win_size: None,
        }
    }

    pub fn recv_ack(ack: u32, sack: u32) -> Self {
        SenderEvent::RecvAck {
            ack: Some(ack),
            sack: Some(sack),
            is_fin: false,
        }
    }

    pub fn recv_finack() -> Self {
        SenderEvent::RecvAck {
            ack: None,
            sack: None,
            is_fin: true,
        }
    }
}

impl Event for SenderEvent {
    type Kind = SenderKind;
    const STREAM: Stream = Stream::Sender;

    fn kind(&self) -> SenderKind {
        match self {
            SenderEvent::SendData { .. } => SenderKind::SendData,
            SenderEvent::RecvAck { .. } => SenderKind::RecvAck,
            SenderEvent::Timeout { .. } => SenderKind::Timeout,
        }
    }

    fn field_names(&self) -> &'static [Field] {
        match self {
            SenderEvent::SendData { .. } => {
                &[Field::SeqNum, Field::IsFin, Field::IsResnd, Field::WinSize]
            }
            SenderEvent::RecvAck { .. } => ACK_FIELDS,
            SenderEvent::Timeout { .. } => &[Field::Threshold, Field::WinSize],
        }
    }

    fn field(&self, field: Field) -> Option<FieldValue> {
        match (self, field) {
            (SenderEvent::SendData { seq_num, .. }, Field::SeqNum) => Some((*seq_num).into()),
            (SenderEvent::SendData { is_fin, .. }, Field::IsFin) => Some((*is_fin).into()),
            (SenderEvent::SendData { is_resnd, .. }, Field::IsResnd) => Some((*is_resnd).into()),
            (SenderEvent::SendData { win_size, .. }, Field::WinSize) => Some((*win_size).into()),
            (SenderEvent::RecvAck { ack, .. }, Field::Ack) => Some((*ack).into()),
            (SenderEvent::RecvAck { sack, .. }, Field::Sack) => Some((*sack).into()),
            (SenderEvent::RecvAck { is_fin, .. }, Field::IsFin) => Some((*is_fin).into()),
            (SenderEvent::Timeout { threshold, .. }, Field::Threshold) => Some((*threshold).into()),
            (SenderEvent::Timeout { win_size, .. }, Field::WinSize) => Some((*win_size).into()),
            _ => None,
        }
    }
}

impl fmt::Display for SenderEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_event(f, self)
    }
}

// ---------------------------------------------------------------------------
// Receiver
// ---------------------------------------------------------------------------

/// One line of the receiver's log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiverEvent {
    /// `recv data #N (comment)` / `drop data #N (comment)`, or `recv fin`.
    RecvData {
        seq_num: Option<u32>,
        is_fin: bool,
        is_dropped: bool,
        comment: Option<String>,
    },
    /// `send ack #A, sack #S`, or `send finack`.
    SendAck {
        ack: Option<u32>,
        sack: Option<u32>,
        is_fin: bool,
    },
    /// Buffered bytes were written to the output file.
    Flush,
    /// Digest of the first `offset` bytes written so far.
    Sha256 { offset: u64, digest: String },
    /// Digest of the whole output; always the last line.
    Finsha { digest: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverKind {
    RecvData,
    SendAck,
    Flush,
    Sha256,
    Finsha,
}

impl fmt::Display for ReceiverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl ReceiverEvent {
    pub fn recv_data(seq_num: u32, comment: &str) -> Self {
        ReceiverEvent::RecvData {
            seq_num: Some(seq_num),
            is_fin: false,
            is_dropped: false,
            comment: Some(comment.to_owned()),
        }
    }

    pub fn drop_data(seq_num: u32, comment: &str) -> Self {
        ReceiverEvent::RecvData {
            seq_num: Some(seq_num),
            is_fin: false,
            is_dropped: true,
            comment: Some(comment.to_owned()),
        }
    }

    pub fn recv_fin() -> Self {
        ReceiverEvent::RecvData {
            seq_num: None,
            is_fin: true,
            is_dropped: false,
            comment: None,
        }
    }

    pub fn send_ack(ack: u32, sack: u32) -> Self {
        ReceiverEvent::SendAck {
            ack: Some(ack),
            sack: Some(sack),
            is_fin: false,
        }
    }

    pub fn send_finack() -> Self {
        ReceiverEvent::SendAck {
            ack: None,
            sack: None,
            is_fin: true,
        }
    }

    pub fn sha256(offset: u64, digest: &str) -> Self {
        ReceiverEvent::Sha256 {
            offset,
            digest: digest.to_owned(),
        }
    }

    pub fn finsha(digest: &str) -> Self {
        ReceiverEvent::Finsha {
            digest: digest.to_owned(),
        }
    }
}

impl Event for ReceiverEvent {
    type Kind = ReceiverKind;
    const STREAM: Stream = Stream::Receiver;

    fn kind(&self) -> ReceiverKind {
        match self {
            ReceiverEvent::RecvData { .. } => ReceiverKind::RecvData,
            ReceiverEvent::SendAck { .. } => ReceiverKind::SendAck,
            ReceiverEvent::Flush => ReceiverKind::Flush,
            ReceiverEvent::Sha256 { .. } => ReceiverKind::Sha256,
            ReceiverEvent::Finsha { .. } => ReceiverKind::Finsha,
        }
    }

    fn field_names(&self) -> &'static [Field] {
        match self {
            ReceiverEvent::RecvData { .. } => ARRIVAL_FIELDS,
            ReceiverEvent::SendAck { .. } => ACK_FIELDS,
            ReceiverEvent::Flush => &[],
            ReceiverEvent::Sha256 { .. } => &[Field::Offset, Field::Digest],
            ReceiverEvent::Finsha { .. } => &[Field::Digest],
        }
    }

    fn field(&self, field: Field) -> Option<FieldValue> {
        match (self, field) {
            (ReceiverEvent::RecvData { seq_num, .. }, Field::SeqNum) => Some((*seq_num).into()),
            (ReceiverEvent::RecvData { is_fin, .. }, Field::IsFin) => Some((*is_fin).into()),
            (ReceiverEvent::RecvData { is_dropped, .. }, Field::IsDropped) => {
                Some((*is_dropped).into())
            }
            (ReceiverEvent::RecvData { comment, .. }, Field::Comment) => {
                Some(comment.clone().into())
            }
            (ReceiverEvent::SendAck { ack, .. }, Field::Ack) => Some((*ack).into()),
            (ReceiverEvent::SendAck { sack, .. }, Field::Sack) => Some((*sack).into()),
            (ReceiverEvent::SendAck { is_fin, .. }, Field::IsFin) => Some((*is_fin).into()),
            (ReceiverEvent::Sha256 { offset, .. }, Field::Offset) => Some((*offset).into()),
            (ReceiverEvent::Sha256 { digest, .. }, Field::Digest)
            | (ReceiverEvent::Finsha { digest }, Field::Digest) => Some(digest.as_str().into()),
            _ => None,
        }
    }
}

impl fmt::Display for ReceiverEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_event(f, self)
    }
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// One line of the agent's log.
///
/// Every data segment the agent picks up (`GetData`) is followed by exactly
/// one disposition: forwarded, forwarded corrupted, or dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    GetData {
        seq_num: Option<u32>,
        is_fin: bool,
    },
    FwdData {
        seq_num: Option<u32>,
        is_fin: bool,
        error_rate: Option<f64>,
    },
    CorruptData {
        seq_num: Option<u32>,
        is_fin: bool,
        error_rate: Option<f64>,
    },
    DropData {
        seq_num: Option<u32>,
        is_fin: bool,
        error_rate: Option<f64>,
    },
    GetAck {
        ack: Option<u32>,
        sack: Option<u32>,
        is_fin: bool,
    },
    FwdAck {
        ack: Option<u32>,
        sack: Option<u32>,
        is_fin: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentKind {
    GetData,
    FwdData,
    CorruptData,
    DropData,
    GetAck,
    FwdAck,
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl AgentEvent {
    pub fn get_data(seq_num: u32) -> Self {
        AgentEvent::GetData {
            seq_num: Some(seq_num),
            is_fin: false,
        }
    }

    pub fn fwd_data(seq_num: u32) -> Self {
        AgentEvent::FwdData {
            seq_num: Some(seq_num),
            is_fin: false,
            error_rate: None,
        }
    }

    pub fn corrupt_data(seq_num: u32) -> Self {
        AgentEvent::CorruptData {
            seq_num: Some(seq_num),
            is_fin: false,
            error_rate: None,
        }
    }

    pub fn drop_data(seq_num: u32) -> Self {
        AgentEvent::DropData {
            seq_num: Some(seq_num),
            is_fin: false,
            error_rate: None,
        }
    }

    pub fn get_fin() -> Self {
        AgentEvent::GetData {
            seq_num: None,
            is_fin: true,
        }
    }

    pub fn fwd_fin() -> Self {
        AgentEvent::FwdData {
            seq_num: None,
            is_fin: true,
            error_rate: None,
        }
    }

    pub fn get_ack(ack: u32, sack: u32) -> Self {
        AgentEvent::GetAck {
            ack: Some(ack),
            sack: Some(sack),
            is_fin: false,
        }
    }

    pub fn fwd_ack(ack: u32, sack: u32) -> Self {
        AgentEvent::FwdAck {
            ack: Some(ack),
            sack: Some(sack),
            is_fin: false,
        }
    }

    pub fn get_finack() -> Self {
        AgentEvent::GetAck {
            ack: None,
            sack: None,
            is_fin: true,
        }
    }

    pub fn fwd_finack() -> Self {
        AgentEvent::FwdAck {
            ack: None,
            sack: None,
            is_fin: true,
        }
    }
}

impl Event for AgentEvent {
    type Kind = AgentKind;
    const STREAM: Stream = Stream::Agent;

    fn kind(&self) -> AgentKind {
        match self {
            AgentEvent::GetData { .. } => AgentKind::GetData,
            AgentEvent::FwdData { .. } => AgentKind::FwdData,
            AgentEvent::CorruptData { .. } => AgentKind::CorruptData,
            AgentEvent::DropData { .. } => AgentKind::DropData,
            AgentEvent::GetAck { .. } => AgentKind::GetAck,
            AgentEvent::FwdAck { .. } => AgentKind::FwdAck,
        }
    }

    fn field_names(&self) -> &'static [Field] {
        match self {
            AgentEvent::GetData { .. } => DATA_FIELDS,
            AgentEvent::FwdData { .. }
            | AgentEvent::CorruptData { .. }
            | AgentEvent::DropData { .. } => &[Field::SeqNum, Field::IsFin, Field::ErrorRate],
            AgentEvent::GetAck { .. } | AgentEvent::FwdAck { .. } => ACK_FIELDS,
        }
    }

    fn field(&self, field: Field) -> Option<FieldValue> {
        match (self, field) {
            (
                AgentEvent::GetData { seq_num, .. }
                | AgentEvent::FwdData { seq_num, .. }
                | AgentEvent::CorruptData { seq_num, .. }
                | AgentEvent::DropData { seq_num, .. },
                Field::SeqNum,
            ) => Some((*seq_num).into()),
            (
                AgentEvent::GetData { is_fin, .. }
                | AgentEvent::FwdData { is_fin, .. }
                | AgentEvent::CorruptData { is_fin, .. }
                | AgentEvent::DropData { is_fin, .. }
                | AgentEvent::GetAck { is_fin, .. }
                | AgentEvent::FwdAck { is_fin, .. },
                Field::IsFin,
            ) => Some((*is_fin).into()),
            (
                AgentEvent::FwdData { error_rate, .. }
                | AgentEvent::CorruptData { error_rate, .. }
                | AgentEvent::DropData { error_rate, .. },
                Field::ErrorRate,
            ) => Some((*error_rate).into()),
            (AgentEvent::GetAck { ack, .. } | AgentEvent::FwdAck { ack, .. }, Field::Ack) => {
                Some((*ack).into())
            }
            (AgentEvent::GetAck { sack, .. } | AgentEvent::FwdAck { sack, .. }, Field::Sack) => {
                Some((*sack).into())
            }
            _ => None,
        }
    }
}

impl fmt::Display for AgentEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_event(f, self)
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
