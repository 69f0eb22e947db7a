//! Diagnostics emitted by checks.
//!
//! A [`Diagnostic`] is one violation: a human-readable message plus, when it
//! can be pinned down, where in which log it happened.  Checks only ever
//! produce diagnostics; they never abort.

use std::fmt;

use serde::Serialize;

use crate::event::Stream;

/// Where a diagnostic points.  Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Location {
    /// A single line.
    Line { stream: Stream, line: usize },
    /// Consecutive lines `first..=last` of one log.
    Span {
        stream: Stream,
        first: usize,
        last: usize,
    },
    /// Two lines of two different logs that should correspond.
    Pair {
        left: Stream,
        left_line: usize,
        right: Stream,
        right_line: usize,
    },
    /// A log as a whole (e.g. its last line is missing).
    Whole { stream: Stream },
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Line { stream, line } => write!(f, "{stream}:{line}"),
            Location::Span {
                stream,
                first,
                last,
            } if first == last => write!(f, "{stream}:{first}"),
            Location::Span {
                stream,
                first,
                last,
            } => write!(f, "{stream}:{first}~{last}"),
            Location::Pair {
                left,
                left_line,
                right,
                right_line,
            } => write!(f, "[{left}:{left_line} | {right}:{right_line}]"),
            Location::Whole { stream } => f.write_str(stream.title()),
        }
    }
}

/// One violation found by a check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    pub message: String,
}

impl Diagnostic {
    pub fn at_line(stream: Stream, line: usize, message: impl Into<String>) -> Self {
        Self::located(Location::Line { stream, line }, message)
    }

    pub fn at_span(stream: Stream, first: usize, last: usize, message: impl Into<String>) -> Self {
        Self::located(
            Location::Span {
                stream,
                first,
                last,
            },
            message,
        )
    }

    pub fn at_pair(
        left: (Stream, usize),
        right: (Stream, usize),
        message: impl Into<String>,
    ) -> Self {
        Self::located(
            Location::Pair {
                left: left.0,
                left_line: left.1,
                right: right.0,
                right_line: right.1,
            },
            message,
        )
    }

    pub fn for_stream(stream: Stream, message: impl Into<String>) -> Self {
        Self::located(Location::Whole { stream }, message)
    }

    /// A diagnostic about no particular log.
    pub fn general(message: impl Into<String>) -> Self {
        Self {
            location: None,
            message: message.into(),
        }
    }

    fn located(location: Location, message: impl Into<String>) -> Self {
        Self {
            location: Some(location),
            message: message.into(),
        }
    }

    /// Format as `Line agent:3~4: message` (or `Agent: message` for a whole
    /// log), passing the location text through `highlight` first.
    pub fn render_with(&self, highlight: impl Fn(&str) -> String) -> String {
        match &self.location {
            Some(Location::Whole { stream }) => format!("{}: {}", stream.title(), self.message),
            Some(location) => {
                let location = highlight(&location.to_string());
                format!("Line {location}: {}", self.message)
            }
            None => self.message.clone(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_with(str::to_owned))
    }
}
