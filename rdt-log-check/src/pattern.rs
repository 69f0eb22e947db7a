//! Structural matching of event windows.
//!
//! A [`Pattern`] names a variant and a subset of that variant's fields with
//! expected values.  Fields not named are wildcards.  [`matches`] compares a
//! window of observed events against a list of patterns position by position
//! and accepts only an exact, full-length match; a shorter or longer window
//! never matches, even if every pattern it covers would.

use std::collections::BTreeMap;
use std::fmt;

use crate::event::{Event, Field, FieldValue};

/// Expected shape of one event.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern<K> {
    kind: K,
    expected: BTreeMap<Field, FieldValue>,
}

impl<K: Copy + Eq + fmt::Display> Pattern<K> {
    /// A pattern that accepts any event of variant `kind`.
    pub fn new(kind: K) -> Self {
        Self {
            kind,
            expected: BTreeMap::new(),
        }
    }

    /// Additionally require `field` to equal `value`.
    pub fn with(mut self, field: Field, value: impl Into<FieldValue>) -> Self {
        self.expected.insert(field, value.into());
        self
    }

    /// Require variant `kind` carrying every field of `event` with the same
    /// values.  Used where a line must be repeated verbatim under another
    /// variant (an ack the agent forwards).
    pub fn exact<E: Event>(kind: K, event: &E) -> Self {
        Self {
            kind,
            expected: event.fields().into_iter().collect(),
        }
    }

    /// `true` when `event` has this pattern's variant and every expected field.
    ///
    /// A field the event's variant does not carry never matches.
    pub fn is_match<E: Event<Kind = K>>(&self, event: &E) -> bool {
        event.kind() == self.kind
            && self
                .expected
                .iter()
                .all(|(&name, value)| event.field(name).as_ref() == Some(value))
    }

    /// Every expected field whose value differs from (or is missing in)
    /// `event`.  Checks all fields; intended for messages, not decisions.
    pub fn mismatched_fields<E: Event<Kind = K>>(&self, event: &E) -> Vec<Field> {
        self.expected
            .iter()
            .filter(|&(&name, value)| event.field(name).as_ref() != Some(value))
            .map(|(&name, _)| name)
            .collect()
    }
}

impl<K: fmt::Display> fmt::Display for Pattern<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if self.expected.is_empty() {
            return Ok(());
        }
        f.write_str("(")?;
        for (i, (name, value)) in self.expected.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        f.write_str(")")
    }
}

/// `true` iff `observed` and `patterns` have the same length and every event
/// matches the pattern at its position.
pub fn matches<E: Event>(observed: &[E], patterns: &[Pattern<E::Kind>]) -> bool {
    observed.len() == patterns.len()
        && observed
            .iter()
            .zip(patterns)
            .all(|(event, pattern)| pattern.is_match(event))
}

/// Render a pattern list as `[A, B(x=1)]` for diagnostics.
pub fn render<K: fmt::Display>(patterns: &[Pattern<K>]) -> String {
    let items: Vec<String> = patterns.iter().map(ToString::to_string).collect();
    format!("[{}]", items.join(", "))
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
