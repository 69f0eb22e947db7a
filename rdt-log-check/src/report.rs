//! Text rendering of a [`Report`].
//!
//! ```text
//! [*] Testing agent_format...
//! [o] Test succeeded!
//!
//! =========================
//!
//! [*] Testing coherency...
//! [x] Test failed: total fail count 1
//!     [-] Line [sender:3 | agent:5]: Sender/Agent data segment coherency: ...
//!
//! =========================
//!
//! [*] Final results: [agent_format[O], coherency[X]]
//! ```

use std::fmt;

use crate::harness::Report;
use crate::trace::ParseFailures;

const SEPARATOR_WIDTH: usize = 25;

/// Wraps text in ANSI color codes when enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Painter {
    enabled: bool,
}

impl Painter {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    fn paint(self, code: &str, text: &str) -> String {
        if self.enabled {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_owned()
        }
    }

    pub fn red(self, text: &str) -> String {
        self.paint("31", text)
    }

    pub fn green(self, text: &str) -> String {
        self.paint("32", text)
    }

    pub fn yellow(self, text: &str) -> String {
        self.paint("33", text)
    }

    pub fn blue(self, text: &str) -> String {
        self.paint("34", text)
    }
}

/// A [`Report`] laid out as a test log.
pub struct TextReport<'a> {
    pub report: &'a Report,
    pub painter: Painter,
}

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = self.painter;
        let mut results = Vec::with_capacity(self.report.outcomes.len());

        for outcome in &self.report.outcomes {
            let name = outcome.check.name();
            writeln!(f, "{} Testing {}...", p.blue("[*]"), p.blue(name))?;
            if outcome.passed {
                writeln!(f, "{}", p.green("[o] Test succeeded!"))?;
                results.push(p.green(&format!("{name}[O]")));
            } else {
                writeln!(
                    f,
                    "{}",
                    p.red(&format!(
                        "[x] Test failed: total fail count {}",
                        outcome.diagnostics.len()
                    ))
                )?;
                for diagnostic in &outcome.diagnostics {
                    writeln!(f, "    [-] {}", diagnostic.render_with(|loc| p.yellow(loc)))?;
                }
                results.push(p.red(&format!("{name}[X]")));
            }
            writeln!(f, "\n{}\n", "=".repeat(SEPARATOR_WIDTH))?;
        }

        let results = results.join(", ");
        writeln!(f, "{} Final results: [{results}]", p.blue("[*]"))
    }
}

/// Parse failures grouped by log.
pub struct ParseFailureReport<'a> {
    pub failures: &'a ParseFailures,
    pub painter: Painter,
}

impl fmt::Display for ParseFailureReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = self.painter;
        for (stream, failures) in self.failures.by_stream() {
            let heading = format!("[x] {} log does not parse:", stream.title());
            writeln!(f, "{}", p.red(&heading))?;
            for failure in failures {
                writeln!(
                    f,
                    "    [-] Line {}: {}",
                    p.yellow(&format!("{stream}:{}", failure.line)),
                    failure.error
                )?;
            }
        }
        writeln!(
            f,
            "{} {} unparsable line(s); no check was run",
            p.blue("[*]"),
            self.failures.count()
        )
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::Diagnostic;
    use crate::event::Stream;
    use crate::harness::{Check, CheckOutcome};
    use crate::parse::{ParseError, ParseFailure};

    fn report() -> Report {
        Report {
            outcomes: vec![
                CheckOutcome {
                    check: Check::AgentFormat,
                    passed: true,
                    diagnostics: vec![],
                },
                CheckOutcome {
                    check: Check::Coherency,
                    passed: false,
                    diagnostics: vec![Diagnostic::at_pair(
                        (Stream::Sender, 3),
                        (Stream::Agent, 5),
                        "bad",
                    )],
                },
            ],
        }
    }

    #[test]
    fn plain_layout() {
        let text = TextReport {
            report: &report(),
            painter: Painter::new(false),
        }
        .to_string();
        let expected = "\
[*] Testing agent_format...
[o] Test succeeded!

=========================

[*] Testing coherency...
[x] Test failed: total fail count 1
    [-] Line [sender:3 | agent:5]: bad

=========================

[*] Final results: [agent_format[O], coherency[X]]
";
        assert_eq!(text, expected);
    }

    #[test]
    fn locations_are_highlighted() {
        let text = TextReport {
            report: &report(),
            painter: Painter::new(true),
        }
        .to_string();
        assert!(text.contains("Line \x1b[33m[sender:3 | agent:5]\x1b[0m: bad"));
        assert!(text.contains("\x1b[31mcoherency[X]\x1b[0m"));
    }

    #[test]
    fn parse_failures_grouped_by_stream() {
        let failures = ParseFailures {
            agent: vec![ParseFailure {
                line: 4,
                error: ParseError::Empty,
            }],
            ..ParseFailures::default()
        };
        let text = ParseFailureReport {
            failures: &failures,
            painter: Painter::new(false),
        }
        .to_string();
        assert_eq!(
            text,
            "[x] Agent log does not parse:\n    [-] Line agent:4: empty line\n\
             [*] 1 unparsable line(s); no check was run\n"
        );
    }
}
