//! Operator outcome reporting.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity { Info, Warning, Error }

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        })
    }
}

/// Receives user-facing messages from the pipeline.
pub trait Reporter {
    fn report(&mut self, severity: Severity, message: &str);
}

/// Forwards reports to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&mut self, severity: Severity, message: &str) {
        match severity {
            Severity::Info => tracing::info!("{message}"),
            Severity::Warning => tracing::warn!("{message}"),
            Severity::Error => tracing::error!("{message}"),
        }
    }
}

/// Keeps every report in memory, and optionally forwards it.
#[derive(Debug, Default, Clone)]
pub struct CollectingReporter {
    pub entries: Vec<(Severity, String)>,
    forward: bool,
}

impl CollectingReporter {
    pub fn new() -> Self { Self::default() }

    /// Also emits every entry through `tracing`.
    pub fn forwarding() -> Self { Self { entries: Vec::new(), forward: true } }

    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &str> {
        self.entries.iter().filter(move |(s, _)| *s == severity).map(|(_, m)| m.as_str())
    }

    pub fn worst(&self) -> Option<Severity> { self.entries.iter().map(|(s, _)| *s).max() }
}

impl Reporter for CollectingReporter {
    fn report(&mut self, severity: Severity, message: &str) {
        if self.forward { TracingReporter.report(severity, message); }
        self.entries.push((severity, message.to_string()));
    }
}
