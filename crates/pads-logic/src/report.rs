use log::{error, info, warn};

/// How serious a diagnostic is. None of them stop the parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Sink for human-readable parse diagnostics.
///
/// The parser never depends on what a reporter does with a message; a
/// reporter that drops everything yields the same document.
pub trait Reporter {
    fn report(&mut self, message: &str, severity: Severity);
}

/// Forwards diagnostics to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&mut self, message: &str, severity: Severity) {
        match severity {
            Severity::Info => info!("PADS: {message}"),
            Severity::Warning => warn!("PADS: {message}"),
            Severity::Error => error!("PADS: {message}"),
        }
    }
}

/// Discards every diagnostic.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn report(&mut self, _message: &str, _severity: Severity) {}
}

/// Keeps diagnostics in memory, in arrival order.
#[derive(Debug, Default, Clone)]
pub struct CollectingReporter {
    pub messages: Vec<(Severity, String)>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.messages.iter().filter(|(s, _)| *s == severity).count()
    }

    /// True if any collected message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.messages.iter().any(|(_, m)| m.contains(needle))
    }
}

impl Reporter for CollectingReporter {
    fn report(&mut self, message: &str, severity: Severity) {
        self.messages.push((severity, message.to_string()));
    }
}
