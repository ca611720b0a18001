use std::fmt;

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
        };
        f.write_str(label)
    }
}

/// Receives every message the pipeline emits, synchronously and unbuffered.
pub trait Reporter {
    fn report(&mut self, severity: Severity, message: &str);
}

impl<F> Reporter for F
where
    F: FnMut(Severity, &str),
{
    fn report(&mut self, severity: Severity, message: &str) {
        self(severity, message)
    }
}

/// Forwards to the `log` facade. Without `verbose` only errors get through.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter {
    verbose: bool,
}

impl LogReporter {
    pub fn new(verbose: bool) -> Self {
        LogReporter { verbose }
    }
}

impl Reporter for LogReporter {
    fn report(&mut self, severity: Severity, message: &str) {
        match severity {
            Severity::Error => log::error!("{message}"),
            Severity::Warn if self.verbose => log::warn!("{message}"),
            Severity::Info if self.verbose => log::info!("{message}"),
            _ => {}
        }
    }
}
