use std::fmt;

/// Browser log severity, pino's six levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl Severity {
    /// Parses a level label, ignoring case. `warning` and `err` are accepted
    /// since console wrappers emit them.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "debug" => Some(Self::Debug),
            "info" | "log" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" | "err" => Some(Self::Error),
            "fatal" => Some(Self::Fatal),
            _ => None,
        }
    }

    /// Maps pino's numeric level onto its band (10 trace ... 60 fatal).
    pub fn from_value(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        Some(match value {
            v if v <= 10.0 => Self::Trace,
            v if v <= 20.0 => Self::Debug,
            v if v <= 30.0 => Self::Info,
            v if v <= 40.0 => Self::Warn,
            v if v <= 50.0 => Self::Error,
            _ => Self::Fatal,
        })
    }

    /// Label first, then the numeric value, then `Info`.
    pub fn resolve(label: Option<&str>, value: Option<f64>) -> Self {
        label
            .and_then(Self::from_label)
            .or_else(|| value.and_then(Self::from_value))
            .unwrap_or(Self::Info)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Fatal => "fatal",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
