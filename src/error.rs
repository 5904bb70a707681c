use std::error::Error;
use std::fmt;

/// Why a report could not be produced. Each variant maps to one fixed spoken
/// phrase; only `Failure` carries diagnostic detail, and that detail is logged
/// rather than spoken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportError {
    /// No focused application, or the host could not identify one.
    NoFocusedProgram,
    /// The OS refused inspection, typically an elevated-privilege target.
    AccessDenied,
    /// Focus resolved, but every process vanished before yielding data.
    ProcessEnded,
    /// Anything else. Spoken generically, logged with the cause.
    Failure(String),
}

impl ReportError {
    /// The phrase handed to the speech output.
    pub fn spoken_message(&self) -> &'static str {
        match self {
            ReportError::NoFocusedProgram => "Cannot access program information",
            ReportError::AccessDenied => {
                "Cannot access process (requires administrator privileges)"
            }
            ReportError::ProcessEnded => "Program is no longer running",
            ReportError::Failure(_) => "Cannot get process information",
        }
    }
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportError::Failure(cause) => write!(f, "report failed: {cause}"),
            other => f.write_str(other.spoken_message()),
        }
    }
}

impl Error for ReportError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_has_a_fixed_phrase() {
        assert_eq!(
            ReportError::NoFocusedProgram.spoken_message(),
            "Cannot access program information"
        );
        assert_eq!(
            ReportError::ProcessEnded.spoken_message(),
            "Program is no longer running"
        );
        assert_eq!(
            ReportError::Failure("boom".into()).spoken_message(),
            "Cannot get process information"
        );
    }
}
