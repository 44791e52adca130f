//! Final step outcome.

/// The code a step exits with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExitCode {
    /// The step was successful.
    #[default]
    Success,
    /// The step failed.
    Failure,
}

impl ExitCode {
    /// Numeric process exit code (0 or 1).
    pub fn code(self) -> i32 {
        match self {
            ExitCode::Success => 0,
            ExitCode::Failure => 1,
        }
    }

    /// Whether this is `Failure`.
    pub fn is_failure(self) -> bool {
        self == ExitCode::Failure
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        match code {
            ExitCode::Success => std::process::ExitCode::SUCCESS,
            ExitCode::Failure => std::process::ExitCode::FAILURE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(ExitCode::default(), ExitCode::Success);
        assert_eq!(ExitCode::Success.code(), 0);
        assert_eq!(ExitCode::Failure.code(), 1);
        assert!(ExitCode::Failure.is_failure());
    }
}
