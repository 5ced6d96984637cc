//! Command outcome and process exit codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | every file moved and recorded (or dataset clean for `verify`) |
//! | 1 | fatal error, nothing or only part of the run happened |
//! | 2 | run finished but some files were skipped, orphaned or unlisted (or `verify` found problems) |

/// How a command finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Partial,
    Fatal,
}

impl Outcome {
    pub fn exit_code(self) -> u8 {
        match self {
            Outcome::Success => 0,
            Outcome::Fatal => 1,
            Outcome::Partial => 2,
        }
    }

    /// Outcome of a command that returned `result`
    pub fn of<E>(result: &Result<Outcome, E>) -> Self {
        match result {
            Ok(outcome) => *outcome,
            Err(_) => Outcome::Fatal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(Outcome::Success.exit_code(), 0);
        assert_eq!(Outcome::Fatal.exit_code(), 1);
        assert_eq!(Outcome::Partial.exit_code(), 2);
    }

    #[test]
    fn test_error_is_fatal() {
        let failed: Result<Outcome, String> = Err("boom".to_string());
        assert_eq!(Outcome::of(&failed), Outcome::Fatal);
        assert_eq!(Outcome::of::<String>(&Ok(Outcome::Partial)), Outcome::Partial);
    }
}
