use thiserror::Error;

/// Completion status as seen by a caller that hit an illegal transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionStatus {
    Pending,
    Inlining,
    Completing,
    Completed,
}

impl CompletionStatus {
    pub(crate) const fn as_u8(self) -> u8 {
        match self {
            CompletionStatus::Pending => 0,
            CompletionStatus::Inlining => 1,
            CompletionStatus::Completing => 2,
            CompletionStatus::Completed => 3,
        }
    }

    pub(crate) const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => CompletionStatus::Pending,
            1 => CompletionStatus::Inlining,
            2 => CompletionStatus::Completing,
            _ => CompletionStatus::Completed,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReadlineError {
    #[error("already reading a line")]
    AlreadyReading,
    #[error("session is not installed on a connection")]
    NotInstalled,
    #[error("session is already installed on a connection")]
    AlreadyInstalled,
    #[error("completion cannot {op} while {status:?}")]
    IllegalCompletionState {
        op: &'static str,
        status: CompletionStatus,
    },
    #[error("the interaction owning this completion is gone")]
    StaleCompletion,
    #[error("unsupported code point {0:?} in completion text")]
    UnsupportedCodePoint(char),
}

pub type ReadlineResult<T> = Result<T, ReadlineError>;
