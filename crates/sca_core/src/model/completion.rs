//! One-way completion state shared by missions and targets.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Completion state with a single forward edge `Open -> Completed`.
///
/// Persisted as the `completed` integer flag; callers should go through
/// [`Completion::complete`] instead of flipping the flag directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Completion {
    /// Still mutable.
    Open,
    /// Terminal. Frozen fields may no longer change.
    Completed,
}

/// Attempt to traverse the completion edge a second time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlreadyCompleted;

impl Display for AlreadyCompleted {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "already completed")
    }
}

impl Error for AlreadyCompleted {}

impl Completion {
    pub fn is_completed(self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Takes the forward edge. Re-traversal is rejected rather than ignored.
    pub fn complete(self) -> Result<Self, AlreadyCompleted> {
        match self {
            Self::Open => Ok(Self::Completed),
            Self::Completed => Err(AlreadyCompleted),
        }
    }

    pub(crate) fn from_flag(completed: bool) -> Self {
        if completed {
            Self::Completed
        } else {
            Self::Open
        }
    }

    pub(crate) fn as_flag(self) -> i64 {
        match self {
            Self::Open => 0,
            Self::Completed => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AlreadyCompleted, Completion};

    #[test]
    fn open_completes_once() {
        let done = Completion::Open.complete().unwrap();
        assert_eq!(done, Completion::Completed);
        assert_eq!(done.complete(), Err(AlreadyCompleted));
    }

    #[test]
    fn flag_mapping_is_stable() {
        assert_eq!(Completion::from_flag(false), Completion::Open);
        assert_eq!(Completion::from_flag(true), Completion::Completed);
        assert_eq!(Completion::Completed.as_flag(), 1);
    }
}
