//! Harness run state.

/// Where the harness is in a run. States only move forward; once
/// `Summarizing` is reached no earlier state is entered again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Created, no login attempted yet
    NotAuthenticated,
    /// Login succeeded, session available
    Authenticated,
    /// Building the payload for the case at this index
    Generating(usize),
    /// Uploading the payload for the case at this index
    Submitting(usize),
    /// Result for the case at this index appended
    Recorded(usize),
    /// Computing aggregate statistics
    Summarizing,
    /// Login rejected or unreachable; terminal
    AuthFailed,
    /// All cases processed; terminal
    Done,
}

impl RunState {
    /// Whether no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::AuthFailed | Self::Done)
    }

    /// Whether moving from `self` to `next` is a legal step.
    pub fn can_advance_to(&self, next: RunState) -> bool {
        use RunState::*;
        match (*self, next) {
            (NotAuthenticated, Authenticated | AuthFailed) => true,
            (Authenticated, Generating(0) | Summarizing) => true,
            (Generating(a), Submitting(b)) => a == b,
            (Submitting(a), Recorded(b)) => a == b,
            (Recorded(a), Generating(b)) => b == a + 1,
            (Recorded(_), Summarizing) => true,
            (Summarizing, Done) => true,
            _ => false,
        }
    }
}
