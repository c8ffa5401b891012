//! Single-flight guard for the submit state machines

use parking_lot::Mutex;

/// Message left in the state when a submission's future is dropped mid-flight.
pub const SUBMISSION_CANCELLED: &str = "Submission cancelled";

/// Holds a state cell in its submitting value until [`finish`](Self::finish).
///
/// Dropping the guard without finishing, as happens when the caller's
/// future is cancelled, writes the `cancelled` value instead so the next
/// submission is not refused as busy.
pub(crate) struct Submission<'a, S> {
    state: &'a Mutex<S>,
    cancelled: Option<S>,
}

impl<'a, S: PartialEq> Submission<'a, S> {
    /// `None` when the cell already holds `submitting`.
    pub(crate) fn begin(state: &'a Mutex<S>, submitting: S, cancelled: S) -> Option<Self> {
        let mut current = state.lock();
        if *current == submitting {
            return None;
        }
        *current = submitting;
        drop(current);

        Some(Self {
            state,
            cancelled: Some(cancelled),
        })
    }

    pub(crate) fn finish(mut self, outcome: S) {
        self.cancelled = None;
        *self.state.lock() = outcome;
    }
}

impl<S> Drop for Submission<'_, S> {
    fn drop(&mut self) {
        if let Some(cancelled) = self.cancelled.take() {
            *self.state.lock() = cancelled;
        }
    }
}
