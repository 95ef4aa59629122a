//! The runtime error model (spec §7): GL never returns `Result` at its own
//! API boundary, it records the first error since the last `glGetError`
//! call into a per-context slot. `ErrorState` is that slot; callers in the
//! facade crate translate `GlError` into the matching `GLenum`.

use std::cell::Cell;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GlError {
    #[error("out of memory")]
    OutOfMemory,
    #[error("invalid enum")]
    InvalidEnum,
    #[error("invalid value")]
    InvalidValue,
    #[error("invalid operation")]
    InvalidOperation,
    #[error("invalid framebuffer operation")]
    InvalidFramebufferOperation,
}

/// One error slot per context (spec §7: "first error since the last
/// query wins"). `Cell` rather than `RefCell` since `GlError` is `Copy`
/// and contexts are single-threaded (spec §5).
#[derive(Default)]
pub struct ErrorState {
    first: Cell<Option<GlError>>,
}

impl ErrorState {
    pub fn new() -> ErrorState {
        ErrorState::default()
    }

    /// Records `err` only if no error is already pending, matching GL's
    /// "sticky until queried" semantics.
    pub fn set(&self, err: GlError) {
        if self.first.get().is_none() {
            self.first.set(Some(err));
        }
    }

    /// Takes and clears the pending error, the `glGetError` contract.
    pub fn take(&self) -> Option<GlError> {
        self.first.take()
    }

    pub fn peek(&self) -> Option<GlError> {
        self.first.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_error_wins_until_taken() {
        let state = ErrorState::new();
        state.set(GlError::InvalidValue);
        state.set(GlError::OutOfMemory);
        assert_eq!(state.peek(), Some(GlError::InvalidValue));
        assert_eq!(state.take(), Some(GlError::InvalidValue));
        assert_eq!(state.take(), None);
    }

    #[test]
    fn a_fresh_error_can_be_recorded_after_the_slot_is_cleared() {
        let state = ErrorState::new();
        state.set(GlError::InvalidEnum);
        state.take();
        state.set(GlError::InvalidOperation);
        assert_eq!(state.peek(), Some(GlError::InvalidOperation));
    }
}
