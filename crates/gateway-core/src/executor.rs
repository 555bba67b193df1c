//! Speculative execution against discardable state.
//!
//! The gateway needs to know whether the wrapped transfer module would
//! accept a packet without letting the module's side effects become
//! visible. [`SpeculativeState`] is the seam: any state that can produce a
//! checkpoint and restore from it can be executed against speculatively.
//!
//! Two execution modes are provided:
//! - [`try_execute`]: run and always discard. The gateway uses this for
//!   packet interception, where even a successful handler's effects are
//!   deferred until finality.
//! - [`try_commit`]: promote on success, discard on failure. The general
//!   transactional-overlay contract for consumers that do want the effects.

/// State that supports checkpoint/restore.
pub trait SpeculativeState {
    /// Snapshot type. Restoring it returns the state to the snapshot point.
    type Checkpoint;

    /// Capture the current state.
    fn checkpoint(&self) -> Self::Checkpoint;

    /// Return to a previously captured state.
    fn restore(&mut self, checkpoint: Self::Checkpoint);
}

/// Run `f` against `state` and discard all of its effects, returning `f`'s
/// result untouched.
pub fn try_execute<S, F, R>(state: &mut S, f: F) -> R
where
    S: SpeculativeState,
    F: FnOnce(&mut S) -> R,
{
    let checkpoint = state.checkpoint();
    let result = f(state);
    state.restore(checkpoint);
    result
}

/// Run `f` against `state`, keeping its effects on `Ok` and discarding them
/// on `Err`.
pub fn try_commit<S, F, R, E>(state: &mut S, f: F) -> Result<R, E>
where
    S: SpeculativeState,
    F: FnOnce(&mut S) -> Result<R, E>,
{
    let checkpoint = state.checkpoint();
    match f(state) {
        Ok(value) => Ok(value),
        Err(e) => {
            state.restore(checkpoint);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        value: u64,
    }

    impl SpeculativeState for Counter {
        type Checkpoint = u64;

        fn checkpoint(&self) -> u64 {
            self.value
        }

        fn restore(&mut self, checkpoint: u64) {
            self.value = checkpoint;
        }
    }

    #[test]
    fn test_try_execute_discards_even_on_success() {
        let mut counter = Counter { value: 5 };
        let observed = try_execute(&mut counter, |c| {
            c.value += 10;
            c.value
        });
        assert_eq!(observed, 15);
        assert_eq!(counter.value, 5);
    }

    #[test]
    fn test_try_commit_promotes_on_success() {
        let mut counter = Counter { value: 5 };
        let result: Result<(), &str> = try_commit(&mut counter, |c| {
            c.value += 10;
            Ok(())
        });
        assert!(result.is_ok());
        assert_eq!(counter.value, 15);
    }

    #[test]
    fn test_try_commit_discards_on_failure() {
        let mut counter = Counter { value: 5 };
        let result: Result<(), &str> = try_commit(&mut counter, |c| {
            c.value += 10;
            Err("rejected")
        });
        assert_eq!(result.unwrap_err(), "rejected");
        assert_eq!(counter.value, 5);
    }
}
