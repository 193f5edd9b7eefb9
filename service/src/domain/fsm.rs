//! Finite-state machine definitions of entity statuses.

use std::fmt;

/// Status of an entity advancing along a finite-state machine.
pub trait Transition: Copy + Eq + Sized {
    /// Indicates whether this status is allowed to become the `next` one.
    fn allows(self, next: Self) -> bool;

    /// Advances this status to the `next` one.
    ///
    /// # Errors
    ///
    /// If the transition is not allowed.
    fn advance(self, next: Self) -> Result<Self, InvalidTransition<Self>> {
        if self.allows(next) {
            Ok(next)
        } else {
            Err(InvalidTransition {
                from: self,
                to: next,
            })
        }
    }
}

/// Error of a [`Transition`] that is not allowed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct InvalidTransition<S> {
    /// Status the transition was attempted from.
    pub from: S,

    /// Status the transition was attempted to.
    pub to: S,
}

impl<S: fmt::Display> fmt::Display for InvalidTransition<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot transition from `{}` to `{}`", self.from, self.to)
    }
}
