//! Guard predicates for controlling state transitions.
//!
//! Guards are pure boolean functions over a transition context. The
//! transition table evaluates them in order to pick the next edge.

use std::fmt;
use std::sync::Arc;

/// Pure predicate that determines if a transition can execute.
///
/// Guards are cheap to clone; the predicate itself is shared.
///
/// # Example
///
/// ```rust
/// use toggle_counter::core::{Guard, PinLevel};
///
/// let pressed = Guard::new(|level: &PinLevel| level.is_asserted());
///
/// assert!(pressed.check(&PinLevel::High));
/// assert!(!pressed.check(&PinLevel::Low));
/// ```
pub struct Guard<C> {
    predicate: Arc<dyn Fn(&C) -> bool + Send + Sync>,
}

impl<C> Guard<C> {
    /// Create a guard from a pure predicate function.
    ///
    /// The predicate must be deterministic and thread-safe.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&C) -> bool + Send + Sync + 'static,
    {
        Guard {
            predicate: Arc::new(predicate),
        }
    }

    /// A guard that always passes.
    pub fn always() -> Self {
        Guard::new(|_| true)
    }

    /// Check if the guard allows a transition in this context.
    pub fn check(&self, context: &C) -> bool {
        (self.predicate)(context)
    }
}

impl<C> Clone for Guard<C> {
    fn clone(&self) -> Self {
        Self {
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<C> fmt::Debug for Guard<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Guard")
    }
}
