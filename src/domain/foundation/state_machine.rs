//! Transition table trait for lifecycle status enums.

use std::fmt::Debug;

use super::ValidationError;

/// A status enum whose legal moves are a fixed table.
///
/// Implementors supply `valid_transitions`; checking, performing and
/// terminal detection are derived from it.
///
/// ```ignore
/// impl StateMachine for SubscriptionStatus {
///     fn valid_transitions(&self) -> &'static [Self] {
///         match self {
///             Active => &[Active, GracePeriod, Cancelled],
///             GracePeriod => &[Active, Expired, Cancelled],
///             Expired | Cancelled => &[Active],
///         }
///     }
/// }
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + Debug + 'static {
    /// States reachable in one step.
    fn valid_transitions(&self) -> &'static [Self];

    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    /// Returns `target` if the move is legal.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if self.can_transition_to(&target) {
            return Ok(target);
        }
        Err(ValidationError::invalid_format(
            "state_transition",
            format!("Cannot transition from {:?} to {:?}", self, target),
        ))
    }

    /// No outgoing transitions.
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}
