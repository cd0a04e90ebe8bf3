//! Tri-state asynchronously-resolved facts.
//!
//! A [`Fact`] is one piece of identity information whose truth arrives
//! later: not yet known, definitively known, or unknowable (the check
//! failed). Modeling the loading window as a first-class state -- instead
//! of a value plus a `loading` flag -- makes the impossible combinations
//! ("not loading, no value, no error") unrepresentable.

/// One asynchronously-resolved fact.
///
/// Transitions are owned by [`SessionStore`](crate::store::SessionStore);
/// everything else only observes. A settled fact re-enters `Pending`
/// exclusively through a new generation-tagged check (see
/// [`CheckTicket`](crate::store::CheckTicket)) -- there is no silent
/// overwrite mid-flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fact<T> {
    /// A check is in flight (or none has been started yet).
    Pending,
    /// The check concluded with a definitive answer.
    Resolved(T),
    /// The check could not complete. Consumers treat this fail-closed.
    Failed,
}

impl<T> Fact<T> {
    /// Still waiting on a check.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Settled with a value.
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    /// Settled without a value.
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }

    /// No longer pending, one way or the other.
    pub fn is_settled(&self) -> bool {
        !self.is_pending()
    }

    /// The resolved value, if any.
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Resolved(v) => Some(v),
            Self::Pending | Self::Failed => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn observation_helpers() {
        let pending: Fact<bool> = Fact::Pending;
        assert!(pending.is_pending());
        assert!(!pending.is_settled());
        assert!(pending.value().is_none());

        let resolved = Fact::Resolved(true);
        assert!(resolved.is_resolved());
        assert!(resolved.is_settled());
        assert_eq!(resolved.value(), Some(&true));

        let failed: Fact<bool> = Fact::Failed;
        assert!(failed.is_failed());
        assert!(failed.is_settled());
        assert!(failed.value().is_none());
    }
}
