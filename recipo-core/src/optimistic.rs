//! Optimistic state with server-authoritative reconciliation.
//!
//! An [`Optimistic`] value shows a speculative result the moment the user acts,
//! while the mutation that makes it durable is still in flight. Each
//! [`apply`](Optimistic::apply) bumps a sequence number; only the response
//! carrying the latest sequence may touch state. Older responses resolve to
//! [`Reconciled::Stale`] and are dropped, whatever order they arrive in.
//!
//! The type is synchronous and owns no I/O: the caller dispatches the gateway
//! call described by the returned [`Dispatch`] and feeds its outcome back to
//! [`resolve`](Optimistic::resolve).

/// A value with a confirmed baseline and an optional in-flight speculation.
#[derive(Debug, Clone)]
pub struct Optimistic<T> {
    confirmed: T,
    speculative: Option<T>,
    latest_seq: u64,
}

/// The intent produced by [`Optimistic::apply`]: the value to persist and the
/// sequence number its response must carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch<T> {
    pub seq: u64,
    pub value: T,
}

/// What a response did to the state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciled<T, E> {
    /// The latest mutation succeeded; the value is now the confirmed baseline.
    Confirmed(T),
    /// The latest mutation failed; the displayed value fell back to `restored`.
    RolledBack { restored: T, error: E },
    /// A superseded (or already settled) response; state is unchanged.
    Stale,
}

impl<T: Clone> Optimistic<T> {
    pub fn new(confirmed: T) -> Self {
        Self { confirmed, speculative: None, latest_seq: 0 }
    }

    /// The value to display: the speculation while a mutation is pending,
    /// otherwise the confirmed baseline.
    pub fn value(&self) -> &T {
        self.speculative.as_ref().unwrap_or(&self.confirmed)
    }

    /// The last value known to match the server.
    pub fn confirmed(&self) -> &T {
        &self.confirmed
    }

    pub fn is_pending(&self) -> bool {
        self.speculative.is_some()
    }

    pub fn latest_seq(&self) -> u64 {
        self.latest_seq
    }

    /// Applies `transform` to the displayed value and makes the result the new
    /// speculation.
    ///
    /// Pending intents stack: the transform sees the previous speculation, so
    /// flipping a boolean twice displays the original value again. The returned
    /// [`Dispatch`] supersedes every earlier one.
    pub fn apply(&mut self, transform: impl FnOnce(&T) -> T) -> Dispatch<T> {
        let next = transform(self.value());
        self.latest_seq += 1;
        self.speculative = Some(next.clone());
        tracing::debug!(seq = self.latest_seq, "optimistic intent dispatched");
        Dispatch { seq: self.latest_seq, value: next }
    }

    /// Feeds the outcome of the gateway call tagged `seq` back into the state.
    ///
    /// Only the latest dispatched sequence counts. On success the server's value
    /// becomes the confirmed baseline; on failure the speculation is dropped and
    /// the baseline from before the pending run is displayed again.
    pub fn resolve<E>(&mut self, seq: u64, outcome: Result<T, E>) -> Reconciled<T, E> {
        if seq != self.latest_seq || self.speculative.is_none() {
            tracing::debug!(seq, latest = self.latest_seq, "stale response ignored");
            return Reconciled::Stale;
        }
        self.speculative = None;
        match outcome {
            Ok(value) => {
                self.confirmed = value.clone();
                Reconciled::Confirmed(value)
            }
            Err(error) => {
                tracing::warn!(seq, "mutation failed; optimistic value rolled back");
                Reconciled::RolledBack { restored: self.confirmed.clone(), error }
            }
        }
    }

    /// Replaces the baseline with freshly loaded server state.
    ///
    /// Any in-flight response becomes stale.
    pub fn reset(&mut self, confirmed: T) {
        self.confirmed = confirmed;
        self.speculative = None;
        self.latest_seq += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flip(v: &bool) -> bool {
        !v
    }

    #[test]
    fn apply_is_visible_immediately() {
        let mut liked = Optimistic::new(false);
        let d = liked.apply(flip);

        assert_eq!(d, Dispatch { seq: 1, value: true });
        assert!(*liked.value());
        assert!(!*liked.confirmed());
        assert!(liked.is_pending());
    }

    #[test]
    fn success_promotes_server_value() {
        let mut liked = Optimistic::new(false);
        let d = liked.apply(flip);

        let r = liked.resolve::<()>(d.seq, Ok(true));
        assert_eq!(r, Reconciled::Confirmed(true));
        assert!(*liked.confirmed());
        assert!(!liked.is_pending());
    }

    #[test]
    fn server_value_wins_over_speculation() {
        let mut count = Optimistic::new(10u32);
        let d = count.apply(|c| c + 1);

        count.resolve::<()>(d.seq, Ok(12));
        assert_eq!(*count.value(), 12);
    }

    #[test]
    fn failure_restores_value_before_first_toggle() {
        let mut liked = Optimistic::new(false);
        let a = liked.apply(flip);
        let b = liked.apply(flip);
        let c = liked.apply(flip);
        assert!(*liked.value());

        // Earlier calls succeed but are superseded; the last one fails.
        assert_eq!(liked.resolve::<&str>(a.seq, Ok(true)), Reconciled::Stale);
        assert_eq!(liked.resolve::<&str>(b.seq, Ok(false)), Reconciled::Stale);
        let r = liked.resolve(c.seq, Err("offline"));

        assert_eq!(r, Reconciled::RolledBack { restored: false, error: "offline" });
        assert!(!*liked.value());
    }

    #[test]
    fn double_flip_settles_on_original_in_either_order() {
        for reversed in [false, true] {
            let mut liked = Optimistic::new(true);
            let a = liked.apply(flip);
            let b = liked.apply(flip);
            assert!(*liked.value(), "flip, flip displays the original");

            if reversed {
                liked.resolve::<()>(b.seq, Ok(b.value));
                liked.resolve::<()>(a.seq, Ok(a.value));
            } else {
                liked.resolve::<()>(a.seq, Ok(a.value));
                liked.resolve::<()>(b.seq, Ok(b.value));
            }

            assert!(*liked.confirmed());
            assert!(*liked.value());
            assert!(!liked.is_pending());
        }
    }

    #[test]
    fn late_response_cannot_clobber_newer_state() {
        let mut rating = Optimistic::new(0u8);
        let a = rating.apply(|_| 3);
        let b = rating.apply(|_| 5);

        assert_eq!(rating.resolve::<()>(b.seq, Ok(5)), Reconciled::Confirmed(5));
        assert_eq!(rating.resolve::<()>(a.seq, Ok(3)), Reconciled::Stale);
        assert_eq!(*rating.value(), 5);
    }

    #[test]
    fn duplicate_response_is_stale() {
        let mut liked = Optimistic::new(false);
        let d = liked.apply(flip);
        liked.resolve::<()>(d.seq, Ok(true));

        assert_eq!(liked.resolve::<()>(d.seq, Ok(false)), Reconciled::Stale);
        assert!(*liked.value());
    }

    #[test]
    fn reset_invalidates_in_flight_responses() {
        let mut liked = Optimistic::new(false);
        let d = liked.apply(flip);
        liked.reset(true);

        assert_eq!(liked.resolve::<()>(d.seq, Ok(false)), Reconciled::Stale);
        assert!(*liked.value());
    }
}
