use chrono::Utc;
use proof_template_types::data_types::proof_request::{
    NonRevokedInterval, RequestedAttribute, RequestedPredicate,
};

/// Source of the timestamp that non-revocation intervals freeze. Injected so
/// compilations can be replayed against a fixed point in time.
pub trait RevocationClock: Send + Sync {
    fn now(&self) -> u64;
}

/// Wall clock, in whole seconds since the Unix epoch.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl RevocationClock for SystemClock {
    fn now(&self) -> u64 {
        u64::try_from(Utc::now().timestamp()).unwrap_or_default()
    }
}

/// Stamps one attribute group's entries with a shared non-revocation
/// interval.
///
/// The clock is read once at construction, so every entry derived from the
/// group proves non-revocation at the same instant. Groups that do not
/// require the proof get a no-op applicator.
#[derive(Debug)]
pub struct NonRevocationApplicator {
    interval: Option<NonRevokedInterval>,
}

impl NonRevocationApplicator {
    pub fn new(apply_non_revocation: bool, clock: &dyn RevocationClock) -> Self {
        let interval = apply_non_revocation.then(|| NonRevokedInterval::at(clock.now()));
        Self { interval }
    }

    #[must_use]
    pub const fn interval(&self) -> Option<NonRevokedInterval> {
        self.interval
    }

    pub fn apply_to_attribute(&self, attribute: &mut RequestedAttribute) {
        attribute.non_revoked = self.interval;
    }

    pub fn apply_to_predicate(&self, predicate: &mut RequestedPredicate) {
        predicate.non_revoked = self.interval;
    }
}
