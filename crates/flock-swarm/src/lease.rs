//! Serve-claim lease manager.
//!
//! Soft mutual exclusion over "who is allowed to actively serve model X
//! right now", without a distributed lock service.  The lease is advisory: a
//! network partition can let two nodes both believe they hold a claim for a
//! short window, which the system accepts in exchange for availability.
//!
//! Expiry is evaluated lazily on read: a record whose `expires_at` has
//! passed is treated as absent, never actively swept.  A crashed owner's
//! lease therefore self-heals after the TTL with no cleanup code.

use std::sync::Arc;

use chrono::Duration;
use flock_types::ServeClaim;
use tracing::debug;

use crate::clock::Clock;
use crate::store::ClaimStore;

/// Result of a claim attempt.
///
/// A denial is normal control flow, not an error: the caller must not start
/// a local server for the code and should route to `owner` instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimOutcome {
    pub granted: bool,
    /// The current owner: the claimant itself on grant, the conflicting
    /// peer on denial.
    pub owner: Option<String>,
}

pub struct LeaseManager {
    store: Arc<dyn ClaimStore>,
    clock: Arc<dyn Clock>,
}

impl LeaseManager {
    pub fn new(store: Arc<dyn ClaimStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Grant, renew, or deny a claim on `code`.
    ///
    /// Grants when no unexpired claim exists or the unexpired claim already
    /// belongs to `peer_id` (renewal).  A denial never mutates state; the
    /// existing claim's expiry is left untouched.
    pub fn claim(&self, code: &str, peer_id: &str, ttl_ms: u64) -> ClaimOutcome {
        let now = self.clock.now();

        if let Some(existing) = self.store.get(code) {
            if existing.expires_at > now && existing.owner_peer_id != peer_id {
                debug!(
                    code,
                    claimant = peer_id,
                    owner = %existing.owner_peer_id,
                    "serve claim denied"
                );
                return ClaimOutcome {
                    granted: false,
                    owner: Some(existing.owner_peer_id),
                };
            }
        }

        let expires_at = now + Duration::milliseconds(ttl_ms as i64);
        self.store.put(ServeClaim {
            code: code.to_owned(),
            owner_peer_id: peer_id.to_owned(),
            expires_at,
        });
        debug!(code, owner = peer_id, ttl_ms, "serve claim granted");

        ClaimOutcome {
            granted: true,
            owner: Some(peer_id.to_owned()),
        }
    }

    /// Release the claim on `code` if `peer_id` is its current owner.
    ///
    /// A release by a non-owner is a no-op; the operation is idempotent
    /// either way.
    pub fn release(&self, code: &str, peer_id: &str) {
        if let Some(existing) = self.store.get(code) {
            if existing.owner_peer_id == peer_id {
                self.store.remove(code);
                debug!(code, owner = peer_id, "serve claim released");
            }
        }
    }

    /// The unexpired owner of `code`, if any.
    pub fn owner(&self, code: &str) -> Option<String> {
        let claim = self.store.get(code)?;
        (claim.expires_at > self.clock.now()).then_some(claim.owner_peer_id)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
