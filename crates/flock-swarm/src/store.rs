//! Node-local storage seams for the swarm tables.
//!
//! The claim table and the peer-registration table are plain maps behind
//! small traits, so an embedder can swap the process-local implementations
//! for an external cache without touching lease or routing logic.  The
//! traits are synchronous on purpose: node-local state is only touched
//! between awaits, so there is nothing to suspend on.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use flock_types::{RegisterPayload, ServeClaim};

// ── Claims ────────────────────────────────────────────────────────────────────

/// Storage for serve claims, keyed by model code.
///
/// Implementations store records verbatim; TTL interpretation is the
/// [`crate::lease::LeaseManager`]'s job.
pub trait ClaimStore: Send + Sync + 'static {
    fn get(&self, code: &str) -> Option<ServeClaim>;
    fn put(&self, claim: ServeClaim);
    fn remove(&self, code: &str);
}

/// Process-local claim table.
#[derive(Debug, Default)]
pub struct MemoryClaimStore {
    claims: Mutex<HashMap<String, ServeClaim>>,
}

impl MemoryClaimStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClaimStore for MemoryClaimStore {
    fn get(&self, code: &str) -> Option<ServeClaim> {
        self.claims.lock().ok().and_then(|m| m.get(code).cloned())
    }

    fn put(&self, claim: ServeClaim) {
        if let Ok(mut m) = self.claims.lock() {
            m.insert(claim.code.clone(), claim);
        }
    }

    fn remove(&self, code: &str) {
        if let Ok(mut m) = self.claims.lock() {
            m.remove(code);
        }
    }
}

// ── Peer registrations ────────────────────────────────────────────────────────

/// One peer's most recent registration, stamped on arrival.
#[derive(Debug, Clone)]
pub struct PeerRecord {
    pub payload: RegisterPayload,
    pub last_seen: DateTime<Utc>,
}

/// Storage for peer registrations, keyed by peer id.
///
/// Each registration overwrites the previous one wholesale; absence of a
/// fresh record is the deletion signal, so there is no remove operation.
pub trait PeerStore: Send + Sync + 'static {
    fn upsert(&self, record: PeerRecord);
    fn snapshot(&self) -> Vec<PeerRecord>;
}

/// Process-local peer table.
#[derive(Debug, Default)]
pub struct MemoryPeerStore {
    peers: Mutex<HashMap<String, PeerRecord>>,
}

impl MemoryPeerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PeerStore for MemoryPeerStore {
    fn upsert(&self, record: PeerRecord) {
        if let Ok(mut m) = self.peers.lock() {
            m.insert(record.payload.peer_id.clone(), record);
        }
    }

    fn snapshot(&self) -> Vec<PeerRecord> {
        self.peers
            .lock()
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::Utc;

    fn payload(peer_id: &str) -> RegisterPayload {
        RegisterPayload {
            peer_id: peer_id.into(),
            public_url: format!("http://{peer_id}:3000"),
            version: "0.1.0".into(),
            models: vec![],
        }
    }

    #[test]
    fn claim_store_roundtrip() {
        let store = MemoryClaimStore::new();
        assert!(store.get("c17a9f2").is_none());

        store.put(ServeClaim {
            code: "c17a9f2".into(),
            owner_peer_id: "aaa".into(),
            expires_at: Utc::now(),
        });
        assert_eq!(store.get("c17a9f2").unwrap().owner_peer_id, "aaa");

        store.remove("c17a9f2");
        assert!(store.get("c17a9f2").is_none());
    }

    #[test]
    fn peer_store_overwrites_by_peer_id() {
        let store = MemoryPeerStore::new();
        store.upsert(PeerRecord {
            payload: payload("aaa"),
            last_seen: Utc::now(),
        });
        store.upsert(PeerRecord {
            payload: payload("aaa"),
            last_seen: Utc::now(),
        });
        assert_eq!(store.snapshot().len(), 1);
    }
}
