//! Registry aggregator.
//!
//! Turns many peers' raw registrations into the queryable, code-grouped
//! aggregated view.  The view is derived, recomputed on every query from
//! the currently-fresh registrations, never persisted.  A peer whose last
//! registration is older than the staleness window simply disappears from
//! the view; there is no explicit eviction.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use flock_types::{AggregatedEntry, AggregatedExample, RegisterPayload};
use tracing::debug;

use crate::clock::Clock;
use crate::identity::model_code;
use crate::store::{PeerRecord, PeerStore};

pub struct Registry {
    peers: Arc<dyn PeerStore>,
    clock: Arc<dyn Clock>,
    staleness: chrono::Duration,
}

impl Registry {
    pub fn new(peers: Arc<dyn PeerStore>, clock: Arc<dyn Clock>, staleness: Duration) -> Self {
        Self {
            peers,
            clock,
            staleness: chrono::Duration::from_std(staleness)
                .unwrap_or_else(|_| chrono::Duration::seconds(90)),
        }
    }

    /// Record one peer's registration, overwriting its previous snapshot.
    pub fn record(&self, payload: RegisterPayload) {
        debug!(
            peer = %payload.peer_id,
            url = %payload.public_url,
            models = payload.models.len(),
            "peer registration"
        );
        self.peers.upsert(PeerRecord {
            last_seen: self.clock.now(),
            payload,
        });
    }

    /// Compute the aggregated, code-grouped view over all fresh peers.
    ///
    /// Entry and example ordering is unspecified; routing priority is the
    /// router's responsibility.
    pub fn aggregate(&self) -> Vec<AggregatedEntry> {
        let horizon = self.clock.now() - self.staleness;

        let mut entries: HashMap<String, AggregatedEntry> = HashMap::new();
        let mut contributors: HashMap<String, HashSet<String>> = HashMap::new();

        for record in self.peers.snapshot() {
            if record.last_seen < horizon {
                continue;
            }
            let peer = &record.payload;
            for ad in &peer.models {
                let code = model_code(ad);

                let entry = entries.entry(code.clone()).or_insert_with(|| AggregatedEntry {
                    code: code.clone(),
                    name: ad.name.clone(),
                    nodes: 0,
                    total_seeders: 0,
                    peers: 0,
                    examples: Vec::new(),
                });
                if entry.name.is_empty() {
                    entry.name = ad.name.clone();
                }
                entry.total_seeders += ad.seeders;
                entry.peers += ad.peers;
                entry.examples.push(AggregatedExample {
                    model_id: ad.model_id.clone(),
                    public_url: peer.public_url.clone(),
                    status: ad.status,
                    seeders: ad.seeders,
                    capabilities: ad.capabilities.clone(),
                });

                contributors
                    .entry(code.clone())
                    .or_default()
                    .insert(peer.peer_id.clone());
            }
        }

        for (code, peers) in contributors {
            if let Some(entry) = entries.get_mut(&code) {
                entry.nodes = peers.len() as u32;
            }
        }

        entries.into_values().collect()
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
