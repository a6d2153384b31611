//! flock-swarm: swarm coordination and federated inference routing.
//!
//! Lets independently-operated nodes cooperate on serving a shared catalog
//! of models without a central database or consensus protocol:
//!
//! - [`identity`] derives stable peer ids and cross-peer model codes.
//! - [`beacon`] keeps the registry's view of this node fresh (best-effort,
//!   never raises into caller code).
//! - [`lease`] provides advisory, TTL-based mutual exclusion over who may
//!   actively serve a given model code.
//! - [`registry`] merges peer registrations into a queryable, code-grouped
//!   aggregated view.
//! - [`router`] answers chat requests remote-first, with retry and graceful
//!   degradation to local execution.
//!
//! All cross-node coordination happens through bounded-timeout HTTP calls
//! behind the [`transport::PeerTransport`] seam; node-local state lives
//! behind the small store traits in [`store`] so process-local maps can be
//! swapped for an external cache without touching routing logic.

pub mod beacon;
pub mod clock;
pub mod error;
pub mod identity;
pub mod lease;
pub mod local;
pub mod registry;
pub mod router;
pub mod store;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use beacon::Beacon;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::SwarmError;
pub use lease::{ClaimOutcome, LeaseManager};
pub use local::{ChatOptions, InferenceEngine, ModelStore};
pub use registry::Registry;
pub use router::{FederatedRouter, RouteRequest, RoutedChat, ServedBy};
pub use store::{ClaimStore, MemoryClaimStore, MemoryPeerStore, PeerRecord, PeerStore};
pub use transport::{HttpTransport, PeerTransport};
