//! Request / response types owned by the HTTP surface.
//!
//! Swarm wire types live in `flock-types`; the structures here are the
//! server-local shapes (OpenAI-compatible `/v1` bodies, admin bodies, query
//! parameters).

pub mod admin;
pub mod swarm;
pub mod v1;
