//! Peer identity and model-code derivation.
//!
//! Both functions are pure: the same inputs produce the same output on every
//! peer, which is what lets nodes correlate themselves and each other's
//! models without shared storage or coordination.

use flock_types::ModelAdvertisement;
use sha1::{Digest, Sha1};

/// Hex length of a peer id.
const PEER_ID_LEN: usize = 12;
/// Hex length of a model code.
const CODE_LEN: usize = 7;

/// Derive a stable peer id from a node's public URL.
///
/// The URL is lowercased and stripped of trailing slashes before hashing, so
/// `http://Node-A:3000/` and `http://node-a:3000` identify the same peer.
/// Stable across restarts as long as the public URL is stable.
pub fn peer_id(public_url: &str) -> String {
    let digest = Sha1::digest(normalize_url(public_url).as_bytes());
    hex_prefix(&digest, PEER_ID_LEN)
}

/// Derive the 7-hex code correlating "the same logical model" across peers.
///
/// Prefers the torrent info-hash prefix when present; otherwise hashes the
/// repo/file identity.  Two peers holding files that resolve to the same
/// info-hash or `repo_id` + `file_name` compute the same code independently.
pub fn model_code(ad: &ModelAdvertisement) -> String {
    if let Some(hash) = ad.info_hash.as_deref() {
        let hash = hash.trim();
        if hash.len() >= CODE_LEN {
            return hash[..CODE_LEN].to_lowercase();
        }
    }

    let key = match (ad.repo_id.as_deref(), ad.file_name.as_deref()) {
        (Some(repo), Some(file)) => format!("{repo}::{file}"),
        (Some(repo), None) => format!("{repo}::{}", ad.model_id),
        _ => ad.model_id.clone(),
    };

    let digest = Sha1::digest(key.as_bytes());
    hex_prefix(&digest, CODE_LEN)
}

/// `true` when two URLs identify the same peer.
pub fn same_peer(a: &str, b: &str) -> bool {
    normalize_url(a) == normalize_url(b)
}

fn normalize_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_lowercase()
}

fn hex_prefix(bytes: &[u8], len: usize) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(len + 1);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
        if out.len() >= len {
            break;
        }
    }
    out.truncate(len);
    out
}

// ── Tests ──────────────────────────────────────────────────────────────────────
