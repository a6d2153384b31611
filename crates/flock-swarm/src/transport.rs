//! HTTP transport between peers.
//!
//! Every cross-node call goes through [`PeerTransport`] so routing and
//! beacon logic can be exercised against scripted fakes.  The real
//! implementation is a thin reqwest wrapper; every call carries its own
//! timeout so a stalled remote peer can never block the caller
//! indefinitely.

use std::time::Duration;

use async_trait::async_trait;
use flock_types::{
    AggregatedEntry, ClaimRequest, ClaimResponse, RegisterPayload, RelayChatRequest,
    RelayChatResponse, RelayComposeRequest, RelayComposeResponse,
};
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::SwarmError;

/// Registration push timeout.  Registration is best-effort; a slow registry
/// must not stall the beacon.
const REGISTER_TIMEOUT: Duration = Duration::from_secs(3);
/// Claim / release timeout.
const CLAIM_TIMEOUT: Duration = Duration::from_secs(3);
/// Aggregated-view fetch timeout.
const AGGREGATE_TIMEOUT: Duration = Duration::from_secs(5);
/// Relay chat / compose timeout.  Generation is slow; this bounds one
/// candidate attempt, not the whole routing walk.
const RELAY_TIMEOUT: Duration = Duration::from_secs(45);

#[async_trait]
pub trait PeerTransport: Send + Sync + 'static {
    async fn register(
        &self,
        registry_url: &str,
        payload: &RegisterPayload,
    ) -> Result<(), SwarmError>;

    async fn fetch_aggregated(&self, registry_url: &str)
        -> Result<Vec<AggregatedEntry>, SwarmError>;

    async fn claim(
        &self,
        registry_url: &str,
        req: &ClaimRequest,
    ) -> Result<ClaimResponse, SwarmError>;

    async fn release(
        &self,
        registry_url: &str,
        code: &str,
        peer_id: &str,
    ) -> Result<(), SwarmError>;

    async fn relay_chat(
        &self,
        peer_url: &str,
        req: &RelayChatRequest,
    ) -> Result<RelayChatResponse, SwarmError>;

    async fn relay_compose(
        &self,
        registry_url: &str,
        req: &RelayComposeRequest,
    ) -> Result<RelayComposeResponse, SwarmError>;
}

/// reqwest-backed transport.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        let client = Client::builder()
            .user_agent(concat!("flock/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self { client }
    }

    fn url(base: &str, path: &str) -> String {
        format!("{}{path}", base.trim_end_matches('/'))
    }

    async fn post_json<B: Serialize + Sync, R: DeserializeOwned>(
        &self,
        url: String,
        body: &B,
        timeout: Duration,
    ) -> Result<R, SwarmError> {
        let resp = self
            .client
            .post(url)
            .timeout(timeout)
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SwarmError::Protocol {
                status: status.as_u16(),
            });
        }
        Ok(resp.json().await?)
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PeerTransport for HttpTransport {
    async fn register(
        &self,
        registry_url: &str,
        payload: &RegisterPayload,
    ) -> Result<(), SwarmError> {
        let resp = self
            .client
            .post(Self::url(registry_url, "/swarm/register"))
            .timeout(REGISTER_TIMEOUT)
            .json(payload)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SwarmError::Protocol {
                status: status.as_u16(),
            });
        }
        Ok(())
    }

    async fn fetch_aggregated(
        &self,
        registry_url: &str,
    ) -> Result<Vec<AggregatedEntry>, SwarmError> {
        let resp = self
            .client
            .get(Self::url(registry_url, "/swarm/models"))
            .timeout(AGGREGATE_TIMEOUT)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SwarmError::Protocol {
                status: status.as_u16(),
            });
        }
        Ok(resp.json().await?)
    }

    async fn claim(
        &self,
        registry_url: &str,
        req: &ClaimRequest,
    ) -> Result<ClaimResponse, SwarmError> {
        self.post_json(Self::url(registry_url, "/swarm/claim"), req, CLAIM_TIMEOUT)
            .await
    }

    async fn release(
        &self,
        registry_url: &str,
        code: &str,
        peer_id: &str,
    ) -> Result<(), SwarmError> {
        let resp = self
            .client
            .delete(Self::url(registry_url, "/swarm/claim"))
            .timeout(CLAIM_TIMEOUT)
            .query(&[("code", code), ("peerId", peer_id)])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SwarmError::Protocol {
                status: status.as_u16(),
            });
        }
        Ok(())
    }

    async fn relay_chat(
        &self,
        peer_url: &str,
        req: &RelayChatRequest,
    ) -> Result<RelayChatResponse, SwarmError> {
        self.post_json(Self::url(peer_url, "/swarm/relay/chat"), req, RELAY_TIMEOUT)
            .await
    }

    async fn relay_compose(
        &self,
        registry_url: &str,
        req: &RelayComposeRequest,
    ) -> Result<RelayComposeResponse, SwarmError> {
        self.post_json(
            Self::url(registry_url, "/swarm/relay/compose"),
            req,
            RELAY_TIMEOUT,
        )
        .await
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn url_joins_without_doubled_slash() {
        assert_eq!(
            HttpTransport::url("http://node-a:3000/", "/swarm/models"),
            "http://node-a:3000/swarm/models"
        );
        assert_eq!(
            HttpTransport::url("http://node-a:3000", "/swarm/models"),
            "http://node-a:3000/swarm/models"
        );
    }
}
