// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Rate Governor (component B): a per-peer token bucket. Buckets are
//! created lazily on first arrival and never evicted in this MVP — see
//! the bounded-map open question in the design notes.

use std::num::NonZeroU32;
use std::net::SocketAddr;

use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};

/// Default refill rate in tokens per second.
pub const DEFAULT_RATE: u32 = 10;
/// Default burst capacity.
pub const DEFAULT_BURST: u32 = 10;

/// Process-local, per-peer token bucket map. Governor state is never
/// shared or coordinated across replicas.
pub struct RateGovernor {
    limiter: DefaultKeyedRateLimiter<String>,
}

impl RateGovernor {
    pub fn new(rate_per_second: u32, burst: u32) -> Self {
        let rate = NonZeroU32::new(rate_per_second.max(1)).expect("rate must be nonzero");
        let burst = NonZeroU32::new(burst.max(1)).expect("burst must be nonzero");
        let quota = Quota::per_second(rate).allow_burst(burst);
        Self {
            limiter: RateLimiter::dashmap(quota),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_RATE, DEFAULT_BURST)
    }

    /// `allow(peer) -> bool`. A request with no associated peer (`None`)
    /// is unconditionally allowed — there is no bucket to charge against.
    pub fn allow(&self, peer: Option<&str>) -> bool {
        match peer {
            Some(peer) => self.limiter.check_key(&peer.to_string()).is_ok(),
            None => true,
        }
    }
}

/// Peer identity is the host portion of the connection's remote address;
/// if the address cannot be parsed as a socket address, the whole string
/// is used verbatim.
pub fn peer_key(remote_addr: &str) -> String {
    match remote_addr.parse::<SocketAddr>() {
        Ok(addr) => addr.ip().to_string(),
        Err(_) => remote_addr.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_call_succeeds_second_fails_within_burst() {
        let governor = RateGovernor::new(1, 1);
        assert!(governor.allow(Some("10.0.0.1:1234")));
        assert!(!governor.allow(Some("10.0.0.1:1234")));
    }

    #[test]
    fn distinct_peers_have_independent_buckets() {
        let governor = RateGovernor::new(1, 1);
        assert!(governor.allow(Some("10.0.0.1:1")));
        assert!(governor.allow(Some("10.0.0.2:1")));
    }

    #[test]
    fn unknown_peer_is_unlimited() {
        let governor = RateGovernor::new(1, 1);
        assert!(governor.allow(None));
        assert!(governor.allow(None));
        assert!(governor.allow(None));
    }

    #[test]
    fn peer_key_extracts_host_from_socket_addr() {
        assert_eq!(peer_key("192.168.1.5:50051"), "192.168.1.5");
        assert_eq!(peer_key("not-a-socket-addr"), "not-a-socket-addr");
    }
}
