//! Registration with the auctioneer
//!
//! The auctioneer needs to know about us before it starts sending bid
//! requests our way. We tell it our name, how slow we're going to be,
//! and (through the `Host` header) where to find us; it answers with
//! the id we have to put on every bid.
use std::time::Duration;

use crate::bidder::{BidderId, BidderIdentity, ResponseDelay};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

mod http;
pub use self::http::*;

pub const REGISTER_PATH: &str = "/v1/bidder/register";

#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("can't reach the auctioneer: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("malformed registration response: {0}")]
    Protocol(#[from] serde_json::Error),
    #[error("registration response carried no bidder id")]
    MissingBidderId,
    #[error("auctioneer rejected registration ({status}): {message}")]
    Rejected { status: StatusCode, message: String },
}

impl RegistrationError {
    /// Only network level failures are worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, RegistrationError::Transport(_))
    }
}

/// What we tell the auctioneer about ourselves
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Registration {
    pub name: String,
    pub delay: ResponseDelay,
    /// `host:port` the auctioneer should send bid requests to
    pub advertised_host: String,
}

/// Body of the registration call
///
/// `delay` is in nanoseconds, which is what the auctioneer expects.
#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct RegistrationEnvelope<'a> {
    pub name: &'a str,
    pub delay: u64,
}

impl<'a> From<&'a Registration> for RegistrationEnvelope<'a> {
    fn from(registration: &'a Registration) -> Self {
        Self {
            name: &registration.name,
            delay: registration.delay.as_nanos(),
        }
    }
}

/// `data` part of the auctioneer's answer
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RegisteredBidder {
    pub id: String,
}

#[async_trait]
pub trait AuctioneerClient {
    async fn register(&self, registration: &Registration) -> Result<BidderId, RegistrationError>;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    /// Single attempt, no retry
    fn default() -> Self {
        Self {
            attempts: 1,
            initial_backoff: Duration::from_millis(250),
        }
    }
}

/// Register with the auctioneer, retrying transport failures per `policy`
pub async fn register_bidder(
    client: &(dyn AuctioneerClient + Send + Sync),
    registration: &Registration,
    policy: RetryPolicy,
) -> Result<BidderIdentity, RegistrationError> {
    let mut backoff = policy.initial_backoff;
    let mut attempt = 1;

    loop {
        match client.register(registration).await {
            Ok(id) => {
                info!(name = %registration.name, bidder_id = %id, "registered with auctioneer");
                return Ok(BidderIdentity {
                    name: registration.name.clone(),
                    id,
                });
            }
            Err(e) if e.is_retryable() && attempt < policy.attempts => {
                warn!(attempt, ?backoff, error = %e, "registration failed, retrying");
                tokio::time::sleep(backoff).await;
                backoff *= 2;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
