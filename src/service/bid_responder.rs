//! Bid Responder
//!
//! Answers bid requests from the auctioneer. There's no strategy:
//! after sleeping for the configured delay we bid a random amount,
//! whatever the request says.
use std::sync::Arc;

use crate::bidder::{BidGenerator, BidRequest, BidResponse, BidderIdentity, ResponseDelay};
use crate::envelope::Envelope;
use axum::{body::Bytes, extract::State, middleware, routing::post, Json, Router};
use tracing::debug;

use super::middleware::{cors, log_request, recover_panics};

pub const BID_PATH: &str = "/v1/bid";

#[derive(Debug)]
pub struct BidResponder {
    identity: BidderIdentity,
    delay: ResponseDelay,
    generator: BidGenerator,
}

pub type SharedBidResponder = Arc<BidResponder>;

impl BidResponder {
    pub fn new(identity: BidderIdentity, delay: ResponseDelay, generator: BidGenerator) -> Self {
        Self {
            identity,
            delay,
            generator,
        }
    }

    pub fn new_shared(
        identity: BidderIdentity,
        delay: ResponseDelay,
        generator: BidGenerator,
    ) -> SharedBidResponder {
        Arc::new(Self::new(identity, delay, generator))
    }

    /// Wait out the delay, then come up with a bid
    ///
    /// Dropping the future (client went away) cancels the wait.
    pub async fn bid(&self) -> BidResponse {
        tokio::time::sleep(self.delay.as_duration()).await;
        BidResponse {
            bidder_id: self.identity.id.clone(),
            amount: self.generator.next_amount(),
        }
    }
}

async fn handle_bid(
    State(responder): State<SharedBidResponder>,
    body: Bytes,
) -> Json<Envelope<BidResponse>> {
    // not doing anything with the request, other than logging what we got
    let request: Option<BidRequest> = serde_json::from_slice(&body).ok();
    debug!(
        auction_id = ?request.as_ref().and_then(|r| r.auction_id.as_deref()),
        request_id = ?request.as_ref().and_then(|r| r.request_id.as_deref()),
        "bid requested"
    );

    let response = responder.bid().await;
    debug!(amount = response.amount, "bidding");
    Json(Envelope::ok(response))
}

/// Everything the bidder serves, with middleware applied
pub fn router(responder: SharedBidResponder) -> Router {
    Router::new()
        .route(BID_PATH, post(handle_bid))
        .layer(middleware::from_fn(recover_panics))
        .layer(middleware::from_fn(log_request))
        .layer(middleware::from_fn(cors))
        .with_state(responder)
}
