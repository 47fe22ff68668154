use parking_lot::Mutex;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::time::Duration;

pub type Amount = u64;

pub const MIN_BID: Amount = 100;
pub const MAX_BID: Amount = 3000;

/// Identifier handed out by the auctioneer on registration
///
/// Opaque to us; never empty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BidderId(String);

impl BidderId {
    /// Returns `None` for an empty id, which the auctioneer should never assign.
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.is_empty() {
            None
        } else {
            Some(Self(id))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BidderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who we are, as far as the auctioneer is concerned
///
/// Only obtainable through a successful registration, so the bid
/// endpoint can't ever answer without an assigned id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BidderIdentity {
    pub name: String,
    pub id: BidderId,
}

/// Artificial latency applied to every bid request
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ResponseDelay(Duration);

impl ResponseDelay {
    /// Anything above this is allowed, but probably not what the operator wanted.
    pub const ABNORMAL_THRESHOLD: Duration = Duration::from_millis(500);

    pub fn from_millis(millis: u64) -> Self {
        Self(Duration::from_millis(millis))
    }

    pub fn as_duration(self) -> Duration {
        self.0
    }

    pub fn is_abnormal(self) -> bool {
        self.0 > Self::ABNORMAL_THRESHOLD
    }

    /// Wire representation expected by the auctioneer: integer nanoseconds
    pub fn as_nanos(self) -> u64 {
        u64::try_from(self.0.as_nanos()).unwrap_or(u64::MAX)
    }
}

/// Inbound bid request
///
/// Every field is optional and none of them affects the bid we place.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct BidRequest {
    pub auction_id: Option<String>,
    pub request_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BidResponse {
    pub bidder_id: BidderId,
    pub amount: Amount,
}

/// Source of bid amounts
///
/// Seeded once and shared between all requests.
pub struct BidGenerator {
    rng: Mutex<StdRng>,
    range: RangeInclusive<Amount>,
}

impl BidGenerator {
    pub fn from_entropy() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Reproducible sequence of amounts, for tests
    pub fn from_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            rng: Mutex::new(rng),
            range: MIN_BID..=MAX_BID,
        }
    }

    pub fn next_amount(&self) -> Amount {
        self.rng.lock().gen_range(self.range.clone())
    }
}

impl fmt::Debug for BidGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BidGenerator")
            .field("range", &self.range)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_stay_in_range_and_reach_both_bounds() {
        let generator = BidGenerator::from_seed(7);
        let mut seen_min = false;
        let mut seen_max = false;

        for _ in 0..100_000 {
            let amount = generator.next_amount();
            assert!((MIN_BID..=MAX_BID).contains(&amount), "{amount} out of range");
            seen_min |= amount == MIN_BID;
            seen_max |= amount == MAX_BID;
        }

        assert!(seen_min, "never drew {MIN_BID}");
        assert!(seen_max, "never drew {MAX_BID}");
    }

    #[test]
    fn same_seed_same_amounts() {
        let a = BidGenerator::from_seed(42);
        let b = BidGenerator::from_seed(42);
        for _ in 0..100 {
            assert_eq!(a.next_amount(), b.next_amount());
        }
    }

    #[test]
    fn empty_bidder_id_is_rejected() {
        assert_eq!(BidderId::new(""), None);
        assert_eq!(
            BidderId::new("bidder-42").map(|id| id.to_string()),
            Some("bidder-42".to_owned())
        );
    }

    #[test]
    fn delay_advisory_threshold() {
        assert!(!ResponseDelay::from_millis(0).is_abnormal());
        assert!(!ResponseDelay::from_millis(500).is_abnormal());
        assert!(ResponseDelay::from_millis(501).is_abnormal());
    }

    #[test]
    fn delay_goes_on_the_wire_as_nanos() {
        assert_eq!(ResponseDelay::from_millis(250).as_nanos(), 250_000_000);
        assert_eq!(ResponseDelay::default().as_nanos(), 0);
    }
}
