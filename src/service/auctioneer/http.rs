use super::*;
use crate::envelope::Envelope;
use reqwest::header::HOST;
use tracing::debug;

/// Talks to the auctioneer's REST api
#[derive(Clone, Debug)]
pub struct HttpAuctioneerClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpAuctioneerClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RegistrationError> {
        // the `Host` header we send only makes sense on a direct connection
        let http = reqwest::Client::builder()
            .no_proxy()
            .timeout(timeout)
            .build()
            .map_err(RegistrationError::Transport)?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        })
    }

    pub fn register_url(&self) -> String {
        format!("{}{}", self.base_url, REGISTER_PATH)
    }
}

#[async_trait]
impl AuctioneerClient for HttpAuctioneerClient {
    async fn register(&self, registration: &Registration) -> Result<BidderId, RegistrationError> {
        let url = self.register_url();
        debug!(%url, host = %registration.advertised_host, "registering");

        // `Host` is where the auctioneer should call us back, not where we're calling
        let response = self
            .http
            .post(&url)
            .header(HOST, &registration.advertised_host)
            .json(&RegistrationEnvelope::from(registration))
            .send()
            .await
            .map_err(RegistrationError::Transport)?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(RegistrationError::Transport)?;
        let envelope: Envelope<RegisteredBidder> = serde_json::from_slice(&body)?;

        if status.as_u16() > 201 {
            return Err(RegistrationError::Rejected {
                status,
                message: envelope.meta.message,
            });
        }

        envelope
            .data
            .and_then(|data| BidderId::new(data.id))
            .ok_or(RegistrationError::MissingBidderId)
    }
}
