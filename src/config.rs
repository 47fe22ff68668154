use crate::bidder::ResponseDelay;
use crate::service::auctioneer::RetryPolicy;
use clap::Parser;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use thiserror::Error;

/// Command line of the bidder
#[derive(Parser, Debug, Clone)]
#[command(name = "bidder", about = "Toy auction bidder answering with random bids")]
pub struct Args {
    /// Name we register under
    #[arg(long, default_value = "Batman")]
    pub name: String,

    /// Port in which the bidder client is to run
    #[arg(long, default_value_t = 0)]
    pub port: u16,

    /// Delay (in ms) before the bidder responds to an auction request
    #[arg(long, default_value_t = 0)]
    pub delay: u64,

    /// Base url of the auctioneer service
    #[arg(long, env = "AUCTIONEER_HOST", default_value = "http://localhost:8080")]
    pub auctioneer_host: String,

    /// Host under which the auctioneer can reach this bidder
    #[arg(long, env = "BIDDER_HOST", default_value = "localhost")]
    pub bidder_host: String,

    /// Address to bind the http server to
    #[arg(long, env = "BIDDER_LISTEN_IP", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub listen_ip: IpAddr,

    /// Timeout (in ms) of the registration call
    #[arg(long, default_value_t = 5000)]
    pub registration_timeout_ms: u64,

    /// How many times to try registering before giving up
    #[arg(long, default_value_t = 1)]
    pub registration_attempts: u32,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid port or port required")]
    MissingPort,
    #[error("registration attempts must be at least 1")]
    InvalidAttempts,
    #[error("registration timeout must be greater than zero")]
    InvalidTimeout,
}

/// Validated configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub name: String,
    pub port: u16,
    pub delay: ResponseDelay,
    pub auctioneer_host: String,
    pub bidder_host: String,
    pub listen_ip: IpAddr,
    pub registration_timeout: Duration,
    pub registration_retry: RetryPolicy,
}

impl Config {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.listen_ip, self.port)
    }

    /// The `host:port` the auctioneer should send bid requests to
    pub fn advertised_host(&self) -> String {
        format!("{}:{}", self.bidder_host, self.port)
    }
}

impl TryFrom<Args> for Config {
    type Error = ConfigError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        if args.port == 0 {
            return Err(ConfigError::MissingPort);
        }
        if args.registration_attempts == 0 {
            return Err(ConfigError::InvalidAttempts);
        }
        if args.registration_timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout);
        }

        Ok(Self {
            name: args.name,
            port: args.port,
            delay: ResponseDelay::from_millis(args.delay),
            auctioneer_host: args.auctioneer_host,
            bidder_host: args.bidder_host,
            listen_ip: args.listen_ip,
            registration_timeout: Duration::from_millis(args.registration_timeout_ms),
            registration_retry: RetryPolicy {
                attempts: args.registration_attempts,
                ..RetryPolicy::default()
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(cmdline: &[&str]) -> Args {
        Args::parse_from(std::iter::once("bidder").chain(cmdline.iter().copied()))
    }

    #[test]
    fn port_is_required() {
        assert_eq!(
            Config::try_from(parse(&[])).map(|_| ()),
            Err(ConfigError::MissingPort)
        );
        assert_eq!(
            Config::try_from(parse(&["--port", "0"])).map(|_| ()),
            Err(ConfigError::MissingPort)
        );
    }

    #[test]
    fn defaults() -> anyhow::Result<()> {
        let config = Config::try_from(parse(&["--port", "9001"]))?;
        assert_eq!(config.name, "Batman");
        assert_eq!(config.delay, ResponseDelay::default());
        assert_eq!(config.registration_retry.attempts, 1);
        assert_eq!(config.registration_timeout, Duration::from_secs(5));
        assert_eq!(config.listen_addr(), "0.0.0.0:9001".parse::<SocketAddr>()?);
        Ok(())
    }

    #[test]
    fn advertised_host_uses_bidder_host_and_port() -> anyhow::Result<()> {
        let config = Config::try_from(parse(&[
            "--port",
            "9001",
            "--bidder-host",
            "bidder-1.internal",
            "--delay",
            "750",
        ]))?;
        assert_eq!(config.advertised_host(), "bidder-1.internal:9001");
        assert!(config.delay.is_abnormal());
        Ok(())
    }

    #[test]
    fn registration_knobs_are_validated() {
        assert_eq!(
            Config::try_from(parse(&["--port", "1", "--registration-attempts", "0"])).map(|_| ()),
            Err(ConfigError::InvalidAttempts)
        );
        assert_eq!(
            Config::try_from(parse(&["--port", "1", "--registration-timeout-ms", "0"]))
                .map(|_| ()),
            Err(ConfigError::InvalidTimeout)
        );
    }
}
