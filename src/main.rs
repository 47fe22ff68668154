mod bidder;
mod config;
mod envelope;
mod service;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::bidder::BidGenerator;
use crate::config::Config;
use crate::service::{
    auctioneer::{register_bidder, HttpAuctioneerClient, Registration},
    bid_responder, ServiceControl,
};

fn main() -> Result<()> {
    let args = config::Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::try_from(args)?;
    if config.delay.is_abnormal() {
        warn!(delay = ?config.delay.as_duration(), "delay more than 500ms");
    }

    let runtime = tokio::runtime::Runtime::new()?;
    let svc_ctl = ServiceControl::new();

    ctrlc::set_handler({
        let svc_ctl = svc_ctl.clone();
        move || {
            info!("Stopping bidder...");
            svc_ctl.stop_all();
        }
    })?;

    runtime.block_on(run(config, svc_ctl, BidGenerator::from_entropy()))
}

/// Register with the auctioneer, then serve bids until stopped
///
/// Nothing is bound unless registration succeeded, and a stop request
/// during registration ends the process without ever binding.
async fn run(config: Config, svc_ctl: ServiceControl, generator: BidGenerator) -> Result<()> {
    let client = HttpAuctioneerClient::new(&config.auctioneer_host, config.registration_timeout)?;
    let registration = Registration {
        name: config.name.clone(),
        delay: config.delay,
        advertised_host: config.advertised_host(),
    };

    let identity = tokio::select! {
        biased;
        _ = svc_ctl.stopped() => {
            info!("Stopped before registration completed");
            return Ok(());
        }
        res = register_bidder(&client, &registration, config.registration_retry) => {
            res.context("Failed to register with auctioneer")?
        }
    };

    info!(
        name = %identity.name,
        bidder_id = %identity.id,
        port = config.port,
        delay = ?config.delay.as_duration(),
        "Starting bidder"
    );

    let responder = bid_responder::BidResponder::new_shared(identity, config.delay, generator);
    service::run_http_server(
        bid_responder::router(responder),
        config.listen_addr(),
        svc_ctl,
    )
    .await
}
