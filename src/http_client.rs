use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;

// Guild lookups fan out into many log queries on the service side.
const REQUEST_TIMEOUT_SECS: u64 = 120;
const CONNECT_TIMEOUT_SECS: u64 = 5;
const USER_AGENT: &str = concat!("wcl_deaths/", env!("CARGO_PKG_VERSION"));

static SERVICE_CLIENT: OnceCell<Client> = OnceCell::new();

/// Shared client for the analysis service.
///
/// A down service fails fast on connect, while a slow analysis gets the full
/// request timeout.
pub fn service_client() -> Result<&'static Client> {
    SERVICE_CLIENT.get_or_try_init(|| {
        Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("failed to build analysis service client")
    })
}
