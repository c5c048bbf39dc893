use std::time::Duration;

use reqwest::Client;

use crate::prelude::*;

/// Build the HTTP client shared by the API wrappers.
pub fn try_new() -> Result<Client> {
    Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(10))
        .build()
        .context("failed to build the HTTP client")
}
