use clap::Parser;
use reqwest::Url;

use crate::{api::entsoe, prelude::*};

#[derive(Parser)]
pub struct EntsoeArgs {
    #[clap(long = "entsoe-api-key", env = "ENTSOE_API_KEY", hide_env_values = true)]
    api_key: String,

    #[clap(
        long = "entsoe-api-url",
        env = "ENTSOE_API_URL",
        default_value = "https://web-api.tp.entsoe.eu/api"
    )]
    url: Url,

    /// EIC code of the bidding zone.
    #[clap(long = "entsoe-bidding-zone", env = "ENTSOE_BIDDING_ZONE", default_value = "10YFI-1--------U")]
    bidding_zone: String,
}

impl EntsoeArgs {
    pub fn new_api(self) -> Result<entsoe::Api> {
        entsoe::Api::try_new(self.url, self.api_key, self.bidding_zone)
    }
}
