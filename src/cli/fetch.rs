use chrono::{Local, NaiveDate};
use clap::Parser;

use crate::{
    cli::{control::PricingArgs, db::DbArgs, entsoe::EntsoeArgs},
    core::{ingest::refresh, position::feed_day_of},
    prelude::*,
    tables::build_prices_table,
};

#[derive(Parser)]
pub struct FetchArgs {
    /// Feed day, defaults to the one containing the current quarter hour.
    #[clap(long)]
    day: Option<NaiveDate>,

    #[clap(flatten)]
    db: DbArgs,

    #[clap(flatten)]
    entsoe: EntsoeArgs,

    #[clap(flatten)]
    pricing: PricingArgs,
}

impl FetchArgs {
    pub async fn run(self) -> Result {
        let day = self.day.unwrap_or_else(|| feed_day_of(Local::now()));
        let store = self.db.open()?;
        let feed = self.entsoe.new_api()?;
        let refresh = refresh(&feed, &store, day).await?;
        info!(%day, n_inserted = refresh.n_inserted, "saved");
        println!(
            "{}",
            build_prices_table(&refresh.records, self.pricing.vat, self.pricing.policy()),
        );
        Ok(())
    }
}
