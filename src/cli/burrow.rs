use chrono::Local;
use clap::{Parser, Subcommand};
use itertools::Itertools;

use crate::{
    cli::{control::PricingArgs, db::DbArgs, device::DeviceArgs},
    core::{monitor::PriceLookup, quarter},
    device::{DeviceId, Pin},
    prelude::*,
};

#[derive(Parser)]
pub struct BurrowArgs {
    #[command(subcommand)]
    command: BurrowCommand,
}

impl BurrowArgs {
    pub async fn run(self) -> Result {
        match self.command {
            BurrowCommand::Ping(args) => args.run().await,
            BurrowCommand::Pin(args) => args.run().await,
            BurrowCommand::Price(args) => args.run().await,
        }
    }
}

#[derive(Subcommand)]
enum BurrowCommand {
    /// Open and verify the devices.
    Ping(BurrowPingArgs),

    /// Switch a single pin, regardless of its last known state.
    Pin(BurrowPinArgs),

    /// Show the stored price of the current quarter hour.
    Price(BurrowPriceArgs),
}

#[derive(Parser)]
struct BurrowPingArgs {
    #[clap(flatten)]
    devices: DeviceArgs,
}

impl BurrowPingArgs {
    async fn run(self) -> Result {
        let mut controller = self.devices.connect().await?;
        info!(device_ids = controller.device_ids().join(", "), "gotcha");
        controller.shutdown().await?;
        Ok(())
    }
}

#[derive(Parser)]
struct BurrowPinArgs {
    #[clap(flatten)]
    devices: DeviceArgs,

    #[clap(long)]
    device: DeviceId,

    /// Pin number, 1 to 8.
    #[clap(long)]
    pin: u8,

    #[clap(long, conflicts_with = "off", required_unless_present = "off")]
    on: bool,

    #[clap(long)]
    off: bool,
}

impl BurrowPinArgs {
    #[instrument(skip_all, fields(device = %self.device, pin = self.pin))]
    async fn run(self) -> Result {
        let pin = Pin::try_from(self.pin)?;
        let mut controller = self.devices.connect().await?;
        controller.write_pin(self.device, pin, self.on).await?;
        info!(is_on = controller.get_pin(self.device, pin)?, "done");
        Ok(())
    }
}

#[derive(Parser)]
struct BurrowPriceArgs {
    #[clap(flatten)]
    db: DbArgs,

    #[clap(flatten)]
    pricing: PricingArgs,
}

impl BurrowPriceArgs {
    async fn run(self) -> Result {
        let timestamp = quarter::floor(Local::now());
        match PriceLookup::at(&self.db.open()?, timestamp).await {
            PriceLookup::Found(record) => {
                let price = record.price.to_cents_per_kwh(self.pricing.vat).round();
                let action = self.pricing.policy().decide(price, false);
                info!(%timestamp, wholesale = %record.price, %price, ?action, "gotcha");
                Ok(())
            }
            PriceLookup::NotFound => {
                warn!(%timestamp, "no price stored");
                Ok(())
            }
            PriceLookup::Failed(error) => Err(error).context("failed to look up the price"),
        }
    }
}
