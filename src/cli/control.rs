use chrono::NaiveTime;
use clap::Parser;

use crate::{
    core::{monitor::Config, policy::ChargePolicy},
    device::DeviceId,
    quantity::{percent::Percent, price::KilowattHourCents},
};

#[derive(Copy, Clone, Parser)]
pub struct PricingArgs {
    #[clap(long = "vat-percent", env = "VAT_PERCENT", default_value = "25.5")]
    pub vat: Percent,

    /// Consumer price, VAT included, below which the charging device is switched on.
    #[clap(long = "charge-threshold-cents", env = "CHARGE_THRESHOLD_CENTS", default_value = "8.0")]
    pub charge_threshold: KilowattHourCents,
}

impl PricingArgs {
    pub const fn policy(self) -> ChargePolicy {
        ChargePolicy { threshold: self.charge_threshold }
    }
}

#[derive(Parser)]
pub struct ControlArgs {
    #[clap(flatten)]
    pricing: PricingArgs,

    #[clap(long = "charging-device", env = "CHARGING_DEVICE", default_value = "1")]
    charging_device: DeviceId,

    #[clap(long = "tick-interval", env = "TICK_INTERVAL", default_value = "10s")]
    tick_interval: humantime::Duration,

    /// Local time after which the next day prices get fetched.
    #[clap(long = "fetch-after", env = "FETCH_AFTER", default_value = "14:00:00")]
    fetch_after: NaiveTime,
}

impl ControlArgs {
    pub fn config(self) -> Config {
        Config {
            vat: self.pricing.vat,
            policy: self.pricing.policy(),
            charging_device: self.charging_device,
            tick_interval: self.tick_interval.into(),
            fetch_after: self.fetch_after,
        }
    }
}
