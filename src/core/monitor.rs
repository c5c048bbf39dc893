//! Price-driven control loop.

use std::{
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

use bon::Builder;
use chrono::{DateTime, Local, NaiveTime, Timelike};
use tokio::time::sleep;

use crate::{
    api::PriceFeed,
    core::{
        ingest::refresh,
        policy::ChargePolicy,
        position::{day_start, feed_day_of},
        quarter,
        record::PriceRecord,
    },
    db::{PriceStore, StoreError},
    device::{DeviceId, Relays},
    prelude::*,
    quantity::{percent::Percent, price::KilowattHourCents},
};

#[derive(Copy, Clone, Debug)]
pub struct Config {
    pub vat: Percent,
    pub policy: ChargePolicy,

    /// Device whose relays gate the controlled load.
    pub charging_device: DeviceId,

    pub tick_interval: Duration,

    /// Local time of day after which the next feed day is expected to be published.
    pub fetch_after: NaiveTime,
}

/// Snapshot of the monitor flags.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MonitorStatus {
    pub is_running: bool,

    /// Rounded consumer price last acted upon.
    pub last_observed_price: Option<KilowattHourCents>,

    pub is_charging: bool,
    pub is_fetch_due: bool,
    pub is_fetch_completed_for_today: bool,
}

/// Result of looking up the stored price.
#[derive(Debug)]
pub enum PriceLookup {
    Found(PriceRecord),
    NotFound,
    Failed(StoreError),
}

impl PriceLookup {
    pub async fn at<S: PriceStore + ?Sized>(store: &S, timestamp: DateTime<Local>) -> Self {
        match store.get(timestamp).await {
            Ok(Some(record)) => Self::Found(record),
            Ok(None) => Self::NotFound,
            Err(error) => Self::Failed(error),
        }
    }
}

/// Single cooperative loop: keeps the prices stored and switches the charging device.
///
/// Collaborator failures are logged and retried on the next tick, they never stop the loop.
#[derive(Builder)]
pub struct Monitor<F, S, R> {
    feed: F,
    store: S,
    relays: R,
    config: Config,

    #[builder(skip)]
    status: MonitorStatus,
}

impl<F: PriceFeed, S: PriceStore, R: Relays> Monitor<F, S, R> {
    pub const fn status(&self) -> &MonitorStatus {
        &self.status
    }

    /// Give the relays back, for example to shut them down.
    pub fn into_relays(self) -> R {
        self.relays
    }

    /// Tick until the flag is raised.
    ///
    /// The flag is checked between the ticks, an in-flight tick always runs to completion.
    pub async fn run(&mut self, should_terminate: &AtomicBool) {
        self.status.is_running = !should_terminate.load(Ordering::Relaxed);
        info!(config = ?self.config, "running…");
        while !should_terminate.load(Ordering::Relaxed) {
            self.tick(Local::now()).await;
            sleep(self.config.tick_interval).await;
        }
        self.status.is_running = false;
        info!("stopped");
    }

    #[instrument(skip_all, fields(now = %now.format("%F %T")))]
    pub async fn tick(&mut self, now: DateTime<Local>) {
        self.update_fetch_gate(now.time());
        if self.status.is_fetch_due {
            self.fetch_next_day(now).await;
        }

        let timestamp = quarter::floor(now);
        match PriceLookup::at(&self.store, timestamp).await {
            PriceLookup::Found(record) => {
                self.control(record).await;
            }
            PriceLookup::NotFound => {
                warn!(%timestamp, "no price for the current quarter hour");
                self.recover(now).await;
            }
            PriceLookup::Failed(error) => {
                error!(%timestamp, "failed to look up the price: {:#}", Error::from(error));
            }
        }
    }

    fn update_fetch_gate(&mut self, time: NaiveTime) {
        if time.hour() == 0
            && i64::from(time.minute()) < quarter::MINUTES
            && self.status.is_fetch_completed_for_today
        {
            info!("new day, reopening the fetch window");
            self.status.is_fetch_completed_for_today = false;
        }
        if time >= self.config.fetch_after
            && !self.status.is_fetch_completed_for_today
            && !self.status.is_fetch_due
        {
            info!("fetch is due");
            self.status.is_fetch_due = true;
        }
    }

    /// Fetch the feed day starting tomorrow, unless it is already stored.
    async fn fetch_next_day(&mut self, now: DateTime<Local>) {
        let Some(day) = now.date_naive().succ_opt() else {
            return;
        };
        if let Some(start_time) = day_start(day) {
            match PriceLookup::at(&self.store, start_time).await {
                PriceLookup::Found(_) => {
                    info!(%day, "already stored");
                    self.complete_fetch();
                    return;
                }
                PriceLookup::NotFound => {}
                PriceLookup::Failed(error) => {
                    warn!(%day, "failed to check the stored prices: {:#}", Error::from(error));
                }
            }
        }
        match refresh(&self.feed, &self.store, day).await {
            Ok(_) => {
                self.complete_fetch();
            }
            Err(error) => {
                error!(%day, "fetch failed, retrying on the next tick: {:#}", Error::from(error));
            }
        }
    }

    const fn complete_fetch(&mut self) {
        self.status.is_fetch_due = false;
        self.status.is_fetch_completed_for_today = true;
    }

    /// Fetch the feed day which is supposed to contain the current price.
    async fn recover(&self, now: DateTime<Local>) {
        let day = feed_day_of(now);
        if let Err(error) = refresh(&self.feed, &self.store, day).await {
            error!(%day, "recovery fetch failed: {:#}", Error::from(error));
        }
    }

    async fn control(&mut self, record: PriceRecord) {
        let price = record.price.to_cents_per_kwh(self.config.vat).round();
        if self.status.last_observed_price == Some(price) {
            trace!(%price, "unchanged");
            return;
        }
        info!(%price, is_charging = self.status.is_charging, "price changed");
        if let Some(action) = self.config.policy.decide(price, self.status.is_charging) {
            let device_id = self.config.charging_device;
            if let Err(error) = self.relays.switch_all(device_id, action.is_charging()).await {
                error!(%device_id, %action, "failed: {:#}", Error::from(error));
                return;
            }
            info!(%device_id, %action, "applied");
            self.status.is_charging = action.is_charging();
        }
        self.status.last_observed_price = Some(price);
    }
}
