use std::sync::{Arc, atomic::AtomicBool};

use clap::Parser;
use signal_hook::consts::{SIGINT, SIGTERM};

use crate::{
    cli::{control::ControlArgs, db::DbArgs, device::DeviceArgs, entsoe::EntsoeArgs},
    core::monitor::Monitor,
    prelude::*,
};

#[derive(Parser)]
pub struct MonitorArgs {
    #[clap(flatten)]
    devices: DeviceArgs,

    #[clap(flatten)]
    db: DbArgs,

    #[clap(flatten)]
    entsoe: EntsoeArgs,

    #[clap(flatten)]
    control: ControlArgs,
}

impl MonitorArgs {
    pub async fn run(self) -> Result {
        let should_terminate = Arc::new(AtomicBool::new(false));
        for signal in [SIGINT, SIGTERM] {
            signal_hook::flag::register(signal, Arc::clone(&should_terminate))?;
        }

        let store = self.db.open()?;
        let feed = self.entsoe.new_api()?;
        let mut controller = self.devices.connect().await?;
        if let Err(error) = controller.reconcile().await {
            if let Err(shutdown_error) = controller.shutdown().await {
                error!("{shutdown_error}");
            }
            return Err(error).context("failed to reconcile the pins");
        }

        let mut monitor = Monitor::builder()
            .feed(feed)
            .store(store)
            .relays(controller)
            .config(self.control.config())
            .build();
        monitor.run(&should_terminate).await;
        info!(status = ?monitor.status(), "terminating…");
        monitor.into_relays().shutdown().await.context("failed to shut down the devices")?;
        Ok(())
    }
}
