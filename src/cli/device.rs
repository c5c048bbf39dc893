use clap::Parser;

use crate::{device::Controller, prelude::*};

#[derive(Parser)]
pub struct DeviceArgs {
    /// Serial endpoints of the relay boards. Device identifiers are assigned from 1 in this order.
    #[clap(
        long = "device-endpoints",
        env = "DEVICE_ENDPOINTS",
        value_delimiter = ',',
        required = true
    )]
    endpoints: Vec<String>,

    #[clap(long = "device-baud-rate", env = "DEVICE_BAUD_RATE", default_value = "115200")]
    baud_rate: u32,

    /// Reply timeout.
    #[clap(long = "device-timeout", env = "DEVICE_TIMEOUT", default_value = "1s")]
    timeout: humantime::Duration,
}

impl DeviceArgs {
    pub async fn connect(&self) -> Result<Controller> {
        Controller::connect(&self.endpoints, self.baud_rate, self.timeout.into())
            .await
            .context("failed to connect the devices")
    }
}
