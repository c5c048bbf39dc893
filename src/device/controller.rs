use std::{collections::BTreeMap, time::Duration};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_serial::SerialStream;

use crate::{
    device::{DeviceError, Link, LinkError, Pin, PinBank, ShutdownError},
    prelude::*,
};

/// Logical device identifier, assigned from 1 in the order of the endpoints.
#[derive(
    Copy,
    Clone,
    Debug,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    derive_more::Display,
    derive_more::From,
    derive_more::FromStr,
)]
pub struct DeviceId(pub u8);

/// Something that switches all relays of a device at once.
#[async_trait]
pub trait Relays: Send {
    async fn switch_all(&mut self, device_id: DeviceId, is_on: bool) -> Result<(), DeviceError>;
}

struct Device<S> {
    link: Link<S>,
    pins: PinBank,
}

/// Relay boards keyed by their identifiers.
///
/// All operations take `&mut self`, so commands to a board never interleave.
pub struct Controller<S = SerialStream> {
    devices: BTreeMap<DeviceId, Device<S>>,
}

impl Controller {
    /// Open and verify the links to all the endpoints.
    #[instrument(skip_all, fields(n_endpoints = endpoints.len()))]
    pub async fn connect(
        endpoints: &[String],
        baud_rate: u32,
        timeout: Duration,
    ) -> Result<Self, DeviceError> {
        let links = endpoints
            .iter()
            .map(|path| Link::open(path, baud_rate, timeout))
            .collect::<Result<Vec<_>, _>>()?;
        Self::try_from_links(links).await
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin + Send> Controller<S> {
    /// Verify the links and assign the device identifiers.
    ///
    /// The verification is not retried: a silent board fails the whole controller.
    pub async fn try_from_links(links: Vec<Link<S>>) -> Result<Self, DeviceError> {
        let mut devices = BTreeMap::new();
        for (mut link, device_id) in links.into_iter().zip((1..).map(DeviceId)) {
            if !link.verify().await {
                return Err(LinkError::Unverified(link.name().to_owned()).into());
            }
            info!(%device_id, link = link.name(), "connected");
            devices.insert(device_id, Device { link, pins: PinBank::default() });
        }
        Ok(Self { devices })
    }

    pub fn device_ids(&self) -> impl Iterator<Item = DeviceId> + '_ {
        self.devices.keys().copied()
    }

    /// Last known state of the pin.
    pub fn get_pin(&self, device_id: DeviceId, pin: Pin) -> Result<bool, DeviceError> {
        let device = self.devices.get(&device_id).ok_or(DeviceError::UnknownDevice(device_id))?;
        Ok(device.pins.is_on(pin))
    }

    /// Switch the pin unless it is already known to be in the desired state.
    ///
    /// On a failed write the recorded state stays as it was.
    #[instrument(skip_all, fields(device_id = %device_id, pin = %pin, is_on))]
    pub async fn set_pin(
        &mut self,
        device_id: DeviceId,
        pin: Pin,
        is_on: bool,
    ) -> Result<(), DeviceError> {
        let device = self.device_mut(device_id)?;
        if !device.pins.desired(pin, is_on) {
            debug!("already in the desired state");
            return Ok(());
        }
        match device.link.send(&pin_command(pin, is_on)).await {
            Ok(reply) => {
                info!(%reply, "switched");
                Ok(())
            }
            Err(error) => {
                device.pins.record(pin, !is_on);
                Err(error.into())
            }
        }
    }

    /// Write the pin state regardless of the recorded one.
    #[instrument(skip_all, fields(device_id = %device_id, pin = %pin, is_on))]
    pub async fn write_pin(
        &mut self,
        device_id: DeviceId,
        pin: Pin,
        is_on: bool,
    ) -> Result<(), DeviceError> {
        let device = self.device_mut(device_id)?;
        let reply = device.link.send(&pin_command(pin, is_on)).await?;
        device.pins.record(pin, is_on);
        info!(%reply, "written");
        Ok(())
    }

    /// Turn on the pins in ascending order, stopping at the first failure.
    pub async fn all_on(&mut self, device_id: DeviceId) -> Result<(), DeviceError> {
        self.set_all(device_id, true).await
    }

    /// Turn off the pins in ascending order, stopping at the first failure.
    pub async fn all_off(&mut self, device_id: DeviceId) -> Result<(), DeviceError> {
        self.set_all(device_id, false).await
    }

    async fn set_all(&mut self, device_id: DeviceId, is_on: bool) -> Result<(), DeviceError> {
        for pin in Pin::all() {
            self.set_pin(device_id, pin, is_on).await?;
        }
        info!(%device_id, is_on, "switched all pins");
        Ok(())
    }

    /// Force every pin off, so that the recorded states match the boards.
    #[instrument(skip_all)]
    pub async fn reconcile(&mut self) -> Result<(), DeviceError> {
        let device_ids = self.device_ids().collect::<Vec<_>>();
        for device_id in device_ids {
            for pin in Pin::all() {
                self.write_pin(device_id, pin, false).await?;
            }
        }
        Ok(())
    }

    /// Turn everything off and release the links.
    ///
    /// A device failing to turn off does not prevent releasing the others.
    #[instrument(skip_all)]
    pub async fn shutdown(&mut self) -> Result<(), ShutdownError> {
        let mut failures = Vec::new();
        let device_ids = self.device_ids().collect::<Vec<_>>();
        for device_id in device_ids {
            if let Err(error) = self.all_off(device_id).await {
                error!(%device_id, %error, "failed to turn off");
                failures.push((device_id, error));
            }
        }
        for device in self.devices.values_mut() {
            device.link.close();
        }
        if failures.is_empty() { Ok(()) } else { Err(ShutdownError(failures)) }
    }

    fn device_mut(&mut self, device_id: DeviceId) -> Result<&mut Device<S>, DeviceError> {
        self.devices.get_mut(&device_id).ok_or(DeviceError::UnknownDevice(device_id))
    }
}

#[async_trait]
impl<S: AsyncRead + AsyncWrite + Unpin + Send> Relays for Controller<S> {
    async fn switch_all(&mut self, device_id: DeviceId, is_on: bool) -> Result<(), DeviceError> {
        if is_on { self.all_on(device_id).await } else { self.all_off(device_id).await }
    }
}

fn pin_command(pin: Pin, is_on: bool) -> String {
    if is_on { format!("turn_on_pin({pin})") } else { format!("turn_off_pin({pin})") }
}
