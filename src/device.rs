//! Relay controller boards reached over serial links.

mod controller;
mod error;
mod link;
mod pin;
#[cfg(test)]
mod simulator;

pub use self::{
    controller::{Controller, DeviceId, Relays},
    error::{DeviceError, LinkError, ShutdownError},
    link::Link,
    pin::{Pin, PinBank},
};
