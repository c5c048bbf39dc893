use std::time::Duration;

use itertools::Itertools;

use crate::device::DeviceId;

#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("failed to open `{path}`")]
    Open {
        path: String,

        #[source]
        source: tokio_serial::Error,
    },

    #[error("serial I/O failed")]
    Io(#[from] std::io::Error),

    #[error("no reply within {0:?}")]
    Timeout(Duration),

    #[error("the device closed the connection")]
    Eof,

    #[error("the link is closed")]
    Closed,

    #[error("`{0}` did not answer the liveness probe")]
    Unverified(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("unknown device #{0}")]
    UnknownDevice(DeviceId),

    #[error("invalid pin {0}, expected 1 to 8")]
    InvalidPin(u8),

    #[error(transparent)]
    Link(#[from] LinkError),
}

/// Devices that could not be turned off during the shutdown.
#[derive(Debug, thiserror::Error)]
#[error("failed to turn off devices: {}", join_failures(.0))]
pub struct ShutdownError(pub Vec<(DeviceId, DeviceError)>);

fn join_failures(failures: &[(DeviceId, DeviceError)]) -> String {
    failures.iter().map(|(device_id, error)| format!("#{device_id} ({error})")).join(", ")
}
