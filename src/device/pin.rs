use crate::device::DeviceError;

/// Relay pin number, 1 to 8.
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, derive_more::Display)]
pub struct Pin(u8);

impl Pin {
    pub const COUNT: u8 = 8;

    /// All the pins in ascending order.
    pub fn all() -> impl Iterator<Item = Self> {
        (1..=Self::COUNT).map(Self)
    }

    const fn index(self) -> usize {
        (self.0 - 1) as usize
    }
}

impl TryFrom<u8> for Pin {
    type Error = DeviceError;

    fn try_from(number: u8) -> Result<Self, Self::Error> {
        if (1..=Self::COUNT).contains(&number) {
            Ok(Self(number))
        } else {
            Err(DeviceError::InvalidPin(number))
        }
    }
}

/// Last known states of the pins of one board.
///
/// The states are assumed to be off until recorded otherwise.
#[derive(Clone, Debug, Default)]
pub struct PinBank([bool; Pin::COUNT as usize]);

impl PinBank {
    pub const fn is_on(&self, pin: Pin) -> bool {
        self.0[pin.index()]
    }

    /// Record the desired state.
    ///
    /// Returns `true` when the state has changed and has to be written to the device.
    pub fn desired(&mut self, pin: Pin, is_on: bool) -> bool {
        let state = &mut self.0[pin.index()];
        if *state == is_on {
            false
        } else {
            *state = is_on;
            true
        }
    }

    pub const fn record(&mut self, pin: Pin, is_on: bool) {
        self.0[pin.index()] = is_on;
    }
}
