use crate::quantity::price::KilowattHourCents;

#[derive(Copy, Clone, Debug, Eq, PartialEq, derive_more::Display)]
pub enum Action {
    #[display("enable charging")]
    EnableCharging,

    #[display("disable charging")]
    DisableCharging,
}

impl Action {
    /// Charging state after the action has been applied.
    pub const fn is_charging(self) -> bool {
        matches!(self, Self::EnableCharging)
    }
}

/// Charge below the threshold, stop at or above it.
///
/// There is no hysteresis: a price oscillating around the threshold flips the relays every time.
#[derive(Copy, Clone, Debug)]
pub struct ChargePolicy {
    pub threshold: KilowattHourCents,
}

impl ChargePolicy {
    /// Decide on the action, if any, for the current rounded price.
    pub fn decide(&self, price: KilowattHourCents, is_charging: bool) -> Option<Action> {
        match (price < self.threshold, is_charging) {
            (true, false) => Some(Action::EnableCharging),
            (false, true) => Some(Action::DisableCharging),
            _ => None,
        }
    }
}
