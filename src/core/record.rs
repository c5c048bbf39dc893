use chrono::{DateTime, Local};

use crate::quantity::price::MegawattHourPrice;

/// Stored price of one quarter hour.
#[derive(Copy, Clone, Debug, Eq, PartialEq, derive_more::Constructor)]
pub struct PriceRecord {
    /// Start of the quarter hour.
    pub timestamp: DateTime<Local>,

    pub price: MegawattHourPrice,
}
