mod client;
pub mod entsoe;
mod feed;

pub use self::feed::{FetchError, PriceFeed};
