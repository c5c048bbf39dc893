use async_trait::async_trait;
use chrono::NaiveDate;

use crate::core::position::SeriesPoint;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("price request failed")]
    Request(#[from] reqwest::Error),

    #[error("malformed price document")]
    Malformed(#[from] quick_xml::DeError),

    #[error("no prices published for {0}")]
    NoData(NaiveDate),
}

/// Upstream source of the day-ahead prices.
#[async_trait]
pub trait PriceFeed: Sync {
    /// Fetch the position-indexed series of the feed day.
    ///
    /// The requested period spans from the start of the day to the start of the next one.
    async fn fetch(&self, day: NaiveDate) -> Result<Vec<SeriesPoint>, FetchError>;
}
