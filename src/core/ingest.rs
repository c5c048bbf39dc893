//! Turning a feed series into the stored quarter-hour prices.

use chrono::NaiveDate;

use crate::{
    api::{FetchError, PriceFeed},
    core::{
        position::{Position, SeriesPoint},
        record::PriceRecord,
    },
    db::{PriceStore, StoreError},
    prelude::*,
};

#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome of a fetch-and-save.
#[derive(Debug)]
pub struct Refresh {
    /// Gap-filled records of the feed day, including the already stored ones.
    pub records: Vec<PriceRecord>,

    pub n_inserted: usize,
}

/// Fetch the feed day, fill the gaps, and store the missing records in one batch.
#[instrument(skip_all, fields(day = %day))]
pub async fn refresh<F, S>(feed: &F, store: &S, day: NaiveDate) -> Result<Refresh, RefreshError>
where
    F: PriceFeed + ?Sized,
    S: PriceStore + ?Sized,
{
    let points = feed.fetch(day).await?;
    let records = ingest(day, points);
    let n_inserted = store.insert_missing(&records).await?;
    info!(n_records = records.len(), n_inserted, "refreshed");
    Ok(Refresh { records, n_inserted })
}

/// Resolve the absolute timestamps of the gap-filled series.
pub fn ingest(day: NaiveDate, points: impl IntoIterator<Item = SeriesPoint>) -> Vec<PriceRecord> {
    fill_gaps(points)
        .into_iter()
        .filter_map(|point| {
            let timestamp = point.position.to_timestamp(day);
            if timestamp.is_none() {
                warn!(%day, position = %point.position, "position has no local time");
            }
            Some(PriceRecord::new(timestamp?, point.price))
        })
        .collect()
}

/// Carry the last price forward into every missing position.
///
/// The input is expected to be ordered by position. Out-of-order and repeated
/// positions are dropped, as well as non-finite prices, which become gaps themselves.
/// A gap before the first price cannot be filled and is left as is.
pub fn fill_gaps(points: impl IntoIterator<Item = SeriesPoint>) -> Vec<SeriesPoint> {
    let mut filled: Vec<SeriesPoint> = Vec::new();
    for point in points {
        if !point.price.0.is_finite() {
            warn!(position = %point.position, "skipped non-finite price");
            continue;
        }
        if point.position > Position::LAST {
            warn!(position = %point.position, "skipped position beyond the feed day");
            continue;
        }
        match filled.last().copied() {
            None => {
                if point.position > Position::FIRST {
                    warn!(
                        from = %Position::FIRST,
                        until = %point.position,
                        "no earlier price to fill the leading gap with",
                    );
                }
            }
            Some(previous) if point.position <= previous.position => {
                warn!(
                    position = %point.position,
                    previous = %previous.position,
                    "skipped out-of-order position",
                );
                continue;
            }
            Some(mut previous) => {
                while previous.position.next() != point.position {
                    previous = SeriesPoint::new(previous.position.next(), previous.price);
                    debug!(position = %previous.position, price = %previous.price, "filled gap");
                    filled.push(previous);
                }
            }
        }
        filled.push(point);
    }
    filled
}
