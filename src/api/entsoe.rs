//! [ENTSO-E Transparency Platform](https://transparency.entsoe.eu) day-ahead prices client.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use itertools::Itertools;
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::{
    api::{FetchError, PriceFeed, client},
    core::position::{Position, SeriesPoint},
    prelude::*,
    quantity::price::MegawattHourPrice,
};

pub struct Api {
    client: Client,
    url: Url,
    api_key: String,
    bidding_zone: String,
}

impl Api {
    /// Day-ahead prices document type.
    const DOCUMENT_TYPE: &str = "A44";

    const RESOLUTION: &str = "PT15M";

    pub fn try_new(url: Url, api_key: String, bidding_zone: String) -> Result<Self> {
        Ok(Self { client: client::try_new()?, url, api_key, bidding_zone })
    }

    fn format_period(day: NaiveDate) -> String {
        day.format("%Y%m%d0000").to_string()
    }
}

#[async_trait]
impl PriceFeed for Api {
    #[instrument(skip_all, fields(day = %day, zone = %self.bidding_zone))]
    async fn fetch(&self, day: NaiveDate) -> Result<Vec<SeriesPoint>, FetchError> {
        let period_start = Self::format_period(day);
        let period_end = Self::format_period(day.succ_opt().unwrap_or(day));
        info!("fetching…");
        let body = self
            .client
            .get(self.url.clone())
            .query(&[
                ("securityToken", self.api_key.as_str()),
                ("documentType", Self::DOCUMENT_TYPE),
                ("in_Domain", self.bidding_zone.as_str()),
                ("out_Domain", self.bidding_zone.as_str()),
                ("periodStart", period_start.as_str()),
                ("periodEnd", period_end.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let points = parse(&body, day)?;
        info!(n_points = points.len(), "fetched");
        Ok(points)
    }
}

/// Extract the quarter-hour points of the requested delivery day, ordered by position.
///
/// A response may cover two delivery days, so every period is attributed to the day
/// its time interval ends on. Periods of other days are ignored, and repeated positions
/// keep the first occurrence.
fn parse(body: &str, day: NaiveDate) -> Result<Vec<SeriesPoint>, FetchError> {
    let document: MarketDocument = quick_xml::de::from_str(body)?;
    let points = document
        .time_series
        .into_iter()
        .flat_map(|time_series| time_series.periods)
        .filter(|period| {
            if period.resolution != Api::RESOLUTION {
                warn!(resolution = %period.resolution, "skipped unsupported resolution");
                return false;
            }
            match period.time_interval.delivery_day() {
                Some(delivery_day) if delivery_day == day => true,
                Some(delivery_day) => {
                    debug!(%delivery_day, "skipped another delivery day");
                    false
                }
                None => {
                    warn!(end = %period.time_interval.end, "skipped unparseable time interval");
                    false
                }
            }
        })
        .flat_map(|period| period.points)
        .map(|point| SeriesPoint::new(Position(point.position), MegawattHourPrice(point.price)))
        .sorted_by_key(|point| point.position)
        .dedup_by(|lhs, rhs| lhs.position == rhs.position)
        .collect_vec();
    if points.is_empty() { Err(FetchError::NoData(day)) } else { Ok(points) }
}

#[derive(Deserialize)]
struct MarketDocument {
    #[serde(rename = "TimeSeries", default)]
    time_series: Vec<TimeSeries>,
}

#[derive(Deserialize)]
struct TimeSeries {
    #[serde(rename = "Period", default)]
    periods: Vec<Period>,
}

#[derive(Deserialize)]
struct Period {
    #[serde(rename = "timeInterval")]
    time_interval: TimeInterval,

    resolution: String,

    #[serde(rename = "Point", default)]
    points: Vec<Point>,
}

#[derive(Deserialize)]
struct TimeInterval {
    /// UTC time like `2025-01-01T22:00Z`.
    end: String,
}

impl TimeInterval {
    const FORMAT: &str = "%Y-%m-%dT%H:%MZ";

    fn delivery_day(&self) -> Option<NaiveDate> {
        NaiveDateTime::parse_from_str(&self.end, Self::FORMAT).ok().map(|end| end.date())
    }
}

#[derive(Deserialize)]
struct Point {
    position: u32,

    #[serde(rename = "price.amount")]
    price: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ingest::fill_gaps;

    const DAY: NaiveDate = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();

    #[test]
    fn test_parse_ok() -> Result<(), FetchError> {
        // language=xml
        let body = r#"<?xml version="1.0" encoding="utf-8"?>
            <Publication_MarketDocument xmlns="urn:iec62325.351:tc57wg16:451-3:publicationdocument:7:3">
                <mRID>4f3b1c6a</mRID>
                <revisionNumber>1</revisionNumber>
                <type>A44</type>
                <period.timeInterval>
                    <start>2024-12-31T22:00Z</start>
                    <end>2025-01-01T22:00Z</end>
                </period.timeInterval>
                <TimeSeries>
                    <mRID>1</mRID>
                    <auction.type>A01</auction.type>
                    <businessType>A62</businessType>
                    <currency_Unit.name>EUR</currency_Unit.name>
                    <price_Measure_Unit.name>MWH</price_Measure_Unit.name>
                    <curveType>A03</curveType>
                    <Period>
                        <timeInterval>
                            <start>2024-12-31T22:00Z</start>
                            <end>2025-01-01T22:00Z</end>
                        </timeInterval>
                        <resolution>PT15M</resolution>
                        <Point>
                            <position>1</position>
                            <price.amount>10.5</price.amount>
                        </Point>
                        <Point>
                            <position>2</position>
                            <price.amount>-1.25</price.amount>
                        </Point>
                        <Point>
                            <position>4</position>
                            <price.amount>8</price.amount>
                        </Point>
                    </Period>
                </TimeSeries>
            </Publication_MarketDocument>
        "#;
        let points = parse(body, DAY)?;
        assert_eq!(
            points,
            [
                SeriesPoint::new(Position(1), MegawattHourPrice(10.5)),
                SeriesPoint::new(Position(2), MegawattHourPrice(-1.25)),
                SeriesPoint::new(Position(4), MegawattHourPrice(8.0)),
            ],
        );
        Ok(())
    }

    #[test]
    fn test_parse_keeps_requested_delivery_day() -> Result<(), FetchError> {
        // language=xml
        let body = r"
            <Publication_MarketDocument>
                <TimeSeries>
                    <Period>
                        <timeInterval><start>2024-12-31T22:00Z</start><end>2025-01-01T22:00Z</end></timeInterval>
                        <resolution>PT15M</resolution>
                        <Point><position>3</position><price.amount>30</price.amount></Point>
                        <Point><position>1</position><price.amount>10</price.amount></Point>
                    </Period>
                </TimeSeries>
                <TimeSeries>
                    <Period>
                        <timeInterval><start>2025-01-01T22:00Z</start><end>2025-01-02T22:00Z</end></timeInterval>
                        <resolution>PT15M</resolution>
                        <Point><position>1</position><price.amount>500</price.amount></Point>
                        <Point><position>2</position><price.amount>999</price.amount></Point>
                        <Point><position>3</position><price.amount>500</price.amount></Point>
                    </Period>
                </TimeSeries>
                <TimeSeries>
                    <Period>
                        <timeInterval><start>2024-12-31T22:00Z</start><end>2025-01-01T22:00Z</end></timeInterval>
                        <resolution>PT60M</resolution>
                        <Point><position>2</position><price.amount>20</price.amount></Point>
                    </Period>
                </TimeSeries>
            </Publication_MarketDocument>
        ";
        let points = parse(body, DAY)?;
        assert_eq!(
            points,
            [
                SeriesPoint::new(Position(1), MegawattHourPrice(10.0)),
                SeriesPoint::new(Position(3), MegawattHourPrice(30.0)),
            ],
        );

        let filled = fill_gaps(points);
        assert_eq!(filled[1], SeriesPoint::new(Position(2), MegawattHourPrice(10.0)));

        let next_day = DAY.succ_opt().unwrap();
        let positions = parse(body, next_day)?.into_iter().map(|point| point.position.0).collect_vec();
        assert_eq!(positions, [1, 2, 3]);
        Ok(())
    }

    #[test]
    fn test_parse_repeated_positions_keep_first() -> Result<(), FetchError> {
        // language=xml
        let body = r"
            <Publication_MarketDocument>
                <TimeSeries>
                    <Period>
                        <timeInterval><start>2024-12-31T22:00Z</start><end>2025-01-01T22:00Z</end></timeInterval>
                        <resolution>PT15M</resolution>
                        <Point><position>1</position><price.amount>1</price.amount></Point>
                        <Point><position>1</position><price.amount>100</price.amount></Point>
                    </Period>
                </TimeSeries>
            </Publication_MarketDocument>
        ";
        assert_eq!(parse(body, DAY)?, [SeriesPoint::new(Position(1), MegawattHourPrice(1.0))]);
        Ok(())
    }

    #[test]
    fn test_delivery_day() {
        let interval = TimeInterval { end: "2025-01-01T22:00Z".to_owned() };
        assert_eq!(interval.delivery_day(), Some(DAY));
        let interval = TimeInterval { end: "tomorrow".to_owned() };
        assert_eq!(interval.delivery_day(), None);
    }

    #[test]
    fn test_parse_acknowledgement() {
        // language=xml
        let body = r"
            <Acknowledgement_MarketDocument>
                <mRID>1</mRID>
                <Reason>
                    <code>999</code>
                    <text>No matching data found</text>
                </Reason>
            </Acknowledgement_MarketDocument>
        ";
        assert!(matches!(parse(body, DAY), Err(FetchError::NoData(day)) if day == DAY));
    }

    #[test]
    fn test_parse_malformed() {
        let body = "<Publication_MarketDocument><TimeSeries><Period><resolution>PT15M</resolution><Point><position>one</position>";
        assert!(matches!(parse(body, DAY), Err(FetchError::Malformed(_))));
    }

    #[tokio::test]
    #[ignore = "makes the API request"]
    async fn test_fetch_ok() -> Result {
        let api = Api::try_new(
            Url::parse("https://web-api.tp.entsoe.eu/api")?,
            std::env::var("ENTSOE_API_KEY")?,
            "10YFI-1--------U".to_owned(),
        )?;
        let points = api.fetch(chrono::Local::now().date_naive()).await?;
        assert!(!points.is_empty());
        Ok(())
    }
}
