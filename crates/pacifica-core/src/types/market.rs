//! Public market data.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Trading rules and funding for one perpetual market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketInfo {
    pub symbol: String,
    pub tick_size: Decimal,
    pub min_tick: Decimal,
    pub max_tick: Decimal,
    pub lot_size: Decimal,
    pub max_leverage: u32,
    pub isolated_only: bool,
    pub min_order_size: Decimal,
    pub max_order_size: Decimal,
    pub funding_rate: Decimal,
    pub next_funding_rate: Decimal,
    #[serde(default)]
    pub created_at: Option<serde_json::Value>,
}

/// Mark, mid and oracle prices for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceInfo {
    pub symbol: String,
    pub mark: Decimal,
    pub mid: Decimal,
    pub oracle: Decimal,
    pub funding: Decimal,
    pub next_funding: Decimal,
    pub open_interest: Decimal,
    pub volume_24h: Decimal,
    pub yesterday_price: Decimal,
    pub timestamp: u64,
}

/// One aggregated book level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookLevel {
    #[serde(rename = "p")]
    pub price: Decimal,
    #[serde(rename = "a")]
    pub amount: Decimal,
    /// Number of resting orders at this level.
    #[serde(rename = "n")]
    pub orders: u32,
}

/// Order book snapshot. `levels` is `[bids, asks]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Orderbook {
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "l")]
    pub levels: Vec<Vec<BookLevel>>,
    #[serde(rename = "t")]
    pub timestamp: u64,
}

impl Orderbook {
    pub fn bids(&self) -> &[BookLevel] {
        self.levels.first().map(Vec::as_slice).unwrap_or_default()
    }

    pub fn asks(&self) -> &[BookLevel] {
        self.levels.get(1).map(Vec::as_slice).unwrap_or_default()
    }

    /// Returns the best bid price (highest buy order).
    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids().first().map(|l| l.price)
    }

    /// Returns the best ask price (lowest sell order).
    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks().first().map(|l| l.price)
    }
}

/// Candle resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "3m")]
    ThreeMinutes,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "2h")]
    TwoHours,
    #[serde(rename = "4h")]
    FourHours,
    #[serde(rename = "8h")]
    EightHours,
    #[serde(rename = "12h")]
    TwelveHours,
    #[serde(rename = "1d")]
    OneDay,
}

impl Interval {
    pub const ALL: [Interval; 11] = [
        Interval::OneMinute,
        Interval::ThreeMinutes,
        Interval::FiveMinutes,
        Interval::FifteenMinutes,
        Interval::ThirtyMinutes,
        Interval::OneHour,
        Interval::TwoHours,
        Interval::FourHours,
        Interval::EightHours,
        Interval::TwelveHours,
        Interval::OneDay,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::OneMinute => "1m",
            Interval::ThreeMinutes => "3m",
            Interval::FiveMinutes => "5m",
            Interval::FifteenMinutes => "15m",
            Interval::ThirtyMinutes => "30m",
            Interval::OneHour => "1h",
            Interval::TwoHours => "2h",
            Interval::FourHours => "4h",
            Interval::EightHours => "8h",
            Interval::TwelveHours => "12h",
            Interval::OneDay => "1d",
        }
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Interval {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Interval::ALL
            .into_iter()
            .find(|i| i.as_str() == s.trim())
            .ok_or_else(|| Error::validation(format!("unknown candle interval '{s}'")))
    }
}

/// OHLCV candle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    #[serde(rename = "t")]
    pub start_time: u64,
    #[serde(rename = "T")]
    pub end_time: u64,
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "i")]
    pub interval: Interval,
    #[serde(rename = "o")]
    pub open: Decimal,
    #[serde(rename = "c")]
    pub close: Decimal,
    #[serde(rename = "h")]
    pub high: Decimal,
    #[serde(rename = "l")]
    pub low: Decimal,
    #[serde(rename = "v")]
    pub volume: Decimal,
    #[serde(rename = "n")]
    pub trades: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeEventType {
    FulfillTaker,
    FulfillMaker,
}

/// Direction of a fill relative to the position it touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeSide {
    OpenLong,
    OpenShort,
    CloseLong,
    CloseShort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeCause {
    Normal,
    MarketLiquidation,
    BackstopLiquidation,
    Settlement,
}

/// Public trade print.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentTrade {
    pub event_type: TradeEventType,
    pub price: Decimal,
    pub amount: Decimal,
    pub side: TradeSide,
    pub cause: TradeCause,
    pub created_at: u64,
}

/// Historical funding-rate sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundingHistory {
    pub oracle_price: Decimal,
    pub bid_impact_price: Decimal,
    pub ask_impact_price: Decimal,
    pub funding_rate: Decimal,
    pub next_funding_rate: Decimal,
    pub created_at: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_orderbook_short_field_names() {
        let book: Orderbook = serde_json::from_value(json!({
            "s": "BTC",
            "l": [
                [{"p": "100000", "a": "1.25", "n": 3}],
                [{"p": "100001", "a": "0.5", "n": 1}, {"p": "100002", "a": "2", "n": 4}]
            ],
            "t": 1716200000000u64
        }))
        .unwrap();

        assert_eq!(book.symbol, "BTC");
        assert_eq!(book.best_bid(), Some(Decimal::new(100000, 0)));
        assert_eq!(book.best_ask(), Some(Decimal::new(100001, 0)));
        assert_eq!(book.asks().len(), 2);
    }

    #[test]
    fn test_empty_orderbook_has_no_best_prices() {
        let book = Orderbook {
            symbol: "ETH".to_string(),
            levels: vec![],
            timestamp: 0,
        };
        assert!(book.bids().is_empty());
        assert_eq!(book.best_ask(), None);
    }

    #[test]
    fn test_candle_deserializes_case_sensitive_keys() {
        let candle: Candle = serde_json::from_value(json!({
            "t": 1, "T": 2, "s": "SOL", "i": "15m",
            "o": "150.1", "c": "151", "h": "152.5", "l": "149", "v": "1000", "n": 42
        }))
        .unwrap();
        assert_eq!(candle.start_time, 1);
        assert_eq!(candle.end_time, 2);
        assert_eq!(candle.interval, Interval::FifteenMinutes);
        assert_eq!(candle.low, Decimal::new(149, 0));
    }

    #[test]
    fn test_interval_parsing() {
        for interval in Interval::ALL {
            assert_eq!(interval.as_str().parse::<Interval>().unwrap(), interval);
        }
        assert!("7m".parse::<Interval>().is_err());
    }
}
