//! Order vocabulary and order responses.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Bid,
    Ask,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Bid => "bid",
            Side::Ask => "ask",
        }
    }
}

impl std::str::FromStr for Side {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bid" | "buy" => Ok(Side::Bid),
            "ask" | "sell" => Ok(Side::Ask),
            other => Err(crate::Error::validation(format!(
                "unknown order side '{other}', expected bid or ask"
            ))),
        }
    }
}

/// Time in force for limit orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimeInForce {
    /// Good-til-cancelled.
    #[default]
    Gtc,
    /// Immediate-or-cancel.
    Ioc,
    /// Add-liquidity-only (post only).
    Alo,
    /// Top-of-book.
    Tob,
}

impl std::str::FromStr for TimeInForce {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GTC" => Ok(TimeInForce::Gtc),
            "IOC" => Ok(TimeInForce::Ioc),
            "ALO" => Ok(TimeInForce::Alo),
            "TOB" => Ok(TimeInForce::Tob),
            other => Err(crate::Error::validation(format!(
                "unknown time in force '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarginMode {
    Cross,
    Isolated,
}

impl std::str::FromStr for MarginMode {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cross" => Ok(MarginMode::Cross),
            "isolated" => Ok(MarginMode::Isolated),
            other => Err(crate::Error::validation(format!(
                "unknown margin mode '{other}', expected cross or isolated"
            ))),
        }
    }
}

/// Type of order as reported by the venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Limit,
    Market,
    StopLimit,
    StopMarket,
    TakeProfitLimit,
    StopLossLimit,
    TakeProfitMarket,
    StopLossMarket,
}

/// Current status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Open,
    PartiallyFilled,
    Filled,
    Cancelled,
    /// Any status this client does not know about.
    #[serde(other)]
    Unknown,
}

/// Take-profit or stop-loss trigger attached to an order or position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TpSl {
    pub stop_price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_order_id: Option<Uuid>,
}

impl TpSl {
    /// Market exit when `stop_price` trades.
    pub fn market(stop_price: Decimal) -> Self {
        Self {
            stop_price,
            limit_price: None,
            client_order_id: None,
        }
    }

    /// Limit exit at `limit_price` when `stop_price` trades.
    pub fn limit(stop_price: Decimal, limit_price: Decimal) -> Self {
        Self {
            stop_price,
            limit_price: Some(limit_price),
            client_order_id: None,
        }
    }

    pub fn with_client_order_id(mut self, id: Uuid) -> Self {
        self.client_order_id = Some(id);
        self
    }
}

/// A resting order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenOrder {
    pub order_id: u64,
    #[serde(default)]
    pub client_order_id: Option<String>,
    pub symbol: String,
    pub side: Side,
    pub price: Decimal,
    pub initial_amount: Decimal,
    pub filled_amount: Decimal,
    pub cancelled_amount: Decimal,
    #[serde(default)]
    pub stop_price: Option<Decimal>,
    pub order_type: OrderType,
    #[serde(default)]
    pub stop_parent_order_id: Option<u64>,
    pub reduce_only: bool,
    pub created_at: u64,
    pub updated_at: u64,
}

impl OpenOrder {
    pub fn remaining_amount(&self) -> Decimal {
        self.initial_amount - self.filled_amount - self.cancelled_amount
    }
}

/// An order from history, with its final or current status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderHistoryEntry {
    pub order_id: u64,
    #[serde(default)]
    pub client_order_id: Option<String>,
    pub symbol: String,
    pub side: Side,
    pub price: Decimal,
    pub initial_amount: Decimal,
    pub filled_amount: Decimal,
    pub cancelled_amount: Decimal,
    #[serde(default)]
    pub stop_price: Option<Decimal>,
    pub order_type: OrderType,
    pub reduce_only: bool,
    pub status: OrderStatus,
    pub created_at: u64,
    pub updated_at: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderResponse {
    pub order_id: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopOrderResponse {
    pub stop_order_id: u64,
}
