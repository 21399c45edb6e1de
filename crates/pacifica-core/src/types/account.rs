//! Account, position and history types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::market::{TradeCause, TradeEventType, TradeSide};
use super::order::Side;

/// Account balances and margin usage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub balance: Decimal,
    pub fee_level: u32,
    pub account_equity: Decimal,
    pub available_to_spend: Decimal,
    pub available_to_withdraw: Decimal,
    pub pending_balance: Decimal,
    pub total_margin_used: Decimal,
    pub cross_mmr: Decimal,
    pub positions_count: u32,
    pub orders_count: u32,
    pub stop_orders_count: u32,
    pub updated_at: u64,
    #[serde(default)]
    pub use_ltp_for_stop_orders: bool,
}

/// Direction of an open position.
///
/// The venue reports positions with either `long`/`short` or the order-side
/// names `bid`/`ask`; both spellings are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSide {
    #[serde(alias = "bid")]
    Long,
    #[serde(alias = "ask")]
    Short,
}

impl PositionSide {
    /// The order side that reduces this position.
    pub fn closing_side(&self) -> Side {
        match self {
            PositionSide::Long => Side::Ask,
            PositionSide::Short => Side::Bid,
        }
    }
}

impl std::str::FromStr for PositionSide {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "long" | "bid" => Ok(PositionSide::Long),
            "short" | "ask" => Ok(PositionSide::Short),
            other => Err(crate::Error::validation(format!(
                "unknown position side '{other}', expected long or short"
            ))),
        }
    }
}

/// An open (or recently flattened) position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub side: PositionSide,
    pub amount: Decimal,
    pub entry_price: Decimal,
    #[serde(default)]
    pub margin: Option<Decimal>,
    pub funding: Decimal,
    pub isolated: bool,
    pub created_at: u64,
    pub updated_at: u64,
}

impl Position {
    pub fn is_open(&self) -> bool {
        !self.amount.is_zero()
    }
}

/// One of the account's own fills.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeHistoryEntry {
    pub history_id: u64,
    pub order_id: u64,
    #[serde(default)]
    pub client_order_id: Option<String>,
    pub symbol: String,
    pub amount: Decimal,
    pub price: Decimal,
    pub entry_price: Decimal,
    pub fee: Decimal,
    pub pnl: Decimal,
    pub event_type: TradeEventType,
    pub side: TradeSide,
    pub cause: TradeCause,
    pub created_at: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityHistoryEntry {
    pub equity: Decimal,
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceHistoryEntry {
    pub balance: Decimal,
    pub change: Decimal,
    pub reason: String,
    pub timestamp: u64,
}

/// Funding paid or received on a position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountFundingEntry {
    pub symbol: String,
    pub funding_rate: Decimal,
    pub funding_payment: Decimal,
    pub position_size: Decimal,
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalResponse {
    pub withdrawal_id: String,
    pub amount: Decimal,
    pub status: String,
    pub created_at: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subaccount {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub created_at: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubaccountCreated {
    pub subaccount_id: String,
}
