//! Signed request payloads.
//!
//! Each type serializes to exactly the payload the venue expects and carries
//! its operation kind and endpoint through [`Action`].

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::order::{MarginMode, Side, TimeInForce, TpSl};
use crate::signing::{Action, OperationKind};

/// Slippage tolerance used when a market order does not specify one (0.5%).
pub const DEFAULT_SLIPPAGE_PERCENT: Decimal = Decimal::from_parts(5, 0, 0, false, 1);

/// Fresh random (v4) client order id.
pub fn new_client_order_id() -> Uuid {
    Uuid::new_v4()
}

/// Upper bound on actions in one batch submission.
pub const MAX_BATCH_ACTIONS: usize = 10;

/// Limit order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LimitOrder {
    pub symbol: String,
    pub side: Side,
    pub price: Decimal,
    pub amount: Decimal,
    pub tif: TimeInForce,
    pub reduce_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_order_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub take_profit: Option<TpSl>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<TpSl>,
}

impl LimitOrder {
    pub fn new(symbol: impl Into<String>, side: Side, price: Decimal, amount: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            price,
            amount,
            tif: TimeInForce::default(),
            reduce_only: false,
            client_order_id: None,
            take_profit: None,
            stop_loss: None,
        }
    }

    pub fn with_tif(mut self, tif: TimeInForce) -> Self {
        self.tif = tif;
        self
    }

    pub fn reduce_only(mut self, reduce_only: bool) -> Self {
        self.reduce_only = reduce_only;
        self
    }

    pub fn with_client_order_id(mut self, id: Uuid) -> Self {
        self.client_order_id = Some(id);
        self
    }

    /// Tag the order with a freshly generated client order id.
    pub fn with_new_client_order_id(self) -> Self {
        self.with_client_order_id(new_client_order_id())
    }

    pub fn with_take_profit(mut self, tp: TpSl) -> Self {
        self.take_profit = Some(tp);
        self
    }

    pub fn with_stop_loss(mut self, sl: TpSl) -> Self {
        self.stop_loss = Some(sl);
        self
    }
}

impl Action for LimitOrder {
    const KIND: OperationKind = OperationKind::CreateOrder;
    const PATH: &'static str = "/api/v1/orders/create";
}

/// Market order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketOrder {
    pub symbol: String,
    pub side: Side,
    pub amount: Decimal,
    pub slippage_percent: Decimal,
    pub reduce_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_order_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub take_profit: Option<TpSl>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<TpSl>,
}

impl MarketOrder {
    pub fn new(symbol: impl Into<String>, side: Side, amount: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            amount,
            slippage_percent: DEFAULT_SLIPPAGE_PERCENT,
            reduce_only: false,
            client_order_id: None,
            take_profit: None,
            stop_loss: None,
        }
    }

    pub fn with_slippage(mut self, percent: Decimal) -> Self {
        self.slippage_percent = percent;
        self
    }

    pub fn reduce_only(mut self, reduce_only: bool) -> Self {
        self.reduce_only = reduce_only;
        self
    }

    pub fn with_client_order_id(mut self, id: Uuid) -> Self {
        self.client_order_id = Some(id);
        self
    }

    /// Tag the order with a freshly generated client order id.
    pub fn with_new_client_order_id(self) -> Self {
        self.with_client_order_id(new_client_order_id())
    }

    pub fn with_take_profit(mut self, tp: TpSl) -> Self {
        self.take_profit = Some(tp);
        self
    }

    pub fn with_stop_loss(mut self, sl: TpSl) -> Self {
        self.stop_loss = Some(sl);
        self
    }
}

impl Action for MarketOrder {
    const KIND: OperationKind = OperationKind::CreateMarketOrder;
    const PATH: &'static str = "/api/v1/orders/create_market";
}

/// How a triggered stop order executes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StopExecution {
    Market { slippage_percent: Decimal },
    Limit { limit_price: Decimal },
}

/// The `stop_order` object of a stop order request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopOrderSpec {
    pub stop_price: Decimal,
    pub amount: Decimal,
    #[serde(flatten)]
    pub execution: StopExecution,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_order_id: Option<Uuid>,
}

/// Stop-market or stop-limit order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopOrder {
    pub symbol: String,
    pub side: Side,
    pub reduce_only: bool,
    pub stop_order: StopOrderSpec,
}

impl StopOrder {
    pub fn market(
        symbol: impl Into<String>,
        side: Side,
        amount: Decimal,
        stop_price: Decimal,
        slippage_percent: Decimal,
    ) -> Self {
        Self::new(
            symbol,
            side,
            amount,
            stop_price,
            StopExecution::Market { slippage_percent },
        )
    }

    pub fn limit(
        symbol: impl Into<String>,
        side: Side,
        amount: Decimal,
        stop_price: Decimal,
        limit_price: Decimal,
    ) -> Self {
        Self::new(
            symbol,
            side,
            amount,
            stop_price,
            StopExecution::Limit { limit_price },
        )
    }

    fn new(
        symbol: impl Into<String>,
        side: Side,
        amount: Decimal,
        stop_price: Decimal,
        execution: StopExecution,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            reduce_only: false,
            stop_order: StopOrderSpec {
                stop_price,
                amount,
                execution,
                client_order_id: None,
            },
        }
    }

    pub fn reduce_only(mut self, reduce_only: bool) -> Self {
        self.reduce_only = reduce_only;
        self
    }

    pub fn with_client_order_id(mut self, id: Uuid) -> Self {
        self.stop_order.client_order_id = Some(id);
        self
    }

    pub fn with_new_client_order_id(self) -> Self {
        self.with_client_order_id(new_client_order_id())
    }
}

impl Action for StopOrder {
    const KIND: OperationKind = OperationKind::CreateStopOrder;
    const PATH: &'static str = "/api/v1/orders/stop/create";
}

/// Take-profit and/or stop-loss on an existing position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionTpSl {
    pub symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub take_profit: Option<TpSl>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<TpSl>,
}

impl Action for PositionTpSl {
    const KIND: OperationKind = OperationKind::SetTpSl;
    const PATH: &'static str = "/api/v1/orders/tp_sl";
}

/// Which order a cancel refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelTarget {
    OrderId(u64),
    ClientOrderId(Uuid),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CancelOrder {
    pub symbol: String,
    #[serde(flatten)]
    pub target: CancelTarget,
}

impl CancelOrder {
    pub fn new(symbol: impl Into<String>, target: CancelTarget) -> Self {
        Self {
            symbol: symbol.into(),
            target,
        }
    }
}

impl Action for CancelOrder {
    const KIND: OperationKind = OperationKind::CancelOrder;
    const PATH: &'static str = "/api/v1/orders/cancel";
}

/// Which stop order a cancel refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopCancelTarget {
    StopOrderId(u64),
    ClientOrderId(Uuid),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CancelStopOrder {
    pub symbol: String,
    #[serde(flatten)]
    pub target: StopCancelTarget,
}

impl Action for CancelStopOrder {
    const KIND: OperationKind = OperationKind::CancelStopOrder;
    const PATH: &'static str = "/api/v1/orders/stop/cancel";
}

/// Cancel every open order, or every open order on a set of symbols.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CancelAllOrders {
    pub all_symbols: bool,
    pub exclude_reduce_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbols: Option<Vec<String>>,
}

impl CancelAllOrders {
    /// An empty `symbols` list means all symbols.
    pub fn new(symbols: Vec<String>, exclude_reduce_only: bool) -> Self {
        let all_symbols = symbols.is_empty();
        Self {
            all_symbols,
            exclude_reduce_only,
            symbols: (!all_symbols).then_some(symbols),
        }
    }
}

impl Action for CancelAllOrders {
    const KIND: OperationKind = OperationKind::CancelAllOrders;
    const PATH: &'static str = "/api/v1/orders/cancel_all";
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateLeverage {
    pub symbol: String,
    pub leverage: u32,
}

impl Action for UpdateLeverage {
    const KIND: OperationKind = OperationKind::UpdateLeverage;
    const PATH: &'static str = "/api/v1/account/leverage";
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateMarginMode {
    pub symbol: String,
    pub margin_mode: MarginMode,
}

impl Action for UpdateMarginMode {
    const KIND: OperationKind = OperationKind::UpdateMarginMode;
    const PATH: &'static str = "/api/v1/account/margin_mode";
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Withdrawal {
    pub amount: Decimal,
}

impl Action for Withdrawal {
    const KIND: OperationKind = OperationKind::Withdraw;
    const PATH: &'static str = "/api/v1/account/withdraw";
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateSubaccount {
    pub name: String,
}

impl Action for CreateSubaccount {
    const KIND: OperationKind = OperationKind::CreateSubaccount;
    const PATH: &'static str = "/api/v1/subaccounts/create";
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubaccountTransfer {
    pub from_account: String,
    pub to_account: String,
    pub amount: Decimal,
}

impl Action for SubaccountTransfer {
    const KIND: OperationKind = OperationKind::Transfer;
    const PATH: &'static str = "/api/v1/subaccounts/transfer";
}

/// Filters for paginated account history queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    pub symbol: Option<String>,
    pub start_time: Option<u64>,
    pub end_time: Option<u64>,
    pub limit: u32,
    pub cursor: Option<String>,
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self {
            symbol: None,
            start_time: None,
            end_time: None,
            limit: 100,
            cursor: None,
        }
    }
}

impl HistoryQuery {
    pub fn for_symbol(symbol: impl Into<String>) -> Self {
        Self {
            symbol: Some(symbol.into()),
            ..Self::default()
        }
    }

    pub fn between(mut self, start_time: Option<u64>, end_time: Option<u64>) -> Self {
        self.start_time = start_time;
        self.end_time = end_time;
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }

    /// Query parameters, `account` first. Absent filters become empty values,
    /// which the transport drops.
    pub fn to_params(&self, account: &str) -> Vec<(&'static str, String)> {
        let opt = |v: Option<u64>| v.map(|n| n.to_string()).unwrap_or_default();
        vec![
            ("account", account.to_string()),
            ("symbol", self.symbol.clone().unwrap_or_default()),
            ("start_time", opt(self.start_time)),
            ("end_time", opt(self.end_time)),
            ("limit", self.limit.to_string()),
            ("cursor", self.cursor.clone().unwrap_or_default()),
        ]
    }
}
