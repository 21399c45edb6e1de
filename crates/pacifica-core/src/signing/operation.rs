//! Operation kinds bound into signed messages.

use serde::{Deserialize, Serialize};

/// Why a message is being signed. Closed set; the venue checks it against
/// the endpoint the request arrives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Limit order create.
    CreateOrder,
    CreateMarketOrder,
    CreateStopOrder,
    SetTpSl,
    CancelOrder,
    CancelStopOrder,
    CancelAllOrders,
    UpdateLeverage,
    UpdateMarginMode,
    Withdraw,
    CreateSubaccount,
    Transfer,
}

impl OperationKind {
    pub const ALL: [OperationKind; 12] = [
        OperationKind::CreateOrder,
        OperationKind::CreateMarketOrder,
        OperationKind::CreateStopOrder,
        OperationKind::SetTpSl,
        OperationKind::CancelOrder,
        OperationKind::CancelStopOrder,
        OperationKind::CancelAllOrders,
        OperationKind::UpdateLeverage,
        OperationKind::UpdateMarginMode,
        OperationKind::Withdraw,
        OperationKind::CreateSubaccount,
        OperationKind::Transfer,
    ];

    /// Wire name used in the `type` field of the signed message.
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::CreateOrder => "create_order",
            OperationKind::CreateMarketOrder => "create_market_order",
            OperationKind::CreateStopOrder => "create_stop_order",
            OperationKind::SetTpSl => "set_tp_sl",
            OperationKind::CancelOrder => "cancel_order",
            OperationKind::CancelStopOrder => "cancel_stop_order",
            OperationKind::CancelAllOrders => "cancel_all_orders",
            OperationKind::UpdateLeverage => "update_leverage",
            OperationKind::UpdateMarginMode => "update_margin_mode",
            OperationKind::Withdraw => "withdraw",
            OperationKind::CreateSubaccount => "create_subaccount",
            OperationKind::Transfer => "transfer",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A mutating request with a fixed operation kind and endpoint.
///
/// Implemented once per request type, so the kind a payload is signed under
/// is decided by its Rust type and never by its contents.
pub trait Action: Serialize {
    const KIND: OperationKind;
    const PATH: &'static str;
}
