//! Batch order submission.
//!
//! Every sub-action is signed on its own, under its own kind and timestamp.
//! The batch body that carries them is sent unsigned.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::client::PacificaClient;
use super::transport::Auth;
use crate::signing::{Action, OperationKind, RequestSigner, SignedEnvelope};
use crate::types::{
    ApiResponse, CancelOrder, CancelTarget, LimitOrder, MarketOrder, Side, TimeInForce,
    DEFAULT_SLIPPAGE_PERCENT, MAX_BATCH_ACTIONS,
};
use crate::{Error, Result};

pub const BATCH_PATH: &str = "/api/v1/orders/batch";

/// One action inside a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchAction {
    Limit(LimitOrder),
    Market(MarketOrder),
    Cancel(CancelOrder),
}

impl BatchAction {
    pub fn entry_type(&self) -> BatchEntryType {
        match self {
            BatchAction::Limit(_) | BatchAction::Market(_) => BatchEntryType::Create,
            BatchAction::Cancel(_) => BatchEntryType::Cancel,
        }
    }

    /// The operation kind this action is signed under.
    pub fn kind(&self) -> OperationKind {
        match self {
            BatchAction::Limit(_) => LimitOrder::KIND,
            BatchAction::Market(_) => MarketOrder::KIND,
            BatchAction::Cancel(_) => CancelOrder::KIND,
        }
    }

    async fn sign(&self, signer: &RequestSigner) -> Result<BatchEntry> {
        let data = match self {
            BatchAction::Limit(order) => signer.sign_action(order).await?,
            BatchAction::Market(order) => signer.sign_action(order).await?,
            BatchAction::Cancel(cancel) => signer.sign_action(cancel).await?,
        };
        Ok(BatchEntry {
            entry_type: self.entry_type(),
            data,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchEntryType {
    Create,
    Cancel,
}

/// A signed sub-action: `{"type": "Create"|"Cancel", "data": <envelope>}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchEntry {
    #[serde(rename = "type")]
    pub entry_type: BatchEntryType,
    pub data: SignedEnvelope,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchRequest {
    pub actions: Vec<BatchEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResultEntry {
    pub success: bool,
    #[serde(default)]
    pub order_id: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResults {
    pub results: Vec<BatchResultEntry>,
}

/// Loosely typed batch instruction, as read from JSON input.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BatchInstruction {
    #[serde(rename = "type")]
    pub kind: BatchInstructionKind,
    pub symbol: String,
    #[serde(default)]
    pub side: Option<Side>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub slippage_percent: Option<Decimal>,
    #[serde(default)]
    pub tif: Option<TimeInForce>,
    #[serde(default)]
    pub reduce_only: bool,
    #[serde(default)]
    pub order_id: Option<u64>,
    #[serde(default)]
    pub client_order_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchInstructionKind {
    CreateLimit,
    CreateMarket,
    Cancel,
}

impl BatchInstruction {
    /// Check required fields and build the typed action.
    pub fn into_action(self) -> Result<BatchAction> {
        let symbol = self.symbol.to_uppercase();
        let missing =
            |field: &str| Error::validation(format!("{field} is required for this batch action"));

        Ok(match self.kind {
            BatchInstructionKind::CreateLimit => {
                let mut order = LimitOrder::new(
                    symbol,
                    self.side.ok_or_else(|| missing("side"))?,
                    self.price.ok_or_else(|| missing("price"))?,
                    self.amount.ok_or_else(|| missing("amount"))?,
                )
                .with_tif(self.tif.unwrap_or_default())
                .reduce_only(self.reduce_only);
                order.client_order_id = self.client_order_id;
                BatchAction::Limit(order)
            }
            BatchInstructionKind::CreateMarket => {
                let mut order = MarketOrder::new(
                    symbol,
                    self.side.ok_or_else(|| missing("side"))?,
                    self.amount.ok_or_else(|| missing("amount"))?,
                )
                .with_slippage(self.slippage_percent.unwrap_or(DEFAULT_SLIPPAGE_PERCENT))
                .reduce_only(self.reduce_only);
                order.client_order_id = self.client_order_id;
                BatchAction::Market(order)
            }
            BatchInstructionKind::Cancel => {
                let target = match (self.order_id, self.client_order_id) {
                    (Some(id), _) => CancelTarget::OrderId(id),
                    (None, Some(id)) => CancelTarget::ClientOrderId(id),
                    (None, None) => return Err(missing("order_id or client_order_id")),
                };
                BatchAction::Cancel(CancelOrder::new(symbol, target))
            }
        })
    }
}

impl PacificaClient {
    /// Sign every action of a batch without sending it.
    pub async fn sign_batch(&self, actions: &[BatchAction]) -> Result<BatchRequest> {
        if actions.is_empty() {
            return Err(Error::validation("batch must contain at least one action"));
        }
        if actions.len() > MAX_BATCH_ACTIONS {
            return Err(Error::validation(format!(
                "batch holds at most {MAX_BATCH_ACTIONS} actions, got {}",
                actions.len()
            )));
        }

        let signer = self.transport().signer();
        let mut entries = Vec::with_capacity(actions.len());
        for action in actions {
            entries.push(action.sign(signer).await?);
        }
        Ok(BatchRequest { actions: entries })
    }

    /// Submit up to ten independently signed actions in one request.
    pub async fn batch_orders(&self, actions: &[BatchAction]) -> Result<BatchResults> {
        let request = self.sign_batch(actions).await?;
        let response: ApiResponse<BatchResults> = self
            .transport()
            .post(BATCH_PATH, &request, Auth::None)
            .await?;
        let results = response.into_data()?;

        info!(
            actions = actions.len(),
            succeeded = results.results.iter().filter(|r| r.success).count(),
            "Batch submitted"
        );
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::transport::{HttpResponse, MockHttpTransport};
    use crate::config::{Config, Network};
    use crate::signing::base58;
    use serde_json::json;
    use std::sync::Arc;

    const SEED_HEX: &str = "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";

    fn client(http: MockHttpTransport) -> PacificaClient {
        let secret = base58::encode(&hex::decode(SEED_HEX).unwrap());
        let config = Config::new(Network::Testnet, "Acct111", "Agent222", secret);
        PacificaClient::with_transport(&config, Arc::new(http)).unwrap()
    }

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn three_actions() -> Vec<BatchAction> {
        vec![
            BatchAction::Limit(LimitOrder::new("BTC", Side::Bid, dec("99000"), dec("0.1"))),
            BatchAction::Market(MarketOrder::new("ETH", Side::Ask, dec("1"))),
            BatchAction::Cancel(CancelOrder::new("BTC", CancelTarget::OrderId(42))),
        ]
    }

    #[tokio::test]
    async fn test_batch_body_has_one_signed_entry_per_action() {
        let mut http = MockHttpTransport::new();
        http.expect_execute()
            .withf(|req| {
                let body = req.body.as_ref().unwrap();
                let actions = body["actions"].as_array().unwrap();
                req.path == BATCH_PATH
                    && body.get("signature").is_none()
                    && actions.len() == 3
                    && actions[0]["type"] == "Create"
                    && actions[1]["type"] == "Create"
                    && actions[2]["type"] == "Cancel"
                    && actions.iter().all(|a| {
                        a["data"]["signature"].is_string()
                            && a["data"]["timestamp"].is_u64()
                            && a["data"]["expiry_window"] == 5000
                            && a["data"]["account"] == "Acct111"
                    })
                    && actions[2]["data"]["order_id"] == 42
            })
            .times(1)
            .returning(|_| {
                Ok(HttpResponse {
                    status: 200,
                    body: json!({
                        "success": true,
                        "data": {"results": [
                            {"success": true, "order_id": 1},
                            {"success": true, "order_id": 2},
                            {"success": false, "error": "Order not found"}
                        ]},
                        "error": null,
                        "code": null
                    })
                    .to_string(),
                })
            });

        let results = client(http).batch_orders(&three_actions()).await.unwrap();
        assert_eq!(results.results.len(), 3);
        assert!(!results.results[2].success);
    }

    #[tokio::test]
    async fn test_each_entry_signed_under_its_own_kind() {
        let client = client(MockHttpTransport::new());
        let actions = three_actions();
        let request = client.sign_batch(&actions).await.unwrap();

        let signer = client.transport().signer();
        for (action, entry) in actions.iter().zip(&request.actions) {
            let resigned = signer
                .sign_at(action.kind(), entry.data.payload.clone(), entry.data.timestamp)
                .await
                .unwrap();
            assert_eq!(resigned.signature, entry.data.signature);
        }
        assert_ne!(request.actions[0].data.signature, request.actions[1].data.signature);
    }

    #[tokio::test]
    async fn test_batch_size_limits() {
        let mut http = MockHttpTransport::new();
        http.expect_execute().never();
        let client = client(http);

        let err = client.batch_orders(&[]).await.unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));

        let eleven: Vec<_> = (0..11)
            .map(|i| BatchAction::Cancel(CancelOrder::new("BTC", CancelTarget::OrderId(i))))
            .collect();
        let err = client.batch_orders(&eleven).await.unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));

        let ten = &eleven[..10];
        assert_eq!(client.sign_batch(ten).await.unwrap().actions.len(), 10);
    }

    #[test]
    fn test_instruction_defaults() {
        let limit: BatchInstruction = serde_json::from_value(json!({
            "type": "create_limit", "symbol": "btc", "side": "bid", "price": "99000", "amount": "0.1"
        }))
        .unwrap();
        match limit.into_action().unwrap() {
            BatchAction::Limit(order) => {
                assert_eq!(order.symbol, "BTC");
                assert_eq!(order.tif, TimeInForce::Gtc);
                assert!(!order.reduce_only);
            }
            other => panic!("unexpected action: {other:?}"),
        }

        let market: BatchInstruction = serde_json::from_value(json!({
            "type": "create_market", "symbol": "ETH", "side": "ask", "amount": "1"
        }))
        .unwrap();
        match market.into_action().unwrap() {
            BatchAction::Market(order) => assert_eq!(order.slippage_percent, dec("0.5")),
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[test]
    fn test_instruction_missing_fields() {
        let no_price: BatchInstruction = serde_json::from_value(json!({
            "type": "create_limit", "symbol": "BTC", "side": "bid", "amount": "1"
        }))
        .unwrap();
        assert!(matches!(no_price.into_action(), Err(Error::Validation { .. })));

        let no_target: BatchInstruction =
            serde_json::from_value(json!({"type": "cancel", "symbol": "BTC"})).unwrap();
        assert!(matches!(no_target.into_action(), Err(Error::Validation { .. })));
    }
}
