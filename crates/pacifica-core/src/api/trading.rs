//! Signed, mutating operations.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::client::PacificaClient;
use crate::types::{
    CancelAllOrders, CancelOrder, CancelStopOrder, CancelTarget, CreateSubaccount, LimitOrder,
    MarginMode, MarketOrder, OrderResponse, PositionSide, PositionTpSl, Side, StopCancelTarget,
    StopOrder, StopOrderResponse, SubaccountCreated, SubaccountTransfer, TpSl, UpdateLeverage,
    UpdateMarginMode, Withdrawal, WithdrawalResponse, DEFAULT_SLIPPAGE_PERCENT,
};
use crate::{Error, Result};

/// One leg of a take-profit / stop-loss ladder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LadderLeg {
    /// Trigger price.
    pub price: Decimal,
    pub amount: Decimal,
    /// Makes the leg a stop-limit; otherwise it is a stop-market.
    #[serde(default)]
    pub limit_price: Option<Decimal>,
}

/// Take-profit legs and an optional stop-loss for one position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TpSlLadder {
    pub symbol: String,
    pub position_side: PositionSide,
    #[serde(default)]
    pub take_profits: Vec<LadderLeg>,
    #[serde(default)]
    pub stop_loss: Option<LadderLeg>,
    /// Slippage for stop-market legs.
    #[serde(default = "default_slippage")]
    pub slippage_percent: Decimal,
}

fn default_slippage() -> Decimal {
    DEFAULT_SLIPPAGE_PERCENT
}

/// Outcome of placing one ladder leg.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegOutcome {
    /// `TP1`..`TPn` or `SL`.
    pub label: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_order_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LadderSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LadderReport {
    pub symbol: String,
    pub position_side: PositionSide,
    pub order_side: Side,
    pub orders: Vec<LegOutcome>,
    pub summary: LadderSummary,
}

impl PacificaClient {
    pub async fn create_limit_order(&self, order: &LimitOrder) -> Result<OrderResponse> {
        let response: OrderResponse = self.submit(order).await?;
        info!(
            order_id = response.order_id,
            symbol = %order.symbol,
            side = order.side.as_str(),
            "Limit order created"
        );
        Ok(response)
    }

    pub async fn create_market_order(&self, order: &MarketOrder) -> Result<OrderResponse> {
        let response: OrderResponse = self.submit(order).await?;
        info!(
            order_id = response.order_id,
            symbol = %order.symbol,
            side = order.side.as_str(),
            reduce_only = order.reduce_only,
            "Market order created"
        );
        Ok(response)
    }

    /// Stop-market or stop-limit order.
    pub async fn create_stop_order(&self, order: &StopOrder) -> Result<StopOrderResponse> {
        let response: StopOrderResponse = self.submit(order).await?;
        info!(
            stop_order_id = response.stop_order_id,
            symbol = %order.symbol,
            "Stop order created"
        );
        Ok(response)
    }

    /// Set take-profit and/or stop-loss on an open position.
    pub async fn set_position_tpsl(
        &self,
        symbol: &str,
        take_profit: Option<TpSl>,
        stop_loss: Option<TpSl>,
    ) -> Result<()> {
        if take_profit.is_none() && stop_loss.is_none() {
            return Err(Error::validation(
                "at least one of take profit or stop loss is required",
            ));
        }
        self.submit_unit(&PositionTpSl {
            symbol: symbol.to_string(),
            take_profit,
            stop_loss,
        })
        .await
    }

    pub async fn cancel_order(&self, symbol: &str, target: CancelTarget) -> Result<()> {
        self.submit_unit(&CancelOrder::new(symbol, target)).await?;
        info!(symbol, target = ?target, "Order cancelled");
        Ok(())
    }

    pub async fn cancel_stop_order(&self, symbol: &str, target: StopCancelTarget) -> Result<()> {
        self.submit_unit(&CancelStopOrder {
            symbol: symbol.to_string(),
            target,
        })
        .await?;
        info!(symbol, target = ?target, "Stop order cancelled");
        Ok(())
    }

    /// Cancel all open orders. An empty `symbols` list means every symbol.
    pub async fn cancel_all_orders(
        &self,
        symbols: Vec<String>,
        exclude_reduce_only: bool,
    ) -> Result<()> {
        let request = CancelAllOrders::new(symbols, exclude_reduce_only);
        self.submit_unit(&request).await?;
        info!(
            all_symbols = request.all_symbols,
            exclude_reduce_only,
            "All orders cancelled"
        );
        Ok(())
    }

    pub async fn update_leverage(&self, symbol: &str, leverage: u32) -> Result<()> {
        if leverage == 0 {
            return Err(Error::validation("leverage must be at least 1"));
        }
        self.submit_unit(&UpdateLeverage {
            symbol: symbol.to_string(),
            leverage,
        })
        .await
    }

    pub async fn update_margin_mode(&self, symbol: &str, margin_mode: MarginMode) -> Result<()> {
        self.submit_unit(&UpdateMarginMode {
            symbol: symbol.to_string(),
            margin_mode,
        })
        .await
    }

    pub async fn request_withdrawal(&self, amount: Decimal) -> Result<WithdrawalResponse> {
        ensure_positive("withdrawal amount", amount)?;
        let response: WithdrawalResponse = self.submit(&Withdrawal { amount }).await?;
        info!(
            withdrawal_id = %response.withdrawal_id,
            amount = %response.amount,
            "Withdrawal requested"
        );
        Ok(response)
    }

    pub async fn create_subaccount(&self, name: &str) -> Result<SubaccountCreated> {
        if name.trim().is_empty() {
            return Err(Error::validation("subaccount name is required"));
        }
        self.submit(&CreateSubaccount {
            name: name.to_string(),
        })
        .await
    }

    pub async fn transfer(&self, from_account: &str, to_account: &str, amount: Decimal) -> Result<()> {
        ensure_positive("transfer amount", amount)?;
        self.submit_unit(&SubaccountTransfer {
            from_account: from_account.to_string(),
            to_account: to_account.to_string(),
            amount,
        })
        .await
    }

    /// Close the open position on `symbol` with a reduce-only market order on
    /// the opposite side, sized to the position's amount.
    ///
    /// Reads the position, then places the order. The two steps are not
    /// atomic: a fill or liquidation in between can leave the order sized to
    /// a stale amount. Reduce-only bounds the damage to rejection or a
    /// partial close.
    pub async fn close_position(
        &self,
        symbol: &str,
        slippage_percent: Option<Decimal>,
    ) -> Result<OrderResponse> {
        let position = self.position(symbol).await?;
        let order = MarketOrder::new(
            position.symbol.clone(),
            position.side.closing_side(),
            position.amount,
        )
        .with_slippage(slippage_percent.unwrap_or(DEFAULT_SLIPPAGE_PERCENT))
        .reduce_only(true);

        info!(
            symbol = %position.symbol,
            side = ?position.side,
            amount = %position.amount,
            "Closing position"
        );
        self.create_market_order(&order).await
    }

    /// Place one reduce-only stop order per ladder leg on the closing side.
    ///
    /// Legs are placed in order (`TP1`..`TPn`, then `SL`). A failed leg is
    /// recorded in the report and does not stop the rest.
    pub async fn create_multi_tpsl(&self, ladder: &TpSlLadder) -> Result<LadderReport> {
        if ladder.take_profits.is_empty() && ladder.stop_loss.is_none() {
            return Err(Error::validation(
                "at least one take profit or stop loss leg is required",
            ));
        }

        let order_side = ladder.position_side.closing_side();
        let legs = ladder
            .take_profits
            .iter()
            .enumerate()
            .map(|(i, leg)| (format!("TP{}", i + 1), leg))
            .chain(ladder.stop_loss.iter().map(|leg| ("SL".to_string(), leg)));

        let mut orders = Vec::new();
        for (label, leg) in legs {
            let order = match leg.limit_price {
                Some(limit_price) => {
                    StopOrder::limit(&ladder.symbol, order_side, leg.amount, leg.price, limit_price)
                }
                None => StopOrder::market(
                    &ladder.symbol,
                    order_side,
                    leg.amount,
                    leg.price,
                    ladder.slippage_percent,
                ),
            }
            .reduce_only(true);

            let outcome = match self.create_stop_order(&order).await {
                Ok(response) => LegOutcome {
                    label,
                    success: true,
                    stop_order_id: Some(response.stop_order_id),
                    error: None,
                },
                Err(e) => {
                    warn!(leg = %label, symbol = %ladder.symbol, error = %e, "Ladder leg failed");
                    LegOutcome {
                        label,
                        success: false,
                        stop_order_id: None,
                        error: Some(e.to_string()),
                    }
                }
            };
            orders.push(outcome);
        }

        let successful = orders.iter().filter(|o| o.success).count();
        let summary = LadderSummary {
            total: orders.len(),
            successful,
            failed: orders.len() - successful,
        };

        Ok(LadderReport {
            symbol: ladder.symbol.clone(),
            position_side: ladder.position_side,
            order_side,
            orders,
            summary,
        })
    }
}

fn ensure_positive(what: &str, amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(Error::validation(format!("{what} must be positive")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::transport::{HttpRequest, HttpResponse, MockHttpTransport};
    use crate::config::{Config, Network};
    use crate::signing::base58;
    use mockall::Sequence;
    use serde_json::json;
    use std::sync::Arc;

    const SEED_HEX: &str = "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";

    fn config() -> Config {
        let secret = base58::encode(&hex::decode(SEED_HEX).unwrap());
        Config::new(Network::Testnet, "Acct111", "Agent222", secret)
    }

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn ok(data: serde_json::Value) -> Result<HttpResponse> {
        Ok(HttpResponse {
            status: 200,
            body: json!({"success": true, "data": data, "error": null, "code": null}).to_string(),
        })
    }

    fn positions_response(side: &str, amount: &str) -> Result<HttpResponse> {
        ok(json!([{
            "symbol": "BTC", "side": side, "amount": amount, "entry_price": "100000",
            "margin": "0", "funding": "0", "isolated": false,
            "created_at": 1, "updated_at": 1
        }]))
    }

    fn body(req: &HttpRequest) -> &serde_json::Value {
        req.body.as_ref().unwrap()
    }

    async fn close_with_position(side: &'static str) -> serde_json::Value {
        let captured = Arc::new(std::sync::Mutex::new(None));
        let sink = captured.clone();

        let mut seq = Sequence::new();
        let mut http = MockHttpTransport::new();
        http.expect_execute()
            .withf(|req| req.path == "/api/v1/positions")
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_| positions_response(side, "1.5"));
        http.expect_execute()
            .withf(|req| req.path == "/api/v1/orders/create_market")
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |req| {
                *sink.lock().unwrap() = req.body;
                ok(json!({"order_id": 9001}))
            });

        let client = PacificaClient::with_transport(&config(), Arc::new(http)).unwrap();
        let response = client.close_position("btc", None).await.unwrap();
        assert_eq!(response.order_id, 9001);

        let body = captured.lock().unwrap().take();
        body.unwrap()
    }

    #[tokio::test]
    async fn test_close_long_position_sells() {
        let body = close_with_position("long").await;
        assert_eq!(body["side"], "ask");
        assert_eq!(body["amount"], "1.5");
        assert_eq!(body["reduce_only"], true);
        assert_eq!(body["symbol"], "BTC");
        assert_eq!(body["slippage_percent"], "0.5");
    }

    #[tokio::test]
    async fn test_close_short_position_buys() {
        let body = close_with_position("short").await;
        assert_eq!(body["side"], "bid");
        assert_eq!(body["amount"], "1.5");
        assert_eq!(body["reduce_only"], true);
    }

    #[tokio::test]
    async fn test_close_flat_position_is_not_found() {
        let mut http = MockHttpTransport::new();
        http.expect_execute()
            .times(1)
            .returning(|_| positions_response("long", "0"));

        let client = PacificaClient::with_transport(&config(), Arc::new(http)).unwrap();
        let err = client.close_position("BTC", None).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { kind: "Position", .. }));
    }

    #[tokio::test]
    async fn test_cancel_all_scopes() {
        let mut http = MockHttpTransport::new();
        http.expect_execute()
            .withf(|req| {
                let b = body(req);
                req.path == "/api/v1/orders/cancel_all"
                    && b["all_symbols"] == true
                    && b.get("symbols").is_none()
            })
            .times(1)
            .returning(|_| ok(json!({"cancelled_count": 3})));
        http.expect_execute()
            .withf(|req| {
                let b = body(req);
                req.path == "/api/v1/orders/cancel_all"
                    && b["all_symbols"] == false
                    && b["symbols"] == json!(["BTC", "ETH"])
            })
            .times(1)
            .returning(|_| ok(json!({"cancelled_count": 1})));

        let client = PacificaClient::with_transport(&config(), Arc::new(http)).unwrap();
        client.cancel_all_orders(vec![], false).await.unwrap();
        client
            .cancel_all_orders(vec!["BTC".into(), "ETH".into()], false)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_cancel_by_client_order_id() {
        let id = uuid::Uuid::new_v4();
        let expected = id.to_string();
        let mut http = MockHttpTransport::new();
        http.expect_execute()
            .withf(move |req| {
                let b = body(req);
                req.path == "/api/v1/orders/cancel"
                    && b["client_order_id"] == expected.as_str()
                    && b.get("order_id").is_none()
            })
            .times(1)
            .returning(|_| ok(serde_json::Value::Null));

        let client = PacificaClient::with_transport(&config(), Arc::new(http)).unwrap();
        client
            .cancel_order("BTC", CancelTarget::ClientOrderId(id))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_validation_happens_before_transport() {
        let mut http = MockHttpTransport::new();
        http.expect_execute().never();

        let client = PacificaClient::with_transport(&config(), Arc::new(http)).unwrap();
        assert!(matches!(
            client.update_leverage("BTC", 0).await,
            Err(Error::Validation { .. })
        ));
        assert!(matches!(
            client.request_withdrawal(Decimal::ZERO).await,
            Err(Error::Validation { .. })
        ));
        assert!(matches!(
            client.set_position_tpsl("BTC", None, None).await,
            Err(Error::Validation { .. })
        ));
        assert!(matches!(
            client.create_subaccount("  ").await,
            Err(Error::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_transport_error_is_not_retried() {
        let mut http = MockHttpTransport::new();
        http.expect_execute().times(1).returning(|_| {
            Ok(HttpResponse {
                status: 400,
                body: "invalid signature".to_string(),
            })
        });

        let client = PacificaClient::with_transport(&config(), Arc::new(http)).unwrap();
        let err = client
            .update_margin_mode("BTC", MarginMode::Cross)
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(400));
    }

    #[tokio::test]
    async fn test_multi_tpsl_records_each_leg() {
        let mut http = MockHttpTransport::new();
        // TP1 stop-market succeeds
        http.expect_execute()
            .withf(|req| {
                let b = body(req);
                b["stop_order"]["stop_price"] == "110000"
                    && b["stop_order"]["slippage_percent"] == "1"
                    && b["side"] == "ask"
                    && b["reduce_only"] == true
            })
            .times(1)
            .returning(|_| ok(json!({"stop_order_id": 11})));
        // TP2 stop-limit is rejected
        http.expect_execute()
            .withf(|req| {
                let b = body(req);
                b["stop_order"]["stop_price"] == "120000"
                    && b["stop_order"]["limit_price"] == "119900"
            })
            .times(1)
            .returning(|_| {
                Ok(HttpResponse {
                    status: 422,
                    body: "tick size".to_string(),
                })
            });
        // SL still placed
        http.expect_execute()
            .withf(|req| body(req)["stop_order"]["stop_price"] == "95000")
            .times(1)
            .returning(|_| ok(json!({"stop_order_id": 13})));

        let client = PacificaClient::with_transport(&config(), Arc::new(http)).unwrap();
        let ladder = TpSlLadder {
            symbol: "BTC".to_string(),
            position_side: PositionSide::Long,
            take_profits: vec![
                LadderLeg {
                    price: dec("110000"),
                    amount: dec("0.5"),
                    limit_price: None,
                },
                LadderLeg {
                    price: dec("120000"),
                    amount: dec("0.5"),
                    limit_price: Some(dec("119900")),
                },
            ],
            stop_loss: Some(LadderLeg {
                price: dec("95000"),
                amount: dec("1"),
                limit_price: None,
            }),
            slippage_percent: dec("1"),
        };

        let report = client.create_multi_tpsl(&ladder).await.unwrap();
        assert_eq!(report.order_side, Side::Ask);
        let labels: Vec<_> = report.orders.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, vec!["TP1", "TP2", "SL"]);
        assert_eq!(report.orders[0].stop_order_id, Some(11));
        assert!(!report.orders[1].success);
        assert!(report.orders[1].error.as_deref().unwrap().contains("422"));
        assert_eq!(
            report.summary,
            LadderSummary {
                total: 3,
                successful: 2,
                failed: 1
            }
        );
    }

    #[tokio::test]
    async fn test_empty_ladder_is_rejected() {
        let mut http = MockHttpTransport::new();
        http.expect_execute().never();
        let client = PacificaClient::with_transport(&config(), Arc::new(http)).unwrap();

        let ladder = TpSlLadder {
            symbol: "BTC".to_string(),
            position_side: PositionSide::Short,
            take_profits: vec![],
            stop_loss: None,
            slippage_percent: DEFAULT_SLIPPAGE_PERCENT,
        };
        assert!(matches!(
            client.create_multi_tpsl(&ladder).await,
            Err(Error::Validation { .. })
        ));
    }
}
