//! Pacifica trading client: construction, market data and account queries.
//!
//! Mutating operations live in [`super::trading`] and [`super::batch`].

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, info};

use super::transport::{HttpTransport, ReqwestTransport, Transport};
use crate::config::Config;
use crate::signing::{signer_from_secret, Action, PublicIdentity, RequestSigner, SigningScheme};
use crate::types::{
    AccountFundingEntry, AccountInfo, ApiResponse, BalanceHistoryEntry, Candle, EquityHistoryEntry,
    FundingHistory, HistoryQuery, Interval, MarketInfo, OpenOrder, OrderHistoryEntry, Orderbook,
    Page, Position, PriceInfo, RecentTrade, Subaccount, TradeHistoryEntry,
};
use crate::{Error, Result};

/// Client for one trading account and agent key.
///
/// Holds no mutable state; clones share the transport and signer and may be
/// used concurrently.
#[derive(Debug, Clone)]
pub struct PacificaClient {
    transport: Transport,
}

impl PacificaClient {
    /// Build a client with the reqwest transport.
    ///
    /// The agent key is decoded first, so malformed key material fails here
    /// before any HTTP client exists.
    pub fn new(config: &Config) -> Result<Self> {
        let signer = request_signer(config)?;
        let http = ReqwestTransport::new(
            config.base_url(),
            config.request_timeout(),
            config.connect_timeout(),
        )?;
        info!(
            base_url = config.base_url(),
            account = %config.account_address,
            scheme = ?config.signing_scheme,
            "Pacifica client initialized"
        );
        Ok(Self::from_transport(Transport::new(Arc::new(http), signer)))
    }

    /// Build a client over a caller-supplied transport.
    pub fn with_transport(config: &Config, http: Arc<dyn HttpTransport>) -> Result<Self> {
        let signer = request_signer(config)?;
        Ok(Self::from_transport(Transport::new(http, signer)))
    }

    pub fn from_transport(transport: Transport) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// The trading account address.
    pub fn account(&self) -> &str {
        self.transport.signer().account()
    }

    /// The agent wallet address authorized to sign for the account.
    pub fn agent_wallet(&self) -> &str {
        self.transport.signer().agent_wallet()
    }

    pub fn signing_scheme(&self) -> SigningScheme {
        self.transport.signer().signer().scheme()
    }

    pub fn public_identity(&self) -> PublicIdentity {
        self.transport.signer().public_identity()
    }

    /// Base58 public key (Ed25519) or checksummed address (wallet) of the
    /// agent key.
    pub fn signer_public_key(&self) -> String {
        self.public_identity().to_string()
    }

    // ===== Market data =====

    pub async fn market_info(&self) -> Result<Vec<MarketInfo>> {
        self.get_data("/api/v1/info", &[]).await
    }

    pub async fn prices(&self) -> Result<Vec<PriceInfo>> {
        self.get_data("/api/v1/info/prices", &[]).await
    }

    /// Price entry for one symbol, matched case-insensitively.
    pub async fn symbol_price(&self, symbol: &str) -> Result<PriceInfo> {
        self.prices()
            .await?
            .into_iter()
            .find(|p| p.symbol.eq_ignore_ascii_case(symbol))
            .ok_or_else(|| Error::NotFound {
                kind: "Symbol",
                id: symbol.to_string(),
            })
    }

    pub async fn orderbook(&self, symbol: &str, agg_level: u32) -> Result<Orderbook> {
        self.get_data(
            "/api/v1/book",
            &[
                ("symbol", symbol.to_string()),
                ("agg_level", agg_level.to_string()),
            ],
        )
        .await
    }

    pub async fn candles(
        &self,
        symbol: &str,
        interval: Interval,
        start_time: u64,
        end_time: Option<u64>,
    ) -> Result<Vec<Candle>> {
        self.get_data(
            "/api/v1/kline",
            &[
                ("symbol", symbol.to_string()),
                ("interval", interval.to_string()),
                ("start_time", start_time.to_string()),
                ("end_time", end_time.map(|t| t.to_string()).unwrap_or_default()),
            ],
        )
        .await
    }

    pub async fn recent_trades(&self, symbol: &str) -> Result<Vec<RecentTrade>> {
        self.get_data("/api/v1/trades", &[("symbol", symbol.to_string())])
            .await
    }

    pub async fn funding_history(
        &self,
        symbol: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<Page<FundingHistory>> {
        self.get_page(
            "/api/v1/funding_rate/history",
            &[
                ("symbol", symbol.to_string()),
                ("limit", limit.to_string()),
                ("cursor", cursor.unwrap_or_default().to_string()),
            ],
        )
        .await
    }

    // ===== Account queries =====

    pub async fn account_info(&self) -> Result<AccountInfo> {
        self.get_data("/api/v1/account", &self.account_param()).await
    }

    /// All positions as reported, including flattened ones.
    pub async fn positions(&self) -> Result<Vec<Position>> {
        self.get_data("/api/v1/positions", &self.account_param())
            .await
    }

    /// Positions with a non-zero amount.
    pub async fn open_positions(&self) -> Result<Vec<Position>> {
        let positions = self.positions().await?;
        Ok(positions.into_iter().filter(Position::is_open).collect())
    }

    /// The open position on `symbol`, matched case-insensitively.
    pub async fn position(&self, symbol: &str) -> Result<Position> {
        self.positions()
            .await?
            .into_iter()
            .find(|p| p.symbol.eq_ignore_ascii_case(symbol) && p.is_open())
            .ok_or_else(|| Error::NotFound {
                kind: "Position",
                id: symbol.to_string(),
            })
    }

    pub async fn trade_history(&self, query: &HistoryQuery) -> Result<Page<TradeHistoryEntry>> {
        self.get_page("/api/v1/trades/history", &query.to_params(self.account()))
            .await
    }

    pub async fn open_orders(&self) -> Result<Vec<OpenOrder>> {
        self.get_data("/api/v1/orders", &self.account_param()).await
    }

    pub async fn order_history(&self, query: &HistoryQuery) -> Result<Page<OrderHistoryEntry>> {
        self.get_page("/api/v1/orders/history", &query.to_params(self.account()))
            .await
    }

    pub async fn order(&self, order_id: u64) -> Result<OrderHistoryEntry> {
        let path = format!("/api/v1/orders/{order_id}");
        let response: ApiResponse<OrderHistoryEntry> =
            self.transport.get(&path, &self.account_param()).await?;
        response.ensure_success()?;
        response.data.ok_or_else(|| Error::NotFound {
            kind: "Order",
            id: order_id.to_string(),
        })
    }

    pub async fn equity_history(&self, query: &HistoryQuery) -> Result<Page<EquityHistoryEntry>> {
        self.get_page(
            "/api/v1/account/equity_history",
            &query.to_params(self.account()),
        )
        .await
    }

    pub async fn balance_history(
        &self,
        query: &HistoryQuery,
    ) -> Result<Page<BalanceHistoryEntry>> {
        self.get_page(
            "/api/v1/account/balance_history",
            &query.to_params(self.account()),
        )
        .await
    }

    pub async fn account_funding(
        &self,
        query: &HistoryQuery,
    ) -> Result<Page<AccountFundingEntry>> {
        self.get_page("/api/v1/account/funding", &query.to_params(self.account()))
            .await
    }

    pub async fn subaccounts(&self) -> Result<Vec<Subaccount>> {
        self.get_data("/api/v1/subaccounts", &self.account_param())
            .await
    }

    // ===== Helpers =====

    fn account_param(&self) -> [(&'static str, String); 1] {
        [("account", self.account().to_string())]
    }

    async fn get_data<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let response: ApiResponse<T> = self.transport.get(path, params).await?;
        response.into_data()
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<Page<T>> {
        let response: ApiResponse<Vec<T>> = self.transport.get(path, params).await?;
        response.into_page()
    }

    /// Sign and send an action, returning the response data.
    pub(crate) async fn submit<A, T>(&self, action: &A) -> Result<T>
    where
        A: Action + Sync,
        T: DeserializeOwned,
    {
        debug!(kind = %A::KIND, path = A::PATH, "Submitting signed action");
        let response: ApiResponse<T> = self.transport.post_action(action).await?;
        response.into_data()
    }

    /// Sign and send an action whose response carries no data of interest.
    pub(crate) async fn submit_unit<A>(&self, action: &A) -> Result<()>
    where
        A: Action + Sync,
    {
        debug!(kind = %A::KIND, path = A::PATH, "Submitting signed action");
        let response: ApiResponse<serde_json::Value> = self.transport.post_action(action).await?;
        response.ensure_success()
    }
}

fn request_signer(config: &Config) -> Result<RequestSigner> {
    let signer = signer_from_secret(
        config.signing_scheme,
        &config.agent_private_key,
        config.key_encoding(),
    )?;
    Ok(RequestSigner::new(
        config.account_address.clone(),
        config.agent_wallet_address.clone(),
        signer,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::transport::{HttpResponse, Method, MockHttpTransport};
    use crate::config::Network;
    use crate::signing::base58;
    use rust_decimal::Decimal;
    use serde_json::json;

    const SEED_HEX: &str = "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";
    const PUBLIC_HEX: &str = "d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a";

    fn config() -> Config {
        let secret = base58::encode(&hex::decode(SEED_HEX).unwrap());
        Config::new(Network::Testnet, "Acct111", "Agent222", secret)
    }

    fn ok(data: serde_json::Value) -> Result<HttpResponse> {
        Ok(HttpResponse {
            status: 200,
            body: json!({"success": true, "data": data, "error": null, "code": null}).to_string(),
        })
    }

    fn price(symbol: &str, mark: &str) -> serde_json::Value {
        json!({
            "symbol": symbol, "mark": mark, "mid": mark, "oracle": mark,
            "funding": "0.0001", "next_funding": "0.0001", "open_interest": "100",
            "volume_24h": "1000", "yesterday_price": mark, "timestamp": 1
        })
    }

    fn position(symbol: &str, side: &str, amount: &str) -> serde_json::Value {
        json!({
            "symbol": symbol, "side": side, "amount": amount, "entry_price": "100",
            "margin": "0", "funding": "0", "isolated": false,
            "created_at": 1, "updated_at": 1
        })
    }

    #[test]
    fn test_malformed_secret_never_reaches_transport() {
        for bad_secret in ["", "0OIl", "3mJr7AoUXx2Wqd", "not base58 at all!"] {
            let mut http = MockHttpTransport::new();
            http.expect_execute().never();

            let config = Config::new(Network::Mainnet, "Acct", "Agent", bad_secret);
            let err = PacificaClient::with_transport(&config, Arc::new(http)).unwrap_err();
            assert!(matches!(err, Error::KeyFormat { .. }), "{bad_secret}");
        }
    }

    #[test]
    fn test_signer_public_key_derived_from_seed() {
        let http = MockHttpTransport::new();
        let client = PacificaClient::with_transport(&config(), Arc::new(http)).unwrap();
        let public = base58::decode(&client.signer_public_key()).unwrap();
        assert_eq!(hex::encode(public), PUBLIC_HEX);
        assert_eq!(client.account(), "Acct111");
        assert_eq!(client.agent_wallet(), "Agent222");
        assert_eq!(client.signing_scheme(), SigningScheme::Ed25519);
    }

    #[tokio::test]
    async fn test_symbol_price_is_case_insensitive() {
        let mut http = MockHttpTransport::new();
        http.expect_execute()
            .withf(|req| req.method == Method::Get && req.path == "/api/v1/info/prices")
            .times(2)
            .returning(|_| ok(json!([price("BTC", "100000"), price("ETH", "3500")])));

        let client = PacificaClient::with_transport(&config(), Arc::new(http)).unwrap();
        let eth = client.symbol_price("eth").await.unwrap();
        assert_eq!(eth.mark, Decimal::new(3500, 0));

        let err = client.symbol_price("DOGE").await.unwrap_err();
        assert!(matches!(err, Error::NotFound { kind: "Symbol", .. }));
    }

    #[tokio::test]
    async fn test_open_positions_drop_zero_amounts() {
        let mut http = MockHttpTransport::new();
        http.expect_execute()
            .withf(|req| {
                req.path == "/api/v1/positions"
                    && req.query == vec![("account".to_string(), "Acct111".to_string())]
            })
            .times(1)
            .returning(|_| {
                ok(json!([
                    position("BTC", "long", "1.5"),
                    position("ETH", "short", "0"),
                    position("SOL", "short", "10")
                ]))
            });

        let client = PacificaClient::with_transport(&config(), Arc::new(http)).unwrap();
        let open = client.open_positions().await.unwrap();
        let symbols: Vec<_> = open.iter().map(|p| p.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["BTC", "SOL"]);
    }

    #[tokio::test]
    async fn test_candles_omit_missing_end_time() {
        let mut http = MockHttpTransport::new();
        http.expect_execute()
            .withf(|req| {
                req.path == "/api/v1/kline"
                    && req.query
                        == vec![
                            ("symbol".to_string(), "BTC".to_string()),
                            ("interval".to_string(), "1h".to_string()),
                            ("start_time".to_string(), "1000".to_string()),
                        ]
            })
            .times(1)
            .returning(|_| ok(json!([])));

        let client = PacificaClient::with_transport(&config(), Arc::new(http)).unwrap();
        let candles = client
            .candles("BTC", Interval::OneHour, 1000, None)
            .await
            .unwrap();
        assert!(candles.is_empty());
    }

    #[tokio::test]
    async fn test_unsuccessful_envelope_surfaces_api_error() {
        let mut http = MockHttpTransport::new();
        http.expect_execute().times(1).returning(|_| {
            Ok(HttpResponse {
                status: 200,
                body: r#"{"success":false,"data":null,"error":"Account not found","code":1}"#
                    .to_string(),
            })
        });

        let client = PacificaClient::with_transport(&config(), Arc::new(http)).unwrap();
        let err = client.account_info().await.unwrap_err();
        assert_eq!(
            err.api_code(),
            Some(crate::types::ApiErrorCode::AccountNotFound)
        );
    }

    #[tokio::test]
    async fn test_order_missing_from_success_is_not_found() {
        let mut http = MockHttpTransport::new();
        http.expect_execute()
            .withf(|req| req.path == "/api/v1/orders/77")
            .times(1)
            .returning(|_| ok(serde_json::Value::Null));

        let client = PacificaClient::with_transport(&config(), Arc::new(http)).unwrap();
        let err = client.order(77).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { kind: "Order", .. }));
    }

    #[tokio::test]
    async fn test_history_page_carries_cursor() {
        let mut http = MockHttpTransport::new();
        http.expect_execute()
            .withf(|req| {
                req.path == "/api/v1/account/equity_history"
                    && req.query.contains(&("limit".to_string(), "20".to_string()))
            })
            .times(1)
            .returning(|_| {
                Ok(HttpResponse {
                    status: 200,
                    body: json!({
                        "success": true,
                        "data": [{"equity": "1000.5", "timestamp": 1}],
                        "error": null,
                        "code": null,
                        "next_cursor": "c2",
                        "has_more": true
                    })
                    .to_string(),
                })
            });

        let client = PacificaClient::with_transport(&config(), Arc::new(http)).unwrap();
        let page = client
            .equity_history(&HistoryQuery::default().with_limit(20))
            .await
            .unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.next_cursor.as_deref(), Some("c2"));
        assert!(page.has_more);
    }
}
