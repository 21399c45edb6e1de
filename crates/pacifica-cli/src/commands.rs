//! Subcommand definitions and their mapping onto client calls.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use pacifica_core::api::{BatchAction, BatchInstruction, TpSlLadder};
use pacifica_core::types::{
    new_client_order_id, CancelTarget, HistoryQuery, Interval, LimitOrder, MarginMode,
    MarketOrder, Side, StopCancelTarget, StopOrder, TimeInForce, TpSl, DEFAULT_SLIPPAGE_PERCENT,
};
use pacifica_core::PacificaClient;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

#[derive(Subcommand)]
pub enum MarketCommands {
    /// List market specifications
    Info,
    /// Mark, oracle and mid prices for every market
    Prices,
    /// Price entry for one symbol
    Price { symbol: String },
    /// Order book snapshot
    Book {
        symbol: String,
        /// Price aggregation level
        #[arg(long, default_value_t = 1)]
        agg_level: u32,
    },
    /// Candles for a symbol
    Candles {
        symbol: String,
        #[arg(short, long, default_value = "1m")]
        interval: Interval,
        /// Start time in milliseconds
        #[arg(long)]
        start: u64,
        /// End time in milliseconds
        #[arg(long)]
        end: Option<u64>,
    },
    /// Most recent public trades
    Trades { symbol: String },
    /// Funding rate history
    Funding {
        symbol: String,
        #[arg(long, default_value_t = 100)]
        limit: u32,
        #[arg(long)]
        cursor: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Balances, equity and margin
    Info,
    /// Open positions
    Positions {
        /// Include flattened positions
        #[arg(long)]
        all: bool,
    },
    /// Fill history
    Trades(HistoryArgs),
    /// Equity history
    Equity(HistoryArgs),
    /// Balance history
    Balance(HistoryArgs),
    /// Funding payments
    Funding(HistoryArgs),
    /// Resting orders
    Orders,
    /// Order history
    OrderHistory(HistoryArgs),
    /// One order by id
    Order { order_id: u64 },
}

/// Filters shared by the history endpoints.
#[derive(Args)]
pub struct HistoryArgs {
    #[arg(short, long)]
    symbol: Option<String>,
    /// Start time in milliseconds
    #[arg(long)]
    start: Option<u64>,
    /// End time in milliseconds
    #[arg(long)]
    end: Option<u64>,
    #[arg(long, default_value_t = 100)]
    limit: u32,
    #[arg(long)]
    cursor: Option<String>,
}

impl HistoryArgs {
    fn query(&self) -> HistoryQuery {
        let mut query = HistoryQuery {
            symbol: self.symbol.as_deref().map(str::to_uppercase),
            ..HistoryQuery::default()
        }
        .between(self.start, self.end)
        .with_limit(self.limit);
        if let Some(cursor) = &self.cursor {
            query = query.with_cursor(cursor.clone());
        }
        query
    }
}

/// Fields common to order placement.
#[derive(Args)]
pub struct OrderArgs {
    symbol: String,
    /// bid/buy or ask/sell
    side: Side,
    amount: Decimal,
    #[arg(long)]
    reduce_only: bool,
    #[arg(long)]
    client_order_id: Option<Uuid>,
    /// Tag the order with a freshly generated client order id
    #[arg(long, conflicts_with = "client_order_id")]
    new_client_order_id: bool,
}

impl OrderArgs {
    fn client_order_id(&self) -> Option<Uuid> {
        self.client_order_id
            .or_else(|| self.new_client_order_id.then(new_client_order_id))
    }
}

#[derive(Subcommand)]
pub enum OrderCommands {
    /// Place a limit order
    Limit {
        #[command(flatten)]
        order: OrderArgs,
        #[arg(long)]
        price: Decimal,
        #[arg(long, default_value = "GTC")]
        tif: TimeInForce,
        /// Take-profit trigger attached to the order
        #[arg(long)]
        take_profit: Option<Decimal>,
        /// Stop-loss trigger attached to the order
        #[arg(long)]
        stop_loss: Option<Decimal>,
    },
    /// Place a market order
    Market {
        #[command(flatten)]
        order: OrderArgs,
        #[arg(long, default_value_t = DEFAULT_SLIPPAGE_PERCENT)]
        slippage: Decimal,
        #[arg(long)]
        take_profit: Option<Decimal>,
        #[arg(long)]
        stop_loss: Option<Decimal>,
    },
    /// Place a stop-market order
    StopMarket {
        #[command(flatten)]
        order: OrderArgs,
        #[arg(long)]
        stop_price: Decimal,
        #[arg(long, default_value_t = DEFAULT_SLIPPAGE_PERCENT)]
        slippage: Decimal,
    },
    /// Place a stop-limit order
    StopLimit {
        #[command(flatten)]
        order: OrderArgs,
        #[arg(long)]
        stop_price: Decimal,
        #[arg(long)]
        limit_price: Decimal,
    },
    /// Set take-profit and/or stop-loss on an open position
    Tpsl {
        symbol: String,
        #[arg(long)]
        take_profit: Option<Decimal>,
        #[arg(long)]
        take_profit_limit: Option<Decimal>,
        #[arg(long)]
        stop_loss: Option<Decimal>,
        #[arg(long)]
        stop_loss_limit: Option<Decimal>,
    },
    /// Cancel one order
    Cancel {
        symbol: String,
        #[arg(long, conflicts_with = "client_order_id", required_unless_present = "client_order_id")]
        order_id: Option<u64>,
        #[arg(long)]
        client_order_id: Option<Uuid>,
    },
    /// Cancel one stop order
    CancelStop {
        symbol: String,
        #[arg(long, conflicts_with = "client_order_id", required_unless_present = "client_order_id")]
        stop_order_id: Option<u64>,
        #[arg(long)]
        client_order_id: Option<Uuid>,
    },
    /// Cancel every order, optionally only on the given symbols
    CancelAll {
        #[arg(short, long = "symbol")]
        symbols: Vec<String>,
        #[arg(long)]
        exclude_reduce_only: bool,
    },
    /// Submit a batch of up to ten actions from a JSON file
    Batch {
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Place a ladder of reduce-only take-profit and stop-loss orders from a JSON file
    MultiTpsl {
        #[arg(short, long)]
        file: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum PositionCommands {
    /// Set leverage for a symbol
    Leverage { symbol: String, leverage: u32 },
    /// Switch margin mode for a symbol
    MarginMode { symbol: String, mode: MarginMode },
    /// Close the whole position with a reduce-only market order
    Close {
        symbol: String,
        #[arg(long)]
        slippage: Option<Decimal>,
    },
}

#[derive(Subcommand)]
pub enum SubaccountCommands {
    /// List subaccounts
    List,
    /// Create a subaccount
    Create { name: String },
    /// Move funds between the main account and a subaccount
    Transfer {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        amount: Decimal,
    },
}

fn to_json<T: Serialize>(value: T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

fn done() -> Value {
    json!({ "success": true })
}

fn tp_sl(stop_price: Option<Decimal>, limit_price: Option<Decimal>) -> Result<Option<TpSl>> {
    match (stop_price, limit_price) {
        (Some(stop), Some(limit)) => Ok(Some(TpSl::limit(stop, limit))),
        (Some(stop), None) => Ok(Some(TpSl::market(stop))),
        (None, Some(_)) => bail!("a limit price needs a trigger price"),
        (None, None) => Ok(None),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid JSON in {}", path.display()))
}

fn read_batch(path: &Path) -> Result<Vec<BatchAction>> {
    let instructions: Vec<BatchInstruction> = read_json(path)?;
    let actions = instructions
        .into_iter()
        .map(BatchInstruction::into_action)
        .collect::<pacifica_core::Result<Vec<_>>>()?;
    Ok(actions)
}

pub async fn market(client: &PacificaClient, cmd: MarketCommands) -> Result<Value> {
    match cmd {
        MarketCommands::Info => to_json(client.market_info().await?),
        MarketCommands::Prices => to_json(client.prices().await?),
        MarketCommands::Price { symbol } => to_json(client.symbol_price(&symbol).await?),
        MarketCommands::Book { symbol, agg_level } => {
            to_json(client.orderbook(&symbol.to_uppercase(), agg_level).await?)
        }
        MarketCommands::Candles {
            symbol,
            interval,
            start,
            end,
        } => to_json(
            client
                .candles(&symbol.to_uppercase(), interval, start, end)
                .await?,
        ),
        MarketCommands::Trades { symbol } => {
            to_json(client.recent_trades(&symbol.to_uppercase()).await?)
        }
        MarketCommands::Funding {
            symbol,
            limit,
            cursor,
        } => to_json(
            client
                .funding_history(&symbol.to_uppercase(), limit, cursor.as_deref())
                .await?,
        ),
    }
}

pub async fn account(client: &PacificaClient, cmd: AccountCommands) -> Result<Value> {
    match cmd {
        AccountCommands::Info => to_json(client.account_info().await?),
        AccountCommands::Positions { all: true } => to_json(client.positions().await?),
        AccountCommands::Positions { all: false } => to_json(client.open_positions().await?),
        AccountCommands::Trades(args) => to_json(client.trade_history(&args.query()).await?),
        AccountCommands::Equity(args) => to_json(client.equity_history(&args.query()).await?),
        AccountCommands::Balance(args) => to_json(client.balance_history(&args.query()).await?),
        AccountCommands::Funding(args) => to_json(client.account_funding(&args.query()).await?),
        AccountCommands::Orders => to_json(client.open_orders().await?),
        AccountCommands::OrderHistory(args) => {
            to_json(client.order_history(&args.query()).await?)
        }
        AccountCommands::Order { order_id } => to_json(client.order(order_id).await?),
    }
}

pub async fn order(client: &PacificaClient, cmd: OrderCommands) -> Result<Value> {
    match cmd {
        OrderCommands::Limit {
            order,
            price,
            tif,
            take_profit,
            stop_loss,
        } => {
            let mut request =
                LimitOrder::new(order.symbol.to_uppercase(), order.side, price, order.amount)
                    .with_tif(tif)
                    .reduce_only(order.reduce_only);
            if let Some(id) = order.client_order_id() {
                request = request.with_client_order_id(id);
            }
            if let Some(tp) = take_profit {
                request = request.with_take_profit(TpSl::market(tp));
            }
            if let Some(sl) = stop_loss {
                request = request.with_stop_loss(TpSl::market(sl));
            }
            to_json(client.create_limit_order(&request).await?)
        }
        OrderCommands::Market {
            order,
            slippage,
            take_profit,
            stop_loss,
        } => {
            let mut request =
                MarketOrder::new(order.symbol.to_uppercase(), order.side, order.amount)
                    .with_slippage(slippage)
                    .reduce_only(order.reduce_only);
            if let Some(id) = order.client_order_id() {
                request = request.with_client_order_id(id);
            }
            if let Some(tp) = take_profit {
                request = request.with_take_profit(TpSl::market(tp));
            }
            if let Some(sl) = stop_loss {
                request = request.with_stop_loss(TpSl::market(sl));
            }
            to_json(client.create_market_order(&request).await?)
        }
        OrderCommands::StopMarket {
            order,
            stop_price,
            slippage,
        } => {
            let mut request = StopOrder::market(
                order.symbol.to_uppercase(),
                order.side,
                order.amount,
                stop_price,
                slippage,
            )
            .reduce_only(order.reduce_only);
            if let Some(id) = order.client_order_id() {
                request = request.with_client_order_id(id);
            }
            to_json(client.create_stop_order(&request).await?)
        }
        OrderCommands::StopLimit {
            order,
            stop_price,
            limit_price,
        } => {
            let mut request = StopOrder::limit(
                order.symbol.to_uppercase(),
                order.side,
                order.amount,
                stop_price,
                limit_price,
            )
            .reduce_only(order.reduce_only);
            if let Some(id) = order.client_order_id() {
                request = request.with_client_order_id(id);
            }
            to_json(client.create_stop_order(&request).await?)
        }
        OrderCommands::Tpsl {
            symbol,
            take_profit,
            take_profit_limit,
            stop_loss,
            stop_loss_limit,
        } => {
            let tp = tp_sl(take_profit, take_profit_limit)?;
            let sl = tp_sl(stop_loss, stop_loss_limit)?;
            client
                .set_position_tpsl(&symbol.to_uppercase(), tp, sl)
                .await?;
            Ok(done())
        }
        OrderCommands::Cancel {
            symbol,
            order_id,
            client_order_id,
        } => {
            let target = match (order_id, client_order_id) {
                (Some(id), _) => CancelTarget::OrderId(id),
                (None, Some(id)) => CancelTarget::ClientOrderId(id),
                (None, None) => bail!("--order-id or --client-order-id is required"),
            };
            client.cancel_order(&symbol.to_uppercase(), target).await?;
            Ok(done())
        }
        OrderCommands::CancelStop {
            symbol,
            stop_order_id,
            client_order_id,
        } => {
            let target = match (stop_order_id, client_order_id) {
                (Some(id), _) => StopCancelTarget::StopOrderId(id),
                (None, Some(id)) => StopCancelTarget::ClientOrderId(id),
                (None, None) => bail!("--stop-order-id or --client-order-id is required"),
            };
            client
                .cancel_stop_order(&symbol.to_uppercase(), target)
                .await?;
            Ok(done())
        }
        OrderCommands::CancelAll {
            symbols,
            exclude_reduce_only,
        } => {
            let symbols = symbols.iter().map(|s| s.to_uppercase()).collect();
            client
                .cancel_all_orders(symbols, exclude_reduce_only)
                .await?;
            Ok(done())
        }
        OrderCommands::Batch { file } => {
            let actions = read_batch(&file)?;
            info!(actions = actions.len(), file = %file.display(), "Submitting batch");
            to_json(client.batch_orders(&actions).await?)
        }
        OrderCommands::MultiTpsl { file } => {
            let mut ladder: TpSlLadder = read_json(&file)?;
            ladder.symbol = ladder.symbol.to_uppercase();
            to_json(client.create_multi_tpsl(&ladder).await?)
        }
    }
}

pub async fn position(client: &PacificaClient, cmd: PositionCommands) -> Result<Value> {
    match cmd {
        PositionCommands::Leverage { symbol, leverage } => {
            client
                .update_leverage(&symbol.to_uppercase(), leverage)
                .await?;
            Ok(done())
        }
        PositionCommands::MarginMode { symbol, mode } => {
            client
                .update_margin_mode(&symbol.to_uppercase(), mode)
                .await?;
            Ok(done())
        }
        PositionCommands::Close { symbol, slippage } => {
            to_json(client.close_position(&symbol.to_uppercase(), slippage).await?)
        }
    }
}

pub async fn subaccount(client: &PacificaClient, cmd: SubaccountCommands) -> Result<Value> {
    match cmd {
        SubaccountCommands::List => to_json(client.subaccounts().await?),
        SubaccountCommands::Create { name } => to_json(client.create_subaccount(&name).await?),
        SubaccountCommands::Transfer { from, to, amount } => {
            client.transfer(&from, &to, amount).await?;
            Ok(done())
        }
    }
}
