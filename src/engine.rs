use crate::classify::{classify, is_cash_dividend, is_split, ActionKind, DripLeg};
use crate::market::{MarketDataProvider, MarketDay};
use crate::schema::Transaction;
use chrono::NaiveDate;
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::BTreeMap;

/// Benchmark instrument replayed against the user's cash flows when none is
/// configured explicitly.
pub const DEFAULT_BENCHMARK: &str = "SPY";

/// The four running accumulators the replay maintains per ticker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunningBalances {
    /// Net cash from the investor's pocket: buys minus sells, excluding
    /// reinvested dividends.
    pub pocket_investment: f64,
    pub shares_owned: f64,
    pub dividends_collected_cash: f64,
    /// Value of dividends that were reinvested. Informational: the shares
    /// they bought are already inside the market value.
    pub dividends_collected_drip: f64,
}

impl RunningBalances {
    /// Applies one classified transaction to the balances.
    pub fn apply(&mut self, txn: &Transaction) {
        match classify(&txn.action) {
            ActionKind::Buy => {
                // Many brokers report buy amounts negative; force cost positive.
                self.pocket_investment += txn.amount.abs();
                self.shares_owned += txn.quantity.abs();
            }
            ActionKind::Sell => {
                self.pocket_investment -= txn.amount.abs();
                self.shares_owned -= txn.quantity.abs();
            }
            ActionKind::DripPurchase(DripLeg::Purchase) => {
                self.shares_owned += txn.quantity.abs();
                self.dividends_collected_drip += txn.amount.abs();
            }
            ActionKind::DripPurchase(DripLeg::Funding) => {
                // Funding-credit leg of a two-row DRIP; the purchase leg
                // already carries the shares and the value.
            }
            ActionKind::DripPurchase(DripLeg::Ambiguous) => {
                self.shares_owned += txn.quantity.abs();
                if txn.amount < 0.0 {
                    self.dividends_collected_drip += txn.amount.abs();
                }
            }
            ActionKind::CashDividend => {
                self.dividends_collected_cash += txn.amount.abs();
            }
            ActionKind::Unknown => {}
        }

        // A split row states the post-split absolute balance, so the share
        // count is reset to it, not adjusted by it.
        if is_split(&txn.action) && txn.quantity > 0.0 {
            self.shares_owned = txn.quantity;
        }
    }
}

/// Replays transactions in ascending date order and returns the final
/// balances. Input order breaks ties within a day (stable sort).
pub fn replay_balances(transactions: &[&Transaction]) -> RunningBalances {
    let mut ordered: Vec<&Transaction> = transactions.to_vec();
    ordered.sort_by_key(|t| t.date);

    let mut balances = RunningBalances::default();
    for txn in ordered {
        balances.apply(txn);
    }
    balances
}

/// One day of the derived trend series: the investor's position replayed on
/// the market series' date axis, next to the benchmark replay of the same
/// cash flows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub invested_capital: f64,
    pub market_value: f64,
    pub user_profit: f64,
    pub benchmark_profit: f64,
    pub user_return_pct: f64,
    pub benchmark_return_pct: f64,
}

/// Final forensic accounting for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickerReport {
    pub ticker: String,
    pub current_price: f64,
    pub shares_owned: f64,
    pub pocket_investment: f64,
    pub market_value: f64,
    pub dividends_collected_cash: f64,
    pub dividends_collected_drip: f64,
    pub total_dividends: f64,
    pub net_profit: f64,
    pub roi_percent: f64,
    pub daily_trend: Vec<TrendPoint>,
}

/// Per-ticker result: either a full report or a contained failure that
/// leaves sibling tickers unaffected.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TickerOutcome {
    Report(TickerReport),
    Error { ticker: String, error: String },
}

impl TickerOutcome {
    pub fn ticker(&self) -> &str {
        match self {
            TickerOutcome::Report(r) => &r.ticker,
            TickerOutcome::Error { ticker, .. } => ticker,
        }
    }

    pub fn report(&self) -> Option<&TickerReport> {
        match self {
            TickerOutcome::Report(r) => Some(r),
            TickerOutcome::Error { .. } => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, TickerOutcome::Error { .. })
    }
}

/// All per-ticker outcomes of one analysis run, in order of each ticker's
/// first appearance in the input table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub outcomes: Vec<TickerOutcome>,
}

impl AnalysisReport {
    pub fn get(&self, ticker: &str) -> Option<&TickerOutcome> {
        self.outcomes.iter().find(|o| o.ticker() == ticker)
    }

    pub fn reports(&self) -> impl Iterator<Item = &TickerReport> {
        self.outcomes.iter().filter_map(|o| o.report())
    }
}

/// Replays a normalized transaction stream against daily market data, one
/// ticker at a time.
pub struct Reconciler<P> {
    provider: P,
    benchmark: String,
}

impl<P: MarketDataProvider> Reconciler<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            benchmark: DEFAULT_BENCHMARK.to_string(),
        }
    }

    pub fn with_benchmark(mut self, ticker: &str) -> Self {
        self.benchmark = ticker.to_string();
        self
    }

    /// Analyzes every ticker in the table. A ticker with no market data
    /// yields an error outcome; the others are unaffected.
    pub fn analyze(&self, transactions: &[Transaction]) -> AnalysisReport {
        let mut order: Vec<&str> = Vec::new();
        for txn in transactions {
            if !order.contains(&txn.ticker.as_str()) {
                order.push(&txn.ticker);
            }
        }
        info!("Analyzing {} ticker(s)", order.len());

        let mut outcomes = Vec::with_capacity(order.len());
        for ticker in order {
            let rows: Vec<&Transaction> = transactions
                .iter()
                .filter(|t| t.ticker == ticker)
                .collect();
            outcomes.push(self.analyze_ticker(ticker, &rows));
        }

        AnalysisReport { outcomes }
    }

    fn analyze_ticker(&self, ticker: &str, rows: &[&Transaction]) -> TickerOutcome {
        let first_date = match rows.iter().map(|t| t.date).min() {
            Some(d) => d,
            None => {
                return TickerOutcome::Error {
                    ticker: ticker.to_string(),
                    error: "No transactions".to_string(),
                }
            }
        };

        let market = self.provider.fetch(ticker, first_date);
        if market.is_empty() {
            debug!("No market data found for {}", ticker);
            return TickerOutcome::Error {
                ticker: ticker.to_string(),
                error: "No market data found".to_string(),
            };
        }
        let current_price = market.last().map(|d| d.close).unwrap_or(0.0);

        let balances = replay_balances(rows);

        let market_value = balances.shares_owned * current_price;
        // Reinvested dividends are already inside market_value; adding
        // dividends_collected_drip here would count them twice.
        let gross_value = market_value + balances.dividends_collected_cash;
        let net_profit = gross_value - balances.pocket_investment;
        let roi_percent = if balances.pocket_investment != 0.0 {
            net_profit / balances.pocket_investment * 100.0
        } else {
            0.0
        };
        let total_dividends =
            balances.dividends_collected_cash + balances.dividends_collected_drip;

        let daily_trend = self.derive_daily_trend(rows, &market, first_date);

        debug!(
            "{}: pocket={:.2} shares={:.4} net_profit={:.2} roi={:.2}%",
            ticker, balances.pocket_investment, balances.shares_owned, net_profit, roi_percent
        );

        TickerOutcome::Report(TickerReport {
            ticker: ticker.to_string(),
            current_price,
            shares_owned: balances.shares_owned,
            pocket_investment: balances.pocket_investment,
            market_value,
            dividends_collected_cash: balances.dividends_collected_cash,
            dividends_collected_drip: balances.dividends_collected_drip,
            total_dividends,
            net_profit,
            roi_percent,
            daily_trend,
        })
    }

    /// Aggregates same-day transactions, reindexes them onto the market
    /// series' date axis (zero activity on missing days) and derives the
    /// running position plus the benchmark replay of the same cash flows.
    fn derive_daily_trend(
        &self,
        rows: &[&Transaction],
        market: &[MarketDay],
        first_date: NaiveDate,
    ) -> Vec<TrendPoint> {
        let mut day_quantity: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        let mut day_amount: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        let mut day_cash_div: BTreeMap<NaiveDate, f64> = BTreeMap::new();

        for txn in rows {
            *day_quantity.entry(txn.date).or_default() += txn.quantity;
            *day_amount.entry(txn.date).or_default() += txn.amount;
            if is_cash_dividend(&txn.action) {
                *day_cash_div.entry(txn.date).or_default() += txn.amount;
            }
        }

        let benchmark_closes = self.benchmark_closes(first_date);

        let mut shares_held = 0.0;
        let mut invested_capital = 0.0;
        let mut cumulative_cash_div = 0.0;
        let mut benchmark_shares = 0.0;

        let mut trend = Vec::with_capacity(market.len());
        for day in market {
            shares_held += day_quantity.get(&day.date).copied().unwrap_or(0.0);
            // Inflows positive: buy amounts are negative cash, so flip sign.
            let invested_today = -day_amount.get(&day.date).copied().unwrap_or(0.0);
            invested_capital += invested_today;
            cumulative_cash_div += day_cash_div.get(&day.date).map(|v| v.abs()).unwrap_or(0.0);

            let market_value = shares_held * day.close;
            let user_profit = market_value + cumulative_cash_div - invested_capital;

            let benchmark_profit = match &benchmark_closes {
                Some(closes) => {
                    // Forward-fill the benchmark price onto this date.
                    let price = closes
                        .range(..=day.date)
                        .next_back()
                        .map(|(_, p)| *p)
                        .unwrap_or(0.0);
                    if price > 0.0 {
                        benchmark_shares += invested_today / price;
                    }
                    benchmark_shares * price - invested_capital
                }
                None => 0.0,
            };

            let user_return_pct = if invested_capital > 0.0 {
                user_profit / invested_capital * 100.0
            } else {
                0.0
            };
            let benchmark_return_pct = if invested_capital > 0.0 {
                benchmark_profit / invested_capital * 100.0
            } else {
                0.0
            };

            trend.push(TrendPoint {
                date: day.date,
                invested_capital,
                market_value,
                user_profit,
                benchmark_profit,
                user_return_pct,
                benchmark_return_pct,
            });
        }

        trend
    }

    /// Benchmark closes by date, or `None` when the collaborator has no
    /// data. A missing benchmark degrades to a zero profit curve; it never
    /// fails the ticker.
    fn benchmark_closes(&self, first_date: NaiveDate) -> Option<BTreeMap<NaiveDate, f64>> {
        let series = self.provider.fetch(&self.benchmark, first_date);
        if series.is_empty() {
            warn!(
                "No benchmark data for {}; falling back to zero benchmark series",
                self.benchmark
            );
            return None;
        }
        Some(series.into_iter().map(|d| (d.date, d.close)).collect())
    }
}

/// Convenience entry point: analyze with the default benchmark.
pub fn analyze_portfolio<P: MarketDataProvider>(
    provider: P,
    transactions: &[Transaction],
) -> AnalysisReport {
    Reconciler::new(provider).analyze(transactions)
}
