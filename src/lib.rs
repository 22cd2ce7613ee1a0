//! # Portfolio Forensics
//!
//! A library for reconstructing an investor's real cash position from a raw
//! brokerage transaction export: money actually contributed versus
//! market-and-dividend-driven growth.
//!
//! ## Core Concepts
//!
//! - **Pocket investment**: net cash the investor personally contributed
//!   (buys minus sells), excluding reinvested dividends
//! - **DRIP**: dividends automatically reinvested into additional shares;
//!   tracked separately so their value is never counted twice
//! - **Forensic reconciliation**: replaying the transaction stream against a
//!   daily market series to separate self-funded capital from gains
//! - **Benchmark**: the same cash flows replayed into a reference instrument
//!   for comparison
//!
//! ## Pipeline
//!
//! Raw table → schema resolution → normalized transactions → (per ticker)
//! reconciliation against market data → per-ticker report. The strategy
//! simulator runs independently with explicit parameters.
//!
//! ## Example
//!
//! ```rust,ignore
//! use portfolio_forensics::*;
//!
//! let table = RawTable::new(
//!     vec!["Fecha".into(), "Símbolo".into(), "Descripción".into(),
//!          "Cantidad".into(), "Monto".into()],
//!     rows_from_upload,
//! );
//!
//! let transactions = resolve(&table)?;
//! let report = analyze_portfolio(&provider, &transactions);
//! for ticker_report in report.reports() {
//!     println!("{}: ROI {:.2}%", ticker_report.ticker, ticker_report.roi_percent);
//! }
//! ```

pub mod cache;
pub mod classify;
pub mod engine;
pub mod error;
pub mod market;
pub mod numeric;
pub mod schema;
pub mod simulator;

pub use cache::{fingerprint, AnalysisCache};
pub use classify::{classify, is_split, ActionKind, DripLeg};
pub use engine::{
    analyze_portfolio, replay_balances, AnalysisReport, Reconciler, RunningBalances,
    TickerOutcome, TickerReport, TrendPoint, DEFAULT_BENCHMARK,
};
pub use error::{PortfolioError, Result};
pub use market::{FixedProvider, MarketDataProvider, MarketDay};
pub use numeric::clean_numeric;
pub use schema::{resolve, RawTable, Transaction};
pub use simulator::{
    simulate_strategy, suggest_simulation_params, SimulationPoint, SimulationResult,
};

use log::info;

/// One-call pipeline: resolve an arbitrary broker table and reconcile every
/// ticker in it. Fails only on whole-table schema errors; per-ticker data
/// problems are contained inside the report.
pub fn analyze_table<P: MarketDataProvider>(
    provider: P,
    table: &RawTable,
) -> Result<AnalysisReport> {
    let transactions = resolve(table)?;
    info!(
        "Resolved {} transaction(s) from a {}-row table",
        transactions.len(),
        table.rows.len()
    );
    Ok(analyze_portfolio(provider, &transactions))
}
