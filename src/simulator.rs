use crate::error::{PortfolioError, Result};
use crate::market::MarketDataProvider;
use crate::schema::Transaction;
use chrono::NaiveDate;
use log::{debug, info};
use serde::Serialize;

/// Daily valuation of both strategy tracks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationPoint {
    pub date: NaiveDate,
    pub drip_wealth: f64,
    pub nodrip_wealth: f64,
    pub nodrip_cash: f64,
    pub price: f64,
}

/// Outcome of a DRIP vs collect-cash forward replay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationResult {
    pub initial_investment: f64,
    pub drip_final_value: f64,
    pub nodrip_final_value: f64,
    pub drip_roi_percent: f64,
    pub nodrip_roi_percent: f64,
    pub history: Vec<SimulationPoint>,
}

/// Replays the market series forward from `start_date`, comparing a
/// full-reinvestment strategy against collecting every dividend as cash.
///
/// Both tracks start with `initial_investment / first close` shares. Each
/// day: splits scale both share counts by the ratio; a positive per-share
/// dividend buys extra shares on the DRIP track and accrues cash on the
/// other. An empty (or post-filter empty) series is an error, distinct
/// from a valid zero-activity result.
pub fn simulate_strategy<P: MarketDataProvider>(
    provider: P,
    ticker: &str,
    start_date: NaiveDate,
    initial_investment: f64,
) -> Result<SimulationResult> {
    if initial_investment <= 0.0 {
        return Err(PortfolioError::InvalidInitialInvestment(initial_investment));
    }

    let series: Vec<_> = provider
        .fetch(ticker, start_date)
        .into_iter()
        .filter(|d| d.date >= start_date)
        .collect();

    if series.is_empty() {
        return Err(PortfolioError::EmptySimulation {
            ticker: ticker.to_string(),
            start_date,
        });
    }

    let start_price = series[0].close;
    let initial_shares = initial_investment / start_price;
    info!(
        "Simulating {} from {}: {:.4} initial shares at {:.2}",
        ticker, start_date, initial_shares, start_price
    );

    let mut drip_shares = initial_shares;
    let mut nodrip_shares = initial_shares;
    let mut nodrip_cash = 0.0;

    let mut history = Vec::with_capacity(series.len());
    for day in &series {
        if day.split_ratio != 0.0 {
            debug!("{}: split {} on {}", ticker, day.split_ratio, day.date);
            drip_shares *= day.split_ratio;
            nodrip_shares *= day.split_ratio;
        }

        if day.dividend > 0.0 {
            // DRIP compounds on a growing share base; the cash track keeps
            // a fixed share count and a growing cash balance.
            drip_shares += (day.dividend * drip_shares) / day.close;
            nodrip_cash += day.dividend * nodrip_shares;
        }

        history.push(SimulationPoint {
            date: day.date,
            drip_wealth: drip_shares * day.close,
            nodrip_wealth: nodrip_shares * day.close + nodrip_cash,
            nodrip_cash,
            price: day.close,
        });
    }

    let last = history.last().expect("series is non-empty");
    let drip_final_value = last.drip_wealth;
    let nodrip_final_value = last.nodrip_wealth;

    Ok(SimulationResult {
        initial_investment,
        drip_final_value,
        nodrip_final_value,
        drip_roi_percent: (drip_final_value - initial_investment) / initial_investment * 100.0,
        nodrip_roi_percent: (nodrip_final_value - initial_investment) / initial_investment * 100.0,
        history,
    })
}

/// Suggests default simulation parameters from a normalized table: the
/// first-appearing ticker and the earliest transaction date.
pub fn suggest_simulation_params(transactions: &[Transaction]) -> Option<(String, NaiveDate)> {
    let first_ticker = transactions.first()?.ticker.clone();
    let min_date = transactions.iter().map(|t| t.date).min()?;
    Some((first_ticker, min_date))
}
