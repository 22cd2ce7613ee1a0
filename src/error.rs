use thiserror::Error;

#[derive(Error, Debug)]
pub enum PortfolioError {
    #[error("Schema not recognized: missing required column(s) {}", .0.join(", "))]
    SchemaNotRecognized(Vec<String>),

    #[error("Input table is empty")]
    EmptyTable,

    #[error("No market data found for ticker: {0}")]
    NoMarketData(String),

    #[error("No simulation result: market series is empty for {ticker} on/after {start_date}")]
    EmptySimulation {
        ticker: String,
        start_date: chrono::NaiveDate,
    },

    #[error("Invalid initial investment {0}: must be a positive amount")]
    InvalidInitialInvestment(f64),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PortfolioError>;
