use crate::error::{PortfolioError, Result};
use crate::numeric::clean_numeric;
use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};

/// How many leading rows are scanned for a header before giving up.
pub const HEADER_SCAN_LIMIT: usize = 20;

/// A tabular value as read from an upload: unknown column labels, unknown
/// cell formatting, possibly preceded by metadata rows. Encoding and file
/// I/O are the reader's problem; this type only sees text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.rows.is_empty()
    }
}

/// A normalized transaction row. The raw action text is retained so the
/// classifier can be re-applied statelessly wherever it is needed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    pub action: String,
    pub ticker: String,
    pub quantity: f64,
    pub price: f64,
    pub amount: f64,
}

/// Keywords that mark a row as a plausible header, spanning English and
/// Spanish broker exports.
const HEADER_KEYWORDS: &[&str] = &[
    "ticker", "symbol", "símbolo", "simbolo",
    "date", "fecha", "time",
    "quantity", "cantidad", "shares", "acciones",
    "price", "precio",
    "amount", "monto", "total", "valor",
    "action", "accion", "operacion", "operation", "tipo",
];

/// Maps a raw column label (lower-cased, trimmed) to its canonical name.
/// Unmatched labels pass through untouched and are ignored downstream.
fn canonical_name(label: &str) -> Option<&'static str> {
    match label.trim().to_lowercase().as_str() {
        "fecha" | "date" | "time" => Some("Date"),
        "descripción" | "descripcion" | "action" | "operación" | "operacion" => Some("Action"),
        "símbolo" | "simbolo" | "ticker" | "symbol" => Some("Ticker"),
        "cantidad" | "quantity" | "shares" => Some("Quantity"),
        "precio" | "price" => Some("Price"),
        "monto" | "amount" | "total" | "value" => Some("Amount"),
        _ => None,
    }
}

/// A row is judged "likely a header" when at least two distinct keywords
/// appear somewhere in its cells (e.g. a date label AND a ticker label).
fn is_likely_header(cells: &[String]) -> bool {
    let lowered: Vec<String> = cells.iter().map(|c| c.to_lowercase()).collect();
    let matches = HEADER_KEYWORDS
        .iter()
        .filter(|key| lowered.iter().any(|cell| cell.contains(*key)))
        .count();
    matches >= 2
}

/// Broker exports disagree on date formats; try the common ones in order.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }
    // Timestamps: keep only the date part.
    let date_part = text.split_whitespace().next().unwrap_or(text);

    const FORMATS: &[&str] = &[
        "%Y-%m-%d",
        "%Y/%m/%d",
        "%d/%m/%Y",
        "%m/%d/%Y",
        "%d-%m-%Y",
        "%d.%m.%Y",
        "%Y-%m-%dT%H:%M:%S",
    ];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

/// Resolves an arbitrary broker table into normalized transactions.
///
/// 1. If the current labels do not look like a header, scan the first
///    [`HEADER_SCAN_LIMIT`] rows; the first row that does is promoted and
///    everything at or before it discarded.
/// 2. Matched labels are renamed to the canonical schema
///    {Date, Action, Ticker, Quantity, Price, Amount}.
/// 3. Date and Ticker are required; their absence fails the whole table.
///    The other columns degrade to empty text / zero.
/// 4. Rows whose date fails to parse or whose ticker is blank are dropped.
pub fn resolve(table: &RawTable) -> Result<Vec<Transaction>> {
    if table.is_empty() {
        return Err(PortfolioError::EmptyTable);
    }

    let (columns, data_rows) = locate_header(table);

    let mut date_idx = None;
    let mut action_idx = None;
    let mut ticker_idx = None;
    let mut quantity_idx = None;
    let mut price_idx = None;
    let mut amount_idx = None;

    for (i, label) in columns.iter().enumerate() {
        match canonical_name(label) {
            Some("Date") => date_idx = date_idx.or(Some(i)),
            Some("Action") => action_idx = action_idx.or(Some(i)),
            Some("Ticker") => ticker_idx = ticker_idx.or(Some(i)),
            Some("Quantity") => quantity_idx = quantity_idx.or(Some(i)),
            Some("Price") => price_idx = price_idx.or(Some(i)),
            Some("Amount") => amount_idx = amount_idx.or(Some(i)),
            _ => {}
        }
    }

    let mut missing = Vec::new();
    if date_idx.is_none() {
        missing.push("Date".to_string());
    }
    if ticker_idx.is_none() {
        missing.push("Ticker".to_string());
    }
    if !missing.is_empty() {
        return Err(PortfolioError::SchemaNotRecognized(missing));
    }
    let date_idx = date_idx.unwrap();
    let ticker_idx = ticker_idx.unwrap();

    let cell = |row: &[String], idx: Option<usize>| -> String {
        idx.and_then(|i| row.get(i)).cloned().unwrap_or_default()
    };

    let mut transactions = Vec::with_capacity(data_rows.len());
    let mut dropped = 0usize;

    for row in data_rows {
        let date = match row.get(date_idx).and_then(|c| parse_date(c)) {
            Some(d) => d,
            None => {
                dropped += 1;
                continue;
            }
        };
        let ticker = row.get(ticker_idx).map(|c| c.trim()).unwrap_or_default();
        if ticker.is_empty() {
            dropped += 1;
            continue;
        }

        transactions.push(Transaction {
            date,
            action: cell(row, action_idx).trim().to_string(),
            ticker: ticker.to_string(),
            quantity: clean_numeric(&cell(row, quantity_idx)),
            price: clean_numeric(&cell(row, price_idx)),
            amount: clean_numeric(&cell(row, amount_idx)),
        });
    }

    if dropped > 0 {
        debug!("Dropped {} row(s) with unparsable dates or blank tickers", dropped);
    }

    Ok(transactions)
}

/// Returns the effective header labels and the data rows below them.
fn locate_header(table: &RawTable) -> (Vec<String>, &[Vec<String>]) {
    if is_likely_header(&table.columns) {
        return (table.columns.clone(), &table.rows);
    }

    let scan = table.rows.len().min(HEADER_SCAN_LIMIT);
    for i in 0..scan {
        if is_likely_header(&table.rows[i]) {
            debug!("Promoted row {} to header after metadata scan", i);
            return (table.rows[i].clone(), &table.rows[i + 1..]);
        }
    }

    // No header found anywhere; the required-column check downstream will
    // surface the schema failure.
    (table.columns.clone(), &table.rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_header_already_present() {
        let table = RawTable::new(
            row(&["Date", "Action", "Ticker", "Quantity", "Price", "Amount"]),
            vec![row(&["2023-01-15", "Buy", "TSLY", "10", "15.00", "-150.00"])],
        );

        let txns = resolve(&table).unwrap();
        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].ticker, "TSLY");
        assert_eq!(txns[0].quantity, 10.0);
        assert_eq!(txns[0].amount, -150.0);
        assert_eq!(
            txns[0].date,
            NaiveDate::from_ymd_opt(2023, 1, 15).unwrap()
        );
    }

    #[test]
    fn test_metadata_rows_then_spanish_header() {
        let table = RawTable::new(
            row(&["Unnamed: 0", "Unnamed: 1", "Unnamed: 2", "Unnamed: 3"]),
            vec![
                row(&["Estado de cuenta", "", "", ""]),
                row(&["Cliente: 12345", "", "", ""]),
                row(&["", "", "", ""]),
                row(&["Fecha", "Símbolo", "Cantidad", "Monto"]),
                row(&["2023-02-01", "NVDY", "5", "-100,50"]),
                row(&["2023-02-02", "NVDY", "3", "-60,00"]),
            ],
        );

        let txns = resolve(&table).unwrap();
        assert_eq!(txns.len(), 2);
        assert_eq!(txns[0].ticker, "NVDY");
        assert_eq!(txns[0].amount, -100.50);
        // Action and Price were absent from the export; they degrade.
        assert_eq!(txns[0].action, "");
        assert_eq!(txns[0].price, 0.0);
    }

    #[test]
    fn test_unparsable_dates_dropped() {
        let table = RawTable::new(
            row(&["Date", "Ticker", "Quantity", "Amount"]),
            vec![
                row(&["not-a-date", "MSTY", "1", "-20"]),
                row(&["2023-03-01", "MSTY", "2", "-40"]),
            ],
        );

        let txns = resolve(&table).unwrap();
        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].quantity, 2.0);
    }

    #[test]
    fn test_schema_not_recognized() {
        let table = RawTable::new(
            row(&["a", "b", "c"]),
            vec![row(&["1", "2", "3"]), row(&["4", "5", "6"])],
        );

        let err = resolve(&table).unwrap_err();
        match err {
            PortfolioError::SchemaNotRecognized(missing) => {
                assert_eq!(missing, vec!["Date".to_string(), "Ticker".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_header_scan_limit() {
        let mut rows: Vec<Vec<String>> =
            (0..25).map(|i| row(&[&format!("meta {i}"), "", ""])).collect();
        rows.push(row(&["Fecha", "Ticker", "Monto"]));
        rows.push(row(&["2023-01-01", "TSLY", "-10"]));
        let table = RawTable::new(row(&["x", "y", "z"]), rows);

        // The real header sits past the scan window, so resolution fails
        // with a schema error instead of partial data.
        assert!(matches!(
            resolve(&table),
            Err(PortfolioError::SchemaNotRecognized(_))
        ));
    }

    #[test]
    fn test_mixed_date_formats() {
        assert_eq!(
            parse_date("15/01/2023"),
            NaiveDate::from_ymd_opt(2023, 1, 15)
        );
        assert_eq!(
            parse_date("2023-01-15 09:30:00"),
            NaiveDate::from_ymd_opt(2023, 1, 15)
        );
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("garbage"), None);
    }

    #[test]
    fn test_ticker_trimmed_and_blank_dropped() {
        let table = RawTable::new(
            row(&["Date", "Ticker", "Quantity"]),
            vec![
                row(&["2023-01-01", "  TSLY  ", "1"]),
                row(&["2023-01-02", "   ", "1"]),
            ],
        );

        let txns = resolve(&table).unwrap();
        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].ticker, "TSLY");
    }

    #[test]
    fn test_empty_table() {
        assert!(matches!(
            resolve(&RawTable::default()),
            Err(PortfolioError::EmptyTable)
        ));
    }
}
