use serde::{Deserialize, Serialize};

/// Closed taxonomy for broker action descriptions.
///
/// Classification is a pure function of the lower-cased text; it is
/// recomputed wherever needed rather than stored on the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    Buy,
    Sell,
    DripPurchase(DripLeg),
    CashDividend,
    Unknown,
}

/// Brokers report a single DRIP event as one or two rows (a funding credit
/// plus a share purchase). The leg decides which row carries the economic
/// value so it is only counted once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DripLeg {
    /// "Reinvest Shares" / "Comprar Acciones": the purchase leg. Count its
    /// shares and its absolute amount as reinvested dividends.
    Purchase,
    /// "Reinvest Dividend" / "Dividendo Reinversión": the funding leg.
    /// Ignored to avoid double-counting the purchase leg above.
    Funding,
    /// Just "DRIP" / "Reinv": count shares, and count the amount only when
    /// its sign marks an outflow (negative = purchase realized).
    Ambiguous,
}

fn contains_any(text: &str, keys: &[&str]) -> bool {
    keys.iter().any(|k| text.contains(k))
}

/// Maps free-text action descriptions to the taxonomy.
///
/// Precedence: DRIP wins over Buy and CashDividend so a reinvestment row is
/// never also counted as a plain purchase or a cash payout.
pub fn classify(action: &str) -> ActionKind {
    let text = action.to_lowercase();

    let is_drip = contains_any(&text, &["reinvest", "reinversión", "drip"]);

    if is_drip {
        if contains_any(&text, &["share", "acciones"]) {
            return ActionKind::DripPurchase(DripLeg::Purchase);
        }
        if contains_any(&text, &["dividend", "dividendo"]) {
            return ActionKind::DripPurchase(DripLeg::Funding);
        }
        return ActionKind::DripPurchase(DripLeg::Ambiguous);
    }

    if contains_any(&text, &["buy", "bought", "compra"]) {
        return ActionKind::Buy;
    }
    if contains_any(&text, &["sell", "sold", "venta"]) {
        return ActionKind::Sell;
    }
    if contains_any(&text, &["dividend", "dividendo", "yield", "interest"]) {
        return ActionKind::CashDividend;
    }

    ActionKind::Unknown
}

/// Split detection is independent of [`classify`]: a split marker can
/// co-occur with any other action on the same row.
pub fn is_split(action: &str) -> bool {
    action.to_lowercase().contains("split")
}

/// True for rows that pay a dividend out as cash (not reinvested). Used by
/// the daily-trend derivation, which needs the cash-dividend rows as a
/// separate signal.
pub fn is_cash_dividend(action: &str) -> bool {
    classify(action) == ActionKind::CashDividend
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buy_keywords() {
        assert_eq!(classify("Buy"), ActionKind::Buy);
        assert_eq!(classify("Bought 10 shares"), ActionKind::Buy);
        assert_eq!(classify("Compra de valores"), ActionKind::Buy);
    }

    #[test]
    fn test_sell_keywords() {
        assert_eq!(classify("Sell"), ActionKind::Sell);
        assert_eq!(classify("SOLD"), ActionKind::Sell);
        assert_eq!(classify("Venta parcial"), ActionKind::Sell);
    }

    #[test]
    fn test_cash_dividend_keywords() {
        assert_eq!(classify("Dividend"), ActionKind::CashDividend);
        assert_eq!(classify("Pago de dividendo"), ActionKind::CashDividend);
        assert_eq!(classify("Yield payout"), ActionKind::CashDividend);
        assert_eq!(classify("Interest credit"), ActionKind::CashDividend);
    }

    #[test]
    fn test_drip_beats_buy_and_dividend() {
        // "Reinvest" rows must never fall into the plain Buy branch.
        assert_eq!(
            classify("Reinvest Shares Bought"),
            ActionKind::DripPurchase(DripLeg::Purchase)
        );
        // A reinvested dividend is not a cash payout.
        assert_eq!(
            classify("Dividend Reinvestment"),
            ActionKind::DripPurchase(DripLeg::Funding)
        );
    }

    #[test]
    fn test_drip_legs() {
        assert_eq!(
            classify("Reinvest Shares"),
            ActionKind::DripPurchase(DripLeg::Purchase)
        );
        assert_eq!(
            classify("Reinversión en acciones"),
            ActionKind::DripPurchase(DripLeg::Purchase)
        );
        assert_eq!(
            classify("Reinvest Dividend"),
            ActionKind::DripPurchase(DripLeg::Funding)
        );
        assert_eq!(
            classify("DRIP"),
            ActionKind::DripPurchase(DripLeg::Ambiguous)
        );
        assert_eq!(
            classify("Reinv"),
            ActionKind::DripPurchase(DripLeg::Ambiguous)
        );
    }

    #[test]
    fn test_split_is_independent() {
        assert!(is_split("Stock Split 3:1"));
        assert!(is_split("Reverse split"));
        assert!(!is_split("Buy"));
        // A split marker does not change the primary classification.
        assert_eq!(classify("Stock Split 3:1"), ActionKind::Unknown);
    }

    #[test]
    fn test_unknown() {
        assert_eq!(classify(""), ActionKind::Unknown);
        assert_eq!(classify("Fee"), ActionKind::Unknown);
        assert_eq!(classify("Transfer in"), ActionKind::Unknown);
    }
}
