//! Ledger balance arithmetic and sale batch aggregation
//!
//! The per-product ledger keeps two running sums: weight bought into stock
//! (credited when a purchase is paid) and weight sold out of stock. The
//! sellable balance is their difference. A sale batch must be aggregated per
//! product before it is checked against balances, so that a batch naming the
//! same product twice cannot oversell it line by line.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Running totals for one product
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LedgerTotals {
    pub purchased_weight: Decimal,
    pub sold_weight: Decimal,
}

impl LedgerTotals {
    /// Sellable quantity: purchased minus sold.
    pub fn balance(&self) -> Decimal {
        self.purchased_weight - self.sold_weight
    }
}

/// One line of a sale batch request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellLine {
    pub product_id: Uuid,
    pub weight_sold: Decimal,
    pub note: Option<String>,
}

/// A product whose aggregated request exceeds its balance
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Shortfall {
    pub product_id: Uuid,
    pub requested: Decimal,
    pub available: Decimal,
}

/// Reject empty batches and non-positive weights before touching the store.
pub fn validate_sell_lines(lines: &[SellLine]) -> Result<(), &'static str> {
    if lines.is_empty() {
        return Err("Sale batch is empty");
    }
    if lines.iter().any(|l| l.weight_sold <= Decimal::ZERO) {
        return Err("weight_sold must be positive on every line");
    }
    Ok(())
}

/// Sum requested weight per product. The BTreeMap keeps products in
/// ascending id order, which is also the ledger row lock order.
pub fn aggregate_sell_lines(lines: &[SellLine]) -> BTreeMap<Uuid, Decimal> {
    let mut totals: BTreeMap<Uuid, Decimal> = BTreeMap::new();
    for line in lines {
        *totals.entry(line.product_id).or_insert(Decimal::ZERO) += line.weight_sold;
    }
    totals
}

/// Compare aggregated requests against balances. Returns the first product
/// (in id order) whose request exceeds its balance; a missing balance counts
/// as zero.
pub fn find_shortfall(
    requested: &BTreeMap<Uuid, Decimal>,
    balances: &HashMap<Uuid, Decimal>,
) -> Option<Shortfall> {
    for (&product_id, &want) in requested {
        let available = balances.get(&product_id).copied().unwrap_or(Decimal::ZERO);
        if want > available {
            return Some(Shortfall {
                product_id,
                requested: want,
                available,
            });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn line(product_id: Uuid, w: &str) -> SellLine {
        SellLine {
            product_id,
            weight_sold: dec(w),
            note: None,
        }
    }

    #[test]
    fn empty_batch_rejected() {
        assert!(validate_sell_lines(&[]).is_err());
    }

    #[test]
    fn non_positive_line_rejects_whole_batch() {
        let p = Uuid::new_v4();
        assert!(validate_sell_lines(&[line(p, "5.0"), line(p, "0")]).is_err());
        assert!(validate_sell_lines(&[line(p, "-1.0")]).is_err());
    }

    #[test]
    fn duplicate_products_are_summed_before_the_check() {
        let p = Uuid::new_v4();
        let agg = aggregate_sell_lines(&[line(p, "10"), line(p, "5")]);
        assert_eq!(agg[&p], dec("15"));

        // balance 12 covers each line alone but not their sum
        let balances = HashMap::from([(p, dec("12"))]);
        let short = find_shortfall(&agg, &balances).unwrap();
        assert_eq!(short.requested, dec("15"));
        assert_eq!(short.available, dec("12"));
    }

    #[test]
    fn exact_balance_sells_to_zero() {
        let p = Uuid::new_v4();
        let agg = aggregate_sell_lines(&[line(p, "70")]);
        let balances = HashMap::from([(p, dec("70"))]);
        assert!(find_shortfall(&agg, &balances).is_none());
    }

    #[test]
    fn missing_balance_counts_as_zero() {
        let p = Uuid::new_v4();
        let agg = aggregate_sell_lines(&[line(p, "1")]);
        let short = find_shortfall(&agg, &HashMap::new()).unwrap();
        assert_eq!(short.available, Decimal::ZERO);
    }
}
