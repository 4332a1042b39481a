//! Stock sale batch tests
//!
//! Tests for the atomic sale path:
//! - batch validation (empty batches, non-positive weights)
//! - per-product aggregation before the balance check
//! - shortfall detection, including the split-line oversell case

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

use shared::models::{aggregate_sell_lines, find_shortfall, validate_sell_lines, SellLine};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn line(product_id: Uuid, weight: &str) -> SellLine {
    SellLine {
        product_id,
        weight_sold: dec(weight),
        note: None,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// An empty batch never reaches the database
    #[test]
    fn test_empty_batch_rejected() {
        assert!(validate_sell_lines(&[]).is_err());
    }

    /// Zero and negative weights reject the whole batch
    #[test]
    fn test_non_positive_weight_rejected() {
        let p = Uuid::new_v4();
        assert!(validate_sell_lines(&[line(p, "0")]).is_err());
        assert!(validate_sell_lines(&[line(p, "-2.5")]).is_err());
        // one bad line poisons an otherwise valid batch
        assert!(validate_sell_lines(&[line(p, "5.0"), line(p, "0")]).is_err());
    }

    /// A batch of positive lines passes validation
    #[test]
    fn test_valid_batch_accepted() {
        let p = Uuid::new_v4();
        let q = Uuid::new_v4();
        assert!(validate_sell_lines(&[line(p, "5.0"), line(q, "0.01")]).is_ok());
    }

    /// Lines for the same product are summed before the check
    #[test]
    fn test_aggregation_sums_duplicate_products() {
        let p = Uuid::new_v4();
        let q = Uuid::new_v4();
        let agg = aggregate_sell_lines(&[line(p, "10"), line(q, "3"), line(p, "5")]);

        assert_eq!(agg.len(), 2);
        assert_eq!(agg[&p], dec("15"));
        assert_eq!(agg[&q], dec("3"));
    }

    /// The split-line oversell: each line fits the balance alone, the
    /// aggregate does not, so the batch must be refused
    #[test]
    fn test_split_line_oversell_detected() {
        let p = Uuid::new_v4();
        let agg = aggregate_sell_lines(&[line(p, "10"), line(p, "5")]);
        let balances = HashMap::from([(p, dec("12"))]);

        let short = find_shortfall(&agg, &balances).expect("shortfall expected");
        assert_eq!(short.product_id, p);
        assert_eq!(short.requested, dec("15"));
        assert_eq!(short.available, dec("12"));
    }

    /// Selling exactly the balance leaves zero and is allowed
    #[test]
    fn test_exact_balance_allowed() {
        let p = Uuid::new_v4();
        let agg = aggregate_sell_lines(&[line(p, "70")]);
        let balances = HashMap::from([(p, dec("70"))]);

        assert!(find_shortfall(&agg, &balances).is_none());
    }

    /// One satang over the balance is refused
    #[test]
    fn test_one_satang_over_refused() {
        let p = Uuid::new_v4();
        let agg = aggregate_sell_lines(&[line(p, "70.01")]);
        let balances = HashMap::from([(p, dec("70"))]);

        assert!(find_shortfall(&agg, &balances).is_some());
    }

    /// A product with no balance entry counts as zero available
    #[test]
    fn test_missing_balance_is_zero() {
        let p = Uuid::new_v4();
        let agg = aggregate_sell_lines(&[line(p, "0.01")]);

        let short = find_shortfall(&agg, &HashMap::new()).expect("shortfall expected");
        assert_eq!(short.available, Decimal::ZERO);
    }

    /// A shortfall on one product refuses the batch even when the other
    /// products fit; nothing is partially committed
    #[test]
    fn test_one_short_product_refuses_batch() {
        let p = Uuid::new_v4();
        let q = Uuid::new_v4();
        let agg = aggregate_sell_lines(&[line(p, "5"), line(q, "100")]);
        let balances = HashMap::from([(p, dec("50")), (q, dec("99"))]);

        let short = find_shortfall(&agg, &balances).expect("shortfall expected");
        assert_eq!(short.product_id, q);
    }

    /// Aggregation iterates products in ascending id order, which is the
    /// row lock order the sale transaction relies on
    #[test]
    fn test_aggregation_orders_by_product_id() {
        let lines: Vec<SellLine> = (0..10).map(|_| line(Uuid::new_v4(), "1")).collect();
        let agg = aggregate_sell_lines(&lines);

        let ids: Vec<Uuid> = agg.keys().copied().collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for generating positive sale weights
    fn weight_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=100_000i64).prop_map(|n| Decimal::new(n, 2)) // 0.01 to 1000.00
    }

    /// Strategy for a batch over a small pool of products, so duplicates
    /// are common
    fn batch_strategy() -> impl Strategy<Value = Vec<SellLine>> {
        let pool: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        prop::collection::vec(
            (0usize..4, weight_strategy()).prop_map(move |(i, w)| SellLine {
                product_id: pool[i],
                weight_sold: w,
                note: None,
            }),
            1..20,
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Aggregation preserves total weight
        #[test]
        fn prop_aggregation_preserves_total(batch in batch_strategy()) {
            let line_total: Decimal = batch.iter().map(|l| l.weight_sold).sum();
            let agg_total: Decimal = aggregate_sell_lines(&batch).values().copied().sum();

            prop_assert_eq!(line_total, agg_total);
        }

        /// Every positive batch passes validation
        #[test]
        fn prop_positive_batch_validates(batch in batch_strategy()) {
            prop_assert!(validate_sell_lines(&batch).is_ok());
        }

        /// When balances cover the aggregate, no shortfall is reported and
        /// the post-sale balances are all non-negative
        #[test]
        fn prop_covered_batch_never_oversells(batch in batch_strategy()) {
            let agg = aggregate_sell_lines(&batch);

            // grant every product exactly the requested amount
            let balances: HashMap<Uuid, Decimal> =
                agg.iter().map(|(&id, &w)| (id, w)).collect();

            prop_assert!(find_shortfall(&agg, &balances).is_none());

            for (id, want) in &agg {
                let after = balances[id] - want;
                prop_assert!(after >= Decimal::ZERO);
            }
        }

        /// When any balance is short of the aggregate, a shortfall is
        /// reported for a genuinely short product
        #[test]
        fn prop_short_batch_always_detected(
            batch in batch_strategy(),
            deficit in weight_strategy()
        ) {
            let agg = aggregate_sell_lines(&batch);

            // everyone covered except the first product, short by `deficit`
            let mut balances: HashMap<Uuid, Decimal> =
                agg.iter().map(|(&id, &w)| (id, w)).collect();
            let (&victim, &want) = agg.iter().next().unwrap();
            balances.insert(victim, want - deficit);

            let short = find_shortfall(&agg, &balances);
            prop_assert!(short.is_some());

            let short = short.unwrap();
            prop_assert!(short.requested > short.available);
        }

        /// Splitting one line into two lines for the same product never
        /// changes the aggregate
        #[test]
        fn prop_line_split_invariant(
            weight in weight_strategy(),
            split in weight_strategy()
        ) {
            let p = Uuid::new_v4();
            let whole = aggregate_sell_lines(&[SellLine {
                product_id: p,
                weight_sold: weight + split,
                note: None,
            }]);
            let parts = aggregate_sell_lines(&[
                SellLine { product_id: p, weight_sold: weight, note: None },
                SellLine { product_id: p, weight_sold: split, note: None },
            ]);

            prop_assert_eq!(whole[&p], parts[&p]);
        }
    }
}
