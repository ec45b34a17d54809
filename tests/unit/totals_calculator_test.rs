// Property-based tests for invoice totals
//
// - subtotal is the exact sum of quantity × unit_price
// - total is never negative, whatever the discount
// - percentage discounts scale with the subtotal, fixed discounts do not

use invoice_engine::core::Currency;
use invoice_engine::invoices::models::LineItem;
use invoice_engine::invoices::services::TotalsCalculator;
use invoice_engine::promotions::models::{DiscountType, Promotion};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn promotion(discount_type: DiscountType, value: Decimal, subtotal: Decimal, currency: Currency) -> Promotion {
    Promotion::manual(discount_type, value, subtotal, currency).expect("valid discount")
}

/// Worked example: 2 × 500000 + 1 × 1000000 IRT at 9% tax
#[test]
fn test_reference_invoice_totals() {
    let items = vec![
        LineItem::new("Item A", 2, dec!(500000)).unwrap(),
        LineItem::new("Item B", 1, dec!(1000000)).unwrap(),
    ];

    let totals = TotalsCalculator::compute(&items, dec!(9), None, Currency::IRT).unwrap();
    assert_eq!(totals.subtotal, dec!(2000000));
    assert_eq!(totals.tax_amount, dec!(180000));
    assert_eq!(totals.total, dec!(2180000));

    let flat = promotion(DiscountType::Fixed, dec!(200000), totals.subtotal, Currency::IRT);
    let discounted = TotalsCalculator::compute(&items, dec!(9), Some(&flat), Currency::IRT).unwrap();
    assert_eq!(discounted.discount_amount, dec!(200000));
    assert_eq!(discounted.total, dec!(1980000));
}

#[test]
fn test_percentage_discount_is_rounded_to_currency() {
    let items = vec![LineItem::new("Seat", 3, dec!(33.33)).unwrap()];
    // 15% of 99.99 = 14.9985
    let promo = promotion(DiscountType::Percentage, dec!(15), dec!(99.99), Currency::USD);
    assert_eq!(promo.discount_amount, dec!(15.00));

    let totals = TotalsCalculator::compute(&items, dec!(0), Some(&promo), Currency::USD).unwrap();
    assert_eq!(totals.total, dec!(84.99));
}

#[test]
fn test_off_scale_unit_price_rejected() {
    let items = vec![LineItem::new("Fractional", 1, dec!(10.5)).unwrap()];
    assert!(TotalsCalculator::compute(&items, dec!(0), None, Currency::IRT).is_err());
    assert!(TotalsCalculator::compute(&items, dec!(0), None, Currency::USD).is_ok());
}

fn line_items() -> impl Strategy<Value = Vec<(u32, u64)>> {
    prop::collection::vec((1u32..50u32, 0u64..10_000_000u64), 1..8)
}

proptest! {
    /// Property: subtotal equals Σ(quantity × unit_price) with no rounding
    #[test]
    fn prop_subtotal_is_exact(raw in line_items()) {
        let items: Vec<LineItem> = raw
            .iter()
            .enumerate()
            .map(|(i, (q, cents))| LineItem::new(format!("Item {}", i), *q, Decimal::new(*cents as i64, 2)).unwrap())
            .collect();

        let expected: Decimal = raw
            .iter()
            .map(|(q, cents)| Decimal::from(*q) * Decimal::new(*cents as i64, 2))
            .sum();

        let totals = TotalsCalculator::compute(&items, Decimal::ZERO, None, Currency::USD).unwrap();
        prop_assert_eq!(totals.subtotal, expected);
        prop_assert_eq!(totals.total, expected);
    }

    /// Property: total is never negative, even when the discount exceeds the gross amount
    #[test]
    fn prop_total_never_negative(
        raw in line_items(),
        tax_rate in 0u32..=100u32,
        fixed in 0u64..100_000_000u64,
    ) {
        let items: Vec<LineItem> = raw
            .iter()
            .map(|(q, price)| LineItem::new("Item", *q, Decimal::from(*price)).unwrap())
            .collect();
        let subtotal = TotalsCalculator::subtotal(&items, Currency::IRT).unwrap();
        let promo = promotion(DiscountType::Fixed, Decimal::from(fixed), subtotal, Currency::IRT);

        let totals = TotalsCalculator::compute(&items, Decimal::from(tax_rate), Some(&promo), Currency::IRT).unwrap();
        prop_assert!(totals.total >= Decimal::ZERO);
        prop_assert!(totals.discount_amount <= totals.subtotal + totals.tax_amount);
        prop_assert_eq!(totals.total, (totals.subtotal + totals.tax_amount - promo.discount_amount).max(Decimal::ZERO));
    }

    /// Property: doubling every quantity doubles a percentage discount and leaves a fixed one alone
    #[test]
    fn prop_percentage_scales_fixed_does_not(
        raw in line_items(),
        percent in 0u32..=100u32,
        fixed in 0u64..1_000_000u64,
    ) {
        let items: Vec<LineItem> = raw
            .iter()
            .map(|(q, price)| LineItem::new("Item", *q, Decimal::from(*price)).unwrap())
            .collect();
        let doubled: Vec<LineItem> = items
            .iter()
            .map(|item| LineItem::new(item.description.clone(), item.quantity * 2, item.unit_price).unwrap())
            .collect();

        // Integer prices keep percentage amounts exact at scale 2
        let single = TotalsCalculator::subtotal(&items, Currency::USD).unwrap();
        let double = TotalsCalculator::subtotal(&doubled, Currency::USD).unwrap();
        prop_assert_eq!(double, single * dec!(2));

        let pct_single = promotion(DiscountType::Percentage, Decimal::from(percent), single, Currency::USD);
        let pct_double = promotion(DiscountType::Percentage, Decimal::from(percent), double, Currency::USD);
        prop_assert_eq!(pct_double.discount_amount, pct_single.discount_amount * dec!(2));

        let fixed_single = promotion(DiscountType::Fixed, Decimal::from(fixed), single, Currency::USD);
        let fixed_double = promotion(DiscountType::Fixed, Decimal::from(fixed), double, Currency::USD);
        prop_assert_eq!(fixed_single.discount_amount, fixed_double.discount_amount);
    }
}
