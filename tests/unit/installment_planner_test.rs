// Property-based tests for installment plans
//
// A plan is accepted exactly when down_payment + count × installment_amount
// is within one minor unit of the invoice total.

use invoice_engine::core::{AppError, Currency};
use invoice_engine::installments::models::{InstallmentPeriod, PaymentPlanRequest};
use invoice_engine::installments::services::InstallmentPlanner;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn request(down: Decimal, count: u32, amount: Decimal) -> PaymentPlanRequest {
    PaymentPlanRequest {
        is_installment: true,
        down_payment: down,
        installments_count: count,
        installment_amount: amount,
        period: InstallmentPeriod::Monthly,
    }
}

#[test]
fn test_worked_example() {
    let accepted = InstallmentPlanner::build_plan(
        dec!(1200000),
        &request(dec!(200000), 5, dec!(200000)),
        Currency::IRT,
    );
    assert!(accepted.is_ok());

    let rejected = InstallmentPlanner::build_plan(
        dec!(1200000),
        &request(dec!(200000), 4, dec!(200000)),
        Currency::IRT,
    );
    assert!(matches!(rejected, Err(AppError::PlanInvalid(_))));
}

#[test]
fn test_progress_through_plan() {
    let plan = InstallmentPlanner::build_plan(
        dec!(1200000),
        &request(dec!(200000), 5, dec!(200000)),
        Currency::IRT,
    )
    .unwrap();

    let progress = plan.progress(dec!(600000));
    assert!(progress.down_payment_covered);
    assert_eq!(progress.installments_covered, 2);
    assert_eq!(progress.installments_remaining, 3);
    assert_eq!(progress.next_amount_due, Some(dec!(200000)));
}

proptest! {
    /// Property: an exact split is always accepted
    #[test]
    fn prop_exact_plan_accepted(
        down in 0u64..10_000_000u64,
        count in 1u32..48u32,
        amount in 0u64..10_000_000u64,
    ) {
        let down = Decimal::from(down);
        let amount = Decimal::from(amount);
        let total = down + Decimal::from(count) * amount;

        prop_assert!(InstallmentPlanner::build_plan(total, &request(down, count, amount), Currency::IRT).is_ok());
    }

    /// Property: acceptance matches the one-minor-unit tolerance exactly
    #[test]
    fn prop_tolerance_boundary(
        down_cents in 0i64..1_000_000i64,
        count in 1u32..24u32,
        amount_cents in 0i64..1_000_000i64,
        drift_cents in -5i64..=5i64,
    ) {
        let down = Decimal::new(down_cents, 2);
        let amount = Decimal::new(amount_cents, 2);
        let scheduled = down + Decimal::from(count) * amount;
        let total = scheduled + Decimal::new(drift_cents, 2);
        prop_assume!(total >= Decimal::ZERO);

        let result = InstallmentPlanner::build_plan(total, &request(down, count, amount), Currency::USD);
        prop_assert_eq!(result.is_ok(), drift_cents.abs() <= 1);
    }

    /// Property: suggested plans always validate when the remainder divides evenly
    #[test]
    fn prop_suggest_even_split(
        down in 0u64..1_000_000u64,
        count in 1u32..24u32,
        per in 0u64..1_000_000u64,
    ) {
        let down = Decimal::from(down);
        let total = down + Decimal::from(count) * Decimal::from(per);

        let plan = InstallmentPlanner::suggest(total, down, count, InstallmentPeriod::Weekly, Currency::IRT).unwrap();
        prop_assert_eq!(plan.installment_amount, Decimal::from(per));
        prop_assert_eq!(plan.scheduled_total().unwrap(), total);
    }
}
