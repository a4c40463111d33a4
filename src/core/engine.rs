use tracing::{debug, info};

use super::catalog::PlanCatalog;
use super::types::{
    CalcError, CalculationRecord, DailySimulationResult, InvestmentPosition, Percentage,
    ReinvestSplit,
};

pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Runs the day loop. Only the reinvested part of each day's profit joins the
/// principal; the cash part leaves the compounding base.
pub fn compound_daily(
    total_investment: f64,
    daily_rate: Percentage,
    split: ReinvestSplit,
    days: usize,
) -> DailySimulationResult {
    let mut result = DailySimulationResult::with_capacity(days);
    let mut principal = total_investment;
    let mut cash_balance = 0.0;
    let mut equity_balance = 0.0;

    for _ in 0..days {
        let daily_profit = round2(daily_rate.apply(principal));
        let cash_add = round2(daily_profit * split.cash_pct / 100.0);
        let equity_add = round2(daily_profit * split.reinvest_pct / 100.0);

        principal += equity_add;
        cash_balance += cash_add;
        equity_balance += equity_add;

        result.cash_additions.push(cash_add);
        result.equity_additions.push(equity_add);
        result.cash_balances.push(cash_balance);
        result.equity_balances.push(equity_balance);
    }

    result
}

#[derive(Debug, Default)]
pub struct CompoundingEngine {
    catalog: PlanCatalog,
    history: Vec<CalculationRecord>,
}

impl CompoundingEngine {
    pub fn new(catalog: PlanCatalog) -> Self {
        Self {
            catalog,
            history: Vec::new(),
        }
    }

    pub fn catalog(&self) -> &PlanCatalog {
        &self.catalog
    }

    pub fn history(&self) -> &[CalculationRecord] {
        &self.history
    }

    pub fn current_calculation(&self) -> Option<&CalculationRecord> {
        self.history.last()
    }

    pub fn simulate(
        &mut self,
        deposit: f64,
        force_full_reinvest: bool,
    ) -> Result<CalculationRecord, CalcError> {
        let tier = *self
            .catalog
            .resolve_tier(deposit)?
            .ok_or(CalcError::NoMatchingTier { amount: deposit })?;

        let position = InvestmentPosition {
            deposit_amount: deposit,
            bonus_amount: tier.bonus_rate.apply(deposit),
        };
        let split = if force_full_reinvest {
            ReinvestSplit::FULL_REINVEST
        } else {
            tier.default_split
        };
        let days = tier.duration_days();
        debug!(
            tier = tier.name,
            days,
            total_investment = position.total_investment(),
            %split,
            "starting daily compounding"
        );

        let simulation = compound_daily(
            position.total_investment(),
            tier.daily_return_rate,
            split,
            days,
        );
        let record = CalculationRecord {
            tier,
            position,
            split,
            simulation,
        };
        info!(
            tier = tier.name,
            deposit,
            cash_profit = record.total_cash_profit(),
            equity_profit = record.total_equity_profit(),
            "calculation complete"
        );

        self.history.push(record.clone());
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::STANDARD_TIERS;
    use crate::core::types::{AccountTier, DepositRange};
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn engine() -> CompoundingEngine {
        CompoundingEngine::new(PlanCatalog::standard())
    }

    #[test]
    fn round2_rounds_to_cents() {
        assert_approx(round2(6.0), 6.0);
        assert_approx(round2(4.804), 4.8);
        assert_approx(round2(1.236), 1.24);
        assert_approx(round2(0.125), 0.13);
    }

    #[test]
    fn bronze_minimum_deposit_first_day() {
        let record = engine().simulate(500.0, false).expect("in range");
        assert_eq!(record.tier.name, "Bronze");
        assert_approx(record.position.bonus_amount, 100.0);
        assert_approx(record.position.total_investment(), 600.0);
        assert_eq!(record.split, ReinvestSplit::new(80.0, 20.0));

        let sim = &record.simulation;
        assert_approx(sim.equity_additions[0], 4.8);
        assert_approx(sim.cash_additions[0], 1.2);
        assert_approx(sim.equity_balances[0], 4.8);
        assert_approx(sim.cash_balances[0], 1.2);
        // day two compounds on 604.80
        assert_approx(sim.equity_additions[1], 4.84);
        assert_approx(sim.cash_additions[1], 1.21);
    }

    #[test]
    fn duration_days_follow_thirty_day_months() {
        let mut engine = engine();
        let bronze = engine.simulate(1_000.0, false).expect("bronze");
        assert_eq!(bronze.tier.duration_days(), 180);
        assert_eq!(bronze.simulation.days(), 180);
        assert_eq!(bronze.simulation.cash_additions.len(), 180);
        assert_eq!(bronze.simulation.equity_balances.len(), 180);

        let gold = engine.simulate(30_000.0, false).expect("gold");
        assert_eq!(gold.tier.duration_days(), 360);
        assert_eq!(gold.simulation.days(), 360);
    }

    #[test]
    fn forced_reinvest_sends_everything_to_equity() {
        let record = engine().simulate(300_000.0, true).expect("in range");
        assert_eq!(record.tier.name, "Purple Diamond");
        assert_eq!(record.split, ReinvestSplit::FULL_REINVEST);
        assert!(record.simulation.cash_additions.iter().all(|&c| c == 0.0));
        assert_eq!(record.total_cash_profit(), 0.0);
        assert!(record.total_equity_profit() > 0.0);
        assert_approx(record.total_profit(), record.total_equity_profit());
    }

    #[test]
    fn zero_duration_tier_yields_empty_schedule() {
        let tier = AccountTier {
            name: "Instant",
            duration_months: 0,
            deposit_range: DepositRange::new(1.0, 10.0),
            ..STANDARD_TIERS[0]
        };
        let mut engine = CompoundingEngine::new(PlanCatalog::new(vec![tier]));
        let record = engine.simulate(5.0, false).expect("in range");
        assert_eq!(record.simulation.days(), 0);
        assert_eq!(record.total_cash_profit(), 0.0);
        assert_eq!(record.total_equity_profit(), 0.0);
    }

    #[test]
    fn simulate_rejects_amount_without_tier() {
        let mut engine = engine();
        assert_eq!(
            engine.simulate(499.0, false),
            Err(CalcError::NoMatchingTier { amount: 499.0 })
        );
        assert!(matches!(
            engine.simulate(f64::NAN, false),
            Err(CalcError::InvalidArgument { .. })
        ));
        assert!(engine.history().is_empty());
    }

    #[test]
    fn history_appends_in_order() {
        let mut engine = engine();
        assert!(engine.current_calculation().is_none());

        engine.simulate(500.0, false).expect("bronze");
        engine.simulate(60_000.0, true).expect("gold plus");

        assert_eq!(engine.history().len(), 2);
        assert_eq!(engine.history()[0].tier.name, "Bronze");
        let current = engine.current_calculation().expect("has calculation");
        assert_eq!(current.tier.name, "Gold Plus");
        assert_eq!(current.split, ReinvestSplit::FULL_REINVEST);
    }

    #[test]
    fn simulate_is_repeatable() {
        let mut engine = engine();
        let first = engine.simulate(12_345.0, false).expect("silver plus");
        let second = engine.simulate(12_345.0, false).expect("silver plus");
        assert_eq!(first, second);
    }

    #[test]
    fn unnormalised_split_is_applied_as_given() {
        let sim = compound_daily(1_000.0, Percentage(1.0), ReinvestSplit::new(50.0, 20.0), 1);
        assert_approx(sim.equity_additions[0], 5.0);
        assert_approx(sim.cash_additions[0], 2.0);
    }

    fn tier_strategy_index() -> std::ops::Range<usize> {
        0..STANDARD_TIERS.len()
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(40))]

        #[test]
        fn prop_daily_split_stays_within_a_cent(
            tier_idx in tier_strategy_index(),
            offset_cents in 0u64..1_000_000,
            force in proptest::bool::ANY
        ) {
            let tier = STANDARD_TIERS[tier_idx];
            let span = tier.deposit_range.max - tier.deposit_range.min;
            let deposit = tier.deposit_range.min + (offset_cents as f64 / 1_000_000.0) * span;

            let mut engine = engine();
            let record = engine.simulate(deposit, force).expect("deposit inside tier");
            prop_assert_eq!(record.tier.name, tier.name);
            prop_assert_eq!(record.simulation.days(), tier.duration_days());

            let mut principal = record.position.total_investment();
            for day in 0..record.simulation.days() {
                let profit = round2(tier.daily_return_rate.apply(principal));
                let cash = record.simulation.cash_additions[day];
                let equity = record.simulation.equity_additions[day];
                prop_assert!((cash + equity - profit).abs() <= 0.01 + 1e-9);
                principal += equity;
            }
        }

        #[test]
        fn prop_balances_are_running_sums(
            tier_idx in tier_strategy_index(),
            offset_cents in 0u64..1_000_000,
            force in proptest::bool::ANY
        ) {
            let tier = STANDARD_TIERS[tier_idx];
            let span = tier.deposit_range.max - tier.deposit_range.min;
            let deposit = tier.deposit_range.min + (offset_cents as f64 / 1_000_000.0) * span;

            let record = engine().simulate(deposit, force).expect("deposit inside tier");
            let sim = &record.simulation;

            let mut cash = 0.0;
            let mut equity = 0.0;
            for day in 0..sim.days() {
                cash += sim.cash_additions[day];
                equity += sim.equity_additions[day];
                prop_assert_eq!(sim.cash_balances[day], cash);
                prop_assert_eq!(sim.equity_balances[day], equity);
                prop_assert!(sim.cash_additions[day] >= 0.0);
                prop_assert!(sim.equity_additions[day] >= 0.0);
            }
            if force {
                prop_assert_eq!(record.total_cash_profit(), 0.0);
            }
        }
    }
}
