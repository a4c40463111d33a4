mod catalog;
mod engine;
pub mod report;
mod types;

/// Months are counted as 30 days throughout.
pub const DAYS_PER_MONTH: usize = 30;

/// Cash profit can be withdrawn once the running cash balance reaches this.
pub const CASH_WITHDRAWAL_MINIMUM: f64 = 100.0;

pub use catalog::{PlanCatalog, STANDARD_TIERS};
pub use engine::{CompoundingEngine, compound_daily, round2};
pub use types::{
    AccountTier, CalcError, CalculationRecord, DailySimulationResult, DepositRange,
    InvestmentPosition, Percentage, ReinvestSplit,
};
