use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalcError {
    #[error("Argument must be a finite number, got {value}")]
    InvalidArgument { value: f64 },

    #[error("Please input a number between {}$ and {}$", .range.min, .range.max)]
    OutOfRange { amount: f64, range: DepositRange },

    #[error("No account tier matches a deposit of {amount}")]
    NoMatchingTier { amount: f64 },
}

fn ensure_finite(value: f64) -> Result<f64, CalcError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CalcError::InvalidArgument { value })
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct DepositRange {
    pub min: f64,
    pub max: f64,
}

impl DepositRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, amount: f64) -> Result<bool, CalcError> {
        let amount = ensure_finite(amount)?;
        Ok(amount >= self.min && amount <= self.max)
    }
}

impl fmt::Display for DepositRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}$ - {}$", self.min, self.max)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Percentage(pub f64);

impl Percentage {
    pub fn value(self) -> f64 {
        self.0
    }

    pub fn apply(self, amount: f64) -> f64 {
        amount * self.0 / 100.0
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// How each day's profit is divided between reinvestment and cash. The two
/// parts are taken as given and are not normalised to 100.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReinvestSplit {
    pub reinvest_pct: f64,
    pub cash_pct: f64,
}

impl ReinvestSplit {
    pub const FULL_REINVEST: ReinvestSplit = ReinvestSplit::new(100.0, 0.0);

    pub const fn new(reinvest_pct: f64, cash_pct: f64) -> Self {
        Self {
            reinvest_pct,
            cash_pct,
        }
    }
}

impl fmt::Display for ReinvestSplit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}% / {}%", self.reinvest_pct, self.cash_pct)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountTier {
    pub name: &'static str,
    pub duration_months: u32,
    pub bonus_rate: Percentage,
    pub daily_return_rate: Percentage,
    pub default_split: ReinvestSplit,
    pub deposit_range: DepositRange,
    pub loyalty_discount: Percentage,
    pub affiliate_tier: u32,
}

impl AccountTier {
    pub fn duration_days(&self) -> usize {
        self.duration_months as usize * super::DAYS_PER_MONTH
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentPosition {
    pub deposit_amount: f64,
    pub bonus_amount: f64,
}

impl InvestmentPosition {
    pub fn total_investment(&self) -> f64 {
        self.deposit_amount + self.bonus_amount
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySimulationResult {
    pub cash_additions: Vec<f64>,
    pub equity_additions: Vec<f64>,
    pub cash_balances: Vec<f64>,
    pub equity_balances: Vec<f64>,
}

impl DailySimulationResult {
    pub fn with_capacity(days: usize) -> Self {
        Self {
            cash_additions: Vec::with_capacity(days),
            equity_additions: Vec::with_capacity(days),
            cash_balances: Vec::with_capacity(days),
            equity_balances: Vec::with_capacity(days),
        }
    }

    pub fn days(&self) -> usize {
        self.cash_balances.len()
    }

    pub fn final_cash_profit(&self) -> f64 {
        self.cash_balances.last().copied().unwrap_or(0.0)
    }

    pub fn final_equity_profit(&self) -> f64 {
        self.equity_balances.last().copied().unwrap_or(0.0)
    }

    pub fn final_total_profit(&self) -> f64 {
        self.final_cash_profit() + self.final_equity_profit()
    }

    /// 1-based day on which the cash balance first reaches the withdrawal
    /// minimum.
    pub fn first_withdrawable_day(&self) -> Option<usize> {
        self.cash_balances
            .iter()
            .position(|&balance| balance >= super::CASH_WITHDRAWAL_MINIMUM)
            .map(|idx| idx + 1)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalculationRecord {
    pub tier: AccountTier,
    pub position: InvestmentPosition,
    pub split: ReinvestSplit,
    pub simulation: DailySimulationResult,
}

impl CalculationRecord {
    pub fn total_cash_profit(&self) -> f64 {
        self.simulation.final_cash_profit()
    }

    pub fn total_equity_profit(&self) -> f64 {
        self.simulation.final_equity_profit()
    }

    pub fn total_profit(&self) -> f64 {
        self.simulation.final_total_profit()
    }
}
