use tracing::debug;

use super::types::{AccountTier, CalcError, DepositRange, Percentage, ReinvestSplit};

const fn tier(
    name: &'static str,
    duration_months: u32,
    bonus: f64,
    daily_return: f64,
    split: (f64, f64),
    range: (f64, f64),
    loyalty_discount: f64,
    affiliate_tier: u32,
) -> AccountTier {
    AccountTier {
        name,
        duration_months,
        bonus_rate: Percentage(bonus),
        daily_return_rate: Percentage(daily_return),
        default_split: ReinvestSplit::new(split.0, split.1),
        deposit_range: DepositRange::new(range.0, range.1),
        loyalty_discount: Percentage(loyalty_discount),
        affiliate_tier,
    }
}

pub const STANDARD_TIERS: [AccountTier; 7] = [
    tier("Bronze", 6, 20.0, 1.0, (80.0, 20.0), (500.0, 2_499.0), 10.0, 1),
    tier("Silver", 6, 50.0, 0.83, (80.0, 20.0), (2_500.0, 9_999.0), 15.0, 1),
    tier("Silver Plus", 6, 100.0, 0.66, (80.0, 20.0), (10_000.0, 24_999.0), 20.0, 1),
    tier("Gold", 12, 150.0, 0.58, (80.0, 20.0), (25_000.0, 49_999.0), 25.0, 1),
    tier("Gold Plus", 12, 200.0, 0.5, (85.0, 15.0), (50_000.0, 99_999.0), 30.0, 1),
    tier("Platinum", 12, 300.0, 0.42, (90.0, 10.0), (100_000.0, 249_999.0), 35.0, 2),
    tier(
        "Purple Diamond",
        12,
        400.0,
        0.33,
        (95.0, 5.0),
        (250_000.0, 1_000_000.0),
        40.0,
        2,
    ),
];

#[derive(Debug, Clone)]
pub struct PlanCatalog {
    tiers: Vec<AccountTier>,
}

impl Default for PlanCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl PlanCatalog {
    pub fn new(tiers: Vec<AccountTier>) -> Self {
        Self { tiers }
    }

    pub fn standard() -> Self {
        Self::new(STANDARD_TIERS.to_vec())
    }

    pub fn tiers(&self) -> &[AccountTier] {
        &self.tiers
    }

    pub fn resolve_tier(&self, amount: f64) -> Result<Option<&AccountTier>, CalcError> {
        if !amount.is_finite() {
            return Err(CalcError::InvalidArgument { value: amount });
        }
        for tier in &self.tiers {
            if tier.deposit_range.contains(amount)? {
                debug!(amount, tier = tier.name, "resolved account tier");
                return Ok(Some(tier));
            }
        }
        Ok(None)
    }

    pub fn try_total_range(&self) -> Option<DepositRange> {
        let first = self.tiers.first()?;
        let mut min = first.deposit_range.min;
        let mut max = first.deposit_range.max;

        for tier in &self.tiers {
            if tier.deposit_range.min < min {
                min = tier.deposit_range.min;
            }
            if tier.deposit_range.max > max {
                max = tier.deposit_range.max;
            }
        }

        Some(DepositRange::new(min, max))
    }

    pub fn total_range(&self) -> DepositRange {
        self.try_total_range().unwrap_or(DepositRange::new(0.0, 0.0))
    }

    pub fn validate_deposit(&self, amount: f64) -> Result<f64, CalcError> {
        let range = self.total_range();
        if range.contains(amount)? {
            Ok(amount)
        } else {
            Err(CalcError::OutOfRange { amount, range })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tier_name(catalog: &PlanCatalog, amount: f64) -> Option<&'static str> {
        catalog
            .resolve_tier(amount)
            .expect("finite amount")
            .map(|tier| tier.name)
    }

    #[test]
    fn standard_catalog_spans_full_range() {
        let catalog = PlanCatalog::standard();
        assert_eq!(catalog.tiers().len(), 7);
        assert_eq!(catalog.total_range(), DepositRange::new(500.0, 1_000_000.0));
    }

    #[test]
    fn standard_tiers_are_contiguous_and_disjoint() {
        let tiers = PlanCatalog::standard().tiers().to_vec();
        let boundaries: Vec<(f64, f64)> = tiers
            .windows(2)
            .map(|pair| (pair[0].deposit_range.max, pair[1].deposit_range.min))
            .collect();
        assert_eq!(
            boundaries,
            vec![
                (2_499.0, 2_500.0),
                (9_999.0, 10_000.0),
                (24_999.0, 25_000.0),
                (49_999.0, 50_000.0),
                (99_999.0, 100_000.0),
                (249_999.0, 250_000.0),
            ]
        );
        for tier in &tiers {
            assert!(tier.deposit_range.min <= tier.deposit_range.max);
        }
    }

    #[test]
    fn resolve_tier_at_boundaries() {
        let catalog = PlanCatalog::standard();
        assert_eq!(tier_name(&catalog, 500.0), Some("Bronze"));
        assert_eq!(tier_name(&catalog, 2_499.0), Some("Bronze"));
        assert_eq!(tier_name(&catalog, 2_500.0), Some("Silver"));
        assert_eq!(tier_name(&catalog, 49_999.0), Some("Gold"));
        assert_eq!(tier_name(&catalog, 250_000.0), Some("Purple Diamond"));
        assert_eq!(tier_name(&catalog, 1_000_000.0), Some("Purple Diamond"));
    }

    #[test]
    fn resolve_tier_misses_outside_and_in_gaps() {
        let catalog = PlanCatalog::standard();
        assert_eq!(tier_name(&catalog, 499.0), None);
        assert_eq!(tier_name(&catalog, 1_000_001.0), None);
        // fractional amounts between integer bounds fall in a gap
        assert_eq!(tier_name(&catalog, 2_499.5), None);
    }

    #[test]
    fn resolve_tier_rejects_non_finite() {
        let catalog = PlanCatalog::standard();
        assert!(matches!(
            catalog.resolve_tier(f64::NAN),
            Err(CalcError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn resolve_tier_on_empty_catalog_still_rejects_non_finite() {
        let catalog = PlanCatalog::new(Vec::new());
        assert!(catalog.resolve_tier(f64::NAN).is_err());
        assert_eq!(catalog.resolve_tier(1.0), Ok(None));
        assert_eq!(catalog.try_total_range(), None);
    }

    #[test]
    fn total_range_scans_unsorted_tiers() {
        let mut tiers = STANDARD_TIERS.to_vec();
        tiers.reverse();
        let catalog = PlanCatalog::new(tiers);
        assert_eq!(catalog.total_range(), DepositRange::new(500.0, 1_000_000.0));
    }

    #[test]
    fn validate_deposit_reports_range() {
        let catalog = PlanCatalog::standard();
        assert_eq!(catalog.validate_deposit(500.0), Ok(500.0));
        let err = catalog.validate_deposit(100.0).expect_err("below range");
        assert_eq!(
            err,
            CalcError::OutOfRange {
                amount: 100.0,
                range: DepositRange::new(500.0, 1_000_000.0),
            }
        );
    }
}
