use serde::Serialize;

use super::types::{AccountTier, CalculationRecord};

pub const BREAKDOWN_LABELS: [&str; 4] =
    ["Your Investment", "Bonus", "Cash Profit", "Equity Profit"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownSlice {
    pub label: &'static str,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierDetail {
    pub key: &'static str,
    pub label: String,
    pub value: String,
}

pub fn format_money(amount: f64) -> String {
    if !amount.is_finite() {
        return format!("$ {amount}");
    }

    // Round the shortest decimal text, not the binary value, so 1.005 gives 1.01.
    let text = amount.abs().to_string();
    let (int_text, frac_text) = text.split_once('.').unwrap_or((text.as_str(), ""));
    let mut digits: Vec<u8> = int_text
        .bytes()
        .chain(frac_text.bytes().chain(std::iter::repeat(b'0')).take(2))
        .map(|b| b - b'0')
        .collect();

    if frac_text.as_bytes().get(2).is_some_and(|&d| d >= b'5') {
        let mut carry = true;
        for digit in digits.iter_mut().rev() {
            if *digit == 9 {
                *digit = 0;
            } else {
                *digit += 1;
                carry = false;
                break;
            }
        }
        if carry {
            digits.insert(0, 1);
        }
    }

    let (whole, cents) = digits.split_at(digits.len() - 2);
    let whole_start = whole.iter().position(|&d| d != 0).unwrap_or(whole.len());
    let whole = &whole[whole_start..];
    let is_zero = whole.is_empty() && cents.iter().all(|&d| d == 0);

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3 + 1);
    if whole.is_empty() {
        grouped.push('0');
    }
    for (idx, &d) in whole.iter().enumerate() {
        if idx > 0 && (whole.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(char::from(b'0' + d));
    }

    let fraction = match (cents[0], cents[1]) {
        (0, 0) => String::new(),
        (tenths, 0) => format!(".{tenths}"),
        (tenths, hundredths) => format!(".{tenths}{hundredths}"),
    };
    let sign = if amount < 0.0 && !is_zero { "-" } else { "" };

    format!("$ {sign}{grouped}{fraction}")
}

/// `depositRange` becomes `Deposit range:`.
pub fn label_from_key(key: &str) -> String {
    let mut spaced = String::with_capacity(key.len() + 4);
    let mut prev_lower = false;
    for ch in key.chars() {
        if ch.is_ascii_uppercase() && prev_lower {
            spaced.push(' ');
        }
        prev_lower = ch.is_ascii_lowercase();
        spaced.push(ch.to_ascii_lowercase());
    }

    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => format!("{}{}:", first.to_ascii_uppercase(), chars.as_str()),
        None => ":".to_string(),
    }
}

pub fn tier_details(tier: &AccountTier) -> Vec<TierDetail> {
    let fields: [(&'static str, String); 8] = [
        ("name", tier.name.to_string()),
        ("durationMonths", tier.duration_months.to_string()),
        ("bonusRate", tier.bonus_rate.to_string()),
        ("dailyReturnRate", tier.daily_return_rate.to_string()),
        ("defaultSplit", tier.default_split.to_string()),
        ("depositRange", tier.deposit_range.to_string()),
        ("loyaltyDiscount", tier.loyalty_discount.to_string()),
        ("affiliateTier", tier.affiliate_tier.to_string()),
    ];

    fields
        .into_iter()
        .map(|(key, value)| TierDetail {
            key,
            label: label_from_key(key),
            value,
        })
        .collect()
}

pub fn profit_breakdown(record: &CalculationRecord) -> Vec<BreakdownSlice> {
    let values = [
        record.position.deposit_amount,
        record.position.bonus_amount,
        record.total_cash_profit(),
        record.total_equity_profit(),
    ];
    BREAKDOWN_LABELS
        .into_iter()
        .zip(values)
        .map(|(label, value)| BreakdownSlice { label, value })
        .collect()
}
