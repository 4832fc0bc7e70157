use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::money::Money;

/// Longest projection accepted, in months.
pub const MAX_MONTHS: u32 = 1200;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("{0} must not be negative")]
    Negative(&'static str),
    #[error("Projection of {0} months exceeds the 1200-month limit")]
    TooLong(u32),
    #[error("Balance overflowed in month {0}")]
    Overflow(u32),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationInput {
    pub principal: Decimal,
    pub monthly_contribution: Decimal,
    /// Nominal yearly rate, e.g. `8` for 8%.
    pub annual_rate_percent: Decimal,
    pub months: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionPoint {
    pub month: u32,
    pub balance: Money,
    pub contributed: Money,
    pub interest: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    pub final_balance: Money,
    pub total_contributed: Money,
    pub total_interest: Money,
    pub schedule: Vec<ProjectionPoint>,
}

impl SimulationResult {
    /// Month-by-month projection with monthly compounding.
    ///
    /// Each month accrues `balance * rate / 12` on the opening balance, then
    /// adds the contribution. Rounding to cents happens only on the reported
    /// values, never on the running balance.
    pub fn calculate(input: &SimulationInput) -> Result<SimulationResult, SimulationError> {
        if input.principal.is_sign_negative() && !input.principal.is_zero() {
            return Err(SimulationError::Negative("principal"));
        }
        if input.monthly_contribution.is_sign_negative() && !input.monthly_contribution.is_zero() {
            return Err(SimulationError::Negative("monthly contribution"));
        }
        if input.annual_rate_percent.is_sign_negative() && !input.annual_rate_percent.is_zero() {
            return Err(SimulationError::Negative("annual rate"));
        }
        if input.months > MAX_MONTHS {
            return Err(SimulationError::TooLong(input.months));
        }

        let monthly_rate = input.annual_rate_percent / Decimal::from(1200);
        let mut balance = input.principal;
        let mut contributed = input.principal;
        let mut interest = Decimal::ZERO;
        let mut schedule = Vec::with_capacity(input.months as usize);

        for month in 1..=input.months {
            let accrued = balance
                .checked_mul(monthly_rate)
                .ok_or(SimulationError::Overflow(month))?;
            balance = balance
                .checked_add(accrued)
                .and_then(|b| b.checked_add(input.monthly_contribution))
                .ok_or(SimulationError::Overflow(month))?;
            contributed = contributed
                .checked_add(input.monthly_contribution)
                .ok_or(SimulationError::Overflow(month))?;
            interest = interest
                .checked_add(accrued)
                .ok_or(SimulationError::Overflow(month))?;

            schedule.push(ProjectionPoint {
                month,
                balance: Money::from_decimal(balance),
                contributed: Money::from_decimal(contributed),
                interest: Money::from_decimal(interest),
            });
        }

        Ok(SimulationResult {
            final_balance: Money::from_decimal(balance),
            total_contributed: Money::from_decimal(contributed),
            total_interest: Money::from_decimal(interest),
            schedule,
        })
    }
}
