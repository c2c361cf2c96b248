//! Financial assumptions shared by every strategy.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomicParams {
    pub discount_rate: f64,
    pub project_life_years: u32,
    /// Delivered gas price ($/MMBtu)
    pub fuel_price_mmbtu: f64,
    /// Investment tax credit applied to solar and storage capex
    pub itc_rate: f64,
    /// Value of lost load used to penalize unserved energy ($/MWh)
    pub unserved_penalty_mwh: f64,
    /// Salvage value of purchased bridge equipment, as a share of capex
    pub residual_value_pct: f64,
    /// Rental price for temporary generation ($/kW-month)
    pub rental_cost_kw_month: f64,
}

impl Default for EconomicParams {
    fn default() -> Self {
        Self {
            discount_rate: 0.08,
            project_life_years: 20,
            fuel_price_mmbtu: 3.50,
            itc_rate: 0.30,
            unserved_penalty_mwh: 50_000.0,
            residual_value_pct: 0.10,
            rental_cost_kw_month: 50.0,
        }
    }
}

impl EconomicParams {
    /// Capital Recovery Factor for annualizing capex
    ///
    /// CRF = r(1+r)^n / ((1+r)^n - 1)
    ///
    /// where r = discount rate, n = project life
    pub fn capital_recovery_factor(&self) -> f64 {
        let r = self.discount_rate;
        let n = self.project_life_years as f64;
        if self.project_life_years == 0 {
            1.0
        } else if r < 1e-10 {
            // No discounting
            1.0 / n
        } else {
            r * (1.0 + r).powf(n) / ((1.0 + r).powf(n) - 1.0)
        }
    }

    /// Present-value factor for a cash flow `years` from the base year.
    pub fn discount_factor(&self, years: f64) -> f64 {
        1.0 / (1.0 + self.discount_rate).powf(years)
    }

    pub fn monthly_rate(&self) -> f64 {
        self.discount_rate / 12.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crf_default() {
        let crf = EconomicParams::default().capital_recovery_factor();
        assert!((crf - 0.10185).abs() < 1e-4, "crf = {crf}");
    }

    #[test]
    fn test_crf_degenerate() {
        let zero_rate = EconomicParams {
            discount_rate: 0.0,
            project_life_years: 10,
            ..EconomicParams::default()
        };
        assert!((zero_rate.capital_recovery_factor() - 0.1).abs() < 1e-12);

        let zero_life = EconomicParams {
            project_life_years: 0,
            ..EconomicParams::default()
        };
        assert_eq!(zero_life.capital_recovery_factor(), 1.0);
    }

    #[test]
    fn test_discount_factor() {
        let econ = EconomicParams::default();
        assert_eq!(econ.discount_factor(0.0), 1.0);
        assert!((econ.discount_factor(1.0) - 1.0 / 1.08).abs() < 1e-12);
    }
}
