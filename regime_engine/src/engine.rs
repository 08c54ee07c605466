//! Regime comparison engine.
//!
//! The `engine` module turns a [`CompensationInput`] into a
//! [`RegimeComparisonResult`].  Every figure is a pure function of the
//! input and the [`TaxTables`] in use: there is no state, no caching
//! and no failure mode for finite input.  Batches of independent
//! scenarios are evaluated in parallel with [`rayon`].
//!
//! All line items are rounded to cents before they are summed, so the
//! totals always equal the sum of the items shown to the user.

use crate::models::{
    BetterRegime, CltBreakdown, Comparison, CompensationInput, PjBreakdown, PjTransport,
    RegimeComparisonResult, WorkSchedule,
};
use crate::tax::TaxTables;
use once_cell::sync::Lazy;
use rayon::prelude::*;
use tracing::debug;

/// Statutory one-third bonus paid on top of vacation salary.
const VACATION_BONUS: f64 = 1.0 / 3.0;

/// Days in the month used to prorate PJ vacation days.
const DAYS_PER_MONTH: f64 = 30.0;

static BUILTIN_TABLES: Lazy<TaxTables> = Lazy::new(TaxTables::brazil_2024);

/// Compare both regimes using the built-in tax tables.
pub fn compare(input: &CompensationInput) -> RegimeComparisonResult {
    RegimeComparator::new(&BUILTIN_TABLES).compare(input)
}

/// Round half away from zero to two decimal places.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Evaluates comparisons against one set of tax tables.
#[derive(Debug, Clone, Copy)]
pub struct RegimeComparator<'a> {
    tables: &'a TaxTables,
}

impl<'a> RegimeComparator<'a> {
    pub fn new(tables: &'a TaxTables) -> Self {
        RegimeComparator { tables }
    }

    /// Compute both breakdowns and the comparison between them.
    pub fn compare(&self, input: &CompensationInput) -> RegimeComparisonResult {
        let clt = self.clt_breakdown(input);
        let pj = self.pj_breakdown(input);
        let mut comparison = build_comparison(&clt, &pj);
        comparison.break_even_pj_gross_monthly =
            self.break_even_pj_gross(input, &pj, clt.monthly_total);
        debug!(
            tax_year = self.tables.year,
            clt_annual = clt.annual_total,
            pj_annual = pj.annual_total,
            better = ?comparison.better_regime,
            "compared regimes"
        );
        RegimeComparisonResult {
            tax_year: self.tables.year,
            clt,
            pj,
            comparison,
        }
    }

    /// Compare many independent scenarios in parallel.  Results keep
    /// the order of `inputs`.
    pub fn compare_many(&self, inputs: &[CompensationInput]) -> Vec<RegimeComparisonResult> {
        inputs.par_iter().map(|input| self.compare(input)).collect()
    }

    /// Monthly figures for the CLT regime.
    pub fn clt_breakdown(&self, input: &CompensationInput) -> CltBreakdown {
        let gross = input.clt_gross_salary;
        let inss = round_cents(self.tables.inss.amount(gross));
        let irrf = round_cents(self.tables.irrf.amount(gross - inss));
        let net_salary = round_cents(gross - inss - irrf);

        let transport = if input.use_transport_allowance {
            input.transport_allowance
        } else {
            0.0
        };
        // Never negative, even when the employee share exceeds the employer's.
        let health_net =
            (input.health_insurance_employer - input.health_insurance_employee_deduction).max(0.0);
        let benefits =
            round_cents(health_net + input.meal_allowance + transport + input.other_benefits);

        let thirteenth = enabled(input.has_thirteenth, gross / 12.0);
        let vacation = enabled(input.has_vacation, gross * (1.0 + VACATION_BONUS) / 12.0);
        let fgts = enabled(input.has_fgts, gross * self.tables.fgts_rate);
        let profit_share = enabled(input.has_profit_share, input.profit_share_annual_value / 12.0);

        let monthly_total =
            round_cents(net_salary + benefits + thirteenth + vacation + fgts + profit_share);

        CltBreakdown {
            gross_salary: round_cents(gross),
            inss_contribution: inss,
            income_tax_withheld: irrf,
            net_salary,
            monthly_benefits_total: benefits,
            thirteenth_monthly: thirteenth,
            vacation_monthly: vacation,
            fgts_monthly: fgts,
            profit_share_monthly: profit_share,
            monthly_total,
            annual_total: round_cents(monthly_total * 12.0),
            effective_hourly_rate: hourly_rate(monthly_total, input.clt_schedule),
        }
    }

    /// Monthly figures for the PJ regime.
    pub fn pj_breakdown(&self, input: &CompensationInput) -> PjBreakdown {
        let gross = input.pj_gross_monthly;
        let rate = self.tables.pj_rates.rate_for(input.pj_company_tax_regime);
        let tax = round_cents(gross * rate);
        let transport = round_cents(self.transport_cost(&input.pj_transport));
        let health = round_cents(input.pj_health_insurance_monthly);
        let meal = round_cents(input.pj_meal_cost_monthly);
        let accountant = enabled(input.pj_has_accountant, input.pj_accountant_monthly_cost);
        let workspace = enabled(input.pj_has_workspace, input.pj_workspace_monthly_cost);
        let equipment = enabled(input.pj_has_equipment, input.pj_equipment_annual_cost / 12.0);
        let vacation = round_cents(
            gross / 12.0 * (f64::from(input.pj_vacation_days_planned) / DAYS_PER_MONTH),
        );
        let thirteenth = enabled(input.pj_accrues_thirteenth, gross / 12.0);

        let total_costs = round_cents(
            tax + transport + health + meal + accountant + workspace + equipment + vacation
                + thirteenth,
        );
        let net_income = round_cents(gross - total_costs);

        PjBreakdown {
            gross_revenue: round_cents(gross),
            tax_withheld: tax,
            transport_cost: transport,
            health_insurance_cost: health,
            meal_cost: meal,
            accountant_cost: accountant,
            workspace_cost: workspace,
            equipment_cost_monthlyized: equipment,
            vacation_provision: vacation,
            thirteenth_provision: thirteenth,
            total_monthly_costs: total_costs,
            net_income,
            annual_total: round_cents(net_income * 12.0),
            effective_hourly_rate: hourly_rate(net_income, input.pj_schedule),
        }
    }

    /// Monthly commuting cost of a PJ contractor.
    ///
    /// Car costs are fuel only, over a fixed number of working days.  A
    /// car with no fuel efficiency, or an unspecified mode, costs 0.
    pub fn transport_cost(&self, transport: &PjTransport) -> f64 {
        match *transport {
            PjTransport::Car {
                daily_distance_km,
                fuel_price_per_liter,
                fuel_efficiency_km_per_liter,
            } => {
                if fuel_efficiency_km_per_liter <= 0.0 {
                    return 0.0;
                }
                daily_distance_km * fuel_price_per_liter / fuel_efficiency_km_per_liter
                    * self.tables.working_days_per_month
            }
            PjTransport::PublicTransit { monthly_cost } | PjTransport::Other { monthly_cost } => {
                monthly_cost
            }
            PjTransport::Unspecified => 0.0,
        }
    }

    /// PJ monthly gross at which PJ net income equals `clt_monthly_total`.
    ///
    /// Tax and provisions scale with gross; every other PJ cost is held
    /// fixed at the value in `pj`.  Returns `None` when the proportional
    /// share reaches 100% of gross.
    pub fn break_even_pj_gross(
        &self,
        input: &CompensationInput,
        pj: &PjBreakdown,
        clt_monthly_total: f64,
    ) -> Option<f64> {
        let thirteenth_share = if input.pj_accrues_thirteenth { 1.0 / 12.0 } else { 0.0 };
        let proportional = self.tables.pj_rates.rate_for(input.pj_company_tax_regime)
            + f64::from(input.pj_vacation_days_planned) / DAYS_PER_MONTH / 12.0
            + thirteenth_share;
        if proportional >= 1.0 {
            return None;
        }
        let fixed = pj.transport_cost
            + pj.health_insurance_cost
            + pj.meal_cost
            + pj.accountant_cost
            + pj.workspace_cost
            + pj.equipment_cost_monthlyized;
        Some(round_cents(((clt_monthly_total + fixed) / (1.0 - proportional)).max(0.0)))
    }
}

/// Compare the annual totals of two breakdowns.
///
/// The break-even figure depends on the input and is left unset.
pub fn build_comparison(clt: &CltBreakdown, pj: &PjBreakdown) -> Comparison {
    let annual_difference = round_cents(pj.annual_total - clt.annual_total);
    let percentage_difference = if clt.annual_total == 0.0 {
        0.0
    } else {
        round_cents(annual_difference / clt.annual_total.abs() * 100.0)
    };
    let better_regime = if annual_difference > 0.0 {
        BetterRegime::Pj
    } else if annual_difference < 0.0 {
        BetterRegime::Clt
    } else {
        BetterRegime::Equivalent
    };
    Comparison {
        annual_difference,
        percentage_difference,
        better_regime,
        break_even_pj_gross_monthly: None,
    }
}

fn enabled(flag: bool, amount: f64) -> f64 {
    if flag {
        round_cents(amount)
    } else {
        0.0
    }
}

fn hourly_rate(monthly_value: f64, schedule: Option<WorkSchedule>) -> Option<f64> {
    let hours = schedule?.monthly_hours();
    if hours > 0.0 {
        Some(round_cents(monthly_value / hours))
    } else {
        None
    }
}
