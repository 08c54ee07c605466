//! Data models for the Regime Engine.
//!
//! The `models` module defines the serialisable input and output
//! records of a CLT vs PJ comparison.  These types derive `Serialize`
//! and `Deserialize` so that they can be exchanged with a form layer,
//! persisted as a saved draft, or transmitted over HTTP.  Field names
//! are camelCase on the wire.

use serde::{Deserialize, Serialize};

/// The company tax regime a PJ contractor is registered under.
///
/// Each regime maps to a single flat rate applied to gross revenue
/// (see [`crate::tax::PjTaxRates`]).  This is an approximation: real
/// Simples and Lucro Presumido taxation is tiered by revenue and
/// activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanyTaxRegime {
    /// Microempreendedor Individual.
    #[serde(alias = "MEI")]
    Mei,
    /// Simples Nacional.
    #[default]
    #[serde(alias = "Simples")]
    Simples,
    /// Lucro Presumido.
    #[serde(alias = "LucroPresumido")]
    LucroPresumido,
}

/// How a PJ contractor commutes, with the cost inputs that matter for
/// that mode only.
///
/// Missing numeric fields default to zero, and an unknown `mode`
/// deserialises to [`PjTransport::Unspecified`], which costs nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum PjTransport {
    /// Own car: fuel cost per working day.
    #[serde(rename_all = "camelCase")]
    Car {
        #[serde(default)]
        daily_distance_km: f64,
        #[serde(default)]
        fuel_price_per_liter: f64,
        #[serde(default)]
        fuel_efficiency_km_per_liter: f64,
    },
    /// Public transit at a flat monthly cost.
    #[serde(rename_all = "camelCase", alias = "public")]
    PublicTransit {
        #[serde(default)]
        monthly_cost: f64,
    },
    /// Any other arrangement at a flat monthly cost.
    #[serde(rename_all = "camelCase")]
    Other {
        #[serde(default)]
        monthly_cost: f64,
    },
    #[default]
    #[serde(other)]
    Unspecified,
}

/// Weekly workload used to derive an hourly equivalent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkSchedule {
    pub hours_per_day: f64,
    pub days_per_week: f64,
}

impl WorkSchedule {
    /// Average working hours in a month (52 weeks spread over 12 months).
    pub fn monthly_hours(&self) -> f64 {
        self.hours_per_day * self.days_per_week * 52.0 / 12.0
    }
}

/// Input to the comparison engine.
///
/// Monetary amounts are in BRL.  Flag/value pairs such as
/// `has_profit_share`/`profit_share_annual_value` only contribute when
/// the flag is set; the value is otherwise ignored.  Every field has a
/// default so that partially filled drafts deserialise; validation of
/// the record lives in [`crate::validation`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompensationInput {
    // CLT
    pub clt_gross_salary: f64,
    pub health_insurance_employer: f64,
    pub health_insurance_employee_deduction: f64,
    pub meal_allowance: f64,
    pub transport_allowance: f64,
    pub use_transport_allowance: bool,
    pub other_benefits: f64,
    pub has_thirteenth: bool,
    pub has_vacation: bool,
    #[serde(rename = "hasFGTS", alias = "hasFgts")]
    pub has_fgts: bool,
    pub has_profit_share: bool,
    pub profit_share_annual_value: f64,
    pub clt_schedule: Option<WorkSchedule>,

    // PJ
    pub pj_gross_monthly: f64,
    pub pj_vacation_days_planned: u32,
    pub pj_accrues_thirteenth: bool,
    pub pj_transport: PjTransport,
    pub pj_health_insurance_monthly: f64,
    pub pj_meal_cost_monthly: f64,
    pub pj_company_tax_regime: CompanyTaxRegime,
    pub pj_has_accountant: bool,
    pub pj_accountant_monthly_cost: f64,
    pub pj_has_workspace: bool,
    pub pj_workspace_monthly_cost: f64,
    pub pj_has_equipment: bool,
    pub pj_equipment_annual_cost: f64,
    pub pj_schedule: Option<WorkSchedule>,
}

/// Monthly breakdown of the CLT regime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CltBreakdown {
    pub gross_salary: f64,
    pub inss_contribution: f64,
    pub income_tax_withheld: f64,
    /// Gross minus INSS and IRRF.
    pub net_salary: f64,
    pub monthly_benefits_total: f64,
    pub thirteenth_monthly: f64,
    pub vacation_monthly: f64,
    pub fgts_monthly: f64,
    pub profit_share_monthly: f64,
    /// Net salary plus recurring benefits plus monthly accruals.
    pub monthly_total: f64,
    pub annual_total: f64,
    pub effective_hourly_rate: Option<f64>,
}

/// Monthly breakdown of the PJ regime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PjBreakdown {
    pub gross_revenue: f64,
    pub tax_withheld: f64,
    pub transport_cost: f64,
    pub health_insurance_cost: f64,
    pub meal_cost: f64,
    pub accountant_cost: f64,
    pub workspace_cost: f64,
    pub equipment_cost_monthlyized: f64,
    pub vacation_provision: f64,
    pub thirteenth_provision: f64,
    pub total_monthly_costs: f64,
    pub net_income: f64,
    pub annual_total: f64,
    pub effective_hourly_rate: Option<f64>,
}

/// Which regime pays more over a year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BetterRegime {
    #[serde(rename = "CLT")]
    Clt,
    #[serde(rename = "PJ")]
    Pj,
    Equivalent,
}

/// Final comparison between the two annual totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    /// PJ annual total minus CLT annual total.
    pub annual_difference: f64,
    /// `annual_difference` relative to the CLT annual total, in percent.
    /// Zero when the CLT annual total is zero.
    pub percentage_difference: f64,
    pub better_regime: BetterRegime,
    /// PJ monthly gross at which PJ net income matches the CLT monthly
    /// total, holding the PJ fixed costs constant.
    pub break_even_pj_gross_monthly: Option<f64>,
}

/// The result of comparing both regimes for one input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegimeComparisonResult {
    /// Year of the tax table the figures were computed with.
    pub tax_year: u16,
    pub clt: CltBreakdown,
    pub pj: PjBreakdown,
    pub comparison: Comparison,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_input_deserialises_camel_case_with_defaults() {
        let input: CompensationInput = serde_json::from_value(json!({
            "cltGrossSalary": 5000.0,
            "hasFGTS": true,
            "pjGrossMonthly": 7000.0,
            "pjCompanyTaxRegime": "MEI",
            "pjTransport": { "mode": "car", "dailyDistanceKm": 20.0 }
        }))
        .unwrap();
        assert_eq!(input.clt_gross_salary, 5000.0);
        assert!(input.has_fgts);
        assert!(!input.has_thirteenth);
        assert_eq!(input.pj_company_tax_regime, CompanyTaxRegime::Mei);
        assert_eq!(
            input.pj_transport,
            PjTransport::Car {
                daily_distance_km: 20.0,
                fuel_price_per_liter: 0.0,
                fuel_efficiency_km_per_liter: 0.0,
            }
        );
    }

    #[test]
    fn test_unknown_transport_mode_is_unspecified() {
        let transport: PjTransport =
            serde_json::from_value(json!({ "mode": "bicycle", "monthlyCost": 10.0 })).unwrap();
        assert_eq!(transport, PjTransport::Unspecified);
    }

    #[test]
    fn test_transport_accepts_form_public_mode() {
        let transport: PjTransport =
            serde_json::from_value(json!({ "mode": "public", "monthlyCost": 250.0 })).unwrap();
        assert_eq!(transport, PjTransport::PublicTransit { monthly_cost: 250.0 });
    }

    #[test]
    fn test_company_regime_accepts_form_values() {
        let regime: CompanyTaxRegime = serde_json::from_value(json!("lucro_presumido")).unwrap();
        assert_eq!(regime, CompanyTaxRegime::LucroPresumido);
    }

    #[test]
    fn test_better_regime_wire_names() {
        assert_eq!(serde_json::to_value(BetterRegime::Clt).unwrap(), json!("CLT"));
        assert_eq!(serde_json::to_value(BetterRegime::Pj).unwrap(), json!("PJ"));
    }

    #[test]
    fn test_monthly_hours() {
        let schedule = WorkSchedule { hours_per_day: 8.0, days_per_week: 5.0 };
        assert!((schedule.monthly_hours() - 173.333).abs() < 0.001);
    }
}
