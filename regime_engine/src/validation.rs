//! Validation of comparison input.
//!
//! The engine assumes finite, non-negative input and never checks it.
//! Callers run [`validate`] first and report every failing field at
//! once; messages are the user-facing Portuguese texts shown by the
//! form.

use crate::models::{CompensationInput, PjTransport, WorkSchedule};
use serde::Serialize;
use thiserror::Error;

pub const MAX_VACATION_DAYS: u32 = 365;

/// A single invalid field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// camelCase name of the field, as sent on the wire.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Every invalid field of one input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("invalid input: {}", summary(.errors))]
pub struct ValidationErrors {
    pub errors: Vec<ValidationError>,
}

fn summary(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Check `input` and collect every problem found.
pub fn validate(input: &CompensationInput) -> Result<(), ValidationErrors> {
    let mut errors = Vec::new();

    // Each side of the comparison needs its own salary.
    if input.clt_gross_salary == 0.0 {
        errors.push(ValidationError::new("cltGrossSalary", "Informe o salário CLT"));
    }
    if input.pj_gross_monthly == 0.0 {
        errors.push(ValidationError::new("pjGrossMonthly", "Informe o valor PJ"));
    }

    let amounts = [
        ("cltGrossSalary", input.clt_gross_salary),
        ("healthInsuranceEmployer", input.health_insurance_employer),
        ("healthInsuranceEmployeeDeduction", input.health_insurance_employee_deduction),
        ("mealAllowance", input.meal_allowance),
        ("transportAllowance", input.transport_allowance),
        ("otherBenefits", input.other_benefits),
        ("profitShareAnnualValue", input.profit_share_annual_value),
        ("pjGrossMonthly", input.pj_gross_monthly),
        ("pjHealthInsuranceMonthly", input.pj_health_insurance_monthly),
        ("pjMealCostMonthly", input.pj_meal_cost_monthly),
        ("pjAccountantMonthlyCost", input.pj_accountant_monthly_cost),
        ("pjWorkspaceMonthlyCost", input.pj_workspace_monthly_cost),
        ("pjEquipmentAnnualCost", input.pj_equipment_annual_cost),
    ];
    for (field, value) in amounts {
        check_amount(&mut errors, field, value);
    }

    match input.pj_transport {
        PjTransport::Car {
            daily_distance_km,
            fuel_price_per_liter,
            fuel_efficiency_km_per_liter,
        } => {
            check_amount(&mut errors, "pjTransport.dailyDistanceKm", daily_distance_km);
            check_amount(&mut errors, "pjTransport.fuelPricePerLiter", fuel_price_per_liter);
            check_amount(
                &mut errors,
                "pjTransport.fuelEfficiencyKmPerLiter",
                fuel_efficiency_km_per_liter,
            );
        }
        PjTransport::PublicTransit { monthly_cost } | PjTransport::Other { monthly_cost } => {
            check_amount(&mut errors, "pjTransport.monthlyCost", monthly_cost);
        }
        PjTransport::Unspecified => {}
    }

    if input.pj_vacation_days_planned > MAX_VACATION_DAYS {
        errors.push(ValidationError::new(
            "pjVacationDaysPlanned",
            "Os dias de férias devem estar entre 0 e 365",
        ));
    }

    if let Some(schedule) = input.clt_schedule {
        check_schedule(&mut errors, "cltSchedule", schedule);
    }
    if let Some(schedule) = input.pj_schedule {
        check_schedule(&mut errors, "pjSchedule", schedule);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors { errors })
    }
}

fn check_amount(errors: &mut Vec<ValidationError>, field: &str, value: f64) {
    if !value.is_finite() {
        errors.push(ValidationError::new(field, "Valor numérico inválido"));
    } else if value < 0.0 {
        errors.push(ValidationError::new(field, "O valor não pode ser negativo"));
    }
}

fn check_schedule(errors: &mut Vec<ValidationError>, prefix: &str, schedule: WorkSchedule) {
    if !(0.0..=24.0).contains(&schedule.hours_per_day) {
        errors.push(ValidationError::new(
            format!("{prefix}.hoursPerDay"),
            "As horas por dia devem estar entre 0 e 24",
        ));
    }
    if !(0.0..=7.0).contains(&schedule.days_per_week) {
        errors.push(ValidationError::new(
            format!("{prefix}.daysPerWeek"),
            "Os dias por semana devem estar entre 0 e 7",
        ));
    }
}
