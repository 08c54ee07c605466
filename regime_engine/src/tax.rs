//! Tax tables and their loading.
//!
//! The `tax` module holds the versioned data the engine evaluates:
//! the progressive INSS and IRRF bracket tables, the flat PJ rates per
//! company regime and a couple of statutory constants.  Tables are
//! plain data keyed by year so that a new tax year is a new JSON file
//! (or a new constructor), never an edit to the engine.

use crate::models::CompanyTaxRegime;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Year of the built-in table.
pub const DEFAULT_TAX_YEAR: u16 = 2024;

/// One bracket of a progressive table.
///
/// Within the bracket the amount is `base * rate - deduction`, which is
/// the usual Brazilian "parcela a deduzir" form of a marginal table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bracket {
    /// Inclusive upper bound of the bracket; `None` is open-ended.
    pub up_to: Option<f64>,
    pub rate: f64,
    #[serde(default)]
    pub deduction: f64,
}

/// A progressive table such as INSS or IRRF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressiveTable {
    /// Brackets in ascending order of `up_to`.
    pub brackets: Vec<Bracket>,
    /// Maximum amount, applied to every base.
    #[serde(default)]
    pub ceiling: Option<f64>,
}

impl ProgressiveTable {
    /// Evaluate the table for `base`.
    ///
    /// The result is never negative.  Bases above the last bounded
    /// bracket of a table without an open-ended bracket yield the
    /// ceiling (or zero when the table has none).
    pub fn amount(&self, base: f64) -> f64 {
        if base <= 0.0 {
            return 0.0;
        }
        let bracket = self
            .brackets
            .iter()
            .find(|b| b.up_to.map_or(true, |limit| base <= limit));
        let raw = match bracket {
            Some(b) => (base * b.rate - b.deduction).max(0.0),
            None => return self.ceiling.unwrap_or(0.0),
        };
        match self.ceiling {
            Some(ceiling) => raw.min(ceiling),
            None => raw,
        }
    }
}

/// Flat rate applied to PJ gross revenue for each company regime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PjTaxRates {
    pub mei: f64,
    pub simples: f64,
    pub lucro_presumido: f64,
}

impl PjTaxRates {
    pub fn rate_for(&self, regime: CompanyTaxRegime) -> f64 {
        match regime {
            CompanyTaxRegime::Mei => self.mei,
            CompanyTaxRegime::Simples => self.simples,
            CompanyTaxRegime::LucroPresumido => self.lucro_presumido,
        }
    }
}

/// Everything year-dependent the engine needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxTables {
    pub year: u16,
    pub inss: ProgressiveTable,
    pub irrf: ProgressiveTable,
    pub pj_rates: PjTaxRates,
    pub fgts_rate: f64,
    pub working_days_per_month: f64,
}

impl TaxTables {
    /// The 2024 tables.
    pub fn brazil_2024() -> Self {
        TaxTables {
            year: 2024,
            inss: ProgressiveTable {
                brackets: vec![
                    Bracket { up_to: Some(1412.00), rate: 0.075, deduction: 0.0 },
                    Bracket { up_to: Some(2666.68), rate: 0.09, deduction: 21.18 },
                    Bracket { up_to: Some(4000.03), rate: 0.12, deduction: 101.18 },
                    Bracket { up_to: Some(7786.02), rate: 0.14, deduction: 181.18 },
                ],
                // 7786.02 * 0.14 - 181.18, in cents
                ceiling: Some(908.86),
            },
            irrf: ProgressiveTable {
                brackets: vec![
                    Bracket { up_to: Some(2112.00), rate: 0.0, deduction: 0.0 },
                    Bracket { up_to: Some(2826.65), rate: 0.075, deduction: 158.40 },
                    Bracket { up_to: Some(3751.05), rate: 0.15, deduction: 370.40 },
                    Bracket { up_to: Some(4664.68), rate: 0.225, deduction: 651.73 },
                    Bracket { up_to: None, rate: 0.275, deduction: 884.96 },
                ],
                ceiling: None,
            },
            pj_rates: PjTaxRates {
                mei: 0.06,
                simples: 0.11,
                lucro_presumido: 0.1633,
            },
            fgts_rate: 0.08,
            working_days_per_month: 22.0,
        }
    }
}

impl Default for TaxTables {
    fn default() -> Self {
        Self::brazil_2024()
    }
}

/// Errors raised when looking up tax tables.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaxTableError {
    #[error("no tax table for year {0}")]
    UnknownYear(u16),
}

/// Immutable set of tax tables keyed by year.
///
/// Built once at startup and shared read-only afterwards.
#[derive(Debug, Clone)]
pub struct TaxTableRegistry {
    tables: BTreeMap<u16, TaxTables>,
    default_year: u16,
}

impl TaxTableRegistry {
    /// A registry holding only the built-in table.
    pub fn builtin() -> Self {
        let mut tables = BTreeMap::new();
        tables.insert(DEFAULT_TAX_YEAR, TaxTables::brazil_2024());
        TaxTableRegistry {
            tables,
            default_year: DEFAULT_TAX_YEAR,
        }
    }

    /// The built-in table extended (or overridden) by `extra`.
    pub fn with_tables(extra: Vec<TaxTables>, default_year: u16) -> Result<Self, TaxTableError> {
        let mut registry = Self::builtin();
        for tables in extra {
            registry.tables.insert(tables.year, tables);
        }
        if !registry.tables.contains_key(&default_year) {
            return Err(TaxTableError::UnknownYear(default_year));
        }
        registry.default_year = default_year;
        Ok(registry)
    }

    pub fn get(&self, year: u16) -> Result<&TaxTables, TaxTableError> {
        self.tables.get(&year).ok_or(TaxTableError::UnknownYear(year))
    }

    pub fn default_tables(&self) -> &TaxTables {
        // `default_year` is checked on construction.
        &self.tables[&self.default_year]
    }

    pub fn years(&self) -> impl Iterator<Item = u16> + '_ {
        self.tables.keys().copied()
    }
}

/// Load all tax table definitions from a directory.
///
/// Every `.json` file is parsed as a [`TaxTables`] value.  Files that
/// fail to parse are logged and skipped; a missing directory yields an
/// empty vector.
pub fn load_tax_tables_from_dir(path: &Path) -> Result<Vec<TaxTables>> {
    let mut tables = Vec::new();
    if !path.is_dir() {
        info!(dir = %path.display(), "tax table directory not found, using built-in tables");
        return Ok(tables);
    }
    for entry in std::fs::read_dir(path)? {
        let entry = entry?;
        let file = entry.path();
        if !entry.file_type()?.is_file() || file.extension().map_or(true, |ext| ext != "json") {
            continue;
        }
        let data = std::fs::read_to_string(&file)?;
        match serde_json::from_str::<TaxTables>(&data) {
            Ok(table) => {
                debug!(file = %file.display(), year = table.year, "loaded tax table");
                tables.push(table);
            }
            Err(err) => warn!(file = %file.display(), %err, "failed to parse tax table"),
        }
    }
    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn cents(value: f64) -> f64 {
        (value * 100.0).round() / 100.0
    }

    #[test]
    fn test_inss_brackets_2024() {
        let inss = TaxTables::brazil_2024().inss;
        assert_eq!(cents(inss.amount(1412.00)), 105.90);
        assert_eq!(cents(inss.amount(2666.68)), 218.82);
        assert_eq!(cents(inss.amount(4000.03)), 378.82);
        assert_eq!(cents(inss.amount(5000.00)), 518.82);
        assert_eq!(inss.amount(7786.02), 908.86);
        assert_eq!(inss.amount(20_000.0), 908.86);
    }

    #[test]
    fn test_irrf_exempt_below_threshold() {
        let irrf = TaxTables::brazil_2024().irrf;
        assert_eq!(irrf.amount(0.0), 0.0);
        assert_eq!(irrf.amount(1500.0), 0.0);
        assert_eq!(irrf.amount(2112.0), 0.0);
        assert!(irrf.amount(2200.0) > 0.0);
    }

    #[test]
    fn test_irrf_top_bracket_is_open() {
        let irrf = TaxTables::brazil_2024().irrf;
        assert_eq!(cents(irrf.amount(10_000.0)), 1865.04);
    }

    #[test]
    fn test_pj_rates_by_regime() {
        let rates = TaxTables::brazil_2024().pj_rates;
        assert_eq!(rates.rate_for(CompanyTaxRegime::Mei), 0.06);
        assert!(rates.rate_for(CompanyTaxRegime::Simples) > rates.mei);
        assert!(rates.rate_for(CompanyTaxRegime::LucroPresumido) > rates.simples);
    }

    #[test]
    fn test_registry_rejects_unknown_default_year() {
        let err = TaxTableRegistry::with_tables(Vec::new(), 1999).unwrap_err();
        assert_eq!(err, TaxTableError::UnknownYear(1999));
    }

    #[test]
    fn test_registry_overrides_builtin_year() {
        let mut custom = TaxTables::brazil_2024();
        custom.year = 2025;
        custom.fgts_rate = 0.09;
        let registry = TaxTableRegistry::with_tables(vec![custom], 2025).unwrap();
        assert_eq!(registry.default_tables().fgts_rate, 0.09);
        assert_eq!(registry.years().collect::<Vec<_>>(), vec![2024, 2025]);
        assert!(registry.get(2024).is_ok());
    }

    #[test]
    fn test_load_tax_tables_from_dir_skips_invalid_files() {
        let dir = std::env::temp_dir().join(format!("regime-tax-tables-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let mut table = TaxTables::brazil_2024();
        table.year = 2030;
        std::fs::write(dir.join("2030.json"), serde_json::to_string(&table).unwrap()).unwrap();
        std::fs::write(dir.join("broken.json"), "{ not json").unwrap();
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let loaded = load_tax_tables_from_dir(&dir).unwrap();
        std::fs::remove_dir_all(&dir).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].year, 2030);
        assert_eq!(loaded[0].inss.brackets.len(), table.inss.brackets.len());
    }

    #[test]
    fn test_shipped_tables_parse() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("tax_tables");
        let loaded = load_tax_tables_from_dir(&dir).unwrap();
        let table = loaded.iter().find(|t| t.year == 2025).unwrap();
        assert_eq!(table.inss.amount(10_000.0), 951.63);
        assert_eq!(table.irrf.amount(2400.0), 0.0);
    }

    #[test]
    fn test_missing_dir_is_empty() {
        let loaded = load_tax_tables_from_dir(Path::new("/definitely/not/here")).unwrap();
        assert!(loaded.is_empty());
    }

    // Published deductions are rounded to cents, so adjacent brackets can
    // disagree by a fraction of a cent at their shared boundary.
    const CENT_TOLERANCE: f64 = 0.01;

    proptest! {
        #[test]
        fn inss_is_non_decreasing(a in 0.0f64..12_000.0, delta in 0.0f64..500.0) {
            let inss = TaxTables::brazil_2024().inss;
            prop_assert!(inss.amount(a + delta) >= inss.amount(a) - CENT_TOLERANCE);
        }

        #[test]
        fn irrf_is_non_decreasing(a in 0.0f64..20_000.0, delta in 0.0f64..500.0) {
            let irrf = TaxTables::brazil_2024().irrf;
            prop_assert!(irrf.amount(a + delta) >= irrf.amount(a) - CENT_TOLERANCE);
        }

        #[test]
        fn inss_is_continuous_at_boundaries(i in 0usize..4) {
            let inss = TaxTables::brazil_2024().inss;
            let limit = inss.brackets[i].up_to.unwrap();
            let jump = inss.amount(limit + 0.0001) - inss.amount(limit);
            prop_assert!(jump.abs() < CENT_TOLERANCE);
        }
    }
}
