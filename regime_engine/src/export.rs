//! Spreadsheet export of a comparison.
//!
//! A [`Workbook`] flattens a [`RegimeComparisonResult`] into two sheets,
//! one with monthly figures and one with annual figures.  Cells keep
//! their numeric value and know how to render themselves in Brazilian
//! currency format, so the workbook can be saved as an `.xlsx` file with
//! typed cells or rendered as `;`-delimited text.

use crate::engine::round_cents;
use crate::models::{BetterRegime, RegimeComparisonResult};
use rust_xlsxwriter::{Format, Workbook as XlsxWorkbook, XlsxError};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const MONTHLY_SHEET: &str = "Comparação Mensal";
pub const ANNUAL_SHEET: &str = "Comparação Anual";
pub const DEFAULT_FILE_STEM: &str = "comparacao-clt-pj";

const CURRENCY_FORMAT: &str = "\"R$\"#,##0.00";
const PERCENT_FORMAT: &str = "0.00%";
const LABEL_COLUMN_WIDTH: f64 = 36.0;
const VALUE_COLUMN_WIDTH: f64 = 18.0;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write xlsx workbook: {0}")]
    Xlsx(#[from] XlsxError),
    #[error("failed to write delimited sheet: {0}")]
    Csv(#[from] csv::Error),
    #[error("export I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("delimited sheet is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// One spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Cell {
    Empty,
    Text(String),
    Currency(f64),
    Percent(f64),
}

impl Cell {
    /// Display text of the cell (`R$ 1.234,56`, `19,70%`).
    pub fn render(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(text) => text.clone(),
            Cell::Currency(value) => format_brl(*value),
            Cell::Percent(value) => format!("{}%", format_decimal(*value)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    fn new(name: &str) -> Self {
        Sheet {
            name: name.to_string(),
            rows: Vec::new(),
        }
    }

    fn heading(&mut self, text: &str) {
        self.rows.push(vec![Cell::Text(text.to_string())]);
    }

    fn blank(&mut self) {
        self.rows.push(vec![Cell::Empty]);
    }

    fn currency(&mut self, label: &str, value: f64) {
        self.rows
            .push(vec![Cell::Text(label.to_string()), Cell::Currency(value)]);
    }

    fn text(&mut self, label: &str, value: &str) {
        self.rows.push(vec![
            Cell::Text(label.to_string()),
            Cell::Text(value.to_string()),
        ]);
    }

    /// Look up the value cell of the row labelled `label`.
    pub fn value_of(&self, label: &str) -> Option<&Cell> {
        self.rows.iter().find_map(|row| match row.as_slice() {
            [Cell::Text(text), value, ..] if text == label => Some(value),
            _ => None,
        })
    }

    /// Render the sheet as `;`-separated lines, the delimiter Brazilian
    /// spreadsheet locales expect.  Rows may have different lengths.
    pub fn to_delimited(&self) -> Result<String, ExportError> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b';')
            .flexible(true)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());
        for row in &self.rows {
            writer.write_record(row.iter().map(Cell::render))?;
        }
        let bytes = writer.into_inner().map_err(|err| err.into_error())?;
        Ok(String::from_utf8(bytes)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn from_result(result: &RegimeComparisonResult) -> Self {
        Workbook {
            sheets: vec![monthly_sheet(result), annual_sheet(result)],
        }
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// Save the workbook as an `.xlsx` file.  Currency and percent cells
    /// are stored as numbers with a number format, not as text.
    pub fn write_xlsx(&self, path: impl AsRef<Path>) -> Result<(), ExportError> {
        let path = path.as_ref();
        let currency = Format::new().set_num_format(CURRENCY_FORMAT);
        let percent = Format::new().set_num_format(PERCENT_FORMAT);
        let mut xlsx = XlsxWorkbook::new();
        for sheet in &self.sheets {
            let worksheet = xlsx.add_worksheet();
            worksheet.set_name(&sheet.name)?;
            worksheet.set_column_width(0, LABEL_COLUMN_WIDTH)?;
            worksheet.set_column_width(1, VALUE_COLUMN_WIDTH)?;
            for (row, cells) in sheet.rows.iter().enumerate() {
                let row = row as u32;
                for (col, cell) in cells.iter().enumerate() {
                    let col = col as u16;
                    match cell {
                        Cell::Empty => {}
                        Cell::Text(text) => {
                            worksheet.write_string(row, col, text)?;
                        }
                        Cell::Currency(value) => {
                            worksheet.write_number_with_format(row, col, *value, &currency)?;
                        }
                        // Stored as a fraction; the format multiplies by 100.
                        Cell::Percent(value) => {
                            worksheet.write_number_with_format(row, col, value / 100.0, &percent)?;
                        }
                    }
                }
            }
        }
        xlsx.save(path)?;
        debug!(path = %path.display(), sheets = self.sheets.len(), "wrote xlsx workbook");
        Ok(())
    }

    /// Save the workbook into `dir` under the default file name and
    /// return the full path.
    pub fn write_xlsx_to_dir(&self, dir: impl AsRef<Path>) -> Result<PathBuf, ExportError> {
        let path = dir.as_ref().join(default_file_name());
        self.write_xlsx(&path)?;
        Ok(path)
    }
}

/// `comparacao-clt-pj.xlsx`
pub fn default_file_name() -> String {
    format!("{DEFAULT_FILE_STEM}.xlsx")
}

fn monthly_sheet(result: &RegimeComparisonResult) -> Sheet {
    let clt = &result.clt;
    let pj = &result.pj;
    let mut sheet = Sheet::new(MONTHLY_SHEET);
    sheet.heading("Comparação CLT x PJ - Valores Mensais");
    sheet.blank();
    sheet.heading("Regime CLT");
    sheet.currency("Salário Bruto", clt.gross_salary);
    sheet.currency("INSS", clt.inss_contribution);
    sheet.currency("IRRF", clt.income_tax_withheld);
    sheet.currency("Salário Líquido", clt.net_salary);
    sheet.currency("Benefícios Mensais", clt.monthly_benefits_total);
    sheet.currency("13º Salário (Mensal)", clt.thirteenth_monthly);
    sheet.currency("Férias + 1/3 (Mensal)", clt.vacation_monthly);
    sheet.currency("FGTS", clt.fgts_monthly);
    sheet.currency("Participação nos Lucros (Mensal)", clt.profit_share_monthly);
    sheet.currency("Total CLT", clt.monthly_total);
    sheet.blank();
    sheet.heading("Regime PJ");
    sheet.currency("Valor Bruto", pj.gross_revenue);
    sheet.currency("Impostos", pj.tax_withheld);
    sheet.currency("Transporte", pj.transport_cost);
    sheet.currency("Plano de Saúde", pj.health_insurance_cost);
    sheet.currency("Alimentação", pj.meal_cost);
    sheet.currency("Contador", pj.accountant_cost);
    sheet.currency("Espaço de Trabalho", pj.workspace_cost);
    sheet.currency("Equipamentos (Mensal)", pj.equipment_cost_monthlyized);
    sheet.currency("Provisão Férias", pj.vacation_provision);
    sheet.currency("Provisão 13º", pj.thirteenth_provision);
    sheet.currency("Total Custos", pj.total_monthly_costs);
    sheet.currency("Valor Líquido PJ", pj.net_income);
    sheet.blank();
    sheet.heading("Comparação Final");
    sheet.currency(
        "Diferença Mensal (PJ - CLT)",
        round_cents(pj.net_income - clt.monthly_total),
    );
    sheet
}

fn annual_sheet(result: &RegimeComparisonResult) -> Sheet {
    let clt = &result.clt;
    let pj = &result.pj;
    let comparison = &result.comparison;
    let mut sheet = Sheet::new(ANNUAL_SHEET);
    sheet.heading("Comparação CLT x PJ - Valores Anuais");
    sheet.blank();
    sheet.heading("Regime CLT");
    sheet.currency("Salário Líquido Anual", round_cents(clt.net_salary * 12.0));
    sheet.currency(
        "Total Benefícios Anual",
        round_cents((clt.monthly_total - clt.net_salary) * 12.0),
    );
    sheet.currency("Total CLT Anual", clt.annual_total);
    sheet.blank();
    sheet.heading("Regime PJ");
    sheet.currency("Valor Bruto Anual", round_cents(pj.gross_revenue * 12.0));
    sheet.currency("Total Custos Anual", round_cents(pj.total_monthly_costs * 12.0));
    sheet.currency("Valor Líquido PJ Anual", pj.annual_total);
    sheet.blank();
    sheet.heading("Comparação Final");
    sheet.currency("Diferença Anual (PJ - CLT)", comparison.annual_difference);
    sheet.rows.push(vec![
        Cell::Text("Diferença Percentual".to_string()),
        Cell::Percent(comparison.percentage_difference),
    ]);
    let better = match comparison.better_regime {
        BetterRegime::Clt => "CLT",
        BetterRegime::Pj => "PJ",
        BetterRegime::Equivalent => "Equivalente",
    };
    sheet.text("Regime mais vantajoso", better);
    sheet
}

/// Format `value` as Brazilian reais, e.g. `R$ 1.234,56`.
pub fn format_brl(value: f64) -> String {
    let sign = if value < 0.0 && round_cents(value) != 0.0 { "-" } else { "" };
    format!("{sign}R$ {}", format_decimal(value.abs()))
}

/// Two decimals, `.` for thousands and `,` for decimals.
fn format_decimal(value: f64) -> String {
    let negative = value < 0.0;
    let cents = (value.abs() * 100.0).round() as u64;
    let digits = (cents / 100).to_string();
    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    let mut out = String::new();
    if negative && cents != 0 {
        out.push('-');
    }
    let _ = write!(out, "{grouped},{:02}", cents % 100);
    out
}
