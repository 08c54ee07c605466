//! Server configuration.
//!
//! Settings come from environment variables, with a `.env` file in the
//! working directory honoured when present:
//!
//! - `REGIME_BIND_ADDR`: address to listen on (default `127.0.0.1:3000`)
//! - `REGIME_TAX_TABLE_DIR`: directory of extra tax table JSON files
//!   (default `tax_tables`, relative to the working directory; run the
//!   binary from `regime_engine/` or set this to pick up the shipped
//!   tables)
//! - `REGIME_TAX_YEAR`: tax year used when a request names none
//!   (default `2024`)

use crate::tax::DEFAULT_TAX_YEAR;
use anyhow::{Context, Result};
use std::path::PathBuf;

pub const BIND_ADDR_VAR: &str = "REGIME_BIND_ADDR";
pub const TAX_TABLE_DIR_VAR: &str = "REGIME_TAX_TABLE_DIR";
pub const TAX_YEAR_VAR: &str = "REGIME_TAX_YEAR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub tax_table_dir: PathBuf,
    pub tax_year: u16,
}

impl ServerConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        // A missing .env file is the normal case.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bind_addr = lookup(BIND_ADDR_VAR).unwrap_or_else(|| "127.0.0.1:3000".to_string());
        let tax_table_dir =
            PathBuf::from(lookup(TAX_TABLE_DIR_VAR).unwrap_or_else(|| "tax_tables".to_string()));
        let tax_year = match lookup(TAX_YEAR_VAR) {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("{TAX_YEAR_VAR} must be a year, got {raw:?}"))?,
            None => DEFAULT_TAX_YEAR,
        };
        Ok(ServerConfig {
            bind_addr,
            tax_table_dir,
            tax_year,
        })
    }
}
