// src/config/options.rs
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;

use super::consts::*;
use crate::error::{ExtractError, Result};

/// Everything the HSN run needs, fixed for the lifetime of one run.
#[derive(Clone, Debug, PartialEq)]
pub struct ExtractorConfig {
    pub base_url: String,
    pub auth_token: String,
    /// Sent verbatim as `simulationDate`, e.g. `20260101T00:00`.
    pub simulation_date: String,
    pub classification_type: i64,
    pub country_id: i64,
    pub request_delay: Duration,
    pub progress_path: PathBuf,
    pub output_dir: PathBuf,
    /// Roots to attempt this run. Completion is still judged against 01..=99.
    pub roots: RangeInclusive<u8>,
}

impl ExtractorConfig {
    pub fn new(
        base_url: impl Into<String>,
        auth_token: impl Into<String>,
        simulation_date: impl Into<String>,
        classification_type: i64,
        country_id: i64,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            auth_token: auth_token.into(),
            simulation_date: simulation_date.into(),
            classification_type,
            country_id,
            request_delay: Duration::from_millis(REQUEST_DELAY_MS),
            progress_path: PathBuf::from(DEFAULT_PROGRESS_FILE),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            roots: FIRST_ROOT..=LAST_ROOT,
        }
    }

    /// Build from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes `std::env::var`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ExtractError::Config(format!("{key} is not set")))
        };
        let integer = |key: &str| -> Result<i64> {
            let raw = required(key)?;
            raw.trim()
                .parse()
                .map_err(|_| ExtractError::Config(format!("{key} must be an integer, got {raw:?}")))
        };

        let mut config = Self::new(
            required("ZIMRA_API_BASE_URL")?,
            required("ZIMRA_API_AUTH")?,
            required("ZIMRA_SIMULATION_DATE")?,
            integer("ZIMRA_CLASSIFICATION_TYPE")?,
            integer("ZIMRA_COUNTRY_ID")?,
        );
        // Fail early on a date the output file name can't be built from.
        config.simulation_day()?;

        if let Some(raw) = lookup("REQUEST_DELAY") {
            let secs: f64 = raw.trim().parse().map_err(|_| {
                ExtractError::Config(format!("REQUEST_DELAY must be seconds, got {raw:?}"))
            })?;
            config.request_delay = Duration::try_from_secs_f64(secs).map_err(|_| {
                ExtractError::Config(format!("REQUEST_DELAY out of range: {raw:?}"))
            })?;
        }
        if let Some(p) = lookup("PROGRESS_FILE") {
            config.progress_path = PathBuf::from(p);
        }
        if let Some(p) = lookup("OUTPUT_DIR") {
            config.output_dir = PathBuf::from(p);
        }
        Ok(config)
    }

    /// Calendar day of the simulation date (first 8 chars, `YYYYMMDD`).
    pub fn simulation_day(&self) -> Result<NaiveDate> {
        let head = self.simulation_date.get(..8).unwrap_or(&self.simulation_date);
        NaiveDate::parse_from_str(head, "%Y%m%d").map_err(|e| {
            ExtractError::Config(format!(
                "simulation date {:?} is not YYYYMMDD...: {e}",
                self.simulation_date
            ))
        })
    }

    /// `<output_dir>/zimra_hsn_codes_<YYYY-MM-DD>.csv`
    pub fn output_path(&self) -> Result<PathBuf> {
        let day = self.simulation_day()?;
        Ok(self.output_dir.join(format!("{HSN_FILE_PREFIX}{}.csv", day.format("%Y-%m-%d"))))
    }
}

/// Inputs for the PAYE table batch.
#[derive(Clone, Debug, PartialEq)]
pub struct PayeConfig {
    pub raw_dir: PathBuf,
    pub processed_dir: PathBuf,
    pub aids_levy_percent: f64,
}

impl Default for PayeConfig {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from(DEFAULT_RAW_DIR),
            processed_dir: PathBuf::from(DEFAULT_PROCESSED_DIR),
            aids_levy_percent: AIDS_LEVY_PERCENT,
        }
    }
}

impl PayeConfig {
    pub fn output_path(&self, year: i32) -> PathBuf {
        self.processed_dir.join(format!("{PAYE_FILE_PREFIX}{year}.csv"))
    }
}

/// Log file path from `LOG_FILE`, or the default under `data/logs`.
pub fn log_file_from_env() -> PathBuf {
    log_file_from_lookup(|key| std::env::var(key).ok())
}

pub fn log_file_from_lookup<F>(lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    lookup("LOG_FILE")
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| Path::new(DEFAULT_LOG_FILE).to_path_buf())
}
