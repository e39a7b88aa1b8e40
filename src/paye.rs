// src/paye.rs
//! PAYE tax tables from the published PDFs.
//!
//! Only the text layer is used: each band reads
//! `from <n> to <n> multiply by <r>% Deduct <n>` somewhere after its
//! frequency heading. Layout is not interpreted.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::Datelike;
use regex::Regex;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::PayeConfig;
use crate::error::{ExtractError, Result};
use crate::file::{ensure_directory, write_table};

static BAND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)from\s+([\d,\.]+)?\s*(?:to\s+([\d,\.]+))?\s*multiply\s+by\s+(\d+)%\s*Deduct\s+([\d,\.\-]+)?",
    )
    .unwrap()
});
static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:DAILY|WEEKLY|FORTNIGHTLY|MONTHLY|ANNUAL)\b").unwrap());
static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"20\d{2}").unwrap());
static NON_NUMERIC_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\d\.]").unwrap());

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Currency {
    #[serde(rename = "USD")]
    Usd,
    #[serde(rename = "ZWG")]
    Zwg,
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

impl Currency {
    /// Taken from the file name; the documents don't state it reliably.
    pub fn from_path(path: &Path) -> Self {
        let name = path.to_string_lossy();
        if name.contains("USD") {
            Currency::Usd
        } else if name.contains("ZWG") {
            Currency::Zwg
        } else {
            Currency::Unknown
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Frequency {
    Daily,
    Weekly,
    Fortnightly,
    Monthly,
    Annual,
}

impl Frequency {
    pub const ALL: [Frequency; 5] = [
        Frequency::Daily,
        Frequency::Weekly,
        Frequency::Fortnightly,
        Frequency::Monthly,
        Frequency::Annual,
    ];

    fn heading(self) -> &'static str {
        match self {
            Frequency::Daily => "DAILY",
            Frequency::Weekly => "WEEKLY",
            Frequency::Fortnightly => "FORTNIGHTLY",
            Frequency::Monthly => "MONTHLY",
            Frequency::Annual => "ANNUAL",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Frequency::Daily => "Daily",
            Frequency::Weekly => "Weekly",
            Frequency::Fortnightly => "Fortnightly",
            Frequency::Monthly => "Monthly",
            Frequency::Annual => "Annual",
        };
        f.write_str(s)
    }
}

impl Serialize for Frequency {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

/// One row of the output table. Field order is the CSV column order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TaxBand {
    pub currency: Currency,
    pub frequency: Frequency,
    pub year: i32,
    pub month_from: u32,
    pub month_to: u32,
    pub income_from: Option<f64>,
    pub income_to: Option<f64>,
    pub rate_percent: f64,
    pub deduct_amount: f64,
    pub aids_levy_percent: f64,
}

/// `"1,234.50"` → 1234.5. Anything that isn't a number after dropping
/// commas and stray characters is `None`.
pub fn clean_number(value: Option<&str>) -> Option<f64> {
    let value = value?.replace(',', "");
    let value = NON_NUMERIC_RE.replace_all(value.trim(), "");
    if value.is_empty() || value == "." {
        return None;
    }
    value.parse().ok()
}

/// Text after the first heading for `freq`, up to the next frequency
/// heading of any kind (or the end).
fn section_for(text: &str, freq: Frequency) -> Option<&str> {
    let mut headings = HEADING_RE.find_iter(text);
    let start = headings
        .by_ref()
        .find(|m| m.as_str().eq_ignore_ascii_case(freq.heading()))?
        .end();
    let end = headings.next().map_or(text.len(), |m| m.start());
    Some(&text[start..end])
}

/// Parse every band out of one document's text.
pub fn parse_bands(text: &str, currency: Currency, fallback_year: i32, aids_levy_percent: f64) -> Vec<TaxBand> {
    let year = YEAR_RE
        .find(text)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(fallback_year);

    let mut bands = Vec::new();
    for freq in Frequency::ALL {
        let Some(section) = section_for(text, freq) else { continue };
        info!("Extracting frequency: {}", freq.heading());

        for caps in BAND_RE.captures_iter(section) {
            let Some(rate_percent) = caps.get(3).and_then(|m| m.as_str().parse().ok()) else {
                continue;
            };
            bands.push(TaxBand {
                currency,
                frequency: freq,
                year,
                month_from: 1,
                month_to: 12,
                income_from: clean_number(caps.get(1).map(|m| m.as_str())),
                income_to: clean_number(caps.get(2).map(|m| m.as_str())),
                rate_percent,
                deduct_amount: clean_number(caps.get(4).map(|m| m.as_str())).unwrap_or(0.0),
                aids_levy_percent,
            });
        }
    }
    bands
}

/// Bands from one PDF file.
pub fn extract_from_pdf(path: &Path, aids_levy_percent: f64) -> Result<Vec<TaxBand>> {
    info!("Processing PDF: {}", path.display());
    let text = pdf_extract::extract_text(path)
        .map_err(|e| ExtractError::Pdf { path: path.to_path_buf(), reason: e.to_string() })?;
    let fallback_year = chrono::Local::now().year();
    Ok(parse_bands(&text, Currency::from_path(path), fallback_year, aids_levy_percent))
}

/// Order used in the output: currency, frequency, then lower bound
/// (open-ended lower bounds last).
fn band_order(a: &TaxBand, b: &TaxBand) -> Ordering {
    a.currency
        .cmp(&b.currency)
        .then_with(|| a.frequency.cmp(&b.frequency))
        .then_with(|| match (a.income_from, b.income_from) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
}

/// Write one table per year; returns the files written.
pub fn write_tables(config: &PayeConfig, mut bands: Vec<TaxBand>) -> Result<Vec<PathBuf>> {
    bands.sort_by(band_order);

    let mut by_year: BTreeMap<i32, Vec<TaxBand>> = BTreeMap::new();
    for band in bands {
        by_year.entry(band.year).or_default().push(band);
    }

    ensure_directory(&config.processed_dir)?;
    let mut written = Vec::with_capacity(by_year.len());
    for (year, rows) in by_year {
        let path = config.output_path(year);
        write_table(&path, &rows)?;
        info!("Extraction complete. Saved to {}", path.display());
        written.push(path);
    }
    Ok(written)
}

fn pdf_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_pdf = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
        if path.is_file() && is_pdf {
            out.push(path);
        }
    }
    out.sort();
    Ok(out)
}

/// Every PDF in `raw_dir` → tables under `processed_dir`.
pub fn run(config: &PayeConfig) -> Result<Vec<PathBuf>> {
    info!("Starting PAYE tax table extraction");

    let mut bands = Vec::new();
    for path in pdf_files(&config.raw_dir)? {
        bands.extend(extract_from_pdf(&path, config.aids_levy_percent)?);
    }

    if bands.is_empty() {
        warn!("No tax data extracted");
        return Ok(Vec::new());
    }
    write_tables(config, bands)
}
