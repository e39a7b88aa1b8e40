// src/lib.rs
//! Extraction of ZIMRA reference data into CSV tables.
//!
//! - [`runner`]: resumable HSN code extraction, one API call per root code.
//! - [`paye`]: PAYE tax bands from the published PDFs.

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod hsn;

pub mod file;
pub mod log;
pub mod paye;
pub mod progress;
pub mod runner;
pub mod store;

pub use config::{ExtractorConfig, PayeConfig};
pub use error::ExtractError;
pub use runner::{RunController, RunSummary};
