// src/config/consts.rs

// Remote API
pub const REQUEST_TIMEOUT_SECS: u64 = 30;
pub const REQUEST_DELAY_MS: u64 = 500; // be polite

// Classification roots
pub const FIRST_ROOT: u8 = 1;
pub const LAST_ROOT: u8 = 99;

// HSN output
pub const DEFAULT_OUTPUT_DIR: &str = "data";
pub const DEFAULT_PROGRESS_FILE: &str = "progress.json";
pub const HSN_FILE_PREFIX: &str = "zimra_hsn_codes_";
pub const HSN_HEADERS: [&str; 2] = ["hsn_code", "description"];
pub const ENRICH_SEPARATOR: &str = " \u{2013} ";

// PAYE tables
pub const DEFAULT_RAW_DIR: &str = "data/raw";
pub const DEFAULT_PROCESSED_DIR: &str = "data/processed";
pub const PAYE_FILE_PREFIX: &str = "zimra_paye_tables_";
pub const AIDS_LEVY_PERCENT: f64 = 3.0;

// Logging
pub const DEFAULT_LOG_FILE: &str = "data/logs/zimra_extractors.log";
