// src/hsn/mod.rs
//! HSN classification data: root partitions, output rows and the
//! hierarchy walk used to enrich vague descriptions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::consts::{FIRST_ROOT, LAST_ROOT};

pub mod hierarchy;

pub use hierarchy::{enrich, find_meaningful_parent, ParentMap};

/// Top-level partition of the classification, `01`..=`99`.
/// One API call fetches one root.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RootCode(u8);

impl RootCode {
    pub fn new(n: u8) -> Option<Self> {
        (FIRST_ROOT..=LAST_ROOT).contains(&n).then_some(Self(n))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Every root, in request order.
    pub fn all() -> impl Iterator<Item = RootCode> {
        (FIRST_ROOT..=LAST_ROOT).map(RootCode)
    }

    pub fn count() -> usize {
        usize::from(LAST_ROOT - FIRST_ROOT) + 1
    }
}

impl fmt::Display for RootCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

impl FromStr for RootCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 2 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!("root code must be two digits, got {s:?}"));
        }
        s.parse::<u8>()
            .ok()
            .and_then(RootCode::new)
            .ok_or_else(|| format!("root code out of range: {s:?}"))
    }
}

impl TryFrom<String> for RootCode {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<RootCode> for String {
    fn from(r: RootCode) -> Self {
        r.to_string()
    }
}

/// One line of the HSN output table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRow {
    pub hsn_code: String,
    pub description: String,
}
