// Fund Domain Model

use crate::domain::error::{DomainError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Longest scheme code AMFI hands out is 6 digits; leave headroom
const MAX_SCHEME_CODE_LEN: usize = 10;

/// AMFI scheme code (digits only, e.g. "122639")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SchemeCode(String);

impl SchemeCode {
    pub fn new(code: impl Into<String>) -> Result<Self> {
        let code = code.into();
        let trimmed = code.trim();

        if trimmed.is_empty() {
            return Err(DomainError::InvalidSchemeCode(
                "scheme code cannot be empty".to_string(),
            ));
        }
        if trimmed.len() > MAX_SCHEME_CODE_LEN {
            return Err(DomainError::InvalidSchemeCode(format!(
                "scheme code too long: {}",
                trimmed
            )));
        }
        if !trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Err(DomainError::InvalidSchemeCode(format!(
                "scheme code must be numeric: {}",
                trimmed
            )));
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SchemeCode {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<SchemeCode> for String {
    fn from(code: SchemeCode) -> Self {
        code.0
    }
}

impl std::fmt::Display for SchemeCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A tracked mutual fund
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fund {
    pub name: String,
    pub code: SchemeCode,
}

impl Fund {
    pub fn new(name: impl Into<String>, code: SchemeCode) -> Self {
        Self {
            name: name.into(),
            code,
        }
    }
}

/// Ordered set of tracked funds (display order is catalog order)
#[derive(Debug, Clone, Serialize)]
pub struct FundCatalog {
    funds: Vec<Fund>,
}

impl FundCatalog {
    /// Build a catalog, rejecting blank names and duplicate names/codes
    pub fn new(funds: Vec<Fund>) -> Result<Self> {
        let mut names = HashSet::new();
        let mut codes = HashSet::new();

        for fund in &funds {
            if fund.name.trim().is_empty() {
                return Err(DomainError::ValidationError(format!(
                    "fund name cannot be empty (code {})",
                    fund.code
                )));
            }
            if !names.insert(fund.name.to_lowercase()) {
                return Err(DomainError::DuplicateFund(fund.name.clone()));
            }
            if !codes.insert(fund.code.clone()) {
                return Err(DomainError::DuplicateFund(fund.code.to_string()));
            }
        }

        Ok(Self { funds })
    }

    /// Exact name first, then case-insensitive name, then scheme code
    pub fn find(&self, key: &str) -> Option<&Fund> {
        let key = key.trim();
        self.funds
            .iter()
            .find(|f| f.name == key)
            .or_else(|| self.funds.iter().find(|f| f.name.eq_ignore_ascii_case(key)))
            .or_else(|| self.funds.iter().find(|f| f.code.as_str() == key))
    }

    /// Like `find` but returns a domain error
    pub fn require(&self, key: &str) -> Result<&Fund> {
        self.find(key)
            .ok_or_else(|| DomainError::FundNotFound(key.to_string()))
    }

    pub fn funds(&self) -> &[Fund] {
        &self.funds
    }

    pub fn len(&self) -> usize {
        self.funds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.funds.is_empty()
    }
}

impl Default for FundCatalog {
    fn default() -> Self {
        let defaults = [
            ("Parag Parikh Flexi Cap", "122639"),
            ("Motilal Oswal Midcap 30", "127042"),
            ("Quant Small Cap", "120828"),
        ];

        Self {
            funds: defaults
                .iter()
                .map(|(name, code)| Fund {
                    name: name.to_string(),
                    code: SchemeCode(code.to_string()),
                })
                .collect(),
        }
    }
}
