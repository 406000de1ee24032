//! Country filters and the scope token written into exported file names.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Optional allow-list of country names requested for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryFilter {
    countries: Vec<String>,
}

impl CountryFilter {
    pub fn new<I, S>(countries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let countries = countries
            .into_iter()
            .map(Into::into)
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();
        Self { countries }
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }

    pub fn countries(&self) -> &[String] {
        &self.countries
    }

    /// Scope token for file names: `all`, or the names joined by `__` with
    /// spaces turned into `_` and `*` into `all`.
    pub fn scope_token(&self) -> String {
        if self.countries.is_empty() {
            return ALL_SCOPE.to_string();
        }
        self.countries
            .join("__")
            .replace(' ', "_")
            .replace('*', ALL_SCOPE)
    }

    /// Translate the requested names through an alias map.
    pub fn translated(&self, aliases: &CountryAliases) -> Self {
        Self {
            countries: self
                .countries
                .iter()
                .map(|name| aliases.resolve(name).to_string())
                .collect(),
        }
    }
}

/// Scope token used when no country filter was supplied.
pub const ALL_SCOPE: &str = "all";

/// Maps case-report country names onto reference-table names.
///
/// The case reports say `US` where the ISO table says `United States`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryAliases {
    aliases: BTreeMap<String, String>,
}

impl CountryAliases {
    pub fn empty() -> Self {
        Self {
            aliases: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, from: impl Into<String>, to: impl Into<String>) {
        self.aliases.insert(from.into(), to.into());
    }

    /// Parse a `FROM=TO` pair as given on the command line.
    pub fn parse_pair(raw: &str) -> Result<(String, String)> {
        let (from, to) = raw
            .split_once('=')
            .ok_or_else(|| ModelError::InvalidAlias(raw.to_string()))?;
        let (from, to) = (from.trim(), to.trim());
        if from.is_empty() || to.is_empty() {
            return Err(ModelError::InvalidAlias(raw.to_string()));
        }
        Ok((from.to_string(), to.to_string()))
    }

    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map_or(name, String::as_str)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

impl Default for CountryAliases {
    fn default() -> Self {
        let mut aliases = Self::empty();
        aliases.insert("US", "United States");
        aliases
    }
}
