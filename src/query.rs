//! Compiles filter selections into a literal Lucene query string.
//!
//! Clause order is fixed (record type, domain, weapon-system types, origin, tier
//! range) and multi-valued selections are kept in ordered sets, so the same
//! criteria and tier catalog always produce a byte-identical query.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

use crate::category::DropdownOption;
use crate::error::{Result, WegError};

const RANGE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// The user's dropdown selections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// Example: `land-f5e1db`
    pub domain_identifier: Option<String>,
    /// Example: `infantry-weapons-6965ab`
    #[serde(default)]
    pub weapon_system_type_identifiers: BTreeSet<String>,
    /// Origin filters come from the card's `origin` relationship, not the subnav.
    #[serde(default)]
    pub proliferation_identifiers: BTreeSet<String>,
    #[serde(default)]
    pub tier_keys: BTreeSet<String>,
}

impl FilterCriteria {
    pub fn with_domain(mut self, identifier: impl Into<String>) -> Self {
        self.domain_identifier = Some(identifier.into());
        self
    }

    pub fn with_weapon_system_types<I, S>(mut self, identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.weapon_system_type_identifiers
            .extend(identifiers.into_iter().map(Into::into));
        self
    }

    pub fn with_proliferation<I, S>(mut self, identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.proliferation_identifiers
            .extend(identifiers.into_iter().map(Into::into));
        self
    }

    pub fn with_tiers<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tier_keys.extend(keys.into_iter().map(Into::into));
        self
    }
}

/// A configured, named introduction-date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierDefinition {
    pub key: String,
    #[serde(default)]
    pub label: String,
    #[serde(deserialize_with = "deserialize_utc")]
    pub from: DateTime<Utc>,
    #[serde(deserialize_with = "deserialize_utc")]
    pub to: DateTime<Utc>,
}

/// Tiers as dropdown options (label → key), sorted by label.
pub fn tier_options(tiers: &[TierDefinition]) -> Vec<DropdownOption> {
    let mut options: Vec<DropdownOption> = tiers
        .iter()
        .map(|t| DropdownOption {
            label: t.label.clone(),
            value: t.key.clone(),
        })
        .collect();
    options.sort_by(|a, b| a.label.cmp(&b.label).then_with(|| a.value.cmp(&b.value)));
    options
}

/// Parses an RFC 3339 timestamp, a naive `YYYY-MM-DDTHH:MM:SS` (taken as UTC) or a
/// plain `YYYY-MM-DD` date (midnight UTC).
pub fn parse_utc(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, RANGE_FORMAT) {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn deserialize_utc<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_utc(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid tier date '{raw}'")))
}

/// Lucene field names the builder targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryFields {
    pub content_type: String,
    pub record_type: String,
    pub category: String,
    pub origin: String,
    pub introduction_date: String,
}

impl Default for QueryFields {
    fn default() -> Self {
        Self {
            content_type: "contentType".to_string(),
            record_type: "WegCard".to_string(),
            category: "categories".to_string(),
            origin: "WegCard.origin".to_string(),
            introduction_date: "WegCard.dateOfIntroduction".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    fields: QueryFields,
}

impl QueryBuilder {
    pub fn new(fields: QueryFields) -> Self {
        Self { fields }
    }

    /// Builds the query for `criteria`, resolving tier keys against `tiers`.
    pub fn build(&self, criteria: &FilterCriteria, tiers: &[TierDefinition]) -> Result<String> {
        let f = &self.fields;
        let mut clauses = vec![format!(
            "+{}:{}",
            f.content_type,
            escape_term(&f.record_type)
        )];

        if let Some(domain) = criteria
            .domain_identifier
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
        {
            clauses.push(format!("+{}:{}", f.category, escape_term(domain)));
        }

        clauses.extend(or_group(&f.category, &criteria.weapon_system_type_identifiers));
        clauses.extend(or_group(&f.origin, &criteria.proliferation_identifiers));

        if let Some((from, to)) = resolve_tier_range(&criteria.tier_keys, tiers)? {
            clauses.push(format!(
                "+{}:[ {} TO {} ]",
                f.introduction_date,
                from.format(RANGE_FORMAT),
                to.format(RANGE_FORMAT)
            ));
        }

        let query = clauses.join(" ");
        debug!(%query, "built query");
        Ok(query)
    }
}

/// [`QueryBuilder::build`] with the default field names.
pub fn build_query(criteria: &FilterCriteria, tiers: &[TierDefinition]) -> Result<String> {
    QueryBuilder::default().build(criteria, tiers)
}

/// `+(field:v1 field:v2 ...)`, or nothing when no non-blank value remains.
fn or_group(field: &str, values: &BTreeSet<String>) -> Option<String> {
    let terms: BTreeSet<String> = values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(|v| format!("{field}:{}", escape_term(v)))
        .collect();

    if terms.is_empty() {
        return None;
    }
    Some(format!(
        "+({})",
        terms.into_iter().collect::<Vec<_>>().join(" ")
    ))
}

/// Union of every requested tier: earliest `from`, latest `to`.
///
/// `Ok(None)` when no (non-blank) key was requested. Requesting keys of which none
/// exist in the catalog is an error rather than an unbounded range.
pub fn resolve_tier_range(
    requested: &BTreeSet<String>,
    tiers: &[TierDefinition],
) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>> {
    let wanted: Vec<&str> = requested
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .collect();
    if wanted.is_empty() {
        return Ok(None);
    }

    let matched: Vec<&TierDefinition> = tiers
        .iter()
        .filter(|t| wanted.iter().any(|k| t.key.trim().eq_ignore_ascii_case(k)))
        .collect();

    let (Some(from), Some(to)) = (
        matched.iter().map(|t| t.from).min(),
        matched.iter().map(|t| t.to).max(),
    ) else {
        return Err(WegError::not_found("tier", wanted.join(", ")));
    };

    let unknown: Vec<&str> = wanted
        .iter()
        .copied()
        .filter(|k| !matched.iter().any(|t| t.key.trim().eq_ignore_ascii_case(k)))
        .collect();
    if !unknown.is_empty() {
        warn!(?unknown, "ignoring unknown tier keys");
    }

    Ok(Some((from, to)))
}

/// Escapes backslashes and double quotes so a value cannot break out of its term.
pub fn escape_term(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Inverse of [`escape_term`].
pub fn unescape_term(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(next) => out.push(next),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}
