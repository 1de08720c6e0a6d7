//! A card's technical payload: nested sections of name/value/units properties.
//!
//! The payload arrives as a JSON string embedded in the card. A payload that fails
//! to parse is logged and treated as "no sections" so one bad card never stops a
//! corpus-wide extraction or inventory run.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::{Result, WegError};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    #[serde(default, alias = "Name", deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, alias = "Properties", deserialize_with = "null_as_empty")]
    pub properties: Vec<SectionProperty>,
    #[serde(default, alias = "Sections", deserialize_with = "null_as_empty")]
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionProperty {
    #[serde(default, alias = "Name", deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, alias = "Value", deserialize_with = "lenient_string")]
    pub value: Option<String>,
    #[serde(default, alias = "Units", deserialize_with = "lenient_string")]
    pub units: Option<String>,
}

impl Section {
    pub fn new(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    pub fn with_property(mut self, name: &str, value: &str, units: &str) -> Self {
        self.properties.push(SectionProperty {
            name: Some(name.to_string()),
            value: Some(value.to_string()),
            units: Some(units.to_string()),
        });
        self
    }

    pub fn with_section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    /// The name exactly as delivered, `""` when missing.
    pub fn raw_name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }
}

/// Parses a raw sections payload, failing on malformed JSON.
///
/// A missing or blank payload is not an error: it simply has no sections.
pub fn try_parse_sections(raw: Option<&str>) -> Result<Vec<Section>> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(Vec::new());
    };
    let parsed: Option<Vec<Section>> =
        serde_json::from_str(raw).map_err(|e| WegError::MalformedInput {
            what: "sections payload",
            details: e.to_string(),
        })?;
    Ok(parsed.unwrap_or_default())
}

/// Parses a raw sections payload; malformed input yields no sections.
pub fn parse_sections(raw: Option<&str>) -> Vec<Section> {
    try_parse_sections(raw).unwrap_or_else(|err| {
        warn!(error = %err, "treating malformed sections payload as empty");
        Vec::new()
    })
}

/// Accepts strings, numbers and booleans; anything else becomes `None`.
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
