//! Application settings: a config file plus `WEG__`-prefixed environment overrides.
//!
//! ```toml
//! output_folder = "output"
//!
//! [odin]
//! graphql_endpoint = "https://odin.tradoc.army.mil/api/v1/graphql"
//!
//! [[weg.tiers]]
//! key = "tier-1"
//! label = "Tier 1"
//! from = "2000-01-01"
//! to = "2010-01-01"
//! ```
//!
//! `WEG__ODIN__GRAPHQL_ENDPOINT=...` overrides `odin.graphql_endpoint`. A `.env`
//! file in the working directory is loaded first.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use dotenvy::dotenv;
use serde::Deserialize;

use crate::error::{Result, WegError};
use crate::query::TierDefinition;

pub const ENV_PREFIX: &str = "WEG";
pub const DEFAULT_SETTINGS_FILE: &str = "appsettings";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OdinSettings {
    pub force_structure_api: Option<String>,
    pub dis_enumeration_api: Option<String>,
    pub graphql_endpoint: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WegSettings {
    #[serde(default)]
    pub tiers: Vec<TierDefinition>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppSettings {
    #[serde(default)]
    pub odin: OdinSettings,
    #[serde(default)]
    pub weg: WegSettings,
    pub output_folder: Option<PathBuf>,
    /// Daily rolling log files go here when set; otherwise logs go to stderr.
    pub log_dir: Option<PathBuf>,
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX).separator("__")
}

impl AppSettings {
    /// Loads `.env`, then `path` (any format the config crate recognises by
    /// extension; optional), then environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        dotenv().ok();
        let name = path.as_ref().to_string_lossy();
        Self::from_builder(
            Config::builder()
                .add_source(File::with_name(&name).required(false))
                .add_source(environment()),
        )
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        Ok(builder.build()?.try_deserialize()?)
    }

    /// Checks everything the pipeline needs before any work starts.
    pub fn validate(&self) -> Result<()> {
        if self
            .odin
            .graphql_endpoint
            .as_deref()
            .map_or(true, |e| e.trim().is_empty())
        {
            return Err(WegError::Validation(
                "odin.graphql_endpoint is not configured".to_string(),
            ));
        }
        if self
            .output_folder
            .as_deref()
            .map_or(true, |p| p.as_os_str().is_empty())
        {
            return Err(WegError::Validation(
                "output_folder is not configured".to_string(),
            ));
        }

        let mut keys = BTreeSet::new();
        for tier in &self.weg.tiers {
            if tier.key.trim().is_empty() {
                return Err(WegError::Validation("tier with a blank key".to_string()));
            }
            if !keys.insert(tier.key.trim().to_lowercase()) {
                return Err(WegError::Validation(format!("duplicate tier key '{}'", tier.key)));
            }
            if tier.from > tier.to {
                return Err(WegError::Validation(format!(
                    "tier '{}' starts after it ends",
                    tier.key
                )));
            }
        }
        Ok(())
    }

    /// Output folder, or `fallback` when none is configured.
    pub fn output_folder_or(&self, fallback: impl Into<PathBuf>) -> PathBuf {
        self.output_folder.clone().unwrap_or_else(|| fallback.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use config::{FileFormat, Map};

    const SETTINGS: &str = r#"
        output_folder = "out"

        [odin]
        graphql_endpoint = "https://example.test/graphql"
        force_structure_api = "https://example.test/fs"

        [[weg.tiers]]
        key = "tier-1"
        label = "Tier 1"
        from = "2000-01-01"
        to = "2010-01-01T00:00:00Z"

        [[weg.tiers]]
        key = "tier-2"
        from = "2010-01-01T00:00:00"
        to = "2020-01-01"
    "#;

    fn parse(toml: &str, env: &[(&str, &str)]) -> Result<AppSettings> {
        let vars: Map<String, String> = env
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppSettings::from_builder(
            Config::builder()
                .add_source(File::from_str(toml, FileFormat::Toml))
                .add_source(environment().source(Some(vars))),
        )
    }

    #[test]
    fn reads_file_sections_and_tiers() {
        let settings = parse(SETTINGS, &[]).unwrap();
        settings.validate().unwrap();
        assert_eq!(settings.output_folder, Some(PathBuf::from("out")));
        assert_eq!(settings.odin.dis_enumeration_api, None);
        assert_eq!(settings.weg.tiers.len(), 2);
        assert_eq!(
            settings.weg.tiers[0].from,
            Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(settings.weg.tiers[1].label, "");
    }

    #[test]
    fn environment_overrides_file() {
        let settings = parse(
            SETTINGS,
            &[("WEG__ODIN__GRAPHQL_ENDPOINT", "https://override.test/graphql")],
        )
        .unwrap();
        assert_eq!(
            settings.odin.graphql_endpoint.as_deref(),
            Some("https://override.test/graphql")
        );
    }

    #[test]
    fn missing_endpoint_fails_validation() {
        let settings = parse("output_folder = \"out\"", &[]).unwrap();
        assert!(matches!(settings.validate(), Err(WegError::Validation(_))));
    }

    #[test]
    fn missing_output_folder_fails_validation() {
        let settings = parse("[odin]\ngraphql_endpoint = \"x\"", &[]).unwrap();
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("output_folder"));
        assert_eq!(settings.output_folder_or("fallback"), PathBuf::from("fallback"));
    }

    #[test]
    fn rejects_inverted_and_duplicate_tiers() {
        let base = "output_folder = \"out\"\n[odin]\ngraphql_endpoint = \"x\"\n";
        let inverted = format!(
            "{base}[[weg.tiers]]\nkey = \"a\"\nfrom = \"2020-01-01\"\nto = \"2000-01-01\"\n"
        );
        assert!(parse(&inverted, &[]).unwrap().validate().is_err());

        let duplicate = format!(
            "{base}[[weg.tiers]]\nkey = \"a\"\nfrom = \"2000-01-01\"\nto = \"2001-01-01\"\n\
             [[weg.tiers]]\nkey = \"A\"\nfrom = \"2000-01-01\"\nto = \"2001-01-01\"\n"
        );
        assert!(parse(&duplicate, &[]).unwrap().validate().is_err());
    }

    #[test]
    fn bad_tier_date_is_a_config_error() {
        let toml = "[[weg.tiers]]\nkey = \"a\"\nfrom = \"someday\"\nto = \"2001-01-01\"\n";
        assert!(matches!(parse(toml, &[]), Err(WegError::Config(_))));
    }
}
