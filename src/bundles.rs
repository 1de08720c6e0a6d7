//! Curated weapon-system bundles.
//!
//! A bundle is a named list of category *labels*. Labels are what users see and
//! stay stable; identifiers are looked up in the current tree at expansion time.

use std::fmt;
use std::str::FromStr;

use ahash::AHashSet;
use tracing::debug;

use crate::category::CategoryNode;
use crate::error::{Result, WegError};
use crate::resolver::resolve_identifier_by_label;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BundleKey {
    /// Rifles, machine guns, etc.
    DirectFire,
    /// Mortars and grenade launchers.
    IndirectFire,
    /// Rocket launchers, ATGMs, grenades.
    RocketsAndGrenades,
    /// DirectFire + IndirectFire + RocketsAndGrenades.
    AllInfantryWeapons,
}

impl BundleKey {
    pub const ALL: [BundleKey; 4] = [
        BundleKey::DirectFire,
        BundleKey::IndirectFire,
        BundleKey::RocketsAndGrenades,
        BundleKey::AllInfantryWeapons,
    ];

    /// Constituents of a composite bundle. Composites only ever reference plain
    /// bundles, so expansion is exactly one level deep.
    pub fn constituents(self) -> &'static [BundleKey] {
        match self {
            BundleKey::AllInfantryWeapons => &[
                BundleKey::DirectFire,
                BundleKey::IndirectFire,
                BundleKey::RocketsAndGrenades,
            ],
            BundleKey::DirectFire => &[BundleKey::DirectFire],
            BundleKey::IndirectFire => &[BundleKey::IndirectFire],
            BundleKey::RocketsAndGrenades => &[BundleKey::RocketsAndGrenades],
        }
    }

    /// Labels for a plain bundle; empty for the composite.
    pub fn labels(self) -> &'static [&'static str] {
        match self {
            BundleKey::DirectFire => &[
                "Rifles",
                "Machine Guns",
                "Flamethrowers",
                "Recoilless Guns",
                "Handguns",
                "Submachine Guns (SMG)",
                "Shotguns",
            ],
            BundleKey::IndirectFire => &["Mortars", "Grenade Launchers"],
            BundleKey::RocketsAndGrenades => &[
                "Rocket Launchers",
                "Anti-Tank Guided Missiles (ATGM)",
                "Grenades",
            ],
            BundleKey::AllInfantryWeapons => &[],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BundleKey::DirectFire => "direct-fire",
            BundleKey::IndirectFire => "indirect-fire",
            BundleKey::RocketsAndGrenades => "rockets-and-grenades",
            BundleKey::AllInfantryWeapons => "all-infantry-weapons",
        }
    }
}

impl fmt::Display for BundleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BundleKey {
    type Err = WegError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        BundleKey::ALL
            .into_iter()
            .find(|key| key.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| WegError::not_found("bundle", wanted))
    }
}

/// Expands `bundles` into category identifiers resolved under `domain`.
///
/// Identifiers are deduplicated case-insensitively and returned in first-seen
/// order. A single unresolvable label fails the whole expansion.
pub fn expand(domain: &CategoryNode, bundles: &[BundleKey]) -> Result<Vec<String>> {
    let mut seen = AHashSet::new();
    let mut identifiers = Vec::new();

    for &bundle in bundles {
        for &plain in bundle.constituents() {
            for label in plain.labels() {
                let identifier = resolve_identifier_by_label(domain, label)?;
                if seen.insert(identifier.to_lowercase()) {
                    identifiers.push(identifier);
                }
            }
        }
    }

    debug!(
        domain = %domain.display_name,
        bundles = ?bundles,
        resolved = identifiers.len(),
        "expanded bundles"
    );
    Ok(identifiers)
}
