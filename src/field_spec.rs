//! Per record-type output columns and their `"Section::Property"` fallback keys.
//!
//! Property names on cards are human-authored and vary between assets, so each
//! column lists every key known to carry the concept, best first.

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, WegError};

type Fallbacks = &'static [&'static str];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub record_type: RecordType,
    /// Output column order.
    pub columns: &'static [&'static str],
    pub fields: &'static [(&'static str, Fallbacks)],
}

impl FieldSpec {
    /// Fallback keys for `column` (case-insensitive); empty when the column has
    /// no source in the section tree (e.g. `ImageUrl`).
    pub fn fallbacks(&self, column: &str) -> Fallbacks {
        self.fields
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(column))
            .map(|(_, keys)| *keys)
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    DirectFire,
    IndirectFire,
    RocketsAndGrenades,
    Tanks,
    InfantryVehicles,
    AirDefense,
    Aircraft,
    Artillery,
}

impl RecordType {
    pub const ALL: [RecordType; 8] = [
        RecordType::DirectFire,
        RecordType::IndirectFire,
        RecordType::RocketsAndGrenades,
        RecordType::Tanks,
        RecordType::InfantryVehicles,
        RecordType::AirDefense,
        RecordType::Aircraft,
        RecordType::Artillery,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RecordType::DirectFire => "direct-fire",
            RecordType::IndirectFire => "indirect-fire",
            RecordType::RocketsAndGrenades => "rockets-and-grenades",
            RecordType::Tanks => "tanks",
            RecordType::InfantryVehicles => "infantry-vehicles",
            RecordType::AirDefense => "air-defense",
            RecordType::Aircraft => "aircraft",
            RecordType::Artillery => "artillery",
        }
    }

    pub fn spec(self) -> &'static FieldSpec {
        match self {
            RecordType::DirectFire => &DIRECT_FIRE,
            RecordType::IndirectFire => &INDIRECT_FIRE,
            RecordType::RocketsAndGrenades => &ROCKETS_AND_GRENADES,
            RecordType::Tanks => &TANKS,
            RecordType::InfantryVehicles => &INFANTRY_VEHICLES,
            RecordType::AirDefense => &AIR_DEFENSE,
            RecordType::Aircraft => &AIRCRAFT,
            RecordType::Artillery => &ARTILLERY,
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = WegError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        RecordType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| WegError::not_found("record type", wanted))
    }
}

// ─────────────────────────────────────────────────────────────
//  Specs
// ─────────────────────────────────────────────────────────────

// Rifles and machine guns.
pub static DIRECT_FIRE: FieldSpec = FieldSpec {
    record_type: RecordType::DirectFire,
    columns: &["Name", "Type", "ImageUrl", "Caliber", "RateOfFire", "MaxRange"],
    fields: &[
        ("Name", &["System::Name"]),
        ("Type", &["System::Type", "System::Primary Function / Type"]),
        (
            "Caliber",
            &[
                "System::Caliber",
                "Ammunition::Caliber",
                "Ammunition (Option 1)::Caliber",
                "Ammunition (Option 2)::Caliber",
                "Ammunition (Option 3)::Caliber",
            ],
        ),
        (
            "RateOfFire",
            &[
                "System::Rate of Fire",
                "System::Cyclic Rate of Fire",
                "System::Rate of Fire, Practical",
            ],
        ),
        (
            "MaxRange",
            &[
                "System::Maximum Firing Range",
                "System::Maximum Range",
                "System::Maximum Effective Firing Range",
                "System::Effective Firing Range",
                "System::Effective Firing Range, Optical Sight",
                "System::Effective Firing Range, Iron Sight",
            ],
        ),
    ],
};

pub static INDIRECT_FIRE: FieldSpec = FieldSpec {
    record_type: RecordType::IndirectFire,
    columns: &[
        "Name",
        "Type",
        "ImageUrl",
        "Caliber",
        "RateOfFire",
        "EffectiveRange",
        "MaxRange",
        "KillRadius",
        "ArmorPenetration",
    ],
    fields: &[
        ("Name", &["System::Name"]),
        ("Type", &["System::Type"]),
        (
            "Caliber",
            &["System::Caliber", "Mortar::Caliber", "Ammunition::Caliber"],
        ),
        (
            "RateOfFire",
            &["System::Rate of Fire", "Mortar::Rate of Fire, Burst"],
        ),
        (
            "EffectiveRange",
            &[
                "System::Maximum Effective Range",
                "System::Maximum Effective Firing Range",
                "System::Effective Firing Range",
                "System::Minimum Effective Range",
            ],
        ),
        (
            "MaxRange",
            &[
                "System::Maximum Firing Range",
                "System::Maximum Range",
                "Mortar::Range",
            ],
        ),
        // Rare; expect blanks.
        ("KillRadius", &["System::Killing Radius"]),
        ("ArmorPenetration", &["Ammunition::Armor Penetration"]),
    ],
};

pub static ROCKETS_AND_GRENADES: FieldSpec = FieldSpec {
    record_type: RecordType::RocketsAndGrenades,
    columns: &[
        "Name",
        "Type",
        "ImageUrl",
        "Caliber",
        "MaxRange",
        "ArmorPenetration",
        "Warhead",
        "GuidanceSystem",
    ],
    fields: &[
        ("Name", &["System::Name"]),
        ("Type", &["System::Type", "System::Primary Function / Type"]),
        (
            "Caliber",
            &[
                "System::Caliber",
                "Dimensions::Caliber",
                "Ammunition::Caliber",
            ],
        ),
        (
            "MaxRange",
            &[
                // Misspelling observed on live cards.
                "System::Maximum FIring Range",
                "System::Maximum Firing Range",
                "System::Maximum Range",
                "System::Operational Range",
                "Missile::Range of Fire",
                "Missile::Effective Range",
                "System::Effective Firing Range",
            ],
        ),
        (
            "ArmorPenetration",
            &[
                "System::Armor Penetration",
                "Missile::Armor Penetration",
                "Ammunition::Penetration",
            ],
        ),
        (
            "Warhead",
            &[
                "System::Warhead",
                "Missile::Warhead Type",
                "Ammunition::Warhead",
                "Missile::Warhead Weight",
                "Dimensions::Warhead Weight",
            ],
        ),
        (
            "GuidanceSystem",
            &[
                "System::Guidance System",
                "Missile::Guidance System",
                "Fire Control::Guidance System",
            ],
        ),
    ],
};

pub static TANKS: FieldSpec = FieldSpec {
    record_type: RecordType::Tanks,
    columns: &[
        "Name",
        "Type",
        "ImageUrl",
        "Crew",
        "MaxSpeed",
        "VehicleRange",
        "Armor",
        "Caliber",
        "RateOfFire",
        "MaxRange",
    ],
    fields: &[
        ("Name", &["System::Name"]),
        ("Type", &["System::Type"]),
        ("Crew", &["System::Crew"]),
        (
            "MaxSpeed",
            &["Automotive::Speed, Maximum Road", "Automotive::Maximum Speed"],
        ),
        (
            "VehicleRange",
            &["Automotive::Cruising Range", "Automotive::Range"],
        ),
        (
            "Armor",
            &[
                "Protection::Hull Armor",
                "Protection::Turret Armor",
                "Protection::Armor",
            ],
        ),
        ("Caliber", &["System::Caliber", "Ammunition::Caliber"]),
        (
            "RateOfFire",
            &[
                "System::Max Rate of Fire",
                "System::Maximum Rate of Fire",
                "System::Sustain Rate of Fire",
                "System::Rate of Fire",
            ],
        ),
        (
            "MaxRange",
            &[
                "System::Maximum Firing Range",
                "System::Effective Firing Range",
                "System::Maximum Effective Range",
            ],
        ),
    ],
};

pub static INFANTRY_VEHICLES: FieldSpec = FieldSpec {
    record_type: RecordType::InfantryVehicles,
    columns: &[
        "Name",
        "Type",
        "ImageUrl",
        "Crew",
        "MaxSpeed",
        "Range",
        "Armor",
        "Caliber",
        "RateOfFire",
        "MaxRange",
        "ArmorPenetration",
    ],
    fields: &[
        ("Name", &["System::Name"]),
        ("Type", &["System::Type"]),
        ("Crew", &["System::Crew"]),
        (
            "MaxSpeed",
            &[
                "Automotive::Speed, Maximum Road",
                "Automotive::Maximum Speed",
                "Automotive::Speed, Maximum",
            ],
        ),
        (
            "Range",
            &[
                "Automotive::Maximum Range",
                "Automotive::Cruising Range",
                "Automotive::Range",
                "Automotive::Endurance",
            ],
        ),
        (
            "Armor",
            &[
                "Protection::Hull Armor",
                "Protection::Turret Armor",
                "Protection::Armor",
            ],
        ),
        ("Caliber", &["System::Caliber", "Ammunition::Caliber"]),
        (
            "RateOfFire",
            &["System::Max Rate of Fire", "System::Rate of Fire"],
        ),
        (
            "MaxRange",
            &[
                "System::Maximum Firing Range",
                "System::Effective Firing Range",
                "System::Maximum Effective Range",
            ],
        ),
        ("ArmorPenetration", &["Ammunition::Armor Penetration"]),
    ],
};

pub static AIR_DEFENSE: FieldSpec = FieldSpec {
    record_type: RecordType::AirDefense,
    columns: &[
        "Name",
        "Type",
        "ImageUrl",
        "Crew",
        "MissileName",
        "GuidanceSystem",
        "Warhead",
        "EffectiveRange",
        "MaxRange",
        "MaxAltitude",
        "ReactionTime",
        "EmplacementTime",
        "DisplacementTime",
        "VehicleRange",
    ],
    fields: &[
        ("Name", &["System::Name"]),
        ("Type", &["System::Type"]),
        ("Crew", &["System::Crew"]),
        ("MissileName", &["Missile::Name"]),
        (
            "GuidanceSystem",
            &[
                "Missile::Guidance System",
                "System::Guidance System",
                "Fire Control System::Computerized FCS",
            ],
        ),
        (
            "Warhead",
            &[
                "Missile::Warhead Type",
                "Missile::Warhead Weight",
                "System::Note",
            ],
        ),
        ("EffectiveRange", &["System::Maximum Effective Range"]),
        (
            "MaxRange",
            &[
                "Missile::Operational Range",
                "System::Maximum Range",
                // Last resort so the column is not blank.
                "System::Minimum Range",
            ],
        ),
        (
            "MaxAltitude",
            &["Missile::Maximum Altitude", "System::Maximum Altitude"],
        ),
        ("ReactionTime", &["System::Reaction Time"]),
        ("EmplacementTime", &["System::Emplacement Time"]),
        ("DisplacementTime", &["System::Displacement Time"]),
        (
            "VehicleRange",
            &["Automotive::Maximum Range", "Automotive::Cruising Range"],
        ),
    ],
};

pub static AIRCRAFT: FieldSpec = FieldSpec {
    record_type: RecordType::Aircraft,
    columns: &[
        "Name",
        "Type",
        "ImageUrl",
        "MaxSpeed",
        "CruiseSpeed",
        "Endurance",
        "Ceiling",
        "Range",
        "Crew",
    ],
    fields: &[
        ("Name", &["System::Name"]),
        ("Type", &["System::Type"]),
        (
            "MaxSpeed",
            &["Automotive::Maximum Speed", "Automotive::Speed, Maximum"],
        ),
        (
            "CruiseSpeed",
            &["Automotive::Cruise Speed", "Automotive::Cruising Speed"],
        ),
        ("Endurance", &["Automotive::Endurance"]),
        (
            "Ceiling",
            &[
                "Automotive::Service Ceiling",
                "Automotive::Ceiling",
                "Automotive::Maximum Altitude",
            ],
        ),
        (
            "Range",
            &[
                "Automotive::Maximum Range",
                "Automotive::Ferry Range",
                "Automotive::Maximum Distance",
                "System::Maximum Range",
                "System::Range",
            ],
        ),
        ("Crew", &["System::Crew"]),
    ],
};

pub static ARTILLERY: FieldSpec = FieldSpec {
    record_type: RecordType::Artillery,
    columns: &[
        "Name",
        "Type",
        "ImageUrl",
        "Caliber",
        "RateOfFire",
        "MaxRange",
        "EmplacementTime",
        "DisplacementTime",
    ],
    fields: &[
        ("Name", &["System::Name"]),
        ("Type", &["System::Type"]),
        ("Caliber", &["System::Caliber", "Ammunition::Caliber"]),
        (
            "RateOfFire",
            &[
                "System::Max Rate of Fire",
                "System::Maximum Rate of Fire",
                "System::Sustain Rate of Fire",
                "System::Rate of Fire",
            ],
        ),
        (
            "MaxRange",
            &[
                "System::Maximum Firing Range",
                "System::Maximum Effective Range",
                "Ammunition (Option 2)::Maximum Effective Range",
            ],
        ),
        ("EmplacementTime", &["System::Emplacement Time"]),
        ("DisplacementTime", &["System::Displacement Time"]),
    ],
};
