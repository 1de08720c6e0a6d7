//! Flattens one card's section tree into a `"Section::Property"` lookup.
//!
//! ```text
//! System                     "System::Maximum Range"  -> "500 km"
//!   Maximum Range = 500 km   "Ammunition::Caliber"    -> "7.62 mm"
//!   Ammunition
//!     Caliber = 7.62 mm
//! ```
//!
//! Nested sections are keyed by their own name only; the parent path is not part
//! of the key.

use ahash::AHashMap;

use crate::sections::{Section, SectionProperty};

pub const UNNAMED_SECTION: &str = "Unnamed Section";
pub const UNNAMED_PROPERTY: &str = "Unnamed Property";

/// Case-insensitive `"Section::Property"` → `"value units"` map.
#[derive(Debug, Clone, Default)]
pub struct SectionIndex {
    // lowercased key -> (key as first seen, combined value)
    entries: AHashMap<String, (String, String)>,
    order: Vec<String>,
}

impl SectionIndex {
    /// Builds the index with a pre-order walk: a section's own properties are
    /// indexed before its subsections. The first value seen for a key wins.
    pub fn build(sections: &[Section]) -> Self {
        let mut index = SectionIndex::default();
        for section in sections {
            index.add_section(section);
        }
        index
    }

    fn add_section(&mut self, section: &Section) {
        let section_name = clean_or(section.name.as_deref(), UNNAMED_SECTION);

        for property in &section.properties {
            let Some(value) = combine_value_units(property) else {
                continue;
            };
            let property_name = clean_or(property.name.as_deref(), UNNAMED_PROPERTY);
            self.insert_first(format!("{section_name}::{property_name}"), value);
        }

        for sub in &section.sections {
            self.add_section(sub);
        }
    }

    fn insert_first(&mut self, key: String, value: String) {
        let folded = key.to_lowercase();
        if self.entries.contains_key(&folded) {
            return;
        }
        self.order.push(folded.clone());
        self.entries.insert(folded, (key, value));
    }

    /// Value stored under `key`, compared case-insensitively.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(&key.trim().to_lowercase())
            .map(|(_, value)| value.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order, with keys spelled as first encountered.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.order.iter().filter_map(move |folded| {
            self.entries
                .get(folded)
                .map(|(key, value)| (key.as_str(), value.as_str()))
        })
    }
}

/// `"value units"`, `"value"` without units, or `None` for a blank value.
fn combine_value_units(property: &SectionProperty) -> Option<String> {
    let value = property.value.as_deref().map(str::trim).unwrap_or_default();
    if value.is_empty() {
        return None;
    }
    let units = property.units.as_deref().map(str::trim).unwrap_or_default();
    Some(if units.is_empty() {
        value.to_string()
    } else {
        format!("{value} {units}")
    })
}

fn clean_or<'a>(value: Option<&'a str>, placeholder: &'a str) -> &'a str {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => placeholder,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combines_value_and_units() {
        let sections = vec![Section::new(" System ")
            .with_property("Maximum Range", " 500 ", " km ")
            .with_property("Crew", "3", "  ")];
        let index = SectionIndex::build(&sections);
        assert_eq!(index.get("System::Maximum Range"), Some("500 km"));
        assert_eq!(index.get("system::crew"), Some("3"));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn first_write_wins() {
        let sections = vec![
            Section::new("System").with_property("Crew", "3", ""),
            Section::new("SYSTEM").with_property("crew ", "4", ""),
        ];
        let index = SectionIndex::build(&sections);
        assert_eq!(index.get("System::Crew"), Some("3"));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn blank_values_are_skipped_so_later_values_can_win() {
        let sections = vec![Section::new("System")
            .with_property("Crew", "   ", "men")
            .with_property("Crew", "2", "")];
        assert_eq!(SectionIndex::build(&sections).get("System::Crew"), Some("2"));
    }

    #[test]
    fn properties_indexed_before_subsections() {
        let nested = Section::new("System")
            .with_section(Section::new("System").with_property("Weight", "9", "t"))
            .with_property("Weight", "46", "t");
        let index = SectionIndex::build(&[nested]);
        assert_eq!(index.get("System::Weight"), Some("46 t"));
    }

    #[test]
    fn subsections_walked_even_without_properties() {
        let tree = Section::new("Armament").with_section(
            Section::new("Main Gun")
                .with_section(Section::new("Ammunition").with_property("Caliber", "125", "mm")),
        );
        let index = SectionIndex::build(&[tree]);
        assert_eq!(index.get("Ammunition::Caliber"), Some("125 mm"));
        assert!(!index.contains_key("Main Gun::Caliber"));
    }

    #[test]
    fn placeholders_for_blank_names() {
        let mut section = Section::default();
        section.properties.push(SectionProperty {
            name: None,
            value: Some("x".to_string()),
            units: None,
        });
        let index = SectionIndex::build(&[section]);
        let keys: Vec<_> = index.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["Unnamed Section::Unnamed Property"]);
    }
}
