//! Corpus-wide section / property frequency statistics.
//!
//! Run across every card to see which section and property names actually occur
//! and how often; the field specs are authored from these counts.
//!
//! Three counters are kept, all keyed case-insensitively:
//! - top-level sections (`"System"`), counted only at depth zero,
//! - direct nestings at any depth (`"Main Weapon System > Ammunition"`),
//! - properties per section (`"System :: Crew"`).

use std::collections::hash_map::Entry;
use std::fmt;

use ahash::AHashMap;
use dashmap::mapref::entry::Entry as DashEntry;
use dashmap::DashMap;
use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::records::WegCardRecord;
use crate::section_index::{UNNAMED_PROPERTY, UNNAMED_SECTION};
use crate::sections::Section;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum CounterKind {
    Section,
    Subsection,
    Property,
}

impl CounterKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CounterKind::Section => "section",
            CounterKind::Subsection => "subsection",
            CounterKind::Property => "property",
        }
    }
}

impl fmt::Display for CounterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visits every countable event in one card's section tree.
fn walk_sections(sections: &[Section], visit: &mut impl FnMut(CounterKind, String)) {
    for section in sections {
        walk_section(section, 0, visit);
    }
}

fn walk_section(section: &Section, depth: usize, visit: &mut impl FnMut(CounterKind, String)) {
    if depth == 0 {
        let name = section.raw_name().trim();
        let name = if name.is_empty() { UNNAMED_SECTION } else { name };
        visit(CounterKind::Section, name.to_string());
    }

    for property in &section.properties {
        let prop = property.name.as_deref().map(str::trim).unwrap_or_default();
        let prop = if prop.is_empty() { UNNAMED_PROPERTY } else { prop };
        visit(
            CounterKind::Property,
            format!("{} :: {prop}", section.raw_name()),
        );
    }

    for sub in &section.sections {
        visit(
            CounterKind::Subsection,
            format!("{} > {}", section.raw_name(), sub.raw_name()),
        );
        walk_section(sub, depth + 1, visit);
    }
}

/// Case-insensitive frequency map. Each key is reported under the smallest
/// spelling seen, so the result does not depend on insertion or merge order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyMap {
    counts: AHashMap<String, (String, u64)>,
}

impl FrequencyMap {
    pub fn increment(&mut self, key: String) {
        self.add(key, 1);
    }

    pub fn add(&mut self, key: String, n: u64) {
        match self.counts.entry(key.to_lowercase()) {
            Entry::Occupied(mut entry) => {
                let (spelling, count) = entry.get_mut();
                *count += n;
                if key < *spelling {
                    *spelling = key;
                }
            }
            Entry::Vacant(entry) => {
                entry.insert((key, n));
            }
        }
    }

    /// Count for `key`, 0 when never seen.
    pub fn get(&self, key: &str) -> u64 {
        self.counts
            .get(&key.to_lowercase())
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.counts.values().map(|(_, count)| count).sum()
    }

    pub fn merge(&mut self, other: FrequencyMap) {
        for (_, (key, count)) in other.counts {
            self.add(key, count);
        }
    }

    /// Entries sorted by count (descending), then key.
    pub fn sorted(&self) -> Vec<(&str, u64)> {
        let mut entries: Vec<(&str, u64)> = self
            .counts
            .values()
            .map(|(key, count)| (key.as_str(), *count))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries
    }
}

/// Single-owner accumulator. Merge per-partition accumulators with
/// [`InventoryCounters::merge`]; summing is associative and commutative.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryCounters {
    pub section_counts: FrequencyMap,
    pub subsection_counts: FrequencyMap,
    pub property_counts: FrequencyMap,
}

impl InventoryCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one card's top-level sections and everything nested under them.
    pub fn add_record_sections(&mut self, sections: &[Section]) {
        walk_sections(sections, &mut |kind, key| self.counter_mut(kind).increment(key));
    }

    pub fn counter(&self, kind: CounterKind) -> &FrequencyMap {
        match kind {
            CounterKind::Section => &self.section_counts,
            CounterKind::Subsection => &self.subsection_counts,
            CounterKind::Property => &self.property_counts,
        }
    }

    fn counter_mut(&mut self, kind: CounterKind) -> &mut FrequencyMap {
        match kind {
            CounterKind::Section => &mut self.section_counts,
            CounterKind::Subsection => &mut self.subsection_counts,
            CounterKind::Property => &mut self.property_counts,
        }
    }

    pub fn merge(mut self, other: InventoryCounters) -> Self {
        self.section_counts.merge(other.section_counts);
        self.subsection_counts.merge(other.subsection_counts);
        self.property_counts.merge(other.property_counts);
        self
    }

    /// All three counters flattened into report rows, grouped by kind and sorted
    /// by count within each kind.
    pub fn report(&self) -> Vec<InventoryEntry> {
        [CounterKind::Section, CounterKind::Subsection, CounterKind::Property]
            .into_iter()
            .flat_map(|kind| {
                self.counter(kind)
                    .sorted()
                    .into_iter()
                    .map(move |(key, count)| InventoryEntry {
                        kind,
                        key: key.to_string(),
                        count,
                    })
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryEntry {
    pub kind: CounterKind,
    pub key: String,
    pub count: u64,
}

/// Scans a corpus in parallel: each rayon partition accumulates locally and the
/// partial counters are summed.
pub fn scan_corpus(records: &[WegCardRecord]) -> InventoryCounters {
    let counters = records
        .par_iter()
        .fold(InventoryCounters::new, |mut acc, record| {
            acc.add_record_sections(&record.sections());
            acc
        })
        .reduce(InventoryCounters::new, InventoryCounters::merge);
    debug!(
        records = records.len(),
        sections = counters.section_counts.len(),
        properties = counters.property_counts.len(),
        "scanned corpus"
    );
    counters
}

/// Accumulator shared between threads without external locking.
#[derive(Debug, Default)]
pub struct ConcurrentInventory {
    sections: DashMap<String, (String, u64)>,
    subsections: DashMap<String, (String, u64)>,
    properties: DashMap<String, (String, u64)>,
}

impl ConcurrentInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_record_sections(&self, sections: &[Section]) {
        walk_sections(sections, &mut |kind, key| {
            let map = match kind {
                CounterKind::Section => &self.sections,
                CounterKind::Subsection => &self.subsections,
                CounterKind::Property => &self.properties,
            };
            match map.entry(key.to_lowercase()) {
                DashEntry::Occupied(mut entry) => {
                    let (spelling, count) = entry.get_mut();
                    *count += 1;
                    if key < *spelling {
                        *spelling = key;
                    }
                }
                DashEntry::Vacant(entry) => {
                    entry.insert((key, 1));
                }
            }
        });
    }

    /// Copies the current counts into a single-owner accumulator.
    pub fn snapshot(&self) -> InventoryCounters {
        fn copy(map: &DashMap<String, (String, u64)>) -> FrequencyMap {
            let mut out = FrequencyMap::default();
            for entry in map.iter() {
                let (key, count) = entry.value();
                out.add(key.clone(), *count);
            }
            out
        }

        InventoryCounters {
            section_counts: copy(&self.sections),
            subsection_counts: copy(&self.subsections),
            property_counts: copy(&self.properties),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn system_with_crew() -> Vec<Section> {
        let mut system = Section::new("System");
        system.properties.push(crate::sections::SectionProperty {
            name: Some("Crew".to_string()),
            value: None,
            units: None,
        });
        vec![system]
    }

    #[test]
    fn identical_records_count_twice() {
        let mut inventory = InventoryCounters::new();
        inventory.add_record_sections(&system_with_crew());
        inventory.add_record_sections(&system_with_crew());
        assert_eq!(inventory.section_counts.get("System"), 2);
        assert_eq!(inventory.property_counts.get("System :: Crew"), 2);
        assert!(inventory.subsection_counts.is_empty());
    }

    #[test]
    fn nested_sections_are_not_top_level() {
        let tree = Section::new("Main Weapon System")
            .with_section(
                Section::new("Ammunition")
                    .with_property("Caliber", "125", "mm")
                    .with_section(Section::new("System")),
            )
            .with_property("Name", "2A46", "");
        let mut inventory = InventoryCounters::new();
        inventory.add_record_sections(&[tree]);

        assert_eq!(inventory.section_counts.get("Main Weapon System"), 1);
        assert_eq!(inventory.section_counts.get("Ammunition"), 0);
        assert_eq!(inventory.section_counts.get("System"), 0);
        assert_eq!(inventory.subsection_counts.get("Main Weapon System > Ammunition"), 1);
        assert_eq!(inventory.subsection_counts.get("ammunition > system"), 1);
        assert_eq!(inventory.property_counts.get("Ammunition :: Caliber"), 1);
        assert_eq!(inventory.property_counts.get("Main Weapon System :: Name"), 1);
    }

    #[test]
    fn placeholders_apply_to_top_level_and_property_names_only() {
        let mut blank = Section::default().with_section(Section::new(" Sub "));
        blank.properties.push(Default::default());
        let mut inventory = InventoryCounters::new();
        inventory.add_record_sections(&[blank]);

        assert_eq!(inventory.section_counts.get("Unnamed Section"), 1);
        assert_eq!(inventory.subsection_counts.get(" >  Sub "), 1);
        assert_eq!(inventory.property_counts.get(" :: Unnamed Property"), 1);
    }

    #[test]
    fn keys_are_case_insensitive_and_keep_smallest_spelling() {
        let mut inventory = InventoryCounters::new();
        inventory.add_record_sections(&[Section::new("System"), Section::new("SYSTEM")]);
        assert_eq!(inventory.section_counts.sorted(), vec![("SYSTEM", 2)]);
    }

    #[test]
    fn merge_with_differing_spellings_is_order_independent() {
        let mut a = InventoryCounters::new();
        a.add_record_sections(&[Section::new("System").with_property("Crew", "3", "")]);
        let mut b = InventoryCounters::new();
        b.add_record_sections(&[Section::new("SYSTEM").with_property("crew", "3", "")]);

        let ab = a.clone().merge(b.clone());
        let ba = b.merge(a);
        assert_eq!(ab.report(), ba.report());
        assert_eq!(ab.section_counts.sorted(), vec![("SYSTEM", 2)]);
        assert_eq!(ab.property_counts.sorted(), vec![("SYSTEM :: crew", 2)]);
    }

    #[test]
    fn concurrent_spelling_does_not_depend_on_arrival_order() {
        let forward = ConcurrentInventory::new();
        forward.add_record_sections(&[Section::new("System")]);
        forward.add_record_sections(&[Section::new("SYSTEM")]);
        let backward = ConcurrentInventory::new();
        backward.add_record_sections(&[Section::new("SYSTEM")]);
        backward.add_record_sections(&[Section::new("System")]);
        assert_eq!(forward.snapshot().report(), backward.snapshot().report());
    }

    #[test]
    fn merge_sums_partitions() {
        let mut a = InventoryCounters::new();
        a.add_record_sections(&system_with_crew());
        let mut b = InventoryCounters::new();
        b.add_record_sections(&system_with_crew());
        b.add_record_sections(&[Section::new("Automotive")]);

        let ab = a.clone().merge(b.clone());
        let ba = b.merge(a);
        assert_eq!(ab, ba);
        assert_eq!(ab.section_counts.get("system"), 2);
        assert_eq!(ab.section_counts.total(), 3);
    }

    fn corpus() -> Vec<WegCardRecord> {
        (0..40)
            .map(|i| WegCardRecord {
                name: Some(format!("card-{i}")),
                sections_raw: Some(if i % 7 == 0 {
                    "[{ broken".to_string()
                } else {
                    format!(
                        r#"[{{"name":"System","properties":[{{"name":"Crew","value":"{i}"}}],
                            "sections":[{{"name":"Ammunition","properties":[{{"name":"Caliber"}}]}}]}},
                           {{"name":"Automotive{}"}}]"#,
                        i % 3
                    )
                }),
                images_raw: None,
                origin: None,
            })
            .collect()
    }

    #[test]
    fn parallel_scan_matches_sequential() {
        let records = corpus();
        let mut sequential = InventoryCounters::new();
        for record in &records {
            sequential.add_record_sections(&record.sections());
        }
        let parallel = scan_corpus(&records);
        assert_eq!(parallel, sequential);
        // 6 of 40 payloads are malformed and contribute nothing.
        assert_eq!(parallel.section_counts.get("System"), 34);
    }

    #[test]
    fn concurrent_inventory_matches_single_owner() {
        let records = corpus();
        let shared = ConcurrentInventory::new();
        records
            .par_iter()
            .for_each(|record| shared.add_record_sections(&record.sections()));
        assert_eq!(shared.snapshot(), scan_corpus(&records));
    }

    #[test]
    fn report_groups_by_kind_then_count() {
        let mut inventory = InventoryCounters::new();
        inventory.add_record_sections(&[Section::new("B"), Section::new("A"), Section::new("B")]);
        let report = inventory.report();
        let keys: Vec<_> = report.iter().map(|e| (e.kind, e.key.as_str(), e.count)).collect();
        assert_eq!(
            keys,
            vec![(CounterKind::Section, "B", 2), (CounterKind::Section, "A", 1)]
        );
    }
}
