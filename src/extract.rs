//! Applies a [`FieldSpec`] to cards, producing one uniformly shaped row per card.

use rayon::prelude::*;
use tracing::debug;

use crate::field_spec::FieldSpec;
use crate::records::WegCardRecord;
use crate::section_index::SectionIndex;

/// Column filled from the card's image list rather than its sections.
pub const IMAGE_URL_COLUMN: &str = "ImageUrl";

/// One output row: every spec column, in spec order, never missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedRow {
    cells: Vec<(String, String)>,
}

impl ExtractedRow {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(column))
            .map(|(_, value)| value.as_str())
    }

    pub fn set(&mut self, column: &str, value: String) {
        if let Some(cell) = self
            .cells
            .iter_mut()
            .find(|(name, _)| name.eq_ignore_ascii_case(column))
        {
            cell.1 = value;
        }
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> + '_ {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &str> + '_ {
        self.cells.iter().map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.cells.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// True when no cell has a value.
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|(_, v)| v.is_empty())
    }
}

/// For each declared column, the trimmed value of the first fallback key present
/// in `index` with a non-blank value, or `""` when none matches.
pub fn extract(index: &SectionIndex, spec: &FieldSpec) -> ExtractedRow {
    let cells = spec
        .columns
        .iter()
        .map(|&column| {
            let value = first_match(index, spec.fallbacks(column));
            (column.to_string(), value)
        })
        .collect();
    ExtractedRow { cells }
}

fn first_match(index: &SectionIndex, fallbacks: &[&str]) -> String {
    fallbacks
        .iter()
        .filter_map(|key| index.get(key))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_default()
}

/// Parses the card's sections, extracts `spec`, and fills the image column.
pub fn extract_record(record: &WegCardRecord, spec: &FieldSpec) -> ExtractedRow {
    let index = SectionIndex::build(&record.sections());
    let mut row = extract(&index, spec);
    if row.get(IMAGE_URL_COLUMN).is_some_and(str::is_empty) {
        row.set(IMAGE_URL_COLUMN, record.first_image_url());
    }
    row
}

/// [`extract_record`] for a whole batch, in parallel. Output order matches input.
pub fn extract_batch(records: &[WegCardRecord], spec: &FieldSpec) -> Vec<ExtractedRow> {
    let rows: Vec<ExtractedRow> = records
        .par_iter()
        .map(|record| extract_record(record, spec))
        .collect();
    debug!(
        record_type = %spec.record_type,
        rows = rows.len(),
        blank = rows.iter().filter(|r| r.is_blank()).count(),
        "extracted batch"
    );
    rows
}
