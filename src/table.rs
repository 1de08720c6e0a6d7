//! Parquet output for extracted rows and inventory reports.

use std::fs::{self, File};
use std::path::Path;

use arrow2::array::{Array, UInt64Array, Utf8Array};
use arrow2::chunk::Chunk;
use arrow2::datatypes::{DataType, Field, Schema};
use arrow2::io::parquet::write::{
    transverse, CompressionOptions, Encoding, FileWriter, RowGroupIterator, Version, WriteOptions,
};
use tracing::info;

use crate::error::Result;
use crate::extract::ExtractedRow;
use crate::inventory::InventoryCounters;

const WRITE_OPTIONS: WriteOptions = WriteOptions {
    write_statistics: true,
    compression: CompressionOptions::Snappy,
    version: Version::V2,
    data_pagesize_limit: None,
};

/// Writes one Utf8 column per entry of `columns`, one row per extracted card.
/// Returns the number of rows written.
pub fn write_rows(path: &Path, columns: &[&str], rows: &[ExtractedRow]) -> Result<usize> {
    let schema = Schema::from(
        columns
            .iter()
            .map(|name| Field::new(*name, DataType::Utf8, false))
            .collect::<Vec<_>>(),
    );

    let arrays: Vec<Box<dyn Array>> = columns
        .iter()
        .map(|column| {
            let values: Vec<&str> = rows
                .iter()
                .map(|row| row.get(column).unwrap_or_default())
                .collect();
            Utf8Array::<i32>::from_slice(values).boxed()
        })
        .collect();

    write_chunk(path, schema, Chunk::try_new(arrays)?)?;
    info!(path = %path.display(), rows = rows.len(), "wrote extracted rows");
    Ok(rows.len())
}

/// Writes `kind, key, count` rows in report order.
pub fn write_inventory(path: &Path, inventory: &InventoryCounters) -> Result<usize> {
    let report = inventory.report();

    let schema = Schema::from(vec![
        Field::new("kind", DataType::Utf8, false),
        Field::new("key", DataType::Utf8, false),
        Field::new("count", DataType::UInt64, false),
    ]);
    let kinds = Utf8Array::<i32>::from_slice(report.iter().map(|e| e.kind.as_str()).collect::<Vec<_>>());
    let keys = Utf8Array::<i32>::from_slice(report.iter().map(|e| e.key.as_str()).collect::<Vec<_>>());
    let counts = UInt64Array::from_vec(report.iter().map(|e| e.count).collect());

    let chunk = Chunk::try_new(vec![kinds.boxed(), keys.boxed(), counts.boxed()])?;
    write_chunk(path, schema, chunk)?;
    info!(path = %path.display(), entries = report.len(), "wrote inventory report");
    Ok(report.len())
}

fn write_chunk(path: &Path, schema: Schema, chunk: Chunk<Box<dyn Array>>) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;

    let encodings = schema
        .fields
        .iter()
        .map(|f| transverse(&f.data_type, |_| Encoding::Plain))
        .collect();
    let row_groups =
        RowGroupIterator::try_new(vec![Ok(chunk)].into_iter(), &schema, WRITE_OPTIONS, encodings)?;

    let mut writer = FileWriter::try_new(file, schema, WRITE_OPTIONS)?;
    for group in row_groups {
        writer.write(group?)?;
    }
    writer.end(None)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract;
    use crate::field_spec::DIRECT_FIRE;
    use crate::section_index::SectionIndex;
    use crate::sections::Section;

    #[test]
    fn writes_extracted_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/direct-fire.parquet");
        let sections = vec![Section::new("System").with_property("Name", "PKM", "")];
        let rows = vec![
            extract(&SectionIndex::build(&sections), &DIRECT_FIRE),
            extract(&SectionIndex::default(), &DIRECT_FIRE),
        ];

        let written = write_rows(&path, DIRECT_FIRE.columns, &rows).unwrap();
        assert_eq!(written, 2);
        assert!(fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn writes_empty_inventory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inventory.parquet");
        let written = write_inventory(&path, &InventoryCounters::new()).unwrap();
        assert_eq!(written, 0);
        assert!(path.exists());
    }

    #[test]
    fn writes_inventory_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inventory.parquet");
        let mut inventory = InventoryCounters::new();
        inventory.add_record_sections(&[Section::new("System").with_property("Crew", "3", "")]);
        assert_eq!(write_inventory(&path, &inventory).unwrap(), 2);
        assert!(fs::metadata(&path).unwrap().len() > 0);
    }
}
