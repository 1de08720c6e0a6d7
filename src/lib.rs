//! Category taxonomy normalization, search-query compilation and tabular
//! extraction for Worldwide Equipment Guide cards.

/// Bundles of weapon-system categories selectable as one filter value.
pub mod bundles;
/// Normalized category tree, its cache artifact and dropdown options.
pub mod category;
mod error;
/// Row extraction from section indexes.
pub mod extract;
/// Static per-record-type column and fallback-key catalog.
pub mod field_spec;
/// Corpus-wide section and property frequency counters.
pub mod inventory;
/// Lucene query compilation from filter selections and tiers.
pub mod query;
/// Card records from the GraphQL content API.
pub mod records;
/// Label and identifier lookup within a category tree.
pub mod resolver;
/// Flat `"Section::Property"` lookup built from one card's section tree.
pub mod section_index;
/// Section payload model and lenient parsing.
pub mod sections;
/// Config-file and environment settings.
pub mod settings;
/// Parquet writers.
pub mod table;

pub use bundles::{expand, BundleKey};
pub use category::{build_cache, normalize, CategoryCache, CategoryNode, DropdownOption};
pub use error::{Result, WegError};
pub use extract::{extract, extract_batch, extract_record, ExtractedRow};
pub use field_spec::{FieldSpec, RecordType};
pub use inventory::{scan_corpus, ConcurrentInventory, InventoryCounters};
pub use query::{build_query, FilterCriteria, QueryBuilder, TierDefinition};
pub use records::{parse_card_collection, WegCardRecord};
pub use resolver::{find_descendant_by_label, resolve_identifier_by_label};
pub use section_index::SectionIndex;
pub use sections::{Section, SectionProperty};
pub use settings::AppSettings;
