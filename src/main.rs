use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use weg_catalog::category::{dropdown_options, CategoryCache};
use weg_catalog::query::tier_options;
use weg_catalog::settings::DEFAULT_SETTINGS_FILE;
use weg_catalog::{
    build_cache, expand, extract_batch, find_descendant_by_label, parse_card_collection,
    resolve_identifier_by_label, scan_corpus, table, AppSettings, BundleKey, FilterCriteria,
    QueryBuilder, RecordType, WegCardRecord,
};

#[derive(Debug, Parser)]
#[command(name = "weg-catalog", version, about = "WEG category, query and extraction tools")]
struct Cli {
    /// Settings file, with or without extension.
    #[arg(long, global = true, default_value = DEFAULT_SETTINGS_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Normalize a raw subnav taxonomy into a category cache file.
    Normalize {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    /// Print dropdown options as JSON.
    Dropdown {
        #[arg(long, required_unless_present = "tiers")]
        cache: Option<PathBuf>,
        /// Parent category label; the root when omitted.
        #[arg(long)]
        parent: Option<String>,
        /// Print the configured tiers instead of categories.
        #[arg(long, conflicts_with = "parent")]
        tiers: bool,
    },
    /// Compile filter selections into a search query string.
    Query {
        #[arg(long)]
        cache: PathBuf,
        /// Domain category label, e.g. "Land".
        #[arg(long)]
        domain: Option<String>,
        /// Weapon-system type labels under the domain.
        #[arg(long = "type")]
        types: Vec<String>,
        #[arg(long = "bundle")]
        bundles: Vec<BundleKey>,
        /// Proliferation (origin) identifiers.
        #[arg(long = "origin")]
        origins: Vec<String>,
        #[arg(long = "tier")]
        tiers: Vec<String>,
    },
    /// Extract one record type from a card-collection response into Parquet.
    Extract {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        record_type: RecordType,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Count sections and properties across card-collection responses.
    Inventory {
        #[arg(long, required = true)]
        input: Vec<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
        /// Entries printed per counter.
        #[arg(long, default_value_t = 20)]
        top: usize,
    },
    /// Validate the settings file.
    CheckConfig,
}

fn init_logging(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match log_dir {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(dir, "weg-catalog.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(non_blocking)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
            None
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = AppSettings::load(&cli.config)
        .with_context(|| format!("loading settings from {}", cli.config.display()))?;
    let _guard = init_logging(settings.log_dir.as_deref());
    info!(
        config = %cli.config.display(),
        tiers = settings.weg.tiers.len(),
        "loaded settings"
    );

    match cli.command {
        Command::Normalize { input, output } => {
            let raw = fs::read_to_string(&input)
                .with_context(|| format!("reading {}", input.display()))?;
            let cache = build_cache(&raw, Utc::now())?;
            cache.save(&output)?;
            let root = cache.root()?;
            println!(
                "{} nodes under '{}' written to {}",
                root.subtree_len(),
                root.display_name,
                output.display()
            );
        }

        Command::Dropdown { cache, parent, tiers } => {
            let options = if tiers {
                tier_options(&settings.weg.tiers)
            } else {
                let Some(cache) = cache else {
                    anyhow::bail!("--cache is required");
                };
                let cache = CategoryCache::load(&cache)?;
                let root = cache.root()?;
                let parent = match parent.as_deref() {
                    Some(label) => find_descendant_by_label(root, label)?,
                    None => root,
                };
                dropdown_options(parent)
            };
            println!("{}", serde_json::to_string_pretty(&options)?);
        }

        Command::Query { cache, domain, types, bundles, origins, tiers } => {
            let cache = CategoryCache::load(&cache)?;
            let root = cache.root()?;

            let mut criteria = FilterCriteria::default()
                .with_proliferation(origins)
                .with_tiers(tiers);

            if let Some(label) = domain.as_deref() {
                let domain_node = find_descendant_by_label(root, label)?;
                criteria = criteria.with_domain(resolve_identifier_by_label(root, label)?);

                let mut identifiers = types
                    .iter()
                    .map(|t| resolve_identifier_by_label(domain_node, t))
                    .collect::<weg_catalog::Result<Vec<_>>>()?;
                identifiers.extend(expand(domain_node, &bundles)?);
                criteria = criteria.with_weapon_system_types(identifiers);
            } else if !types.is_empty() || !bundles.is_empty() {
                anyhow::bail!("--type and --bundle need --domain");
            }

            let query = QueryBuilder::default().build(&criteria, &settings.weg.tiers)?;
            println!("{query}");
        }

        Command::Extract { input, record_type, output } => {
            let records = read_cards(&input)?;
            let rows = extract_batch(&records, record_type.spec());
            let output = output.unwrap_or_else(|| {
                settings
                    .output_folder_or("output")
                    .join(format!("{record_type}.parquet"))
            });
            let written = table::write_rows(&output, record_type.spec().columns, &rows)?;
            let blank = rows.iter().filter(|r| r.is_blank()).count();
            if blank > 0 {
                warn!(blank, "cards produced no values for {record_type}");
            }
            println!("{written} rows written to {}", output.display());
        }

        Command::Inventory { input, output, top } => {
            let mut records = Vec::new();
            for path in &input {
                records.extend(read_cards(path)?);
            }
            let inventory = scan_corpus(&records);

            for (title, counter) in [
                ("Sections", &inventory.section_counts),
                ("Subsections", &inventory.subsection_counts),
                ("Properties", &inventory.property_counts),
            ] {
                println!("{title} ({} distinct)", counter.len());
                for (key, count) in counter.sorted().into_iter().take(top) {
                    println!("  {count:>6}  {key}");
                }
            }

            if let Some(output) = output {
                table::write_inventory(&output, &inventory)?;
                println!("inventory written to {}", output.display());
            }
        }

        Command::CheckConfig => {
            settings.validate()?;
            println!(
                "settings ok: {} tier(s), output folder {}",
                settings.weg.tiers.len(),
                settings.output_folder_or("output").display()
            );
        }
    }

    Ok(())
}

fn read_cards(path: &Path) -> anyhow::Result<Vec<WegCardRecord>> {
    let body = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let records = parse_card_collection(&body)?;
    info!(path = %path.display(), records = records.len(), "read card collection");
    Ok(records)
}
