use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use rand::Rng;
use rustc_hash::FxHashSet;
use thiserror::Error;

use crate::catalog::{Catalog, NewInstance, NewItem, OpenOptions};
use crate::error::CatalogError;
use crate::model::{InstanceKind, ItemKind, Source};

const ITEM_BATCH_SIZE: usize = 256;

/// Configuration for the complete import operation.
///
/// Duties are applied before collectables so that rows referencing a duty
/// imported in the same run resolve.
#[derive(Debug, Clone)]
pub struct ImportConfig {
    /// Path to the catalog database file.
    pub db_path: PathBuf,
    /// Whether to create the database if it doesn't exist.
    pub create_if_missing: bool,
    /// Optional CSV file of duties (`id,kind,name,image`).
    pub instances: Option<PathBuf>,
    /// Optional CSV file of collectables
    /// (`id,kind,name,image,instance,sources`).
    pub items: Option<PathBuf>,
}

/// Summary statistics from an import operation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportSummary {
    /// Total number of duties imported.
    pub instances_imported: u64,
    /// Total number of collectables imported.
    pub items_imported: u64,
}

/// Configuration for exporting catalog data to CSV files.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Path to the catalog database file.
    pub db_path: PathBuf,
    /// Optional output path for the duties CSV.
    pub instances_out: Option<PathBuf>,
    /// Optional output path for the collectables CSV.
    pub items_out: Option<PathBuf>,
}

/// Summary statistics from an export operation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportSummary {
    /// Total number of duties exported.
    pub instances_exported: u64,
    /// Total number of collectables exported.
    pub items_exported: u64,
}

/// Error type for CLI import/export operations.
#[derive(Error, Debug)]
pub enum CliError {
    /// Generic error message.
    #[error("{0}")]
    Message(String),
    /// IO error from file operations.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// CSV parsing or writing error.
    #[error(transparent)]
    Csv(#[from] csv::Error),
    /// Catalog store error.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl From<&str> for CliError {
    fn from(value: &str) -> Self {
        CliError::Message(value.to_string())
    }
}

impl From<String> for CliError {
    fn from(value: String) -> Self {
        CliError::Message(value)
    }
}

/// Executes a complete import operation from CSV files into the catalog.
///
/// Rows with a blank `id` get one derived from the name; the `sources`
/// cell is a pipe-separated list of `Kind: text` entries. Item rows
/// referencing a duty that is neither in the database nor in the duties
/// file are rejected before anything is written for them.
pub fn run_import(cfg: &ImportConfig) -> Result<ImportSummary, CliError> {
    if cfg.instances.is_none() && cfg.items.is_none() {
        return Err(CliError::Message(
            "import requires --instances and/or --items files".into(),
        ));
    }

    if !cfg.db_path.exists() && !cfg.create_if_missing {
        return Err(CliError::Message(format!(
            "database {} does not exist (use --create to initialize)",
            cfg.db_path.display()
        )));
    }

    let options = if cfg.create_if_missing {
        OpenOptions::default()
    } else {
        OpenOptions::existing()
    };
    let mut catalog = Catalog::open(&cfg.db_path, &options)?;

    let mut summary = ImportSummary::default();
    let mut known_instances: FxHashSet<String> = catalog.instance_ids()?.into_iter().collect();

    if let Some(path) = &cfg.instances {
        summary.instances_imported = import_instances(&mut catalog, path, &mut known_instances)?;
    }
    if let Some(path) = &cfg.items {
        summary.items_imported = import_items(&mut catalog, path, &known_instances)?;
    }

    Ok(summary)
}

/// Executes a complete export operation from the catalog to CSV files.
///
/// The files round-trip through [`run_import`]: headers and the source
/// cell format match what the importer expects.
pub fn run_export(cfg: &ExportConfig) -> Result<ExportSummary, CliError> {
    if cfg.instances_out.is_none() && cfg.items_out.is_none() {
        return Err(CliError::Message(
            "export requires --instances and/or --items output paths".into(),
        ));
    }

    let catalog = Catalog::open(&cfg.db_path, &OpenOptions::existing())?;
    let mut summary = ExportSummary::default();

    if let Some(path) = &cfg.instances_out {
        summary.instances_exported = export_instances(&catalog, path)?;
    }
    if let Some(path) = &cfg.items_out {
        summary.items_exported = export_items(&catalog, path)?;
    }

    Ok(summary)
}

fn import_instances(
    catalog: &mut Catalog,
    path: &Path,
    known: &mut FxHashSet<String>,
) -> Result<u64, CliError> {
    let mut reader = ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = reader.headers()?.clone();
    let id_idx = find_column(&headers, "id")?;
    let kind_idx = find_column(&headers, "kind")?;
    let name_idx = find_column(&headers, "name")?;
    let image_idx = optional_column(&headers, "image");

    let mut imported = 0u64;
    for result in reader.records() {
        let record = result?;
        let name = get_required(&record, name_idx, "name")?;
        let kind = parse_instance_kind(get_required(&record, kind_idx, "kind")?)?;
        let id = match field(&record, Some(id_idx)) {
            Some(id) => {
                if known.contains(id) {
                    return Err(CliError::Message(format!(
                        "duplicate duty id '{id}' in instances file"
                    )));
                }
                id.to_string()
            }
            None => assign_id(name, known),
        };

        catalog.insert_instance(&NewInstance {
            id: id.clone(),
            kind,
            name: name.to_string(),
            image: field(&record, image_idx).map(str::to_string),
        })?;
        known.insert(id);
        imported += 1;
    }
    Ok(imported)
}

fn import_items(
    catalog: &mut Catalog,
    path: &Path,
    known_instances: &FxHashSet<String>,
) -> Result<u64, CliError> {
    let mut reader = ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = reader.headers()?.clone();
    let id_idx = find_column(&headers, "id")?;
    let kind_idx = find_column(&headers, "kind")?;
    let name_idx = find_column(&headers, "name")?;
    let image_idx = optional_column(&headers, "image");
    let instance_idx = optional_column(&headers, "instance");
    let sources_idx = optional_column(&headers, "sources");

    let mut seen: FxHashSet<String> = FxHashSet::default();
    let mut batch: Vec<NewItem> = Vec::with_capacity(ITEM_BATCH_SIZE);
    let mut imported = 0u64;

    for result in reader.records() {
        let record = result?;
        let name = get_required(&record, name_idx, "name")?;
        let kind = parse_item_kind(get_required(&record, kind_idx, "kind")?)?;
        let id = match field(&record, Some(id_idx)) {
            Some(id) => {
                if !seen.insert(id.to_string()) {
                    return Err(CliError::Message(format!(
                        "duplicate item id '{id}' in items file"
                    )));
                }
                id.to_string()
            }
            None => {
                let id = assign_id(name, &seen);
                seen.insert(id.clone());
                id
            }
        };

        let instance_id = field(&record, instance_idx).map(str::to_string);
        if let Some(instance) = &instance_id {
            if !known_instances.contains(instance) {
                return Err(CliError::Message(format!(
                    "item '{id}' references unknown duty '{instance}'"
                )));
            }
        }

        let sources = field(&record, sources_idx)
            .map(parse_sources)
            .unwrap_or_default();
        batch.push(NewItem {
            id,
            kind,
            name: name.to_string(),
            image: field(&record, image_idx).map(str::to_string),
            instance_id,
            sources,
        });

        if batch.len() >= ITEM_BATCH_SIZE {
            imported += flush_item_batch(catalog, &mut batch)?;
        }
    }
    imported += flush_item_batch(catalog, &mut batch)?;
    Ok(imported)
}

fn flush_item_batch(catalog: &mut Catalog, batch: &mut Vec<NewItem>) -> Result<u64, CliError> {
    if batch.is_empty() {
        return Ok(0);
    }
    let inserted = catalog.insert_items(batch)?;
    batch.clear();
    Ok(inserted as u64)
}

fn export_instances(catalog: &Catalog, path: &Path) -> Result<u64, CliError> {
    let mut writer = WriterBuilder::new().from_path(path)?;
    writer.write_record(["id", "kind", "name", "image"])?;
    let mut exported = 0u64;
    for kind in InstanceKind::ALL {
        for record in catalog.instances_for_export(kind)? {
            writer.write_record([
                record.id.as_str(),
                record.kind.as_str(),
                record.name.as_str(),
                record.image.as_deref().unwrap_or_default(),
            ])?;
            exported += 1;
        }
    }
    writer.flush()?;
    Ok(exported)
}

fn export_items(catalog: &Catalog, path: &Path) -> Result<u64, CliError> {
    let mut writer = WriterBuilder::new().from_path(path)?;
    writer.write_record(["id", "kind", "name", "image", "instance", "sources"])?;
    let mut exported = 0u64;
    for kind in ItemKind::ALL {
        for record in catalog.items_for_export(kind)? {
            let sources = format_sources(&record.sources);
            writer.write_record([
                record.id.as_str(),
                record.kind.as_str(),
                record.name.as_str(),
                record.image.as_deref().unwrap_or_default(),
                record.instance_id.as_deref().unwrap_or_default(),
                sources.as_str(),
            ])?;
            exported += 1;
        }
    }
    writer.flush()?;
    Ok(exported)
}

fn parse_item_kind(token: &str) -> Result<ItemKind, CliError> {
    let lowered = token.to_ascii_lowercase();
    ItemKind::from_token(&lowered)
        .or_else(|| ItemKind::from_plural(&lowered))
        .ok_or_else(|| CliError::Message(format!("unknown item kind '{token}'")))
}

fn parse_instance_kind(token: &str) -> Result<InstanceKind, CliError> {
    let lowered = token.to_ascii_lowercase();
    InstanceKind::from_token(&lowered)
        .or_else(|| InstanceKind::from_plural(&lowered))
        .ok_or_else(|| CliError::Message(format!("unknown duty kind '{token}'")))
}

/// Splits a `Kind: text|Kind: text` cell into source entries.
fn parse_sources(raw: &str) -> Vec<Source> {
    raw.split('|')
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once(':') {
            Some((kind, text)) => Source {
                kind: kind.trim().to_string(),
                text: text.trim().to_string(),
            },
            None => Source {
                kind: entry.to_string(),
                text: String::new(),
            },
        })
        .collect()
}

fn format_sources(sources: &[Source]) -> String {
    sources
        .iter()
        .map(|source| {
            if source.text.is_empty() {
                source.kind.clone()
            } else {
                format!("{}: {}", source.kind, source.text)
            }
        })
        .collect::<Vec<_>>()
        .join("|")
}

/// Builds a URL-safe id from the display name, drawing a random suffix
/// when the plain slug is already taken.
fn assign_id(name: &str, taken: &FxHashSet<String>) -> String {
    let slug = slugify(name);
    if !taken.contains(&slug) {
        return slug;
    }
    let mut rng = rand::thread_rng();
    loop {
        let candidate = format!("{slug}-{:04x}", rng.gen::<u16>());
        if !taken.contains(&candidate) {
            return candidate;
        }
    }
}

fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(ch.to_ascii_lowercase());
            pending_dash = false;
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        slug.push_str("item");
    }
    slug
}

fn find_column(headers: &StringRecord, name: &str) -> Result<usize, CliError> {
    optional_column(headers, name)
        .ok_or_else(|| CliError::Message(format!("column '{}' not found", name)))
}

fn optional_column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.eq_ignore_ascii_case(name))
}

fn field<'a>(record: &'a StringRecord, idx: Option<usize>) -> Option<&'a str> {
    idx.and_then(|idx| record.get(idx))
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
}

fn get_required<'a>(record: &'a StringRecord, idx: usize, name: &str) -> Result<&'a str, CliError> {
    field(record, Some(idx))
        .ok_or_else(|| CliError::Message(format!("missing value for column '{name}'")))
}
