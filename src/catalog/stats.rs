use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::catalog::store::{Catalog, OpenOptions};
use crate::error::Result;
use crate::model::{InstanceKind, ItemKind};

#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    pub database: DatabaseSection,
    pub items: Vec<KindCount>,
    pub instances: Vec<KindCount>,
    pub users: u64,
    pub ownership_rows: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatabaseSection {
    pub path: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct KindCount {
    pub kind: &'static str,
    pub count: u64,
}

/// Gathers catalog counts and file metadata for an existing database.
pub fn stats(path: impl AsRef<Path>) -> Result<StatsReport> {
    let path = path.as_ref();
    let catalog = Catalog::open(path, &OpenOptions::existing())?;
    let metadata = fs::metadata(path)?;

    let mut items = Vec::with_capacity(ItemKind::ALL.len());
    for kind in ItemKind::ALL {
        items.push(KindCount {
            kind: kind.plural(),
            count: catalog.item_count(kind)?,
        });
    }

    let mut instances = Vec::with_capacity(InstanceKind::ALL.len());
    for kind in InstanceKind::ALL {
        instances.push(KindCount {
            kind: kind.plural(),
            count: catalog.instance_count(kind)?,
        });
    }

    Ok(StatsReport {
        database: DatabaseSection {
            path: path.display().to_string(),
            size_bytes: metadata.len(),
        },
        items,
        instances,
        users: catalog.user_count()?,
        ownership_rows: catalog.ownership_count()?,
    })
}
