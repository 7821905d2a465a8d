use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OpenFlags};
use rustc_hash::FxHashMap;

use crate::catalog::schema;
use crate::error::Result;
use crate::model::{InstanceId, InstanceKind, ItemId, ItemKind, Source};

/// Options controlling how a catalog database is opened.
#[derive(Debug, Clone)]
pub struct OpenOptions {
    /// Create the database file (and parent directories) when missing.
    /// Servers keep this off so a typo'd path fails instead of silently
    /// creating an empty catalog.
    pub create_if_missing: bool,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            create_if_missing: true,
        }
    }
}

impl OpenOptions {
    /// Options for opening an existing catalog only.
    pub fn existing() -> Self {
        Self {
            create_if_missing: false,
        }
    }
}

/// A new duty record for insertion.
#[derive(Debug, Clone)]
pub struct NewInstance {
    /// Stable identifier, unique across every duty kind.
    pub id: InstanceId,
    /// Which duty catalog the record belongs to.
    pub kind: InstanceKind,
    /// Display name.
    pub name: String,
    /// Optional image URL or path.
    pub image: Option<String>,
}

/// A new collectable record for insertion, with its acquisition sources in
/// display order.
#[derive(Debug, Clone)]
pub struct NewItem {
    /// Stable identifier, unique across every item kind.
    pub id: ItemId,
    /// Which collectable catalog the record belongs to.
    pub kind: ItemKind,
    /// Display name.
    pub name: String,
    /// Optional image URL or path.
    pub image: Option<String>,
    /// The duty this collectable drops from, when there is one.
    pub instance_id: Option<InstanceId>,
    /// Acquisition sources in display order.
    pub sources: Vec<Source>,
}

/// SQLite-backed catalog of collectables, duties, and ownership rows.
pub struct Catalog {
    pub(crate) conn: Connection,
    path: PathBuf,
}

impl Catalog {
    /// Opens the catalog at `path`, creating it when the options allow.
    pub fn open(path: impl AsRef<Path>, options: &OpenOptions) -> Result<Catalog> {
        let path = path.as_ref();
        let conn = if options.create_if_missing {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            Connection::open(path)?
        } else {
            let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX;
            Connection::open_with_flags(path, flags)?
        };

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        schema::ensure(&conn)?;

        Ok(Catalog {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// In-memory catalog for tests and benchmarks.
    pub fn open_in_memory() -> Result<Catalog> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        schema::ensure(&conn)?;
        Ok(Catalog {
            conn,
            path: PathBuf::from(":memory:"),
        })
    }

    /// The path the catalog was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Inserts one duty record.
    pub fn insert_instance(&mut self, record: &NewInstance) -> Result<()> {
        self.conn.execute(
            "INSERT INTO instances (id, kind, name, image) VALUES (?1, ?2, ?3, ?4)",
            params![
                record.id,
                record.kind.as_str(),
                record.name,
                record.image
            ],
        )?;
        Ok(())
    }

    /// Inserts one collectable record together with its sources.
    pub fn insert_item(&mut self, record: &NewItem) -> Result<()> {
        let tx = self.conn.transaction()?;
        insert_item_tx(&tx, record)?;
        tx.commit()?;
        Ok(())
    }

    /// Inserts a batch of items inside one transaction.
    pub fn insert_items(&mut self, records: &[NewItem]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        for record in records {
            insert_item_tx(&tx, record)?;
        }
        tx.commit()?;
        Ok(records.len())
    }

    /// Number of collectables of one kind.
    pub fn item_count(&self, kind: ItemKind) -> Result<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM items WHERE kind = ?1",
            params![kind.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Number of duties of one kind.
    pub fn instance_count(&self, kind: InstanceKind) -> Result<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM instances WHERE kind = ?1",
            params![kind.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Number of users with at least one recorded session.
    pub fn user_count(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Total ownership rows across every user and kind.
    pub fn ownership_count(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM ownership", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Ids of every duty in the catalog, used to validate references
    /// before a bulk item insert.
    pub fn instance_ids(&self) -> Result<Vec<InstanceId>> {
        let mut stmt = self.conn.prepare("SELECT id FROM instances ORDER BY seq")?;
        let mapped = stmt.query_map([], |row| row.get(0))?;
        Ok(mapped.collect::<rusqlite::Result<_>>()?)
    }

    /// Every duty of one kind as insertable records, in catalog order.
    pub fn instances_for_export(&self, kind: InstanceKind) -> Result<Vec<NewInstance>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, image FROM instances WHERE kind = ?1 ORDER BY seq")?;
        let mapped = stmt.query_map(params![kind.as_str()], |row| {
            Ok(NewInstance {
                id: row.get(0)?,
                kind,
                name: row.get(1)?,
                image: row.get(2)?,
            })
        })?;
        Ok(mapped.collect::<rusqlite::Result<_>>()?)
    }

    /// Every collectable of one kind as insertable records, sources
    /// included in display order.
    pub fn items_for_export(&self, kind: ItemKind) -> Result<Vec<NewItem>> {
        let mut records: Vec<NewItem> = {
            let mut stmt = self.conn.prepare(
                "SELECT id, name, image, instance_id FROM items
                 WHERE kind = ?1 ORDER BY seq",
            )?;
            let mapped = stmt.query_map(params![kind.as_str()], |row| {
                Ok(NewItem {
                    id: row.get(0)?,
                    kind,
                    name: row.get(1)?,
                    image: row.get(2)?,
                    instance_id: row.get(3)?,
                    sources: Vec::new(),
                })
            })?;
            mapped.collect::<rusqlite::Result<_>>()?
        };

        let mut by_item: FxHashMap<ItemId, Vec<Source>> = FxHashMap::default();
        {
            let mut stmt = self.conn.prepare(
                "SELECT s.item_id, s.type, s.text FROM sources s
                 JOIN items i ON i.id = s.item_id
                 WHERE i.kind = ?1
                 ORDER BY s.item_id, s.position",
            )?;
            let mapped = stmt.query_map(params![kind.as_str()], |row| {
                Ok((
                    row.get::<_, ItemId>(0)?,
                    Source {
                        kind: row.get(1)?,
                        text: row.get(2)?,
                    },
                ))
            })?;
            for row in mapped {
                let (item_id, source) = row?;
                by_item.entry(item_id).or_default().push(source);
            }
        }
        for record in &mut records {
            if let Some(sources) = by_item.remove(&record.id) {
                record.sources = sources;
            }
        }
        Ok(records)
    }
}

fn insert_item_tx(tx: &rusqlite::Transaction<'_>, record: &NewItem) -> Result<()> {
    tx.execute(
        "INSERT INTO items (id, kind, name, image, instance_id) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            record.id,
            record.kind.as_str(),
            record.name,
            record.image,
            record.instance_id
        ],
    )?;
    for (position, source) in record.sources.iter().enumerate() {
        tx.execute(
            "INSERT INTO sources (item_id, position, type, text) VALUES (?1, ?2, ?3, ?4)",
            params![record.id, position as i64, source.kind, source.text],
        )?;
    }
    Ok(())
}
