use rusqlite::{params, params_from_iter};
use rustc_hash::FxHashMap;

use crate::catalog::store::Catalog;
use crate::cursor::Cursor;
use crate::error::{CatalogError, Result};
use crate::feed::PageFetcher;
use crate::model::{
    ExpandedInstance, ExpandedItem, InstanceId, InstanceKind, ItemId, ItemKind, Page, Source,
    UserId,
};

/// Hard ceiling on page sizes, whatever the client asks for.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Clamps a client-supplied page size into the service bounds.
pub fn clamp_limit(requested: Option<u32>, default: u32) -> u32 {
    requested.unwrap_or(default).clamp(1, MAX_PAGE_LIMIT)
}

type RawItemRow = (i64, ItemId, String, Option<String>);

impl Catalog {
    /// One page of a collectable catalog in insertion order.
    ///
    /// Fetches `limit + 1` rows starting at the cursor ordinal; the extra
    /// row, when present, is popped and becomes the next cursor. The page
    /// therefore never exposes a cursor that leads to an empty page.
    pub fn page_items(
        &self,
        kind: ItemKind,
        cursor: Option<Cursor>,
        limit: u32,
    ) -> Result<Page<ExpandedItem>> {
        let limit = limit.clamp(1, MAX_PAGE_LIMIT);
        let start = cursor.map_or(0, |c| c.0);

        let mut rows: Vec<RawItemRow> = {
            let mut stmt = self.conn.prepare(
                "SELECT seq, id, name, image FROM items
                 WHERE kind = ?1 AND seq >= ?2
                 ORDER BY seq LIMIT ?3",
            )?;
            let mapped = stmt.query_map(
                params![kind.as_str(), start, i64::from(limit) + 1],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )?;
            mapped.collect::<rusqlite::Result<_>>()?
        };

        let next_cursor = if rows.len() > limit as usize {
            rows.pop().map(|(seq, ..)| Cursor(seq).encode())
        } else {
            None
        };

        let items = self.expand_items(rows)?;
        Ok(Page { items, next_cursor })
    }

    /// One page of a duty catalog, each duty expanded with its rewards.
    pub fn page_instances(
        &self,
        kind: InstanceKind,
        cursor: Option<Cursor>,
        limit: u32,
    ) -> Result<Page<ExpandedInstance>> {
        let limit = limit.clamp(1, MAX_PAGE_LIMIT);
        let start = cursor.map_or(0, |c| c.0);

        let mut rows: Vec<(i64, InstanceId, String, Option<String>)> = {
            let mut stmt = self.conn.prepare(
                "SELECT seq, id, name, image FROM instances
                 WHERE kind = ?1 AND seq >= ?2
                 ORDER BY seq LIMIT ?3",
            )?;
            let mapped = stmt.query_map(
                params![kind.as_str(), start, i64::from(limit) + 1],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )?;
            mapped.collect::<rusqlite::Result<_>>()?
        };

        let next_cursor = if rows.len() > limit as usize {
            rows.pop().map(|(seq, ..)| Cursor(seq).encode())
        } else {
            None
        };

        let instance_ids: Vec<&str> = rows.iter().map(|(_, id, ..)| id.as_str()).collect();
        let mut rewards = self.rewards_for(&instance_ids)?;

        let items = rows
            .into_iter()
            .map(|(_, id, name, image)| {
                let mut instance = ExpandedInstance::empty(id, name, image);
                if let Some(groups) = rewards.remove(&instance.id) {
                    for (kind, item) in groups {
                        instance.items_of_mut(kind).push(item);
                    }
                }
                instance
            })
            .collect();

        Ok(Page { items, next_cursor })
    }

    /// A single item expanded with sources and owners, by public id.
    pub fn find_item(&self, kind: ItemKind, item_id: &str) -> Result<ExpandedItem> {
        let rows: Vec<RawItemRow> = {
            let mut stmt = self
                .conn
                .prepare("SELECT seq, id, name, image FROM items WHERE id = ?1 AND kind = ?2")?;
            let mapped = stmt.query_map(params![item_id, kind.as_str()], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })?;
            mapped.collect::<rusqlite::Result<_>>()?
        };
        let mut expanded = self.expand_items(rows)?;
        expanded.pop().ok_or(CatalogError::NotFound(kind.as_str()))
    }

    fn expand_items(&self, rows: Vec<RawItemRow>) -> Result<Vec<ExpandedItem>> {
        let ids: Vec<&str> = rows.iter().map(|(_, id, ..)| id.as_str()).collect();
        let mut source_map = self.sources_for(&ids)?;
        let mut owner_map = self.owners_for(&ids)?;

        Ok(rows
            .into_iter()
            .map(|(_, id, name, image)| {
                let sources = source_map.remove(&id).unwrap_or_default();
                let owners = owner_map.remove(&id).unwrap_or_default();
                ExpandedItem {
                    id,
                    name,
                    image,
                    sources,
                    owners,
                }
            })
            .collect())
    }

    fn sources_for(&self, item_ids: &[&str]) -> Result<FxHashMap<ItemId, Vec<Source>>> {
        let mut grouped: FxHashMap<ItemId, Vec<Source>> = FxHashMap::default();
        if item_ids.is_empty() {
            return Ok(grouped);
        }
        let sql = format!(
            "SELECT item_id, type, text FROM sources
             WHERE item_id IN ({})
             ORDER BY item_id, position",
            placeholders(item_ids.len())
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mapped = stmt.query_map(params_from_iter(item_ids.iter().copied()), |row| {
            Ok((
                row.get::<_, ItemId>(0)?,
                Source {
                    kind: row.get(1)?,
                    text: row.get(2)?,
                },
            ))
        })?;
        for entry in mapped {
            let (item_id, source) = entry?;
            grouped.entry(item_id).or_default().push(source);
        }
        Ok(grouped)
    }

    fn owners_for(&self, item_ids: &[&str]) -> Result<FxHashMap<ItemId, Vec<UserId>>> {
        let mut grouped: FxHashMap<ItemId, Vec<UserId>> = FxHashMap::default();
        if item_ids.is_empty() {
            return Ok(grouped);
        }
        let sql = format!(
            "SELECT item_id, user_id FROM ownership
             WHERE item_id IN ({})
             ORDER BY item_id, granted_at, user_id",
            placeholders(item_ids.len())
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mapped = stmt.query_map(params_from_iter(item_ids.iter().copied()), |row| {
            Ok((row.get::<_, ItemId>(0)?, row.get::<_, UserId>(1)?))
        })?;
        for entry in mapped {
            let (item_id, user_id) = entry?;
            grouped.entry(item_id).or_default().push(user_id);
        }
        Ok(grouped)
    }

    fn rewards_for(
        &self,
        instance_ids: &[&str],
    ) -> Result<FxHashMap<InstanceId, Vec<(ItemKind, ExpandedItem)>>> {
        let mut grouped: FxHashMap<InstanceId, Vec<(ItemKind, ExpandedItem)>> =
            FxHashMap::default();
        if instance_ids.is_empty() {
            return Ok(grouped);
        }
        let sql = format!(
            "SELECT id, kind, name, image, instance_id FROM items
             WHERE instance_id IN ({})
             ORDER BY seq",
            placeholders(instance_ids.len())
        );
        let raw: Vec<(ItemId, String, String, Option<String>, InstanceId)> = {
            let mut stmt = self.conn.prepare(&sql)?;
            let mapped = stmt.query_map(params_from_iter(instance_ids.iter().copied()), |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                ))
            })?;
            mapped.collect::<rusqlite::Result<_>>()?
        };

        let item_ids: Vec<&str> = raw.iter().map(|(id, ..)| id.as_str()).collect();
        let mut source_map = self.sources_for(&item_ids)?;
        let mut owner_map = self.owners_for(&item_ids)?;

        for (id, token, name, image, instance_id) in raw {
            let kind = ItemKind::from_token(&token).ok_or_else(|| {
                CatalogError::InvalidArgument(format!("unknown item kind '{token}' in catalog"))
            })?;
            let sources = source_map.remove(&id).unwrap_or_default();
            let owners = owner_map.remove(&id).unwrap_or_default();
            grouped.entry(instance_id).or_default().push((
                kind,
                ExpandedItem {
                    id,
                    name,
                    image,
                    sources,
                    owners,
                },
            ));
        }
        Ok(grouped)
    }

    /// Page fetcher over one item kind, for driving a feed without HTTP.
    pub fn item_pages(&self, kind: ItemKind) -> ItemPages<'_> {
        ItemPages {
            catalog: self,
            kind,
        }
    }

    /// Page fetcher over one duty kind.
    pub fn instance_pages(&self, kind: InstanceKind) -> InstancePages<'_> {
        InstancePages {
            catalog: self,
            kind,
        }
    }
}

fn placeholders(count: usize) -> String {
    let mut out = String::with_capacity(count * 2);
    for index in 0..count {
        if index > 0 {
            out.push(',');
        }
        out.push('?');
    }
    out
}

/// [`PageFetcher`] over the item catalog of one kind.
pub struct ItemPages<'a> {
    catalog: &'a Catalog,
    kind: ItemKind,
}

impl PageFetcher<ExpandedItem> for ItemPages<'_> {
    fn fetch_page(
        &mut self,
        cursor: Option<&str>,
        limit: u32,
    ) -> std::result::Result<Page<ExpandedItem>, String> {
        let cursor = Cursor::decode_opt(cursor).map_err(|err| err.to_string())?;
        self.catalog
            .page_items(self.kind, cursor, limit)
            .map_err(|err| err.to_string())
    }
}

/// [`PageFetcher`] over the duty catalog of one kind.
pub struct InstancePages<'a> {
    catalog: &'a Catalog,
    kind: InstanceKind,
}

impl PageFetcher<ExpandedInstance> for InstancePages<'_> {
    fn fetch_page(
        &mut self,
        cursor: Option<&str>,
        limit: u32,
    ) -> std::result::Result<Page<ExpandedInstance>, String> {
        let cursor = Cursor::decode_opt(cursor).map_err(|err| err.to_string())?;
        self.catalog
            .page_instances(self.kind, cursor, limit)
            .map_err(|err| err.to_string())
    }
}
