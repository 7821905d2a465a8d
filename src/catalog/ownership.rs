use rusqlite::{params, OptionalExtension};
use time::OffsetDateTime;

use crate::catalog::store::Catalog;
use crate::error::{CatalogError, Result};
use crate::model::{ItemId, ItemKind, ItemSummary};

impl Catalog {
    /// Marks an item as owned by the user. Granting an already-owned item
    /// is a no-op; the summary is returned either way.
    ///
    /// The user row is created on first contact, which is how guests who
    /// log in start accumulating a server-side collection.
    pub fn grant(&mut self, user: &str, kind: ItemKind, item_id: &str) -> Result<ItemSummary> {
        let summary = self.require_item(kind, item_id)?;
        let granted_at = OffsetDateTime::now_utc().unix_timestamp();
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT OR IGNORE INTO users (id) VALUES (?1)",
            params![user],
        )?;
        tx.execute(
            "INSERT OR IGNORE INTO ownership (user_id, item_id, granted_at) VALUES (?1, ?2, ?3)",
            params![user, item_id, granted_at],
        )?;
        tx.commit()?;
        Ok(summary)
    }

    /// Removes an item from the user's collection. Revoking an item the
    /// user never owned is a no-op.
    pub fn revoke(&mut self, user: &str, kind: ItemKind, item_id: &str) -> Result<ItemSummary> {
        let summary = self.require_item(kind, item_id)?;
        self.conn.execute(
            "DELETE FROM ownership WHERE user_id = ?1 AND item_id = ?2",
            params![user, item_id],
        )?;
        Ok(summary)
    }

    pub fn is_owned(&self, user: &str, item_id: &str) -> Result<bool> {
        let row: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM ownership WHERE user_id = ?1 AND item_id = ?2",
                params![user, item_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(row.is_some())
    }

    /// Ids of every item of a kind the user owns, in catalog order.
    pub fn owned_ids(&self, user: &str, kind: ItemKind) -> Result<Vec<ItemId>> {
        let mut stmt = self.conn.prepare(
            "SELECT i.id FROM items i
             JOIN ownership o ON o.item_id = i.id
             WHERE o.user_id = ?1 AND i.kind = ?2
             ORDER BY i.seq",
        )?;
        let mapped = stmt.query_map(params![user, kind.as_str()], |row| row.get(0))?;
        let mut ids = Vec::new();
        for id in mapped {
            ids.push(id?);
        }
        Ok(ids)
    }

    fn require_item(&self, kind: ItemKind, item_id: &str) -> Result<ItemSummary> {
        let found = self
            .conn
            .query_row(
                "SELECT id, name FROM items WHERE id = ?1 AND kind = ?2",
                params![item_id, kind.as_str()],
                |row| Ok((row.get::<_, ItemId>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;
        match found {
            Some((id, name)) => Ok(ItemSummary { id, name, kind }),
            None => Err(CatalogError::NotFound(kind.as_str())),
        }
    }
}
