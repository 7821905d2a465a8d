//! Ownership toggling with the guest fallback.
//!
//! A [`Collection`] ties together the three places a toggle can land:
//! the server-side ownership rows (through an [`OwnershipBackend`]), the
//! local [`GuestStore`] for signed-out visitors, and the shared
//! [`Notices`] queue both paths report into. The state containers are
//! injected, so tests and alternative frontends can swap them freely.

use thiserror::Error;

use crate::catalog::Catalog;
use crate::error::CatalogError;
use crate::guest::{GuestError, GuestStore};
use crate::model::{ExpandedItem, ItemId, ItemKind, ItemSummary, UserId};
use crate::notify::Notices;

/// Nudge shown to guests after a local add.
pub const LOGIN_NUDGE: &str = "Log in to make sure you never lose your collection.";

/// Server-side half of a toggle. The error string is the message the
/// server reports, ready to surface to the user.
pub trait OwnershipBackend {
    fn add_to_user(
        &mut self,
        user: &str,
        kind: ItemKind,
        item_id: &str,
    ) -> std::result::Result<ItemSummary, String>;

    fn remove_from_user(
        &mut self,
        user: &str,
        kind: ItemKind,
        item_id: &str,
    ) -> std::result::Result<ItemSummary, String>;
}

impl OwnershipBackend for Catalog {
    fn add_to_user(
        &mut self,
        user: &str,
        kind: ItemKind,
        item_id: &str,
    ) -> std::result::Result<ItemSummary, String> {
        self.grant(user, kind, item_id).map_err(|err| err.to_string())
    }

    fn remove_from_user(
        &mut self,
        user: &str,
        kind: ItemKind,
        item_id: &str,
    ) -> std::result::Result<ItemSummary, String> {
        self.revoke(user, kind, item_id).map_err(|err| err.to_string())
    }
}

/// What a successful toggle touched.
#[derive(Debug, Clone, PartialEq)]
pub enum ToggleOutcome {
    /// The server collection changed; cached catalog pages are stale and
    /// feeds should be refreshed.
    Server(ItemSummary),
    /// Only the local guest list changed.
    Guest,
}

#[derive(Debug, Error)]
pub enum CollectionError {
    /// The backend refused the mutation; the message is already queued as
    /// an error notice and no state changed.
    #[error("{0}")]
    Rejected(String),
    #[error(transparent)]
    Guest(#[from] GuestError),
}

/// One user's (or guest's) view of their collection.
pub struct Collection {
    identity: Option<UserId>,
    guest: GuestStore,
    notices: Notices,
}

impl Collection {
    pub fn new(identity: Option<UserId>, guest: GuestStore, notices: Notices) -> Collection {
        Collection {
            identity,
            guest,
            notices,
        }
    }

    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    pub fn notices(&self) -> &Notices {
        &self.notices
    }

    pub fn guest_store(&self) -> &GuestStore {
        &self.guest
    }

    /// Whether the given expanded item reads as owned right now.
    ///
    /// Signed-in users are looked up in the item's owner column; guests in
    /// the local store.
    pub fn owns(&self, item: &ExpandedItem, kind: ItemKind) -> Result<bool, GuestError> {
        match &self.identity {
            Some(user) => Ok(item.owned_by(user)),
            None => self.guest.contains(kind, &item.id),
        }
    }

    /// Everything of one kind this collection holds, for the guest path
    /// read straight from the local list.
    pub fn owned_ids(
        &self,
        backend: &Catalog,
        kind: ItemKind,
    ) -> Result<Vec<ItemId>, CollectionError> {
        match &self.identity {
            Some(user) => backend
                .owned_ids(user, kind)
                .map_err(|err: CatalogError| CollectionError::Rejected(err.to_string())),
            None => Ok(self.guest.ids(kind)?),
        }
    }

    /// Applies the "hide owned" filter without mutating the input.
    pub fn hide_owned<'a>(
        &self,
        kind: ItemKind,
        items: &'a [ExpandedItem],
    ) -> Result<Vec<&'a ExpandedItem>, GuestError> {
        match &self.identity {
            Some(user) => Ok(items.iter().filter(|item| !item.owned_by(user)).collect()),
            None => {
                let ids = self.guest.ids(kind)?;
                Ok(items
                    .iter()
                    .filter(|item| !ids.iter().any(|id| id == &item.id))
                    .collect())
            }
        }
    }

    /// Flips ownership of one item.
    ///
    /// Signed-in toggles go to the backend; a success queues a
    /// confirmation notice, a refusal queues the backend's message as an
    /// error notice and leaves every store untouched. Guest toggles edit
    /// the local list instead, and a guest add also queues [`LOGIN_NUDGE`].
    pub fn toggle<B>(
        &self,
        backend: &mut B,
        item: &ItemSummary,
        currently_owned: bool,
    ) -> Result<ToggleOutcome, CollectionError>
    where
        B: OwnershipBackend + ?Sized,
    {
        match &self.identity {
            Some(user) => {
                let attempt = if currently_owned {
                    backend.remove_from_user(user, item.kind, &item.id)
                } else {
                    backend.add_to_user(user, item.kind, &item.id)
                };
                match attempt {
                    Ok(summary) => {
                        self.notices.success(toggle_message(&summary.name, currently_owned));
                        Ok(ToggleOutcome::Server(summary))
                    }
                    Err(message) => {
                        self.notices.error(message.clone());
                        Err(CollectionError::Rejected(message))
                    }
                }
            }
            None => {
                let applied = if currently_owned {
                    self.guest.remove(item.kind, &item.id)
                } else {
                    self.guest.add(item.kind, &item.id)
                };
                if let Err(err) = applied {
                    self.notices.error(err.to_string());
                    return Err(err.into());
                }
                self.notices.success(toggle_message(&item.name, currently_owned));
                if !currently_owned {
                    self.notices.info(LOGIN_NUDGE);
                }
                Ok(ToggleOutcome::Guest)
            }
        }
    }
}

fn toggle_message(name: &str, removed: bool) -> String {
    if removed {
        format!("Removed {name} from your collection.")
    } else {
        format!("Added {name} to your collection.")
    }
}
