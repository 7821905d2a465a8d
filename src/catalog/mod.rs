#![forbid(unsafe_code)]

//! SQLite-backed catalog store.
//!
//! This module owns the relational side of the tracker: the collectable and
//! duty tables, cursor pagination over them, and the per-user ownership
//! rows behind the add/remove mutations.

mod ownership;
mod query;
mod schema;
mod seed;
mod stats;
mod store;

/// Cursor pagination over the catalog, plus page fetchers for feeds.
pub use query::{clamp_limit, InstancePages, ItemPages, MAX_PAGE_LIMIT};

/// Demo data used by `seed-demo` and the integration fixtures.
pub use seed::{seed_demo, SeedSummary};

/// Catalog counts and file metadata for the `stats` command.
pub use stats::{stats, DatabaseSection, KindCount, StatsReport};

/// The store handle and its record types.
pub use store::{Catalog, NewInstance, NewItem, OpenOptions};
