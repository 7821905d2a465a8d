//! Dungeoneer: a collection tracker for instanced content.
//!
//! The crate pairs a SQLite catalog of collectables and duties with the
//! web service that browses it: cursor pagination, per-user ownership
//! rows, a local guest fallback, and the server-rendered pages plus RPC
//! endpoints on top.

#![warn(missing_docs)]

pub mod catalog;
pub mod cli;
pub mod collection;
pub mod cursor;
pub mod error;
pub mod feed;
pub mod guest;
pub mod model;
pub mod notify;
pub mod server;
