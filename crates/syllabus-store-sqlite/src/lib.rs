//! SQLite backend for the Syllabus course catalog.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. Course merges are additionally
//! serialised per source by [`locks::SourceLocks`].

mod encode;
mod locks;
mod schema;
mod store;
mod views;

pub mod error;

pub use error::{Error, Result};
pub use store::{SqliteStore, StoreOptions};
