//! # Folio
//!
//! Document hierarchy and authorization core for a multi-tenant knowledge
//! base, usable both as a library and through the `folio` operator CLI.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! folio = { version = "0.0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use folio::commands::{document_mover, Context, MoveDocument};
//! use folio::store::{SqliteStore, Store};
//!
//! let store = SqliteStore::new("./data/folio.db")?;
//! store.initialize()?;
//!
//! let outcome = store.transaction(|tx| {
//!     document_mover(tx, &Context::new(&user), &document, MoveDocument {
//!         collection_id: Some(target_id.clone()),
//!         parent_document_id: None,
//!         index: Some(0),
//!     })
//! })?;
//! ```
//!
//! Commands never check permissions themselves; authorize first with
//! [`policy::Policy::authorize`].
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes CLI module. Disable with `default-features = false`.

#[cfg(feature = "cli")]
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod membership;
pub mod policy;
pub mod store;
pub mod structure;
pub mod types;
