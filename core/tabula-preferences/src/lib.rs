//! Plugin preferences for tabula tables.
//!
//! Preferences are small JSON values a plugin wants to remember across
//! sessions (a resized column width, a hidden column). They live in one
//! nested document per table:
//!
//! ```text
//! plugins
//! └── <plugin name>
//!     ├── table                 { <key>: <value>, .. }
//!     └── columns
//!         └── <column key>      { <key>: <value>, .. }
//! ```
//!
//! # Architecture
//!
//! - [`PreferencesStore`] holds the document in memory and flushes it through
//!   a [`PreferencesAdapter`] on [`PreferencesStore::persist`]
//! - [`ScopedPreferences`] narrows the store to one plugin and one scope
//!   (`table` or a column key) and persists after every mutation
//! - Adapters decide the storage medium; [`MemoryAdapter`] and
//!   [`JsonFileAdapter`] ship with the crate
//!
//! Namespacing by plugin name is a naming discipline, not an access
//! control boundary: any code holding the store can read any plugin's
//! values.

mod adapter;
mod error;
mod scoped;
mod store;

pub use adapter::{JsonFileAdapter, MemoryAdapter, PreferencesAdapter};
pub use error::{PreferencesError, PreferencesResult};
pub use scoped::{PreferenceScope, ScopedPreferences};
pub use store::{PluginPreferences, PreferencesData, PreferencesStore};
