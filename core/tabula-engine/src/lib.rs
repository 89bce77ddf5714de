//! Headless table engine.
//!
//! A [`Table`] holds data records, column definitions and a list of
//! plugins. It knows nothing about rendering or about any particular
//! plugin; plugins attach behavior and state to the table and to its
//! [`Column`]s and [`Row`]s.
//!
//! # Architecture
//!
//! - [`Plugin`] is the authoring contract. A plugin is identified by its
//!   type and lives at most once per table
//! - The plugin registry turns a table's [`PluginEntry`] list into live
//!   instances, validating `requires` against `features` first
//! - [`MetaStore`] keeps one meta per (entity, plugin type). Column and row
//!   metas are evicted when the entity is dropped
//! - [`features`] finds plugins by capability name instead of by type
//! - [`options`] and [`preferences`] give plugins their configuration and
//!   their persisted user state
//!
//! # Example
//!
//! ```ignore
//! let table = Table::builder(
//!     TableConfig::new()
//!         .columns(vec![ColumnConfig::new("name")?])
//!         .plugins(vec![PluginEntry::class::<ColumnResizing>()]),
//! )
//! .owner(Owner::new())
//! .build()?;
//!
//! let column = table.column("name").expect("configured");
//! let width = features::resolve_column_feature(&column, "columnWidth")?;
//! ```

mod column;
mod config;
mod error;
mod hooks;
mod owner;
mod plugin;
mod registry;
mod revision;
mod row;
mod settings;
mod table;

pub mod features;
pub mod meta;
pub mod options;
pub mod preferences;

pub use column::{Column, WeakColumn};
pub use config::{ColumnConfig, OptionsProvider, PluginEntry, PluginOptions, PreferencesConfig, TableConfig};
pub use error::{TableError, TableResult};
pub use features::{ResolvedFeature, resolve_column_feature, resolve_row_feature, resolve_table_feature};
pub use hooks::{Cleanup, ColumnContext, Destructor, RowContext};
pub use meta::MetaStore;
pub use owner::Owner;
pub use plugin::{AnyPlugin, EntityRef, ErasedMeta, FeatureView, Plugin, PluginClass, PluginContext};
pub use registry::{PluginList, validate};
pub use revision::{Memo, Revision};
pub use row::Row;
pub use settings::{EngineSettings, FeatureAmbiguity};
pub use table::{Table, TableBuilder};

pub use tabula_preferences::{PreferenceScope, ScopedPreferences};
pub use tabula_types::{ColumnKey, MetaScope, TableId};
