//! Error types for the table engine.
//!
//! Every variant is a configuration mistake by a table author or plugin
//! author. None of them are retried or papered over by the engine.

use tabula_preferences::PreferencesError;
use tabula_types::MetaScope;
use thiserror::Error;

/// Result type for engine operations.
pub type TableResult<T> = Result<T, TableError>;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("plugin '{plugin}' is not registered on table {table_id}")]
    UnregisteredPlugin { table_id: String, plugin: String },

    #[error("plugin '{plugin}' has no {scope} meta factory")]
    MissingMetaFactory { plugin: String, scope: MetaScope },

    #[error("table meta for plugin '{plugin}' already exists on table {table_id}")]
    DuplicateTableMeta { table_id: String, plugin: String },

    #[error("{scope} meta for plugin '{plugin}' was requested while it was being constructed")]
    MetaCycle { plugin: String, scope: MetaScope },

    #[error("{scope} meta for plugin '{plugin}' has an unexpected type")]
    MetaTypeMismatch { plugin: String, scope: MetaScope },

    #[error("plugin '{plugin}' requires feature '{feature}', which no other configured plugin provides")]
    UnsatisfiedDependency { plugin: String, feature: String },

    #[error("feature '{feature}' is not available; available features: [{}]", available.join(", "))]
    FeatureUnavailable {
        feature: String,
        available: Vec<String>,
    },

    #[error("plugin '{provider}' provides feature '{feature}' but publishes no view for it")]
    MissingFeatureView { feature: String, provider: String },

    #[error("feature '{feature}' is provided by more than one plugin: [{}]", providers.join(", "))]
    AmbiguousFeature {
        feature: String,
        providers: Vec<String>,
    },

    #[error("plugin '{0}' is configured more than once")]
    DuplicatePlugin(String),

    #[error("cannot construct plugin '{0}': table has no owner to provide its dependencies")]
    MissingOwner(String),

    #[error("plugin '{plugin}' could not find service '{service}' on the owner")]
    MissingService { plugin: String, service: String },

    #[error("the table this entity belonged to has been dropped")]
    TableDropped,

    #[error("invalid {scope} options for plugin '{plugin}': {source}")]
    InvalidOptions {
        plugin: String,
        scope: MetaScope,
        #[source]
        source: serde_json::Error,
    },

    #[error("preferences error: {0}")]
    Preferences(#[from] PreferencesError),

    #[error("invalid column definition: {0}")]
    InvalidColumn(#[from] tabula_types::Error),
}
