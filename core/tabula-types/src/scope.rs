use serde::{Deserialize, Serialize};
use std::fmt;

/// Which kind of entity a piece of plugin metadata is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetaScope {
    Table,
    Column,
    Row,
}

impl MetaScope {
    /// Returns the lowercase name used in logs and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Column => "column",
            Self::Row => "row",
        }
    }
}

impl fmt::Display for MetaScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
