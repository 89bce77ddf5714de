//! Builds a table from command-line column arguments and reports the layout
//! the stock plugins compute for it.

use anyhow::{Context, Result, bail};
use serde::Serialize;
use serde_json::{Value, json};
use std::str::FromStr;
use tabula_engine::{
    ColumnConfig, EngineSettings, Owner, PluginEntry, PluginOptions, Table, TableConfig, meta,
};
use tabula_plugins::{ColumnResizing, ColumnVisibility, StickyColumns, StickySide, features};

/// One column as given on the command line: `key[:width[:left|right]]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnArg {
    pub key: String,
    pub width: Option<f64>,
    pub sticky: Option<StickySide>,
}

impl FromStr for ColumnArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(':');
        let key = parts.next().unwrap_or_default().trim();
        if key.is_empty() {
            return Err(format!("column argument {s:?} has no key"));
        }
        let width = match parts.next().filter(|w| !w.is_empty()) {
            Some(w) => Some(w.parse::<f64>().map_err(|e| format!("bad width {w:?}: {e}"))?),
            None => None,
        };
        let sticky = match parts.next() {
            None | Some("") => None,
            Some("left") => Some(StickySide::Left),
            Some("right") => Some(StickySide::Right),
            Some(other) => return Err(format!("sticky side must be left or right, got {other:?}")),
        };
        if parts.next().is_some() {
            return Err(format!("column argument {s:?} has too many parts"));
        }
        Ok(Self {
            key: key.to_string(),
            width,
            sticky,
        })
    }
}

impl ColumnArg {
    fn to_config(&self) -> Result<ColumnConfig> {
        let mut config = ColumnConfig::new(self.key.as_str())?;
        if let Some(width) = self.width {
            config = config.plugin(PluginOptions::of::<ColumnResizing>(move || json!({ "width": width })));
        }
        if let Some(side) = self.sticky {
            let side = side.to_string();
            config = config.plugin(PluginOptions::of::<StickyColumns>(move || json!({ "sticky": side })));
        }
        Ok(config)
    }
}

/// What the plugins report for one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnLayout {
    pub key: String,
    pub width: f64,
    pub visible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<String>,
}

/// Preferences key of tables built with `remember` set.
pub const PREFERENCES_KEY: &str = "tabula-cli";

/// Builds a table with the three stock plugins over `columns`.
///
/// Column preferences (hidden columns, resized widths) stay in memory
/// unless `remember` is set, in which case they are read from and saved
/// under [`PREFERENCES_KEY`] in the settings' `preferences_dir`.
pub fn build_table(
    settings: EngineSettings,
    columns: &[ColumnArg],
    data: Vec<Value>,
    remember: bool,
) -> Result<Table> {
    let columns = columns
        .iter()
        .map(ColumnArg::to_config)
        .collect::<Result<Vec<_>>>()?;
    let mut config = TableConfig::new()
        .data(data)
        .columns(columns)
        .plugins(vec![
            PluginEntry::class::<ColumnResizing>(),
            PluginEntry::class::<ColumnVisibility>(),
            PluginEntry::class::<StickyColumns>(),
        ]);
    if remember {
        config = config.preferences_key(PREFERENCES_KEY);
    }

    Table::builder(config)
        .owner(Owner::new())
        .settings(settings)
        .build()
        .context("Failed to build table")
}

/// Hides the columns named in `keys`.
pub fn hide(table: &Table, keys: &[String]) -> Result<()> {
    for key in keys {
        let Some(column) = table.column(key) else {
            bail!("no column named {key:?}");
        };
        meta::for_column::<ColumnVisibility>(&column)?.hide()?;
    }
    Ok(())
}

pub fn layout(table: &Table) -> Result<Vec<ColumnLayout>> {
    table
        .columns()
        .iter()
        .map(|column| {
            Ok(ColumnLayout {
                key: column.key().to_string(),
                width: features::column_width(column)?.unwrap_or_default(),
                visible: meta::for_column::<ColumnVisibility>(column)?.is_visible()?,
                offset: meta::for_column::<StickyColumns>(column)?.offset()?,
            })
        })
        .collect()
}

/// Reads records from a JSON array file.
pub fn load_data(path: &std::path::Path) -> Result<Vec<Value>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("{} is not a JSON array", path.display()))
}
