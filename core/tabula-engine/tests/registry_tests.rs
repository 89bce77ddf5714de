mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use common::*;
use pretty_assertions::assert_eq;
use tabula_engine::{
    EngineSettings, FeatureAmbiguity, MetaStore, Owner, Plugin, PluginClass, PluginContext,
    PluginEntry, Table, TableConfig, TableError, TableResult, validate,
};

static NEEDY_CONSTRUCTED: AtomicBool = AtomicBool::new(false);

/// Needs "columnWidth" from some other plugin.
struct Needy;

impl Plugin for Needy {
    const NAME: &'static str = "needy";
    const REQUIRES: &'static [&'static str] = &["columnWidth"];

    type TableMeta = ();
    type ColumnMeta = ();
    type RowMeta = ();
}

impl PluginClass for Needy {
    fn construct(_ctx: &PluginContext<'_>) -> TableResult<Self> {
        NEEDY_CONSTRUCTED.store(true, Ordering::SeqCst);
        Ok(Needy)
    }
}

/// Provides and requires the same feature.
struct SelfReliant;

impl Plugin for SelfReliant {
    const NAME: &'static str = "self-reliant";
    const FEATURES: &'static [&'static str] = &["columnWidth"];
    const REQUIRES: &'static [&'static str] = &["columnWidth"];

    type TableMeta = ();
    type ColumnMeta = ();
    type RowMeta = ();
}

/// Needs a `Locale` service from the owner.
struct Counted;

impl Plugin for Counted {
    const NAME: &'static str = "counted";

    type TableMeta = ();
    type ColumnMeta = ();
    type RowMeta = ();
}

impl PluginClass for Counted {
    fn construct(ctx: &PluginContext<'_>) -> TableResult<Self> {
        ctx.owner.require::<Locale>(Self::NAME)?;
        Ok(Counted)
    }
}

struct Locale(&'static str);

// ── Dependency validation ───────────────────────────────────────

#[test]
fn unsatisfied_dependency_fails_before_construction() {
    let result = Table::builder(TableConfig::new().plugins(vec![PluginEntry::class::<Needy>()]))
        .owner(Owner::new())
        .build();

    match result {
        Err(TableError::UnsatisfiedDependency { plugin, feature }) => {
            assert_eq!(plugin, "needy");
            assert_eq!(feature, "columnWidth");
        }
        other => panic!("expected UnsatisfiedDependency, got {other:?}"),
    }
    assert!(!NEEDY_CONSTRUCTED.load(Ordering::SeqCst));
}

#[test]
fn plugin_cannot_satisfy_its_own_requirement() {
    let err = validate(&[PluginEntry::instance(SelfReliant)], FeatureAmbiguity::Warn).unwrap_err();
    assert!(matches!(err, TableError::UnsatisfiedDependency { .. }));
}

#[test]
fn dependency_order_does_not_matter() {
    let entries = [PluginEntry::class::<Needy>(), PluginEntry::class::<WidthA>()];
    validate(&entries, FeatureAmbiguity::Warn).unwrap();
}

#[test]
fn applying_an_invalid_plugin_list_keeps_the_old_one() {
    let table = table_with(vec![PluginEntry::class::<Tracker>()]);
    let err = table
        .apply(table.config().plugins(vec![PluginEntry::class::<Needy>()]))
        .unwrap_err();
    assert!(matches!(err, TableError::UnsatisfiedDependency { .. }));

    let names: Vec<_> = table.plugins().unwrap().iter().map(|p| p.plugin_name().to_string()).collect();
    assert_eq!(names, vec!["tracker".to_string()]);
}

// ── List shape ──────────────────────────────────────────────────

#[test]
fn duplicate_plugin_is_rejected() {
    let entries = [PluginEntry::class::<Tracker>(), PluginEntry::instance(Tracker)];
    let err = validate(&entries, FeatureAmbiguity::Allow).unwrap_err();
    assert!(matches!(err, TableError::DuplicatePlugin(name) if name == "tracker"));
}

#[test]
fn ambiguity_deny_rejects_overlapping_features() {
    let entries = [PluginEntry::class::<WidthA>(), PluginEntry::class::<WidthB>()];
    validate(&entries, FeatureAmbiguity::Allow).unwrap();
    validate(&entries, FeatureAmbiguity::Warn).unwrap();

    match validate(&entries, FeatureAmbiguity::Deny) {
        Err(TableError::AmbiguousFeature { feature, providers }) => {
            assert_eq!(feature, "columnWidth");
            assert_eq!(providers, vec!["width-a".to_string(), "width-b".to_string()]);
        }
        other => panic!("expected AmbiguousFeature, got {other:?}"),
    }
}

#[test]
fn deny_setting_applies_at_build() {
    let settings = EngineSettings {
        feature_ambiguity: FeatureAmbiguity::Deny,
        ..EngineSettings::default()
    };
    let result = Table::builder(
        TableConfig::new().plugins(vec![PluginEntry::class::<WidthA>(), PluginEntry::class::<WidthB>()]),
    )
    .owner(Owner::new())
    .settings(settings)
    .build();
    assert!(matches!(result, Err(TableError::AmbiguousFeature { .. })));
}

// ── Instantiation ───────────────────────────────────────────────

#[test]
fn class_without_owner_is_rejected_on_first_use() {
    let table = Table::builder(TableConfig::new().plugins(vec![PluginEntry::class::<Tracker>()]))
        .store(Arc::new(MetaStore::new()))
        .build()
        .unwrap();

    let err = table.plugins().err().unwrap();
    assert!(matches!(err, TableError::MissingOwner(name) if name == "tracker"));
}

#[test]
fn instances_need_no_owner() {
    let table = Table::builder(TableConfig::new().plugins(vec![PluginEntry::instance(Tracker)]))
        .store(Arc::new(MetaStore::new()))
        .build()
        .unwrap();

    assert!(table.plugin_of::<Tracker>().unwrap().is_some());
    assert_eq!(table.constructed_plugin_count(), 0);
}

#[test]
fn construction_reads_services_from_owner() {
    let config = TableConfig::new().plugins(vec![PluginEntry::class::<Counted>()]);

    let bare = Table::builder(config.clone()).owner(Owner::new()).build().unwrap();
    assert!(matches!(
        bare.plugins(),
        Err(TableError::MissingService { .. })
    ));

    let table = Table::builder(config)
        .owner(Owner::new().provide(Locale("en")))
        .build()
        .unwrap();
    assert!(table.plugin_of::<Counted>().unwrap().is_some());
    assert_eq!(table.owner().and_then(|o| o.lookup::<Locale>()).map(|l| l.0), Some("en"));
}

#[test]
fn plugins_are_built_once_across_reconfiguration() {
    let table = table_with(vec![PluginEntry::class::<Tracker>()]);
    let first = table.plugin_of::<Tracker>().unwrap().unwrap();

    table
        .apply(table.config().plugins(vec![PluginEntry::class::<Tracker>(), PluginEntry::class::<WidthA>()]))
        .unwrap();
    let second = table.plugin_of::<Tracker>().unwrap().unwrap();

    table.apply(table.config().plugins(vec![PluginEntry::class::<Tracker>()])).unwrap();
    let third = table.plugin_of::<Tracker>().unwrap().unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&first, &third));
    assert_eq!(table.constructed_plugin_count(), 2);
}

#[test]
fn metas_survive_reconfiguration() {
    let table = table_with(vec![PluginEntry::class::<Tracker>()]);
    let before = tabula_engine::meta::for_table::<Tracker>(&table).unwrap();

    table
        .apply(table.config().plugins(vec![PluginEntry::class::<WidthA>(), PluginEntry::class::<Tracker>()]))
        .unwrap();
    let after = tabula_engine::meta::for_table::<Tracker>(&table).unwrap();
    assert!(Arc::ptr_eq(&before, &after));
}

#[test]
fn removed_plugin_is_no_longer_found() {
    let table = table_with(vec![PluginEntry::class::<Tracker>(), PluginEntry::class::<WidthA>()]);
    table.apply(table.config().plugins(vec![PluginEntry::class::<WidthA>()])).unwrap();

    assert!(table.plugin_of::<Tracker>().unwrap().is_none());
    assert!(matches!(
        tabula_engine::meta::for_table::<Tracker>(&table),
        Err(TableError::UnregisteredPlugin { .. })
    ));
}

#[test]
fn plugin_list_is_memoized() {
    let table = table_with(vec![PluginEntry::class::<Tracker>()]);
    let a = table.plugins().unwrap();
    let b = table.plugins().unwrap();
    assert!(Arc::ptr_eq(&a, &b));

    table.apply(table.config()).unwrap();
    assert!(Arc::ptr_eq(&a, &table.plugins().unwrap()));
}

#[test]
fn apply_bumps_revision() {
    let table = table_with(vec![]);
    let start = table.revision().get();
    table.apply(table.config()).unwrap();
    assert_eq!(table.revision().get(), start + 1);
}
