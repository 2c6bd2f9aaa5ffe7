//! End-to-end flows through the catalog view model: filter store, query
//! composition, preferences, sorting and selection of decoded models.

use pretty_assertions::assert_eq;
use std::collections::BTreeSet;

use catalog_core::filter::{
    FilterKey, FilterOptionsCatalog, FilterStateStore, FilterViolation, LatencyField,
    LatencyMetric, LatencyPercentile, NumberFilterKey, StringFilterKey,
};
use catalog_core::preferences::{FilePreferences, PreferenceStore, keys};
use catalog_core::query::{CatalogQuery, PageCursor, SourceLabelScope, compose};
use catalog_core::selection::SelectionSet;
use catalog_core::sort::{CellValue, SortDirection, SortableColumn, TableSortEngine};
use catalog_core::types::{CatalogModel, CatalogModelList};
use catalog_core::FetchState;

const TTFT_MEAN: LatencyField = LatencyField::new(LatencyMetric::Ttft, LatencyPercentile::Mean);
const ITL_P90: LatencyField = LatencyField::new(LatencyMetric::Itl, LatencyPercentile::P90);

#[test]
fn provider_and_max_latency_compose_only_those_keys() {
    let mut store = FilterStateStore::models();
    store.set_strings(StringFilterKey::Provider, ["Red Hat"]);
    store.set_number(NumberFilterKey::MaxLatency, Some(300.0));

    let params = compose(store.state(), &CatalogQuery::default());
    let names: Vec<&str> = params.iter().map(|(k, _)| k).collect();
    assert_eq!(names, vec!["max_latency", "provider"]);
    assert_eq!(params.get("provider"), Some("Red Hat"));
    assert_eq!(params.get("max_latency"), Some("300"));
    assert_eq!(params.to_query_string(), "max_latency=300&provider=Red+Hat");
}

#[test]
fn latency_threshold_survives_field_switch() {
    let mut store = FilterStateStore::models();
    store.select_latency_field(TTFT_MEAN);
    store.set_latency_threshold(Some(120.0));

    store.select_latency_field(ITL_P90);
    let params = compose(store.state(), &CatalogQuery::default());
    assert!(!params.contains("ttft_mean"));
    assert!(!params.contains("itl_p90"));

    store.select_latency_field(TTFT_MEAN);
    let params = compose(store.state(), &CatalogQuery::default());
    assert_eq!(params.get("ttft_mean"), Some("120"));
}

#[test]
fn full_request_with_scope_and_cursor() {
    let mut store = FilterStateStore::models();
    store.set_strings(StringFilterKey::Task, ["text-generation"]);
    let query = CatalogQuery::default()
        .with_search("  granite ")
        .with_label(SourceLabelScope::from(Some("Red Hat".to_string())))
        .with_page(PageCursor {
            page_size: Some(10),
            next_page_token: Some("abc".into()),
        });

    let params = compose(store.state(), &query);
    assert_eq!(
        params.to_query_string(),
        "nextPageToken=abc&pageSize=10&q=granite&sourceLabel=Red+Hat&tasks=text-generation"
    );
}

#[test]
fn all_scope_and_blank_search_are_omitted() {
    let store = FilterStateStore::models();
    let query = CatalogQuery::default()
        .with_search("   ")
        .with_label(SourceLabelScope::from(Some("All".to_string())));
    assert!(compose(store.state(), &query).is_empty());
}

#[test]
fn clearing_selected_keys_only() {
    let mut store = FilterStateStore::models();
    store.set_strings(StringFilterKey::License, ["apache-2.0"]);
    store.set_number(NumberFilterKey::MinRps, Some(5.0));
    store.clear(&[FilterKey::Number(NumberFilterKey::MinRps)]);

    let params = compose(store.state(), &CatalogQuery::default());
    assert_eq!(params.len(), 1);
    assert_eq!(params.get("license"), Some("apache-2.0"));
}

#[test]
fn violations_warn_but_compose_passes_through() {
    let options: FilterOptionsCatalog = serde_json::from_str(
        r#"{"filters": {
            "provider": {"type": "string", "values": ["Red Hat", "IBM"]},
            "max_latency": {"type": "number", "range": {"min": 0, "max": 1000}}
        }}"#,
    )
    .unwrap();

    let mut store = FilterStateStore::models();
    store.set_strings(StringFilterKey::Provider, ["Acme"]);
    store.set_number(NumberFilterKey::MaxLatency, Some(5000.0));

    let violations = options.violations(store.state());
    assert_eq!(violations.len(), 2);
    assert!(matches!(&violations[0], FilterViolation::UnknownValue { value, .. } if value == "Acme"));
    assert_eq!(violations[1].to_string(), "max_latency: 5000 is outside [0, 1000]");

    let params = compose(store.state(), &CatalogQuery::default());
    assert_eq!(params.get("provider"), Some("Acme"));
    assert_eq!(params.get("max_latency"), Some("5000"));
}

#[test]
fn latency_field_persists_across_stores() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("preferences.json");

    {
        let mut prefs = FilePreferences::open(&path).unwrap();
        let mut store = FilterStateStore::models();
        store.select_latency_field(ITL_P90);
        store.persist_latency_field(&mut prefs).unwrap();
    }

    let prefs = FilePreferences::open(&path).unwrap();
    assert_eq!(prefs.get(keys::LATENCY_FIELD).as_deref(), Some("itl_p90"));

    let mut restored = FilterStateStore::models();
    restored.restore_latency_field(&prefs);
    assert_eq!(restored.latency_field(), ITL_P90);

    // A second view with no preferences is unaffected.
    assert_eq!(FilterStateStore::models().latency_field(), LatencyField::default());
}

fn sample_models() -> CatalogModelList {
    serde_json::from_str(
        r#"{
            "items": [
                {"name": "llama-3.1-8b", "source_id": "hf", "provider": "Meta", "lastUpdateTimeSinceEpoch": "1730000000000"},
                {"name": "Granite-3.1-8b", "source_id": "redhat_ai", "provider": "IBM", "lastUpdateTimeSinceEpoch": "1735000000000"},
                {"name": "mistral-7b", "source_id": "hf", "lastUpdateTimeSinceEpoch": "1720000000000"}
            ],
            "size": 3, "pageSize": 10, "nextPageToken": ""
        }"#,
    )
    .unwrap()
}

fn model_columns() -> Vec<SortableColumn<CatalogModel>> {
    vec![
        SortableColumn::new("Name", "name", |m: &CatalogModel| CellValue::text(m.name.clone()))
            .sortable(),
        SortableColumn::new("Provider", "provider", |m: &CatalogModel| {
            CellValue::opt_text(m.provider.as_deref())
        })
        .sortable(),
        SortableColumn::new("Updated", "updated", |m: &CatalogModel| {
            m.last_updated()
                .map_or(CellValue::Empty, |t| CellValue::Number(t.timestamp_millis() as f64))
        })
        .sortable()
        .default_direction(SortDirection::Desc),
        SortableColumn::new("Source", "source", |m: &CatalogModel| {
            CellValue::opt_text(m.source_id.as_deref())
        }),
    ]
}

#[test]
fn loaded_models_sort_and_select() {
    let state = FetchState::Loading { previous: None }.resolve(Ok::<_, String>(sample_models()));
    let models = state.data().unwrap().items.clone();

    let mut engine = TableSortEngine::new(model_columns());
    let updated = engine.column_index("updated").unwrap();
    engine.toggle(updated);
    let sorted = engine.transform_data(&models);
    let names: Vec<&str> = sorted.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Granite-3.1-8b", "llama-3.1-8b", "mistral-7b"]);

    let by_name = engine.column_index("name").unwrap();
    engine.toggle(by_name);
    let sorted = engine.transform_data(&models);
    assert_eq!(sorted[0].name, "Granite-3.1-8b");

    // Source column is display-only.
    let source = engine.column_index("source").unwrap();
    assert!(engine.column_sort(source).is_none());
    engine.on_sort(source, SortDirection::Asc);
    assert_eq!(engine.transform_data(&models), models);

    let mut selection = SelectionSet::new(CatalogModel::key).with_data(sorted);
    let first = selection.data()[0].clone();
    selection.disable_check(&first, true);
    selection.toggle_header();
    assert!(selection.header_selected());
    assert!(!selection.is_selected(&first));
    assert_eq!(selection.selected_keys().len(), 2);

    // Refreshing with a subset prunes stale selections.
    selection.set_data(models[..1].to_vec());
    let expected: BTreeSet<_> = BTreeSet::from([("hf".to_string(), "llama-3.1-8b".to_string())]);
    assert_eq!(selection.selected_keys(), &expected);
}

#[test]
fn fetch_failure_keeps_previous_page() {
    let state = FetchState::Loaded(sample_models())
        .refresh()
        .resolve(Err::<CatalogModelList, _>("503 Service Unavailable"));
    assert_eq!(state.error(), Some("503 Service Unavailable"));
    assert_eq!(state.data().map(|l| l.items.len()), Some(3));
}
