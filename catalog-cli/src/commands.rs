//! CLI subcommand handlers.
//!
//! Handlers return the text to print so they can be driven against a fake
//! [`CatalogApi`] in tests.

use crate::render::{self, SourceRow};
use crate::{Commands, ConfigAction, FilterArgs, ListArgs, SourceConfigAction};
use anyhow::{Context, bail};
use catalog_client::{CatalogApi, CatalogClient, ClientError};
use catalog_core::config::{self, ConsoleConfig};
use catalog_core::filter::{
    FilterKey, FilterOptionsCatalog, FilterStateStore, LatencyField, StringFilterKey,
};
use catalog_core::preferences::{
    self, FilePreferences, InMemoryPreferences, PreferenceStore, keys,
};
use catalog_core::query::{CatalogQuery, PageCursor, SourceLabelScope, compose};
use catalog_core::selection::SelectionSet;
use catalog_core::sort::{SortDirection, TableSortEngine};
use catalog_core::types::{
    CatalogSourceConfig, CatalogSourceConfigPatch, SourceType, source_labels,
};
use std::collections::BTreeMap;
use std::path::Path;

const NOT_READY_HINT: &str = "No catalog source selected. Pass --source ID or --label LABEL, \
or set a default with `catalog sources --prefer ID`.";

/// Handle a CLI subcommand.
pub(crate) async fn handle_command(
    command: Commands,
    workspace: &Path,
    mut config: ConsoleConfig,
    base_url: Option<String>,
) -> anyhow::Result<()> {
    if let Some(url) = base_url {
        config.api.base_url = url;
    }
    let output = match command {
        Commands::Config { action } => handle_config(action, workspace, &config)?,
        command => {
            let client = CatalogClient::from_config(&config.api)?;
            let mut prefs = open_preferences(workspace);
            run(command, &client, prefs.as_mut(), &config).await?
        }
    };
    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}

/// The user's preference file, or a session-only store when it cannot be read.
fn open_preferences(workspace: &Path) -> Box<dyn PreferenceStore> {
    let path = FilePreferences::default_path()
        .unwrap_or_else(|| workspace.join(".catalog").join("preferences.json"));
    match FilePreferences::open(path) {
        Ok(prefs) => Box::new(prefs),
        Err(e) => {
            tracing::warn!(error = %e, "Preferences unavailable, using defaults for this run");
            Box::new(InMemoryPreferences::default())
        }
    }
}

/// Run a catalog command against `api`.
pub(crate) async fn run(
    command: Commands,
    api: &dyn CatalogApi,
    prefs: &mut dyn PreferenceStore,
    config: &ConsoleConfig,
) -> anyhow::Result<String> {
    match command {
        Commands::Models {
            filter,
            list,
            source,
            label,
        } => list_models(api, prefs, config, &filter, &list, source, label).await,
        Commands::Mcp { filter, list } => list_mcp_servers(api, prefs, config, &filter, &list).await,
        Commands::FilterOptions { source, mcp } => {
            let options = if mcp {
                api.mcp_filter_options().await?
            } else {
                api.filter_options(source.as_deref()).await?
            };
            Ok(render::filter_options(&options))
        }
        Commands::Sources {
            favorite,
            prefer,
            clear_preferred,
        } => handle_sources(api, prefs, favorite, prefer, clear_preferred).await,
        Commands::SourceConfigs { action } => handle_source_configs(api, action).await,
        Commands::Config { .. } => bail!("config commands do not talk to the catalog"),
    }
}

fn handle_config(
    action: ConfigAction,
    workspace: &Path,
    config: &ConsoleConfig,
) -> anyhow::Result<String> {
    match action {
        ConfigAction::Init => {
            let config_path = config::workspace_config_path(workspace);
            if config_path.exists() {
                return Ok(format!(
                    "Configuration file already exists at: {}",
                    config_path.display()
                ));
            }
            let path = config::write_workspace_config(workspace, &ConsoleConfig::default())?;
            Ok(format!("Created default configuration at: {}", path.display()))
        }
        ConfigAction::Show => Ok(toml::to_string_pretty(config)?),
    }
}

fn parse_number(name: &str, value: &str) -> anyhow::Result<f64> {
    let number: f64 = value
        .trim()
        .parse()
        .with_context(|| format!("filter '{name}' expects a number, got '{value}'"))?;
    if !number.is_finite() {
        bail!("filter '{name}' expects a finite number, got '{value}'");
    }
    Ok(number)
}

/// Apply the filter flags to `store`. The latency field starts from config,
/// then the remembered preference, then `--latency-field`.
fn apply_filters(
    store: &mut FilterStateStore,
    args: &FilterArgs,
    prefs: &dyn PreferenceStore,
    config: &ConsoleConfig,
) -> anyhow::Result<()> {
    if store.schema().latency {
        store.select_latency_field(config.catalog.latency_field());
        store.restore_latency_field(prefs);
        if let Some(raw) = &args.latency_field {
            let field: LatencyField = raw.parse()?;
            store.select_latency_field(field);
        }
    } else if args.latency_field.is_some() || args.latency.is_some() {
        bail!("latency filters are not available here");
    }

    let mut strings: BTreeMap<StringFilterKey, Vec<String>> = BTreeMap::new();
    for raw in &args.filters {
        let (name, value) = raw
            .split_once('=')
            .with_context(|| format!("expected KEY=VALUE, got '{raw}'"))?;
        let name = name.trim();
        let key: FilterKey = name.parse()?;
        if !store.schema().contains(key) {
            let available: Vec<String> =
                store.schema().keys().iter().map(|k| k.to_string()).collect();
            bail!(
                "filter '{key}' is not available here (available: {})",
                available.join(", ")
            );
        }
        match key {
            FilterKey::Strings(k) => strings.entry(k).or_default().push(value.trim().to_string()),
            FilterKey::Number(k) => store.set_number(k, Some(parse_number(name, value)?)),
            FilterKey::Latency => store.set_latency_threshold(Some(parse_number(name, value)?)),
        }
    }
    for (key, values) in strings {
        store.set_strings(key, values);
    }
    if let Some(ms) = args.latency {
        if !ms.is_finite() {
            bail!("--latency expects a finite number of milliseconds");
        }
        store.set_latency_threshold(Some(ms));
    }
    Ok(())
}

/// Save an explicit `--latency-field` once every flag has been accepted.
fn remember_latency_field(
    store: &FilterStateStore,
    args: &FilterArgs,
    prefs: &mut dyn PreferenceStore,
) -> anyhow::Result<()> {
    if args.latency_field.is_some() {
        store.persist_latency_field(prefs)?;
    }
    Ok(())
}

fn page_cursor(list: &ListArgs, config: &ConsoleConfig) -> PageCursor {
    PageCursor {
        page_size: list.page_size.or(Some(config.catalog.page_size)),
        next_page_token: list.page_token.clone(),
    }
}

fn sorted<T: Clone>(
    engine: &mut TableSortEngine<T>,
    rows: &[T],
    list: &ListArgs,
) -> anyhow::Result<Vec<T>> {
    if let Some(field) = &list.sort {
        let index = engine.column_index(field).with_context(|| {
            let fields: Vec<&str> = engine.columns().iter().map(|c| c.field.as_str()).collect();
            format!("unknown column '{field}' (columns: {})", fields.join(", "))
        })?;
        if engine.column_sort(index).is_none() {
            bail!("column '{field}' is not sortable");
        }
        let direction = if list.desc {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };
        engine.on_sort(index, direction);
    }
    Ok(engine.transform_data(rows))
}

/// Warn about filter values outside the advertised options. The options are
/// advisory; a failure to fetch them does not fail the listing.
fn report_violations(
    options: Result<FilterOptionsCatalog, ClientError>,
    store: &FilterStateStore,
) {
    match options {
        Ok(options) => {
            for violation in options.violations(store.state()) {
                tracing::warn!(%violation, "Filter value outside the advertised options");
                eprintln!("{}", render::violation_warning(&violation));
            }
        }
        Err(e) => tracing::debug!(error = %e, "Filter options unavailable"),
    }
}

async fn list_models(
    api: &dyn CatalogApi,
    prefs: &mut dyn PreferenceStore,
    config: &ConsoleConfig,
    filter: &FilterArgs,
    list: &ListArgs,
    source: Option<String>,
    label: Option<String>,
) -> anyhow::Result<String> {
    let mut store = FilterStateStore::models();
    apply_filters(&mut store, filter, prefs, config)?;

    let scope = SourceLabelScope::from(label);
    let source = source.filter(|s| !s.is_empty()).or_else(|| {
        // A label scope replaces the default source.
        if scope == SourceLabelScope::All {
            prefs
                .get(keys::PREFERRED_SOURCE)
                .or_else(|| config.catalog.default_source.clone())
        } else {
            None
        }
    });

    let mut query = CatalogQuery::default()
        .with_search(list.search.clone().unwrap_or_default())
        .with_label(scope)
        .with_page(page_cursor(list, config));
    if let Some(source) = source {
        query = query.with_source(source);
    }

    let params = compose(store.state(), &query);
    if list.dry_run {
        return Ok(params.to_query_string());
    }
    remember_latency_field(&store, filter, prefs)?;
    if !query.has_scope() {
        return Ok(NOT_READY_HINT.to_string());
    }

    let (models, options) = futures::join!(
        api.list_models(&params),
        api.filter_options(query.source_id.as_deref())
    );
    report_violations(options, &store);
    let page = models?;

    if list.json {
        return Ok(serde_json::to_string_pretty(&page)?);
    }
    let mut engine = TableSortEngine::new(render::model_columns());
    let rows = sorted(&mut engine, &page.items, list)?;
    Ok(format!(
        "{}{}",
        render::table(&engine, &rows),
        render::page_footer("models", rows.len(), page.size, &page.next_page_token)
    ))
}

async fn list_mcp_servers(
    api: &dyn CatalogApi,
    prefs: &mut dyn PreferenceStore,
    config: &ConsoleConfig,
    filter: &FilterArgs,
    list: &ListArgs,
) -> anyhow::Result<String> {
    let mut store = FilterStateStore::mcp_servers();
    apply_filters(&mut store, filter, prefs, config)?;

    let query = CatalogQuery::default()
        .with_search(list.search.clone().unwrap_or_default())
        .with_page(page_cursor(list, config));
    let params = compose(store.state(), &query);
    if list.dry_run {
        return Ok(params.to_query_string());
    }

    let (servers, options) = futures::join!(api.list_mcp_servers(&params), api.mcp_filter_options());
    report_violations(options, &store);
    let page = servers?;

    if list.json {
        return Ok(serde_json::to_string_pretty(&page)?);
    }
    let mut engine = TableSortEngine::new(render::mcp_columns());
    let rows = sorted(&mut engine, &page.items, list)?;
    Ok(format!(
        "{}{}",
        render::table(&engine, &rows),
        render::page_footer("MCP servers", rows.len(), page.size, &page.next_page_token)
    ))
}

async fn handle_sources(
    api: &dyn CatalogApi,
    prefs: &mut dyn PreferenceStore,
    favorite: Option<String>,
    prefer: Option<String>,
    clear_preferred: bool,
) -> anyhow::Result<String> {
    let sources = api.list_sources().await?.items;
    let known = |id: &str| sources.iter().any(|s| s.id == id);
    let mut notes = Vec::new();

    if let Some(id) = favorite {
        if !known(&id) {
            bail!("unknown source '{id}'");
        }
        if preferences::toggle_favorite_source(prefs, &id)? {
            notes.push(format!("Added '{id}' to favorites."));
        } else {
            notes.push(format!("Removed '{id}' from favorites."));
        }
    }
    if let Some(id) = prefer {
        if !known(&id) {
            bail!("unknown source '{id}'");
        }
        prefs.set(keys::PREFERRED_SOURCE, &id)?;
        notes.push(format!("'{id}' is now the default source."));
    }
    if clear_preferred {
        prefs.remove(keys::PREFERRED_SOURCE)?;
        notes.push("Cleared the default source.".to_string());
    }

    let favorites = preferences::favorite_sources(prefs);
    let preferred = prefs.get(keys::PREFERRED_SOURCE);
    let labels = source_labels(&sources);
    let rows: Vec<SourceRow> = sources
        .into_iter()
        .map(|source| SourceRow {
            favorite: favorites.contains(&source.id),
            preferred: preferred.as_deref() == Some(source.id.as_str()),
            source,
        })
        .collect();

    let engine = TableSortEngine::new(render::source_columns()).with_sort(2, SortDirection::Asc);
    let rows = engine.transform_data(&rows);

    let mut out = notes;
    out.push(render::table(&engine, &rows));
    out.push(format!(
        "\nLabels: {}",
        std::iter::once("All".to_string())
            .chain(labels)
            .collect::<Vec<_>>()
            .join(", ")
    ));
    Ok(out.join("\n"))
}

async fn handle_source_configs(
    api: &dyn CatalogApi,
    action: SourceConfigAction,
) -> anyhow::Result<String> {
    match action {
        SourceConfigAction::List => {
            let configs = api.list_source_configs().await?.catalogs;
            let engine =
                TableSortEngine::new(render::source_config_columns()).with_sort(0, SortDirection::Asc);
            Ok(render::table(&engine, &engine.transform_data(&configs)))
        }
        SourceConfigAction::Show { id } => {
            let config = api.get_source_config(&id).await?;
            Ok(serde_json::to_string_pretty(&config)?)
        }
        SourceConfigAction::Create {
            id,
            name,
            source_type,
            yaml_file,
            organization,
            api_key_env,
            labels,
            disabled,
        } => {
            let source_type: SourceType = source_type.parse()?;
            let yaml = match (&source_type, yaml_file) {
                (SourceType::Yaml, Some(path)) => Some(
                    std::fs::read_to_string(&path)
                        .with_context(|| format!("reading {}", path.display()))?,
                ),
                (SourceType::Yaml, None) => bail!("yaml sources need --yaml-file"),
                (SourceType::Hf, Some(_)) => bail!("--yaml-file only applies to yaml sources"),
                (SourceType::Hf, None) => None,
            };
            let api_key = match api_key_env {
                Some(var) => Some(
                    std::env::var(&var)
                        .with_context(|| format!("environment variable {var} is not set"))?,
                ),
                None => None,
            };
            let config = CatalogSourceConfig {
                id,
                name,
                source_type,
                enabled: Some(!disabled),
                labels,
                included_models: Vec::new(),
                excluded_models: Vec::new(),
                is_default: None,
                yaml,
                allowed_organization: organization,
                api_key,
            };
            let created = api.create_source_config(&config).await?;
            Ok(format!("Created source '{}'.", created.id))
        }
        SourceConfigAction::Update {
            id,
            name,
            enable,
            disable,
            labels,
            included,
            excluded,
        } => {
            let non_empty = |v: Vec<String>| (!v.is_empty()).then_some(v);
            let patch = CatalogSourceConfigPatch {
                name,
                enabled: match (enable, disable) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                },
                labels: non_empty(labels),
                included_models: non_empty(included),
                excluded_models: non_empty(excluded),
                ..Default::default()
            };
            if patch.is_empty() {
                bail!("nothing to update");
            }
            let updated = api.update_source_config(&id, &patch).await?;
            Ok(format!("Updated source '{}'.", updated.id))
        }
        SourceConfigAction::Delete { ids, all_custom } => {
            delete_source_configs(api, ids, all_custom).await
        }
    }
}

/// Delete the named sources, or every non-default one. Default sources are
/// disabled rows in the selection and can never be picked.
async fn delete_source_configs(
    api: &dyn CatalogApi,
    ids: Vec<String>,
    all_custom: bool,
) -> anyhow::Result<String> {
    if ids.is_empty() && !all_custom {
        bail!("name the sources to delete, or pass --all-custom");
    }
    let configs = api.list_source_configs().await?.catalogs;
    let defaults: Vec<CatalogSourceConfig> =
        configs.iter().filter(|c| c.is_default()).cloned().collect();
    let mut selection = SelectionSet::new(|c: &CatalogSourceConfig| c.id.clone()).with_data(configs);
    for config in &defaults {
        selection.disable_check(config, true);
    }

    if all_custom {
        selection.toggle_header();
    } else {
        for id in &ids {
            let Some(row) = selection.data().iter().find(|c| &c.id == id).cloned() else {
                bail!("unknown source config '{id}'");
            };
            if selection.is_disabled(&row) {
                bail!("'{id}' is a default source and cannot be deleted");
            }
            selection.set_selected(&row, true);
        }
    }

    let targets: Vec<String> = selection.selected_keys().iter().cloned().collect();
    if targets.is_empty() {
        return Ok("No custom sources to delete.".to_string());
    }
    let mut out = Vec::new();
    for id in targets {
        api.delete_source_config(&id).await?;
        out.push(format!("Deleted source '{id}'."));
    }
    Ok(out.join("\n"))
}
