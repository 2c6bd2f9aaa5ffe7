//! Plain-text rendering of catalog tables and filter options.

use catalog_core::filter::{FilterOption, FilterOptionsCatalog, FilterViolation};
use catalog_core::sort::{CellValue, SortDirection, SortableColumn, TableSortEngine};
use catalog_core::types::{CatalogModel, CatalogSource, CatalogSourceConfig, McpServer, SourceType};
use chrono::{DateTime, Utc};

const NO_RESULTS: &str = "No results.";

fn date_cell(time: Option<DateTime<Utc>>) -> CellValue {
    time.map_or(CellValue::Empty, |t| CellValue::text(t.format("%Y-%m-%d").to_string()))
}

fn list_cell(values: &[String]) -> CellValue {
    if values.is_empty() {
        CellValue::Empty
    } else {
        CellValue::text(values.join(", "))
    }
}

pub fn model_columns() -> Vec<SortableColumn<CatalogModel>> {
    vec![
        SortableColumn::new("Name", "name", |m: &CatalogModel| CellValue::text(m.name.clone()))
            .sortable(),
        SortableColumn::new("Provider", "provider", |m: &CatalogModel| {
            CellValue::opt_text(m.provider.as_deref())
        })
        .sortable(),
        SortableColumn::new("License", "license", |m: &CatalogModel| {
            CellValue::opt_text(m.license.as_deref())
        })
        .sortable(),
        SortableColumn::new("Tasks", "tasks", |m: &CatalogModel| list_cell(&m.tasks)),
        SortableColumn::new("Source", "source", |m: &CatalogModel| {
            CellValue::opt_text(m.source_id.as_deref())
        }),
        SortableColumn::new("Updated", "updated", |m: &CatalogModel| date_cell(m.last_updated()))
            .sort_with(|a, b| a.last_updated().cmp(&b.last_updated()))
            .default_direction(SortDirection::Desc),
    ]
}

pub fn mcp_columns() -> Vec<SortableColumn<McpServer>> {
    vec![
        SortableColumn::new("Name", "name", |s: &McpServer| CellValue::text(s.name.clone()))
            .sortable(),
        SortableColumn::new("Provider", "provider", |s: &McpServer| {
            CellValue::opt_text(s.provider.as_deref())
        })
        .sortable(),
        SortableColumn::new("License", "license", |s: &McpServer| {
            CellValue::opt_text(s.license.as_deref())
        })
        .sortable(),
        SortableColumn::new("Transports", "transports", |s: &McpServer| list_cell(&s.transports)),
        SortableColumn::new("Deployment", "deployment_mode", |s: &McpServer| {
            CellValue::opt_text(s.deployment_mode.as_deref())
        })
        .sortable(),
        SortableColumn::new("Version", "version", |s: &McpServer| {
            CellValue::opt_text(s.version.as_deref())
        }),
        SortableColumn::new("Updated", "updated", |s: &McpServer| date_cell(s.last_updated()))
            .sort_with(|a, b| a.last_updated().cmp(&b.last_updated()))
            .default_direction(SortDirection::Desc),
    ]
}

/// A source row with the user's markers.
#[derive(Debug, Clone)]
pub struct SourceRow {
    pub source: CatalogSource,
    pub favorite: bool,
    pub preferred: bool,
}

pub fn source_columns() -> Vec<SortableColumn<SourceRow>> {
    vec![
        SortableColumn::new("", "marker", |r: &SourceRow| {
            let marker = match (r.preferred, r.favorite) {
                (true, true) => "*>",
                (true, false) => ">",
                (false, true) => "*",
                (false, false) => "",
            };
            CellValue::text(marker)
        }),
        SortableColumn::new("Id", "id", |r: &SourceRow| CellValue::text(r.source.id.clone()))
            .sortable(),
        SortableColumn::new("Name", "name", |r: &SourceRow| {
            CellValue::text(r.source.name.clone())
        })
        .sortable(),
        SortableColumn::new("Labels", "labels", |r: &SourceRow| list_cell(&r.source.labels)),
        SortableColumn::new("Status", "status", |r: &SourceRow| {
            let status = match (&r.source.error, r.source.is_enabled()) {
                (Some(error), _) => format!("error: {error}"),
                (None, false) => "disabled".to_string(),
                (None, true) => r.source.status.clone().unwrap_or_else(|| "available".to_string()),
            };
            CellValue::text(status)
        }),
    ]
}

pub fn source_config_columns() -> Vec<SortableColumn<CatalogSourceConfig>> {
    vec![
        SortableColumn::new("Id", "id", |c: &CatalogSourceConfig| CellValue::text(c.id.clone()))
            .sortable(),
        SortableColumn::new("Name", "name", |c: &CatalogSourceConfig| {
            CellValue::text(c.name.clone())
        })
        .sortable(),
        SortableColumn::new("Type", "type", |c: &CatalogSourceConfig| {
            CellValue::text(match c.source_type {
                SourceType::Yaml => "yaml",
                SourceType::Hf => "hf",
            })
        }),
        SortableColumn::new("Enabled", "enabled", |c: &CatalogSourceConfig| {
            CellValue::text(if c.enabled.unwrap_or(true) { "yes" } else { "no" })
        }),
        SortableColumn::new("Default", "default", |c: &CatalogSourceConfig| {
            CellValue::text(if c.is_default() { "yes" } else { "" })
        }),
        SortableColumn::new("Labels", "labels", |c: &CatalogSourceConfig| list_cell(&c.labels)),
    ]
}

fn header(active: Option<(usize, SortDirection)>, index: usize, label: &str) -> String {
    match active {
        Some((active, SortDirection::Asc)) if active == index => format!("{label} ↑"),
        Some((active, SortDirection::Desc)) if active == index => format!("{label} ↓"),
        _ => label.to_string(),
    }
}

/// Render `rows` (already in display order) under the engine's columns.
/// The active sort column is marked in the header.
pub fn table<T>(engine: &TableSortEngine<T>, rows: &[T]) -> String {
    if rows.is_empty() {
        return NO_RESULTS.to_string();
    }
    let active = engine.active().map(|a| (a.index, a.direction));
    let columns = engine.columns();
    let headers: Vec<String> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| header(active, i, &c.label))
        .collect();
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| columns.iter().map(|c| c.cell(row).to_string()).collect())
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |values: &[String]| {
        values
            .iter()
            .zip(&widths)
            .map(|(v, &w)| format!("{v:<w$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = vec![line(&headers)];
    out.push(line(&widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>()));
    out.extend(cells.iter().map(|row| line(row)));
    out.join("\n")
}

pub fn page_footer(noun: &str, shown: usize, total: u64, next_page_token: &str) -> String {
    let mut footer = format!("\nShowing {shown} of {total} {noun}.");
    if !next_page_token.is_empty() {
        footer.push_str(&format!(" Next page: --page-token {next_page_token}"));
    }
    footer
}

pub fn filter_options(options: &FilterOptionsCatalog) -> String {
    if options.is_empty() {
        return "No filter options reported.".to_string();
    }
    let width = options.filters.keys().map(|k| k.len()).max().unwrap_or(0);
    options
        .filters
        .iter()
        .map(|(param, option)| {
            let domain = match option {
                FilterOption::String { values } if values.is_empty() => "(none)".to_string(),
                FilterOption::String { values } => values.join(", "),
                FilterOption::Number { range } => format!("{} .. {}", range.min, range.max),
            };
            format!("{param:<width$}  {domain}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn violation_warning(violation: &FilterViolation) -> String {
    format!("warning: {violation}; the filter is sent as given")
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_core::filter::NumberRange;
    use pretty_assertions::assert_eq;

    fn model(name: &str, provider: Option<&str>, updated: Option<&str>) -> CatalogModel {
        CatalogModel {
            name: name.into(),
            provider: provider.map(String::from),
            source_id: Some("hf".into()),
            tasks: vec!["text-generation".into()],
            last_update_time_since_epoch: updated.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_table_layout() {
        let engine = TableSortEngine::new(model_columns()).with_sort(0, SortDirection::Asc);
        let rows = vec![
            model("granite", Some("IBM"), Some("1735689600000")),
            model("phi", None, None),
        ];
        let out = table(&engine, &rows);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines[0],
            "Name ↑   Provider  License  Tasks            Source  Updated"
        );
        assert!(lines[1].starts_with("-------  --------"));
        assert_eq!(
            lines[2],
            "granite  IBM       -        text-generation  hf      2025-01-01"
        );
        assert_eq!(lines[3], "phi      -         -        text-generation  hf      -");
    }

    #[test]
    fn test_updated_column_sorts_by_time() {
        let mut engine = TableSortEngine::new(model_columns());
        let updated = engine.column_index("updated").unwrap();
        engine.toggle(updated);
        let rows = vec![
            model("old", None, Some("1600000000000")),
            model("none", None, None),
            model("new", None, Some("1700000000000")),
        ];
        let names: Vec<String> = engine
            .transform_data(&rows)
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["new", "old", "none"]);
    }

    #[test]
    fn test_empty_table() {
        let engine = TableSortEngine::new(mcp_columns());
        assert_eq!(table(&engine, &[]), NO_RESULTS);
    }

    #[test]
    fn test_source_markers_and_status() {
        let engine = TableSortEngine::new(source_columns());
        let rows = vec![
            SourceRow {
                source: CatalogSource {
                    id: "hf".into(),
                    name: "Hugging Face".into(),
                    enabled: Some(false),
                    ..Default::default()
                },
                favorite: true,
                preferred: true,
            },
            SourceRow {
                source: CatalogSource {
                    id: "broken".into(),
                    name: "Broken".into(),
                    error: Some("yaml parse failed".into()),
                    ..Default::default()
                },
                favorite: false,
                preferred: false,
            },
        ];
        let out = table(&engine, &rows);
        assert!(out.contains("*>  hf"));
        assert!(out.contains("disabled"));
        assert!(out.contains("error: yaml parse failed"));
    }

    #[test]
    fn test_filter_options_listing() {
        let mut options = FilterOptionsCatalog::default();
        options.filters.insert(
            "provider".into(),
            FilterOption::String {
                values: vec!["IBM".into(), "Meta".into()],
            },
        );
        options.filters.insert(
            "max_latency".into(),
            FilterOption::Number {
                range: NumberRange { min: 0.0, max: 1000.0 },
            },
        );
        assert_eq!(
            filter_options(&options),
            "max_latency  0 .. 1000\nprovider     IBM, Meta"
        );
        assert_eq!(
            filter_options(&FilterOptionsCatalog::default()),
            "No filter options reported."
        );
    }

    #[test]
    fn test_page_footer() {
        assert_eq!(page_footer("models", 2, 2, ""), "\nShowing 2 of 2 models.");
        assert_eq!(
            page_footer("models", 10, 42, "abc"),
            "\nShowing 10 of 42 models. Next page: --page-token abc"
        );
    }
}
