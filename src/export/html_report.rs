//! Standalone HTML report with a working filter dropdown in every header
//!
//! The page hands the rows to the DataTables jQuery plugin. That widget can
//! only filter a column by pattern, so each selection is sent as an anchored,
//! escaped literal with the plugin's smart search and case folding switched
//! off.

use crate::config::config::HtmlConfig;
use crate::data::data_provider::FilterableView;
use crate::filter::controller::ColumnFilterController;
use crate::filter::options::FilterOption;
use crate::filter::pattern::search_pattern;
use anyhow::{bail, Context as _, Result};
use serde::Serialize;
use serde_json::{json, Value as JsonValue};
use std::path::Path;
use tera::{Context, Tera};
use tracing::info;

const REPORT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{{ title }}</title>
<link rel="stylesheet" type="text/css" href="{{ datatables_css }}">
<script type="text/javascript" src="{{ jquery_js }}"></script>
<script type="text/javascript" src="{{ datatables_js }}"></script>
<style>
thead select { width: 100%; margin-top: 4px; }
</style>
</head>
<body>
{% for table in tables %}
<h2>{{ table.name }}</h2>
<table id="{{ table.id }}" class="{{ table_class }}">
<thead>
<tr>
{% for header in table.headers %}<th>{{ header.label }}<br><select class="column-filter" data-column="{{ header.column }}">
{% for option in header.options %}<option value="{{ option.value }}"{% if option.selected %} selected="selected"{% endif %}>{{ option.label }}</option>
{% endfor %}</select></th>
{% endfor %}</tr>
</thead>
<tbody>
{% for row in table.rows %}<tr>{% for cell in row %}<td>{{ cell }}</td>{% endfor %}</tr>
{% endfor %}</tbody>
</table>
{% endfor %}
<script type="text/javascript">
$(document).ready(function() {
{% for table in tables %}
    (function() {
        var table = $('#{{ table.id }}').DataTable({
            scrollX: {{ scroll_x }},
            orderCellsTop: true,
            lengthMenu: {{ length_menu | safe }},
            searchCols: {{ table.search_cols | safe }}
        });
        $(table.table().container()).find('select.column-filter')
            .on('click', function(e) { e.stopPropagation(); })
            .on('change', function() {
                var val = $(this).val();
                var pattern = val ? '^' + $.fn.dataTable.util.escapeRegex(val) + '$' : '';
                table.column($(this).data('column')).search(pattern, true, false, false).draw();
            });
    })();
{% endfor %}
});
</script>
</body>
</html>
"#;

#[derive(Debug, Serialize)]
struct HeaderContext {
    column: usize,
    label: String,
    options: Vec<FilterOption>,
}

#[derive(Debug, Serialize)]
struct TableContext {
    id: String,
    name: String,
    headers: Vec<HeaderContext>,
    rows: Vec<Vec<String>>,
    search_cols: String,
}

/// JSON for an inline `<script>`; `</` must not close the element early
fn script_json(value: &JsonValue) -> Result<String> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

/// Initial per-column search state: null or an anchored literal pattern
fn search_cols<V: FilterableView + ?Sized>(view: &V) -> Result<JsonValue> {
    let columns = (0..view.get_column_count())
        .map(|column| {
            let pattern = search_pattern(&view.column_filter(column))?;
            Ok(if pattern.is_empty() {
                JsonValue::Null
            } else {
                json!({
                    "search": pattern,
                    "regex": true,
                    "smart": false,
                    "caseInsensitive": false
                })
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(JsonValue::Array(columns))
}

/// DataTables wants `[[values], [labels]]` with -1 shown as "All"
fn length_menu(config: &HtmlConfig) -> JsonValue {
    let labels: Vec<JsonValue> = config
        .length_menu
        .iter()
        .map(|n| if *n < 0 { json!("All") } else { json!(n) })
        .collect();
    json!([config.length_menu, labels])
}

/// All rows of the source, ignoring filters; the page filters client side
fn all_rows<V: FilterableView + ?Sized>(view: &V) -> Vec<Vec<String>> {
    let columns: Vec<Vec<String>> = (0..view.get_column_count())
        .map(|column| view.column_display_values(column))
        .collect();
    let row_count = columns.first().map(|c| c.len()).unwrap_or(0);
    (0..row_count)
        .map(|row| {
            columns
                .iter()
                .map(|values| values.get(row).cloned().unwrap_or_default())
                .collect()
        })
        .collect()
}

fn table_context<V: FilterableView + ?Sized>(
    index: usize,
    view: &V,
    controller: &ColumnFilterController,
    name: String,
) -> Result<TableContext> {
    let headers = controller
        .controls()
        .iter()
        .map(|control| HeaderContext {
            column: control.column,
            label: control.header.clone(),
            options: control.options.clone(),
        })
        .collect();

    Ok(TableContext {
        id: format!("table-filter-{}", index),
        name,
        headers,
        rows: all_rows(view),
        search_cols: script_json(&search_cols(view)?)?,
    })
}

/// Render every table with its initialized controller into one HTML page.
///
/// `tables[i]` pairs with `controllers[i]`; `names[i]` titles the table.
pub fn render_html<V: FilterableView>(
    tables: &[V],
    controllers: &[ColumnFilterController],
    names: &[String],
    config: &HtmlConfig,
) -> Result<String> {
    if tables.len() != controllers.len() {
        bail!(
            "{} tables but {} filter controllers",
            tables.len(),
            controllers.len()
        );
    }

    let tables_ctx = tables
        .iter()
        .zip(controllers)
        .enumerate()
        .map(|(index, (view, controller))| {
            let name = names
                .get(index)
                .cloned()
                .unwrap_or_else(|| format!("Table {}", index + 1));
            table_context(index, view, controller, name)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut tera = Tera::default();
    // The .html name turns on autoescaping
    tera.add_raw_template("report.html", REPORT_TEMPLATE)
        .context("Invalid report template")?;

    let mut context = Context::new();
    context.insert("title", &names.join(", "));
    context.insert("table_class", &config.table_class);
    context.insert("datatables_css", &config.datatables_css);
    context.insert("datatables_js", &config.datatables_js);
    context.insert("jquery_js", &config.jquery_js);
    context.insert("scroll_x", &config.scroll_x);
    context.insert("length_menu", &script_json(&length_menu(config))?);
    context.insert("tables", &tables_ctx);

    tera.render("report.html", &context)
        .context("Failed to render HTML report")
}

/// Render and write the report to `path`
pub fn write_html_report<V: FilterableView>(
    path: &Path,
    tables: &[V],
    controllers: &[ColumnFilterController],
    names: &[String],
    config: &HtmlConfig,
) -> Result<()> {
    let html = render_html(tables, controllers, names, config)?;
    std::fs::write(path, html)
        .with_context(|| format!("Failed to write HTML report {}", path.display()))?;
    info!("Wrote HTML report for {} tables to {}", tables.len(), path.display());
    Ok(())
}
