use crate::config::config::LoadingConfig;
use crate::data::datatable::{DataColumn, DataRow, DataTable, DataType, DataValue};
use anyhow::{anyhow, bail, Context, Result};
use csv::ReaderBuilder;
use serde_json::Value as JsonValue;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info};

/// Load a CSV, TSV or JSON file, picking the format from its extension
pub fn load_file<P: AsRef<Path>>(path: P, options: &LoadingConfig) -> Result<DataTable> {
    let path = path.as_ref();
    let table_name = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "table".to_string());
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "json" => load_json_to_datatable(path, &table_name, options.infer_types),
        "tsv" | "tab" | "txt" => {
            let delimiter = options.delimiter.unwrap_or('\t');
            load_csv_to_datatable(path, &table_name, delimiter, options.infer_types)
        }
        _ => {
            let delimiter = options.delimiter.unwrap_or(',');
            load_csv_to_datatable(path, &table_name, delimiter, options.infer_types)
        }
    }
}

/// Load a delimited text file into a DataTable
pub fn load_csv_to_datatable<P: AsRef<Path>>(
    path: P,
    table_name: &str,
    delimiter: char,
    infer_types: bool,
) -> Result<DataTable> {
    let path = path.as_ref();
    info!("Loading {} into DataTable '{}'", path.display(), table_name);

    if !delimiter.is_ascii() {
        bail!("Delimiter {:?} must be a single ASCII character", delimiter);
    }

    let file = File::open(path)
        .with_context(|| format!("Failed to open delimited file: {}", path.display()))?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter as u8)
        .from_reader(file);

    let headers = reader.headers()?.clone();
    let mut table = DataTable::new(table_name);

    for header in headers.iter() {
        table.add_column(DataColumn::new(header));
    }

    let mut string_rows = Vec::new();
    for (line, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Malformed record {}", line + 1))?;
        string_rows.push(record.iter().map(|s| s.to_string()).collect::<Vec<_>>());
    }

    fill_table(&mut table, string_rows, infer_types)?;

    info!(
        "Loaded '{}': {} rows, {} columns",
        table.name,
        table.row_count(),
        table.column_count()
    );
    Ok(table)
}

/// Load a JSON file holding an array of objects into a DataTable
pub fn load_json_to_datatable<P: AsRef<Path>>(
    path: P,
    table_name: &str,
    infer_types: bool,
) -> Result<DataTable> {
    let path = path.as_ref();
    info!("Loading {} into DataTable '{}'", path.display(), table_name);

    let file = File::open(path)
        .with_context(|| format!("Failed to open JSON file: {}", path.display()))?;
    let reader = BufReader::new(file);

    let json_data: Vec<JsonValue> = serde_json::from_reader(reader)
        .with_context(|| format!("{} must hold a JSON array", path.display()))?;

    load_json_data_to_datatable(json_data, table_name, infer_types)
}

/// Build a DataTable from already parsed JSON objects.
///
/// Columns are the union of all object keys in order of first appearance.
pub fn load_json_data_to_datatable(
    data: Vec<JsonValue>,
    table_name: &str,
    infer_types: bool,
) -> Result<DataTable> {
    let mut table = DataTable::new(table_name);

    let mut column_names: Vec<String> = Vec::new();
    for (idx, item) in data.iter().enumerate() {
        let obj = item
            .as_object()
            .ok_or_else(|| anyhow!("JSON element {} is not an object", idx))?;
        for key in obj.keys() {
            if !column_names.contains(key) {
                column_names.push(key.clone());
            }
        }
    }

    for name in &column_names {
        table.add_column(DataColumn::new(name));
    }

    let string_rows: Vec<Vec<String>> = data
        .iter()
        .filter_map(|item| item.as_object())
        .map(|obj| {
            column_names
                .iter()
                .map(|name| match obj.get(name) {
                    Some(JsonValue::Null) | None => String::new(),
                    Some(JsonValue::Bool(b)) => b.to_string(),
                    Some(JsonValue::Number(n)) => n.to_string(),
                    Some(JsonValue::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                })
                .collect()
        })
        .collect();

    fill_table(&mut table, string_rows, infer_types)?;
    Ok(table)
}

fn fill_table(
    table: &mut DataTable,
    string_rows: Vec<Vec<String>>,
    infer_types: bool,
) -> Result<()> {
    let column_count = table.column_count();
    let mut column_types = vec![DataType::Null; column_count];

    if infer_types {
        // Sample first 100 rows for type inference
        for row in string_rows.iter().take(100) {
            for (col_idx, value) in row.iter().enumerate().take(column_count) {
                if !value.is_empty() {
                    let inferred = DataType::infer_from_string(value);
                    column_types[col_idx] = column_types[col_idx].merge(&inferred);
                }
            }
        }
    } else {
        column_types = vec![DataType::String; column_count];
    }
    debug!("Column types for '{}': {:?}", table.name, column_types);

    for (line, string_row) in string_rows.into_iter().enumerate() {
        let values = string_row
            .iter()
            .zip(column_types.iter())
            .map(|(value, data_type)| DataValue::from_string(value, data_type))
            .collect::<Vec<_>>();
        if string_row.len() != column_count {
            bail!(
                "Row {} of '{}' has {} fields, expected {}",
                line + 1,
                table.name,
                string_row.len(),
                column_count
            );
        }
        table
            .add_row(DataRow::new(values))
            .map_err(|e| anyhow!(e))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn value_by_name(table: &DataTable, row: usize, name: &str) -> Option<DataValue> {
        let col = table.get_column_index(name)?;
        table.get_value(row, col).cloned()
    }

    fn temp_file(suffix: &str, contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        write!(file, "{}", contents).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_csv() -> Result<()> {
        let file = temp_file(".csv", "id,name,score\n1,Alice,1.50\n2,Bob,\n");
        let table = load_csv_to_datatable(file.path(), "people", ',', true)?;

        assert_eq!(table.column_names(), vec!["id", "name", "score"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.get_value(0, 0), Some(&DataValue::Integer(1)));
        assert_eq!(table.get_value(0, 2).unwrap().to_string(), "1.50");
        assert_eq!(table.get_value(1, 2), Some(&DataValue::Null));
        Ok(())
    }

    #[test]
    fn test_load_file_picks_tab_for_tsv() -> Result<()> {
        let file = temp_file(".tsv", "otu\tsize\tphylum\nOtu001\t120\tFirmicutes\n");
        let table = load_file(file.path(), &LoadingConfig::default())?;
        assert_eq!(table.column_count(), 3);
        assert_eq!(
            value_by_name(&table, 0, "phylum").unwrap().to_string(),
            "Firmicutes"
        );
        Ok(())
    }

    #[test]
    fn test_without_inference_everything_is_text() -> Result<()> {
        let file = temp_file(".csv", "n\n007\n");
        let table = load_csv_to_datatable(file.path(), "t", ',', false)?;
        assert_eq!(
            table.get_value(0, 0),
            Some(&DataValue::String("007".to_string()))
        );
        Ok(())
    }

    #[test]
    fn test_ragged_csv_is_an_error() {
        let file = temp_file(".csv", "a,b\n1,2\n3\n");
        assert!(load_csv_to_datatable(file.path(), "t", ',', true).is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = load_file("/nonexistent/data.csv", &LoadingConfig::default()).unwrap_err();
        assert!(err.to_string().contains("Failed to open"));
    }

    #[test]
    fn test_load_json_data_union_of_keys() -> Result<()> {
        let data = vec![
            json!({"id": 1, "name": "Alice"}),
            json!({"id": 2, "extra": true}),
        ];
        let table = load_json_data_to_datatable(data, "j", true)?;
        assert_eq!(table.column_count(), 3);
        assert_eq!(table.column_names(), vec!["id", "name", "extra"]);
        assert_eq!(value_by_name(&table, 0, "extra"), Some(DataValue::Null));
        assert_eq!(value_by_name(&table, 1, "name"), Some(DataValue::Null));
        Ok(())
    }

    #[test]
    fn test_load_json_rejects_non_objects() {
        let data = vec![json!(1), json!(2)];
        assert!(load_json_data_to_datatable(data, "j", true).is_err());
    }

    #[test]
    fn test_load_json_file() -> Result<()> {
        let file = temp_file(".json", r#"[{"a": "x.y"}, {"a": null}]"#);
        let table = load_file(file.path(), &LoadingConfig::default())?;
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column_display_values(0), vec!["x.y", ""]);
        Ok(())
    }
}
