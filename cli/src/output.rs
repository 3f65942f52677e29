use anyhow::Result;
use colored::Colorize;
use comfy_table::{
    modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS},
    presets::UTF8_FULL,
    Cell, Color, Table,
};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::OutputFormat;

pub fn print_value(value: &Value, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            match build_table(value) {
                Some(table) => println!("{table}"),
                None => println!("{}", scalar(value)),
            }
            Ok(())
        }
        OutputFormat::Json => print_json(value),
    }
}

/// Shows a notification on stderr. Installed as the client's notifier.
pub fn notify(message: &str) {
    eprintln!("{} {}", "Error:".red().bold(), message);
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS);
    table
}

fn header(name: &str) -> Cell {
    Cell::new(name.to_uppercase()).fg(Color::Blue)
}

fn build_table(value: &Value) -> Option<Table> {
    match value {
        Value::Array(rows) if !rows.is_empty() && rows.iter().all(Value::is_object) => {
            let columns = columns(rows);
            let mut table = new_table();
            table.set_header(columns.iter().map(|c| header(c)).collect::<Vec<_>>());
            for row in rows {
                let row = row.as_object();
                let cells = columns.iter().map(|c| {
                    Cell::new(row.and_then(|r| r.get(c)).map(scalar).unwrap_or_default())
                });
                table.add_row(cells.collect::<Vec<_>>());
            }
            Some(table)
        }
        Value::Array(items) if !items.is_empty() => {
            let mut table = new_table();
            table.set_header(vec![header("value")]);
            for item in items {
                table.add_row(vec![Cell::new(scalar(item))]);
            }
            Some(table)
        }
        Value::Object(fields) => Some(key_value_table(fields)),
        _ => None,
    }
}

fn key_value_table(fields: &Map<String, Value>) -> Table {
    let mut table = new_table();
    table.set_header(vec![header("key"), header("value")]);
    for (key, value) in fields {
        table.add_row(vec![Cell::new(key), Cell::new(scalar(value))]);
    }
    table
}

// column order follows first appearance across rows
fn columns(rows: &[Value]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for row in rows.iter().filter_map(Value::as_object) {
        for key in row.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

fn scalar(value: &Value) -> String {
    match value {
        Value::Null => "".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn print_json<T: Serialize>(data: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(data)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn columns_keep_first_seen_order() {
        let rows = vec![json!({ "id": 1, "title": "a" }), json!({ "id": 2, "score": 90 })];
        assert_eq!(columns(&rows), vec!["id", "title", "score"]);
    }

    #[test]
    fn scalars_render_without_quotes() {
        assert_eq!(scalar(&json!("Frieren")), "Frieren");
        assert_eq!(scalar(&json!(9.5)), "9.5");
        assert_eq!(scalar(&Value::Null), "");
        assert_eq!(scalar(&json!([1, 2])), "[1,2]");
    }

    #[test]
    fn tables_only_for_collections() {
        assert!(build_table(&json!([{ "id": 1 }])).is_some());
        assert!(build_table(&json!({ "id": 1 })).is_some());
        assert!(build_table(&json!([])).is_none());
        assert!(build_table(&json!("done")).is_none());
    }
}
