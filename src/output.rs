//! Rendering of command results as JSON, text tables or CSV

use crate::error::Result;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    #[default]
    Json,
    Text,
    Csv,
}

impl std::str::FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputMode::Json),
            "text" => Ok(OutputMode::Text),
            "csv" => Ok(OutputMode::Csv),
            other => Err(format!(
                "'{}' is not a valid output mode. Allowed values are json|text|csv",
                other
            )),
        }
    }
}

/// Render a command result. `default_properties` narrows object lists in the
/// text and CSV modes; JSON output is always complete.
pub fn render(value: &Value, mode: OutputMode, default_properties: &[&str]) -> Result<String> {
    if value.is_null() {
        return Ok(String::new());
    }

    match mode {
        OutputMode::Json => Ok(serde_json::to_string_pretty(value)?),
        OutputMode::Text => Ok(render_text(value, default_properties)),
        OutputMode::Csv => render_csv(value, default_properties),
    }
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Column names for a list of objects: the default properties when given,
/// otherwise keys in first-seen order
fn columns(items: &[&Map<String, Value>], default_properties: &[&str]) -> Vec<String> {
    if !default_properties.is_empty() {
        return default_properties.iter().map(|p| p.to_string()).collect();
    }

    let mut columns: Vec<String> = Vec::new();
    for item in items {
        for key in item.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

fn as_objects(items: &[Value]) -> Option<Vec<&Map<String, Value>>> {
    items.iter().map(|item| item.as_object()).collect()
}

fn render_text(value: &Value, default_properties: &[&str]) -> String {
    match value {
        Value::Array(items) if items.is_empty() => String::new(),
        Value::Array(items) => match as_objects(items) {
            Some(objects) => render_table(&objects, default_properties),
            None => items.iter().map(cell).collect::<Vec<_>>().join("\n"),
        },
        Value::Object(map) => {
            let width = map.keys().map(|k| k.len()).max().unwrap_or(0);
            map.iter()
                .map(|(key, value)| format!("{:<width$}: {}", key, cell(value), width = width))
                .collect::<Vec<_>>()
                .join("\n")
        }
        other => cell(other),
    }
}

fn render_table(objects: &[&Map<String, Value>], default_properties: &[&str]) -> String {
    let columns = columns(objects, default_properties);
    let rows: Vec<Vec<String>> = objects
        .iter()
        .map(|obj| {
            columns
                .iter()
                .map(|c| obj.get(c).map(cell).unwrap_or_default())
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            rows.iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(c.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let format_row = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<w$}", c, w = *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(format_row(columns.as_slice()));
    lines.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    lines.extend(rows.iter().map(|r| format_row(r.as_slice())));
    lines.join("\n")
}

fn render_csv(value: &Value, default_properties: &[&str]) -> Result<String> {
    let items: Vec<Value> = match value {
        Value::Array(items) => items.clone(),
        other => vec![other.clone()],
    };
    if items.is_empty() {
        return Ok(String::new());
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    match as_objects(&items) {
        Some(objects) => {
            let columns = columns(&objects, default_properties);
            writer.write_record(&columns)?;
            for obj in objects {
                writer.write_record(
                    columns
                        .iter()
                        .map(|c| obj.get(c).map(cell).unwrap_or_default()),
                )?;
            }
        }
        None => {
            for item in &items {
                writer.write_record([cell(item)])?;
            }
        }
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| crate::error::M365Error::IoError(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn messages() -> Value {
        json!([
            {"id": "MC001", "title": "Planned maintenance", "services": ["Exchange Online"]},
            {"id": "MC002", "title": "New feature", "services": ["Microsoft Teams"]}
        ])
    }

    #[test]
    fn test_json_is_pretty_and_complete() {
        let out = render(&messages(), OutputMode::Json, &["id"]).unwrap();
        assert!(out.contains("\"services\""));
        assert!(out.contains('\n'));
    }

    #[test]
    fn test_text_table_uses_default_properties() {
        let out = render(&messages(), OutputMode::Text, &["id", "title"]).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "id     title");
        assert_eq!(lines[1], "-----  -------------------");
        assert_eq!(lines[2], "MC001  Planned maintenance");
        assert!(!out.contains("Exchange Online"));
    }

    #[test]
    fn test_text_object_as_key_value_lines() {
        let value = json!({"Name": "Document", "Hidden": false});
        let out = render(&value, OutputMode::Text, &[]).unwrap();
        // keys come out sorted
        assert_eq!(out, "Hidden: false\nName  : Document");
    }

    #[test]
    fn test_csv_quotes_nested_values() {
        let out = render(&messages(), OutputMode::Csv, &["id", "services"]).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "id,services");
        assert_eq!(lines[1], "MC001,\"[\"\"Exchange Online\"\"]\"");
    }

    #[test]
    fn test_empty_results_render_nothing() {
        assert_eq!(render(&json!([]), OutputMode::Text, &[]).unwrap(), "");
        assert_eq!(render(&json!([]), OutputMode::Csv, &[]).unwrap(), "");
        assert_eq!(render(&Value::Null, OutputMode::Json, &[]).unwrap(), "");
    }

    #[test]
    fn test_output_mode_from_str() {
        assert_eq!("TEXT".parse::<OutputMode>().unwrap(), OutputMode::Text);
        assert!("xml".parse::<OutputMode>().is_err());
    }
}
