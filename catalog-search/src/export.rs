//! CSV export of the catalog.
//!
//! Renders exported documents as `name,description,keywords` rows.

use csv::Writer;
use serde_json::Value;

use crate::ServiceError;

/// Header row of the exported file.
pub const CSV_HEADER: [&str; 3] = ["name", "description", "keywords"];

/// Separator placed between keywords inside the `keywords` column.
pub const KEYWORD_SEPARATOR: &str = "; ";

/// Render documents as CSV bytes, one row per document, header first.
pub fn write_csv(rows: &[Value]) -> Result<Vec<u8>, ServiceError> {
    let mut writer = Writer::from_writer(Vec::new());

    writer
        .write_record(CSV_HEADER)
        .map_err(|e| ServiceError::export(format!("Failed to write CSV header: {}", e)))?;

    for row in rows {
        let record = [
            cell(row.get("name")),
            cell(row.get("description")),
            keywords(row.get("keywords")),
        ];
        writer
            .write_record(&record)
            .map_err(|e| ServiceError::export(format!("Failed to write CSV row: {}", e)))?;
    }

    writer
        .into_inner()
        .map_err(|e| ServiceError::export(format!("Failed to flush CSV output: {}", e)))
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

fn keywords(value: Option<&Value>) -> String {
    match value {
        Some(Value::Array(values)) => values
            .iter()
            .map(|value| cell(Some(value)))
            .collect::<Vec<_>>()
            .join(KEYWORD_SEPARATOR),
        other => cell(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(rows: &[Value]) -> String {
        String::from_utf8(write_csv(rows).unwrap()).unwrap()
    }

    #[test]
    fn test_header_only_for_empty_catalog() {
        assert_eq!(render(&[]), "name,description,keywords\n");
    }

    #[test]
    fn test_rows_and_keyword_join() {
        let csv = render(&[
            json!({ "name": "Soil moisture", "description": "Daily readings", "keywords": ["soil", "water"] }),
            json!({ "name": "Gauge", "keywords": "single" }),
        ]);

        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[1], "Soil moisture,Daily readings,soil; water");
        assert_eq!(lines[2], "Gauge,,single");
    }

    #[test]
    fn test_fields_needing_quotes() {
        let csv = render(&[json!({ "name": "Rain, snow", "description": "He said \"wet\"" })]);

        assert_eq!(
            csv.lines().nth(1).unwrap(),
            "\"Rain, snow\",\"He said \"\"wet\"\"\","
        );
    }
}
