use crate::domain::model::{GroupKey, OutputGroup, ParsedRecord};
use crate::utils::error::{EtlError, Result};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use serde_json::Value;
use std::collections::HashSet;

pub const DEFAULT_DELIMITER: u8 = b',';
pub const ESCAPE_CHAR: u8 = b'\\';

/// Serialises one output group to quoted CSV.
///
/// Every field is quoted. Quotes inside a field are escaped with a
/// backslash instead of being doubled, and backslashes are escaped too, so
/// a reader using the same settings gets the original text back.
#[derive(Debug, Clone)]
pub struct GroupWriter {
    delimiter: u8,
}

impl GroupWriter {
    pub fn new() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
        }
    }

    /// Every column seen in the group, in order of first appearance.
    pub fn header(group: &OutputGroup) -> Vec<String> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut header = Vec::new();
        for record in &group.records {
            for column in record.column_names() {
                if seen.insert(column) {
                    header.push(column.to_string());
                }
            }
        }
        header
    }

    pub fn render(&self, group: &OutputGroup) -> Result<Vec<u8>> {
        let header = Self::header(group);
        let mut writer = WriterBuilder::new()
            .delimiter(self.delimiter)
            .quote_style(QuoteStyle::Always)
            .double_quote(false)
            .escape(ESCAPE_CHAR)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        writer.write_record(header.iter().map(|column| escape_backslashes(column)))?;
        for record in &group.records {
            writer.write_record(row(&header, record))?;
        }

        writer
            .into_inner()
            .map_err(|e| EtlError::IoError(e.into_error()))
    }

    /// `<prefix>-<response_type>-<activity>.csv`, with unsafe characters replaced.
    pub fn file_name(prefix: &str, key: &GroupKey) -> String {
        let group: String = key
            .to_string()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        format!("{prefix}-{group}.csv")
    }
}

impl Default for GroupWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn row(header: &[String], record: &ParsedRecord) -> Vec<String> {
    header
        .iter()
        .map(|column| render_cell(record.get(column).unwrap_or(&Value::Null)))
        .collect()
}

fn escape_backslashes(text: &str) -> String {
    text.replace('\\', "\\\\")
}

/// Text for one cell. Null becomes an empty field.
pub fn render_cell(value: &Value) -> String {
    let text = match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    };
    escape_backslashes(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ResponseType;
    use csv::ReaderBuilder;
    use serde_json::json;

    fn record(columns: &[(&str, Value)]) -> ParsedRecord {
        let mut record = ParsedRecord::new();
        for (name, value) in columns {
            record.set(*name, value.clone());
        }
        record
    }

    fn group(records: Vec<ParsedRecord>) -> OutputGroup {
        let mut group = OutputGroup::new(GroupKey::new(ResponseType::Task, "at_tapping"));
        group.records = records;
        group
    }

    fn read_back(bytes: &[u8]) -> Vec<Vec<String>> {
        ReaderBuilder::new()
            .has_headers(false)
            .double_quote(false)
            .escape(Some(ESCAPE_CHAR))
            .from_reader(bytes)
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn test_render_quotes_every_field() {
        let group = group(vec![record(&[
            ("id", json!(1)),
            ("activity", json!("at_tapping")),
            ("Missing_data", json!(0)),
            ("timezone", Value::Null),
        ])]);

        let output = String::from_utf8(GroupWriter::new().render(&group).unwrap()).unwrap();
        assert_eq!(
            output,
            "\"id\",\"activity\",\"Missing_data\",\"timezone\"\n\"1\",\"at_tapping\",\"0\",\"\"\n"
        );
    }

    #[test]
    fn test_quote_is_escaped_not_doubled() {
        let group = group(vec![record(&[("answer", json!("say \"hi\""))])]);
        let output = String::from_utf8(GroupWriter::new().render(&group).unwrap()).unwrap();
        assert!(output.contains(r#""say \"hi\"""#));
        assert!(!output.contains("\"\"hi"));
    }

    #[test]
    fn test_values_round_trip() {
        let awkward = [
            "plain",
            "comma, inside",
            "quote \" inside",
            "back\\slash",
            "trailing backslash\\",
            "line\nbreak",
            "\\\"mixed\\\"",
        ];
        let records = awkward
            .iter()
            .map(|text| record(&[("value", json!(text))]))
            .collect();

        let bytes = GroupWriter::new().render(&group(records)).unwrap();
        let rows = read_back(&bytes);

        assert_eq!(rows[0], vec!["value"]);
        for (row, expected) in rows[1..].iter().zip(awkward) {
            assert_eq!(row[0], expected);
        }
    }

    #[test]
    fn test_header_is_union_of_columns() {
        let first = record(&[("id", json!(1)), ("a", json!("x"))]);
        let second = record(&[("id", json!(2)), ("b", json!("y")), ("a", json!("z"))]);
        let group = group(vec![first, second]);

        assert_eq!(GroupWriter::header(&group), vec!["id", "a", "b"]);

        let rows = read_back(&GroupWriter::new().render(&group).unwrap());
        assert_eq!(rows[1], vec!["1", "x", ""]);
        assert_eq!(rows[2], vec!["2", "z", "y"]);
    }

    #[test]
    fn test_cell_rendering() {
        assert_eq!(render_cell(&json!(true)), "true");
        assert_eq!(render_cell(&json!(2.5)), "2.5");
        assert_eq!(render_cell(&json!(350.0)), "350.0");
        assert_eq!(render_cell(&json!({"a": 1})), "{\"a\":1}");
        assert_eq!(render_cell(&Value::Null), "");
    }

    #[test]
    fn test_file_name() {
        let key = GroupKey::new(ResponseType::Questionnaire, "qes/mood v2");
        assert_eq!(
            GroupWriter::file_name("qc-responses-1nP", &key),
            "qc-responses-1nP-questionnaire-qes_mood_v2.csv"
        );
        let key = GroupKey::new(ResponseType::HealthData, "all");
        assert_eq!(
            GroupWriter::file_name("out", &key),
            "out-healthdata-all.csv"
        );
    }
}
