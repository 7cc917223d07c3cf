use rusqlite::types::Value;
use std::io::{self, Write};

use crate::query::catalogue::QueryResult;

/// Write one titled block: the title, then each row indented four spaces
/// with tab-separated fields, then a blank line.
pub fn write_result<W: Write>(out: &mut W, result: &QueryResult) -> io::Result<()> {
    writeln!(out, "{}", result.title)?;
    for row in &result.rows {
        let fields: Vec<String> = row.iter().map(format_value).collect();
        writeln!(out, "    {}", fields.join("\t"))?;
    }
    writeln!(out)
}

pub fn write_results<W: Write>(out: &mut W, results: &[QueryResult]) -> io::Result<()> {
    for result in results {
        write_result(out, result)?;
    }
    out.flush()
}

pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(n) => n.to_string(),
        Value::Real(f) => format!("{:?}", f),
        Value::Text(s) => s.clone(),
        Value::Blob(b) => format!("<{} bytes>", b.len()),
    }
}
