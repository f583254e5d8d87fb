// raw rows -> plain text block the model can narrate

use super::db::QueryResult;

pub const NO_DATA: &str = "no data";
pub const HEADER: &str = "📊 Query result:";

/// Deterministic: same rows in, same bytes out, row order untouched.
pub fn format_rows(result: &QueryResult) -> String {
    if result.rows.is_empty() {
        return NO_DATA.to_string();
    }

    let mut out = String::from(HEADER);
    out.push('\n');

    for row in &result.rows {
        match row.as_slice() {
            [single] => out.push_str(&format_value(single)),
            values => {
                let cells: Vec<String> = values.iter().map(format_value).collect();
                out.push('[');
                out.push_str(&cells.join(", "));
                out.push(']');
            }
        }
        out.push('\n');
    }

    out
}

pub fn format_value(val: &serde_json::Value) -> String {
    match val {
        serde_json::Value::Null => "null".to_string(),
        // one row per line, so embedded breaks are escaped
        serde_json::Value::String(s) => s.replace('\r', "\\r").replace('\n', "\\n"),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        _ => val.to_string(),
    }
}
