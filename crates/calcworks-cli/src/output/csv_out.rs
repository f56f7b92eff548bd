use serde_json::Value;
use std::io;

/// Print output as CSV to stdout.
///
/// Schedules (amortization periods, projection years, payoff months) are
/// written one row per entry; anything else falls back to field,value pairs.
pub fn print_csv(value: &Value) {
    let mut wtr = csv::Writer::from_writer(io::stdout());

    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Some(rows) = find_rows(result) {
        write_rows(&mut wtr, rows);
        let _ = wtr.flush();
        return;
    }

    match result {
        Value::Object(map) => {
            let _ = wtr.write_record(["field", "value"]);
            for (k, v) in map {
                let _ = wtr.write_record([k.as_str(), &flatten_value(v)]);
            }
        }
        _ => {
            let _ = wtr.write_record(["value"]);
            let _ = wtr.write_record([&flatten_value(result)]);
        }
    }

    if let Some(Value::Array(warnings)) = value.get("warnings") {
        for w in warnings {
            if let Value::String(s) = w {
                let _ = wtr.write_record(["warning", s.as_str()]);
            }
        }
    }

    let _ = wtr.flush();
}

/// The per-period array of a result, if it has one.
fn find_rows(result: &Value) -> Option<&Vec<Value>> {
    ["schedule", "points", "cash_flows"]
        .iter()
        .find_map(|key| result.get(*key).and_then(Value::as_array))
        .filter(|rows| rows.first().map(Value::is_object).unwrap_or(false))
}

fn write_rows<W: io::Write>(wtr: &mut csv::Writer<W>, rows: &[Value]) {
    let headers: Vec<String> = match rows.first() {
        Some(Value::Object(first)) => first.keys().cloned().collect(),
        _ => return,
    };
    let _ = wtr.write_record(&headers);
    for row in rows {
        let record: Vec<String> = headers
            .iter()
            .map(|h| row.get(h).map(flatten_value).unwrap_or_default())
            .collect();
        let _ = wtr.write_record(&record);
    }
}

fn flatten_value(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(v).unwrap_or_default(),
    }
}
