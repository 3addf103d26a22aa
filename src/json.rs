//! Canonical JSON serialization for the three on-disk artifacts: the Counts
//! map, the full Index, and per-mode Query Results.
//!
//! All three iterate their source `BTreeMap`s directly rather than going
//! through `serde_json::to_writer` on the domain types themselves, so the
//! on-disk shape (nested plain objects/arrays, scores as fixed-precision
//! strings rather than JSON numbers) stays decoupled from whatever shape is
//! most convenient for `InvertedIndex`'s own `Serialize` derive.

use crate::index::{InvertedIndex, QueryResult};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::io::{self, Write};

/// Write `{location: count, …}`, keys ascending, to `sink`.
pub fn write_counts<W: Write>(counts: &BTreeMap<crate::location::Location, u32>, sink: W) -> io::Result<()> {
    let mut object = Map::new();
    for (location, count) in counts {
        object.insert(location.as_str().to_string(), Value::from(*count));
    }
    serde_json::to_writer_pretty(sink, &Value::Object(object)).map_err(io::Error::from)
}

/// Write `{token: {location: [positions…], …}, …}`, all keys ascending, to
/// `sink`.
pub fn write_index<W: Write>(index: &InvertedIndex, sink: W) -> io::Result<()> {
    let mut top = Map::new();
    for token in index.words() {
        let mut locations_object = Map::new();
        for location in index.locations(token) {
            let positions = index.positions(token, &location);
            let positions: Vec<Value> = positions.into_iter().map(Value::from).collect();
            locations_object.insert(location.as_str().to_string(), Value::Array(positions));
        }
        top.insert(token.clone(), Value::Object(locations_object));
    }
    serde_json::to_writer_pretty(sink, &Value::Object(top)).map_err(io::Error::from)
}

/// Render a single result as `{count, score, where}`, with `score` rendered
/// as a fixed 8-decimal-place string rather than a JSON number.
fn result_to_value(result: &QueryResult) -> Value {
    let mut object = Map::new();
    object.insert("count".to_string(), Value::from(result.matches));
    object.insert(
        "score".to_string(),
        Value::String(format!("{:.8}", result.score)),
    );
    object.insert(
        "where".to_string(),
        Value::String(result.location.as_str().to_string()),
    );
    Value::Object(object)
}

/// Write `{query: [result, …], …}`, keys ascending, to `sink`.
pub fn write_results<W: Write>(
    memo: &BTreeMap<String, Vec<QueryResult>>,
    sink: W,
) -> io::Result<()> {
    let mut top = Map::new();
    for (query, results) in memo {
        let rendered: Vec<Value> = results.iter().map(result_to_value).collect();
        top.insert(query.clone(), Value::Array(rendered));
    }
    serde_json::to_writer_pretty(sink, &Value::Object(top)).map_err(io::Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Location;
    use assert2::check;

    #[test]
    fn write_counts_renders_ascending_location_keys() {
        let mut counts = BTreeMap::new();
        counts.insert(Location::new("b.txt"), 3u32);
        counts.insert(Location::new("a.txt"), 5u32);

        let mut buf = Vec::new();
        write_counts(&counts, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        let a_idx = text.find("a.txt").unwrap();
        let b_idx = text.find("b.txt").unwrap();
        check!(a_idx < b_idx);
    }

    #[test]
    fn write_results_renders_score_as_fixed_precision_string() {
        let mut memo = BTreeMap::new();
        memo.insert(
            "fox".to_string(),
            vec![QueryResult {
                location: Location::new("a.txt"),
                matches: 2,
                score: 0.5,
            }],
        );

        let mut buf = Vec::new();
        write_results(&memo, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        check!(text.contains("\"0.50000000\""));
    }

    #[test]
    fn write_index_nests_positions_under_location_under_token() {
        let mut index = InvertedIndex::new();
        let location = Location::new("a.txt");
        index.add("fox", &location, 1);
        index.add("fox", &location, 5);

        let mut buf = Vec::new();
        write_index(&index, &mut buf).unwrap();
        let parsed: Value = serde_json::from_slice(&buf).unwrap();

        check!(parsed["fox"]["a.txt"] == serde_json::json!([1, 5]));
    }
}
