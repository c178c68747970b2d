//! Flat `key: value` frontmatter codec.
//!
//! Only single-line scalars are understood. Lists, nested maps and multi-line
//! strings are not parsed; their raw text comes back as a string.

use serde_json::{Map, Number, Value};

use crate::error::{AppError, AppResult};

pub type Frontmatter = Map<String, Value>;

const DELIMITER: &str = "---";
const QUOTES: &[char] = &['"', '\'', '`'];

/// Split `content` into the raw frontmatter block and the body.
/// The block opens with a first line `---` and closes at the next line that is exactly `---`.
fn split_block(content: &str) -> Option<(&str, &str)> {
    let rest = content.strip_prefix("---\n")?;
    let mut offset = 0usize;
    for line in rest.split_inclusive('\n') {
        if line.strip_suffix('\n').unwrap_or(line) == DELIMITER {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

fn strip_quotes(v: &str) -> &str {
    let v = v.strip_prefix(QUOTES).unwrap_or(v);
    v.strip_suffix(QUOTES).unwrap_or(v)
}

/// Coerce one raw value: quotes stripped, then `true`/`false`, then finite numbers.
pub fn coerce_value(raw: &str) -> Value {
    let v = strip_quotes(raw);
    match v {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        "" => return Value::String(String::new()),
        _ => {}
    }
    if let Some(n) = parse_number(v) {
        return Value::Number(n);
    }
    Value::String(v.to_string())
}

fn parse_number(v: &str) -> Option<Number> {
    let lower = v.to_ascii_lowercase();
    if lower.contains("inf") || lower.contains("nan") {
        return None;
    }
    // integral text parses exactly; f64 would round past 2^53
    if let Ok(i) = v.parse::<i64>() {
        return Some(Number::from(i));
    }
    if let Ok(u) = v.parse::<u64>() {
        return Some(Number::from(u));
    }
    let f: f64 = v.parse().ok()?;
    if !f.is_finite() {
        return None;
    }
    if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        return Some(Number::from(f as i64));
    }
    Number::from_f64(f)
}

/// Parse frontmatter. Without a well-formed block the whole input is the body.
pub fn parse(content: &str) -> (Option<Frontmatter>, String) {
    let Some((block, body)) = split_block(content) else {
        return (None, content.to_string());
    };
    let mut fm = Frontmatter::new();
    for line in block.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else { continue; };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        fm.insert(key.to_string(), coerce_value(value.trim()));
    }
    (Some(fm), body.to_string())
}

fn render_value(v: &Value) -> String {
    match v {
        Value::String(s) => format!("\"{}\"", s),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => format!("\"{}\"", other),
    }
}

/// Serialize a map and body. An absent or empty map leaves the body as is.
pub fn serialize(fm: Option<&Frontmatter>, body: &str) -> String {
    let Some(fm) = fm.filter(|m| !m.is_empty()) else {
        return body.to_string();
    };
    let mut out = String::with_capacity(body.len() + fm.len() * 24 + 8);
    out.push_str("---\n");
    for (k, v) in fm {
        out.push_str(k);
        out.push_str(": ");
        out.push_str(&render_value(v));
        out.push('\n');
    }
    out.push_str("---\n");
    out.push_str(body);
    out
}

/// Overlay `updates` onto `current`; existing keys keep their position.
pub fn merge(current: Option<&Frontmatter>, updates: &Frontmatter) -> Frontmatter {
    let mut merged = current.cloned().unwrap_or_default();
    for (k, v) in updates {
        merged.insert(k.clone(), v.clone());
    }
    merged
}

/// Result of removing keys: the remaining map and the keys actually removed.
#[derive(Debug, Clone, PartialEq)]
pub struct Removal {
    pub remaining: Frontmatter,
    pub deleted: Vec<String>,
}

/// Remove `keys` from `current`. `["*"]` removes every key; `*` next to other keys is rejected.
/// Keys that are not present are ignored, but at least one must match.
pub fn remove_keys(current: &Frontmatter, keys: &[String], file_path: &str) -> AppResult<Removal> {
    if keys.is_empty() {
        return Err(AppError::user(
            "invalid_frontmatter_keys",
            "frontmatter_keys must be a non-empty array. Use [\"*\"] to delete all frontmatter.",
        ));
    }
    if keys.len() == 1 && keys[0] == "*" {
        return Ok(Removal { remaining: Frontmatter::new(), deleted: current.keys().cloned().collect() });
    }
    if keys.iter().any(|k| k == "*") {
        return Err(AppError::user(
            "invalid_frontmatter_keys",
            format!("Wildcard \"*\" must be used alone to delete all frontmatter in file '{}'", file_path),
        ));
    }
    let mut remaining = current.clone();
    let mut deleted = Vec::new();
    for k in keys {
        if remaining.shift_remove(k).is_some() {
            deleted.push(k.clone());
        }
    }
    if deleted.is_empty() {
        return Err(AppError::user(
            "frontmatter_keys_not_found",
            format!("No matching frontmatter keys found to delete in file '{}'", file_path),
        ));
    }
    Ok(Removal { remaining, deleted })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fm(v: Value) -> Frontmatter {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn parses_scalars_in_order() {
        let src = "---\ntitle: \"Hello\"\ncount: 3\nratio: 0.5\ndraft: false\n# comment\n\nnot a pair\nworkspace: Inbox\n---\n# Body\n";
        let (m, body) = parse(src);
        let m = m.unwrap();
        assert_eq!(m.keys().collect::<Vec<_>>(), vec!["title", "count", "ratio", "draft", "workspace"]);
        assert_eq!(m["title"], json!("Hello"));
        assert_eq!(m["count"], json!(3));
        assert_eq!(m["ratio"], json!(0.5));
        assert_eq!(m["draft"], json!(false));
        assert_eq!(body, "# Body\n");
    }

    #[test]
    fn no_block_means_whole_body() {
        let (m, body) = parse("# Title\n---\nx: 1\n---\n");
        assert!(m.is_none());
        assert_eq!(body, "# Title\n---\nx: 1\n---\n");
        let (m, _) = parse("---\ntitle: never closed\n");
        assert!(m.is_none());
        let (m, body) = parse("---\na: 1\n---");
        assert_eq!(m.unwrap()["a"], json!(1));
        assert_eq!(body, "");
    }

    #[test]
    fn coercion_pins() {
        assert_eq!(coerce_value("'quoted'"), json!("quoted"));
        assert_eq!(coerce_value("`tick`"), json!("tick"));
        assert_eq!(coerce_value("\"true\""), json!(true));
        assert_eq!(coerce_value("True"), json!("True"));
        assert_eq!(coerce_value("012"), json!(12));
        assert_eq!(coerce_value("-4.25"), json!(-4.25));
        assert_eq!(coerce_value("1e3"), json!(1000));
        assert_eq!(coerce_value("inf"), json!("inf"));
        assert_eq!(coerce_value("NaN"), json!("NaN"));
        assert_eq!(coerce_value("[a, b]"), json!("[a, b]"));
        assert_eq!(coerce_value("a: b"), json!("a: b"));
        assert_eq!(coerce_value(""), json!(""));
    }

    #[test]
    fn value_with_colon_keeps_rest() {
        let (m, _) = parse("---\nurl: https://example.com/x\n---\n");
        assert_eq!(m.unwrap()["url"], json!("https://example.com/x"));
    }

    #[test]
    fn nested_yaml_is_not_understood() {
        let (m, _) = parse("---\ntags:\n  - a\n  - b\n---\nbody");
        let m = m.unwrap();
        assert_eq!(m["tags"], json!(""));
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn serialize_format() {
        let m = fm(json!({"title": "Hi", "n": 2, "ok": true, "list": [1, 2]}));
        let out = serialize(Some(&m), "body\n");
        assert_eq!(out, "---\ntitle: \"Hi\"\nn: 2\nok: true\nlist: \"[1,2]\"\n---\nbody\n");
        assert_eq!(serialize(None, "body"), "body");
        assert_eq!(serialize(Some(&Frontmatter::new()), "body"), "body");
    }

    #[test]
    fn round_trip_flat_map() {
        let m = fm(json!({"title": "Weekly notes", "workspace": "Inbox", "priority": 2, "score": 1.5, "done": false}));
        for body in ["", "plain body", "# Heading\n\ntext with --- inside\n", "line\n---\nnot frontmatter\n"] {
            let (parsed, b) = parse(&serialize(Some(&m), body));
            assert_eq!(parsed.as_ref(), Some(&m));
            assert_eq!(b, body);
        }
    }

    #[test]
    fn large_integers_are_exact() {
        assert_eq!(coerce_value("9007199254740993"), json!(9007199254740993i64));
        assert_eq!(coerce_value("18446744073709551615"), json!(u64::MAX));
        assert_eq!(coerce_value("-9223372036854775808"), json!(i64::MIN));

        let m = fm(json!({"id": 9007199254740993i64, "big": 1234567890123456789i64, "max": u64::MAX}));
        let (parsed, body) = parse(&serialize(Some(&m), "body"));
        assert_eq!(parsed, Some(m));
        assert_eq!(body, "body");
    }

    #[test]
    fn merge_keeps_slots() {
        let cur = fm(json!({"a": 1, "b": 2}));
        let merged = merge(Some(&cur), &fm(json!({"b": 3, "c": 4})));
        assert_eq!(merged.keys().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(merged["b"], json!(3));
        assert_eq!(merge(None, &fm(json!({"x": true})))["x"], json!(true));
    }

    #[test]
    fn remove_specific_and_wildcard() {
        let cur = fm(json!({"workspace": "Inbox", "title": "T", "n": 1}));
        let r = remove_keys(&cur, &["workspace".into(), "missing".into()], "a.md").unwrap();
        assert_eq!(r.deleted, vec!["workspace"]);
        assert_eq!(r.remaining.keys().collect::<Vec<_>>(), vec!["title", "n"]);

        let r = remove_keys(&cur, &["*".into()], "a.md").unwrap();
        assert!(r.remaining.is_empty());
        assert_eq!(r.deleted.len(), 3);

        assert!(remove_keys(&cur, &["*".into(), "title".into()], "a.md").is_err());
        assert!(remove_keys(&cur, &[], "a.md").is_err());
        let e = remove_keys(&cur, &["nope".into()], "a.md").unwrap_err();
        assert_eq!(e.code_str(), "frontmatter_keys_not_found");
    }
}
