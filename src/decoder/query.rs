//! Nested parameter ↔ query string conversion.
//!
//! # Responsibilities
//! - Flatten nested parameters into `key[sub]=value` entries
//! - Rebuild nested parameters from such entries
//! - Compose the query string handed to the application after a decode
//!
//! # Design Decisions
//! - Bracket notation is the wire convention; key order is preserved exactly
//! - Flattened values are emitted verbatim (no percent-encoding), the same
//!   form the URL cache stores
//! - Empty nested maps vanish on flatten

use serde_json::Value;
use url::form_urlencoded;

use crate::decoder::types::Parameters;

/// Query parameter carrying the cache verification token.
pub const VERIFICATION_KEY: &str = "cHash";

/// Flatten parameters into `name=value` entries, depth first, in key order.
pub fn flatten(params: &Parameters) -> Vec<String> {
    let mut out = Vec::new();
    for (key, value) in params {
        flatten_value(value, key, &mut out);
    }
    out
}

fn flatten_value(value: &Value, prefix: &str, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                flatten_value(nested, &format!("{prefix}[{key}]"), out);
            }
        }
        Value::Array(items) => {
            for (index, nested) in items.iter().enumerate() {
                flatten_value(nested, &format!("{prefix}[{index}]"), out);
            }
        }
        Value::String(s) => out.push(format!("{prefix}={s}")),
        Value::Null => out.push(format!("{prefix}=")),
        other => out.push(format!("{prefix}={other}")),
    }
}

/// Rebuild nested parameters from flattened entries.
///
/// Entries are split at the first `=`; values are taken verbatim.
pub fn unflatten<I, S>(entries: I) -> Parameters
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut params = Parameters::new();
    for entry in entries {
        let entry = entry.as_ref();
        let (key, value) = entry.split_once('=').unwrap_or((entry, ""));
        insert_param(&mut params, key, value.to_string());
    }
    params
}

/// Parse a raw (percent-encoded) query string into nested parameters.
pub fn parse_query(raw: &str) -> Parameters {
    let mut params = Parameters::new();
    for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
        insert_param(&mut params, &key, value.into_owned());
    }
    params
}

/// Value of a top-level scalar parameter in a raw query string.
pub fn query_value(raw: &str, name: &str) -> Option<String> {
    form_urlencoded::parse(raw.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// Insert `value` at the bracket path described by `key`.
pub fn insert_param(params: &mut Parameters, key: &str, value: String) {
    let path = split_key(key);
    if path.first().map_or(true, |base| base.is_empty()) {
        return;
    }
    insert_at(params, &path, value);
}

/// `a[b][c]` → `["a", "b", "c"]`; `a[]` → `["a", ""]`.
/// Keys with unbalanced brackets are taken literally.
fn split_key(key: &str) -> Vec<String> {
    let Some(open) = key.find('[') else {
        return vec![key.to_string()];
    };

    let mut path = vec![key[..open].to_string()];
    let mut rest = &key[open..];
    while let Some(stripped) = rest.strip_prefix('[') {
        let Some(close) = stripped.find(']') else {
            return vec![key.to_string()];
        };
        path.push(stripped[..close].to_string());
        rest = &stripped[close + 1..];
    }
    if !rest.is_empty() {
        return vec![key.to_string()];
    }
    path
}

fn insert_at(params: &mut Parameters, path: &[String], value: String) {
    let key = if path[0].is_empty() {
        next_index(params)
    } else {
        path[0].clone()
    };

    if path.len() == 1 {
        params.insert(key, Value::String(value));
        return;
    }

    let slot = params
        .entry(key)
        .or_insert_with(|| Value::Object(Parameters::new()));
    if !slot.is_object() {
        *slot = Value::Object(Parameters::new());
    }
    if let Value::Object(nested) = slot {
        insert_at(nested, &path[1..], value);
    }
}

/// Next free numeric key, the way `name[]` appends.
fn next_index(params: &Parameters) -> String {
    params
        .keys()
        .filter_map(|k| k.parse::<u64>().ok())
        .max()
        .map_or(0, |max| max + 1)
        .to_string()
}

/// Merge `overlay` into `base`; nested maps merge, anything else overrides.
pub fn merge_recursive(base: &mut Parameters, overlay: &Parameters) {
    for (key, value) in overlay {
        match (base.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                merge_recursive(existing, incoming);
            }
            _ => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Sort keys at every level.
pub fn sort_deep(params: &Parameters) -> Parameters {
    let mut entries: Vec<(&String, &Value)> = params.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::Object(nested) => Value::Object(sort_deep(nested)),
                other => other.clone(),
            };
            (key.clone(), value)
        })
        .collect()
}

/// Query string handed to the application for a decoded request.
///
/// Without decoded parameters the request's own query string is returned
/// unchanged. Otherwise the request's verification token replaces the
/// decoded one, the parameters are flattened, and the raw request query is
/// appended.
pub fn build_query_string(params: &Parameters, request_query: &str) -> String {
    if params.is_empty() {
        return request_query.to_string();
    }

    let mut params = params.clone();
    if let Some(token) = query_value(request_query, VERIFICATION_KEY).filter(|t| !t.is_empty()) {
        params.insert(VERIFICATION_KEY.to_string(), Value::String(token));
    }

    let mut parts = flatten(&params);
    if !request_query.is_empty() {
        parts.push(request_query.to_string());
    }
    parts.join("&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn params(value: Value) -> Parameters {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_flatten_nested() {
        let p = params(json!({
            "tx_news": {"news": "42", "controller": "News"},
            "type": "98",
            "empty": {},
        }));
        assert_eq!(
            flatten(&p),
            vec!["tx_news[news]=42", "tx_news[controller]=News", "type=98"]
        );
    }

    #[test]
    fn test_flatten_preserves_insertion_order() {
        let mut p = Parameters::new();
        p.insert("z".into(), json!("1"));
        p.insert("a".into(), json!("2"));
        assert_eq!(flatten(&p), vec!["z=1", "a=2"]);
    }

    #[test]
    fn test_unflatten_brackets() {
        let p = unflatten(["a[b][c]=1", "a[b][d]=2", "x=y=z", "list[]=p", "list[]=q"]);
        assert_eq!(
            Value::Object(p),
            json!({
                "a": {"b": {"c": "1", "d": "2"}},
                "x": "y=z",
                "list": {"0": "p", "1": "q"},
            })
        );
    }

    #[test]
    fn test_unflatten_odd_keys() {
        let p = unflatten(["[a]=1", "b[c=2", "d[e]f=3", "bare"]);
        assert_eq!(Value::Object(p), json!({"b[c": "2", "d[e]f": "3", "bare": ""}));
    }

    #[test]
    fn test_parse_query_decodes() {
        let p = parse_query("L=1&tx_news%5Bnews%5D=42&q=a+b");
        assert_eq!(Value::Object(p), json!({"L": "1", "tx_news": {"news": "42"}, "q": "a b"}));
    }

    #[test]
    fn test_build_query_string_without_params() {
        assert_eq!(build_query_string(&Parameters::new(), "L=1"), "L=1");
        assert_eq!(build_query_string(&Parameters::new(), ""), "");
    }

    #[test]
    fn test_build_query_string_appends_request_query() {
        let p = params(json!({"tx_news": {"news": "42"}}));
        assert_eq!(build_query_string(&p, ""), "tx_news[news]=42");
        assert_eq!(build_query_string(&p, "L=1"), "tx_news[news]=42&L=1");
    }

    #[test]
    fn test_build_query_string_overrides_verification_token() {
        let p = params(json!({"page": "2", "cHash": "cached"}));
        assert_eq!(
            build_query_string(&p, "cHash=fresh"),
            "page=2&cHash=fresh&cHash=fresh"
        );
    }

    #[test]
    fn test_merge_recursive_overrides() {
        let mut base = params(json!({"a": {"b": "1", "c": "2"}, "d": "3"}));
        merge_recursive(&mut base, &params(json!({"a": {"c": "9"}, "d": {"e": "4"}})));
        assert_eq!(
            Value::Object(base),
            json!({"a": {"b": "1", "c": "9"}, "d": {"e": "4"}})
        );
    }

    #[test]
    fn test_sort_deep() {
        let p = params(json!({"b": {"z": "1", "y": "2"}, "a": "3"}));
        assert_eq!(flatten(&sort_deep(&p)), vec!["a=3", "b[y]=2", "b[z]=1"]);
    }

    fn arb_key() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_]{0,6}"
    }

    fn arb_params() -> impl Strategy<Value = Parameters> {
        let leaf = "[a-zA-Z0-9 =%-]{0,8}".prop_map(Value::String);
        let tree = leaf.prop_recursive(3, 24, 4, |inner| {
            prop::collection::btree_map(arb_key(), inner, 1..4)
                .prop_map(|m| Value::Object(m.into_iter().collect()))
        });
        prop::collection::btree_map(arb_key(), tree, 0..5)
            .prop_map(|m| m.into_iter().collect())
    }

    proptest! {
        #[test]
        fn test_flatten_unflatten_round_trip(p in arb_params()) {
            prop_assert_eq!(unflatten(flatten(&p)), p);
        }
    }
}
