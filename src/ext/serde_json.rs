// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Tolerant access into `az` JSON output: dotted-path fetch, typed extraction with defaults, list normalization
// role: extension/serde_json
// outputs: JsonFetch trait, JsonFetched wrapper, parse_listing helper
// invariants: No panics; missing paths yield None; to_or_default returns T::default on failure; listings accept bare arrays or {"value": [...]}
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Wrapper around a JSON location to allow typed extraction via a clear second step.
pub struct JsonFetched<'a> {
  inner: Option<&'a Value>,
}

impl<'a> JsonFetched<'a> {
  /// Attempt to deserialize the fetched value as `T`.
  pub fn to<T>(&self) -> Option<T>
  where
    T: DeserializeOwned,
  {
    self.inner.and_then(|v| serde_json::from_value::<T>(v.clone()).ok())
  }

  /// Deserialize as `T`, returning `T::default()` on failure.
  pub fn to_or_default<T>(&self) -> T
  where
    T: DeserializeOwned + Default,
  {
    self.to::<T>().unwrap_or_default()
  }

  /// Render scalars as text (`42` and `"42"` both give "42"), falling back to `placeholder`.
  pub fn text_or(&self, placeholder: &str) -> String {
    match self.inner {
      Some(Value::String(s)) => s.clone(),
      Some(Value::Number(n)) => n.to_string(),
      Some(Value::Bool(b)) => b.to_string(),
      _ => placeholder.to_string(),
    }
  }

  pub fn raw(&self) -> Option<&'a Value> {
    self.inner
  }
}

/// Extension to fetch nested values via dotted paths like "user.name".
pub trait JsonFetch {
  fn fetch(&self, path: &str) -> JsonFetched<'_>;
}

impl JsonFetch for Value {
  fn fetch(&self, path: &str) -> JsonFetched<'_> {
    if path.is_empty() {
      return JsonFetched { inner: Some(self) };
    }

    let mut cur = self;

    for key in path.split('.') {
      match cur.get(key) {
        Some(next) => cur = next,
        None => return JsonFetched { inner: None },
      }
    }

    JsonFetched { inner: Some(cur) }
  }
}

/// Parse `az` listing output. Accepts a bare array or an object wrapping one in `value`.
/// Unparseable text or any other shape yields an empty list.
pub fn parse_listing(text: &str) -> Vec<Value> {
  let Ok(root) = serde_json::from_str::<Value>(text) else {
    return Vec::new();
  };

  match root {
    Value::Array(items) => items,
    Value::Object(mut map) => match map.remove("value") {
      Some(Value::Array(items)) => items,
      _ => Vec::new(),
    },
    _ => Vec::new(),
  }
}

/// Parse a single JSON object, `None` when the text is not JSON.
pub fn parse_object(text: &str) -> Option<Value> {
  serde_json::from_str::<Value>(text).ok().filter(|v| v.is_object())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fetch_top_level_and_nested() {
    let v: Value = serde_json::json!({
      "name": "dev",
      "user": { "name": "ada@example.com" },
      "nums": [1,2,3]
    });

    assert_eq!(v.fetch("name").to::<String>().as_deref(), Some("dev"));
    assert_eq!(v.fetch("user.name").to::<String>().as_deref(), Some("ada@example.com"));
    assert_eq!(v.fetch("missing").to::<String>(), None);
    assert!(v.fetch("").raw().is_some());
  }

  #[test]
  fn fetch_to_or_default() {
    let v: Value = serde_json::json!({});
    let s: String = v.fetch("nope").to_or_default();
    assert_eq!(s, "");
  }

  #[test]
  fn text_or_renders_numbers_and_placeholders() {
    let v: Value = serde_json::json!({ "id": 12, "name": null });
    assert_eq!(v.fetch("id").text_or("-"), "12");
    assert_eq!(v.fetch("name").text_or("-"), "-");
    assert_eq!(v.fetch("absent").text_or("-"), "-");
  }

  #[test]
  fn listing_accepts_both_shapes() {
    assert_eq!(parse_listing(r#"[{"a":1},{"a":2}]"#).len(), 2);
    assert_eq!(parse_listing(r#"{"count":1,"value":[{"a":1}]}"#).len(), 1);
    assert!(parse_listing(r#"{"count":0}"#).is_empty());
    assert!(parse_listing("not json").is_empty());
    assert!(parse_listing("").is_empty());
  }

  #[test]
  fn parse_object_rejects_non_objects() {
    assert!(parse_object(r#"{"remoteUrl":"x"}"#).is_some());
    assert!(parse_object("[]").is_none());
    assert!(parse_object("garbage").is_none());
  }
}
