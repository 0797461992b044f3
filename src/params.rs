//! Bracket-notation query string serialization.
//!
//! Nested parameters such as `{filter: {types: "whatsapp"}, page: {size: 10}}`
//! are flattened into `filter[types]=whatsapp&page[size]=10`.

use std::fmt;

use serde_json::{Number, Value};

/// Characters left untouched by the host platform's `encodeURI`, besides ASCII alphanumerics.
const URI_RESERVED_UNESCAPED: &str = "-_.!~*'();/?:@&=+$,#";

/// A single parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// String value, percent-encoded when serialized.
    Str(String),
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// Boolean value, serialized as `true` / `false`.
    Bool(bool),
    /// Nested parameters, serialized with bracket suffixes.
    Map(ParamMap),
    /// Explicitly omitted; never serialized.
    Absent,
}

impl ParamValue {
    /// Returns true when the value must be skipped.
    pub fn is_absent(&self) -> bool {
        matches!(self, ParamValue::Absent)
    }

    /// Converts the value into JSON; non-finite floats and absent values become `null`.
    pub fn to_json(&self) -> Value {
        match self {
            ParamValue::Str(s) => Value::String(s.clone()),
            ParamValue::Int(i) => Value::from(*i),
            ParamValue::Float(v) => Number::from_f64(*v).map_or(Value::Null, Value::Number),
            ParamValue::Bool(b) => Value::Bool(*b),
            ParamValue::Map(m) => m.to_json(),
            ParamValue::Absent => Value::Null,
        }
    }
}

/// Renders a float the way the host stringifies numbers: `NaN`, `Infinity`,
/// no negative zero, and exponent notation outside `[1e-6, 1e21)`.
fn format_number(v: f64) -> String {
    if v.is_nan() {
        return "NaN".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if v == 0.0 {
        return "0".to_string();
    }

    let magnitude = v.abs();
    if (1e-6..1e21).contains(&magnitude) {
        return v.to_string();
    }

    let exponent = format!("{:e}", v);
    match exponent.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
        _ => exponent,
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Str(s) => f.write_str(s),
            ParamValue::Int(i) => write!(f, "{}", i),
            ParamValue::Float(v) => f.write_str(&format_number(*v)),
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::Map(m) => f.write_str(&build_url_params(m)),
            ParamValue::Absent => Ok(()),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Str(value)
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        ParamValue::Str(value.clone())
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Int(i64::from(value))
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Int(i64::from(value))
    }
}

impl From<u64> for ParamValue {
    fn from(value: u64) -> Self {
        // Ids beyond i64 are not produced by the platform; keep them as text.
        i64::try_from(value)
            .map(ParamValue::Int)
            .unwrap_or_else(|_| ParamValue::Str(value.to_string()))
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<ParamMap> for ParamValue {
    fn from(value: ParamMap) -> Self {
        ParamValue::Map(value)
    }
}

impl<T: Into<ParamValue>> From<Option<T>> for ParamValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(ParamValue::Absent)
    }
}

/// Ordered mapping of parameter names to values.
///
/// Insertion order is the serialization order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParamMap {
    entries: Vec<(String, ParamValue)>,
}

impl ParamMap {
    /// Creates an empty parameter map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry, builder style.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Inserts an entry, replacing an existing key in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Sets `section[key] = value`, creating or replacing the `section` map.
    ///
    /// Other keys of the section are kept.
    pub fn merge_nested(
        &mut self,
        section: &str,
        key: impl Into<String>,
        value: impl Into<ParamValue>,
    ) {
        match self.entries.iter_mut().find(|(k, _)| k == section) {
            Some((_, ParamValue::Map(inner))) => inner.insert(key, value),
            Some((_, slot)) => *slot = ParamValue::Map(ParamMap::new().with(key, value)),
            None => self
                .entries
                .push((section.to_string(), ParamMap::new().with(key, value).into())),
        }
    }

    /// Returns true if there are no present entries.
    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|(_, v)| v.is_absent())
    }

    /// Iterates over the entries in insertion order, absent ones included.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Converts the map into a JSON object, dropping absent entries.
    pub fn to_json(&self) -> Value {
        let object = self
            .entries
            .iter()
            .filter(|(_, v)| !v.is_absent())
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        Value::Object(object)
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for ParamMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = ParamMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// Percent-encodes a value the way `encodeURI` does.
///
/// Reserved URI characters are kept so values such as URLs or comma separated
/// lists stay readable; everything else outside ASCII alphanumerics is encoded.
pub fn encode_uri(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut buf = [0u8; 4];
    for ch in value.chars() {
        if ch.is_ascii_alphanumeric() || URI_RESERVED_UNESCAPED.contains(ch) {
            out.push(ch);
        } else {
            out.push_str(&urlencoding::encode(ch.encode_utf8(&mut buf)));
        }
    }
    out
}

/// Transforms a parameter map into a query string fragment (no leading `?`).
pub fn build_url_params(params: &ParamMap) -> String {
    let mut parts = Vec::new();
    collect(params, None, &mut parts);
    parts.join("&")
}

fn collect(params: &ParamMap, parent: Option<&str>, parts: &mut Vec<String>) {
    for (key, value) in params.iter() {
        let name = match parent {
            Some(parent) => format!("{}[{}]", parent, key),
            None => key.to_string(),
        };

        match value {
            ParamValue::Absent => {}
            ParamValue::Map(inner) => collect(inner, Some(&name), parts),
            ParamValue::Str(s) => parts.push(format!("{}={}", name, encode_uri(s))),
            other => parts.push(format!("{}={}", name, other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_formatting() {
        let params = ParamMap::new()
            .with("a", 1.5)
            .with("b", f64::INFINITY)
            .with("c", f64::NEG_INFINITY)
            .with("d", f64::NAN)
            .with("e", 1e21)
            .with("f", 1e-7)
            .with("g", -0.0)
            .with("h", 123456.0);
        assert_eq!(
            build_url_params(&params),
            "a=1.5&b=Infinity&c=-Infinity&d=NaN&e=1e+21&f=1e-7&g=0&h=123456"
        );
    }

    #[test]
    fn test_single_parameter() {
        let params = ParamMap::new().with("foo", "bar");
        assert_eq!(build_url_params(&params), "foo=bar");
    }

    #[test]
    fn test_two_parameters_keep_order() {
        let params = ParamMap::new().with("foo", "bar").with("fizz", "buzz");
        assert_eq!(build_url_params(&params), "foo=bar&fizz=buzz");
    }

    #[test]
    fn test_nested_parameters() {
        let params = ParamMap::new()
            .with(
                "filters",
                ParamMap::new().with("foo", "bar").with("fizz", "buzz"),
            )
            .with("page", ParamMap::new().with("size", 25));
        assert_eq!(
            build_url_params(&params),
            "filters[foo]=bar&filters[fizz]=buzz&page[size]=25"
        );
    }

    #[test]
    fn test_deeper_nesting() {
        let params = ParamMap::new()
            .with(
                "filters",
                ParamMap::new()
                    .with("foo", "bar")
                    .with("fizz", ParamMap::new().with("john", "doe")),
            )
            .with("page", ParamMap::new().with("size", 25));
        assert_eq!(
            build_url_params(&params),
            "filters[foo]=bar&filters[fizz][john]=doe&page[size]=25"
        );
    }

    #[test]
    fn test_absent_skipped_at_every_level() {
        let params = ParamMap::new()
            .with(
                "filters",
                ParamMap::new()
                    .with("foo", "bar")
                    .with("gone", ParamValue::Absent)
                    .with("fizz", "buzz"),
            )
            .with("page", ParamValue::Absent)
            .with("size", None::<u32>);
        assert_eq!(
            build_url_params(&params),
            "filters[foo]=bar&filters[fizz]=buzz"
        );
    }

    #[test]
    fn test_string_values_are_uri_encoded() {
        let params = ParamMap::new().with("url", "https://mozilla.org/?x=шеллы");
        assert_eq!(
            build_url_params(&params),
            "url=https://mozilla.org/?x=%D1%88%D0%B5%D0%BB%D0%BB%D1%8B"
        );
    }

    #[test]
    fn test_reserved_characters_kept_spaces_encoded() {
        assert_eq!(encode_uri("whatsapp,messenger"), "whatsapp,messenger");
        assert_eq!(encode_uri("a b\"c"), "a%20b%22c");
    }

    #[test]
    fn test_scalars() {
        let params = ParamMap::new()
            .with("active", false)
            .with("group_id", 456)
            .with("ratio", 0.5);
        assert_eq!(
            build_url_params(&params),
            "active=false&group_id=456&ratio=0.5"
        );
    }

    #[test]
    fn test_empty_map() {
        assert_eq!(build_url_params(&ParamMap::new()), "");
        assert!(ParamMap::new().with("x", ParamValue::Absent).is_empty());
    }

    #[test]
    fn test_merge_nested_keeps_siblings() {
        let mut params = ParamMap::new()
            .with("page", ParamMap::new().with("size", "100"))
            .with("sort", "id");
        params.merge_nested("page", "after", "1");
        assert_eq!(
            build_url_params(&params),
            "page[size]=100&page[after]=1&sort=id"
        );

        params.merge_nested("page", "after", "2");
        assert_eq!(
            build_url_params(&params),
            "page[size]=100&page[after]=2&sort=id"
        );
    }

    #[test]
    fn test_merge_nested_creates_section() {
        let mut params = ParamMap::new();
        params.merge_nested("page", "after", "abc");
        assert_eq!(build_url_params(&params), "page[after]=abc");
    }

    #[test]
    fn test_roundtrip_key_set() {
        let params = ParamMap::new()
            .with("a", "1")
            .with("b", ParamMap::new().with("c", 2).with("d", ParamValue::Absent));
        let query = build_url_params(&params);
        let keys: Vec<&str> = query
            .split('&')
            .map(|pair| pair.split('=').next().unwrap_or_default())
            .collect();
        assert_eq!(keys, vec!["a", "b[c]"]);
    }

    #[test]
    fn test_to_json_drops_absent() {
        let params = ParamMap::new()
            .with("page", ParamMap::new().with("size", "100").with("after", None::<String>))
            .with("include_standard_fields", true)
            .with("ratio", f64::NAN);
        assert_eq!(
            params.to_json(),
            serde_json::json!({
                "page": {"size": "100"},
                "include_standard_fields": true,
                "ratio": null
            })
        );
    }
}
