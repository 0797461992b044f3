//! Common types shared across API models.
//!
//! This module defines cursor pagination metadata and lenient deserializers
//! for values the APIs return either as strings or numbers.

use serde::{Deserialize, Deserializer, Serialize};

/// Cursor pagination metadata returned under `meta`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CursorMeta {
    /// Whether another page exists.
    #[serde(default)]
    pub has_more: bool,

    /// Cursor of the next page.
    #[serde(default)]
    pub after_cursor: Option<String>,

    /// Cursor of the previous page.
    #[serde(default)]
    pub before_cursor: Option<String>,
}

/// Deserializes a value that can be either a string or an integer into a `String`.
pub(crate) fn string_or_int<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct StringOrIntVisitor;

    impl<'de> Visitor<'de> for StringOrIntVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a string or an integer")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value)
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value.to_string())
        }
    }

    deserializer.deserialize_any(StringOrIntVisitor)
}
