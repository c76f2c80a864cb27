//! Deserializers for fields that may arrive as text
//!
//! Path and query parameters are always strings, while the same field in a
//! JSON body is usually typed. These helpers accept both forms.

use serde::de::{self, Deserializer};
use serde::Deserialize;
use std::fmt::Display;
use std::str::FromStr;

#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient<T> {
    Typed(T),
    Text(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

/// Number given either as a JSON number or a numeric string
pub fn number<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr + Default,
    T::Err: Display,
{
    match Lenient::<T>::deserialize(deserializer)? {
        Lenient::Typed(value) => Ok(value),
        Lenient::Text(text) if text.trim().is_empty() => Ok(T::default()),
        Lenient::Text(text) => text.trim().parse().map_err(de::Error::custom),
    }
}

/// Boolean given as `true`/`false`, `"true"`/`"false"` or `"1"`/`"0"`
pub fn boolean<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Lenient::<bool>::deserialize(deserializer)? {
        Lenient::Typed(value) => Ok(value),
        Lenient::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" | "" => Ok(false),
            other => Err(de::Error::custom(format!("invalid boolean '{}'", other))),
        },
    }
}

/// List given either as an array or a single string
pub fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) if value.is_empty() => Vec::new(),
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
    })
}
