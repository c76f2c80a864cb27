//! Request binding
//!
//! Path parameters, query parameters and the JSON body are merged into one
//! JSON object before typed decoding. Later sources win: path over query,
//! query over body. Query keys that repeat, or end in `[]`, become arrays.

use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use billgate_service::Validate;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{ApiError, ApiResult};

/// Decoded path parameters of the matched route
///
/// Rejections surface as binding errors instead of axum's plain-text ones.
#[derive(Debug, Clone, Default)]
pub struct PathParams(pub Vec<(String, String)>);

impl<S> FromRequestParts<S> for PathParams
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<Vec<(String, String)>>::from_request_parts(parts, state)
            .await
            .map(|Path(params)| PathParams(params))
            .map_err(|e| {
                debug!(error = %e, "Path parameters rejected");
                ApiError::binding()
            })
    }
}

/// Decode `T` from the three request sources
pub fn bind<T: DeserializeOwned>(
    path: &[(String, String)],
    query: Option<&str>,
    body: &[u8],
) -> ApiResult<T> {
    let mut merged = body_object(body)?;

    for (key, value) in query_object(query) {
        merged.insert(key, value);
    }

    for (key, value) in path {
        merged.insert(key.clone(), Value::String(value.clone()));
    }

    serde_json::from_value(Value::Object(merged)).map_err(|e| {
        debug!(error = %e, "Request binding failed");
        ApiError::binding()
    })
}

/// Bind, let the caller stamp trusted values, then validate
///
/// Enrichment runs before validation so constraints see the final values.
pub fn bind_validated<T, F>(
    path: &[(String, String)],
    query: Option<&str>,
    body: &[u8],
    enrich: F,
) -> ApiResult<T>
where
    T: DeserializeOwned + Validate,
    F: FnOnce(&mut T),
{
    let mut target: T = bind(path, query, body)?;
    enrich(&mut target);
    target.validate().map_err(|violations| {
        debug!(details = %violations, "Request validation failed");
        ApiError::validation(&violations)
    })?;
    Ok(target)
}

/// Decoded query string as ordered `(key, value)` pairs
pub fn query_pairs(query: Option<&str>) -> Vec<(String, String)> {
    query
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .into_owned()
                .collect()
        })
        .unwrap_or_default()
}

fn body_object(body: &[u8]) -> ApiResult<Map<String, Value>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => {
            debug!("Request body is not a JSON object");
            Err(ApiError::binding())
        }
        Err(e) => {
            debug!(error = %e, "Request body is not valid JSON");
            Err(ApiError::binding())
        }
    }
}

fn query_object(query: Option<&str>) -> Map<String, Value> {
    let mut grouped: Vec<(String, Vec<String>, bool)> = Vec::new();

    for (raw_key, value) in query_pairs(query) {
        let (key, forced_array) = match raw_key.strip_suffix("[]") {
            Some(stripped) => (stripped.to_string(), true),
            None => (raw_key, false),
        };

        match grouped.iter_mut().find(|(k, _, _)| *k == key) {
            Some((_, values, is_array)) => {
                values.push(value);
                *is_array = true;
            }
            None => grouped.push((key, vec![value], forced_array)),
        }
    }

    grouped
        .into_iter()
        .map(|(key, mut values, is_array)| {
            let value = if is_array {
                Value::Array(values.into_iter().map(Value::String).collect())
            } else {
                Value::String(values.pop().unwrap_or_default())
            };
            (key, value)
        })
        .collect()
}
