use std::ops::Deref;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use serde_querystring::ParseMode;

use crate::infrastructure::http::api::ApiError;

/// Query string extractor, malformed input is a 400 in the API error format.
///
/// Escapes that do not decode to UTF-8 are read with replacement characters
/// instead of failing the request.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryString<T>(pub T);

impl<T, S> FromRequestParts<S> for QueryString<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let query = parts.uri.query().unwrap_or_default();
        serde_querystring::from_str(query, ParseMode::Duplicate)
            .or_else(|_| serde_querystring::from_str(&lossy_query(query), ParseMode::Duplicate))
            .map(QueryString)
            .map_err(|e| ApiError::BadRequest(format!("Failed to deserialize query string: {e}")))
    }
}

impl<T> Deref for QueryString<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Re-encodes every key and value through a lossy UTF-8 decode
fn lossy_query(query: &str) -> String {
    query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => format!("{}={}", lossy_part(key), lossy_part(value)),
            None => lossy_part(pair),
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn lossy_part(part: &str) -> String {
    let spaced = part.replace('+', " ");
    let bytes = urlencoding::decode_binary(spaced.as_bytes());
    urlencoding::encode(&String::from_utf8_lossy(&bytes)).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_utf8_escapes_become_replacement_characters() {
        assert_eq!(lossy_query("q=%FF&page=2"), "q=%EF%BF%BD&page=2");
    }

    #[test]
    fn valid_input_keeps_its_meaning() {
        assert_eq!(
            lossy_query("q=Draft+MOU&country=Vi%E1%BB%87t"),
            "q=Draft%20MOU&country=Vi%E1%BB%87t"
        );
        assert_eq!(lossy_query("handler_id"), "handler_id");
    }
}
