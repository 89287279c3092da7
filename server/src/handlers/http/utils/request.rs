use bytes::Bytes;
use hyper::Request;

use shared::types::pagination::{all_values, first_value, query_pairs};

use crate::handlers::http::error::ApiError;

/// `:name` segments captured by the router, in route order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(Vec<(String, String)>);

impl PathParams {
    pub fn push(&mut self, name: &str, value: &str) {
        self.0.push((name.to_string(), value.to_string()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Integer path parameter `name`. Anything that is not an integer is a 400.
pub fn path_id(req: &Request<Bytes>, name: &str) -> Result<i64, ApiError> {
    let raw = req
        .extensions()
        .get::<PathParams>()
        .and_then(|params| params.get(name))
        .ok_or_else(|| ApiError::bad_request(format!("Missing {} parameter", name)))?;

    raw.trim()
        .parse::<i64>()
        .map_err(|_| ApiError::bad_request(format!("Invalid {} parameter", name)))
}

/// Decoded query string of `req`.
pub fn query(req: &Request<Bytes>) -> Vec<(String, String)> {
    query_pairs(req.uri().query())
}

/// Every integer supplied for `key`. Blank values are skipped.
pub fn id_values(pairs: &[(String, String)], key: &str) -> Result<Vec<i64>, ApiError> {
    all_values(pairs, key)
        .into_iter()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| {
            v.parse::<i64>()
                .map_err(|_| ApiError::bad_request(format!("Invalid {} parameter", key)))
        })
        .collect()
}

/// Every non-blank text value supplied for `key`.
pub fn text_values<'a>(pairs: &'a [(String, String)], key: &str) -> Vec<&'a str> {
    all_values(pairs, key)
        .into_iter()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect()
}

/// First non-blank value for `key`, if any.
pub fn text_value<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    first_value(pairs, key).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(uri: &str, params: PathParams) -> Request<Bytes> {
        let mut req = Request::builder().uri(uri).body(Bytes::new()).unwrap();
        req.extensions_mut().insert(params);
        req
    }

    #[test]
    fn path_id_parses_integers() {
        let mut params = PathParams::default();
        params.push("id", "42");
        assert_eq!(path_id(&request("/x/42", params), "id").unwrap(), 42);
    }

    #[test]
    fn path_id_rejects_text() {
        let mut params = PathParams::default();
        params.push("id", "abc");
        let err = path_id(&request("/x/abc", params), "id").unwrap_err();
        assert_eq!(err.to_string(), "Invalid id parameter");
    }

    #[test]
    fn repeated_ids_are_collected() {
        let pairs = query_pairs(Some("category=1&category=&category=3&page=2"));
        assert_eq!(id_values(&pairs, "category").unwrap(), vec![1, 3]);
        assert!(id_values(&pairs, "topCategory").unwrap().is_empty());
    }

    #[test]
    fn non_numeric_filter_id_is_rejected() {
        let pairs = query_pairs(Some("manufacturer=acme"));
        assert!(matches!(
            id_values(&pairs, "manufacturer"),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn text_values_skip_blanks() {
        let pairs = query_pairs(Some("name=+tent+&name=&name=tarp"));
        assert_eq!(text_values(&pairs, "name"), vec!["tent", "tarp"]);
        assert_eq!(text_value(&pairs, "name"), Some("tent"));
    }
}
