//! Query parameters of a list request.

use service_config::PageLimits;
use url::{Url, form_urlencoded};

pub const PAGE: &str = "page";
pub const PAGE_SIZE: &str = "page_size";
pub const CURSOR: &str = "cursor";
pub const ORDER: &str = "order";

/// Decoded query string. Repeated keys are kept; lookups see the last one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn from_url(url: &Url) -> Self {
        QueryParams {
            pairs: url.query_pairs().into_owned().collect(),
        }
    }

    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        QueryParams {
            pairs: form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect(),
        }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        QueryParams {
            pairs: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Last value of `key`, trimmed; blank values count as absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// True when `key` appears at all, even with a blank value.
    pub fn contains(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    /// Comma separated values of `key`, blanks dropped.
    pub fn list(&self, key: &str) -> Vec<&str> {
        self.get(key)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn order_tokens(&self) -> Vec<&str> {
        self.list(ORDER)
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Page size for a request: the requested size capped at the maximum, or
/// the default when the request names none, a non-positive one, or
/// something that is not a number.
pub fn page_size(params: &QueryParams, limits: PageLimits, global_max: Option<u64>) -> u64 {
    let max = global_max.map_or(limits.max_size, |cap| cap.min(limits.max_size));
    let default = limits.default_size.min(max);

    match params.get(PAGE_SIZE).map(str::parse::<i64>) {
        Some(Ok(requested)) if requested > 0 => (requested as u64).min(max),
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMITS: PageLimits = PageLimits::new(1000, 10000);

    #[test]
    fn test_parse_decodes_and_keeps_last_value() {
        let params = QueryParams::parse("?order=-datetime&source=l%C3%A4m&order=counter");
        assert_eq!(params.get("source"), Some("läm"));
        assert_eq!(params.get(ORDER), Some("counter"));
        assert!(params.get("missing").is_none());
    }

    #[test]
    fn test_list_splits_on_commas() {
        let params = QueryParams::from_pairs([("counter", "1, 2,,3"), ("order", "")]);
        assert_eq!(params.list("counter"), vec!["1", "2", "3"]);
        assert!(params.order_tokens().is_empty());
        assert!(params.contains("order"));
    }

    #[test]
    fn test_page_size_clamps_and_falls_back() {
        let size =
            |raw: &str| page_size(&QueryParams::from_pairs([(PAGE_SIZE, raw)]), LIMITS, None);

        assert_eq!(size("50"), 50);
        assert_eq!(size("20000"), 10000);
        assert_eq!(size("0"), 1000);
        assert_eq!(size("-5"), 1000);
        assert_eq!(size("lots"), 1000);
        assert_eq!(page_size(&QueryParams::default(), LIMITS, None), 1000);
    }

    #[test]
    fn test_global_cap_applies_to_default_and_max() {
        let params = QueryParams::from_pairs([(PAGE_SIZE, "5000")]);
        assert_eq!(page_size(&params, LIMITS, Some(2000)), 2000);
        assert_eq!(page_size(&QueryParams::default(), LIMITS, Some(500)), 500);
    }
}
