//! Query-string rewriting for `next` and `previous` links.

use url::Url;

/// `url` with `key` set to `value`, replacing every previous occurrence.
/// Parameters are sorted by key so equal requests produce equal links.
pub fn replace_query_param(url: &Url, key: &str, value: &str) -> Url {
    let mut pairs = other_pairs(url, key);
    pairs.push((key.to_string(), value.to_string()));
    with_pairs(url, pairs)
}

/// `url` without `key`.
pub fn remove_query_param(url: &Url, key: &str) -> Url {
    with_pairs(url, other_pairs(url, key))
}

fn other_pairs(url: &Url, key: &str) -> Vec<(String, String)> {
    url.query_pairs()
        .into_owned()
        .filter(|(k, _)| k != key)
        .collect()
}

fn with_pairs(url: &Url, mut pairs: Vec<(String, String)>) -> Url {
    let mut url = url.clone();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    if pairs.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(pairs);
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(raw: &str) -> Url {
        Url::parse(raw).unwrap()
    }

    #[test]
    fn test_replace_sorts_and_replaces() {
        let base = url("https://api.test/observations/?page_size=3&cursor=old&counter=1,2");
        let next = replace_query_param(&base, "cursor", "abc");
        assert_eq!(
            next.as_str(),
            "https://api.test/observations/?counter=1%2C2&cursor=abc&page_size=3"
        );
    }

    #[test]
    fn test_remove_drops_empty_query() {
        let base = url("https://api.test/counters/?page=2");
        assert_eq!(
            remove_query_param(&base, "page").as_str(),
            "https://api.test/counters/"
        );
    }
}
