use crate::present::JsonObject;
use serde::Serialize;

/// Body of a paginated list response. `count` is only present in
/// page-number mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<JsonObject>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ListResponse {
    Page(PageBody),
    /// Unpaginated endpoints answer with a bare array.
    Rows(Vec<JsonObject>),
}

impl ListResponse {
    pub fn results(&self) -> &[JsonObject] {
        match self {
            ListResponse::Page(body) => &body.results,
            ListResponse::Rows(rows) => rows,
        }
    }

    pub fn next(&self) -> Option<&str> {
        match self {
            ListResponse::Page(body) => body.next.as_deref(),
            ListResponse::Rows(_) => None,
        }
    }

    pub fn previous(&self) -> Option<&str> {
        match self {
            ListResponse::Page(body) => body.previous.as_deref(),
            ListResponse::Rows(_) => None,
        }
    }

    pub fn count(&self) -> Option<u64> {
        match self {
            ListResponse::Page(body) => body.count,
            ListResponse::Rows(rows) => Some(rows.len() as u64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cursor_page_omits_count() {
        let body = ListResponse::Page(PageBody {
            count: None,
            next: Some("https://api.test/observations/?cursor=abc".into()),
            previous: None,
            results: vec![],
        });
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "next": "https://api.test/observations/?cursor=abc",
                "previous": null,
                "results": []
            })
        );
    }

    #[test]
    fn test_unpaginated_is_bare_array() {
        let mut row = JsonObject::new();
        row.insert("name".into(), json!("LAM"));
        let body = ListResponse::Rows(vec![row]);
        assert_eq!(serde_json::to_value(&body).unwrap(), json!([{ "name": "LAM" }]));
    }
}
