//! Rendering fetched rows into response objects.

use model::{core::value::Value, records::row::RowData};
use serde_json::{Map, Value as Json, json};
use service_config::endpoints::ResultField;
use url::Url;

pub type JsonObject = Map<String, Json>;

/// Renders `row` as the endpoint's result object. Links are absolute,
/// joined onto `base_url`.
pub fn present(row: &RowData, fields: &[ResultField], base_url: &Url) -> JsonObject {
    fields
        .iter()
        .map(|field| {
            let value = match field {
                ResultField::Field(name) => row.get_value(name).to_json(),
                ResultField::Link {
                    endpoint,
                    key_field,
                    ..
                } => link(row.get_value(key_field), endpoint, base_url),
                ResultField::Point {
                    longitude,
                    latitude,
                    ..
                } => point(row.get_value(longitude), row.get_value(latitude)),
            };
            (field.name().to_string(), value)
        })
        .collect()
}

/// Absolute URL of `endpoint`'s collection, with a trailing slash.
pub fn endpoint_url(base_url: &Url, endpoint: &str) -> Option<Url> {
    base_url.join(&format!("{}/", endpoint.trim_matches('/'))).ok()
}

fn link(key: Value, endpoint: &str, base_url: &Url) -> Json {
    if key.is_null() {
        return Json::Null;
    }
    endpoint_url(base_url, endpoint)
        .and_then(|url| url.join(&format!("{}/", key.to_position_string())).ok())
        .map(|url| Json::String(url.into()))
        .unwrap_or(Json::Null)
}

fn point(longitude: Value, latitude: Value) -> Json {
    match (longitude.as_f64(), latitude.as_f64()) {
        (Some(x), Some(y)) => json!({ "type": "Point", "coordinates": [x, y] }),
        _ => Json::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://api.test/api/").unwrap()
    }

    #[test]
    fn test_link_and_field_order() {
        let row = RowData::from_pairs(
            "vw_observations",
            [
                ("counter_id", Value::Int(42)),
                ("value", Value::Int(3)),
                ("id", Value::from("(0,1)")),
            ],
        );
        let fields = [
            ResultField::Field("value"),
            ResultField::Link {
                name: "counter",
                endpoint: "counters",
                key_field: "counter_id",
            },
            ResultField::Field("counter_id"),
        ];

        let object = present(&row, &fields, &base());
        let keys: Vec<&str> = object.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["value", "counter", "counter_id"]);
        assert_eq!(object["counter"], json!("https://api.test/api/counters/42/"));
        assert!(!object.contains_key("id"));
    }

    #[test]
    fn test_point_geometry() {
        let row = RowData::from_pairs(
            "vw_counters",
            [
                ("longitude", Value::Float(24.9)),
                ("latitude", Value::Float(60.2)),
            ],
        );
        let fields = [ResultField::Point {
            name: "geometry",
            longitude: "longitude",
            latitude: "latitude",
        }];

        let object = present(&row, &fields, &base());
        assert_eq!(
            object["geometry"],
            json!({ "type": "Point", "coordinates": [24.9, 60.2] })
        );

        let empty = RowData::from_pairs("vw_counters", [("longitude", Value::Null)]);
        assert_eq!(present(&empty, &fields, &base())["geometry"], Json::Null);
    }
}
