//! Static declarations of the reporting endpoints.
//!
//! Each endpoint is backed by one database view. The declarations carry
//! everything the list service needs at request time: the view's fields
//! and types, how the endpoint paginates and orders, and how rows are
//! presented.

use crate::error::ConfigError;
use lazy_static::lazy_static;
use model::{
    core::{
        data_type::DataType,
        schema::{FieldSpec, ViewSchema},
    },
    pagination::PaginationError,
};
use planner::{
    OrderingPolicy,
    aggregate::{AggregateFn, AggregateSpec, Period},
};
use tracing::debug;

pub const DB_SCHEMA: &str = "lido";

lazy_static! {
    static ref STANDARD: Endpoints = Endpoints::standard();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointKind {
    Counters,
    Observations,
    ObservationAggregate,
    Sources,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_size: u64,
    pub max_size: u64,
}

impl PageLimits {
    pub const fn new(default_size: u64, max_size: u64) -> Self {
        PageLimits {
            default_size,
            max_size,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationStyle {
    /// Keyset cursors, switching to page numbers when the request carries
    /// a `page` parameter.
    Cursor {
        cursor: PageLimits,
        page_number: PageLimits,
    },
    PageNumber(PageLimits),
    Unpaginated,
}

/// One entry of a presented row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultField {
    /// A view field copied as is.
    Field(&'static str),
    /// Absolute link to a row of another endpoint, keyed by `key_field`.
    Link {
        name: &'static str,
        endpoint: &'static str,
        key_field: &'static str,
    },
    /// GeoJSON point built from two coordinate fields.
    Point {
        name: &'static str,
        longitude: &'static str,
        latitude: &'static str,
    },
}

impl ResultField {
    pub fn name(&self) -> &'static str {
        match self {
            ResultField::Field(name) => *name,
            ResultField::Link { name, .. } | ResultField::Point { name, .. } => *name,
        }
    }
}

/// How the aggregate endpoint groups its base view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateTemplate {
    pub time_field: &'static str,
    pub value_field: &'static str,
    pub group_fields: Vec<&'static str>,
}

impl AggregateTemplate {
    pub fn spec(
        &self,
        base: &ViewSchema,
        period: Period,
        function: AggregateFn,
        timezone: &str,
    ) -> AggregateSpec {
        AggregateSpec {
            base: base.clone(),
            period,
            function,
            timezone: timezone.to_string(),
            time_field: self.time_field.to_string(),
            value_field: self.value_field.to_string(),
            group_fields: self.group_fields.iter().map(|f| f.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    pub kind: EndpointKind,
    /// Path below the API base URL, without slashes at either end.
    pub path: &'static str,
    pub schema: ViewSchema,
    pub pagination: PaginationStyle,
    pub ordering: OrderingPolicy,
    pub results: Vec<ResultField>,
    /// Field used by retrieve-by-key, when the endpoint supports it.
    pub lookup_field: Option<&'static str>,
    pub aggregate: Option<AggregateTemplate>,
}

impl EndpointConfig {
    /// Checks the ordering policy against the fields the endpoint pages
    /// over, and that every presented field exists.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let output = match &self.aggregate {
            Some(template) => template
                .spec(&self.schema, Period::Day, AggregateFn::Sum, "UTC")
                .output_schema()?,
            None => self.schema.clone(),
        };

        self.ordering
            .validate(&output)
            .map_err(|source| ConfigError::Endpoint {
                endpoint: self.path.to_string(),
                source,
            })?;

        let missing = |field: &str| ConfigError::Endpoint {
            endpoint: self.path.to_string(),
            source: PaginationError::Configuration(format!(
                "result field '{field}' is not part of {}",
                output.table
            )),
        };
        for result in &self.results {
            let needed: Vec<&str> = match result {
                ResultField::Field(name) => vec![*name],
                ResultField::Link { key_field, .. } => vec![*key_field],
                ResultField::Point {
                    longitude,
                    latitude,
                    ..
                } => vec![*longitude, *latitude],
            };
            if let Some(field) = needed.into_iter().find(|f| output.field(f).is_none()) {
                return Err(missing(field));
            }
        }
        if let Some(lookup) = self.lookup_field {
            if self.schema.field(lookup).is_none() {
                return Err(missing(lookup));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    entries: Vec<EndpointConfig>,
}

impl Endpoints {
    pub fn new(entries: Vec<EndpointConfig>) -> Self {
        Endpoints { entries }
    }

    /// The endpoint table the API serves.
    pub fn standard() -> Self {
        Endpoints::new(vec![counters(), observations(), aggregate(), sources()])
    }

    /// Shared instance of [`Endpoints::standard`].
    pub fn global() -> &'static Endpoints {
        &STANDARD
    }

    pub fn get(&self, path: &str) -> Option<&EndpointConfig> {
        let path = path.trim_matches('/');
        self.entries.iter().find(|e| e.path == path)
    }

    pub fn by_kind(&self, kind: EndpointKind) -> Option<&EndpointConfig> {
        self.entries.iter().find(|e| e.kind == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EndpointConfig> {
        self.entries.iter()
    }

    /// Validates every endpoint; run once at startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for endpoint in &self.entries {
            endpoint.validate()?;
            debug!(endpoint = endpoint.path, "Endpoint configuration validated");
        }
        Ok(())
    }
}

fn counters() -> EndpointConfig {
    let schema = ViewSchema::new(
        "vw_counters",
        vec![
            FieldSpec::new("id", "id", DataType::Int),
            FieldSpec::new("name", "name", DataType::String),
            FieldSpec::new("classifying", "classifying", DataType::Boolean),
            FieldSpec::new("longitude", "longitude", DataType::Float),
            FieldSpec::new("latitude", "latitude", DataType::Float),
            FieldSpec::new("crs_epsg", "crs_epsg", DataType::Int),
            FieldSpec::new("source", "source", DataType::String),
            FieldSpec::new("municipality_code", "municipality_code", DataType::Int),
        ],
    )
    .with_schema(DB_SCHEMA);

    EndpointConfig {
        kind: EndpointKind::Counters,
        path: "counters",
        schema,
        pagination: PaginationStyle::PageNumber(PageLimits::new(100, 1000)),
        ordering: OrderingPolicy::new(&["id", "source"], "id"),
        results: vec![
            ResultField::Field("id"),
            ResultField::Field("name"),
            ResultField::Field("classifying"),
            ResultField::Field("crs_epsg"),
            ResultField::Field("source"),
            ResultField::Point {
                name: "geometry",
                longitude: "longitude",
                latitude: "latitude",
            },
        ],
        lookup_field: Some("id"),
        aggregate: None,
    }
}

fn observation_schema() -> ViewSchema {
    ViewSchema::new(
        "vw_observations",
        vec![
            // ctid is only unique within one source, which is enough for a
            // tie-break behind the other keys.
            FieldSpec::text("id", "ctid"),
            FieldSpec::new("counter_id", "id", DataType::Int),
            FieldSpec::new("direction", "direction", DataType::String),
            FieldSpec::new("value", "value", DataType::Int),
            FieldSpec::new("unit", "unit", DataType::String),
            FieldSpec::new("typeofmeasurement", "typeofmeasurement", DataType::String),
            FieldSpec::new(
                "phenomenondurationseconds",
                "phenomenondurationseconds",
                DataType::Int,
            ),
            FieldSpec::new("vehicletype", "vehicletype", DataType::String),
            FieldSpec::new("datetime", "datetime", DataType::Timestamp),
            FieldSpec::new("source", "source", DataType::String),
        ],
    )
    .with_schema(DB_SCHEMA)
}

fn observations() -> EndpointConfig {
    let fixed = ["typeofmeasurement", "direction", "vehicletype"];
    let ordering = OrderingPolicy::new(
        &[
            "-datetime",
            "counter_id",
            "typeofmeasurement",
            "direction",
            "vehicletype",
        ],
        "id",
    )
    .with_alias("counter", "counter_id")
    .with_allowed(&["datetime", "counter"])
    .with_secondary("counter_id", "-datetime")
    .with_secondary("datetime", "counter_id")
    .with_fixed(&fixed);

    EndpointConfig {
        kind: EndpointKind::Observations,
        path: "observations",
        schema: observation_schema(),
        pagination: PaginationStyle::Cursor {
            cursor: PageLimits::new(1000, 10000),
            page_number: PageLimits::new(1000, 10000),
        },
        ordering,
        results: vec![
            ResultField::Field("typeofmeasurement"),
            ResultField::Field("phenomenondurationseconds"),
            ResultField::Field("vehicletype"),
            ResultField::Field("direction"),
            ResultField::Field("unit"),
            ResultField::Field("value"),
            ResultField::Field("datetime"),
            ResultField::Field("source"),
            ResultField::Link {
                name: "counter",
                endpoint: "counters",
                key_field: "counter_id",
            },
            ResultField::Field("counter_id"),
        ],
        lookup_field: None,
        aggregate: None,
    }
}

fn aggregate() -> EndpointConfig {
    let ordering = OrderingPolicy::new(&["-start_time"], "unit")
        .with_allowed(&["start_time"])
        .with_fixed(&["counter_id", "direction"]);

    EndpointConfig {
        kind: EndpointKind::ObservationAggregate,
        path: "observations/aggregate",
        schema: observation_schema(),
        pagination: PaginationStyle::PageNumber(PageLimits::new(1000, 10000)),
        ordering,
        results: vec![
            ResultField::Field("period"),
            ResultField::Field("counter_id"),
            ResultField::Field("start_time"),
            ResultField::Field("direction"),
            ResultField::Field("unit"),
            ResultField::Field("aggregated_value"),
        ],
        lookup_field: None,
        aggregate: Some(AggregateTemplate {
            time_field: "datetime",
            value_field: "value",
            group_fields: vec!["counter_id", "direction", "unit"],
        }),
    }
}

fn sources() -> EndpointConfig {
    let schema = ViewSchema::new(
        "data_sources",
        vec![
            FieldSpec::new("name", "name", DataType::String),
            // Column is switched per request by the `language` parameter.
            FieldSpec::new("description", "description_en", DataType::String),
            FieldSpec::new("license", "license", DataType::String),
        ],
    )
    .with_schema(DB_SCHEMA);

    EndpointConfig {
        kind: EndpointKind::Sources,
        path: "metadata/sources",
        schema,
        pagination: PaginationStyle::Unpaginated,
        ordering: OrderingPolicy::new(&["name"], "name"),
        results: vec![
            ResultField::Field("name"),
            ResultField::Field("description"),
            ResultField::Field("license"),
        ],
        lookup_field: Some("name"),
        aggregate: None,
    }
}
