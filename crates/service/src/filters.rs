//! Per-endpoint filter parameters.

use crate::{error::ServiceError, params::QueryParams};
use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use model::{
    core::{schema::ViewSchema, value::Value},
    pagination::PaginationError,
};
use planner::{
    Source,
    aggregate::{AggregateFn, Period},
    query::{ast::expr::Expr, filter},
};
use service_config::{EndpointConfig, EndpointKind, ServiceSettings};

const LANGUAGES: [&str; 3] = ["en", "fi", "sv"];
const DEFAULT_LANGUAGE: &str = "en";

/// What a request selects: the row source (aggregation and column choices
/// included) and the filter over it.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub source: Source,
    pub filter: Option<Expr>,
}

/// Builds the selection for `endpoint`. `params` is `None` for
/// documentation callers, who get the unfiltered base source.
pub fn select(
    endpoint: &EndpointConfig,
    params: Option<&QueryParams>,
    settings: &ServiceSettings,
) -> Result<Selection, ServiceError> {
    let Some(params) = params else {
        return Ok(Selection {
            source: base_source(endpoint, settings)?,
            filter: None,
        });
    };

    let tz = settings.timezone;
    let mut terms = Vec::new();

    let source = match endpoint.kind {
        EndpointKind::Counters => {
            if let Some(source) = params.get("source") {
                terms.push(filter::eq_ci("source", source));
            }
            if let Some(codes) = int_list(params, "municipality_code")? {
                terms.push(filter::in_list("municipality_code", codes));
            }
            Source::View(endpoint.schema.clone())
        }
        EndpointKind::Observations => {
            if let Some(counters) = int_list(params, "counter")? {
                terms.push(filter::in_list("counter_id", counters));
            }
            date_range(params, tz, &mut terms)?;
            if let Some(kind) = params.get("measurement_type") {
                terms.push(filter::eq_ci("typeofmeasurement", kind));
            }
            if let Some(source) = params.get("source") {
                terms.push(filter::eq_ci("source", source));
            }
            Source::View(endpoint.schema.clone())
        }
        EndpointKind::ObservationAggregate => {
            let counter = params
                .get("counter")
                .ok_or_else(|| ServiceError::required("counter"))?;
            let counter = counter
                .parse::<i64>()
                .map_err(|_| ServiceError::invalid_filter("counter", "Enter a number."))?;
            terms.push(filter::eq("counter_id", Value::Int(counter)));

            let period = params
                .get("period")
                .ok_or_else(|| ServiceError::required("period"))?
                .parse::<Period>()
                .map_err(|e| ServiceError::invalid_filter("period", e.to_string()))?;

            let kind = params
                .get("measurement_type")
                .ok_or_else(|| ServiceError::required("measurement_type"))?;
            terms.push(filter::eq_ci("typeofmeasurement", kind));

            date_range(params, tz, &mut terms)?;

            aggregate_source(endpoint, period, AggregateFn::for_measurement(kind), tz)?
        }
        EndpointKind::Sources => {
            let language = params.get("language").unwrap_or(DEFAULT_LANGUAGE);
            Source::View(localized(&endpoint.schema, language)?)
        }
    };

    Ok(Selection {
        source,
        filter: filter::all(terms),
    })
}

fn base_source(
    endpoint: &EndpointConfig,
    settings: &ServiceSettings,
) -> Result<Source, ServiceError> {
    match endpoint.kind {
        EndpointKind::ObservationAggregate => {
            aggregate_source(endpoint, Period::Day, AggregateFn::Sum, settings.timezone)
        }
        _ => Ok(Source::View(endpoint.schema.clone())),
    }
}

fn aggregate_source(
    endpoint: &EndpointConfig,
    period: Period,
    function: AggregateFn,
    tz: Tz,
) -> Result<Source, ServiceError> {
    let template = endpoint.aggregate.as_ref().ok_or_else(|| {
        PaginationError::Configuration(format!("{} has no aggregate declaration", endpoint.path))
    })?;
    Ok(Source::Aggregate(template.spec(
        &endpoint.schema,
        period,
        function,
        tz.name(),
    )))
}

/// Points `description` at the column of the requested language.
fn localized(schema: &ViewSchema, language: &str) -> Result<ViewSchema, ServiceError> {
    if !LANGUAGES.contains(&language) {
        return Err(ServiceError::invalid_filter(
            "language",
            format!("Select a valid choice. {language} is not one of the available choices."),
        ));
    }

    let mut schema = schema.clone();
    for field in schema.fields.iter_mut().filter(|f| f.name == "description") {
        field.column = format!("description_{language}");
    }
    Ok(schema)
}

fn int_list(params: &QueryParams, key: &str) -> Result<Option<Vec<Value>>, ServiceError> {
    let raw = params.list(key);
    if raw.is_empty() {
        return Ok(None);
    }
    raw.into_iter()
        .map(|v| {
            v.parse::<i64>()
                .map(Value::Int)
                .map_err(|_| ServiceError::invalid_filter(key, format!("'{v}' is not a number")))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

// start_date is inclusive from local midnight; end_date is inclusive to the
// end of that local day.
fn date_range(params: &QueryParams, tz: Tz, terms: &mut Vec<Expr>) -> Result<(), ServiceError> {
    if let Some(start) = date_param(params, "start_date")? {
        terms.push(filter::gte(
            "datetime",
            Value::Timestamp(local_midnight(start, tz, "start_date")?),
        ));
    }
    if let Some(end) = date_param(params, "end_date")? {
        let next_day = end
            .checked_add_days(Days::new(1))
            .ok_or_else(|| ServiceError::invalid_filter("end_date", "date out of range"))?;
        terms.push(filter::lt(
            "datetime",
            Value::Timestamp(local_midnight(next_day, tz, "end_date")?),
        ));
    }
    Ok(())
}

fn date_param(params: &QueryParams, key: &str) -> Result<Option<NaiveDate>, ServiceError> {
    params
        .get(key)
        .map(|raw| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_| ServiceError::invalid_filter(key, "Enter a valid date (YYYY-MM-DD)."))
        })
        .transpose()
}

fn local_midnight(date: NaiveDate, tz: Tz, key: &str) -> Result<DateTime<Utc>, ServiceError> {
    tz.from_local_datetime(&date.and_time(NaiveTime::MIN))
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| ServiceError::invalid_filter(key, "no such local time"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use planner::query::{dialect::Postgres, renderer::render_sql};
    use service_config::Endpoints;

    fn endpoint(kind: EndpointKind) -> &'static EndpointConfig {
        Endpoints::global().by_kind(kind).unwrap()
    }

    fn render(selection: &Selection) -> (String, Vec<Value>) {
        render_sql(selection.filter.as_ref().unwrap(), &Postgres)
    }

    #[test]
    fn test_observation_filters() {
        let params = QueryParams::parse(
            "counter=1,2&start_date=2024-01-01&end_date=2024-01-31&measurement_type=count&source=LAM",
        );
        let selection = select(
            endpoint(EndpointKind::Observations),
            Some(&params),
            &ServiceSettings::default(),
        )
        .unwrap();

        let (sql, params) = render(&selection);
        assert!(sql.contains(r#""counter_id" IN ($1::BIGINT, $2::BIGINT)"#));
        assert!(sql.contains(r#"("datetime" >= $3::TIMESTAMPTZ)"#));
        assert!(sql.contains(r#"("datetime" < $4::TIMESTAMPTZ)"#));
        // Helsinki is UTC+2 in winter.
        assert_eq!(
            params[2],
            Value::Timestamp(Utc.with_ymd_and_hms(2023, 12, 31, 22, 0, 0).unwrap())
        );
        assert_eq!(
            params[3],
            Value::Timestamp(Utc.with_ymd_and_hms(2024, 1, 31, 22, 0, 0).unwrap())
        );
        assert_eq!(params.len(), 6);
    }

    #[test]
    fn test_counter_list_must_be_numeric() {
        let params = QueryParams::parse("counter=1,x");
        let err = select(
            endpoint(EndpointKind::Observations),
            Some(&params),
            &ServiceSettings::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidFilter { param, .. } if param == "counter"));
    }

    #[test]
    fn test_municipality_code_accepts_leading_zero() {
        let params = QueryParams::parse("municipality_code=091,49");
        let selection = select(
            endpoint(EndpointKind::Counters),
            Some(&params),
            &ServiceSettings::default(),
        )
        .unwrap();
        let (_, values) = render(&selection);
        assert_eq!(values, vec![Value::Int(91), Value::Int(49)]);
    }

    #[test]
    fn test_aggregate_requires_its_parameters() {
        let settings = ServiceSettings::default();
        let aggregate = endpoint(EndpointKind::ObservationAggregate);

        for (query, missing) in [
            ("period=day&measurement_type=count", "counter"),
            ("counter=1&measurement_type=count", "period"),
            ("counter=1&period=day", "measurement_type"),
        ] {
            let err = select(aggregate, Some(&QueryParams::parse(query)), &settings).unwrap_err();
            assert!(
                matches!(&err, ServiceError::InvalidFilter { param, .. } if param == missing),
                "{query}: {err}"
            );
        }

        let err = select(
            aggregate,
            Some(&QueryParams::parse("counter=1&period=decade&measurement_type=count")),
            &settings,
        )
        .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_aggregate_speed_is_averaged() {
        let selection = select(
            endpoint(EndpointKind::ObservationAggregate),
            Some(&QueryParams::parse("counter=7&period=week&measurement_type=speed")),
            &ServiceSettings::default(),
        )
        .unwrap();

        match selection.source {
            Source::Aggregate(spec) => {
                assert_eq!(spec.function, AggregateFn::Avg);
                assert_eq!(spec.period, Period::Week);
                assert_eq!(spec.timezone, "Europe/Helsinki");
            }
            other => panic!("expected aggregate source, got {other:?}"),
        }
    }

    #[test]
    fn test_sources_language_switches_description_column() {
        let sources = endpoint(EndpointKind::Sources);
        let selection = select(
            sources,
            Some(&QueryParams::parse("language=fi")),
            &ServiceSettings::default(),
        )
        .unwrap();
        match selection.source {
            Source::View(schema) => {
                assert_eq!(schema.field("description").unwrap().column, "description_fi")
            }
            other => panic!("expected view source, got {other:?}"),
        }

        let err = select(
            sources,
            Some(&QueryParams::parse("language=de")),
            &ServiceSettings::default(),
        )
        .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_documentation_gets_base_source() {
        let selection = select(
            endpoint(EndpointKind::ObservationAggregate),
            None,
            &ServiceSettings::default(),
        )
        .unwrap();
        assert!(selection.filter.is_none());
        assert!(matches!(selection.source, Source::Aggregate(_)));
    }
}
