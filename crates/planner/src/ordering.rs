//! Resolves the ordering a request asks for into a total ordering.

use model::{
    core::schema::ViewSchema,
    pagination::{OrderField, Ordering, PaginationError},
};
use tracing::debug;

/// How one endpoint orders its rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderingPolicy {
    /// Used when the request names no ordering.
    pub default: Ordering,
    /// Public ordering names mapped onto view fields, e.g. `counter` onto
    /// `counter_id`. Names without an entry map onto themselves.
    pub aliases: Vec<(String, String)>,
    /// Public names a request may order by.
    pub allowed: Vec<String>,
    /// When a request orders by exactly one field, the ordering appended
    /// after it (e.g. `counter_id` gets `-datetime`).
    pub secondary: Vec<(String, OrderField)>,
    /// Tie-break fields appended ascending after the requested ones.
    pub fixed: Vec<String>,
    /// Field whose values are unique (or nearly so); always the last key.
    pub unique_key: Option<String>,
}

impl OrderingPolicy {
    pub fn new(default: &[&str], unique_key: &str) -> Self {
        OrderingPolicy {
            default: Ordering::from_tokens(default),
            aliases: Vec::new(),
            allowed: Vec::new(),
            secondary: Vec::new(),
            fixed: Vec::new(),
            unique_key: Some(unique_key.to_string()),
        }
    }

    pub fn with_alias(mut self, public: &str, field: &str) -> Self {
        self.aliases.push((public.to_string(), field.to_string()));
        self
    }

    pub fn with_allowed(mut self, public: &[&str]) -> Self {
        self.allowed = public.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn with_secondary(mut self, field: &str, secondary: &str) -> Self {
        if let Some(order) = OrderField::parse(secondary) {
            self.secondary.push((field.to_string(), order));
        }
        self
    }

    pub fn with_fixed(mut self, fields: &[&str]) -> Self {
        self.fixed = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    /// True when requests may choose the ordering at all.
    pub fn accepts_requests(&self) -> bool {
        !self.allowed.is_empty()
    }

    /// Resolves the requested `-field` tokens into a total ordering.
    ///
    /// An empty request yields the default ordering. The unique key is
    /// appended unless the ordering already references it in either
    /// direction. The result is deterministic for a given request.
    pub fn resolve<S: AsRef<str>>(&self, requested: &[S]) -> Result<Ordering, PaginationError> {
        let unique_key = self.unique_key.as_deref().ok_or_else(|| {
            PaginationError::Configuration("ordering has no unique key".to_string())
        })?;

        let requested: Vec<OrderField> = requested
            .iter()
            .filter_map(|token| OrderField::parse(token.as_ref()))
            .collect();

        let mut ordering = if requested.is_empty() {
            self.default.clone()
        } else {
            let mut ordering = Ordering::new(Vec::with_capacity(requested.len() + 4));
            for order in &requested {
                let field = self.storage_field(&order.field)?;
                ordering.push_missing(OrderField {
                    field: field.to_string(),
                    direction: order.direction,
                });
            }

            let secondary = match ordering.fields() {
                [only] => self
                    .secondary
                    .iter()
                    .find(|(field, _)| *field == only.field)
                    .map(|(_, secondary)| secondary.clone()),
                _ => None,
            };
            if let Some(secondary) = secondary {
                ordering.push_missing(secondary);
            }
            ordering
        };

        for field in &self.fixed {
            ordering.push_missing(OrderField::asc(field));
        }
        ordering.push_missing(OrderField::asc(unique_key));

        debug!(ordering = %ordering, "Resolved ordering");
        Ok(ordering)
    }

    /// Checks every field the policy can produce exists in `schema`.
    pub fn validate(&self, schema: &ViewSchema) -> Result<(), PaginationError> {
        let missing = |field: &str| {
            PaginationError::Configuration(format!(
                "ordering field '{field}' is not part of {}",
                schema.table
            ))
        };

        let produced = self
            .default
            .fields()
            .iter()
            .map(|f| f.field.as_str())
            .chain(self.aliases.iter().map(|(_, field)| field.as_str()))
            .chain(self.secondary.iter().map(|(_, order)| order.field.as_str()))
            .chain(self.fixed.iter().map(String::as_str))
            .chain(self.unique_key.as_deref());

        for field in produced {
            if schema.field(field).is_none() {
                return Err(missing(field));
            }
        }

        for public in &self.allowed {
            let field = self.storage_field(public)?;
            if schema.field(field).is_none() {
                return Err(missing(field));
            }
        }

        self.resolve::<&str>(&[]).map(|_| ())
    }

    fn storage_field<'a>(&'a self, public: &'a str) -> Result<&'a str, PaginationError> {
        if !self.allowed.iter().any(|allowed| allowed == public) {
            return Err(PaginationError::InvalidOrderingField(public.to_string()));
        }
        Ok(self
            .aliases
            .iter()
            .find(|(name, _)| name == public)
            .map(|(_, field)| field.as_str())
            .unwrap_or(public))
    }
}
