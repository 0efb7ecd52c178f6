use serde::{Deserialize, Serialize};
use std::fmt;
use xxhash_rust::xxh3::xxh3_64;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flip(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn is_desc(self) -> bool {
        self == SortDirection::Desc
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct OrderField {
    pub field: String,
    pub direction: SortDirection,
}

impl OrderField {
    pub fn asc(field: &str) -> Self {
        OrderField {
            field: field.to_string(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: &str) -> Self {
        OrderField {
            field: field.to_string(),
            direction: SortDirection::Desc,
        }
    }

    /// Reads an ordering token: `name` is ascending, `-name` descending.
    /// Returns `None` for an empty name.
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        let (direction, field) = match token.strip_prefix('-') {
            Some(rest) => (SortDirection::Desc, rest.trim()),
            None => (SortDirection::Asc, token),
        };
        if field.is_empty() {
            return None;
        }
        Some(OrderField {
            field: field.to_string(),
            direction,
        })
    }

    pub fn token(&self) -> String {
        match self.direction {
            SortDirection::Asc => self.field.clone(),
            SortDirection::Desc => format!("-{}", self.field),
        }
    }

    pub fn reversed(&self) -> Self {
        OrderField {
            field: self.field.clone(),
            direction: self.direction.flip(),
        }
    }
}

impl fmt::Display for OrderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}

/// A resolved, totally ordered sort specification.
///
/// Built by the ordering resolver and threaded through predicate building
/// and page assembly for a single request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Ordering {
    fields: Vec<OrderField>,
}

impl Ordering {
    pub fn new(fields: Vec<OrderField>) -> Self {
        Ordering { fields }
    }

    /// Parses a list of `-field` style tokens, skipping empty ones.
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Self {
        Ordering {
            fields: tokens
                .iter()
                .filter_map(|t| OrderField::parse(t.as_ref()))
                .collect(),
        }
    }

    pub fn fields(&self) -> &[OrderField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// True when `field` appears in either direction.
    pub fn contains(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f.field == field)
    }

    pub fn push(&mut self, field: OrderField) {
        self.fields.push(field);
    }

    /// Appends `field` unless it is already referenced.
    pub fn push_missing(&mut self, field: OrderField) {
        if !self.contains(&field.field) {
            self.fields.push(field);
        }
    }

    pub fn reversed(&self) -> Self {
        Ordering {
            fields: self.fields.iter().map(OrderField::reversed).collect(),
        }
    }

    pub fn tokens(&self) -> Vec<String> {
        self.fields.iter().map(OrderField::token).collect()
    }

    /// Short stable hash of the ordering, embedded in cursor tokens so a
    /// cursor is never applied under a different ordering.
    pub fn fingerprint(&self) -> String {
        let joined = self.tokens().join(",");
        format!("{:016x}", xxh3_64(joined.as_bytes()))
    }
}

impl fmt::Display for Ordering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tokens().join(","))
    }
}
