//! Entity trait and the per-kind field-accessor schema that drives the list engine

use crate::core::field::{FieldKind, FieldValue};
use crate::core::sort::SortDirection;

/// Backend-issued numeric identifier
pub type EntityId = i64;

/// A sortable field and its default direction when first selected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortField {
    pub key: &'static str,
    pub kind: FieldKind,
    pub default_direction: SortDirection,
}

impl SortField {
    pub const fn new(key: &'static str, kind: FieldKind, default_direction: SortDirection) -> Self {
        Self {
            key,
            kind,
            default_direction,
        }
    }
}

/// Field-accessor map describing which entity fields each filter predicate,
/// sort key and stat bucket reads.
///
/// One static schema exists per entity kind; the list engine never looks at
/// an entity's concrete type, only at the names declared here resolved
/// through [`Entity::field_value`].
#[derive(Debug)]
pub struct EntitySchema {
    /// Role/type/method classification, if the kind has one
    pub category_field: Option<&'static str>,

    /// Numeric rating compared against `min_rating`
    pub rating_field: Option<&'static str>,

    /// Location/address text matched by the location predicate
    pub location_field: Option<&'static str>,

    /// Fields searched by the free-text term (match on ANY)
    pub search_fields: &'static [&'static str],

    /// Sort keys accepted by this kind
    pub sort_fields: &'static [SortField],

    /// Sort key active when a view opens
    pub default_sort: &'static str,
}

impl EntitySchema {
    /// Look up a sort key
    pub fn sort_field(&self, key: &str) -> Option<&SortField> {
        self.sort_fields.iter().find(|field| field.key == key)
    }

    /// Sort key and direction a fresh view starts with
    pub fn initial_sort(&self) -> (&'static str, SortDirection) {
        let direction = self
            .sort_field(self.default_sort)
            .map(|field| field.default_direction)
            .unwrap_or(SortDirection::Desc);
        (self.default_sort, direction)
    }
}

/// Base trait for every backend-owned record shown in the portal.
///
/// Entities expose:
/// - id: present once the backend has stored the record
/// - createdDate: raw timestamp string as received from the backend
/// - status: the enumerated lifecycle state
/// - field_value: dynamic access by field name, as declared in the schema
pub trait Entity: Clone + Send + Sync + 'static {
    /// Plural resource name (e.g., "drivers"), also the REST collection path
    fn resource_name() -> &'static str;

    /// Singular resource name (e.g., "driver")
    fn resource_name_singular() -> &'static str;

    /// Field-accessor map for this kind
    fn schema() -> &'static EntitySchema;

    /// Identifier, absent for unsaved entities
    fn id(&self) -> Option<EntityId>;

    /// Creation timestamp as delivered by the backend
    fn created_date(&self) -> Option<&str>;

    /// Current status, in its wire form (e.g., "ACTIVE")
    fn status(&self) -> &str;

    /// Get the value of a field by name; unknown names yield `None`
    fn field_value(&self, field: &str) -> Option<FieldValue>;

    /// Whether the backend has assigned an id
    fn is_persisted(&self) -> bool {
        self.id().is_some()
    }
}
