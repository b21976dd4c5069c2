//! Core module containing the generic list engine and its building blocks

pub mod clock;
pub mod engine;
pub mod entity;
pub mod error;
pub mod feed;
pub mod field;
pub mod filter;
pub mod query;
pub mod service;
pub mod session;
pub mod sort;
pub mod stats;
pub mod store;
pub mod validation;

pub use clock::{Clock, FixedClock, SystemClock};
pub use engine::{ListEngine, ListSettings, ViewState};
pub use entity::{Entity, EntityId, EntitySchema, SortField};
pub use error::{ConsoleError, ConsoleResult, Notice};
pub use feed::{Activity, ActivityKind, FeedLimits, IntoActivity};
pub use field::{FieldFormat, FieldKind, FieldValue};
pub use filter::{FilterConfig, FilterPatch};
pub use query::{PaginationMeta, Paginator};
pub use service::{AuthService, CollectionService};
pub use session::{Access, AccessPolicy, Role, SessionContext, SessionUser};
pub use sort::{SortDirection, SortState};
pub use stats::{Aggregate, CollectionSummary};
pub use store::{CollectionStore, UpsertOutcome};
