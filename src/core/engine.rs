//! Generic list engine: store -> filter -> sort -> paginate, plus stats
//!
//! One `ListEngine<E>` backs each list view. All operations are synchronous;
//! fetching lives in [`crate::views`].

use crate::core::clock::Clock;
use crate::core::entity::EntityId;
use crate::core::error::ValidationError;
use crate::core::filter::{FilterConfig, FilterPatch};
use crate::core::query::{PaginationMeta, Paginator};
use crate::core::sort::{SortDirection, SortState};
use crate::core::stats::{Aggregate, CollectionSummary};
use crate::core::store::{CollectionStore, UpsertOutcome};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Per-view settings
#[derive(Debug, Clone, PartialEq)]
pub struct ListSettings {
    pub page_size: usize,
    /// Direction a sort key starts with when first selected, overriding the schema
    pub sort_overrides: HashMap<String, SortDirection>,
}

impl ListSettings {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size,
            sort_overrides: HashMap::new(),
        }
    }
}

/// Everything a view renders for one entity kind
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState<E, S> {
    /// Current page of the filtered, sorted collection
    pub items: Vec<E>,
    /// Size of the filtered collection
    pub total_count: usize,
    pub total_pages: usize,
    pub current_page: usize,
    pub pagination: PaginationMeta,
    pub visible_pages: Vec<usize>,
    pub sort: SortState,
    pub filter: FilterConfig,
    /// Stats over the unfiltered collection
    pub stats: S,
    pub summary: CollectionSummary,
}

/// List engine for one entity kind
pub struct ListEngine<E: Aggregate> {
    store: CollectionStore<E>,
    filter: FilterConfig,
    sort: SortState,
    paginator: Paginator,
    sort_overrides: HashMap<String, SortDirection>,
    clock: Arc<dyn Clock>,
    /// Store positions of the filtered collection, in sort order
    derived: Vec<usize>,
    stats: E::Stats,
    summary: CollectionSummary,
}

impl<E: Aggregate> ListEngine<E> {
    pub fn new(settings: ListSettings, clock: Arc<dyn Clock>) -> Self {
        let sort = SortState::initial(E::schema(), &settings.sort_overrides);
        Self {
            store: CollectionStore::new(),
            filter: FilterConfig::default(),
            sort,
            paginator: Paginator::new(settings.page_size),
            sort_overrides: settings.sort_overrides,
            clock,
            derived: Vec::new(),
            stats: E::Stats::default(),
            summary: CollectionSummary::default(),
        }
    }

    /// Replace the collection after a fetch
    pub fn replace_all(&mut self, items: Vec<E>) {
        self.store.replace_all(items);
        self.recompute_stats();
        self.recompute_view();
    }

    /// Patch one entity after a successful create/update
    pub fn apply_mutation(&mut self, item: E) -> Result<UpsertOutcome, ValidationError> {
        let outcome = self.store.upsert(item)?;
        self.recompute_stats();
        self.recompute_view();
        Ok(outcome)
    }

    /// Drop one entity after a successful delete
    pub fn remove(&mut self, id: EntityId) -> Option<E> {
        let removed = self.store.remove(id)?;
        self.recompute_stats();
        self.recompute_view();
        Some(removed)
    }

    pub fn set_filter(&mut self, patch: FilterPatch) {
        self.filter.merge(patch);
        self.recompute_view();
    }

    /// Clear every predicate and return to page 1
    pub fn reset_filters(&mut self) {
        self.filter.reset();
        self.paginator.reset();
        self.recompute_view();
    }

    /// Select a sort key; see [`SortState::select`]
    pub fn set_sort(
        &mut self,
        key: &str,
        direction: Option<SortDirection>,
    ) -> Result<(), ValidationError> {
        self.sort
            .select(E::schema(), key, direction, &self.sort_overrides)?;
        self.recompute_view();
        Ok(())
    }

    pub fn go_to_page(&mut self, page: usize) -> bool {
        self.paginator.go_to(page)
    }

    pub fn next_page(&mut self) -> bool {
        self.paginator.next()
    }

    pub fn previous_page(&mut self) -> bool {
        self.paginator.previous()
    }

    /// Entities on the current page
    pub fn page_items(&self) -> Vec<&E> {
        let items = self.store.items();
        self.paginator
            .slice(&self.derived)
            .iter()
            .map(|&index| &items[index])
            .collect()
    }

    /// The whole filtered, sorted collection
    pub fn filtered(&self) -> Vec<&E> {
        let items = self.store.items();
        self.derived.iter().map(|&index| &items[index]).collect()
    }

    pub fn filtered_count(&self) -> usize {
        self.derived.len()
    }

    /// Time source used for stats windows and date bounds
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn store(&self) -> &CollectionStore<E> {
        &self.store
    }

    pub fn filter(&self) -> &FilterConfig {
        &self.filter
    }

    pub fn sort(&self) -> &SortState {
        &self.sort
    }

    pub fn paginator(&self) -> &Paginator {
        &self.paginator
    }

    pub fn stats(&self) -> &E::Stats {
        &self.stats
    }

    pub fn summary(&self) -> &CollectionSummary {
        &self.summary
    }

    /// Snapshot of everything the view renders
    pub fn present(&self) -> ViewState<E, E::Stats> {
        ViewState {
            items: self.page_items().into_iter().cloned().collect(),
            total_count: self.filtered_count(),
            total_pages: self.paginator.total_pages(),
            current_page: self.paginator.current_page(),
            pagination: self.paginator.meta(),
            visible_pages: self.paginator.visible_pages(),
            sort: self.sort.clone(),
            filter: self.filter.clone(),
            stats: self.stats.clone(),
            summary: self.summary.clone(),
        }
    }

    fn recompute_stats(&mut self) {
        let items = self.store.items();
        self.stats = E::aggregate(items, self.clock.now());
        self.summary = CollectionSummary::of(items);
    }

    fn recompute_view(&mut self) {
        let local = self.clock.offset();
        let items = self.store.items();

        let mut derived = self.filter.select_indices(items, local);
        derived.sort_by(|&a, &b| self.sort.compare(&items[a], &items[b], local));
        self.derived = derived;
        self.paginator.set_total(self.derived.len());

        tracing::debug!(
            entity = E::resource_name(),
            total = items.len(),
            filtered = self.derived.len(),
            page = self.paginator.current_page(),
            sort = %self.sort.key,
            "recomputed list view"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::FixedClock;
    use crate::entities::driver::{Driver, DriverStatus};

    fn clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock::parse("2024-05-15T12:00:00Z").unwrap())
    }

    fn fleet(count: i64) -> Vec<Driver> {
        (1..=count)
            .map(|id| Driver {
                id: Some(id),
                name: format!("Driver {id:02}"),
                rating: if id % 2 == 0 { 4.5 } else { 3.0 },
                status: if id % 3 == 0 {
                    DriverStatus::Busy
                } else {
                    DriverStatus::Active
                },
                ..Driver::default()
            })
            .collect()
    }

    fn engine(page_size: usize) -> ListEngine<Driver> {
        ListEngine::new(ListSettings::new(page_size), clock())
    }

    #[test]
    fn test_pages_through_sorted_collection() {
        let mut engine = engine(4);
        engine.replace_all(fleet(10));
        engine.set_sort("name", Some(SortDirection::Asc)).unwrap();

        let state = engine.present();
        assert_eq!(state.total_count, 10);
        assert_eq!(state.total_pages, 3);
        assert_eq!(state.items[0].name, "Driver 01");

        assert!(engine.go_to_page(3));
        let names: Vec<_> = engine.page_items().iter().map(|d| d.name.clone()).collect();
        assert_eq!(names, vec!["Driver 09", "Driver 10"]);
    }

    #[test]
    fn test_shrinking_filter_clamps_page() {
        let mut engine = engine(2);
        engine.replace_all(fleet(10));
        assert!(engine.go_to_page(5));

        engine.set_filter(FilterPatch::default().status("BUSY"));
        assert_eq!(engine.filtered_count(), 3);
        assert_eq!(engine.paginator().current_page(), 2);

        engine.set_filter(FilterPatch::default().status("SUSPENDED"));
        let state = engine.present();
        assert_eq!(state.total_pages, 0);
        assert_eq!(state.current_page, 1);
        assert!(state.items.is_empty());
    }

    #[test]
    fn test_go_to_page_bounds() {
        let mut engine = engine(5);
        engine.replace_all(fleet(10));
        assert!(!engine.go_to_page(0));
        assert!(!engine.go_to_page(3));
        assert!(engine.go_to_page(2));
        assert!(!engine.next_page());
    }

    #[test]
    fn test_stats_ignore_filters() {
        let mut engine = engine(5);
        engine.replace_all(fleet(6));
        let before = engine.stats().clone();

        engine.set_filter(FilterPatch::default().min_rating(4.0));
        assert_eq!(engine.filtered_count(), 3);
        assert_eq!(engine.stats(), &before);
        assert_eq!(engine.stats().total, 6);
    }

    #[test]
    fn test_mutation_replaces_and_reruns_pipeline() {
        let mut engine = engine(10);
        engine.replace_all(fleet(3));
        engine.set_filter(FilterPatch::default().status("ACTIVE"));
        assert_eq!(engine.filtered_count(), 2);

        let mut updated = engine.store().get(1).cloned().unwrap();
        updated.status = DriverStatus::Offline;
        let outcome = engine.apply_mutation(updated).unwrap();

        assert_eq!(outcome, UpsertOutcome::Replaced);
        assert_eq!(engine.store().len(), 3);
        assert_eq!(engine.filtered_count(), 1);
        assert_eq!(engine.stats().offline, 1);
    }

    #[test]
    fn test_remove_updates_counts() {
        let mut engine = engine(10);
        engine.replace_all(fleet(3));
        assert!(engine.remove(2).is_some());
        assert!(engine.remove(2).is_none());
        assert_eq!(engine.present().total_count, 2);
        assert_eq!(engine.stats().total, 2);
    }

    #[test]
    fn test_reset_filters_returns_to_first_page() {
        let mut engine = engine(2);
        engine.replace_all(fleet(10));
        engine.set_filter(FilterPatch::default().min_rating(4.0));
        engine.go_to_page(2);

        engine.reset_filters();
        assert_eq!(engine.filter(), &FilterConfig::default());
        assert_eq!(engine.paginator().current_page(), 1);
        assert_eq!(engine.filtered_count(), 10);
    }

    #[test]
    fn test_filtering_never_mutates_store() {
        let mut engine = engine(10);
        engine.replace_all(fleet(5));
        let before: Vec<_> = engine.store().items().iter().map(|d| d.id).collect();

        engine.set_filter(FilterPatch::default().search("03"));
        engine.set_sort("rating", None).unwrap();

        let after: Vec<_> = engine.store().items().iter().map(|d| d.id).collect();
        assert_eq!(before, after);
        assert_eq!(engine.filtered().len(), 1);
    }
}
