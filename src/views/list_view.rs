//! List view: one [`ListEngine`] plus fetching, mutations and notices

use super::{LoadingFlag, ServiceSet, ViewLifetime};
use crate::config::ConsoleConfig;
use crate::core::clock::Clock;
use crate::core::engine::{ListEngine, ListSettings, ViewState};
use crate::core::entity::{Entity, EntityId};
use crate::core::error::{
    BackendError, ConsoleError, ConsoleResult, FetchError, MutationError, MutationKind, Notice,
    ValidationError,
};
use crate::core::filter::FilterPatch;
use crate::core::sort::SortDirection;
use crate::core::stats::Aggregate;
use crate::core::store::UpsertOutcome;
use crate::core::validation::Form;
use crate::entities::RatingRequest;
use crate::entities::driver::{CreateDriverRequest, Driver, DriverStatus, UpdateDriverRequest};
use crate::entities::payment::{Payment, PaymentReceipt, PaymentRequest};
use crate::entities::ride::{CreateRideRequest, FareQuote, FareRequest, Ride, RideBooking};
use crate::entities::user::{CreateUserRequest, UpdateUserRequest, User, UserStatus};
use futures::FutureExt;
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;
use tracing::{info, warn};

/// Loads the full collection behind a view
pub type Loader<E> = Arc<dyn Fn() -> BoxFuture<'static, Result<Vec<E>, BackendError>> + Send + Sync>;

/// A mounted list screen for one entity kind
pub struct ListView<E: Aggregate> {
    engine: ListEngine<E>,
    loader: Loader<E>,
    services: ServiceSet,
    lifetime: ViewLifetime,
    loading: LoadingFlag,
    last_notice: Option<Notice>,
}

impl<E: Aggregate> ListView<E> {
    pub fn new(
        loader: Loader<E>,
        services: ServiceSet,
        settings: ListSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            engine: ListEngine::new(settings, clock),
            loader,
            services,
            lifetime: ViewLifetime::new(),
            loading: LoadingFlag::default(),
            last_notice: None,
        }
    }

    /// Replace the store with a fresh fetch.
    ///
    /// On failure the store keeps its last-known-good contents and a notice
    /// is recorded.
    pub async fn refresh(&mut self) -> ConsoleResult<()> {
        let Some(_guard) = self.loading.raise() else {
            warn!(entity = E::resource_name(), "refresh skipped, request in flight");
            return Ok(());
        };

        let fetch = (self.loader)();
        let outcome = self.lifetime.run(fetch).await?;
        match outcome {
            Ok(items) => {
                info!(entity = E::resource_name(), count = items.len(), "loaded collection");
                self.engine.replace_all(items);
                Ok(())
            }
            Err(source) => {
                warn!(entity = E::resource_name(), error = %source, "fetch failed");
                Err(self.fail(FetchError {
                    resource: E::resource_name(),
                    source,
                }))
            }
        }
    }

    /// Send a mutation and patch the store with the returned record
    pub async fn mutate<F>(&mut self, kind: MutationKind, call: F) -> ConsoleResult<E>
    where
        F: Future<Output = Result<E, BackendError>>,
    {
        let entity = self.send(kind, call).await?;
        self.engine.apply_mutation(entity.clone())?;
        self.succeed(kind);
        Ok(entity)
    }

    /// Send a delete and drop `id` from the store
    pub async fn delete_with<F>(&mut self, id: EntityId, call: F) -> ConsoleResult<()>
    where
        F: Future<Output = Result<(), BackendError>>,
    {
        self.send(MutationKind::Delete, call).await?;
        self.engine.remove(id);
        self.succeed(MutationKind::Delete);
        Ok(())
    }

    async fn send<T, F>(&mut self, kind: MutationKind, call: F) -> ConsoleResult<T>
    where
        F: Future<Output = Result<T, BackendError>>,
    {
        let Some(_guard) = self.loading.raise() else {
            return Err(ConsoleError::Internal(
                "another request is in flight".to_string(),
            ));
        };

        let outcome = self.lifetime.run(call).await?;
        match outcome {
            Ok(value) => Ok(value),
            Err(source) => {
                warn!(
                    entity = E::resource_name_singular(),
                    kind = kind.error_code(),
                    error = %source,
                    "mutation failed"
                );
                Err(self.fail(MutationError {
                    resource: E::resource_name_singular(),
                    kind,
                    source,
                }))
            }
        }
    }

    /// Validate a form locally, recording a notice on failure
    fn check<T: Form>(&mut self, form: &T) -> ConsoleResult<T> {
        let checked = form.validated_with(self.engine.clock());
        checked.map_err(|e| self.fail(e))
    }

    fn fail(&mut self, err: impl Into<ConsoleError>) -> ConsoleError {
        let err = err.into();
        self.last_notice = err.notice();
        err
    }

    fn succeed(&mut self, kind: MutationKind) {
        info!(entity = E::resource_name_singular(), kind = ?kind, "mutation applied");
        self.last_notice = Some(Notice::success(
            "Success",
            success_message(kind, E::resource_name_singular()),
        ));
    }

    pub fn present(&self) -> ViewState<E, E::Stats> {
        self.engine.present()
    }

    pub fn engine(&self) -> &ListEngine<E> {
        &self.engine
    }

    pub fn set_filter(&mut self, patch: FilterPatch) {
        self.engine.set_filter(patch);
    }

    pub fn reset_filters(&mut self) {
        self.engine.reset_filters();
    }

    pub fn set_sort(&mut self, key: &str, direction: Option<SortDirection>) -> ConsoleResult<()> {
        self.engine.set_sort(key, direction).map_err(|e| self.fail(e))
    }

    pub fn go_to_page(&mut self, page: usize) -> bool {
        self.engine.go_to_page(page)
    }

    pub fn next_page(&mut self) -> bool {
        self.engine.next_page()
    }

    pub fn previous_page(&mut self) -> bool {
        self.engine.previous_page()
    }

    /// Patch the store with a record obtained elsewhere
    pub fn apply_mutation(&mut self, entity: E) -> Result<UpsertOutcome, ValidationError> {
        self.engine.apply_mutation(entity)
    }

    pub fn remove(&mut self, id: EntityId) -> Option<E> {
        self.engine.remove(id)
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_set()
    }

    /// Shared handle on the loading flag
    pub fn loading_flag(&self) -> LoadingFlag {
        self.loading.clone()
    }

    /// Handle that tears this view down from elsewhere
    pub fn lifetime(&self) -> ViewLifetime {
        self.lifetime.clone()
    }

    pub fn last_notice(&self) -> Option<&Notice> {
        self.last_notice.as_ref()
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.last_notice.take()
    }

    pub fn close(&self) {
        self.lifetime.close();
    }
}

impl<E: Aggregate> Drop for ListView<E> {
    fn drop(&mut self) {
        self.lifetime.close();
    }
}

pub(super) fn success_message(kind: MutationKind, resource: &str) -> String {
    let action = match kind {
        MutationKind::Create => "created",
        MutationKind::Update => "updated",
        MutationKind::UpdateStatus => "status updated",
        MutationKind::UpdateRating => "rated",
        MutationKind::Delete => "deleted",
        MutationKind::Process => "processed",
        MutationKind::Book => "booked",
        MutationKind::CalculateFare => "fare calculated",
    };
    let mut chars = resource.chars();
    let capitalized = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => String::new(),
    };
    format!("{} {} successfully", capitalized, action)
}

fn settings_for<E: Entity>(config: &ConsoleConfig) -> ListSettings {
    config.list_settings(E::resource_name())
}

// =============================================================================
// Drivers
// =============================================================================

impl ListView<Driver> {
    pub fn drivers(services: ServiceSet, config: &ConsoleConfig, clock: Arc<dyn Clock>) -> Self {
        let service = services.drivers.clone();
        let loader: Loader<Driver> = Arc::new(move || {
            let service = service.clone();
            async move { service.fetch_all().await }.boxed()
        });
        Self::new(loader, services, settings_for::<Driver>(config), clock)
    }

    pub async fn create_driver(&mut self, request: &CreateDriverRequest) -> ConsoleResult<Driver> {
        let request = self.check(request)?;
        let service = self.services.drivers.clone();
        self.mutate(MutationKind::Create, async move {
            service.create_driver(&request).await
        })
        .await
    }

    pub async fn update_driver(
        &mut self,
        id: EntityId,
        request: &UpdateDriverRequest,
    ) -> ConsoleResult<Driver> {
        let request = self.check(request)?;
        let service = self.services.drivers.clone();
        self.mutate(MutationKind::Update, async move {
            service.update_driver(id, &request).await
        })
        .await
    }

    pub async fn update_driver_status(
        &mut self,
        id: EntityId,
        status: DriverStatus,
    ) -> ConsoleResult<Driver> {
        let service = self.services.drivers.clone();
        self.mutate(MutationKind::UpdateStatus, async move {
            service.update_driver_status(id, &status).await
        })
        .await
    }

    pub async fn rate_driver(&mut self, id: EntityId, request: &RatingRequest) -> ConsoleResult<Driver> {
        let request = self.check(request)?;
        let service = self.services.drivers.clone();
        self.mutate(MutationKind::UpdateRating, async move {
            service.rate_driver(id, &request).await
        })
        .await
    }

    pub async fn delete_driver(&mut self, id: EntityId) -> ConsoleResult<()> {
        let service = self.services.drivers.clone();
        self.delete_with(id, async move { service.delete_driver(id).await })
            .await
    }
}

// =============================================================================
// Users
// =============================================================================

impl ListView<User> {
    pub fn users(services: ServiceSet, config: &ConsoleConfig, clock: Arc<dyn Clock>) -> Self {
        let service = services.users.clone();
        let loader: Loader<User> = Arc::new(move || {
            let service = service.clone();
            async move { service.fetch_all().await }.boxed()
        });
        Self::new(loader, services, settings_for::<User>(config), clock)
    }

    pub async fn create_user(&mut self, request: &CreateUserRequest) -> ConsoleResult<User> {
        let request = self.check(request)?;
        let service = self.services.users.clone();
        self.mutate(MutationKind::Create, async move {
            service.create_user(&request).await
        })
        .await
    }

    pub async fn update_user(
        &mut self,
        id: EntityId,
        request: &UpdateUserRequest,
    ) -> ConsoleResult<User> {
        let request = self.check(request)?;
        let service = self.services.users.clone();
        self.mutate(MutationKind::Update, async move {
            service.update_user(id, &request).await
        })
        .await
    }

    pub async fn update_user_status(
        &mut self,
        id: EntityId,
        status: UserStatus,
    ) -> ConsoleResult<User> {
        let service = self.services.users.clone();
        self.mutate(MutationKind::UpdateStatus, async move {
            service.update_user_status(id, &status).await
        })
        .await
    }

    pub async fn delete_user(&mut self, id: EntityId) -> ConsoleResult<()> {
        let service = self.services.users.clone();
        self.delete_with(id, async move { service.delete_user(id).await })
            .await
    }
}

// =============================================================================
// Rides
// =============================================================================

impl ListView<Ride> {
    /// Every ride, for the admin screen
    pub fn rides(services: ServiceSet, config: &ConsoleConfig, clock: Arc<dyn Clock>) -> Self {
        let service = services.rides.clone();
        let loader: Loader<Ride> = Arc::new(move || {
            let service = service.clone();
            async move { service.fetch_all().await }.boxed()
        });
        Self::new(loader, services, settings_for::<Ride>(config), clock)
    }

    /// Ride history of one customer
    pub fn customer_rides(
        services: ServiceSet,
        config: &ConsoleConfig,
        clock: Arc<dyn Clock>,
        customer_id: EntityId,
    ) -> Self {
        let service = services.rides.clone();
        let loader: Loader<Ride> = Arc::new(move || {
            let service = service.clone();
            async move { service.fetch_for_customer(customer_id).await }.boxed()
        });
        Self::new(loader, services, settings_for::<Ride>(config), clock)
    }

    /// Book a ride and add it to the store
    pub async fn book_ride(&mut self, request: &CreateRideRequest) -> ConsoleResult<RideBooking> {
        let request = self.check(request)?;
        let service = self.services.rides.clone();
        let customer_id = request.customer_id;
        let booking = self
            .send(MutationKind::Book, async move { service.book_ride(&request).await })
            .await?;
        self.engine.apply_mutation(booking.to_ride(customer_id))?;
        self.succeed(MutationKind::Book);
        Ok(booking)
    }

    /// Ask the payment backend for a fare preview; the store is untouched
    pub async fn quote_fare(&mut self, request: &FareRequest) -> ConsoleResult<FareQuote> {
        let request = self.check(request)?;
        let service = self.services.payments.clone();
        let quote = self
            .send(MutationKind::CalculateFare, async move {
                service.calculate_fare(&request).await
            })
            .await?;
        info!(fare = quote.estimated_fare, distance = quote.distance, "fare calculated");
        Ok(quote)
    }

    pub async fn rate_ride(&mut self, id: EntityId, rating: f64) -> ConsoleResult<Ride> {
        let request = self.check(&RatingRequest::for_ride(rating, id))?;
        let service = self.services.rides.clone();
        self.mutate(MutationKind::UpdateRating, async move {
            service.rate_ride(id, &request).await
        })
        .await
    }
}

// =============================================================================
// Payments
// =============================================================================

impl ListView<Payment> {
    pub fn payments(services: ServiceSet, config: &ConsoleConfig, clock: Arc<dyn Clock>) -> Self {
        let service = services.payments.clone();
        let loader: Loader<Payment> = Arc::new(move || {
            let service = service.clone();
            async move { service.fetch_all().await }.boxed()
        });
        Self::new(loader, services, settings_for::<Payment>(config), clock)
    }

    /// Payment history of one customer
    pub fn customer_payments(
        services: ServiceSet,
        config: &ConsoleConfig,
        clock: Arc<dyn Clock>,
        customer_id: EntityId,
    ) -> Self {
        let service = services.payments.clone();
        let loader: Loader<Payment> = Arc::new(move || {
            let service = service.clone();
            async move { service.fetch_for_customer(customer_id).await }.boxed()
        });
        Self::new(loader, services, settings_for::<Payment>(config), clock)
    }

    /// Process a payment and add the resulting record to the store
    pub async fn process_payment(&mut self, request: &PaymentRequest) -> ConsoleResult<PaymentReceipt> {
        let request = self.check(request)?;
        let service = self.services.payments.clone();
        let receipt = self
            .send(MutationKind::Process, async move {
                service.process_payment(&request).await
            })
            .await?;
        self.engine.apply_mutation(receipt.to_payment())?;
        self.succeed(MutationKind::Process);
        Ok(receipt)
    }
}
