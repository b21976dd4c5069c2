//! In-memory backend for testing, demos and offline development
//!
//! Behaves like the REST backend closely enough to drive every view: ids are
//! assigned on create, unknown ids answer `NotFound`, booking assigns the
//! first active driver and ratings fold into the driver's average. Failures
//! and latency can be injected per resource.

use crate::core::clock::{Clock, SystemClock};
use crate::core::entity::{Entity, EntityId};
use crate::core::error::BackendError;
use crate::core::service::{AuthService, CollectionService};
use crate::core::session::{LoginRequest, SessionUser};
use crate::core::stats::round_to;
use crate::entities::RatingRequest;
use crate::entities::driver::{
    CreateDriverRequest, Driver, DriverService, DriverStatus, Location, LocationInput,
    UpdateDriverRequest, Vehicle, VehicleInput,
};
use crate::entities::payment::{Payment, PaymentReceipt, PaymentRequest, PaymentService, PaymentStatus};
use crate::entities::ride::{
    CreateRideRequest, DriverDetails, FareQuote, FareRequest, Ride, RideBooking, RideService,
    RideStatus, RideType, VehicleDetails,
};
use crate::entities::user::{
    CreateUserRequest, UpdateUserRequest, User, UserService, UserStatus,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

/// Resource key used to inject login failures
pub const LOGIN_RESOURCE: &str = "login";

#[derive(Default)]
struct State {
    users: Vec<User>,
    drivers: Vec<Driver>,
    rides: Vec<Ride>,
    payments: Vec<Payment>,
    passwords: HashMap<String, String>,
    failures: HashMap<&'static str, BackendError>,
    next_id: EntityId,
}

impl State {
    fn allocate_id(&mut self) -> EntityId {
        self.next_id += 1;
        self.next_id
    }

    /// Give unsaved records an id and keep the counter above every seeded id
    fn absorb<E: Entity>(&mut self, items: &mut [E], assign: impl Fn(&mut E, EntityId)) {
        for item in items.iter_mut() {
            match item.id() {
                Some(id) => self.next_id = self.next_id.max(id),
                None => {
                    let id = self.allocate_id();
                    assign(item, id);
                }
            }
        }
    }
}

/// In-memory implementation of every service trait
///
/// Clones share the same data.
#[derive(Clone)]
pub struct InMemoryBackend {
    state: Arc<RwLock<State>>,
    clock: Arc<dyn Clock>,
    latency: Option<Duration>,
    trip_distance: f64,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    /// Create an empty backend on the system clock
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(State::default())),
            clock: Arc::new(SystemClock),
            latency: None,
            trip_distance: 5.0,
        }
    }

    /// Stamp created records with this clock
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Delay every call, to exercise loading flags and cancellation
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Distance in miles assumed for every booked trip
    pub fn with_trip_distance(mut self, miles: f64) -> Self {
        self.trip_distance = miles;
        self
    }

    pub fn seed_users(&self, mut users: Vec<User>) -> Result<(), BackendError> {
        let mut state = self.write()?;
        state.absorb(&mut users, |u, id| u.id = Some(id));
        state.users.extend(users);
        Ok(())
    }

    pub fn seed_drivers(&self, mut drivers: Vec<Driver>) -> Result<(), BackendError> {
        let mut state = self.write()?;
        state.absorb(&mut drivers, |d, id| d.id = Some(id));
        state.drivers.extend(drivers);
        Ok(())
    }

    pub fn seed_rides(&self, mut rides: Vec<Ride>) -> Result<(), BackendError> {
        let mut state = self.write()?;
        state.absorb(&mut rides, |r, id| r.id = Some(id));
        state.rides.extend(rides);
        Ok(())
    }

    pub fn seed_payments(&self, mut payments: Vec<Payment>) -> Result<(), BackendError> {
        let mut state = self.write()?;
        state.absorb(&mut payments, |p, id| p.id = Some(id));
        state.payments.extend(payments);
        Ok(())
    }

    /// Register login credentials for an existing username
    pub fn set_password(&self, username: &str, password: &str) -> Result<(), BackendError> {
        self.write()?
            .passwords
            .insert(username.to_string(), password.to_string());
        Ok(())
    }

    /// Make every call on `resource` fail with `error` until [`Self::recover`]
    ///
    /// `resource` is a plural entity name such as `"drivers"`, or
    /// [`LOGIN_RESOURCE`].
    pub fn fail(&self, resource: &'static str, error: BackendError) -> Result<(), BackendError> {
        self.write()?.failures.insert(resource, error);
        Ok(())
    }

    pub fn recover(&self, resource: &str) -> Result<(), BackendError> {
        self.write()?.failures.remove(resource);
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, BackendError> {
        self.state
            .read()
            .map_err(|e| BackendError::Unavailable(format!("state lock poisoned: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, BackendError> {
        self.state
            .write()
            .map_err(|e| BackendError::Unavailable(format!("state lock poisoned: {}", e)))
    }

    /// Simulated round trip: latency, then any injected failure
    async fn enter(&self, resource: &'static str) -> Result<(), BackendError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        match self.read()?.failures.get(resource) {
            Some(error) => {
                tracing::debug!(resource, error = %error, "injected failure");
                Err(error.clone())
            }
            None => Ok(()),
        }
    }

    /// Backend timestamps are local date-times without an offset
    fn timestamp(&self) -> String {
        self.clock
            .now()
            .naive_local()
            .format("%Y-%m-%dT%H:%M:%S")
            .to_string()
    }
}

fn not_found<E: Entity>(id: EntityId) -> BackendError {
    BackendError::NotFound {
        resource: E::resource_name_singular(),
        id,
    }
}

fn find_mut<E: Entity>(items: &mut [E], id: EntityId) -> Result<&mut E, BackendError> {
    items
        .iter_mut()
        .find(|item| item.id() == Some(id))
        .ok_or_else(|| not_found::<E>(id))
}

fn remove<E: Entity>(items: &mut Vec<E>, id: EntityId) -> Result<(), BackendError> {
    let index = items
        .iter()
        .position(|item| item.id() == Some(id))
        .ok_or_else(|| not_found::<E>(id))?;
    items.remove(index);
    Ok(())
}

fn bad_request(message: impl Into<String>) -> BackendError {
    BackendError::Status {
        status: 400,
        message: message.into(),
    }
}

fn vehicle(input: &VehicleInput, id: Option<EntityId>) -> Vehicle {
    Vehicle {
        id,
        model: input.model.clone(),
        plate_number: input.plate_number.clone(),
        year: input.year,
        color: input.color.clone(),
    }
}

fn location(input: &LocationInput, id: Option<EntityId>) -> Location {
    Location {
        id,
        latitude: input.latitude,
        longitude: input.longitude,
        address: input.address.clone(),
    }
}

/// Fold one more rating into the driver's running average
fn record_rating(driver: &mut Driver, rating: f64) {
    let rides = driver.total_rides;
    driver.rating = if rides <= 0 {
        rating
    } else {
        round_to((driver.rating * rides as f64 + rating) / (rides + 1) as f64, 2)
    };
    driver.total_rides = rides.max(0) + 1;
}

macro_rules! collection_service {
    ($entity:ty, $field:ident) => {
        #[async_trait]
        impl CollectionService<$entity> for InMemoryBackend {
            async fn fetch_all(&self) -> Result<Vec<$entity>, BackendError> {
                self.enter(<$entity>::resource_name()).await?;
                Ok(self.read()?.$field.clone())
            }
        }
    };
}

collection_service!(User, users);
collection_service!(Driver, drivers);
collection_service!(Ride, rides);
collection_service!(Payment, payments);

#[async_trait]
impl AuthService for InMemoryBackend {
    async fn login(&self, request: &LoginRequest) -> Result<SessionUser, BackendError> {
        self.enter(LOGIN_RESOURCE).await?;
        let state = self.read()?;

        let rejected = || BackendError::Status {
            status: 401,
            message: "Invalid username or password".to_string(),
        };
        let matches = state
            .passwords
            .get(&request.username)
            .is_some_and(|password| *password == request.password);
        if !matches {
            return Err(rejected());
        }

        let user = state
            .users
            .iter()
            .find(|u| u.username == request.username)
            .ok_or_else(rejected)?;
        if !user.is_active() {
            return Err(BackendError::Status {
                status: 403,
                message: "Account is not active".to_string(),
            });
        }
        user.session_user().ok_or_else(|| BackendError::Status {
            status: 403,
            message: format!("Role {} cannot sign in", user.role),
        })
    }
}

#[async_trait]
impl UserService for InMemoryBackend {
    async fn create_user(&self, request: &CreateUserRequest) -> Result<User, BackendError> {
        self.enter(User::resource_name()).await?;
        let created_date = self.timestamp();
        let mut state = self.write()?;

        if state.users.iter().any(|u| u.username == request.username) {
            return Err(BackendError::Status {
                status: 409,
                message: format!("Username {} is already taken", request.username),
            });
        }

        let user = User {
            id: Some(state.allocate_id()),
            username: request.username.clone(),
            name: request.name.clone(),
            email: request.email.clone(),
            role: request.role.clone(),
            status: UserStatus::Active,
            created_date: Some(created_date),
            ..User::default()
        };
        state
            .passwords
            .insert(request.username.clone(), request.password.clone());
        state.users.push(user.clone());
        Ok(user)
    }

    async fn update_user(
        &self,
        id: EntityId,
        request: &UpdateUserRequest,
    ) -> Result<User, BackendError> {
        self.enter(User::resource_name()).await?;
        let updated_date = self.timestamp();
        let mut state = self.write()?;
        let user = find_mut(&mut state.users, id)?;

        user.name = request.name.clone();
        user.email = request.email.clone();
        user.phone = request.phone.clone();
        user.date_of_birth = request.date_of_birth.clone();
        user.gender = request.gender.clone();
        user.address = request.address.clone();
        user.bio = request.bio.clone();
        if let Some(status) = &request.status {
            user.status = status.clone();
        }
        user.updated_date = Some(updated_date);
        Ok(user.clone())
    }

    async fn update_user_status(
        &self,
        id: EntityId,
        status: &UserStatus,
    ) -> Result<User, BackendError> {
        self.enter(User::resource_name()).await?;
        let updated_date = self.timestamp();
        let mut state = self.write()?;
        let user = find_mut(&mut state.users, id)?;
        user.status = status.clone();
        user.updated_date = Some(updated_date);
        Ok(user.clone())
    }

    async fn delete_user(&self, id: EntityId) -> Result<(), BackendError> {
        self.enter(User::resource_name()).await?;
        remove(&mut self.write()?.users, id)
    }
}

#[async_trait]
impl DriverService for InMemoryBackend {
    async fn create_driver(&self, request: &CreateDriverRequest) -> Result<Driver, BackendError> {
        self.enter(Driver::resource_name()).await?;
        let created_date = self.timestamp();
        let mut state = self.write()?;

        if state
            .drivers
            .iter()
            .filter_map(|d| d.vehicle.as_ref())
            .any(|v| v.plate_number == request.vehicle.plate_number)
        {
            return Err(BackendError::Status {
                status: 409,
                message: format!("Plate {} is already registered", request.vehicle.plate_number),
            });
        }

        let id = state.allocate_id();
        let driver = Driver {
            id: Some(id),
            name: request.name.clone(),
            phone: request.phone.clone(),
            email: request.email.clone(),
            rating: 0.0,
            status: DriverStatus::Active,
            vehicle: Some(vehicle(&request.vehicle, Some(id))),
            location: Some(location(&request.location, Some(id))),
            total_rides: 0,
            created_date: Some(created_date),
            updated_date: None,
        };
        state.drivers.push(driver.clone());
        Ok(driver)
    }

    async fn update_driver(
        &self,
        id: EntityId,
        request: &UpdateDriverRequest,
    ) -> Result<Driver, BackendError> {
        self.enter(Driver::resource_name()).await?;
        let updated_date = self.timestamp();
        let mut state = self.write()?;
        let driver = find_mut(&mut state.drivers, id)?;

        driver.name = request.name.clone();
        driver.phone = request.phone.clone();
        driver.email = request.email.clone();
        driver.status = request.status.clone();
        let vehicle_id = driver.vehicle.as_ref().and_then(|v| v.id);
        driver.vehicle = Some(vehicle(&request.vehicle, vehicle_id));
        let location_id = driver.location.as_ref().and_then(|l| l.id);
        driver.location = Some(location(&request.location, location_id));
        driver.updated_date = Some(updated_date);
        Ok(driver.clone())
    }

    async fn update_driver_status(
        &self,
        id: EntityId,
        status: &DriverStatus,
    ) -> Result<Driver, BackendError> {
        self.enter(Driver::resource_name()).await?;
        let updated_date = self.timestamp();
        let mut state = self.write()?;
        let driver = find_mut(&mut state.drivers, id)?;
        driver.status = status.clone();
        driver.updated_date = Some(updated_date);
        Ok(driver.clone())
    }

    async fn rate_driver(
        &self,
        id: EntityId,
        request: &RatingRequest,
    ) -> Result<Driver, BackendError> {
        self.enter(Driver::resource_name()).await?;
        let mut state = self.write()?;
        let driver = find_mut(&mut state.drivers, id)?;
        record_rating(driver, request.rating);
        Ok(driver.clone())
    }

    async fn delete_driver(&self, id: EntityId) -> Result<(), BackendError> {
        self.enter(Driver::resource_name()).await?;
        remove(&mut self.write()?.drivers, id)
    }
}

#[async_trait]
impl RideService for InMemoryBackend {
    async fn fetch_for_customer(&self, customer_id: EntityId) -> Result<Vec<Ride>, BackendError> {
        self.enter(Ride::resource_name()).await?;
        Ok(self
            .read()?
            .rides
            .iter()
            .filter(|r| r.customer_id == customer_id)
            .cloned()
            .collect())
    }

    async fn book_ride(&self, request: &CreateRideRequest) -> Result<RideBooking, BackendError> {
        self.enter(Ride::resource_name()).await?;
        let booking_time = self.timestamp();
        let quote = FareQuote::new(request.ride_type.clone(), self.trip_distance);
        let mut state = self.write()?;

        let customer_name = state
            .users
            .iter()
            .find(|u| u.id == Some(request.customer_id))
            .map(|u| u.name.clone());

        let driver = state
            .drivers
            .iter_mut()
            .find(|d| d.status == DriverStatus::Active)
            .ok_or_else(|| BackendError::Unavailable("no drivers available".to_string()))?;
        driver.status = DriverStatus::Busy;
        let details = DriverDetails {
            id: driver.id,
            name: driver.name.clone(),
            phone: driver.phone.clone(),
            rating: driver.rating,
            vehicle: driver.vehicle.as_ref().map(|v| VehicleDetails {
                model: v.model.clone(),
                plate_number: v.plate_number.clone(),
                color: v.color.clone(),
            }),
        };

        let ride = Ride {
            id: Some(state.allocate_id()),
            customer_id: request.customer_id,
            driver_id: details.id,
            customer_name: customer_name.clone(),
            driver_name: Some(details.name.clone()),
            pickup_location: request.pickup_location.clone(),
            destination_location: request.destination_location.clone(),
            status: RideStatus::Confirmed,
            ride_type: request.ride_type.clone(),
            estimated_fare: Some(quote.estimated_fare),
            distance: Some(quote.distance),
            estimated_duration: Some(quote.estimated_duration),
            created_date: Some(booking_time.clone()),
            ..Ride::default()
        };
        state.rides.push(ride.clone());

        tracing::debug!(ride = ?ride.id, driver = ?details.id, "ride booked");
        Ok(RideBooking {
            ride_id: ride.id,
            customer_name,
            driver_name: ride.driver_name,
            pickup_location: ride.pickup_location,
            destination_location: ride.destination_location,
            status: ride.status,
            ride_type: ride.ride_type,
            estimated_fare: ride.estimated_fare,
            distance: ride.distance,
            estimated_duration: ride.estimated_duration,
            booking_time: Some(booking_time),
            message: Some("Ride booked successfully".to_string()),
            driver_details: Some(details),
        })
    }

    async fn rate_ride(&self, id: EntityId, request: &RatingRequest) -> Result<Ride, BackendError> {
        self.enter(Ride::resource_name()).await?;
        let now = self.timestamp();
        let mut state = self.write()?;
        let ride = find_mut(&mut state.rides, id)?;

        if ride.status.is_active() {
            ride.status = RideStatus::Completed;
            ride.completion_time = Some(now.clone());
        } else if ride.status != RideStatus::Completed {
            return Err(bad_request(format!(
                "Cannot rate driver for ride in current state: {}",
                ride.status
            )));
        }
        if ride.driver_rating.is_some() {
            return Err(bad_request("Driver has already been rated for this ride"));
        }

        ride.driver_rating = Some(request.rating);
        ride.updated_date = Some(now);
        let rated = ride.clone();

        if let Some(driver_id) = rated.driver_id {
            match find_mut(&mut state.drivers, driver_id) {
                Ok(driver) => {
                    record_rating(driver, request.rating);
                    if driver.status == DriverStatus::Busy {
                        driver.status = DriverStatus::Active;
                    }
                }
                Err(e) => tracing::warn!(ride = id, error = %e, "driver rating not recorded"),
            }
        }
        Ok(rated)
    }
}

#[async_trait]
impl PaymentService for InMemoryBackend {
    async fn fetch_for_customer(
        &self,
        customer_id: EntityId,
    ) -> Result<Vec<Payment>, BackendError> {
        self.enter(Payment::resource_name()).await?;
        Ok(self
            .read()?
            .payments
            .iter()
            .filter(|p| p.customer_id == customer_id)
            .cloned()
            .collect())
    }

    async fn process_payment(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentReceipt, BackendError> {
        self.enter(Payment::resource_name()).await?;
        let now = self.timestamp();
        let mut state = self.write()?;

        if !state.rides.iter().any(|r| r.id == Some(request.ride_id)) {
            return Err(not_found::<Ride>(request.ride_id));
        }

        let id = state.allocate_id();
        let payment = Payment {
            id: Some(id),
            customer_id: request.customer_id,
            ride_id: request.ride_id,
            amount: request.amount,
            payment_method: request.payment_method.clone(),
            status: PaymentStatus::Completed,
            transaction_id: Some(format!("TXN-{:08}", id)),
            failure_reason: None,
            processed_at: Some(now.clone()),
            created_date: Some(now),
            updated_date: None,
        };
        state.payments.push(payment.clone());

        Ok(PaymentReceipt {
            payment_id: payment.id,
            customer_id: payment.customer_id,
            ride_id: payment.ride_id,
            amount: payment.amount,
            payment_method: payment.payment_method,
            status: payment.status,
            transaction_id: payment.transaction_id,
            message: Some("Payment processed successfully".to_string()),
            processed_at: payment.processed_at,
            created_date: payment.created_date,
        })
    }

    async fn calculate_fare(&self, request: &FareRequest) -> Result<FareQuote, BackendError> {
        self.enter(Payment::resource_name()).await?;
        if let RideType::Other(name) = &request.ride_type {
            return Err(bad_request(format!("Invalid ride type: {}", name)));
        }
        Ok(FareQuote::new(request.ride_type.clone(), self.trip_distance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::FixedClock;
    use crate::core::session::Role;
    use crate::entities::payment::PaymentMethod;
    use crate::entities::user::UserRole;

    fn backend() -> InMemoryBackend {
        let clock = FixedClock::parse("2024-05-15T12:00:00Z").unwrap();
        let backend = InMemoryBackend::new().with_clock(Arc::new(clock));
        backend
            .seed_users(vec![User {
                username: "jdoe".into(),
                name: "Jane Doe".into(),
                role: UserRole::Customer,
                ..User::default()
            }])
            .unwrap();
        backend
            .seed_drivers(vec![
                Driver {
                    id: Some(10),
                    name: "Off Duty".into(),
                    status: DriverStatus::Offline,
                    ..Driver::default()
                },
                Driver {
                    id: Some(11),
                    name: "Sam".into(),
                    rating: 4.0,
                    total_rides: 3,
                    status: DriverStatus::Active,
                    ..Driver::default()
                },
            ])
            .unwrap();
        backend.set_password("jdoe", "secret1").unwrap();
        backend
    }

    fn booking_request() -> CreateRideRequest {
        CreateRideRequest {
            customer_id: 1,
            pickup_location: "Union Square".into(),
            destination_location: "JFK Airport".into(),
            ride_type: RideType::Premium,
        }
    }

    #[tokio::test]
    async fn test_seed_assigns_ids_above_existing() {
        let backend = backend();
        let users = CollectionService::<User>::fetch_all(&backend).await.unwrap();
        assert_eq!(users[0].id, Some(1));

        let booking = backend.book_ride(&booking_request()).await.unwrap();
        assert_eq!(booking.ride_id, Some(12));
    }

    #[tokio::test]
    async fn test_login_checks_password() {
        let backend = backend();
        let user = backend
            .login(&LoginRequest::new("jdoe", "secret1"))
            .await
            .unwrap();
        assert_eq!(user.role, Role::Customer);

        let err = backend
            .login(&LoginRequest::new("jdoe", "wrong"))
            .await
            .unwrap_err();
        assert!(err.is_auth_rejection());
    }

    #[tokio::test]
    async fn test_booking_assigns_first_active_driver() {
        let backend = backend();
        let booking = backend.book_ride(&booking_request()).await.unwrap();

        assert_eq!(booking.customer_name.as_deref(), Some("Jane Doe"));
        assert_eq!(booking.driver_details.as_ref().and_then(|d| d.id), Some(11));
        assert_eq!(booking.estimated_fare, Some(13.5));
        assert_eq!(booking.booking_time.as_deref(), Some("2024-05-15T12:00:00"));

        let err = backend.book_ride(&booking_request()).await.unwrap_err();
        assert!(matches!(err, BackendError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_rating_completes_ride_and_updates_driver() {
        let backend = backend();
        let booking = backend.book_ride(&booking_request()).await.unwrap();
        let ride_id = booking.ride_id.unwrap();

        let ride = backend
            .rate_ride(ride_id, &RatingRequest::for_ride(5.0, ride_id))
            .await
            .unwrap();
        assert_eq!(ride.status, RideStatus::Completed);
        assert_eq!(ride.driver_rating, Some(5.0));

        let drivers = CollectionService::<Driver>::fetch_all(&backend).await.unwrap();
        let sam = drivers.iter().find(|d| d.id == Some(11)).unwrap();
        assert_eq!(sam.rating, 4.25);
        assert_eq!(sam.total_rides, 4);
        assert_eq!(sam.status, DriverStatus::Active);

        let again = backend.rate_ride(ride_id, &RatingRequest::new(4.0)).await;
        assert!(matches!(again, Err(BackendError::Status { status: 400, .. })));
    }

    #[tokio::test]
    async fn test_injected_failure_until_recovered() {
        let backend = backend();
        backend
            .fail("drivers", BackendError::Transport("connection reset".into()))
            .unwrap();

        let result = CollectionService::<Driver>::fetch_all(&backend).await;
        assert!(result.is_err());
        let users = CollectionService::<User>::fetch_all(&backend).await;
        assert!(users.is_ok());

        backend.recover("drivers").unwrap();
        let drivers = CollectionService::<Driver>::fetch_all(&backend).await.unwrap();
        assert_eq!(drivers.len(), 2);
    }

    #[tokio::test]
    async fn test_payment_requires_known_ride() {
        let backend = backend();
        let request = PaymentRequest {
            customer_id: 1,
            ride_id: 99,
            amount: 20.0,
            payment_method: PaymentMethod::Cash,
            card_token: None,
        };
        let err = backend.process_payment(&request).await.unwrap_err();
        assert_eq!(
            err,
            BackendError::NotFound {
                resource: "ride",
                id: 99
            }
        );
    }

    #[tokio::test]
    async fn test_fare_quote_uses_trip_distance() {
        let backend = backend().with_trip_distance(10.0);
        let mut request = FareRequest::from(&booking_request());

        let quote = backend.calculate_fare(&request).await.unwrap();
        assert_eq!(quote.ride_type, RideType::Premium);
        assert_eq!(quote.distance, 10.0);
        assert_eq!(quote.estimated_fare, 23.5);
        assert_eq!(quote.estimated_duration, 35);

        request.ride_type = RideType::Other("POOL".into());
        let err = backend.calculate_fare(&request).await.unwrap_err();
        assert_eq!(
            err,
            BackendError::Status {
                status: 400,
                message: "Invalid ride type: POOL".into()
            }
        );
    }

    #[tokio::test]
    async fn test_delete_unknown_user_is_not_found() {
        let backend = backend();
        assert!(backend.delete_user(1).await.is_ok());
        assert!(matches!(
            backend.delete_user(1).await,
            Err(BackendError::NotFound { resource: "user", id: 1 })
        ));
    }
}
