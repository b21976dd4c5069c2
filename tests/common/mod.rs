//! Shared fixtures for the integration tests
//!
//! ```rust,ignore
//! mod common;
//! use common::*;
//! ```

#![allow(dead_code)]

use ridedesk::core::clock::{Clock, FixedClock};
use ridedesk::core::session::{Role, SessionContext, SessionUser};
use ridedesk::entities::driver::{Driver, DriverStatus, Vehicle};
use ridedesk::entities::payment::{Payment, PaymentMethod, PaymentStatus};
use ridedesk::entities::ride::{Ride, RideStatus, RideType};
use ridedesk::entities::user::{User, UserRole, UserStatus};
use ridedesk::storage::InMemoryBackend;
use std::sync::Arc;

pub const ADMIN_ID: i64 = 1;
pub const CUSTOMER_ID: i64 = 2;

/// Mid-May 2024, UTC
pub fn clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock::parse("2024-05-15T12:00:00Z").unwrap())
}

pub fn user(id: i64, name: &str, role: UserRole, created: &str) -> User {
    User {
        id: Some(id),
        username: name.to_lowercase().replace(' ', "."),
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
        role,
        status: UserStatus::Active,
        created_date: Some(created.to_string()),
        ..User::default()
    }
}

pub fn users() -> Vec<User> {
    vec![
        user(ADMIN_ID, "Ada Admin", UserRole::Admin, "2024-01-02T09:00:00"),
        user(CUSTOMER_ID, "Carla Customer", UserRole::Customer, "2024-05-01T10:00:00"),
        user(3, "Dan Rider", UserRole::Customer, "2024-05-10T10:00:00"),
        User {
            status: UserStatus::Suspended,
            ..user(4, "Eve Blocked", UserRole::Customer, "2024-04-20T10:00:00")
        },
    ]
}

pub fn driver(id: i64, name: &str, rating: f64, status: DriverStatus, plate: &str) -> Driver {
    Driver {
        id: Some(id),
        name: name.to_string(),
        phone: format!("+1555000{:04}", id),
        email: format!("{}@fleet.example.com", name.to_lowercase()),
        rating,
        status,
        vehicle: Some(Vehicle {
            id: None,
            model: "Toyota Prius".to_string(),
            plate_number: plate.to_string(),
            year: 2021,
            color: "Silver".to_string(),
        }),
        total_rides: (rating * 10.0) as i64,
        created_date: Some(format!("2024-03-{:02}T08:00:00", id)),
        ..Driver::default()
    }
}

pub fn drivers() -> Vec<Driver> {
    vec![
        driver(10, "Frank", 4.8, DriverStatus::Active, "ABC123"),
        driver(11, "Gina", 4.2, DriverStatus::Busy, "XYZ789"),
        driver(12, "Hugo", 3.9, DriverStatus::Offline, "LMN456"),
    ]
}

pub fn ride(id: i64, status: RideStatus, destination: &str, created: &str) -> Ride {
    Ride {
        id: Some(id),
        customer_id: CUSTOMER_ID,
        driver_id: Some(10),
        customer_name: Some("Carla Customer".to_string()),
        driver_name: Some("Frank".to_string()),
        pickup_location: "Main Street 1".to_string(),
        destination_location: destination.to_string(),
        status,
        ride_type: RideType::Economy,
        estimated_fare: Some(10.0),
        distance: Some(5.0),
        created_date: Some(created.to_string()),
        ..Ride::default()
    }
}

pub fn rides() -> Vec<Ride> {
    vec![
        Ride {
            driver_rating: Some(5.0),
            actual_fare: Some(12.0),
            ..ride(20, RideStatus::Completed, "JFK Airport", "2024-05-03T09:00:00")
        },
        ride(21, RideStatus::InProgress, "Central Station", "2024-05-14T18:00:00"),
        Ride {
            customer_id: 3,
            ..ride(22, RideStatus::Cancelled, "Harbor", "2024-05-12T07:00:00")
        },
    ]
}

pub fn payment(id: i64, amount: f64, status: PaymentStatus, created: &str) -> Payment {
    Payment {
        id: Some(id),
        customer_id: CUSTOMER_ID,
        ride_id: 20,
        amount,
        payment_method: PaymentMethod::CreditCard,
        status,
        transaction_id: Some(format!("TXN-{:08}", id)),
        created_date: Some(created.to_string()),
        ..Payment::default()
    }
}

pub fn payments() -> Vec<Payment> {
    vec![
        payment(30, 12.0, PaymentStatus::Completed, "2024-05-03T09:30:00"),
        payment(31, 25.5, PaymentStatus::Completed, "2024-04-28T12:00:00"),
        payment(32, 8.0, PaymentStatus::Failed, "2024-05-11T12:00:00"),
    ]
}

/// Backend seeded with the fixtures above; passwords equal usernames
pub fn seeded_backend() -> InMemoryBackend {
    let backend = InMemoryBackend::new().with_clock(clock());
    let users = users();
    for u in &users {
        backend.set_password(&u.username, &u.username).unwrap();
    }
    backend.seed_users(users).unwrap();
    backend.seed_drivers(drivers()).unwrap();
    backend.seed_rides(rides()).unwrap();
    backend.seed_payments(payments()).unwrap();
    backend
}

pub fn session_for(id: i64, role: Role) -> SessionContext {
    SessionContext::signed_in(SessionUser {
        id,
        username: format!("user{id}"),
        name: format!("User {id}"),
        email: format!("user{id}@example.com"),
        role,
    })
}
