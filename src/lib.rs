//! # ridedesk
//!
//! Presentation-logic core of a ride-hailing admin and customer portal.
//!
//! ## Features
//!
//! - **Generic list engine**: filter, sort, paginate and aggregate any entity
//!   kind through its `EntitySchema`
//! - **Activity feed**: newest events merged across users, drivers, rides and payments
//! - **Dashboards**: admin and customer views fed by concurrent fetches
//! - **Explicit sessions**: `SessionContext` plus a pure route authorization check
//! - **Local validation**: form rules run before any mutation reaches the network
//! - **Backends**: `HttpBackend` for the REST API, `InMemoryBackend` for tests and demos
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ridedesk::prelude::*;
//!
//! let config = ConsoleConfig::from_yaml_file("ridedesk.yaml")?;
//! let backend = Arc::new(HttpBackend::from_config(&config)?);
//! let services = ServiceSet::from_backend(backend);
//!
//! let mut drivers = ListView::drivers(services, &config, Arc::new(SystemClock));
//! drivers.refresh().await?;
//! drivers.set_filter(FilterPatch::default().status("ACTIVE").min_rating(4.0));
//! drivers.set_sort("rating", None)?;
//!
//! let page = drivers.present();
//! println!("{} of {} drivers", page.items.len(), page.total_count);
//! ```

pub mod config;
pub mod core;
pub mod entities;
pub mod storage;
pub mod views;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        clock::{Clock, FixedClock, SystemClock},
        engine::{ListEngine, ListSettings, ViewState},
        entity::{Entity, EntityId},
        error::{BackendError, ConsoleError, ConsoleResult, Notice, NoticeLevel},
        feed::{Activity, FeedLimits},
        filter::{FilterConfig, FilterPatch},
        service::{AuthService, CollectionService},
        session::{
            Access, LoginRequest, Role, SessionContext, SessionUser, authorize_route, sign_in,
        },
        sort::SortDirection,
        stats::Aggregate,
        validation::Form,
    };

    // === Entities ===
    pub use crate::entities::{
        Driver, DriverStatus, Payment, PaymentMethod, PaymentStatus, RatingRequest, Ride,
        RideStatus, RideType, User, UserRole, UserStatus,
        driver::{CreateDriverRequest, DriverService, UpdateDriverRequest},
        payment::{PaymentRequest, PaymentService},
        ride::{CreateRideRequest, RideService, estimate_fare},
        user::{CreateUserRequest, UpdateUserRequest, UserService},
    };

    // === Views ===
    pub use crate::views::{
        AdminDashboardView, CustomerDashboardView, ListView, ServiceSet, ViewLifetime,
    };

    // === Storage ===
    pub use crate::storage::{HttpBackend, InMemoryBackend};

    // === Config ===
    pub use crate::config::ConsoleConfig;

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use std::sync::Arc;
}
